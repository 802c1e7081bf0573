//! HookRelay CLI entry point.
//!
//! This binary is the composition root. Responsibilities:
//!
//! 1. **Parse configuration**: flags with `HOOKRELAY_*` environment fallbacks.
//! 2. **Wire observability**: JSON `tracing` output on stderr plus optional
//!    OTLP export (see [`observability`]).
//! 3. **Construct infrastructure**: one [`AdminApiHttpClient`] serving every
//!    remote port, and a [`FileSubscriptionStore`].
//! 4. **Run one operation** of the selected trigger and print its result as
//!    JSON on stdout.
//!
//! Halting failures exit with status 1; retryable transport failures exit
//! with 75 (`EX_TEMPFAIL`) so schedulers can try again.

mod file_store;
mod observability;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use tracing::{debug, error};

use admin_api::{AdminApiConfig, AdminApiHttpClient};
use file_store::FileSubscriptionStore;
use trigger::{catalog, AuthContext, EventBundle, SubscriptionKey, TriggerError, TriggerPorts};
use trigger::{HookTrigger, Unsubscribed};

const EX_TEMPFAIL: u8 = 75;

/// HookRelay - webhook triggers for a remote publishing site
#[derive(Parser)]
#[command(name = "hookrelay")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Base URL of the remote site
    #[arg(long, env = "HOOKRELAY_ADMIN_URL", global = true)]
    admin_url: Option<String>,

    /// Admin API key in `{id}:{secret}` form
    #[arg(long, env = "HOOKRELAY_ADMIN_KEY", global = true, hide_env_values = true)]
    admin_key: Option<String>,

    /// JSON file holding stored subscriptions
    #[arg(
        long,
        env = "HOOKRELAY_STORE",
        global = true,
        default_value = "hookrelay-subscriptions.json"
    )]
    store: PathBuf,

    /// Trigger to operate on
    #[arg(long, global = true, default_value = "newsletter_created")]
    trigger: String,

    /// Per-request timeout in seconds
    #[arg(long, global = true, default_value_t = 30)]
    timeout_secs: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Register a webhook and store it under KEY
    Subscribe {
        /// Subscription key (one per automation)
        #[arg(long)]
        key: String,
        /// URL the remote site should deliver events to
        #[arg(long)]
        target_url: String,
    },

    /// Remove the webhook stored under KEY
    Unsubscribe {
        /// Subscription key used when subscribing
        #[arg(long)]
        key: String,
    },

    /// Poll the remote site for entities
    List {
        /// Return the full catalog instead of the newest entity
        #[arg(long)]
        dropdown: bool,
    },

    /// Normalize a webhook delivery read from a JSON file
    Deliver {
        /// Path to the delivery body
        payload: PathBuf,
        /// Raw query string of the delivery URL
        #[arg(long, default_value = "")]
        query: String,
    },

    /// Show whether a subscription is stored under KEY
    Status {
        /// Subscription key to look up
        #[arg(long)]
        key: String,
    },

    /// Update a member, checking field-level version requirements first
    UpdateMember {
        /// Member id
        id: String,
        /// Path to a JSON object with the fields to change
        payload: PathBuf,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let _otel = match observability::init() {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("error: {e:#}");
            return ExitCode::FAILURE;
        }
    };

    match run(cli).await {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %format!("{e:#}"), "command failed");
            eprintln!("error: {e:#}");
            exit_code(&e)
        }
    }
}

fn exit_code(err: &anyhow::Error) -> ExitCode {
    match err.downcast_ref::<TriggerError>() {
        Some(e) if !e.is_halting() => ExitCode::from(EX_TEMPFAIL),
        _ => ExitCode::FAILURE,
    }
}

async fn run(cli: Cli) -> Result<String> {
    let config = AdminApiConfig {
        timeout: Duration::from_secs(cli.timeout_secs),
        ..AdminApiConfig::default()
    };
    let client = Arc::new(AdminApiHttpClient::new(config).context("failed to build HTTP client")?);
    let store = Arc::new(FileSubscriptionStore::new(cli.store.clone()));
    debug!(store = %store.path().display(), "using subscription store");
    let ports = TriggerPorts {
        versions: client.clone(),
        admin: client.clone(),
        webhooks: client.clone(),
        store,
    };

    let output = match &cli.command {
        Command::Subscribe { key, target_url } => {
            let auth = auth(&cli)?;
            let subscription = build_trigger(&cli, ports)?
                .subscribe(&subscription_key(key)?, target_url, &auth)
                .await?;
            serde_json::to_value(subscription)?
        }
        Command::Unsubscribe { key } => {
            let auth = auth(&cli)?;
            let outcome = build_trigger(&cli, ports)?
                .unsubscribe(&subscription_key(key)?, &auth)
                .await?;
            json!({ "outcome": outcome_name(outcome) })
        }
        Command::List { dropdown } => {
            let auth = auth(&cli)?;
            let entities = build_trigger(&cli, ports)?
                .perform_list(Some(*dropdown), &auth)
                .await?;
            Value::Array(entities)
        }
        Command::Deliver { payload, query } => {
            let body = read_json(payload).await?;
            let bundle = EventBundle::new(body).with_query_string(query.clone());
            Value::Array(build_trigger(&cli, ports)?.perform(&bundle)?)
        }
        Command::Status { key } => {
            let state = build_trigger(&cli, ports)?
                .state(&subscription_key(key)?)
                .await?;
            json!({ "key": key, "state": state })
        }
        Command::UpdateMember { id, payload } => {
            let auth = auth(&cli)?;
            let body = read_json(payload).await?;
            catalog::member_writer(client.clone(), client.clone())
                .update(id, &body, &auth)
                .await?
        }
    };

    Ok(serde_json::to_string_pretty(&output)?)
}

fn build_trigger(cli: &Cli, ports: TriggerPorts) -> Result<HookTrigger> {
    let definition = catalog::find(&cli.trigger)
        .ok_or_else(|| anyhow!("unknown trigger '{}'", cli.trigger))?;
    Ok(catalog::build(definition, ports))
}

fn auth(cli: &Cli) -> Result<AuthContext> {
    let url = cli
        .admin_url
        .as_deref()
        .context("--admin-url or HOOKRELAY_ADMIN_URL is required")?;
    let key = cli
        .admin_key
        .as_deref()
        .context("--admin-key or HOOKRELAY_ADMIN_KEY is required")?;
    Ok(AuthContext::new(url, key))
}

fn subscription_key(raw: &str) -> Result<SubscriptionKey> {
    SubscriptionKey::new(raw).context("subscription key must not be empty")
}

async fn read_json(path: &Path) -> Result<Value> {
    let text = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("failed to parse {}", path.display()))
}

fn outcome_name(outcome: Unsubscribed) -> &'static str {
    match outcome {
        Unsubscribed::Removed => "removed",
        Unsubscribed::AlreadyAbsent => "already_absent",
        Unsubscribed::NothingStored => "nothing_stored",
    }
}
