//! credledger - academic-credential ledger client
//!
//! Command-line surface over the library: role lookups, health checks,
//! unsigned transaction construction for external signing, submission of
//! signed blobs, and badge verification.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use credledger::badges::{Badge, BadgeRequest, BadgeRequestState, BadgeService};
use credledger::logging::FlowContext;
use credledger::types::{FlowKind, FlowLog, FlowStatus};
use credledger::{
    Config, LedgerClient, RoleResolver, StateReader, SubmissionEngine, TransactionBuilder,
};

/// Command line arguments
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check node and indexer reachability and show the configuration
    Status {
        /// Also show this account's balance summary
        address: Option<String>,
    },

    /// Resolve the role of a wallet address
    Role {
        address: String,

        /// Report the sentinel-aware reading and real errors instead of the
        /// advisory default
        #[arg(long)]
        strict: bool,
    },

    /// Show the configured and on-chain super admin, optionally checking an
    /// address against them
    SuperAdmin { address: Option<String> },

    /// Build an unsigned opt-in transaction for external signing
    OptIn { address: String },

    /// Build an unsigned university-role assignment for external signing
    AssignRole {
        caller_address: String,
        target_address: String,
    },

    /// Build an unsigned badge-request call for external signing
    RequestBadge {
        sender: String,
        student_id: String,
        course_id: String,
        institution_id: String,
    },

    /// Build an unsigned badge-issuance call for external signing
    IssueBadge {
        sender: String,
        student_id: String,
        course_id: String,
        institution_id: String,
        /// Learning outcomes, comma separated
        #[arg(long, value_delimiter = ',')]
        outcomes: Vec<String>,
    },

    /// Submit externally signed transaction bytes and wait for confirmation
    Submit {
        /// File holding the raw signed transaction blob
        signed_file: String,

        /// Kind of flow, recorded in the transaction log
        #[arg(long, default_value = "opt-in")]
        kind: String,

        /// Override the configured confirmation-wait bound, in rounds
        #[arg(long)]
        max_rounds: Option<u64>,

        /// Re-resolve this address's role after confirmation (for flows
        /// that changed it)
        #[arg(long)]
        refresh_role: Option<String>,
    },

    /// Verify a badge against on-chain state
    VerifyBadge {
        badge_hash: String,
        student_id: String,
    },

    /// Show the status of a badge request
    BadgeStatus { request_id: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let config = load_config(&args.config)?;
    let validation = config.validate();
    for warning in &validation.warnings {
        warn!(warning = %warning, "Configuration warning");
    }
    if !validation.is_valid() {
        for error in &validation.errors {
            tracing::error!(error = %error, "Configuration error");
        }
        anyhow::bail!("configuration is invalid");
    }

    let client = LedgerClient::init(&config).context("Failed to initialize ledger client")?;

    match args.command {
        Command::Status { address } => status(&client, address.as_deref()).await,
        Command::Role { address, strict } => role(&client, &address, strict).await,
        Command::SuperAdmin { address } => super_admin(&client, address.as_deref()).await,
        Command::OptIn { address } => {
            let ctx = FlowContext::new("opt_in");
            info!(correlation_id = %ctx.correlation_id, "Building opt-in transaction");
            let txn = TransactionBuilder::new(&client).build_opt_in(&address).await?;
            print_unsigned(&txn)
        }
        Command::AssignRole {
            caller_address,
            target_address,
        } => {
            let ctx = FlowContext::new("assign_role");
            info!(correlation_id = %ctx.correlation_id, "Building role assignment");
            let txn = TransactionBuilder::new(&client)
                .build_assign_role(&caller_address, &target_address)
                .await?;
            print_unsigned(&txn)
        }
        Command::RequestBadge {
            sender,
            student_id,
            course_id,
            institution_id,
        } => {
            let request = BadgeRequest {
                student_id,
                course_id,
                institution_id,
                request_timestamp: chrono::Utc::now().timestamp(),
                status: BadgeRequestState::Pending,
            };
            let txn = BadgeService::new(&client)
                .build_badge_request(&sender, &request)
                .await?;
            print_unsigned(&txn)
        }
        Command::IssueBadge {
            sender,
            student_id,
            course_id,
            institution_id,
            outcomes,
        } => {
            let badge = Badge::new(
                student_id,
                course_id,
                institution_id,
                outcomes,
                chrono::Utc::now().timestamp(),
            );
            info!(badge_hash = %badge.badge_hash, "Assembled badge");
            let txn = BadgeService::new(&client).build_issue_badge(&sender, &badge).await?;
            print_unsigned(&txn)
        }
        Command::Submit {
            signed_file,
            kind,
            max_rounds,
            refresh_role,
        } => submit(&client, &signed_file, &kind, max_rounds, refresh_role.as_deref()).await,
        Command::VerifyBadge {
            badge_hash,
            student_id,
        } => {
            let result = BadgeService::new(&client)
                .verify_badge(&badge_hash, &student_id)
                .await?;
            if result.verified {
                println!("verified");
                if let Some(badge) = result.badge {
                    println!("{}", serde_json::to_string_pretty(&badge)?);
                }
            } else {
                println!("not verified");
            }
            Ok(())
        }
        Command::BadgeStatus { request_id } => {
            let status = BadgeService::new(&client).badge_request_status(&request_id).await?;
            if !status.exists {
                println!("request not found");
            } else if status.approved {
                println!("approved (timestamp: {:?})", status.timestamp);
            } else {
                println!("pending");
            }
            Ok(())
        }
    }
}

async fn status(client: &LedgerClient, address: Option<&str>) -> Result<()> {
    let node_ok = client.check_node().await;
    let indexer_ok = client.check_indexer().await;

    println!("node:     {}", if node_ok { "reachable" } else { "UNREACHABLE" });
    println!("indexer:  {}", if indexer_ok { "reachable" } else { "UNREACHABLE" });
    println!("app id:   {}", client.app_id());
    println!(
        "super admin: {}",
        client.super_admin_address().unwrap_or("(not configured)")
    );

    if let Some(address) = address {
        let summary = StateReader::new(client).account_summary(address).await?;
        println!(
            "account {}: {} microalgos (min {}), opted into {} apps",
            summary.address, summary.balance, summary.min_balance, summary.apps_opted_in
        );
    }
    Ok(())
}

async fn role(client: &LedgerClient, address: &str, strict: bool) -> Result<()> {
    let resolver = RoleResolver::new(client);

    if strict {
        let state = resolver.resolve_role_strict(address).await?;
        println!("role: {} (wire value {})", describe(state), state.as_i64());
    } else {
        let resolved = resolver.resolve_role(address).await;
        println!(
            "role: {} ({})",
            resolved.role,
            if resolved.is_authoritative() {
                "confirmed on-chain"
            } else {
                "advisory default"
            }
        );
    }
    Ok(())
}

fn describe(state: credledger::RoleState) -> String {
    match state {
        credledger::RoleState::NotOptedIn => "not opted in".to_string(),
        credledger::RoleState::OptedIn(role) => role.to_string(),
    }
}

async fn super_admin(client: &LedgerClient, address: Option<&str>) -> Result<()> {
    let resolver = RoleResolver::new(client);
    let reader = StateReader::new(client);

    println!(
        "configured: {}",
        client.super_admin_address().unwrap_or("(not configured)")
    );
    match reader.get_super_admin_address().await {
        Some(creator) => println!("on-chain creator: {creator}"),
        None => println!("on-chain creator: (unavailable)"),
    }

    if let Some(address) = address {
        println!("configured match: {}", resolver.is_super_admin(address));
        match resolver.is_super_admin_on_chain(address).await {
            Some(matches) => println!("on-chain match: {matches}"),
            None => println!("on-chain match: (unavailable)"),
        }
    }
    Ok(())
}

fn parse_flow_kind(kind: &str) -> FlowKind {
    match kind {
        "assign-role" => FlowKind::RoleAssignment,
        "badge-request" => FlowKind::BadgeRequest,
        "badge-issuance" => FlowKind::BadgeIssuance,
        _ => FlowKind::OptIn,
    }
}

async fn submit(
    client: &LedgerClient,
    signed_file: &str,
    kind: &str,
    max_rounds: Option<u64>,
    refresh_role: Option<&str>,
) -> Result<()> {
    let ctx = FlowContext::new("submit");
    let signed = tokio::fs::read(signed_file)
        .await
        .with_context(|| format!("Failed to read signed transaction from {signed_file}"))?;
    let engine = SubmissionEngine::new(client);
    let mut log = FlowLog::new();

    let max_rounds = max_rounds.unwrap_or(client.confirmation_settings().max_rounds);
    let confirmation = match engine.submit_and_wait_rounds(&signed, max_rounds).await {
        Ok(confirmation) => confirmation,
        Err(e) => {
            ctx.logger.log_failure("submit_and_wait", e.category(), &e.to_string());
            return Err(e.into());
        }
    };

    ctx.logger
        .log_confirmation(&confirmation.tx_id, confirmation.confirmed_round);
    log.record(
        parse_flow_kind(kind),
        confirmation.tx_id.clone(),
        FlowStatus::Confirmed,
    );
    println!(
        "confirmed: {} in round {}",
        confirmation.tx_id, confirmation.confirmed_round
    );
    for record in log.records() {
        println!(
            "history: {:?} {} {:?} at {}",
            record.kind, record.tx_id, record.status, record.timestamp
        );
    }

    // A role read before this transaction must not be trusted after it
    if let Some(address) = refresh_role {
        let resolver = RoleResolver::new(client);
        let resolved = resolver.resolve_after_transaction(address).await;
        println!(
            "role after confirmation: {} ({})",
            resolved.role,
            if resolved.is_authoritative() {
                "confirmed on-chain"
            } else {
                "advisory default"
            }
        );
    }
    Ok(())
}

fn print_unsigned(txn: &credledger::tx_builder::UnsignedTransaction) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(txn)?);
    Ok(())
}

fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "credledger=debug,info"
    } else {
        "credledger=info,warn,error"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}

/// Load configuration from file, falling back to environment variables.
fn load_config(path: &str) -> Result<Config> {
    if std::path::Path::new(path).exists() {
        Config::from_file(path).with_context(|| format!("Failed to load config from {path}"))
    } else {
        warn!("Config file '{}' not found, using environment", path);
        Config::from_env()
    }
}
