//! contactsync command-line tool.
//!
//! Provides subcommands for running a reconciliation pass, generating and
//! validating the configuration file, and managing the exclusion list.

mod picker;
mod style;

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use comfy_table::presets::UTF8_FULL;
use comfy_table::Table;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use contactsync_core::config::AppConfig;
use contactsync_core::directory::LdapDirectory;
use contactsync_core::errors::ConfigError;
use contactsync_core::exclusions::ExclusionStore;
use contactsync_core::models::SyncStats;
use contactsync_core::normalize::PhoneRule;
use contactsync_core::reconciler::{ClientPicker, Reconciler};
use contactsync_core::remote::HttpRemoteApi;
use contactsync_core::resolver::ClientResolver;

use picker::{InteractivePicker, NonInteractivePicker};

// ---------------------------------------------------------------------------
// CLI argument definitions
// ---------------------------------------------------------------------------

/// contactsync command-line tool.
#[derive(Parser, Debug)]
#[command(
    name = "contactsync",
    version,
    about = "Synchronize directory contacts into a helpdesk/CRM system"
)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(
        short,
        long,
        global = true,
        default_value = "/etc/contactsync/config.toml"
    )]
    config: PathBuf,

    /// Override the log level from the config file (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run one reconciliation pass against the directory and the remote API.
    Sync {
        /// Route and report every record without performing any remote
        /// write or exclusion append.
        #[arg(long)]
        dry_run: bool,

        /// Never prompt; unmapped new contacts are skipped (and not
        /// excluded).
        #[arg(long)]
        non_interactive: bool,
    },

    /// Write a commented default configuration file.
    Init {
        /// Output path for the generated config file.
        #[arg(short, long, default_value = "./contactsync.toml")]
        output: PathBuf,
    },

    /// Load, resolve, and validate a configuration file.
    Validate,

    /// Manage the exclusion list.
    Exclusions {
        #[command(subcommand)]
        action: ExclusionsAction,
    },
}

#[derive(Subcommand, Debug)]
enum ExclusionsAction {
    /// List excluded emails.
    List,
    /// Add an email to the exclusion list.
    Add {
        email: String,
    },
    /// Remove an email from the exclusion list.
    Remove {
        email: String,
    },
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", style::error(&format!("{:#}", e)));
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    // `init` must work before any config file exists.
    if let Commands::Init { output } = &cli.command {
        return cmd_init(output);
    }

    let mut config = AppConfig::load_from_file(&cli.config)
        .context("failed to load configuration file")?;
    config.resolve_env_vars();
    config.validate().context("configuration validation failed")?;

    let level = cli.log_level.as_deref().unwrap_or(&config.logging.level);
    let _log_guard = init_tracing(level, config.logging.dir.as_deref());

    match cli.command {
        Commands::Sync {
            dry_run,
            non_interactive,
        } => cmd_sync(config, dry_run, non_interactive).await,
        Commands::Validate => cmd_validate(&config),
        Commands::Exclusions { action } => cmd_exclusions(&config, action),
        Commands::Init { .. } => unreachable!("handled above"),
    }
}

/// Initialize tracing: console always, plus a daily-rolling file when a log
/// directory is configured. The returned guard must stay alive for the
/// process lifetime so buffered file output is flushed.
fn init_tracing(
    level: &str,
    log_dir: Option<&std::path::Path>,
) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));
    let console_layer = tracing_subscriber::fmt::layer().with_target(true);

    match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "contactsync.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let file_layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(writer);
            tracing_subscriber::registry()
                .with(filter)
                .with(console_layer)
                .with(file_layer)
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::registry()
                .with(filter)
                .with(console_layer)
                .init();
            None
        }
    }
}

// ---------------------------------------------------------------------------
// sync
// ---------------------------------------------------------------------------

async fn cmd_sync(config: AppConfig, dry_run: bool, non_interactive: bool) -> Result<()> {
    let api_key = config.remote.api_key.clone().ok_or_else(|| {
        ConfigError::EnvVarMissing {
            var: config.remote.api_key_env.clone(),
            field: "remote.api_key_env".into(),
        }
    })?;
    if config.directory.bind_password.is_none() {
        return Err(ConfigError::EnvVarMissing {
            var: config.directory.bind_password_env.clone(),
            field: "directory.bind_password_env".into(),
        }
        .into());
    }

    let directory = LdapDirectory::new(config.directory.clone());
    let remote = HttpRemoteApi::new(
        config.remote.api_url.clone(),
        api_key,
        Duration::from_secs(config.remote.timeout_secs),
    );
    let resolver = ClientResolver::new(config.sync.mappings.clone());
    let exclusions = ExclusionStore::load(&config.sync.exclusion_file)
        .context("failed to load exclusion file")?;
    let picker: Box<dyn ClientPicker> = if non_interactive {
        Box::new(NonInteractivePicker)
    } else {
        Box::new(InteractivePicker)
    };
    let phone_rule = PhoneRule::new(
        config.sync.country_prefix.clone(),
        config.sync.prefix_replacement.clone(),
    );

    let mut engine = Reconciler::new(
        Box::new(directory),
        Box::new(remote),
        resolver,
        exclusions,
        picker,
        phone_rule,
    )
    .dry_run(dry_run);

    let stats = engine.run().await.context("reconciliation failed")?;

    println!();
    if dry_run {
        println!("{}", style::header("Sync summary (dry run)"));
    } else {
        println!("{}", style::header("Sync summary"));
    }
    println!("{}", render_stats(&stats));
    if stats.failed > 0 {
        println!(
            "{}",
            style::warn(&format!(
                "{} record(s) failed; see the log for details",
                stats.failed
            ))
        );
    } else {
        println!("{}", style::success("All records processed"));
    }
    Ok(())
}

fn render_stats(stats: &SyncStats) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Outcome", "Count"]);
    table.add_row(vec!["directory records".into(), stats.total_records.to_string()]);
    table.add_row(vec!["updated".into(), stats.updated.to_string()]);
    table.add_row(vec!["created".into(), stats.created.to_string()]);
    table.add_row(vec![
        "skipped (no email)".into(),
        stats.skipped_no_email.to_string(),
    ]);
    table.add_row(vec![
        "skipped (excluded)".into(),
        stats.skipped_excluded.to_string(),
    ]);
    table.add_row(vec!["declined".into(), stats.declined.to_string()]);
    table.add_row(vec!["unassigned".into(), stats.unassigned.to_string()]);
    table.add_row(vec!["failed".into(), stats.failed.to_string()]);
    table
}

// ---------------------------------------------------------------------------
// init
// ---------------------------------------------------------------------------

const DEFAULT_CONFIG: &str = r#"# contactsync configuration
#
# Secrets are referenced via *_env fields naming environment variables;
# nothing sensitive lives in this file.

[directory]
host = "ldap.example.com"
port = 636
use_ssl = true
base_dn = "OU=Users,DC=example,DC=com"
bind_dn = "CN=svc-contactsync,OU=Service,DC=example,DC=com"
bind_password_env = "CONTACTSYNC_LDAP_PASSWORD"
# filter defaults to enabled person accounts; override if needed
#filter = "(&(objectClass=person)(!(userAccountControl:1.2.840.113556.1.4.803:=2)))"

# Attribute names default to Active Directory conventions.
#[directory.attributes]
#display_name = "displayName"
#email = "mail"

[remote]
api_url = "https://desk.example.com/api/v1"
api_key_env = "CONTACTSYNC_API_KEY"
timeout_secs = 30

[sync]
country_prefix = "+49"
prefix_replacement = "0"
exclusion_file = "/var/lib/contactsync/exclusions.txt"

# Static DN-substring -> client mappings, matched in file order.
#[[sync.mappings]]
#pattern = "OU=Sales"
#client_id = 101

[logging]
level = "info"
# Uncomment to also write a daily-rolling log file.
#dir = "/var/log/contactsync"
"#;

fn cmd_init(output: &PathBuf) -> Result<()> {
    if output.exists() {
        bail!(
            "{} already exists; remove it first or choose another --output",
            output.display()
        );
    }
    std::fs::write(output, DEFAULT_CONFIG)
        .with_context(|| format!("failed to write {}", output.display()))?;
    println!(
        "{}",
        style::success(&format!("wrote default config to {}", output.display()))
    );
    println!(
        "{}",
        style::dim("Edit the connection settings, then run `contactsync validate`.")
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// validate
// ---------------------------------------------------------------------------

fn cmd_validate(config: &AppConfig) -> Result<()> {
    // Loading/validation already happened in `run`; report secret status.
    println!("{}", style::success("configuration is valid"));

    if config.directory.bind_password.is_some() {
        println!("{}", style::success("directory bind password resolved"));
    } else {
        println!(
            "{}",
            style::warn(&format!(
                "directory bind password not resolved (set {})",
                config.directory.bind_password_env
            ))
        );
    }
    if config.remote.api_key.is_some() {
        println!("{}", style::success("remote API key resolved"));
    } else {
        println!(
            "{}",
            style::warn(&format!(
                "remote API key not resolved (set {})",
                config.remote.api_key_env
            ))
        );
    }
    println!(
        "{}",
        style::dim(&format!(
            "{} client mapping(s), exclusion file {}",
            config.sync.mappings.len(),
            config.sync.exclusion_file.display()
        ))
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// exclusions
// ---------------------------------------------------------------------------

fn cmd_exclusions(config: &AppConfig, action: ExclusionsAction) -> Result<()> {
    let mut store = ExclusionStore::load(&config.sync.exclusion_file)
        .context("failed to load exclusion file")?;

    match action {
        ExclusionsAction::List => {
            if store.is_empty() {
                println!("{}", style::dim("exclusion list is empty"));
                return Ok(());
            }
            let mut table = Table::new();
            table.load_preset(UTF8_FULL);
            table.set_header(vec!["Excluded email"]);
            for email in store.emails() {
                table.add_row(vec![email]);
            }
            println!("{table}");
        }
        ExclusionsAction::Add { email } => {
            store.add(&email).context("failed to add exclusion")?;
            println!("{}", style::success(&format!("excluded {}", email)));
        }
        ExclusionsAction::Remove { email } => {
            if store.remove(&email).context("failed to remove exclusion")? {
                println!("{}", style::success(&format!("removed {}", email)));
            } else {
                println!(
                    "{}",
                    style::warn(&format!("{} was not on the exclusion list", email))
                );
            }
        }
    }
    Ok(())
}
