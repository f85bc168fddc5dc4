//! `mailvault` - back up and restore IMAP mailboxes.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod cli;
mod console;

use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::Parser;
use mailvault_core::{
    Archive, BackupRequest, CancelFlag, DateRange, Engine, EngineConfig, ImapSession,
    RestoreRequest,
};
use mailvault_imap::Credentials;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cli::{Account, Cli, Command, Range};
use console::ConsoleNotifier;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| cli.default_log_filter().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // reqwest pulls in a second rustls backend; pick one before any TLS.
    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();

    match run(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

/// Runs one command; `Ok(false)` when it finished but skipped something.
async fn run(cli: Cli) -> Result<bool> {
    let config = load_config(&cli)?;

    match &cli.command {
        Command::Version => {
            println!("mailvault {}", mailvault_core::CURRENT_VERSION);
            mailvault_core::version::report_new_version(
                config.update_check_url.as_deref(),
                &ConsoleNotifier,
            )
            .await;
            Ok(true)
        }
        Command::Backup {
            dir,
            account,
            range,
            stamp,
        } => {
            let request = BackupRequest {
                range: date_range(range)?,
                use_stamp: *stamp,
            };
            let archive = open_archive(dir, &config).await?;
            let mut engine = connect(&cli, account, config).await?;
            let report = engine.backup(&archive, request).await;
            engine.finish().await;
            archive.close().await;

            let report = report.context("backup failed")?;
            println!(
                "{} stored, {} already archived, {} skipped",
                report.stored,
                report.already_present + report.known,
                report.errors.len()
            );
            Ok(report.is_complete())
        }
        Command::Restore {
            dir,
            account,
            range,
        } => {
            let request = RestoreRequest {
                range: date_range(range)?,
            };
            let archive = open_archive(dir, &config).await?;
            if archive.is_empty().await? {
                bail!("{} holds no backup", dir.display());
            }
            let mut engine = connect(&cli, account, config).await?;
            let report = engine.restore(&archive, request).await;
            engine.finish().await;
            archive.close().await;

            let report = report.context("restore failed")?;
            println!(
                "{} appended, {} already on the server, {} skipped",
                report.appended,
                report.already_present,
                report.errors.len()
            );
            Ok(report.is_complete())
        }
        Command::Clear { account } => {
            let confirmed = console::confirm_clear(
                &account.user,
                &mut std::io::stdin().lock(),
                &mut std::io::stdout().lock(),
            )?;
            if !confirmed {
                println!("Aborted.");
                return Ok(true);
            }

            let mut engine = connect(&cli, account, config).await?;
            let report = engine.clear().await;
            engine.finish().await;

            let report = report.context("clear failed")?;
            println!(
                "{} messages deleted from {} folders, {} folders removed",
                report.messages_deleted, report.folders_emptied, report.folders_deleted
            );
            Ok(report.errors.is_empty())
        }
        Command::List { account } => {
            let mut engine = connect(&cli, account, config).await?;
            let folders = engine.list().await;
            engine.finish().await;

            for folder in folders.context("list failed")? {
                if folder.display_name == folder.wire_name {
                    println!("{:>8}  {}", folder.messages, folder.display_name);
                } else {
                    println!(
                        "{:>8}  {} ({})",
                        folder.messages, folder.display_name, folder.wire_name
                    );
                }
            }
            Ok(true)
        }
    }
}

fn load_config(cli: &Cli) -> Result<EngineConfig> {
    let mut config = EngineConfig::load(cli.config.as_deref())?;
    if let Some(host) = &cli.host {
        config.host.clone_from(host);
    }
    if let Some(port) = cli.port {
        config.port = port;
    }
    config.validate()?;
    Ok(config)
}

fn date_range(range: &Range) -> Result<DateRange> {
    Ok(DateRange::from_args(
        range.since.as_deref(),
        range.before.as_deref(),
    )?)
}

async fn open_archive(dir: &Path, config: &EngineConfig) -> Result<Archive> {
    let archive = Archive::open(dir)
        .await
        .with_context(|| format!("cannot open backup directory {}", dir.display()))?;
    let archive = archive.with_page_size(config.index_page_size);
    info!(dir = %archive.root().display(), entries = archive.len().await?, "archive opened");
    Ok(archive)
}

/// Builds the engine, hooks Ctrl-C to its cancel flag and logs in.
async fn connect(cli: &Cli, account: &Account, config: EngineConfig) -> Result<Engine<ImapSession>> {
    let credentials = if cli.oauth2 {
        Credentials::oauth2(&account.user, &account.password)
    } else {
        Credentials::password(&account.user, &account.password)
    };

    let cancel = CancelFlag::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\ninterrupted, stopping after the current message");
            on_signal.cancel();
        }
    });

    let session = ImapSession::new(config.imap_config(), config.retry);
    let mut engine = Engine::new(session, config)
        .with_notifier(Arc::new(ConsoleNotifier))
        .with_cancel_flag(cancel);

    info!(host = %engine.config().host, port = engine.config().port, "connecting");
    engine
        .start(&credentials)
        .await
        .with_context(|| format!("cannot log in as {}", account.user))?;
    engine.check_for_update().await;
    Ok(engine)
}
