//! Command-line arguments.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "mailvault", version)]
#[command(about = "Back up and restore IMAP mailboxes", long_about = None)]
pub struct Cli {
    /// IMAP server host, overriding the configuration file
    #[arg(long, global = true)]
    pub host: Option<String>,

    /// IMAP server port (implicit TLS), overriding the configuration file
    #[arg(long, global = true)]
    pub port: Option<u16>,

    /// Configuration file (JSON)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Treat the password argument as an OAuth2 access token
    #[arg(long, global = true)]
    pub oauth2: bool,

    /// More logging; repeat for more
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Copy messages from the server into a backup directory
    Backup {
        /// Backup directory
        dir: PathBuf,
        #[command(flatten)]
        account: Account,
        #[command(flatten)]
        range: Range,
        /// Continue from the last successful backup and record this one
        #[arg(long)]
        stamp: bool,
    },
    /// Append archived messages the server does not have
    Restore {
        /// Backup directory
        dir: PathBuf,
        #[command(flatten)]
        account: Account,
        #[command(flatten)]
        range: Range,
    },
    /// Delete every message on the account
    Clear {
        #[command(flatten)]
        account: Account,
    },
    /// Show folders and their message counts
    List {
        #[command(flatten)]
        account: Account,
    },
    /// Print the version
    Version,
}

#[derive(Args, Debug)]
pub struct Account {
    /// Login name, usually the email address
    pub user: String,
    /// Password, or access token with --oauth2
    pub password: String,
}

#[derive(Args, Debug)]
pub struct Range {
    /// First day to include (YYYYMMDD)
    #[arg(long, value_name = "YYYYMMDD")]
    pub since: Option<String>,
    /// First day to exclude (YYYYMMDD)
    #[arg(long, value_name = "YYYYMMDD")]
    pub before: Option<String>,
}

impl Cli {
    /// Log filter used when `RUST_LOG` is unset.
    pub fn default_log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "mailvault=info,mailvault_core=info,mailvault_imap=warn",
            1 => "mailvault=debug,mailvault_core=debug,mailvault_imap=info",
            _ => "mailvault=trace,mailvault_core=trace,mailvault_imap=debug",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backup_with_range_and_stamp() {
        let cli = Cli::try_parse_from([
            "mailvault",
            "backup",
            "out",
            "me@example.com",
            "pw",
            "--since",
            "20240101",
            "--stamp",
        ])
        .unwrap();
        let Command::Backup {
            dir,
            account,
            range,
            stamp,
        } = cli.command
        else {
            panic!("expected backup");
        };
        assert_eq!(dir, PathBuf::from("out"));
        assert_eq!(account.user, "me@example.com");
        assert_eq!(range.since.as_deref(), Some("20240101"));
        assert_eq!(range.before, None);
        assert!(stamp);
    }

    #[test]
    fn global_flags_after_the_subcommand() {
        let cli = Cli::try_parse_from([
            "mailvault", "list", "me", "token", "--oauth2", "--host", "imap.example.com",
            "--port", "1993", "-vv",
        ])
        .unwrap();
        assert!(cli.oauth2);
        assert_eq!(cli.host.as_deref(), Some("imap.example.com"));
        assert_eq!(cli.port, Some(1993));
        assert_eq!(cli.verbose, 2);
        assert!(cli.default_log_filter().contains("mailvault_imap=debug"));
    }

    #[test]
    fn clear_needs_credentials() {
        assert!(Cli::try_parse_from(["mailvault", "clear", "me"]).is_err());
        assert!(Cli::try_parse_from(["mailvault", "clear", "me", "pw"]).is_ok());
    }

    #[test]
    fn version_takes_no_arguments() {
        let cli = Cli::try_parse_from(["mailvault", "version"]).unwrap();
        assert!(matches!(cli.command, Command::Version));
        assert_eq!(cli.verbose, 0);
    }
}
