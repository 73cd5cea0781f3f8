//! Command-line interface for acerto.
//!
//! This module provides the CLI structure for the `acerto` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    BillingCommand, BillingEdit, BillingValues, CategoryArg, ConfigCommand, CustomerArgs,
    CustomerCommand, CustomerEdit, DebtCommand, EquipmentCommand, ExpenseCommand, KindArg,
    MethodArg, OutputFormat, PixCommand, ReportCommand, RouteCommand, StatusCommand,
    WarningCommand,
};

use crate::logging::Verbosity;

/// acerto - Route collection and billing for coin and ficha machines
///
/// Keeps customers, machines and visits; prints receipts, PIX codes and
/// period reports. Works offline and sends queued changes on reconnect.
#[derive(Debug, Parser)]
#[command(name = "acerto")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Queue changes locally instead of writing to the document store
    #[arg(long, global = true)]
    pub offline: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage customers
    #[command(subcommand)]
    Customer(CustomerCommand),

    /// Manage machines
    #[command(subcommand)]
    Equipment(EquipmentCommand),

    /// Record and correct visits
    #[command(subcommand)]
    Billing(BillingCommand),

    /// Register debt payments
    #[command(subcommand)]
    Debt(DebtCommand),

    /// Track expenses
    #[command(subcommand)]
    Expense(ExpenseCommand),

    /// Notes for the next visit
    #[command(subcommand)]
    Warning(WarningCommand),

    /// Plan routes
    #[command(subcommand)]
    Route(RouteCommand),

    /// Print a PIX payment code
    Pix(PixCommand),

    /// Period summary
    Report(ReportCommand),

    /// Send queued changes to the document store
    Sync,

    /// Show store and queue status
    Status(StatusCommand),

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> Verbosity {
        Verbosity::from_flags(self.verbose, self.quiet)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_name() {
        let cli = Cli::command();
        assert_eq!(cli.get_name(), "acerto");
    }

    #[test]
    fn test_cli_verify() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_verbosity() {
        let cli = Cli::try_parse_from(["acerto", "-q", "status"]).unwrap();
        assert_eq!(cli.verbosity(), Verbosity::Quiet);

        let cli = Cli::try_parse_from(["acerto", "-vv", "status"]).unwrap();
        assert_eq!(cli.verbosity(), Verbosity::Trace);

        let cli = Cli::try_parse_from(["acerto", "status"]).unwrap();
        assert_eq!(cli.verbosity(), Verbosity::Normal);
    }

    #[test]
    fn test_parse_with_config() {
        let args = ["acerto", "-c", "/custom/config.toml", "status"];
        let cli = Cli::try_parse_from(args).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/custom/config.toml")));
    }

    #[test]
    fn test_parse_offline_is_global() {
        let cli = Cli::try_parse_from(["acerto", "customer", "list", "--offline"]).unwrap();
        assert!(cli.offline);
    }

    #[test]
    fn test_parse_customer_add() {
        let args = [
            "acerto", "customer", "add", "Bar do Zé", "--phone", "(11) 98765-4321",
            "--latitude", "-22.9", "--longitude", "-47.06",
        ];
        let cli = Cli::try_parse_from(args).unwrap();
        match cli.command {
            Command::Customer(CustomerCommand::Add(args)) => {
                assert_eq!(args.name, "Bar do Zé");
                assert_eq!(args.phone.as_deref(), Some("(11) 98765-4321"));
                assert_eq!(args.latitude, Some(-22.9));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_customer_latitude_requires_longitude() {
        let args = ["acerto", "customer", "add", "Bar", "--latitude", "-22.9"];
        assert!(Cli::try_parse_from(args).is_err());
    }

    #[test]
    fn test_parse_billing_record() {
        let args = [
            "acerto", "billing", "record", "S-01", "--reading", "150", "--paid", "50,00",
        ];
        let cli = Cli::try_parse_from(args).unwrap();
        match cli.command {
            Command::Billing(BillingCommand::Record { equipment, values, share }) => {
                assert_eq!(equipment, "S-01");
                assert_eq!(values.reading, 150);
                assert_eq!(values.paid.as_deref(), Some("50,00"));
                assert!(!values.reset);
                assert!(!share);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_billing_record_requires_reading() {
        let args = ["acerto", "billing", "record", "S-01"];
        assert!(Cli::try_parse_from(args).is_err());
    }

    #[test]
    fn test_parse_debt_pay() {
        let args = ["acerto", "debt", "pay", "Bar do Zé", "10", "--method", "pix"];
        let cli = Cli::try_parse_from(args).unwrap();
        assert!(matches!(
            cli.command,
            Command::Debt(DebtCommand::Pay {
                method: MethodArg::Pix,
                ..
            })
        ));
    }

    #[test]
    fn test_parse_route_save() {
        let args = [
            "acerto", "route", "save", "Centro", "--customer", "a", "--customer", "b", "--weekday", "tue",
        ];
        let cli = Cli::try_parse_from(args).unwrap();
        match cli.command {
            Command::Route(RouteCommand::Save {
                customers, weekday, ..
            }) => {
                assert_eq!(customers, vec!["a", "b"]);
                assert_eq!(weekday, Some(chrono::Weekday::Tue));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_report_month_conflicts_with_range() {
        let args = ["acerto", "report", "--month", "2024-03", "--from", "2024-03-01"];
        assert!(Cli::try_parse_from(args).is_err());

        let cli = Cli::try_parse_from(["acerto", "report", "--month", "2024-03"]).unwrap();
        assert!(matches!(cli.command, Command::Report(_)));
    }

    #[test]
    fn test_parse_sync() {
        let cli = Cli::try_parse_from(["acerto", "sync"]).unwrap();
        assert!(matches!(cli.command, Command::Sync));
    }
}
