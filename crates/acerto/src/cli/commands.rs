//! CLI command definitions.
//!
//! Amounts are taken as text and parsed with the configured locale, so
//! `12,50` and `R$ 1.234,56` work the same as on a paper receipt.

use std::path::PathBuf;

use chrono::{NaiveDate, Weekday};
use clap::{Args, Subcommand, ValueEnum};

use crate::model::{EquipmentKind, ExpenseCategory, PaymentMethod};

/// Customer commands.
#[derive(Debug, Subcommand)]
pub enum CustomerCommand {
    /// Register an establishment
    Add(CustomerArgs),

    /// List customers
    List {
        /// Only customers with open debt
        #[arg(long)]
        debtors: bool,

        /// Output format
        #[arg(short, long, value_enum, default_value = "plain")]
        format: OutputFormat,
    },

    /// Show one customer with installed equipment
    Show {
        /// Customer id or name
        customer: String,
    },

    /// Change customer details
    Edit {
        /// Customer id or name
        customer: String,

        #[command(flatten)]
        details: CustomerEdit,
    },

    /// Delete a customer without installed equipment
    Delete {
        /// Customer id or name
        customer: String,
    },

    /// Print a debt statement
    Statement {
        /// Customer id or name
        customer: String,
    },
}

/// Details for a new customer.
#[derive(Debug, Args)]
pub struct CustomerArgs {
    /// Establishment name
    pub name: String,

    /// Contact phone
    #[arg(short, long)]
    pub phone: Option<String>,

    /// Street address
    #[arg(long)]
    pub address: Option<String>,

    /// City
    #[arg(long)]
    pub city: Option<String>,

    /// Latitude for route planning
    #[arg(long, requires = "longitude", allow_hyphen_values = true)]
    pub latitude: Option<f64>,

    /// Longitude for route planning
    #[arg(long, requires = "latitude", allow_hyphen_values = true)]
    pub longitude: Option<f64>,

    /// Free-form notes
    #[arg(short, long)]
    pub notes: Option<String>,
}

/// Fields to change on an existing customer.
#[derive(Debug, Args)]
pub struct CustomerEdit {
    /// New name
    #[arg(long)]
    pub name: Option<String>,

    /// New phone
    #[arg(short, long)]
    pub phone: Option<String>,

    /// New street address
    #[arg(long)]
    pub address: Option<String>,

    /// New city
    #[arg(long)]
    pub city: Option<String>,

    /// New latitude
    #[arg(long, requires = "longitude", allow_hyphen_values = true)]
    pub latitude: Option<f64>,

    /// New longitude
    #[arg(long, requires = "latitude", allow_hyphen_values = true)]
    pub longitude: Option<f64>,

    /// Mark the customer inactive
    #[arg(long, conflicts_with = "activate")]
    pub deactivate: bool,

    /// Mark the customer active
    #[arg(long)]
    pub activate: bool,

    /// New notes
    #[arg(short, long)]
    pub notes: Option<String>,
}

/// Equipment commands.
#[derive(Debug, Subcommand)]
pub enum EquipmentCommand {
    /// Register a machine
    Add {
        /// Number painted on the machine
        number: String,

        /// Kind of machine
        #[arg(short, long, value_enum, default_value = "pool-table")]
        kind: KindArg,

        /// Price per play; defaults to the configured price
        #[arg(long)]
        price: Option<String>,

        /// Establishment's share; defaults to the configured percent
        #[arg(long)]
        percent: Option<String>,

        /// Install at this customer (id or name)
        #[arg(long)]
        customer: Option<String>,

        /// Current counter reading
        #[arg(short, long, default_value = "0")]
        reading: u64,
    },

    /// List machines
    List {
        /// Only machines at this customer (id or name)
        #[arg(long)]
        customer: Option<String>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "plain")]
        format: OutputFormat,
    },

    /// Change price or split
    Edit {
        /// Equipment id or number
        equipment: String,

        /// New price per play
        #[arg(long)]
        price: Option<String>,

        /// New establishment share
        #[arg(long)]
        percent: Option<String>,

        /// New counter reading
        #[arg(short, long)]
        reading: Option<u64>,
    },

    /// Move a machine to a customer, or take it back with no customer
    Install {
        /// Equipment id or number
        equipment: String,

        /// Customer id or name; omit to take the machine back
        customer: Option<String>,
    },

    /// Delete a machine
    Delete {
        /// Equipment id or number
        equipment: String,
    },
}

/// Billing commands.
#[derive(Debug, Subcommand)]
pub enum BillingCommand {
    /// Record a visit
    Record {
        /// Equipment id or number
        equipment: String,

        #[command(flatten)]
        values: BillingValues,

        /// Print the share text and link instead of the receipt
        #[arg(long)]
        share: bool,
    },

    /// Correct a past visit
    Edit {
        /// Billing id
        billing: String,

        #[command(flatten)]
        values: BillingEdit,
    },

    /// Delete a visit and undo its effects
    Delete {
        /// Billing id
        billing: String,
    },

    /// List visits
    List {
        /// Only visits at this customer (id or name)
        #[arg(long)]
        customer: Option<String>,

        /// Maximum number of results
        #[arg(short, long, default_value = "20")]
        limit: usize,

        /// Output format
        #[arg(short, long, value_enum, default_value = "plain")]
        format: OutputFormat,
    },

    /// Print the receipt of a past visit
    Receipt {
        /// Billing id
        billing: String,

        /// Print the share text and link instead of the receipt
        #[arg(long)]
        share: bool,
    },
}

/// Values read at a visit.
#[derive(Debug, Args)]
pub struct BillingValues {
    /// Counter reading now
    #[arg(short, long)]
    pub reading: u64,

    /// Cash counted from the box, for coin machines
    #[arg(long)]
    pub counted: Option<String>,

    /// Discount before the split
    #[arg(short, long)]
    pub discount: Option<String>,

    /// Cash handed over
    #[arg(short, long)]
    pub paid: Option<String>,

    /// The counter went back to zero since the last visit
    #[arg(long)]
    pub reset: bool,

    /// Free-form notes
    #[arg(short, long)]
    pub notes: Option<String>,
}

/// Values to change on a past visit.
#[derive(Debug, Args)]
pub struct BillingEdit {
    /// Corrected counter reading
    #[arg(short, long)]
    pub reading: Option<u64>,

    /// Corrected cash count
    #[arg(long)]
    pub counted: Option<String>,

    /// Corrected discount
    #[arg(short, long)]
    pub discount: Option<String>,

    /// Corrected cash handed over
    #[arg(short, long)]
    pub paid: Option<String>,

    /// Corrected notes
    #[arg(short, long)]
    pub notes: Option<String>,
}

/// Debt commands.
#[derive(Debug, Subcommand)]
pub enum DebtCommand {
    /// Register a payment against a customer's debt
    Pay {
        /// Customer id or name
        customer: String,

        /// Amount paid
        amount: String,

        /// How it was paid
        #[arg(short, long, value_enum, default_value = "cash")]
        method: MethodArg,

        /// Free-form notes
        #[arg(short, long)]
        notes: Option<String>,

        /// Print the share text and link instead of the receipt
        #[arg(long)]
        share: bool,
    },

    /// List customers with open debt
    List,
}

/// Expense commands.
#[derive(Debug, Subcommand)]
pub enum ExpenseCommand {
    /// Register an expense
    Add {
        /// What was bought
        description: String,

        /// Amount spent
        amount: String,

        /// Category
        #[arg(long, value_enum, default_value = "other")]
        category: CategoryArg,
    },

    /// List expenses
    List {
        /// Output format
        #[arg(short, long, value_enum, default_value = "plain")]
        format: OutputFormat,
    },

    /// Delete an expense
    Delete {
        /// Expense id
        expense: String,
    },
}

/// Warning commands.
#[derive(Debug, Subcommand)]
pub enum WarningCommand {
    /// Leave a note for the next visit
    Add {
        /// What to look at
        message: String,

        /// Customer id or name
        #[arg(long)]
        customer: Option<String>,

        /// Equipment id or number
        #[arg(short, long)]
        equipment: Option<String>,
    },

    /// List open warnings
    List {
        /// Include resolved warnings
        #[arg(short, long)]
        all: bool,
    },

    /// Mark a warning as resolved
    Resolve {
        /// Warning id
        warning: String,
    },
}

/// Route commands.
#[derive(Debug, Subcommand)]
pub enum RouteCommand {
    /// Create or replace a route
    Save {
        /// Route name
        name: String,

        /// Customers in visiting order (id or name)
        #[arg(long = "customer")]
        customers: Vec<String>,

        /// Day of the week the route is driven
        #[arg(short, long, value_parser = parse_weekday)]
        weekday: Option<Weekday>,

        /// Replace this route instead of creating one
        #[arg(long)]
        id: Option<String>,
    },

    /// List routes
    List,

    /// Show a route's stops
    Show {
        /// Route id or name
        route: String,
    },

    /// Reorder a route by distance from the depot
    Optimize {
        /// Route id or name
        route: String,
    },

    /// Delete a route
    Delete {
        /// Route id or name
        route: String,
    },
}

/// PIX command arguments.
#[derive(Debug, Args)]
pub struct PixCommand {
    /// Amount to charge; omit to let the payer type it
    pub amount: Option<String>,

    /// Reference shown on the payer's statement
    #[arg(short, long)]
    pub reference: Option<String>,

    /// Message to the payer
    #[arg(short, long)]
    pub description: Option<String>,
}

/// Report command arguments.
#[derive(Debug, Args)]
pub struct ReportCommand {
    /// Month to report, e.g. 2024-03; defaults to the current month
    #[arg(short, long, value_parser = parse_month, conflicts_with_all = ["from", "to"])]
    pub month: Option<NaiveDate>,

    /// First day, inclusive
    #[arg(long, requires = "to")]
    pub from: Option<NaiveDate>,

    /// Last day, inclusive
    #[arg(long, requires = "from")]
    pub to: Option<NaiveDate>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "plain")]
    pub format: OutputFormat,
}

/// Status command arguments.
#[derive(Debug, Args)]
pub struct StatusCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

/// Equipment kind argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum KindArg {
    /// Pool table
    PoolTable,
    /// Jukebox
    Jukebox,
    /// Claw machine
    ClawMachine,
    /// Anything else
    Other,
}

impl From<KindArg> for EquipmentKind {
    fn from(arg: KindArg) -> Self {
        match arg {
            KindArg::PoolTable => Self::PoolTable,
            KindArg::Jukebox => Self::Jukebox,
            KindArg::ClawMachine => Self::ClawMachine,
            KindArg::Other => Self::Other,
        }
    }
}

/// Payment method argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MethodArg {
    /// Cash
    Cash,
    /// PIX
    Pix,
    /// Bank transfer
    Transfer,
}

impl From<MethodArg> for PaymentMethod {
    fn from(arg: MethodArg) -> Self {
        match arg {
            MethodArg::Cash => Self::Cash,
            MethodArg::Pix => Self::Pix,
            MethodArg::Transfer => Self::Transfer,
        }
    }
}

/// Expense category argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CategoryArg {
    /// Fuel
    Fuel,
    /// Repairs
    Maintenance,
    /// Spare parts
    Parts,
    /// Fichas
    Fichas,
    /// Meals
    Food,
    /// Anything else
    Other,
}

impl From<CategoryArg> for ExpenseCategory {
    fn from(arg: CategoryArg) -> Self {
        match arg {
            CategoryArg::Fuel => Self::Fuel,
            CategoryArg::Maintenance => Self::Maintenance,
            CategoryArg::Parts => Self::Parts,
            CategoryArg::Fichas => Self::Fichas,
            CategoryArg::Food => Self::Food,
            CategoryArg::Other => Self::Other,
        }
    }
}

/// Output format for commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Plain text output
    #[default]
    Plain,
    /// JSON output
    Json,
}

fn parse_weekday(value: &str) -> Result<Weekday, String> {
    value
        .parse::<Weekday>()
        .map_err(|_| format!("'{value}' is not a weekday (try mon, tue, ...)"))
}

fn parse_month(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(&format!("{value}-01"), "%Y-%m-%d")
        .map_err(|_| format!("'{value}' is not a month (expected YYYY-MM)"))
}
