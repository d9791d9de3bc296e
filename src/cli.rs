//! Command line definitions.
//!
//! Each page of the terminal maps to one subcommand (or subcommand group).
//! Handlers live in `commands/`.

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::config::{ConfigOverrides, ENV_DATA_DIR, ENV_HTTP_TIMEOUT};
use crate::models::{CashierType, PaymentType};
use crate::receipt_renderer::CopyKind;

/// pos - restaurant point of sale
#[derive(Parser, Debug)]
#[command(name = "pos")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Directory holding the local database, logs, receipts and exports
    #[arg(long, global = true, env = ENV_DATA_DIR)]
    pub data_dir: Option<PathBuf>,

    /// Data service request timeout in seconds
    #[arg(long, global = true, env = ENV_HTTP_TIMEOUT)]
    pub timeout: Option<u64>,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            data_dir: self.data_dir.clone(),
            http_timeout_secs: self.timeout,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    // === Session ===
    /// Log in with the admin password or a cashier name
    Login {
        /// Password or cashier name; prompted for when omitted
        input: Option<String>,
    },

    /// End the current session
    Logout,

    /// Show the current session and the pages it may open
    Whoami,

    // === Setup ===
    /// Store the data service URL and anon key in the OS credential store
    Configure(ConfigureArgs),

    /// Local health snapshot (secrets redacted)
    Status,

    /// Version and build information
    About,

    // === Administrator ===
    /// Today's totals, recent orders and the cashier leaderboard
    Dashboard,

    /// Menu management
    #[command(subcommand)]
    Foods(FoodsCommand),

    /// Cashier management
    #[command(subcommand)]
    Cashiers(CashiersCommand),

    /// All orders with filters, pagination and CSV export
    Orders(OrdersArgs),

    // === Cashier ===
    /// Create an order from the menu
    Order(NewOrderArgs),

    /// Orders taken by the logged-in cashier
    MyOrders(MyOrdersArgs),

    /// Print the receipt of an order
    Receipt(ReceiptArgs),
}

#[derive(Args, Debug)]
pub struct ConfigureArgs {
    /// Data service URL, e.g. https://xyz.supabase.co
    #[arg(long, conflicts_with = "connection_string")]
    pub url: Option<String>,

    /// Data service anon key
    #[arg(long, requires = "url")]
    pub anon_key: Option<String>,

    /// JSON or base64-encoded JSON with `url` and `key`
    #[arg(long)]
    pub connection_string: Option<String>,

    /// Probe the service with the resolved credentials and store nothing
    #[arg(long)]
    pub check: bool,

    /// Delete the stored credentials
    #[arg(long, conflicts_with_all = ["url", "connection_string", "check"])]
    pub reset: bool,
}

#[derive(Args, Debug, Clone, Default)]
pub struct FoodFields {
    /// Food name
    #[arg(long)]
    pub name: String,

    /// Price, e.g. 1500 or 1500.50
    #[arg(long)]
    pub price: String,

    #[arg(long)]
    pub description: Option<String>,

    /// Main Dish, Appetizer, Dessert, Drink, Side Dish, or free text
    #[arg(long)]
    pub category: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum FoodsCommand {
    /// List every food, newest first
    #[command(alias = "ls")]
    List,

    /// Add a food (saved as available)
    Add(FoodFields),

    /// Edit a food (saved as available)
    Edit {
        /// Food id
        id: String,

        #[command(flatten)]
        fields: FoodFields,
    },

    /// Flip a food between available and unavailable
    Toggle {
        /// Food id
        id: String,
    },

    /// Delete a food
    Delete {
        /// Food id
        id: String,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum CashierKind {
    Cash,
    TransferPos,
}

impl From<CashierKind> for CashierType {
    fn from(kind: CashierKind) -> Self {
        match kind {
            CashierKind::Cash => CashierType::Cash,
            CashierKind::TransferPos => CashierType::TransferPos,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct CashierFields {
    /// Cashier name, used to log in
    #[arg(long)]
    pub name: String,

    /// Payment methods the cashier may take
    #[arg(long = "type", value_enum, default_value = "cash")]
    pub kind: CashierKind,

    /// Save the cashier as inactive
    #[arg(long)]
    pub inactive: bool,
}

#[derive(Subcommand, Debug)]
pub enum CashiersCommand {
    /// List every cashier, newest first
    #[command(alias = "ls")]
    List,

    /// Add a cashier
    Add(CashierFields),

    /// Edit a cashier
    Edit {
        /// Cashier id
        id: String,

        #[command(flatten)]
        fields: CashierFields,
    },

    /// Delete a cashier
    Delete {
        /// Cashier id
        id: String,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum PaymentArg {
    Cash,
    Transfer,
    Pos,
}

impl From<PaymentArg> for PaymentType {
    fn from(arg: PaymentArg) -> Self {
        match arg {
            PaymentArg::Cash => PaymentType::Cash,
            PaymentArg::Transfer => PaymentType::Transfer,
            PaymentArg::Pos => PaymentType::Pos,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum CopyArg {
    Customer,
    Merchant,
    Both,
}

impl CopyArg {
    pub fn kinds(self) -> Vec<CopyKind> {
        match self {
            Self::Customer => vec![CopyKind::Customer],
            Self::Merchant => vec![CopyKind::Merchant],
            Self::Both => vec![CopyKind::Customer, CopyKind::Merchant],
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct PrintArgs {
    /// Receipt copies to print
    #[arg(long, value_enum, default_value = "customer")]
    pub copy: CopyArg,

    /// Write the receipt file without opening the browser print dialog
    #[arg(long)]
    pub no_browser: bool,
}

#[derive(Args, Debug)]
pub struct NewOrderArgs {
    /// `NAME[:QTY]` or `ID[:QTY]`; repeat for more items
    #[arg(short, long = "item")]
    pub items: Vec<String>,

    /// Payment method (defaults to the first one the cashier may take)
    #[arg(short, long, value_enum)]
    pub payment: Option<PaymentArg>,

    /// Customer name (optional)
    #[arg(short, long)]
    pub customer: Option<String>,

    /// Search the menu instead of ordering
    #[arg(long, conflicts_with = "items")]
    pub search: Option<String>,

    /// Print the receipt after the order is created
    #[arg(long)]
    pub print: bool,

    #[command(flatten)]
    pub print_args: PrintArgs,
}

#[derive(Args, Debug)]
pub struct OrdersArgs {
    /// First day to include (YYYY-MM-DD, local time)
    #[arg(long)]
    pub from: Option<NaiveDate>,

    /// Last day to include (YYYY-MM-DD, local time)
    #[arg(long)]
    pub to: Option<NaiveDate>,

    #[arg(long, value_enum)]
    pub payment: Option<PaymentArg>,

    /// Cashier id or name
    #[arg(long)]
    pub cashier: Option<String>,

    /// Page to show (10 orders per page)
    #[arg(long, default_value_t = 1)]
    pub page: usize,

    /// Write the filtered orders to a CSV file under the exports directory
    #[arg(long)]
    pub export: bool,

    /// Show the details of one order (id or order number)
    #[arg(long)]
    pub show: Option<String>,
}

#[derive(Args, Debug)]
pub struct MyOrdersArgs {
    /// Print the receipt of one of your orders (id or order number)
    #[arg(long)]
    pub receipt: Option<String>,

    #[command(flatten)]
    pub print_args: PrintArgs,
}

#[derive(Args, Debug)]
pub struct ReceiptArgs {
    /// Order number, e.g. ORD1714557600123
    pub order_number: String,

    #[command(flatten)]
    pub print_args: PrintArgs,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_definitions_are_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn order_arguments_parse() {
        let cli = Cli::try_parse_from([
            "pos",
            "order",
            "-i",
            "Jollof Rice:2",
            "-i",
            "Coke",
            "--payment",
            "pos",
            "--print",
            "--copy",
            "both",
        ])
        .expect("parse");
        let Command::Order(args) = cli.command else {
            panic!("expected order command");
        };
        assert_eq!(args.items, vec!["Jollof Rice:2", "Coke"]);
        assert_eq!(args.payment.map(PaymentType::from), Some(PaymentType::Pos));
        assert!(args.print);
        assert_eq!(args.print_args.copy.kinds().len(), 2);
    }

    #[test]
    fn orders_filters_parse_dates_and_cashier_types_map() {
        let cli = Cli::try_parse_from([
            "pos", "orders", "--from", "2024-05-01", "--to", "2024-05-31", "--page", "2",
        ])
        .expect("parse");
        let Command::Orders(args) = cli.command else {
            panic!("expected orders command");
        };
        assert_eq!(args.from, NaiveDate::from_ymd_opt(2024, 5, 1));
        assert_eq!(args.page, 2);

        let cli = Cli::try_parse_from([
            "pos", "cashiers", "add", "--name", "Aisha", "--type", "transfer-pos",
        ])
        .expect("parse");
        let Command::Cashiers(CashiersCommand::Add(fields)) = cli.command else {
            panic!("expected cashiers add");
        };
        assert_eq!(CashierType::from(fields.kind), CashierType::TransferPos);
        assert!(!fields.inactive);
    }

    #[test]
    fn configure_reset_conflicts_with_new_credentials() {
        assert!(Cli::try_parse_from(["pos", "configure", "--reset", "--url", "https://x.co"]).is_err());
    }
}
