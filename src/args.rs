//! These structs provide the CLI interface for the ledger CLI.

use crate::model::{Amount, Date, Filter, Month, NewEntry, VisitEntry};
use clap::{Parser, Subcommand};
use std::convert::Infallible;
use std::fmt::{Display, Formatter};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::error;
use tracing_subscriber::filter::LevelFilter;

/// ledger: income, expenses and client retention for a small service business.
///
/// The ledger talks to a tracker API that holds your clients, their visits and your income and
/// expense transactions. It can record new entries, correct or delete existing ones, and compose
/// a dashboard of totals, retention and naive forecasts for any month or year.
///
/// Run `ledger init --api-url <URL>` first to point the ledger at your tracker.
#[derive(Debug, Parser, Clone)]
pub struct Args {
    #[clap(flatten)]
    common: Common,

    #[command(subcommand)]
    command: Command,
}

impl Args {
    pub fn new(common: Common, command: Command) -> Self {
        Self { common, command }
    }

    pub fn common(&self) -> &Common {
        &self.common
    }

    pub fn command(&self) -> &Command {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create the ledger home directory and its config.json.
    ///
    /// By default the home directory is $HOME/ledger. Pass --ledger-home or set LEDGER_HOME to
    /// keep it somewhere else.
    Init(InitArgs),
    /// Print the dashboard for a month or a year as JSON.
    Dashboard(FilterArgs),
    /// Print a month-by-month breakdown of a year together with its dashboard.
    Analytics(AnalyticsArgs),
    /// List every client with their spend and visit counts.
    Clients,
    /// Show one client and their visit history.
    Client(ClientIdArgs),
    /// Record income, an expense or a further visit.
    Add(AddArgs),
    /// Rename a client or correct one of their visits.
    Edit(EditArgs),
    /// Delete a client and their transactions.
    Delete(DeleteArgs),
    /// Delete all clients, transactions and expenses held by the tracker.
    Reset(ResetArgs),
}

/// Arguments common to all subcommands.
#[derive(Debug, Parser, Clone)]
pub struct Common {
    /// The logging verbosity. One of, from least to most verbose:
    /// off, error, warn, info, debug, trace
    ///
    /// This can be overridden by RUST_LOG.
    #[arg(long, default_value_t = LevelFilter::INFO)]
    log_level: LevelFilter,

    /// The directory where the ledger configuration is held. Defaults to ~/ledger
    #[arg(long, env = "LEDGER_HOME", default_value_t = default_ledger_home())]
    ledger_home: DisplayPath,
}

impl Common {
    pub fn new(log_level: LevelFilter, ledger_home: PathBuf) -> Self {
        Self {
            log_level,
            ledger_home: ledger_home.into(),
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    pub fn ledger_home(&self) -> &DisplayPath {
        &self.ledger_home
    }
}

/// Args for the `ledger init` command.
#[derive(Debug, Parser, Clone)]
pub struct InitArgs {
    /// The base URL of the tracker API, e.g. https://tracker.example.com
    #[arg(long)]
    api_url: String,
}

impl InitArgs {
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
        }
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }
}

/// The month and year a view covers.
#[derive(Debug, Parser, Clone)]
pub struct FilterArgs {
    /// A month number 1-12, or "all" for the whole year.
    #[arg(long, default_value_t = Month::All)]
    month: Month,

    /// The year to show. Defaults to the current year.
    #[arg(long, conflicts_with = "all_years")]
    year: Option<i32>,

    /// Do not restrict the view to a single year.
    #[arg(long)]
    all_years: bool,
}

impl FilterArgs {
    pub fn new(month: Month, year: Option<i32>, all_years: bool) -> Self {
        Self {
            month,
            year,
            all_years,
        }
    }

    /// The filter for these arguments, resolving a missing year to the current one.
    pub fn filter(&self) -> Filter {
        let year = if self.all_years {
            None
        } else {
            Some(self.year.unwrap_or_else(|| Date::now().year()))
        };
        Filter::new(self.month, year)
    }
}

#[derive(Debug, Parser, Clone)]
pub struct AnalyticsArgs {
    /// The year to break down. Defaults to the current year.
    #[arg(long)]
    year: Option<i32>,
}

impl AnalyticsArgs {
    pub fn new(year: Option<i32>) -> Self {
        Self { year }
    }

    pub fn year(&self) -> i32 {
        self.year.unwrap_or_else(|| Date::now().year())
    }
}

#[derive(Debug, Parser, Clone)]
pub struct ClientIdArgs {
    /// The client's id.
    client_id: String,
}

impl ClientIdArgs {
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
        }
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }
}

#[derive(Debug, Parser, Clone)]
pub struct AddArgs {
    #[command(subcommand)]
    entity: AddSubcommand,
}

impl AddArgs {
    pub fn new(entity: AddSubcommand) -> Self {
        Self { entity }
    }

    pub fn entity(&self) -> &AddSubcommand {
        &self.entity
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum AddSubcommand {
    /// Record income from a client. An unknown client name creates a new client.
    Income(AddIncomeArgs),
    /// Record an expense.
    Expense(AddExpenseArgs),
    /// Record a further visit, and its income, for an existing client.
    Visit(AddVisitArgs),
}

#[derive(Debug, Parser, Clone)]
pub struct AddIncomeArgs {
    #[arg(long)]
    client_name: String,

    #[arg(long)]
    service: String,

    /// The amount, e.g. 65, 65.00 or £1,000.00
    #[arg(long)]
    amount: Amount,

    /// YYYY-MM-DD. Defaults to today.
    #[arg(long)]
    date: Option<Date>,
}

impl AddIncomeArgs {
    pub fn new(client_name: impl Into<String>, service: impl Into<String>, amount: Amount) -> Self {
        Self {
            client_name: client_name.into(),
            service: service.into(),
            amount,
            date: None,
        }
    }

    pub fn entry(&self) -> NewEntry {
        NewEntry::Income {
            client_name: self.client_name.clone(),
            service: self.service.clone(),
            amount: self.amount,
            date: self.date,
        }
    }
}

#[derive(Debug, Parser, Clone)]
pub struct AddExpenseArgs {
    #[arg(long)]
    category: String,

    #[arg(long)]
    amount: Amount,

    /// YYYY-MM-DD. Defaults to today.
    #[arg(long)]
    date: Option<Date>,
}

impl AddExpenseArgs {
    pub fn new(category: impl Into<String>, amount: Amount) -> Self {
        Self {
            category: category.into(),
            amount,
            date: None,
        }
    }

    pub fn entry(&self) -> NewEntry {
        NewEntry::Expense {
            category: self.category.clone(),
            amount: self.amount,
            date: self.date,
        }
    }
}

#[derive(Debug, Parser, Clone)]
pub struct AddVisitArgs {
    #[arg(long)]
    client_id: String,

    #[arg(long)]
    service: String,

    #[arg(long)]
    amount: Amount,

    /// YYYY-MM-DD. Defaults to today.
    #[arg(long)]
    date: Option<Date>,
}

impl AddVisitArgs {
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn visit(&self) -> VisitEntry {
        VisitEntry {
            service: self.service.clone(),
            amount: self.amount,
            date: self.date,
        }
    }
}

#[derive(Debug, Parser, Clone)]
pub struct EditArgs {
    #[command(subcommand)]
    entity: EditSubcommand,
}

impl EditArgs {
    pub fn entity(&self) -> &EditSubcommand {
        &self.entity
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum EditSubcommand {
    /// Rename a client.
    Client(EditClientArgs),
    /// Change the service and/or amount of one visit. The matching transaction changes with it.
    Visit(EditVisitArgs),
}

#[derive(Debug, Parser, Clone)]
pub struct EditClientArgs {
    client_id: String,

    #[arg(long)]
    name: String,
}

impl EditClientArgs {
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

#[derive(Debug, Parser, Clone)]
pub struct EditVisitArgs {
    client_id: String,

    #[arg(long)]
    visit_id: String,

    #[arg(long)]
    service: Option<String>,

    #[arg(long)]
    amount: Option<Amount>,
}

impl EditVisitArgs {
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn visit_id(&self) -> &str {
        &self.visit_id
    }

    pub fn service(&self) -> Option<&str> {
        self.service.as_deref()
    }

    pub fn amount(&self) -> Option<Amount> {
        self.amount
    }
}

#[derive(Debug, Parser, Clone)]
pub struct DeleteArgs {
    #[command(subcommand)]
    entity: DeleteSubcommand,
}

impl DeleteArgs {
    pub fn entity(&self) -> &DeleteSubcommand {
        &self.entity
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum DeleteSubcommand {
    /// Delete a client together with every transaction that references them.
    Client(ClientIdArgs),
}

#[derive(Debug, Parser, Clone)]
pub struct ResetArgs {
    /// Confirm that everything should be deleted.
    #[arg(long)]
    yes: bool,
}

impl ResetArgs {
    pub fn new(yes: bool) -> Self {
        Self { yes }
    }

    pub fn yes(&self) -> bool {
        self.yes
    }
}

fn default_ledger_home() -> DisplayPath {
    DisplayPath(match dirs::home_dir() {
        Some(home) => home.join("ledger"),
        None => {
            error!(
                "There was an error when trying to get your home directory. You can get around \
                this by providing --ledger-home or LEDGER_HOME instead of relying on the default \
                ledger home directory. If you continue using the program right now, you may have \
                problems!",
            );
            PathBuf::from("ledger")
        }
    })
}

#[derive(Debug, Default, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct DisplayPath(PathBuf);

impl From<PathBuf> for DisplayPath {
    fn from(value: PathBuf) -> Self {
        DisplayPath(value)
    }
}

impl Deref for DisplayPath {
    type Target = Path;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<Path> for DisplayPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl Display for DisplayPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_string_lossy())
    }
}

impl FromStr for DisplayPath {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(PathBuf::from(s)))
    }
}

impl DisplayPath {
    pub fn new(path: PathBuf) -> Self {
        Self(path)
    }

    pub fn path(&self) -> &Path {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("ledger").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_dashboard_defaults_to_current_year() {
        let args = parse(&["dashboard"]);
        let Command::Dashboard(filter) = args.command() else {
            panic!("expected the dashboard command");
        };
        assert_eq!(filter.filter(), Filter::year(Date::now().year()));
    }

    #[test]
    fn test_dashboard_month_of_all_years() {
        let args = parse(&["dashboard", "--month", "3", "--all-years"]);
        let Command::Dashboard(filter) = args.command() else {
            panic!("expected the dashboard command");
        };
        assert_eq!(filter.filter(), Filter::new(Month::Month(3), None));
    }

    #[test]
    fn test_year_conflicts_with_all_years() {
        let result =
            Args::try_parse_from(["ledger", "dashboard", "--year", "2024", "--all-years"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_add_income() {
        let args = parse(&[
            "add",
            "income",
            "--client-name",
            "Amara Okafor",
            "--service",
            "Box Braids",
            "--amount",
            "£120",
            "--date",
            "2025-07-03",
        ]);
        let Command::Add(add) = args.command() else {
            panic!("expected the add command");
        };
        let AddSubcommand::Income(income) = add.entity() else {
            panic!("expected income");
        };
        let NewEntry::Income { amount, date, .. } = income.entry() else {
            panic!("expected an income entry");
        };
        assert_eq!(amount.fixed(), "120.00");
        assert_eq!(date, Date::ymd(2025, 7, 3));
    }

    #[test]
    fn test_bad_month_is_rejected() {
        assert!(Args::try_parse_from(["ledger", "dashboard", "--month", "13"]).is_err());
    }

    #[test]
    fn test_log_level_and_home() {
        let args = parse(&["--log-level", "debug", "--ledger-home", "/tmp/l", "clients"]);
        assert_eq!(args.common().log_level(), LevelFilter::DEBUG);
        assert_eq!(args.common().ledger_home().path(), Path::new("/tmp/l"));
    }
}
