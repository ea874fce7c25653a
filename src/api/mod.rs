//! The remote tracker API and an in-memory stand-in for it.
//!
//! Everything outside this module works with the `model` types. The `_id`-keyed records that the
//! server sends are converted in `wire`.

mod http;
mod test_tracker;
mod wire;

use crate::model::{Client, ClientUpdate, Filter, NewEntry, Transaction, VisitEntry};
use crate::{Config, Result};
use serde::Serialize;

pub(crate) use http::HttpTracker;
pub use test_tracker::{TestTracker, TestTrackerState};

/// When this environment variable is set and non-empty the app runs against `TestTracker`.
pub const LEDGER_IN_TEST_MODE: &str = "LEDGER_IN_TEST_MODE";

/// Which `Tracker` implementation the app should use.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    #[default]
    Http,
    Test,
}

impl Mode {
    pub fn from_env() -> Self {
        match std::env::var(LEDGER_IN_TEST_MODE) {
            Ok(value) if !value.is_empty() => Mode::Test,
            _ => Mode::Http,
        }
    }
}

/// The clients and transactions returned by a fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Collections {
    pub clients: Vec<Client>,
    pub transactions: Vec<Transaction>,
}

/// The result of recording income or an expense. `client` is absent for expenses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Recorded {
    pub client: Option<Client>,
    pub transaction: Transaction,
}

/// The result of editing a client. A visit edit also returns the transaction it changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Edited {
    pub client: Client,
    pub updated_transaction: Option<Transaction>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Deleted {
    pub client_id: String,
    pub transactions_deleted: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Cleared {
    pub clients_deleted: u64,
    pub transactions_deleted: u64,
    pub expenses_deleted: u64,
}

/// The operations the tracker server supports.
#[async_trait::async_trait]
pub trait Tracker: Send + Sync {
    /// Everything the server holds for `filter`.
    async fn fetch_all(&self, filter: &Filter) -> Result<Collections>;

    /// Records a new entry. Income for an unknown client name creates the client.
    async fn add_entry(&self, entry: &NewEntry) -> Result<Recorded>;

    /// Adds a visit, and its income, to an existing client.
    async fn add_visit(&self, client_id: &str, visit: &VisitEntry) -> Result<Recorded>;

    async fn update_client(&self, client_id: &str, update: &ClientUpdate) -> Result<Edited>;

    /// Deletes a client together with its transactions.
    async fn delete_client(&self, client_id: &str) -> Result<Deleted>;

    /// Deletes everything.
    async fn reset(&self) -> Result<Cleared>;
}

/// Creates the `Tracker` for `mode`. In test mode the tracker starts from the seed data.
pub fn tracker(config: &Config, mode: Mode) -> Result<Box<dyn Tracker>> {
    Ok(match mode {
        Mode::Http => Box::new(HttpTracker::new(config)?),
        Mode::Test => Box::new(TestTracker::seeded()?),
    })
}
