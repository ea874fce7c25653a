//! Command handlers for the ledger CLI.
//!
//! This module contains implementations for all CLI subcommands.

mod analytics;
mod clients;
mod dashboard;
mod entries;
mod init;
mod reset;

use crate::api::{tracker, Mode};
use crate::error::{ErrorType, IntoResult};
use crate::model::Filter;
use crate::session::Session;
use crate::{Config, Result};
use anyhow::Context;
use serde::Serialize;
use std::fmt::Debug;
use tracing::{debug, info};

pub use analytics::{analytics, Analytics, MonthlyTotal};
pub use clients::{client, clients, delete_client, edit_client, edit_visit};
pub use dashboard::dashboard;
pub use entries::{add_entry, add_visit};
pub use init::init;
pub use reset::reset;

/// The output type for a command. This allows the command to return a consistent message and,
/// optionally, structured data.
#[derive(Debug, Clone, Serialize)]
pub struct Out<T>
where
    T: Serialize + Clone + Debug,
{
    /// A message that can be printed to the user regarding the outcome of the command execution.
    message: String,

    /// Any structured data that needs to be output from the call.
    structure: Option<T>,
}

impl<T, S> From<S> for Out<T>
where
    T: Debug + Clone + Serialize,
    S: Into<String>,
{
    fn from(value: S) -> Self {
        Out::new_message(value)
    }
}

impl<T> Out<T>
where
    T: Serialize + Clone + Debug,
{
    /// Create a new `Out` object that has `Some(structure)`.
    pub fn new<S>(message: S, structure: T) -> Self
    where
        S: Into<String>,
    {
        Self {
            message: message.into(),
            structure: Some(structure),
        }
    }

    /// Create a new `Out` object that has `None` for `structure`.
    pub fn new_message<S>(message: S) -> Self
    where
        S: Into<String>,
    {
        Self {
            message: message.into(),
            structure: None,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn structure(&self) -> Option<&T> {
        self.structure.as_ref()
    }

    /// Print the message to `info!` and the structured data (if it exists) as JSON to `debug!`.
    pub fn print(&self) {
        info!("{}", self.message);
        if let Some(structure) = self.structure() {
            if let Ok(json) = serde_json::to_string_pretty(structure) {
                debug!("Command output:\n\n{json}\n\n");
            }
        }
    }

    /// Like `print`, and also writes the structured data to stdout as pretty JSON.
    pub fn print_data(&self) -> Result<()> {
        info!("{}", self.message);
        if let Some(structure) = self.structure() {
            let json = serde_json::to_string_pretty(structure)
                .context("Unable to serialize the command output")
                .pub_result(ErrorType::Io)?;
            println!("{json}");
        }
        Ok(())
    }
}

/// Opens a session with a fresh snapshot for `filter`.
async fn open_session(config: &Config, mode: Mode, filter: Filter) -> Result<Session> {
    let tracker = tracker(config, mode).pub_result(ErrorType::Config)?;
    Session::open(tracker, filter)
        .await
        .pub_result(ErrorType::Request)
}

/// A session with no snapshot, for commands that only submit.
fn submit_session(config: &Config, mode: Mode) -> Result<Session> {
    let tracker = tracker(config, mode).pub_result(ErrorType::Config)?;
    Ok(Session::new(tracker))
}
