use crate::api::{Cleared, Mode};
use crate::commands::{submit_session, Out};
use crate::error::{ErrorType, IntoResult};
use crate::{Config, Result};
use anyhow::anyhow;

/// Deletes every client, transaction and expense held by the tracker. `confirmed` must be true.
pub async fn reset(config: Config, mode: Mode, confirmed: bool) -> Result<Out<Cleared>> {
    if !confirmed {
        return Err(anyhow!("Resetting deletes all data, pass --yes to confirm"))
            .pub_result(ErrorType::Validation);
    }
    let session = submit_session(&config, mode)?;
    let cleared = session.reset().await.pub_result(ErrorType::Request)?;
    Ok(Out::new(
        format!(
            "Deleted {} clients, {} transactions and {} expenses",
            cleared.clients_deleted, cleared.transactions_deleted, cleared.expenses_deleted
        ),
        cleared,
    ))
}
