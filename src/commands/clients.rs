use crate::analytics::ClientSummary;
use crate::api::{Deleted, Edited, Mode};
use crate::commands::{open_session, submit_session, Out};
use crate::error::{ErrorType, IntoResult};
use crate::model::{Amount, ClientUpdate, Filter};
use crate::{Config, Result};
use anyhow::anyhow;

/// Every client, most recently registered first.
pub async fn clients(config: Config, mode: Mode) -> Result<Out<Vec<ClientSummary>>> {
    let session = open_session(&config, mode, Filter::all()).await?;
    let snapshot = session.snapshot()?;
    let mut summaries: Vec<ClientSummary> = snapshot
        .clients()
        .iter()
        .map(|c| ClientSummary::new(c, snapshot.transactions()))
        .collect();
    summaries.sort_by(|a, b| b.registered.cmp(&a.registered));
    Ok(Out::new(format!("{} clients", summaries.len()), summaries))
}

/// The detail view for one client.
pub async fn client(config: Config, mode: Mode, client_id: &str) -> Result<Out<ClientSummary>> {
    let session = open_session(&config, mode, Filter::all()).await?;
    let snapshot = session.snapshot()?;
    let client = snapshot
        .client(client_id)
        .ok_or_else(|| anyhow!("No client with id '{client_id}'"))
        .pub_result(ErrorType::Validation)?;
    let summary = ClientSummary::new(client, snapshot.transactions());
    let message = format!(
        "{}: {} visits, {} spent",
        summary.name, summary.visit_count, summary.total_spent
    );
    Ok(Out::new(message, summary))
}

pub async fn edit_client(
    config: Config,
    mode: Mode,
    client_id: &str,
    name: &str,
) -> Result<Out<Edited>> {
    let update = ClientUpdate::Rename {
        name: name.to_string(),
    };
    update_client(config, mode, client_id, update).await
}

/// Changes the service and/or amount of one visit.
pub async fn edit_visit(
    config: Config,
    mode: Mode,
    client_id: &str,
    visit_id: &str,
    service: Option<String>,
    amount: Option<Amount>,
) -> Result<Out<Edited>> {
    let update = ClientUpdate::Visit {
        visit_id: visit_id.to_string(),
        service,
        amount,
    };
    update_client(config, mode, client_id, update).await
}

async fn update_client(
    config: Config,
    mode: Mode,
    client_id: &str,
    update: ClientUpdate,
) -> Result<Out<Edited>> {
    let update = update.validated().pub_result(ErrorType::Validation)?;
    let session = submit_session(&config, mode)?;
    let edited = session
        .update_client(client_id, update)
        .await
        .pub_result(ErrorType::Request)?;
    Ok(Out::new(
        format!("Updated client {}", edited.client.name),
        edited,
    ))
}

/// Deletes a client and, with it, every transaction that references the client.
pub async fn delete_client(config: Config, mode: Mode, client_id: &str) -> Result<Out<Deleted>> {
    let session = submit_session(&config, mode)?;
    let deleted = session
        .delete_client(client_id)
        .await
        .pub_result(ErrorType::Request)?;
    Ok(Out::new(
        format!(
            "Deleted client {} and {} transactions",
            deleted.client_id, deleted.transactions_deleted
        ),
        deleted,
    ))
}
