use crate::analytics::{compose, Dashboard, DashboardOptions};
use crate::api::Mode;
use crate::commands::{open_session, Out};
use crate::model::Filter;
use crate::{Config, Result};
use tracing::warn;

/// Fetches the ledger for `filter` and composes the dashboard.
pub async fn dashboard(config: Config, mode: Mode, filter: Filter) -> Result<Out<Dashboard>> {
    let session = open_session(&config, mode, filter).await?;
    let snapshot = session.snapshot()?;

    let unreconciled = snapshot.unreconciled_income();
    if !unreconciled.is_empty() {
        warn!(
            "{} income transactions do not match a client visit",
            unreconciled.len()
        );
    }

    let options = DashboardOptions {
        top_services: config.top_services(),
    };
    let dashboard = compose(
        snapshot.transactions(),
        snapshot.clients(),
        &filter,
        &options,
    );
    let message = format!(
        "{filter}: income {}, expenses {}, balance {}",
        dashboard.total_income, dashboard.total_expenses, dashboard.balance
    );
    Ok(Out::new(message, dashboard))
}
