//! Implements the `Tracker` trait over HTTP using `reqwest`.

use crate::api::wire::{
    AddVisit, AllData, ClientTransaction, DeletedClient, EntryRequest, Envelope, ErrorBody,
    ExpenseTransaction, ResetData, UpdateClient, UpdatedClient,
};
use crate::api::{Cleared, Collections, Deleted, Edited, Recorded, Tracker};
use crate::model::{Client, ClientUpdate, Filter, NewEntry, Transaction, VisitEntry};
use crate::{Config, Result};
use anyhow::{anyhow, bail, Context};
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, trace};
use url::Url;

const TRACKER: &str = "tracker";

pub(crate) struct HttpTracker {
    client: reqwest::Client,
    base: Url,
}

impl HttpTracker {
    pub(crate) fn new(config: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs()))
            .build()
            .context("Unable to create the HTTP client")?;
        Ok(Self {
            client,
            base: config.api_url().clone(),
        })
    }

    /// The URL for `/tracker/{segments...}` under the configured base. Segments are percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| anyhow!("The API URL '{}' cannot be used as a base", self.base))?
            .pop_if_empty()
            .push(TRACKER)
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, segments: &[&str]) -> Result<RequestBuilder> {
        let url = self.endpoint(segments)?;
        trace!("{method} {url}");
        Ok(self.client.request(method, url))
    }

    /// Sends `request` and returns the body of a successful response. A non-2xx status, or a 2xx
    /// with `success: false`, is an error carrying the server's message.
    async fn send<T>(&self, request: RequestBuilder, action: &str) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let response = request
            .send()
            .await
            .with_context(|| format!("Unable to reach the tracker API to {action}"))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .with_context(|| format!("Unable to read the tracker API response to {action}"))?;
        debug!("The tracker API responded {status} to {action}");

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorBody>(&text)
                .map(|body| body.message)
                .unwrap_or(text);
            bail!("The tracker API could not {action}: {status}: {message}");
        }

        let envelope: Envelope<T> = serde_json::from_str(&text)
            .with_context(|| format!("Unable to parse the tracker API response to {action}"))?;
        envelope.into_body(action)
    }
}

#[async_trait::async_trait]
impl Tracker for HttpTracker {
    async fn fetch_all(&self, filter: &Filter) -> Result<Collections> {
        let request = self.request(Method::GET, &["all"])?.query(&filter.query());
        let all: AllData = self.send(request, "fetch the ledger").await?;
        Ok(Collections {
            clients: all.data.clients.into_iter().map(Client::from).collect(),
            transactions: all
                .data
                .transactions
                .into_iter()
                .map(Transaction::from)
                .collect(),
        })
    }

    async fn add_entry(&self, entry: &NewEntry) -> Result<Recorded> {
        match EntryRequest::from(entry) {
            EntryRequest::Income(body) => {
                let request = self.request(Method::POST, &["income"])?.json(&body);
                let added: ClientTransaction = self.send(request, "add the income").await?;
                Ok(Recorded {
                    client: Some(added.client.into()),
                    transaction: added.transaction.into(),
                })
            }
            EntryRequest::Expense(body) => {
                let request = self.request(Method::POST, &["expense"])?.json(&body);
                let added: ExpenseTransaction = self.send(request, "add the expense").await?;
                Ok(Recorded {
                    client: None,
                    transaction: added.transaction.into(),
                })
            }
        }
    }

    async fn add_visit(&self, client_id: &str, visit: &VisitEntry) -> Result<Recorded> {
        let request = self
            .request(Method::PATCH, &["clients", client_id, "income"])?
            .json(&AddVisit::from(visit));
        let added: ClientTransaction = self.send(request, "add the visit").await?;
        Ok(Recorded {
            client: Some(added.client.into()),
            transaction: added.transaction.into(),
        })
    }

    async fn update_client(&self, client_id: &str, update: &ClientUpdate) -> Result<Edited> {
        let request = self
            .request(Method::PATCH, &["clients", client_id])?
            .json(&UpdateClient::from(update));
        let updated: UpdatedClient = self.send(request, "update the client").await?;
        Ok(Edited {
            client: updated.client.into(),
            updated_transaction: updated.updated_transaction.map(Transaction::from),
        })
    }

    async fn delete_client(&self, client_id: &str) -> Result<Deleted> {
        let request = self.request(Method::DELETE, &["clients", client_id])?;
        let deleted: DeletedClient = self.send(request, "delete the client").await?;
        Ok(Deleted {
            client_id: deleted.deleted_client_id,
            transactions_deleted: deleted.deleted_transactions_count,
        })
    }

    async fn reset(&self) -> Result<Cleared> {
        let request = self.request(Method::DELETE, &["reset"])?;
        let reset: ResetData = self.send(request, "reset the ledger").await?;
        Ok(Cleared {
            clients_deleted: reset.data.clients_deleted,
            transactions_deleted: reset.data.transactions_deleted,
            expenses_deleted: reset.data.expenses_deleted,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::test::TestEnv;

    #[tokio::test]
    async fn test_endpoints() {
        let env = TestEnv::with_api_url("https://api.example.com").await;
        let tracker = super::HttpTracker::new(&env.config()).unwrap();
        assert_eq!(
            tracker.endpoint(&["all"]).unwrap().as_str(),
            "https://api.example.com/tracker/all"
        );
        assert_eq!(
            tracker.endpoint(&["clients", "abc 1", "income"]).unwrap().as_str(),
            "https://api.example.com/tracker/clients/abc%201/income"
        );
    }

    #[tokio::test]
    async fn test_endpoints_keep_base_path() {
        let env = TestEnv::with_api_url("http://localhost:3000/api/").await;
        let tracker = super::HttpTracker::new(&env.config()).unwrap();
        assert_eq!(
            tracker.endpoint(&["reset"]).unwrap().as_str(),
            "http://localhost:3000/api/tracker/reset"
        );
    }

    #[tokio::test]
    async fn test_unreachable_server_is_an_error() {
        // Nothing listens on port 9 of localhost.
        let env = TestEnv::with_api_url("http://127.0.0.1:9").await;
        let tracker = super::HttpTracker::new(&env.config()).unwrap();
        let result = crate::api::Tracker::reset(&tracker).await;
        assert!(result.is_err());
    }
}
