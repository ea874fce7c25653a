use crate::api::{Mode, Recorded};
use crate::commands::{submit_session, Out};
use crate::error::{ErrorType, IntoResult};
use crate::model::{NewEntry, VisitEntry};
use crate::{Config, Result};

/// Records new income or a new expense.
pub async fn add_entry(config: Config, mode: Mode, entry: NewEntry) -> Result<Out<Recorded>> {
    let entry = entry.validated().pub_result(ErrorType::Validation)?;
    let session = submit_session(&config, mode)?;
    let recorded = session
        .add_entry(entry)
        .await
        .pub_result(ErrorType::Request)?;
    let message = match &recorded.client {
        Some(client) => format!(
            "Recorded {} from {}",
            recorded.transaction.amount(),
            client.name
        ),
        None => format!(
            "Recorded an expense of {} for {}",
            recorded.transaction.amount(),
            recorded.transaction.category_or_other()
        ),
    };
    Ok(Out::new(message, recorded))
}

/// Records a further visit for an existing client.
pub async fn add_visit(
    config: Config,
    mode: Mode,
    client_id: &str,
    visit: VisitEntry,
) -> Result<Out<Recorded>> {
    let visit = visit.validated().pub_result(ErrorType::Validation)?;
    let session = submit_session(&config, mode)?;
    let recorded = session
        .add_visit(client_id, visit)
        .await
        .pub_result(ErrorType::Request)?;
    Ok(Out::new(
        format!(
            "Recorded a visit of {} for client {client_id}",
            recorded.transaction.amount()
        ),
        recorded,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Amount;
    use crate::test::TestEnv;
    use std::str::FromStr;

    #[tokio::test]
    async fn test_add_income_for_new_client() {
        let env = TestEnv::new().await;
        let entry = NewEntry::Income {
            client_name: " Grace Hopper ".into(),
            service: "Silk Press".into(),
            amount: Amount::from_str("65").unwrap(),
            date: None,
        };
        let out = add_entry(env.config(), Mode::Test, entry).await.unwrap();
        assert_eq!(out.message(), "Recorded £65.00 from Grace Hopper");
        let recorded = out.structure().unwrap();
        assert_eq!(recorded.client.as_ref().unwrap().visit_history.len(), 1);
        assert!(recorded.transaction.is_income());
    }

    #[tokio::test]
    async fn test_add_expense() {
        let env = TestEnv::new().await;
        let entry = NewEntry::Expense {
            category: "Supplies".into(),
            amount: Amount::from_str("£1,200").unwrap(),
            date: None,
        };
        let out = add_entry(env.config(), Mode::Test, entry).await.unwrap();
        assert_eq!(out.message(), "Recorded an expense of £1,200.00 for Supplies");
    }

    #[tokio::test]
    async fn test_invalid_entry() {
        let env = TestEnv::new().await;
        let entry = NewEntry::Expense {
            category: "".into(),
            amount: Amount::from_str("5").unwrap(),
            date: None,
        };
        let e = add_entry(env.config(), Mode::Test, entry).await.unwrap_err();
        assert_eq!(e.to_string(), "invalid input");
    }

    #[tokio::test]
    async fn test_add_visit_unknown_client() {
        let env = TestEnv::new().await;
        let visit = VisitEntry {
            service: "Cut".into(),
            amount: Amount::from_str("5").unwrap(),
            date: None,
        };
        let e = add_visit(env.config(), Mode::Test, "nobody", visit)
            .await
            .unwrap_err();
        assert_eq!(e.to_string(), "request error");
    }
}
