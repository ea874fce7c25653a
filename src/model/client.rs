use crate::model::{Amount, Date, Filter};
use serde::{Deserialize, Serialize};

/// One income-generating appointment. Always belongs to exactly one `Client`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Visit {
    pub id: String,
    pub visit_id: String,
    pub date: Date,
    pub service: String,
    pub amount: Amount,
}

/// A client of the business together with the visits they have made.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    pub id: String,
    pub name: String,
    /// The service from the client's most recent booking.
    pub service: String,
    /// The registration date.
    pub date: Date,
    #[serde(default)]
    pub visit_history: Vec<Visit>,
}

impl Client {
    /// The name used to identify the same person across records: trimmed and lower-cased.
    pub fn normalized_name(&self) -> String {
        normalize_name(&self.name)
    }

    /// The visits whose date falls inside `filter`.
    pub fn visits_in<'a>(&'a self, filter: &'a Filter) -> impl Iterator<Item = &'a Visit> + 'a {
        self.visit_history
            .iter()
            .filter(move |v| filter.contains(&v.date))
    }

    pub fn visit(&self, visit_id: &str) -> Option<&Visit> {
        self.visit_history.iter().find(|v| v.visit_id == visit_id)
    }

    /// Whether the client belongs in the window: for a whole year (or all time) that is the
    /// registration date, for a single month it is having a visit in that month.
    pub fn in_window(&self, filter: &Filter) -> bool {
        if filter.month.is_all() {
            filter.contains(&self.date)
        } else {
            self.visits_in(filter).next().is_some()
        }
    }
}

pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Month;

    fn visit(id: &str, date: Date) -> Visit {
        Visit {
            id: id.into(),
            visit_id: format!("v-{id}"),
            date,
            service: "Cut".into(),
            amount: Amount::ZERO,
        }
    }

    fn client() -> Client {
        Client {
            id: "c1".into(),
            name: "  Ada Lovelace ".into(),
            service: "Cut".into(),
            date: Date::ymd(2024, 12, 20).unwrap(),
            visit_history: vec![
                visit("1", Date::ymd(2024, 12, 20).unwrap()),
                visit("2", Date::ymd(2025, 2, 3).unwrap()),
            ],
        }
    }

    #[test]
    fn test_normalized_name() {
        assert_eq!(client().normalized_name(), "ada lovelace");
    }

    #[test]
    fn test_in_window_by_registration_year() {
        let c = client();
        assert!(c.in_window(&Filter::year(2024)));
        assert!(!c.in_window(&Filter::year(2025)));
        assert!(c.in_window(&Filter::all()));
    }

    #[test]
    fn test_in_window_by_visit_month() {
        let c = client();
        assert!(c.in_window(&Filter::new(Month::Month(2), Some(2025))));
        assert!(!c.in_window(&Filter::new(Month::Month(3), Some(2025))));
    }

    #[test]
    fn test_visits_in() {
        let c = client();
        let f = Filter::year(2025);
        let ids: Vec<&str> = c.visits_in(&f).map(|v| v.id.as_str()).collect();
        assert_eq!(ids, vec!["2"]);
        assert!(c.visit("v-1").is_some());
    }
}
