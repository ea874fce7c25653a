//! Client retention: how many clients came back, and how long they took to do so.

use crate::model::{normalize_name, Client, Date, Filter};
use rust_decimal::{Decimal, RoundingStrategy};
use std::collections::BTreeMap;

/// Visit dates per client. Clients are identified by their normalized name, so two records with
/// the same name (ignoring case and surrounding whitespace) count as one person.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VisitLog {
    visits: BTreeMap<String, Vec<Date>>,
}

impl VisitLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the log for `clients`, keeping only visits inside `filter`. Every client is listed,
    /// even one with no visits in the window.
    pub fn from_clients<'a>(clients: impl IntoIterator<Item = &'a Client>, filter: &Filter) -> Self {
        let mut log = Self::new();
        for client in clients {
            let name = client.normalized_name();
            log.touch(&name);
            for visit in client.visits_in(filter) {
                log.record(&name, visit.date);
            }
        }
        log
    }

    /// Makes sure `name` is present.
    pub fn touch(&mut self, name: &str) {
        self.visits.entry(normalize_name(name)).or_default();
    }

    pub fn record(&mut self, name: &str, date: Date) {
        self.visits.entry(normalize_name(name)).or_default().push(date);
    }

    pub fn clients(&self) -> usize {
        self.visits.len()
    }
}

/// The retention figures for a window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Retention {
    pub distinct_clients: usize,
    pub repeat_clients: usize,
    /// Percentage of distinct clients with two or more visits, to one decimal place.
    pub rate: Decimal,
    /// Mean of each repeat client's mean gap between consecutive visits, in days. `None` when no
    /// client has two visits.
    pub average_days: Option<f64>,
}

impl Retention {
    /// e.g. `66.7%`
    pub fn rate_display(&self) -> String {
        format!("{:.1}%", self.rate)
    }

    /// One decimal of days, hours when the gap is under a day, or `0` when nobody returned.
    pub fn average_days_display(&self) -> String {
        match self.average_days {
            None => "0".to_string(),
            Some(avg) if avg < 1.0 => format!("{:.1} hours", avg * 24.0),
            Some(avg) => format!("{avg:.1}"),
        }
    }
}

pub fn retention(log: &VisitLog) -> Retention {
    let distinct_clients = log.visits.len();

    let mut repeat_clients = 0usize;
    let mut gap_sum = 0.0;
    for dates in log.visits.values() {
        if let Some(gap) = mean_gap(dates) {
            repeat_clients += 1;
            gap_sum += gap;
        }
    }

    let rate = if distinct_clients == 0 {
        Decimal::ZERO
    } else {
        (Decimal::from(repeat_clients) * Decimal::ONE_HUNDRED / Decimal::from(distinct_clients))
            .round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero)
    };

    let average_days = if repeat_clients == 0 {
        None
    } else {
        Some(gap_sum / repeat_clients as f64)
    };

    Retention {
        distinct_clients,
        repeat_clients,
        rate,
        average_days,
    }
}

/// The mean gap in days between consecutive visits, or `None` for fewer than two visits.
fn mean_gap(dates: &[Date]) -> Option<f64> {
    if dates.len() < 2 {
        return None;
    }
    let mut sorted = dates.to_vec();
    sorted.sort();
    let total: f64 = sorted
        .windows(2)
        .map(|pair| pair[1].days_since(&pair[0]))
        .sum();
    Some(total / (sorted.len() - 1) as f64)
}
