//! Grouping of records into keyed buckets of (sum, count).

use crate::model::{Amount, Transaction};
use std::collections::HashMap;

/// The running sum and count for one key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Bucket {
    pub sum: Amount,
    pub count: usize,
}

/// Buckets keyed by string, kept in the order each key was first seen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Buckets {
    entries: Vec<(String, Bucket)>,
    index: HashMap<String, usize>,
}

impl Buckets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `amount` to the bucket for `key`, creating it at the end if it is new.
    pub fn add(&mut self, key: impl Into<String>, amount: Amount) {
        let key = key.into();
        let ix = match self.index.get(&key) {
            Some(ix) => *ix,
            None => {
                self.entries.push((key.clone(), Bucket::default()));
                let ix = self.entries.len() - 1;
                self.index.insert(key, ix);
                ix
            }
        };
        let bucket = &mut self.entries[ix].1;
        bucket.sum += amount;
        bucket.count += 1;
    }

    pub fn get(&self, key: &str) -> Option<&Bucket> {
        self.index.get(key).map(|ix| &self.entries[*ix].1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Bucket)> {
        self.entries.iter().map(|(k, b)| (k.as_str(), b))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The sum of every bucket.
    pub fn total(&self) -> Amount {
        self.entries.iter().map(|(_, b)| b.sum).sum()
    }

    /// The number of records that went into all buckets.
    pub fn count(&self) -> usize {
        self.entries.iter().map(|(_, b)| b.count).sum()
    }

    /// The entries sorted by key. Used for month keys, which sort chronologically.
    pub fn sorted_by_key(&self) -> Vec<(&str, &Bucket)> {
        let mut sorted: Vec<_> = self.iter().collect();
        sorted.sort_by(|a, b| a.0.cmp(b.0));
        sorted
    }

    /// The `n` buckets with the highest count. Equal counts keep first-seen order.
    pub fn top_by_count(&self, n: usize) -> Vec<(&str, &Bucket)> {
        let mut sorted: Vec<_> = self.iter().collect();
        sorted.sort_by(|a, b| b.1.count.cmp(&a.1.count));
        sorted.truncate(n);
        sorted
    }
}

/// Groups `records` by `key`, summing `value`.
pub fn group_by<'a, T, I, K, V>(records: I, key: K, value: V) -> Buckets
where
    T: 'a,
    I: IntoIterator<Item = &'a T>,
    K: Fn(&T) -> String,
    V: Fn(&T) -> Amount,
{
    let mut buckets = Buckets::new();
    for record in records {
        buckets.add(key(record), value(record));
    }
    buckets
}

/// Transactions grouped by `YYYY-MM`.
pub fn by_month<'a>(transactions: impl IntoIterator<Item = &'a Transaction>) -> Buckets {
    group_by(transactions, |t| t.date().month_key(), |t| t.amount())
}

/// Transactions grouped by category, with `"Other"` for uncategorized ones.
pub fn by_category<'a>(transactions: impl IntoIterator<Item = &'a Transaction>) -> Buckets {
    group_by(
        transactions,
        |t| t.category_or_other().to_string(),
        |t| t.amount(),
    )
}

/// Transactions grouped by service, with `"Other"` when the service is missing.
pub fn by_service<'a>(transactions: impl IntoIterator<Item = &'a Transaction>) -> Buckets {
    group_by(
        transactions,
        |t| t.service_or_other().to_string(),
        |t| t.amount(),
    )
}
