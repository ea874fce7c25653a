//! Types that represent the core data model, such as `Transaction`, `Client` and `Visit`.
mod amount;
mod client;
mod date;
mod entry;
mod filter;
mod transaction;

pub use amount::{Amount, AmountError};
pub use client::{normalize_name, Client, Visit};
pub use date::{Date, DateError};
pub use entry::{ClientUpdate, NewEntry, VisitEntry};
pub use filter::{Filter, Month};
pub use transaction::{Transaction, TransactionType, OTHER};
