//! Figures derived from the transaction and client collections. Everything here is synchronous and
//! computed only from its inputs.
mod aggregate;
mod dashboard;
mod forecast;
mod retention;
mod summary;

pub use aggregate::{by_category, by_month, by_service, group_by, Bucket, Buckets};
pub use dashboard::{
    compose, window_clients, window_transactions, ClientDetail, Dashboard, DashboardOptions,
    ExpenseSlice, ServiceCount, DEFAULT_TOP_SERVICES,
};
pub use forecast::{forecast_income, predict_bookings, series, Point, Regression};
pub use retention::{retention, Retention, VisitLog};
pub use summary::ClientSummary;
