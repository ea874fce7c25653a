pub mod analytics;
pub mod api;
pub mod args;
pub mod commands;
mod config;
mod error;
pub mod model;
pub mod session;
pub mod submit;
mod utils;


pub use api::Mode;
pub use config::Config;
pub use error::Error;
pub use error::Result;
pub use model::Amount;
pub use session::{Session, Snapshot};
