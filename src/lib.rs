pub mod aggregator;
pub mod api_connection;
pub mod cli;
pub mod config;
pub mod error;
pub mod history;
pub mod metabolism;
pub mod nutrients;
pub mod products;
pub mod session;
pub mod store;
pub mod user;

pub use error::{Result, TrackerError};
