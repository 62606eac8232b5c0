pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod service;

pub use config::AppConfig;
pub use db::{create_pool, PgReceiptStore, ReceiptStore};
pub use error::{AppError, ExtractionError};
pub use service::{CaptureService, JobService, MfaService, ShoppingService};
