//! Common library for the catalog admin
//!
//! This crate provides shared functionality used by the auth, catalog and
//! admin crates: runtime configuration, the error taxonomy every operation
//! reports through, declarative form validation, database connectivity and
//! tracing bootstrap.
//!
//! ```rust,no_run
//! use common::config::Settings;
//! use common::database::{health_check, init_pool};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let settings = Settings::from_env()?;
//!     let pool = init_pool(&settings.database).await?;
//!     let is_healthy = health_check(&pool).await?;
//!     println!("Database health check: {}", is_healthy);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod database;
pub mod error;
pub mod telemetry;
pub mod validation;

pub use error::{Action, AppError, AppResult};
pub use validation::{FieldRule, FormInput, Record, Schema, ValidationErrors};
