//! Common utilities and shared types for platebook.
//!
//! This crate provides foundational components used across all platebook crates:
//!
//! - **Configuration**: Application settings via [`Config`]
//! - **Error handling**: Unified error types via [`AppError`] and [`AppResult`]
//! - **ID Generation**: ULID-based unique identifiers via [`IdGenerator`]
//! - **Pagination**: Page requests and the response envelope via [`Paginated`]
//!
//! # Example
//!
//! ```no_run
//! use platebook_common::{AppResult, Config, IdGenerator};
//!
//! fn example() -> AppResult<()> {
//!     let config = Config::load()?;
//!     let id = IdGenerator::new().generate();
//!     println!("{} -> {id}", config.server.url);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod id;
pub mod pagination;

pub use config::Config;
pub use error::{AppError, AppResult, FieldError, ValidationFailure};
pub use id::IdGenerator;
pub use pagination::{PageRequest, Paginated};
