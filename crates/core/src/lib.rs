//! Core business logic for platebook.

pub mod services;

pub use services::*;
