//! Text-to-image client for hosted inference endpoints
//!
//! Lets a user pick a hosted model, submit a prompt, and view or download
//! the resulting image while keeping an in-memory history of the session.

pub mod ai;
pub mod cli;
pub mod controller;
pub mod error;
pub mod export;
pub mod image;
pub mod models;

pub use error::{Error, Result};
