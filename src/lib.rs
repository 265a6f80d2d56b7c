//! querion - natural-language querying for MySQL databases.
//!
//! The pipeline takes a saved connection and a plain-language question,
//! summarizes the database schema, asks a completion model for a SELECT
//! query, enforces a read-only policy, executes it, and shapes the result
//! for display.

pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod llm;
pub mod pipeline;
pub mod safety;
pub mod secrets;
pub mod store;
