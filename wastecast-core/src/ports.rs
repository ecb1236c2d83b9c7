//! Traits describing the upstream collection API boundary.

use async_trait::async_trait;
use chrono::ParseError as ChronoParseError;
use reqwest::Error as ReqwestError;

use crate::model::CollectionSlot;

#[derive(thiserror::Error, Debug)]
/// Errors that can occur while talking to the upstream API.
pub enum PortError {
    /// Network layer failed.
    #[error("Network error: {0}")]
    Network(#[from] ReqwestError),
    /// Failed to parse a date from the upstream response.
    #[error("Parse error: {0}")]
    Parse(#[from] ChronoParseError),
    /// The calendar query returned zero events.
    #[error("No collection dates returned")]
    EmptyCalendar,
    /// Internal upstream error.
    #[error("Internal error: {0}")]
    Internal(String),
}

#[async_trait]
/// Trait for upstream collection calendar backends.
pub trait CollectionPort: Send + Sync {
    /// Resolve a free-text address to candidate encoded tokens.
    ///
    /// The first candidate is the one used for calendar queries; an empty
    /// list means the upstream does not know the address.
    ///
    /// # Errors
    ///
    /// Returns a [`PortError`] when the resolution request fails.
    async fn resolve(&self, address: &str) -> Result<Vec<String>, PortError>;

    /// Fetch collection events starting at the given Unix timestamp.
    ///
    /// # Errors
    ///
    /// Returns a [`PortError`] when the calendar request fails.
    async fn collections(&self, token: &str, since: i64)
    -> Result<Vec<CollectionSlot>, PortError>;
}
