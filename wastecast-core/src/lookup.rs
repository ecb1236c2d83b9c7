//! Bounded-retry lookup of the next collection date for an address.
//!
//! The upstream calendar endpoint returns inconsistent batches: dates may
//! start before the requested window, individual entries may be malformed,
//! and a stuck feed can repeat the same batch forever. The lookup scans
//! forward from the first of the current month, advancing the query window
//! with every parsed entry and capping the number of calendar queries.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Datelike, Local, NaiveDate, TimeDelta};
use tracing::{debug, info, warn};

use crate::model::{Record, local_midnight};
use crate::ports::{CollectionPort, PortError};

/// Maximum number of calendar queries per lookup.
pub const MAX_API_ATTEMPTS: u32 = 5;

/// Upstream textual date format with the weekday token already stripped.
const API_DATE_FORMAT: &str = "%d %b %Y";

/// Parse the upstream `"Mon, 2 Jan 2006"` date format.
///
/// The weekday segment is dropped before parsing: the upstream emits
/// entries whose weekday does not match the date, and chrono rejects the
/// mismatch where the original feed consumers ignored it.
///
/// # Errors
///
/// Returns the chrono [`ParseError`](chrono::ParseError) for dates that do
/// not match the format even without a weekday.
pub fn parse_start(raw: &str) -> Result<NaiveDate, chrono::ParseError> {
    let date_part = raw.split_once(", ").map_or(raw, |(_, rest)| rest);
    NaiveDate::parse_from_str(date_part.trim(), API_DATE_FORMAT)
}

/// Finds the next future collection event for an address.
pub struct LookupClient {
    port: Arc<dyn CollectionPort>,
    alert_within: TimeDelta,
    /// Encoded-address cache; one upstream resolution per address, ever.
    tokens: Mutex<HashMap<String, String>>,
}

impl LookupClient {
    /// Create a client bound to the given upstream port.
    #[must_use]
    pub fn new(port: Arc<dyn CollectionPort>, alert_within: TimeDelta) -> Self {
        Self {
            port,
            alert_within,
            tokens: Mutex::new(HashMap::new()),
        }
    }

    /// Look up the next collection event for `address` as seen from `now`.
    ///
    /// Returns `Ok(None)` when the address does not resolve to a token or
    /// when the attempt budget runs out without a qualifying entry; both
    /// are normal outcomes, not failures.
    ///
    /// # Errors
    ///
    /// Propagates transport failures and surfaces an empty calendar batch
    /// as [`PortError::EmptyCalendar`].
    pub async fn next_collection(
        &self,
        address: &str,
        now: DateTime<Local>,
    ) -> Result<Option<Record>, PortError> {
        let Some(token) = self.token_for(address).await? else {
            info!(address, "address did not resolve to an encoded token");
            return Ok(None);
        };

        let today = now.date_naive();
        let first_of_month = today
            .with_day(1)
            .ok_or_else(|| PortError::Internal("invalid first-of-month anchor".to_owned()))?;
        let mut window_start = local_timestamp(first_of_month, 0)
            .ok_or_else(|| PortError::Internal("window start out of range".to_owned()))?;
        let window_end = local_timestamp(today, 1)
            .ok_or_else(|| PortError::Internal("window end out of range".to_owned()))?;

        let mut attempts = 0u32;
        while window_start < window_end && attempts < MAX_API_ATTEMPTS {
            debug!(address, window_start, attempts, "querying collection calendar");
            let slots = self.port.collections(&token, window_start).await?;
            attempts += 1;

            if slots.is_empty() {
                return Err(PortError::EmptyCalendar);
            }

            for slot in &slots {
                let date = match parse_start(&slot.start) {
                    Ok(date) => date,
                    Err(err) => {
                        warn!(start = %slot.start, %err, "skipping unparsable collection date");
                        continue;
                    }
                };

                let Some(timestamp) = local_timestamp(date, 0) else {
                    warn!(start = %slot.start, "skipping date outside the local calendar");
                    continue;
                };

                // Monotonic progress; a stuck feed cannot loop forever.
                window_start = timestamp;

                if timestamp >= window_end {
                    let record = Record::from_slot(address, slot, date)
                        .with_status(now, self.alert_within);
                    return Ok(Some(record));
                }
            }
        }

        debug!(address, attempts, "attempt budget exhausted; nothing found this cycle");
        Ok(None)
    }

    /// Resolve and cache the encoded token for an address.
    async fn token_for(&self, address: &str) -> Result<Option<String>, PortError> {
        if let Some(token) = self.cached_token(address) {
            return Ok(Some(token));
        }

        let candidates = self.port.resolve(address).await?;
        let Some(token) = candidates.into_iter().next() else {
            return Ok(None);
        };

        self.tokens
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(address.to_owned(), token.clone());
        Ok(Some(token))
    }

    fn cached_token(&self, address: &str) -> Option<String> {
        self.tokens
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(address)
            .cloned()
    }
}

/// Unix timestamp of the given local date at `00:00:<second>`.
fn local_timestamp(date: NaiveDate, second: u32) -> Option<i64> {
    let midnight = local_midnight(date)?;
    Some(midnight.timestamp() + i64::from(second))
}
