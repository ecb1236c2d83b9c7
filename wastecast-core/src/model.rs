//! Domain data structures for addresses, collection slots, and published records.

use chrono::{DateTime, Local, NaiveDate, TimeDelta};
use serde::{Deserialize, Serialize};

/// Single upstream calendar entry describing one pickup day.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionSlot {
    /// Textual pickup date in the upstream "Mon, 2 Jan 2006" format.
    pub start: String,
    /// Garbage is collected on this date.
    pub garbage: bool,
    /// Recycling is collected on this date.
    pub recycling: bool,
    /// Food and yard waste is collected on this date.
    pub food_and_yard_waste: bool,
}

/// Next-collection result for a single address, ready for publishing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Address the lookup ran for. Routes the record to a device name;
    /// never published as a sensor value itself.
    pub address: String,
    /// Textual pickup date exactly as the upstream returned it.
    pub start: String,
    /// Parsed pickup date, carried so the sink can recompute `status`
    /// without re-parsing `start`. Not part of the publish schema.
    pub start_date: NaiveDate,
    /// Garbage is collected on `start_date`.
    pub garbage: bool,
    /// Recycling is collected on `start_date`.
    pub recycling: bool,
    /// Food and yard waste is collected on `start_date`.
    pub food_and_yard_waste: bool,
    /// The pickup falls within the alert window. Recomputed at publish
    /// time; the value assigned at lookup time is never trusted.
    pub status: bool,
}

impl Record {
    /// Build a record from an upstream slot and its parsed date.
    ///
    /// `status` starts out `false`; callers derive it via [`Record::with_status`].
    #[must_use]
    pub fn from_slot(address: &str, slot: &CollectionSlot, start_date: NaiveDate) -> Self {
        Self {
            address: address.to_owned(),
            start: slot.start.clone(),
            start_date,
            garbage: slot.garbage,
            recycling: slot.recycling,
            food_and_yard_waste: slot.food_and_yard_waste,
            status: false,
        }
    }

    /// Return the record with `status` recomputed against `now`.
    #[must_use]
    pub fn with_status(mut self, now: DateTime<Local>, alert_within: TimeDelta) -> Self {
        self.status = self.alerting(now, alert_within);
        self
    }

    /// Whether the pickup lies in the closed interval `[now, now + alert_within]`.
    #[must_use]
    pub fn alerting(&self, now: DateTime<Local>, alert_within: TimeDelta) -> bool {
        let Some(start) = local_midnight(self.start_date) else {
            return false;
        };
        let until = start - now;
        until >= TimeDelta::zero() && until <= alert_within
    }
}

/// First valid local instant of the given day.
///
/// `None` only when the transition rules of the local timezone skip the
/// entire instant, which does not happen for real zones.
#[must_use]
pub fn local_midnight(date: NaiveDate) -> Option<DateTime<Local>> {
    date.and_hms_opt(0, 0, 0)?.and_local_timezone(Local).earliest()
}

/// Ordered registry mapping upstream query addresses to MQTT device names.
#[derive(Debug, Clone, Default)]
pub struct AddressBook {
    entries: Vec<(String, String)>,
}

impl AddressBook {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an address with its display name, replacing any earlier name
    /// registered for the same address.
    pub fn insert<A: Into<String>, N: Into<String>>(&mut self, address: A, name: N) {
        let address = address.into();
        let name = name.into();
        if let Some(entry) = self.entries.iter_mut().find(|(key, _)| *key == address) {
            entry.1 = name;
        } else {
            self.entries.push((address, name));
        }
    }

    /// Parse the `"address:name,address2:name2"` environment form.
    ///
    /// An entry without a `:name` part uses the address itself as the
    /// device name; an explicit empty name (`"address:"`) keeps the
    /// device segment out of the state topics.
    #[must_use]
    pub fn from_spec(spec: &str) -> Self {
        let mut book = Self::new();
        for part in spec.split(',') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }
            match part.split_once(':') {
                Some((address, name)) => book.insert(address.trim(), name.trim()),
                None => book.insert(part, part),
            }
        }
        book
    }

    /// Display name for an address, falling back to the address itself
    /// when the address was never registered.
    #[must_use]
    pub fn name_for<'a>(&'a self, address: &'a str) -> &'a str {
        self.entries
            .iter()
            .find(|(key, _)| key == address)
            .map_or(address, |(_, name)| name.as_str())
    }

    /// Iterate `(address, name)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(address, name)| (address.as_str(), name.as_str()))
    }

    /// Number of registered addresses.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no address is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record_for(date: NaiveDate) -> Record {
        Record {
            address: "2133 N 61ST ST".to_owned(),
            start: date.format("%a, %-d %b %Y").to_string(),
            start_date: date,
            garbage: true,
            recycling: false,
            food_and_yard_waste: false,
            status: false,
        }
    }

    #[test]
    fn status_true_when_start_equals_now() {
        let date = NaiveDate::from_ymd_opt(2017, 3, 16).expect("valid date");
        let now = local_midnight(date).expect("valid midnight");
        assert!(record_for(date).alerting(now, TimeDelta::hours(24)));
    }

    #[test]
    fn status_true_on_inclusive_window_edge() {
        let date = NaiveDate::from_ymd_opt(2017, 3, 16).expect("valid date");
        let start = local_midnight(date).expect("valid midnight");
        let now = start - TimeDelta::hours(24);
        assert!(record_for(date).alerting(now, TimeDelta::hours(24)));
    }

    #[test]
    fn status_false_outside_window() {
        let date = NaiveDate::from_ymd_opt(2017, 3, 16).expect("valid date");
        let start = local_midnight(date).expect("valid midnight");
        let now = start - TimeDelta::hours(24) - TimeDelta::seconds(1);
        assert!(!record_for(date).alerting(now, TimeDelta::hours(24)));
    }

    #[test]
    fn status_false_for_past_pickup() {
        let date = NaiveDate::from_ymd_opt(2017, 3, 16).expect("valid date");
        let start = local_midnight(date).expect("valid midnight");
        let now = start + TimeDelta::seconds(1);
        assert!(!record_for(date).alerting(now, TimeDelta::hours(24)));
    }

    #[test]
    fn with_status_overwrites_stale_value() {
        let date = NaiveDate::from_ymd_opt(2017, 3, 16).expect("valid date");
        let now = local_midnight(date).expect("valid midnight");
        let mut record = record_for(date);
        record.status = false;
        assert!(record.with_status(now, TimeDelta::hours(24)).status);
    }

    #[test]
    fn book_parses_spec_in_order() {
        let book = AddressBook::from_spec("2133 N 61ST ST:home, 425 OTHER AVE:rental");
        let entries: Vec<_> = book.iter().collect();
        assert_eq!(
            entries,
            vec![("2133 N 61ST ST", "home"), ("425 OTHER AVE", "rental")]
        );
    }

    #[test]
    fn book_defaults_name_to_address() {
        let book = AddressBook::from_spec("2133 N 61ST ST");
        assert_eq!(book.name_for("2133 N 61ST ST"), "2133 N 61ST ST");
    }

    #[test]
    fn book_keeps_explicit_empty_name() {
        let book = AddressBook::from_spec("2133 N 61ST ST:");
        assert_eq!(book.name_for("2133 N 61ST ST"), "");
    }

    #[test]
    fn book_falls_back_for_unknown_address() {
        let book = AddressBook::new();
        assert_eq!(book.name_for("somewhere"), "somewhere");
    }

    #[test]
    fn book_replaces_duplicate_addresses() {
        let book = AddressBook::from_spec("a:one,a:two");
        assert_eq!(book.len(), 1);
        assert_eq!(book.name_for("a"), "two");
    }
}
