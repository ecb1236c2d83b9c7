//! Source implementation for the Seattle collection calendar API.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use wastecast_core::{
    model::CollectionSlot,
    ports::{CollectionPort, PortError},
};

const ADDRESS_URL: &str = "https://www.seattle.gov/UTIL/WARP/CollectionCalendar/GetCCAddress";
const COLLECTION_URL: &str =
    "https://www.seattle.gov/UTIL/WARP/CollectionCalendar/GetCollectionDays";

/// Single event from `GetCollectionDays`.
///
/// The endpoint returns more keys than these; everything else is ignored.
#[derive(Debug, Deserialize)]
struct ApiCollection {
    #[serde(default)]
    start: String,

    #[serde(default)]
    garbage: bool,

    #[serde(default)]
    recycling: bool,

    #[serde(rename = "foodAndYardWaste", default)]
    food_and_yard_waste: bool,
}

impl From<ApiCollection> for CollectionSlot {
    fn from(api: ApiCollection) -> Self {
        CollectionSlot {
            start: api.start,
            garbage: api.garbage,
            recycling: api.recycling,
            food_and_yard_waste: api.food_and_yard_waste,
        }
    }
}

/// Collection calendar backend for seattle.gov.
pub struct SeattleWastePort {
    client: Client,
}

impl SeattleWastePort {
    /// Create a new port bound to the given HTTP client.
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl CollectionPort for SeattleWastePort {
    async fn resolve(&self, address: &str) -> Result<Vec<String>, PortError> {
        // GetCCAddress returns a bare JSON array of candidate tokens.
        let req = self
            .client
            .get(ADDRESS_URL)
            .query(&[("pAddress", address)]);

        fetch_json::<Vec<String>>(req).await
    }

    async fn collections(&self, token: &str, since: i64) -> Result<Vec<CollectionSlot>, PortError> {
        let since = since.to_string();
        let req = self.client.get(COLLECTION_URL).query(&[
            ("pAddress", token),
            ("pApp", "CC"),
            ("Start", &since),
        ]);

        let results = fetch_json::<Vec<ApiCollection>>(req).await?;
        Ok(results.into_iter().map(CollectionSlot::from).collect())
    }
}

// Small helper to fetch and decode JSON with status handling.
async fn fetch_json<T: DeserializeOwned>(req: RequestBuilder) -> Result<T, PortError> {
    req.send()
        .await
        .map_err(PortError::from)?
        .error_for_status()
        .map_err(PortError::from)?
        .json()
        .await
        .map_err(PortError::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_calendar_entries() {
        let body = r#"[
            {"start": "Mon, 16 Mar 2017", "garbage": true, "recycling": false,
             "foodAndYardWaste": true, "status": false, "allDay": true},
            {"start": "Thu, 23 Mar 2017", "garbage": true, "recycling": true,
             "foodAndYardWaste": false}
        ]"#;

        let entries: Vec<ApiCollection> = serde_json::from_str(body).expect("decodes");
        let slots: Vec<CollectionSlot> = entries.into_iter().map(CollectionSlot::from).collect();

        assert_eq!(slots.len(), 2);
        assert_eq!(slots[0].start, "Mon, 16 Mar 2017");
        assert!(slots[0].food_and_yard_waste);
        assert!(slots[1].recycling);
        assert!(!slots[1].food_and_yard_waste);
    }

    #[test]
    fn decodes_address_candidates() {
        let body = r#"["2133 N 61ST ST", "2135 N 61ST ST"]"#;
        let candidates: Vec<String> = serde_json::from_str(body).expect("decodes");
        assert_eq!(candidates.first().map(String::as_str), Some("2133 N 61ST ST"));
    }

    #[test]
    fn tolerates_missing_keys() {
        let body = r#"[{"start": "Mon, 16 Mar 2017"}]"#;
        let entries: Vec<ApiCollection> = serde_json::from_str(body).expect("decodes");
        assert!(!entries[0].garbage);
    }
}
