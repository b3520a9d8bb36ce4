//! Client for the overlay backend. Every fetch follows the same policy: one
//! attempt, a hard timeout, and a safe default on failure. The banner keeps
//! running no matter what the backend does, so nothing in here returns an
//! error to the caller.

use anyhow::Context;
use indexmap::IndexMap;
use itertools::Itertools;
use log::warn;
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize};
use std::{collections::HashMap, time::Duration};

/// Per-request timeout. Hitting it cancels the request in flight, but the
/// caller sees it as just another failed fetch.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(8);

#[derive(Debug)]
pub struct Api {
    client: Client,
    host: String,
}

impl Api {
    pub fn new(host: impl Into<String>) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Error building HTTP client")?;
        Ok(Self {
            client,
            host: host.into(),
        })
    }

    /// Fetch the overlay config. Loaded once per process, not retried; any
    /// failure falls back to the defaults (no cities, no labels, 15s cycle).
    /// The cycle is clamped to at least 2 seconds either way.
    pub async fn overlay_config(&self) -> OverlayConfig {
        let url = format!("{}/api/overlay/config", self.host);
        let mut config = match self.get_json::<OverlayConfig>(&url, &[]).await {
            Ok(config) => config,
            Err(err) => {
                warn!("Error fetching overlay config, using defaults: {err:#}");
                OverlayConfig::default()
            }
        };
        config.cycle = config.cycle.max(OverlayConfig::MIN_CYCLE);
        config
    }

    /// Fetch current readings for the given cities, sorted into the given
    /// order. Any failure yields an empty list.
    pub async fn weather(&self, cities: &[String]) -> Vec<WeatherItem> {
        let url = format!("{}/api/weather", self.host);
        let query = [("cities", cities.iter().join(","))];
        let mut items = match self.get_json::<WeatherResponse>(&url, &query).await
        {
            Ok(response) => response.items,
            Err(err) => {
                warn!("Error fetching weather: {err:#}");
                Vec::new()
            }
        };
        sort_items(&mut items, cities);
        items
    }

    /// Ping the backend so it keeps its dataset warm. Fire-and-forget: the
    /// response and any error are discarded.
    pub async fn keep_alive(&self) {
        let url = format!("{}/api/tiepre", self.host);
        let _ = self.client.get(&url).send().await;
    }

    /// GET a URL and parse the response as JSON. Network errors, non-success
    /// statuses, timeouts and bad bodies all look the same to callers.
    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> anyhow::Result<T> {
        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .with_context(|| format!("Error fetching {url}"))?
            .error_for_status()
            .with_context(|| format!("Error response from {url}"))?;
        response
            .json()
            .await
            .with_context(|| format!("Error parsing response from {url} as JSON"))
    }
}

/// Overlay configuration served by the backend. Every field is optional on
/// the wire; unknown fields (e.g. `live_every`, which drives a card type this
/// banner variant doesn't have) are ignored.
#[derive(Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    /// City identifiers, in rotation order
    pub cities: Vec<String>,
    /// Display label overrides, keyed by city identifier
    pub labels: IndexMap<String, String>,
    /// Seconds between rotation steps
    pub cycle: u64,
}

impl OverlayConfig {
    const DEFAULT_CYCLE: u64 = 15;
    const MIN_CYCLE: u64 = 2;
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            cities: Vec::new(),
            labels: IndexMap::new(),
            cycle: Self::DEFAULT_CYCLE,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WeatherResponse {
    items: Vec<WeatherItem>,
}

/// One city's current reading. Immutable once fetched; refreshes replace the
/// whole list. The wire format keeps the backend's Spanish field names.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct WeatherItem {
    #[serde(rename = "ciudad", default)]
    pub city: String,
    #[serde(rename = "temperatura", default)]
    pub temperature: Option<f64>,
}

impl WeatherItem {
    /// Formatted temperature, e.g. "22°C". A reading with no value shows the
    /// placeholder dash (but keeps the unit).
    pub fn temperature_text(&self) -> String {
        match self.temperature {
            Some(temperature) => format!("{temperature}°C"),
            None => format!("{}°C", crate::banner::PLACEHOLDER),
        }
    }
}

/// Sort items into the configured city order, matching case-insensitively.
/// Cities missing from the list sort after all listed ones, keeping their
/// input order.
fn sort_items(items: &mut [WeatherItem], cities: &[String]) {
    let order: HashMap<String, usize> = cities
        .iter()
        .enumerate()
        .map(|(rank, city)| (city.to_lowercase(), rank))
        .collect();
    // sort_by_key is stable, which is what keeps unmatched items in input
    // order relative to each other
    items.sort_by_key(|item| {
        order
            .get(&item.city.to_lowercase())
            .copied()
            .unwrap_or(usize::MAX)
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::{
        matchers::{method, path, query_param},
        Mock, MockServer, ResponseTemplate,
    };

    fn item(city: &str, temperature: Option<f64>) -> WeatherItem {
        WeatherItem {
            city: city.into(),
            temperature,
        }
    }

    fn cities(names: &[&str]) -> Vec<String> {
        names.iter().map(|&name| name.into()).collect()
    }

    #[test]
    fn test_sort_follows_city_order() {
        let mut items = vec![
            item("cba", Some(18.0)),
            item("bsas", Some(22.0)),
            item("mdz", None),
        ];
        sort_items(&mut items, &cities(&["bsas", "mdz", "cba"]));
        assert_eq!(
            items,
            vec![
                item("bsas", Some(22.0)),
                item("mdz", None),
                item("cba", Some(18.0)),
            ]
        );
    }

    #[test]
    fn test_sort_is_case_insensitive() {
        let mut items = vec![item("CBA", Some(18.0)), item("Bsas", Some(22.0))];
        sort_items(&mut items, &cities(&["bsas", "cba"]));
        assert_eq!(
            items,
            vec![item("Bsas", Some(22.0)), item("CBA", Some(18.0))]
        );
    }

    #[test]
    fn test_sort_unknown_cities_last_and_stable() {
        let mut items = vec![
            item("zzz", None),
            item("cba", Some(18.0)),
            item("yyy", None),
            item("bsas", Some(22.0)),
        ];
        sort_items(&mut items, &cities(&["bsas", "cba"]));
        assert_eq!(
            items,
            vec![
                item("bsas", Some(22.0)),
                item("cba", Some(18.0)),
                item("zzz", None),
                item("yyy", None),
            ]
        );
    }

    #[test]
    fn test_temperature_text() {
        assert_eq!(item("bsas", Some(22.0)).temperature_text(), "22°C");
        assert_eq!(item("bsas", Some(18.5)).temperature_text(), "18.5°C");
        assert_eq!(item("bsas", None).temperature_text(), "—°C");
    }

    #[tokio::test]
    async fn test_overlay_config_parses_and_clamps() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/overlay/config"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "cities": ["bsas", "cba"],
                "labels": {"bsas": "CABA"},
                "cycle": 1,
                "live_every": 5,
            })))
            .mount(&server)
            .await;

        let api = Api::new(server.uri()).unwrap();
        let config = api.overlay_config().await;
        assert_eq!(config.cities, cities(&["bsas", "cba"]));
        assert_eq!(config.labels.get("bsas").unwrap(), "CABA");
        // Below the 2-second floor
        assert_eq!(config.cycle, 2);
    }

    #[tokio::test]
    async fn test_overlay_config_defaults_on_missing_fields() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/overlay/config"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&server)
            .await;

        let api = Api::new(server.uri()).unwrap();
        let config = api.overlay_config().await;
        assert_eq!(config.cities, Vec::<String>::new());
        assert!(config.labels.is_empty());
        assert_eq!(config.cycle, 15);
    }

    #[tokio::test]
    async fn test_overlay_config_defaults_on_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/overlay/config"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let api = Api::new(server.uri()).unwrap();
        assert_eq!(api.overlay_config().await, OverlayConfig::default());
    }

    #[tokio::test]
    async fn test_weather_sorted_by_requested_order() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/weather"))
            .and(query_param("cities", "bsas,cba"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [
                    {"ciudad": "cba", "temperatura": 18},
                    {"ciudad": "bsas", "temperatura": 22},
                ],
            })))
            .mount(&server)
            .await;

        let api = Api::new(server.uri()).unwrap();
        let items = api.weather(&cities(&["bsas", "cba"])).await;
        assert_eq!(
            items,
            vec![item("bsas", Some(22.0)), item("cba", Some(18.0))]
        );
    }

    #[tokio::test]
    async fn test_weather_empty_on_malformed_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/weather"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string("not json"),
            )
            .mount(&server)
            .await;

        let api = Api::new(server.uri()).unwrap();
        assert_eq!(api.weather(&cities(&["bsas"])).await, vec![]);
    }

    #[tokio::test]
    async fn test_weather_empty_on_network_error() {
        // Nothing is listening here
        let api = Api::new("http://127.0.0.1:1").unwrap();
        assert_eq!(api.weather(&cities(&["bsas"])).await, vec![]);
    }
}
