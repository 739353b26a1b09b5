use crate::error::FetchError;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine as _};
use oracle_pusher_sdk::{AttestationBlob, FeedId, PriceSnapshot};
use serde::Deserialize;
use std::collections::HashMap;
use tracing::debug;

/// Off-chain truth source: attested update payloads for the push path and
/// parsed latest prices for the staleness decision.
#[async_trait]
pub trait AttestationSource: Send + Sync {
    /// One round of signed attestation data covering the given feeds.
    ///
    /// Fails loudly; callers abort the whole cycle rather than attempt
    /// partial use of a round.
    async fn fetch_attestations(&self, feed_ids: &[FeedId]) -> Result<AttestationBlob, FetchError>;

    /// Latest source-side prices for the given feeds.
    async fn fetch_latest_prices(
        &self,
        feed_ids: &[FeedId],
    ) -> Result<HashMap<FeedId, PriceSnapshot>, FetchError>;
}

/// HTTP client for a Hermes-style attestation service.
///
/// The feed→byte-range contract: the service returns one base64 binary
/// segment per requested feed id, in request order. Anything else is an
/// invalid response, never a guess.
pub struct HermesClient {
    http: reqwest::Client,
    endpoint: String,
}

impl HermesClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        let endpoint = endpoint.into().trim_end_matches('/').to_string();
        Self {
            http: reqwest::Client::new(),
            endpoint,
        }
    }

    async fn latest_updates(
        &self,
        feed_ids: &[FeedId],
    ) -> Result<LatestUpdatesResponse, FetchError> {
        let mut query: Vec<(&str, String)> = feed_ids
            .iter()
            .map(|id| ("ids[]", id.to_string()))
            .collect();
        query.push(("encoding", "base64".to_string()));
        query.push(("parsed", "true".to_string()));

        let response = self
            .http
            .get(format!("{}/v2/updates/price/latest", self.endpoint))
            .query(&query)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(FetchError::Status(response.status().as_u16()));
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl AttestationSource for HermesClient {
    async fn fetch_attestations(&self, feed_ids: &[FeedId]) -> Result<AttestationBlob, FetchError> {
        let response = self.latest_updates(feed_ids).await?;

        if response.binary.data.len() != feed_ids.len() {
            return Err(FetchError::InvalidResponse(format!(
                "asked for {} feeds, got {} binary segments",
                feed_ids.len(),
                response.binary.data.len()
            )));
        }

        let mut segments = Vec::with_capacity(feed_ids.len());
        for (feed_id, encoded) in feed_ids.iter().zip(response.binary.data) {
            let bytes = BASE64_STANDARD
                .decode(encoded)
                .map_err(|e| FetchError::Decode(e.to_string()))?;
            segments.push((*feed_id, bytes));
        }

        let blob = AttestationBlob::from_segments(segments);
        debug!(
            feeds = blob.feed_count(),
            bytes = blob.len(),
            "attestation round fetched"
        );
        Ok(blob)
    }

    async fn fetch_latest_prices(
        &self,
        feed_ids: &[FeedId],
    ) -> Result<HashMap<FeedId, PriceSnapshot>, FetchError> {
        let response = self.latest_updates(feed_ids).await?;

        let mut prices = HashMap::with_capacity(response.parsed.len());
        for entry in response.parsed {
            let feed_id = FeedId::from_hex(&entry.id)
                .map_err(|e| FetchError::Decode(format!("feed id {}: {e}", entry.id)))?;
            prices.insert(feed_id, entry.price.try_into_snapshot()?);
        }
        Ok(prices)
    }
}

#[derive(Deserialize)]
struct LatestUpdatesResponse {
    binary: BinaryData,
    #[serde(default)]
    parsed: Vec<ParsedUpdate>,
}

#[derive(Deserialize)]
struct BinaryData {
    data: Vec<String>,
}

#[derive(Deserialize)]
struct ParsedUpdate {
    id: String,
    price: ParsedPrice,
}

/// Numeric fields arrive as decimal strings on the wire.
#[derive(Deserialize)]
struct ParsedPrice {
    price: String,
    conf: String,
    expo: i32,
    publish_time: i64,
}

impl ParsedPrice {
    fn try_into_snapshot(self) -> Result<PriceSnapshot, FetchError> {
        let price = self
            .price
            .parse()
            .map_err(|_| FetchError::Decode(format!("price {:?}", self.price)))?;
        let conf = self
            .conf
            .parse()
            .map_err(|_| FetchError::Decode(format!("conf {:?}", self.conf)))?;
        Ok(PriceSnapshot {
            price,
            conf,
            exponent: self.expo,
            publish_time: self.publish_time,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parsed_price_string_fields() {
        let parsed = ParsedPrice {
            price: "6712345000000".to_string(),
            conf: "2500000000".to_string(),
            expo: -8,
            publish_time: 1_700_000_123,
        };

        let snapshot = parsed.try_into_snapshot().unwrap();
        assert_eq!(snapshot.price, 6_712_345_000_000);
        assert_eq!(snapshot.conf, 2_500_000_000);
        assert_eq!(snapshot.exponent, -8);
        assert_eq!(snapshot.publish_time, 1_700_000_123);
    }

    #[test]
    fn test_parsed_price_rejects_non_numeric() {
        let parsed = ParsedPrice {
            price: "not-a-number".to_string(),
            conf: "0".to_string(),
            expo: 0,
            publish_time: 0,
        };

        assert!(matches!(
            parsed.try_into_snapshot(),
            Err(FetchError::Decode(_))
        ));
    }

    #[test]
    fn test_response_shape_deserializes() {
        let raw = serde_json::json!({
            "binary": {
                "encoding": "base64",
                "data": ["3q2+7w=="]
            },
            "parsed": [{
                "id": "e62df6c8b4a85fe1a67db44dc12de5db330f7ac66b72dc658afedf0f4a415b43",
                "price": {
                    "price": "6712345000000",
                    "conf": "2500000000",
                    "expo": -8,
                    "publish_time": 1700000123
                }
            }]
        });

        let response: LatestUpdatesResponse = serde_json::from_value(raw).unwrap();
        assert_eq!(response.binary.data.len(), 1);
        assert_eq!(response.parsed.len(), 1);
    }

    #[test]
    fn test_endpoint_trailing_slash_is_trimmed() {
        let client = HermesClient::new("https://hermes.example.com/");
        assert_eq!(client.endpoint, "https://hermes.example.com");
    }
}
