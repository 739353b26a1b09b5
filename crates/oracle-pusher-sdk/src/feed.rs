use crate::errors::FeedIdError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// Fixed-length opaque identifier of one tracked price series.
///
/// Supplied by static configuration as a hex string (with or without a
/// leading `0x`) and rendered back as lowercase hex.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FeedId([u8; 32]);

impl FeedId {
    pub const LEN: usize = 32;

    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn from_hex(s: &str) -> Result<Self, FeedIdError> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(s)?;
        let bytes: [u8; 32] = bytes
            .try_into()
            .map_err(|rejected: Vec<u8>| FeedIdError::InvalidLength(rejected.len()))?;
        Ok(Self(bytes))
    }

    pub fn to_bytes(self) -> [u8; 32] {
        self.0
    }
}

impl AsRef<[u8]> for FeedId {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for FeedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl fmt::Debug for FeedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FeedId({})", self)
    }
}

impl FromStr for FeedId {
    type Err = FeedIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl Serialize for FeedId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for FeedId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// Drop repeated feed ids, keeping the first occurrence of each.
///
/// Every push cycle deduplicates its input before batching so one feed is
/// never updated twice within the same cycle.
pub fn dedup_feed_ids(feed_ids: &[FeedId]) -> Vec<FeedId> {
    let mut seen = HashSet::with_capacity(feed_ids.len());
    feed_ids
        .iter()
        .copied()
        .filter(|id| seen.insert(*id))
        .collect()
}
