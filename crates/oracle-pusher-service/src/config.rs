use crate::error::{ServiceError, ServiceResult};
use oracle_pusher_sdk::FeedId;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// One tracked feed from the static feed list: the opaque feed id and a
/// human-readable alias used only for logging.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedEntry {
    pub id: FeedId,
    pub alias: String,
}

/// Load and validate the YAML feed list.
///
/// The list is created once at startup and lives for the process lifetime;
/// duplicate feed ids are a configuration mistake and rejected here rather
/// than silently deduplicated per cycle.
pub fn load_feed_config<P: AsRef<Path>>(path: P) -> ServiceResult<Vec<FeedEntry>> {
    let raw = std::fs::read_to_string(path)?;
    let feeds: Vec<FeedEntry> = serde_yaml::from_str(&raw)?;

    if feeds.is_empty() {
        return Err(ServiceError::InvalidConfig(
            "feed list is empty".to_string(),
        ));
    }

    let mut seen = HashSet::with_capacity(feeds.len());
    for feed in &feeds {
        if !seen.insert(feed.id) {
            return Err(ServiceError::InvalidConfig(format!(
                "duplicate feed id {} ({})",
                feed.id, feed.alias
            )));
        }
    }

    Ok(feeds)
}
