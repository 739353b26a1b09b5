use crate::FeedId;
use std::ops::Range;

/// Signed attestation payload for one round, covering possibly many feeds.
///
/// The payload is opaque: it is sliced by the byte-range index the fetcher
/// built when it assembled the blob, never by feed position. A blob and its
/// index live for exactly one push cycle.
#[derive(Debug, Clone)]
pub struct AttestationBlob {
    data: Vec<u8>,
    index: Vec<(FeedId, Range<usize>)>,
}

impl AttestationBlob {
    /// Assemble a blob from per-feed segments, recording each feed's byte
    /// range as the segments are concatenated.
    pub fn from_segments(segments: Vec<(FeedId, Vec<u8>)>) -> Self {
        let total: usize = segments.iter().map(|(_, bytes)| bytes.len()).sum();
        let mut data = Vec::with_capacity(total);
        let mut index = Vec::with_capacity(segments.len());

        for (feed_id, bytes) in segments {
            let start = data.len();
            data.extend_from_slice(&bytes);
            index.push((feed_id, start..data.len()));
        }

        Self { data, index }
    }

    /// Byte range covering `feed_id`, if the round included it.
    pub fn range_for(&self, feed_id: &FeedId) -> Option<Range<usize>> {
        self.index
            .iter()
            .find(|(id, _)| id == feed_id)
            .map(|(_, range)| range.clone())
    }

    /// Raw bytes for an explicit range; `None` if the range is out of bounds.
    pub fn slice(&self, range: Range<usize>) -> Option<&[u8]> {
        self.data.get(range)
    }

    /// Raw bytes for `feed_id`, if the round included it.
    pub fn slice_for(&self, feed_id: &FeedId) -> Option<&[u8]> {
        self.range_for(feed_id).and_then(|range| self.slice(range))
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn feed_count(&self) -> usize {
        self.index.len()
    }
}
