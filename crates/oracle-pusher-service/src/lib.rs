/*!
# Oracle Pusher Service

The push pipeline: reads current on-chain feed state, fetches signed
attestations for a round, builds capacity-bounded batches of update
operations, and submits them through the strategy fixed at construction —
independent direct dispatch, or grouped atomic auction dispatch with a tip.

## Cycle Shape

Every push cycle walks the same states regardless of strategy:

```text
IDLE -> FETCHING_ATTESTATIONS -> BUILDING_BATCHES -> SUBMITTING -> IDLE
```

A fetch or build failure aborts straight back to idle with nothing
submitted; submission failures are recorded per unit and never abort the
cycle. No fault from inside a cycle escapes it — the scheduler always gets
control back for the next tick.

## Components

- [`HermesClient`] — attestation and source-price HTTP client
- [`SolanaPriceListener`] — on-chain feed state reads and the poll cache
- [`DirectPusher`] / [`BundledPusher`] — the two [`PricePusher`] strategies
- [`Controller`] — push/poll scheduling and feed selection
- [`LivenessTracker`] — "time since last successful push/poll" accessors for
  an external health layer
*/

mod config;
mod controller;
mod error;
mod hermes;
mod listener;
mod liveness;
mod pusher;

pub use config::{load_feed_config, FeedEntry};
pub use controller::{needs_push, Controller, PushThresholds};
pub use error::{FetchError, ServiceError, ServiceResult};
pub use hermes::{AttestationSource, HermesClient};
pub use listener::SolanaPriceListener;
pub use liveness::LivenessTracker;
pub use pusher::{BundledPusher, CycleAbort, CycleOutcome, DirectPusher, PricePusher};
