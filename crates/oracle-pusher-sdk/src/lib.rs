/*!
# Oracle Pusher SDK

Domain types and receiver-program client helpers shared by the pusher
pipeline: feed identifiers, attestation payloads with byte-range slicing,
on-chain price account decoding, shard address derivation, and the update
instruction builders.

## Design Philosophy

- **Unsigned Building Blocks**: instruction builders return plain
  `Instruction` values; signing and sending belong to the submission layer
- **RPC Independence**: nothing in this crate makes network calls, callers
  provide account data and attestation bytes
- **Opaque Attestations**: attestation payloads are sliced strictly through
  the byte-range index the fetcher built, never by positional guessing

## Usage

```rust
use oracle_pusher_sdk::{build_update_operations, AddressFinder, AttestationBlob, FeedId};
use solana_sdk::pubkey::Pubkey;

let feed: FeedId = "e62df6c8b4a85fe1a67db44dc12de5db330f7ac66b72dc658afedf0f4a415b43"
    .parse()
    .expect("valid feed id");

let blob = AttestationBlob::from_segments(vec![(feed, vec![0xde, 0xad, 0xbe, 0xef])]);

let finder = AddressFinder::default();
let payer = Pubkey::new_unique();
let ops = build_update_operations(&[feed], &blob, &finder, &payer, 0)
    .expect("every feed has an attestation range");
assert_eq!(ops.len(), 1);
```
*/

mod address_finder;
mod attestation;
mod errors;
mod feed;
mod instruction_builders;
mod price_account;

pub use address_finder::AddressFinder;
pub use attestation::AttestationBlob;
pub use errors::{AccountDecodeError, BuildError, BuildResult, FeedIdError};
pub use feed::{dedup_feed_ids, FeedId};
pub use instruction_builders::{
    build_post_price_update_ix, build_update_operations, UpdateOperation,
};
pub use price_account::{
    decode_price_update_account, PriceMessage, PriceSnapshot, PriceUpdateAccount,
    PRICE_UPDATE_DISCRIMINATOR,
};

// Re-export the default receiver program ID
pub use address_finder::RECEIVER_PROGRAM_ID;
