use crate::errors::AccountDecodeError;
use borsh::{BorshDeserialize, BorshSerialize};

/// Discriminator prefixing every price update account owned by the receiver.
pub const PRICE_UPDATE_DISCRIMINATOR: [u8; 8] = [34, 241, 35, 99, 157, 126, 244, 205];

/// Latest price the network currently stores for one feed, as consumed by
/// the poll path. Cycle-transient; discarded once the caller has used it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceSnapshot {
    pub price: i64,
    pub conf: u64,
    pub exponent: i32,
    pub publish_time: i64,
}

/// Verified price message stored inside a price update account.
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct PriceMessage {
    pub feed_id: [u8; 32],
    pub price: i64,
    pub conf: u64,
    pub exponent: i32,
    pub publish_time: i64,
    pub prev_publish_time: i64,
    pub ema_price: i64,
    pub ema_conf: u64,
}

/// On-chain price update account, as written by the receiver program.
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct PriceUpdateAccount {
    pub write_authority: [u8; 32],
    pub verification_level: u8,
    pub price_message: PriceMessage,
    pub posted_slot: u64,
}

impl PriceUpdateAccount {
    pub fn snapshot(&self) -> PriceSnapshot {
        PriceSnapshot {
            price: self.price_message.price,
            conf: self.price_message.conf,
            exponent: self.price_message.exponent,
            publish_time: self.price_message.publish_time,
        }
    }
}

/// Decode a raw feed account: discriminator check, then the borsh body.
///
/// Trailing bytes are tolerated; the receiver pads accounts to their
/// allocation size.
pub fn decode_price_update_account(data: &[u8]) -> Result<PriceUpdateAccount, AccountDecodeError> {
    if data.len() < PRICE_UPDATE_DISCRIMINATOR.len() {
        return Err(AccountDecodeError::AccountTooSmall(data.len()));
    }

    let (discriminator, mut body) = data.split_at(PRICE_UPDATE_DISCRIMINATOR.len());
    if discriminator != PRICE_UPDATE_DISCRIMINATOR {
        return Err(AccountDecodeError::UnexpectedDiscriminator);
    }

    PriceUpdateAccount::deserialize(&mut body)
        .map_err(|e| AccountDecodeError::Deserialize(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_account() -> PriceUpdateAccount {
        PriceUpdateAccount {
            write_authority: [9u8; 32],
            verification_level: 1,
            price_message: PriceMessage {
                feed_id: [7u8; 32],
                price: 6_712_345_000_000,
                conf: 2_500_000_000,
                exponent: -8,
                publish_time: 1_700_000_123,
                prev_publish_time: 1_700_000_122,
                ema_price: 6_700_000_000_000,
                ema_conf: 2_400_000_000,
            },
            posted_slot: 250_000_000,
        }
    }

    fn encode(account: &PriceUpdateAccount) -> Vec<u8> {
        let mut data = PRICE_UPDATE_DISCRIMINATOR.to_vec();
        data.extend_from_slice(&borsh::to_vec(account).unwrap());
        data
    }

    #[test]
    fn test_decode_round_trip() {
        let account = sample_account();
        let decoded = decode_price_update_account(&encode(&account)).unwrap();
        assert_eq!(decoded, account);
    }

    #[test]
    fn test_decode_tolerates_trailing_padding() {
        let account = sample_account();
        let mut data = encode(&account);
        data.extend_from_slice(&[0u8; 64]);

        let decoded = decode_price_update_account(&data).unwrap();
        assert_eq!(decoded, account);
    }

    #[test]
    fn test_decode_rejects_wrong_discriminator() {
        let account = sample_account();
        let mut data = encode(&account);
        data[0] ^= 0xff;

        assert!(matches!(
            decode_price_update_account(&data),
            Err(AccountDecodeError::UnexpectedDiscriminator)
        ));
    }

    #[test]
    fn test_decode_rejects_truncated_account() {
        assert!(matches!(
            decode_price_update_account(&[1, 2, 3]),
            Err(AccountDecodeError::AccountTooSmall(3))
        ));
    }

    #[test]
    fn test_snapshot_projects_price_message() {
        let account = sample_account();
        let snapshot = account.snapshot();

        assert_eq!(snapshot.price, account.price_message.price);
        assert_eq!(snapshot.conf, account.price_message.conf);
        assert_eq!(snapshot.exponent, account.price_message.exponent);
        assert_eq!(snapshot.publish_time, account.price_message.publish_time);
    }
}
