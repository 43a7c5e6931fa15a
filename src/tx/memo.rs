//! Swap id → memo hash encoding
//!
//! The memo is the only on-chain link between the payment and the swap that
//! caused it. A swap id that is not hex, or decodes to more than 32 bytes,
//! yields the all-zero memo rather than failing the build, so reconciliation
//! downstream has to tolerate zero-memo payments.

use crate::ledger::MemoHash;

use tracing::warn;

/// Encode a swap id as a left-aligned, zero-padded 32-byte memo
///
/// `log_index` is accepted so callers can pass the full swap key, but it is
/// not part of the encoding: two log entries of one swap share a memo.
pub fn encode_memo(swap_id: &str, log_index: u32) -> MemoHash {
    let mut memo = MemoHash::default();

    match hex::decode(swap_id) {
        Ok(bytes) if bytes.len() <= memo.0.len() => {
            memo.0[..bytes.len()].copy_from_slice(&bytes);
        }
        Ok(bytes) => {
            warn!(
                "Swap id {} (log {}) decodes to {} bytes, using zero memo",
                swap_id,
                log_index,
                bytes.len()
            );
            crate::metrics::record_memo_fallback();
        }
        Err(e) => {
            warn!(
                "Swap id {} (log {}) is not hex ({}), using zero memo",
                swap_id, log_index, e
            );
            crate::metrics::record_memo_fallback();
        }
    }

    memo
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_id_left_aligned() {
        let memo = encode_memo("abcdef", 0);
        let mut expected = [0u8; 32];
        expected[..3].copy_from_slice(&[0xab, 0xcd, 0xef]);
        assert_eq!(memo.0, expected);
    }

    #[test]
    fn test_full_length_id() {
        let swap_id = "5f".repeat(32);
        assert_eq!(encode_memo(&swap_id, 0).0, [0x5f; 32]);
    }

    #[test]
    fn test_fallback_to_zero() {
        let too_long = "ab".repeat(33);
        for swap_id in ["not-hex", "abc", "0xabcdef", too_long.as_str()] {
            let memo = encode_memo(swap_id, 1);
            assert!(memo.is_zero(), "expected zero memo for {swap_id:?}");
            assert_eq!(memo.as_bytes().len(), 32);
        }
    }

    #[test]
    fn test_empty_id_is_zero() {
        assert!(encode_memo("", 0).is_zero());
    }

    #[test]
    fn test_log_index_not_encoded() {
        assert_eq!(encode_memo("abcdef", 0), encode_memo("abcdef", 7));
    }
}
