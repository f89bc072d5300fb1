use proptest::prelude::*;

use faucet_types::{Lamports, PostId, Timestamp, WalletAddress, BASE58_ALPHABET};

fn base58_string(min: usize, max: usize) -> impl Strategy<Value = String> {
    prop::collection::vec(prop::sample::select(BASE58_ALPHABET.to_vec()), min..=max)
        .prop_map(|bytes| String::from_utf8(bytes).unwrap())
}

proptest! {
    /// Any base58 string of key length parses and keeps its text.
    #[test]
    fn wallet_address_accepts_base58(s in base58_string(32, 44)) {
        let addr = WalletAddress::parse(s.clone()).unwrap();
        prop_assert_eq!(addr.as_str(), s.as_str());
    }

    /// Strings shorter than a key never parse.
    #[test]
    fn wallet_address_rejects_short(s in base58_string(0, 31)) {
        prop_assert!(WalletAddress::parse(s).is_err());
    }

    /// Post ids are exactly the non-empty digit strings.
    #[test]
    fn post_id_digits(n in any::<u64>()) {
        let id = PostId::parse(n.to_string()).unwrap();
        prop_assert_eq!(id.as_str(), n.to_string());
    }

    /// Timestamp ordering follows the millisecond value.
    #[test]
    fn timestamp_ordering(a in 0u64..u64::MAX, b in 0u64..u64::MAX) {
        let ta = Timestamp::from_millis(a);
        let tb = Timestamp::from_millis(b);
        prop_assert_eq!(ta <= tb, a <= b);
    }

    /// Timestamp::elapsed_since never underflows.
    #[test]
    fn timestamp_elapsed_no_underflow(a in 0u64..u64::MAX, b in 0u64..u64::MAX) {
        let ta = Timestamp::from_millis(a);
        let tb = Timestamp::from_millis(b);
        prop_assert_eq!(ta.elapsed_since(tb), b.saturating_sub(a));
    }

    /// The configured amount always lies inside its own tolerance band.
    #[test]
    fn amount_within_own_band(raw in 0u64..u64::MAX, pct in 0u64..100) {
        let amount = Lamports::new(raw);
        prop_assert!(amount.within_tolerance(raw, pct));
        let (low, high) = amount.tolerance_band(pct);
        prop_assert!(low <= raw && raw <= high);
    }
}
