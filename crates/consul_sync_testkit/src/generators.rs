//! Property-based test generators using proptest.
//!
//! Keys are drawn from a small alphabet so that generated prefixes actually
//! match generated keys often enough to be interesting.

use consul_sync_core::{PrefixRewrite, Record};
use proptest::prelude::*;

/// Strategy for a single key path segment.
pub fn segment_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[ab][a-c0-9_-]{0,3}").expect("Invalid regex")
}

/// Strategy for keys: one to four segments, sometimes with a trailing
/// `/` (a folder key) or a leading `/`.
pub fn key_strategy() -> impl Strategy<Value = String> {
    (
        prop::collection::vec(segment_strategy(), 1..=4),
        any::<bool>(),
        prop::bool::weighted(0.1),
    )
        .prop_map(|(segments, folder, rooted)| {
            let mut key = segments.join("/");
            if folder {
                key.push('/');
            }
            if rooted {
                key.insert(0, '/');
            }
            key
        })
}

/// Strategy for prefixes: empty, bare `/`, or segments with or without a
/// trailing `/`.
pub fn prefix_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(String::new()),
        Just("/".to_string()),
        (prop::collection::vec(segment_strategy(), 1..=2), any::<bool>()).prop_map(
            |(segments, slash)| {
                let mut prefix = segments.join("/");
                if slash {
                    prefix.push('/');
                }
                prefix
            }
        ),
    ]
}

/// Strategy for a from/to rewrite.
pub fn rewrite_strategy() -> impl Strategy<Value = PrefixRewrite> {
    (prefix_strategy(), prefix_strategy()).prop_map(|(from, to)| PrefixRewrite::new(from, to))
}

/// Strategy for values. Mostly text, occasionally arbitrary bytes.
pub fn value_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop_oneof![
        4 => prop::string::string_regex("[ -~]{0,24}")
            .expect("Invalid regex")
            .prop_map(String::into_bytes),
        1 => prop::collection::vec(any::<u8>(), 0..16),
    ]
}

/// Strategy for snapshot contents with unique keys, in store order.
pub fn records_strategy(max: usize) -> impl Strategy<Value = Vec<Record>> {
    prop::collection::btree_map(key_strategy(), value_strategy(), 0..=max).prop_map(|entries| {
        entries
            .into_iter()
            .map(|(key, value)| Record::new(key, value))
            .collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #[test]
        fn keys_are_never_empty(key in key_strategy()) {
            prop_assert!(!key.trim_matches('/').is_empty());
        }

        #[test]
        fn records_have_unique_keys(records in records_strategy(16)) {
            let mut keys: Vec<_> = records.iter().map(|r| r.key.clone()).collect();
            keys.dedup();
            prop_assert_eq!(keys.len(), records.len());
        }
    }
}
