//! # Vocabulary Test Utilities

use crate::vocab::Vocabulary;

/// Build a small test vocabulary.
///
/// Rules:
/// * ``0: (a, b) -> 256 "ab"``
/// * ``1: (256, c) -> 257 "abc"``
/// * ``2: (b, c) -> 258 "bc"``
pub fn build_test_vocab() -> Vocabulary {
    Vocabulary::from_merge_rules(&[(97, 98), (256, 99), (98, 99)])
        .expect("test vocabulary is well formed")
}

/// A `proptest` strategy for well-formed merge rule lists.
///
/// Rule `k` only references ids ``< 256 + k``; halves longer than
/// 16 bytes are swapped for byte tokens to bound token lengths.
#[cfg(test)]
pub fn arb_merge_rules(max_rules: usize)
-> impl proptest::strategy::Strategy<Value = Vec<crate::types::Pair<crate::types::TokenId>>> {
    use proptest::prelude::*;

    use crate::types::{BYTE_TOKEN_COUNT, TokenId};

    proptest::collection::vec((any::<u32>(), any::<u32>()), 0..max_rules).prop_map(|raw| {
        let mut lens = vec![1_usize; BYTE_TOKEN_COUNT];
        let pick = |lens: &[usize], raw: u32| {
            let id = raw as usize % lens.len();
            if lens[id] > 16 { id % BYTE_TOKEN_COUNT } else { id }
        };

        raw.into_iter()
            .map(|(left, right)| {
                let left = pick(&lens, left);
                let right = pick(&lens, right);
                lens.push(lens[left] + lens[right]);
                (left as TokenId, right as TokenId)
            })
            .collect()
    })
}
