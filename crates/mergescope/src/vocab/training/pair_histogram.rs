//! # Pair Histogram

use core::cmp::Reverse;

use dary_heap::OctonaryHeap;

use crate::{
    types::{MSHashMap, MSHashSet, Pair, TokenId},
    vocab::{TokenChain, training::TrainConfig},
};

/// Weighted token and adjacent pair counts over a set of token chains.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PairHistogram {
    tokens: MSHashMap<TokenId, u64>,
    pairs: MSHashMap<Pair<TokenId>, u64>,
}

impl PairHistogram {
    /// Count every token and adjacent pair of `chain`, `weight` times.
    pub fn register_chain(
        &mut self,
        chain: &TokenChain,
        weight: u64,
    ) {
        for token in chain.iter() {
            *self.tokens.entry(token).or_default() += weight;
        }
        for pair in chain.pairs() {
            *self.pairs.entry(pair).or_default() += weight;
        }
    }

    /// The count of `token`.
    pub fn get_token(
        &self,
        token: TokenId,
    ) -> u64 {
        self.tokens.get(&token).copied().unwrap_or_default()
    }

    /// The count of `pair`.
    pub fn get_pair(
        &self,
        pair: Pair<TokenId>,
    ) -> u64 {
        self.pairs.get(&pair).copied().unwrap_or_default()
    }

    /// The number of distinct pairs.
    pub fn len_pairs(&self) -> usize {
        self.pairs.len()
    }

    /// Select a batch of pairs to merge, in the order they should be minted.
    ///
    /// Pairs are ranked by descending count, ties to the ascending pair.
    /// Pairs whose merged value breaks the length limit are skipped, and the
    /// first remaining pair sets the step's top count. A pair is accepted while
    /// its count is at least ``eta * top``, unless it overlaps an accepted pair:
    /// it may not start with an accepted pair's right half, nor end with an
    /// accepted pair's left half.
    ///
    /// ## Arguments
    /// * `config` - the training config.
    /// * `budget` - the most pairs to select.
    /// * `merged_len` - the byte length of a pair's merged value.
    pub fn merges_to_add<F>(
        &self,
        config: &TrainConfig,
        budget: usize,
        merged_len: F,
    ) -> Vec<Pair<TokenId>>
    where
        F: Fn(Pair<TokenId>) -> usize,
    {
        let mut heap = OctonaryHeap::with_capacity(self.pairs.len());
        for (&pair, &count) in &self.pairs {
            heap.push((count, Reverse(pair)));
        }

        let mut top: Option<u64> = None;
        let mut blocked_left: MSHashSet<TokenId> = Default::default();
        let mut blocked_right: MSHashSet<TokenId> = Default::default();
        let mut merges = Vec::new();

        while merges.len() < budget {
            let Some((count, Reverse(pair))) = heap.pop() else {
                break;
            };
            if !config.allows_length(merged_len(pair)) {
                continue;
            }

            let top = *top.get_or_insert(count);
            if (count as f64) < config.eta * top as f64 {
                break;
            }

            let (left, right) = pair;
            if blocked_left.contains(&left) || blocked_right.contains(&right) {
                continue;
            }
            blocked_left.insert(right);
            blocked_right.insert(left);
            merges.push(pair);
        }

        merges
    }
}
