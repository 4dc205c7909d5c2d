//! # Merge Scan Tokenizer
//!
//! Repeatedly scans the working sequence for the lowest-priority applicable
//! merge rule, and collapses every adjacent occurrence of that pair in one pass;
//! iterates until no more merges remain.
//!
//! This is priority-ordered (not frequency-ordered) merging: the earliest
//! defined rule always wins, regardless of how often competing pairs occur.

use crate::{
    types::{Pair, TokenId},
    vocab::Vocabulary,
};

/// Options for [`Vocabulary::tokenize`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenizeOptions {
    /// The highest rule priority which may be applied.
    ///
    /// Used to reconstruct the tokenization as of an earlier vocabulary
    /// construction step. When `None`, all rules may be applied.
    pub max_rule_priority: Option<usize>,
}

impl TokenizeOptions {
    /// Get the configured max rule priority.
    pub fn max_rule_priority(&self) -> Option<usize> {
        self.max_rule_priority
    }

    /// Set the configured max rule priority.
    pub fn set_max_rule_priority(
        &mut self,
        max_rule_priority: Option<usize>,
    ) {
        self.max_rule_priority = max_rule_priority;
    }

    /// Set the configured max rule priority and return the options.
    pub fn with_max_rule_priority(
        mut self,
        max_rule_priority: Option<usize>,
    ) -> Self {
        self.set_max_rule_priority(max_rule_priority);
        self
    }
}

const NIL: usize = usize::MAX;

#[derive(Debug, Clone, Copy)]
struct Link {
    token: TokenId,
    prev: usize,
    next: usize,
}

/// A doubly linked token sequence over a slab of links.
///
/// Collapsing an adjacent pair into one token is O(1).
#[derive(Debug, Clone)]
pub struct TokenChain {
    links: Vec<Link>,
    head: usize,
    len: usize,
}

impl TokenChain {
    /// Build a chain of byte tokens.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self::from_tokens(bytes.iter().map(|&b| b as TokenId))
    }

    /// Build a chain from a token sequence.
    pub fn from_tokens<I>(tokens: I) -> Self
    where
        I: IntoIterator<Item = TokenId>,
    {
        let mut links: Vec<Link> = tokens
            .into_iter()
            .enumerate()
            .map(|(idx, token)| Link {
                token,
                // ``0 - 1`` wraps to NIL.
                prev: idx.wrapping_sub(1),
                next: idx + 1,
            })
            .collect();

        let len = links.len();
        if let Some(last) = links.last_mut() {
            last.next = NIL;
        }

        Self {
            links,
            head: if len == 0 { NIL } else { 0 },
            len,
        }
    }

    /// The number of tokens in the chain.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Is the chain empty?
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Iterate the tokens, in order.
    pub fn iter(&self) -> impl Iterator<Item = TokenId> + '_ {
        let mut cursor = self.head;
        core::iter::from_fn(move || {
            if cursor == NIL {
                return None;
            }
            let link = &self.links[cursor];
            cursor = link.next;
            Some(link.token)
        })
    }

    /// Iterate the adjacent ``(left, right)`` pairs, in order.
    pub fn pairs(&self) -> impl Iterator<Item = Pair<TokenId>> + '_ {
        let mut cursor = self.head;
        core::iter::from_fn(move || {
            if cursor == NIL {
                return None;
            }
            let link = &self.links[cursor];
            if link.next == NIL {
                return None;
            }
            cursor = link.next;
            Some((link.token, self.links[link.next].token))
        })
    }

    /// Collect the tokens into a vector.
    pub fn to_vec(&self) -> Vec<TokenId> {
        let mut tokens = Vec::with_capacity(self.len);
        tokens.extend(self.iter());
        tokens
    }

    /// Collapse `links[idx]` and its successor into `token`.
    fn collapse(
        &mut self,
        idx: usize,
        token: TokenId,
    ) {
        let removed = self.links[idx].next;
        debug_assert_ne!(removed, NIL);
        debug_assert_eq!(self.links[removed].prev, idx);

        let after = self.links[removed].next;
        self.links[idx].token = token;
        self.links[idx].next = after;
        if after != NIL {
            self.links[after].prev = idx;
        }
        self.len -= 1;
    }

    /// Replace every non-overlapping ``pair`` occurrence, left to right.
    ///
    /// ## Returns
    /// The number of merges applied.
    pub fn merge_all(
        &mut self,
        pair: Pair<TokenId>,
        result: TokenId,
    ) -> usize {
        let mut count = 0;
        let mut cursor = self.head;
        while cursor != NIL {
            let next = self.links[cursor].next;
            if next == NIL {
                break;
            }
            if (self.links[cursor].token, self.links[next].token) == pair {
                self.collapse(cursor, result);
                count += 1;
            }
            cursor = self.links[cursor].next;
        }
        count
    }
}

/// Applies a [`Vocabulary`]'s merge rules to token chains.
pub struct MergeScanner<'a> {
    vocab: &'a Vocabulary,
    max_rule_priority: usize,
}

impl<'a> MergeScanner<'a> {
    /// Create a scanner.
    pub fn new(
        vocab: &'a Vocabulary,
        options: &TokenizeOptions,
    ) -> Self {
        Self {
            vocab,
            max_rule_priority: options.max_rule_priority().unwrap_or(usize::MAX),
        }
    }

    /// Find the applicable rule with the lowest priority in `chain`.
    ///
    /// ## Returns
    /// The rule priority, or `None` if no adjacent pair has a rule.
    pub fn next_merge(
        &self,
        chain: &TokenChain,
    ) -> Option<usize> {
        chain
            .pairs()
            .filter_map(|pair| self.vocab.rule_priority(&pair))
            .min()
    }

    /// Merge `chain` until it reaches a fixed point.
    pub fn apply(
        &self,
        chain: &mut TokenChain,
    ) {
        while chain.len() >= 2 {
            let Some(k) = self.next_merge(chain) else {
                break;
            };
            if k > self.max_rule_priority {
                break;
            }

            let rule = &self.vocab.merge_rules()[k];
            chain.merge_all(rule.pair(), rule.result);
        }
    }

    /// Tokenize `input` to token ids.
    pub fn tokenize(
        &self,
        input: &[u8],
    ) -> Vec<TokenId> {
        let mut chain = TokenChain::from_bytes(input);
        self.apply(&mut chain);
        chain.to_vec()
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::vocab::utility::testing::{arb_merge_rules, build_test_vocab};

    fn ids(
        vocab: &Vocabulary,
        text: &str,
    ) -> Vec<TokenId> {
        vocab.tokenize_ids(text.as_bytes(), &TokenizeOptions::default())
    }

    #[test]
    fn test_options() {
        let options = TokenizeOptions::default();
        assert_eq!(options.max_rule_priority(), None);

        let options = options.with_max_rule_priority(Some(3));
        assert_eq!(options.max_rule_priority(), Some(3));

        let mut options = options;
        options.set_max_rule_priority(None);
        assert_eq!(options, TokenizeOptions::default());
    }

    #[test]
    fn test_chain() {
        let mut chain = TokenChain::from_tokens([1, 2, 1, 2, 2]);
        assert_eq!(chain.len(), 5);
        assert_eq!(chain.pairs().collect::<Vec<_>>(), vec![(1, 2), (2, 1), (1, 2), (2, 2)]);

        assert_eq!(chain.merge_all((1, 2), 9), 2);
        assert_eq!(chain.to_vec(), vec![9, 9, 2]);
        assert_eq!(chain.len(), 3);

        assert_eq!(chain.merge_all((9, 2), 7), 1);
        assert_eq!(chain.to_vec(), vec![9, 7]);

        assert_eq!(chain.merge_all((9, 7), 5), 1);
        assert_eq!(chain.to_vec(), vec![5]);
        assert_eq!(chain.pairs().count(), 0);

        let empty = TokenChain::from_bytes(b"");
        assert!(empty.is_empty());
        assert_eq!(empty.to_vec(), Vec::<TokenId>::new());
        assert_eq!(empty.pairs().count(), 0);
    }

    #[test]
    fn test_chain_overlapping_pairs() {
        let mut chain = TokenChain::from_bytes(b"aaa");
        assert_eq!(chain.merge_all((97, 97), 256), 1);
        assert_eq!(chain.to_vec(), vec![256, 97]);

        let mut chain = TokenChain::from_bytes(b"aaaa");
        assert_eq!(chain.merge_all((97, 97), 256), 2);
        assert_eq!(chain.to_vec(), vec![256, 256]);
    }

    #[test]
    fn test_tokenize_edge_cases() {
        let vocab = build_test_vocab();

        assert!(vocab.tokenize(b"", &TokenizeOptions::default()).is_empty());
        assert_eq!(ids(&vocab, "a"), vec![97]);
        assert_eq!(ids(&vocab, "xyz"), vec![120, 121, 122]);
    }

    #[test]
    fn test_priority_ordering() {
        // rule0 (a, b), rule1 (b, c): "abc" takes rule0 first.
        let vocab = Vocabulary::from_merge_rules(&[(97, 98), (98, 99)]).unwrap();
        assert_eq!(ids(&vocab, "abc"), vec![256, 99]);
        assert_eq!(ids(&vocab, "bc"), vec![257]);

        // The same rules, defined in the opposite order.
        let vocab = Vocabulary::from_merge_rules(&[(98, 99), (97, 98)]).unwrap();
        assert_eq!(ids(&vocab, "abc"), vec![97, 256]);

        // After rule0 fires, ("ab", c) becomes the lowest remaining rule.
        let vocab = build_test_vocab();
        assert_eq!(ids(&vocab, "abc"), vec![257]);
        assert_eq!(ids(&vocab, "bc"), vec![258]);
    }

    #[test]
    fn test_priority_beats_frequency() {
        // (c, c) occurs more often, but (b, c) was defined first.
        let vocab = Vocabulary::from_merge_rules(&[(98, 99), (99, 99)]).unwrap();
        assert_eq!(ids(&vocab, "bcccc"), vec![256, 257, 99]);
    }

    #[test]
    fn test_minted_tokens_round_trip() {
        let vocab = Vocabulary::from_merge_rules(&[
            (97, 98),
            (256, 99),
            (98, 99),
            (32, 256),
            (259, 259),
            (257, 257),
        ])
        .unwrap();

        for token in vocab.tokens() {
            assert_eq!(
                vocab.tokenize_ids(token.value(), &TokenizeOptions::default()),
                vec![token.id()],
                "round trip failed for {token:?}"
            );
        }
    }

    #[test]
    fn test_merges_every_occurrence() {
        let vocab = build_test_vocab();
        let tokens = vocab.tokenize_str("ab ab abc", &TokenizeOptions::default());
        let displays: Vec<&str> = tokens.iter().map(|t| t.display()).collect();
        assert_eq!(displays, vec!["ab", " ", "ab", " ", "abc"]);
    }

    #[test]
    fn test_max_rule_priority() {
        let vocab = build_test_vocab();

        let at = |k: Option<usize>| {
            vocab.tokenize_ids(
                b"abc",
                &TokenizeOptions::default().with_max_rule_priority(k),
            )
        };

        assert_eq!(at(None), vec![257]);
        assert_eq!(at(Some(1)), vec![257]);
        assert_eq!(at(Some(0)), vec![256, 99]);

        // Only rule 1 occurs, and it is above the limit.
        let vocab = Vocabulary::from_merge_rules(&[(120, 120), (97, 98)]).unwrap();
        assert_eq!(
            vocab.tokenize_ids(b"ab", &TokenizeOptions::default().with_max_rule_priority(Some(0))),
            vec![97, 98]
        );
    }

    #[test]
    fn test_next_merge() {
        let vocab = build_test_vocab();
        let scanner = MergeScanner::new(&vocab, &TokenizeOptions::default());

        let mut chain = TokenChain::from_bytes(b"xbcab");
        assert_eq!(scanner.next_merge(&chain), Some(0));

        chain.merge_all((97, 98), 256);
        assert_eq!(scanner.next_merge(&chain), Some(2));

        scanner.apply(&mut chain);
        assert_eq!(chain.to_vec(), vec![120, 258, 256]);
        assert_eq!(scanner.next_merge(&chain), None);
    }

    proptest! {
        #[test]
        fn prop_tokenize_fixed_point(rules in arb_merge_rules(48)) {
            let vocab = Vocabulary::from_merge_rules(&rules).unwrap();
            let options = TokenizeOptions::default();
            let scanner = MergeScanner::new(&vocab, &options);

            for token in vocab.tokens() {
                let result = vocab.tokenize_ids(token.value(), &options);

                // Always a partition of the token's bytes.
                prop_assert_eq!(vocab.decode(&result).unwrap(), token.value().to_vec());

                // No applicable rule remains.
                prop_assert_eq!(scanner.next_merge(&TokenChain::from_tokens(result.iter().copied())), None);

                // Byte tokens, and the first rule's token, always round trip.
                if token.is_byte() || token.id() == 256 {
                    prop_assert_eq!(result, vec![token.id()]);
                }
            }
        }

        #[test]
        fn prop_tokenize_idempotent(
            rules in arb_merge_rules(48),
            input in proptest::collection::vec(any::<u8>(), 0..64),
        ) {
            let vocab = Vocabulary::from_merge_rules(&rules).unwrap();
            let options = TokenizeOptions::default();

            let first = vocab.tokenize_ids(&input, &options);
            let bytes = vocab.decode(&first).unwrap();
            prop_assert_eq!(&bytes, &input);

            let second = vocab.tokenize_ids(&bytes, &options);
            prop_assert_eq!(first, second);
        }
    }
}
