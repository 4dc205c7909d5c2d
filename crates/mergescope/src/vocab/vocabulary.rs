//! # Merge-Rule Vocabulary
//!
//! A [`Vocabulary`] is an arena of [`Token`]s indexed by dense id,
//! plus the ordered [`MergeRule`] table which produced them.

use core::sync::atomic::{AtomicU64, Ordering};

use crate::{
    errors::{MSResult, MergescopeError},
    types::{BYTE_TOKEN_COUNT, MSHashMap, Pair, TokenId, hash_map_with_capacity},
    vocab::{
        HistoryTree,
        Token,
        merge_scan::{MergeScanner, TokenizeOptions},
    },
};

static NEXT_VOCAB_ID: AtomicU64 = AtomicU64::new(0);

/// Identity of the vocabulary which minted a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct VocabId(u64);

impl VocabId {
    fn fresh() -> Self {
        Self(NEXT_VOCAB_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// An ``(left, right) -> result`` merge rule.
///
/// Rule `k` (0-indexed) always produces token id ``256 + k``;
/// lower `k` is applied first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MergeRule {
    /// The left half.
    pub left: TokenId,

    /// The right half.
    pub right: TokenId,

    /// The merged token.
    pub result: TokenId,
}

impl MergeRule {
    /// The ``(left, right)`` pair this rule merges.
    pub fn pair(&self) -> Pair<TokenId> {
        (self.left, self.right)
    }
}

/// Merge-rule vocabulary.
///
/// Immutable after construction; safe to share between any number of readers.
#[derive(Debug, Clone)]
pub struct Vocabulary {
    vocab_id: VocabId,

    /// Dense token table; ``tokens[id].id() == id``.
    tokens: Vec<Token>,

    /// Rules, in priority order.
    merge_rules: Vec<MergeRule>,

    /// Map of ``{ (left, right) -> rule priority }``.
    rule_index: MSHashMap<Pair<TokenId>, usize>,

    /// Map of ``{ display form -> id }``; last write wins.
    display_index: MSHashMap<String, TokenId>,
}

impl Vocabulary {
    /// Build a vocabulary from an ordered list of ``(left, right)`` merge rules.
    ///
    /// Mints the 256 byte tokens, then one merged token per rule.
    ///
    /// ## Arguments
    /// * `rules` - the merge rules, in priority order.
    ///
    /// ## Returns
    /// The vocabulary; or [`MergescopeError::MalformedVocabulary`] if
    /// any rule references a token which is not yet minted.
    pub fn from_merge_rules(rules: &[Pair<TokenId>]) -> MSResult<Self> {
        let size = BYTE_TOKEN_COUNT + rules.len();
        if TokenId::try_from(size).is_err() {
            return Err(MergescopeError::MalformedVocabulary(format!(
                "vocab size ({size}) exceeds token id capacity"
            )));
        }

        let mut vocab = Self {
            vocab_id: VocabId::fresh(),
            tokens: Vec::with_capacity(size),
            merge_rules: Vec::with_capacity(rules.len()),
            rule_index: hash_map_with_capacity(rules.len()),
            display_index: hash_map_with_capacity(size),
        };

        for byte in 0..BYTE_TOKEN_COUNT {
            vocab.mint_byte_token(byte as u8);
        }

        for (k, &(left, right)) in rules.iter().enumerate() {
            vocab.mint_merged_token(k, left, right)?;
        }

        log::info!(
            "Built vocabulary: {} merge rules, {} tokens",
            vocab.merge_rules.len(),
            vocab.tokens.len()
        );

        Ok(vocab)
    }

    fn push_token(
        &mut self,
        token: Token,
    ) {
        self.display_index
            .insert(token.display().to_string(), token.id());
        self.tokens.push(token);
    }

    fn mint_byte_token(
        &mut self,
        byte: u8,
    ) {
        let id = self.tokens.len() as TokenId;
        let token = Token::mint(id, Box::new([byte]), None, Some(self.vocab_id));
        self.push_token(token);
    }

    fn mint_merged_token(
        &mut self,
        k: usize,
        left: TokenId,
        right: TokenId,
    ) -> MSResult<()> {
        let minted = self.tokens.len();
        debug_assert_eq!(minted, BYTE_TOKEN_COUNT + k);

        for side in [left, right] {
            if side as usize >= minted {
                return Err(MergescopeError::MalformedVocabulary(format!(
                    "merge rule {k} ({left}, {right}) references unknown token {side}"
                )));
            }
        }

        let id = minted as TokenId;
        let value: Box<[u8]> = [
            self.expect_token(left).value(),
            self.expect_token(right).value(),
        ]
        .concat()
        .into();

        let token = Token::mint(id, value, Some((left, right)), Some(self.vocab_id));
        self.push_token(token);

        self.tokens[left as usize].push_left_descendant(id);
        self.tokens[right as usize].push_right_descendant(id);

        self.rule_index.entry((left, right)).or_insert(k);
        self.merge_rules.push(MergeRule {
            left,
            right,
            result: id,
        });

        Ok(())
    }

    pub(crate) fn vocab_id(&self) -> VocabId {
        self.vocab_id
    }

    /// Lookup a token which is known to exist.
    pub(crate) fn expect_token(
        &self,
        id: TokenId,
    ) -> &Token {
        &self.tokens[id as usize]
    }

    /// The priority of the rule merging `pair`, if any.
    #[inline(always)]
    pub(crate) fn rule_priority(
        &self,
        pair: &Pair<TokenId>,
    ) -> Option<usize> {
        self.rule_index.get(pair).copied()
    }

    /// Get the number of tokens in the vocabulary.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// The dense token table.
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// The merge rules, in priority order.
    pub fn merge_rules(&self) -> &[MergeRule] {
        &self.merge_rules
    }

    /// Get a token by id.
    pub fn get(
        &self,
        id: TokenId,
    ) -> Option<&Token> {
        self.tokens.get(id as usize)
    }

    /// Get a token by its display form.
    pub fn by_display(
        &self,
        display: &str,
    ) -> Option<&Token> {
        self.display_index
            .get(display)
            .map(|&id| self.expect_token(id))
    }

    /// Looks up the rule merging ``(left, right)``.
    ///
    /// ## Returns
    /// The rule priority and the rule, if one exists.
    pub fn lookup_rule(
        &self,
        left: TokenId,
        right: TokenId,
    ) -> Option<(usize, &MergeRule)> {
        self.rule_priority(&(left, right))
            .map(|k| (k, &self.merge_rules[k]))
    }

    /// The derivation history of the token `id`.
    pub fn history_tree(
        &self,
        id: TokenId,
    ) -> MSResult<HistoryTree> {
        self.get(id)
            .ok_or(MergescopeError::MissingVocabulary { id })?
            .history_tree(self)
    }

    /// Tokenize a byte sequence.
    ///
    /// ## Arguments
    /// * `input` - the bytes to tokenize.
    /// * `options` - tokenization options.
    ///
    /// ## Returns
    /// The merged token sequence.
    pub fn tokenize(
        &self,
        input: &[u8],
        options: &TokenizeOptions,
    ) -> Vec<&Token> {
        self.tokenize_ids(input, options)
            .into_iter()
            .map(|id| self.expect_token(id))
            .collect()
    }

    /// Tokenize the UTF-8 bytes of a string.
    pub fn tokenize_str(
        &self,
        text: &str,
        options: &TokenizeOptions,
    ) -> Vec<&Token> {
        self.tokenize(text.as_bytes(), options)
    }

    /// Tokenize a byte sequence to token ids.
    pub fn tokenize_ids(
        &self,
        input: &[u8],
        options: &TokenizeOptions,
    ) -> Vec<TokenId> {
        MergeScanner::new(self, options).tokenize(input)
    }

    /// Concatenate the values of a token id sequence.
    ///
    /// ## Returns
    /// The bytes; or [`MergescopeError::MalformedVocabulary`] on an unknown id.
    pub fn decode(
        &self,
        ids: &[TokenId],
    ) -> MSResult<Vec<u8>> {
        let mut buf = Vec::with_capacity(ids.len() * 2);
        for &id in ids {
            let token = self.get(id).ok_or_else(|| {
                MergescopeError::MalformedVocabulary(format!("unknown token id {id}"))
            })?;
            buf.extend_from_slice(token.value());
        }
        Ok(buf)
    }
}
