//! # Vocabulary Tokens

use core::fmt::{Debug, Display};

use crate::{
    errors::{MSResult, MergescopeError},
    types::{BYTE_TOKEN_COUNT, Pair, TokenId},
    vocab::{HistoryTree, Vocabulary, vocabulary::VocabId},
};

/// One vocabulary entry; a byte token or a merged token.
///
/// Tokens are minted by a [`Vocabulary`] and are immutable afterwards.
/// The derivation graph is stored as dense ids into the owning vocabulary:
/// * `composition` - the ``(left, right)`` pair merged to produce this token.
/// * `descendants` - the tokens which used this token as their left/right half.
#[derive(Clone, PartialEq, Eq)]
pub struct Token {
    id: TokenId,
    value: Box<[u8]>,
    display: String,
    composition: Option<Pair<TokenId>>,
    descendants: [Vec<TokenId>; 2],
    owner: Option<VocabId>,
}

impl Debug for Token {
    fn fmt(
        &self,
        f: &mut core::fmt::Formatter<'_>,
    ) -> core::fmt::Result {
        write!(f, "Token({}, {:?})", self.id, self.value)
    }
}

impl Display for Token {
    fn fmt(
        &self,
        f: &mut core::fmt::Formatter<'_>,
    ) -> core::fmt::Result {
        f.write_str(&self.display)
    }
}

/// Best-effort text form of a token value.
///
/// Falls back to ``<id>`` when the bytes are not valid UTF-8.
fn display_form(
    id: TokenId,
    value: &[u8],
) -> String {
    match core::str::from_utf8(value) {
        Ok(s) => s.to_string(),
        Err(_) => format!("<{id}>"),
    }
}

impl Token {
    /// Construct a token outside of any vocabulary.
    ///
    /// Standalone tokens carry no derivation history;
    /// [`Token::history_tree`] fails with [`MergescopeError::MissingVocabulary`].
    ///
    /// ## Arguments
    /// * `id` - the token id.
    /// * `value` - the token bytes.
    pub fn standalone<V: Into<Box<[u8]>>>(
        id: TokenId,
        value: V,
    ) -> Self {
        Self::mint(id, value.into(), None, None)
    }

    pub(crate) fn mint(
        id: TokenId,
        value: Box<[u8]>,
        composition: Option<Pair<TokenId>>,
        owner: Option<VocabId>,
    ) -> Self {
        let display = display_form(id, &value);
        Self {
            id,
            value,
            display,
            composition,
            descendants: [Vec::new(), Vec::new()],
            owner,
        }
    }

    pub(crate) fn push_left_descendant(
        &mut self,
        id: TokenId,
    ) {
        self.descendants[0].push(id);
    }

    pub(crate) fn push_right_descendant(
        &mut self,
        id: TokenId,
    ) {
        self.descendants[1].push(id);
    }

    /// The token id.
    pub fn id(&self) -> TokenId {
        self.id
    }

    /// The token bytes.
    pub fn value(&self) -> &[u8] {
        &self.value
    }

    /// The display form, computed once at mint time.
    pub fn display(&self) -> &str {
        &self.display
    }

    /// The display form with spaces as ``⎵`` and newlines as ``\n``.
    pub fn display_debug(&self) -> String {
        self.display.replace(' ', "⎵").replace('\n', "\\n")
    }

    /// Is this one of the 256 byte tokens?
    pub fn is_byte(&self) -> bool {
        (self.id as usize) < BYTE_TOKEN_COUNT
    }

    /// The ``(left, right)`` pair merged to produce this token, if any.
    pub fn composition(&self) -> Option<Pair<TokenId>> {
        self.composition
    }

    /// Tokens which used this token as their left half, in mint order.
    pub fn left_descendants(&self) -> &[TokenId] {
        &self.descendants[0]
    }

    /// Tokens which used this token as their right half, in mint order.
    pub fn right_descendants(&self) -> &[TokenId] {
        &self.descendants[1]
    }

    /// Unfold the derivation history of this token.
    ///
    /// ## Arguments
    /// * `vocab` - the vocabulary which minted this token.
    ///
    /// ## Returns
    /// The binary [`HistoryTree`] down to byte tokens; or
    /// [`MergescopeError::MissingVocabulary`] if `vocab` did not mint this token.
    pub fn history_tree(
        &self,
        vocab: &Vocabulary,
    ) -> MSResult<HistoryTree> {
        if self.owner != Some(vocab.vocab_id()) {
            return Err(MergescopeError::MissingVocabulary { id: self.id });
        }

        // Every composition half was minted by `vocab` before this token.
        Ok(HistoryTree::unfold(self.id, |id| {
            let token = vocab.expect_token(id);
            (token.display_debug(), token.composition)
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_form() {
        let token = Token::standalone(104, *b"h");
        assert_eq!(token.id(), 104);
        assert_eq!(token.value(), b"h");
        assert_eq!(token.display(), "h");
        assert_eq!(token.to_string(), "h");
        assert!(token.is_byte());
        assert_eq!(token.composition(), None);

        let invalid = Token::standalone(300, vec![0xE2, 0x82]);
        assert_eq!(invalid.display(), "<300>");
        assert!(!invalid.is_byte());

        assert_eq!(format!("{:?}", invalid), "Token(300, [226, 130])");
    }

    #[test]
    fn test_display_debug() {
        let token = Token::standalone(400, b" a\nb".to_vec());
        assert_eq!(token.display(), " a\nb");
        assert_eq!(token.display_debug(), "⎵a\\nb");
    }

    #[test]
    fn test_standalone_history_fails() {
        let vocab = Vocabulary::from_merge_rules(&[]).unwrap();
        let token = Token::standalone(65, *b"A");

        match token.history_tree(&vocab) {
            Err(MergescopeError::MissingVocabulary { id }) => assert_eq!(id, 65),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_foreign_vocab_history_fails() {
        let a = Vocabulary::from_merge_rules(&[(97, 98)]).unwrap();
        let b = Vocabulary::from_merge_rules(&[(97, 98)]).unwrap();

        let token = a.get(256).unwrap();
        assert!(token.history_tree(&a).is_ok());
        assert!(matches!(
            token.history_tree(&b),
            Err(MergescopeError::MissingVocabulary { id: 256 })
        ));
    }
}
