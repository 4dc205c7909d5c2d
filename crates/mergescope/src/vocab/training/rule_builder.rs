//! # Rule Builder
//!
//! The mutable rule table a trainer grows, one merge at a time.

use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

use crate::{
    errors::{MSResult, MergescopeError},
    types::{BYTE_TOKEN_COUNT, Pair, TokenId},
    vocab::{Vocabulary, io::write_rule_pairs},
};

/// An append-mostly merge rule table, with token values.
///
/// Rule `k` produces token ``256 + k``, as in a [`Vocabulary`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleBuilder {
    /// ``values[id]`` is the byte value of token `id`.
    values: Vec<Box<[u8]>>,

    /// ``(left, right)`` rules, in priority order.
    rules: Vec<Pair<TokenId>>,
}

impl Default for RuleBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RuleBuilder {
    /// Create a builder holding only the byte tokens.
    pub fn new() -> Self {
        Self {
            values: (0..BYTE_TOKEN_COUNT)
                .map(|b| Box::new([b as u8]) as Box<[u8]>)
                .collect(),
            rules: Vec::new(),
        }
    }

    /// Create a builder which continues from a vocabulary's rules.
    pub fn from_vocabulary(vocab: &Vocabulary) -> Self {
        Self {
            values: vocab
                .tokens()
                .iter()
                .map(|token| token.value().into())
                .collect(),
            rules: vocab.merge_rules().iter().map(|rule| rule.pair()).collect(),
        }
    }

    /// The number of tokens, byte tokens included.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// The rules, in priority order.
    pub fn rules(&self) -> &[Pair<TokenId>] {
        &self.rules
    }

    /// The byte value of token `id`, if minted.
    pub fn value(
        &self,
        id: TokenId,
    ) -> Option<&[u8]> {
        self.values.get(id as usize).map(|v| v.as_ref())
    }

    /// Append the rule ``(left, right)``.
    ///
    /// ## Returns
    /// The merged token id; or [`MergescopeError::MalformedVocabulary`]
    /// if either half is not minted.
    pub fn add_rule(
        &mut self,
        left: TokenId,
        right: TokenId,
    ) -> MSResult<TokenId> {
        let (Some(l), Some(r)) = (self.value(left), self.value(right)) else {
            return Err(MergescopeError::MalformedVocabulary(format!(
                "rule ({left}, {right}) references an unknown token"
            )));
        };
        let value: Box<[u8]> = [l, r].concat().into();

        let id = TokenId::try_from(self.values.len()).map_err(|_| {
            MergescopeError::MalformedVocabulary("vocab size exceeds token id capacity".to_string())
        })?;
        self.values.push(value);
        self.rules.push((left, right));
        Ok(id)
    }

    /// Remove the merged token `id`, and the rule which minted it.
    ///
    /// Every later token id shifts down by one; rules are renumbered to match.
    ///
    /// ## Returns
    /// [`MergescopeError::MalformedVocabulary`] if `id` is a byte token,
    /// is not minted, or is a half of some rule.
    pub fn remove_token(
        &mut self,
        id: TokenId,
    ) -> MSResult<()> {
        let idx = id as usize;
        if idx < BYTE_TOKEN_COUNT || idx >= self.values.len() {
            return Err(MergescopeError::MalformedVocabulary(format!(
                "token {id} is not a removable merged token"
            )));
        }
        if let Some(k) = self
            .rules
            .iter()
            .position(|&(left, right)| left == id || right == id)
        {
            return Err(MergescopeError::MalformedVocabulary(format!(
                "token {id} is used by merge rule {k}"
            )));
        }

        self.values.remove(idx);
        self.rules.remove(idx - BYTE_TOKEN_COUNT);

        let shift = |t: TokenId| if t > id { t - 1 } else { t };
        for rule in &mut self.rules {
            *rule = (shift(rule.0), shift(rule.1));
        }
        Ok(())
    }

    /// Build an immutable [`Vocabulary`] from the current rules.
    pub fn to_vocabulary(&self) -> MSResult<Vocabulary> {
        Vocabulary::from_merge_rules(&self.rules)
    }

    /// Write the rules in rule file form.
    pub fn write_rules<W: Write>(
        &self,
        writer: &mut W,
    ) -> MSResult<()> {
        write_rule_pairs(&self.rules, writer)
    }

    /// Rewrite the rule file at `path` to hold exactly the current rules.
    pub fn sync_rule_file<P: AsRef<Path>>(
        &self,
        path: P,
    ) -> MSResult<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        self.write_rules(&mut writer)?;
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vocab::{io::load_rule_file_path, utility::testing::build_test_vocab};

    #[test]
    fn test_add_rule() {
        let mut builder = RuleBuilder::new();
        assert_eq!(builder.len(), 256);

        assert_eq!(builder.add_rule(97, 98).unwrap(), 256);
        assert_eq!(builder.add_rule(256, 99).unwrap(), 257);
        assert_eq!(builder.value(257), Some(&b"abc"[..]));
        assert_eq!(builder.rules(), &[(97, 98), (256, 99)]);

        assert!(matches!(
            builder.add_rule(97, 400),
            Err(MergescopeError::MalformedVocabulary(_))
        ));
        assert_eq!(builder.len(), 258);
    }

    #[test]
    fn test_from_vocabulary() {
        let vocab = build_test_vocab();
        let builder = RuleBuilder::from_vocabulary(&vocab);
        assert_eq!(builder.len(), vocab.len());
        assert_eq!(builder.rules(), &[(97, 98), (256, 99), (98, 99)]);
        assert_eq!(builder.value(258), Some(&b"bc"[..]));

        let rebuilt = builder.to_vocabulary().unwrap();
        assert_eq!(rebuilt.merge_rules(), vocab.merge_rules());
    }

    #[test]
    fn test_remove_token_renumbers() {
        let mut builder = RuleBuilder::new();
        builder.add_rule(120, 120).unwrap(); // 256 "xx"
        builder.add_rule(97, 98).unwrap(); // 257 "ab"
        builder.add_rule(257, 99).unwrap(); // 258 "abc"

        builder.remove_token(256).unwrap();
        assert_eq!(builder.rules(), &[(97, 98), (256, 99)]);
        assert_eq!(builder.value(257), Some(&b"abc"[..]));
        assert_eq!(builder.len(), 258);

        let vocab = builder.to_vocabulary().unwrap();
        assert_eq!(vocab.get(257).unwrap().value(), b"abc");
    }

    #[test]
    fn test_remove_token_errors() {
        let mut builder = RuleBuilder::new();
        builder.add_rule(97, 98).unwrap();
        builder.add_rule(256, 99).unwrap();

        for id in [97, 256, 300] {
            assert!(
                matches!(
                    builder.remove_token(id),
                    Err(MergescopeError::MalformedVocabulary(_))
                ),
                "{id}"
            );
        }
        assert_eq!(builder.len(), 258);
    }

    #[test]
    fn test_sync_rule_file() {
        let tmp_dir = tempdir::TempDir::new("rule_builder").unwrap();
        let path = tmp_dir.path().join("train.rules");

        let mut builder = RuleBuilder::new();
        builder.add_rule(97, 98).unwrap();
        builder.add_rule(120, 121).unwrap();
        builder.sync_rule_file(&path).unwrap();
        assert_eq!(load_rule_file_path(&path).unwrap().len(), 258);

        builder.remove_token(256).unwrap();
        builder.sync_rule_file(&path).unwrap();

        let loaded = load_rule_file_path(&path).unwrap();
        assert_eq!(loaded.len(), 257);
        assert_eq!(loaded.get(256).unwrap().value(), b"xy");
    }
}
