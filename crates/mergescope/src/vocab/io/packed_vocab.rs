//! # Packed Vocabulary Encoding
//!
//! A flat buffer of big-endian ``u16`` words, consumed two at a time as
//! ``(left, right)`` merge rules; rule `k` yields id ``256 + k``.
//!
//! Decoding policy:
//! * an odd total byte count is a [`MergescopeError::MalformedVocabulary`];
//! * a trailing unpaired word is dropped.

use base64::{Engine, prelude::BASE64_STANDARD};

use crate::{
    errors::{MSResult, MergescopeError},
    types::{Pair, TokenId},
    vocab::Vocabulary,
};

/// Decode packed merge rules.
///
/// ## Arguments
/// * `bytes` - the packed buffer.
///
/// ## Returns
/// The ``(left, right)`` rules, in order.
pub fn decode_packed_rules(bytes: &[u8]) -> MSResult<Vec<Pair<TokenId>>> {
    if bytes.len() % 2 != 0 {
        return Err(MergescopeError::MalformedVocabulary(format!(
            "packed length ({}) is not a whole number of u16 words",
            bytes.len()
        )));
    }

    let words: Vec<TokenId> = bytes
        .chunks_exact(2)
        .map(|w| u16::from_be_bytes([w[0], w[1]]) as TokenId)
        .collect();

    if words.len() % 2 != 0 {
        log::debug!("Dropping trailing unpaired word in packed vocabulary");
    }

    Ok(words.chunks_exact(2).map(|p| (p[0], p[1])).collect())
}

/// Encode merge rules in the packed format.
///
/// ## Returns
/// The packed buffer; or [`MergescopeError::MalformedVocabulary`]
/// if an id does not fit in a ``u16``.
pub fn encode_packed_rules<'a, I>(rules: I) -> MSResult<Vec<u8>>
where
    I: IntoIterator<Item = &'a Pair<TokenId>>,
{
    let mut buf = Vec::new();
    for &(left, right) in rules {
        for id in [left, right] {
            let word = u16::try_from(id).map_err(|_| {
                MergescopeError::MalformedVocabulary(format!("token id {id} exceeds u16"))
            })?;
            buf.extend_from_slice(&word.to_be_bytes());
        }
    }
    Ok(buf)
}

impl Vocabulary {
    /// Build a vocabulary from the packed encoding.
    pub fn from_packed_encoding(bytes: &[u8]) -> MSResult<Self> {
        Self::from_merge_rules(&decode_packed_rules(bytes)?)
    }

    /// Build a vocabulary from base64 (standard alphabet) packed encoding.
    pub fn from_base64(encoded: &str) -> MSResult<Self> {
        let bytes = BASE64_STANDARD
            .decode(encoded.trim())
            .map_err(|e| MergescopeError::MalformedVocabulary(e.to_string()))?;
        Self::from_packed_encoding(&bytes)
    }

    /// Encode the merge rules in the packed format.
    pub fn to_packed_encoding(&self) -> MSResult<Vec<u8>> {
        let pairs: Vec<Pair<TokenId>> = self.merge_rules().iter().map(|r| r.pair()).collect();
        encode_packed_rules(&pairs)
    }

    /// Encode the merge rules in the base64 packed format.
    pub fn to_base64(&self) -> MSResult<String> {
        Ok(BASE64_STANDARD.encode(self.to_packed_encoding()?))
    }
}
