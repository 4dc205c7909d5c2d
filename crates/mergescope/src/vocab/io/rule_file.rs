//! # Merge Rule Text Files
//!
//! Lines are:
//! ```terminaloutput
//! {LEFT} {RIGHT} {RESULT}
//! ```
//! where the k-th rule's `RESULT` must be ``256 + k``. Blank lines are skipped.

use std::{
    fs::File,
    io::{BufRead, BufReader, BufWriter, Write},
    path::Path,
};

use crate::{
    errors::{MSResult, MergescopeError},
    types::{BYTE_TOKEN_COUNT, Pair, TokenId},
    vocab::Vocabulary,
};

fn parse_id(
    line_no: usize,
    field: &str,
) -> MSResult<TokenId> {
    field.parse().map_err(|e: core::num::ParseIntError| {
        MergescopeError::MalformedVocabulary(format!("line {line_no}: {field:?}: {e}"))
    })
}

/// Read ``(left, right)`` merge rules from a rule file reader.
///
/// ## Arguments
/// * `reader` - the line reader.
pub fn read_rule_pairs<R: BufRead>(reader: R) -> MSResult<Vec<Pair<TokenId>>> {
    let mut rules = Vec::new();

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let line_no = idx + 1;
        if line.trim().is_empty() {
            continue;
        }

        let fields: Vec<&str> = line.split_whitespace().collect();
        let [left, right, result] = fields.as_slice() else {
            return Err(MergescopeError::MalformedVocabulary(format!(
                "line {line_no}: expected 3 fields, found {}",
                fields.len()
            )));
        };

        let (left, right, result) = (
            parse_id(line_no, left)?,
            parse_id(line_no, right)?,
            parse_id(line_no, result)?,
        );

        let expected = BYTE_TOKEN_COUNT + rules.len();
        if result as usize != expected {
            return Err(MergescopeError::MalformedVocabulary(format!(
                "line {line_no}: expected id {expected}, found {result}"
            )));
        }

        rules.push((left, right));
    }

    Ok(rules)
}

/// Read a [`Vocabulary`] from a rule file reader.
pub fn read_rule_file<R: BufRead>(reader: R) -> MSResult<Vocabulary> {
    Vocabulary::from_merge_rules(&read_rule_pairs(reader)?)
}

/// Load a [`Vocabulary`] from a rule file.
///
/// ## Arguments
/// * `path` - the path to the rule file.
pub fn load_rule_file_path<P: AsRef<Path>>(path: P) -> MSResult<Vocabulary> {
    let reader = BufReader::new(File::open(path)?);
    read_rule_file(reader)
}

/// Write ordered ``(left, right)`` merge rules to a [`Write`] writer.
///
/// The k-th rule is written with result id ``256 + k``.
pub fn write_rule_pairs<W: Write>(
    rules: &[Pair<TokenId>],
    writer: &mut W,
) -> MSResult<()> {
    for (k, (left, right)) in rules.iter().enumerate() {
        writeln!(writer, "{left} {right} {}", BYTE_TOKEN_COUNT + k)?;
    }
    Ok(())
}

/// Write a [`Vocabulary`]'s merge rules to a [`Write`] writer.
pub fn write_rule_file<W: Write>(
    vocab: &Vocabulary,
    writer: &mut W,
) -> MSResult<()> {
    for rule in vocab.merge_rules() {
        writeln!(writer, "{} {} {}", rule.left, rule.right, rule.result)?;
    }
    Ok(())
}

/// Save a [`Vocabulary`]'s merge rules to a rule file.
pub fn save_rule_file_path<P: AsRef<Path>>(
    vocab: &Vocabulary,
    path: P,
) -> MSResult<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    write_rule_file(vocab, &mut writer)?;
    writer.flush()?;
    Ok(())
}
