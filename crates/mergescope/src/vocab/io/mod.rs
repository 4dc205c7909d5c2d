//! # Vocabulary IO
//!
//! * [`packed_vocab`] - big-endian ``u16`` ``(left, right)`` pairs; raw or base64.
//! * [`rule_file`] - ``{LEFT} {RIGHT} {RESULT}`` text lines.

pub mod packed_vocab;
pub mod rule_file;

#[doc(inline)]
pub use packed_vocab::{decode_packed_rules, encode_packed_rules};
#[doc(inline)]
pub use rule_file::{
    load_rule_file_path,
    read_rule_file,
    read_rule_pairs,
    save_rule_file_path,
    write_rule_file,
    write_rule_pairs,
};
