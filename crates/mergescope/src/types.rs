//! # Common Types

/// Dense token id.
///
/// Ids ``0..=255`` are the byte tokens; ids ``>= 256`` are merged tokens,
/// in the order they were minted.
pub type TokenId = u32;

/// The number of byte tokens at the start of every vocabulary.
pub const BYTE_TOKEN_COUNT: usize = 256;

/// A pair of tokens.
pub type Pair<T> = (T, T);

cfg_if::cfg_if! {
    if #[cfg(feature = "ahash")] {
        /// Type Alias for hash maps in this crate.
        pub type MSHashMap<K, V> = ahash::AHashMap<K, V>;

        /// Create a new hash map with the given capacity.
        pub fn hash_map_with_capacity<K, V>(capacity: usize) -> MSHashMap<K, V> {
            MSHashMap::with_capacity(capacity)
        }

        /// Type Alias for hash sets in this crate.
        pub type MSHashSet<V> = ahash::AHashSet<V>;

    } else {
        /// Type Alias for hash maps in this crate.
        pub type MSHashMap<K, V> = std::collections::HashMap<K, V>;

        /// Create a new hash map with the given capacity.
        pub fn hash_map_with_capacity<K, V>(capacity: usize) -> MSHashMap<K, V> {
            MSHashMap::with_capacity(capacity)
        }

        /// Type Alias for hash sets in this crate.
        pub type MSHashSet<V> = std::collections::HashSet<V>;
    }
}

/// Compile-time check that a value is [`Send`].
pub fn check_is_send<S: Send>(_: &S) {}

/// Compile-time check that a value is [`Sync`].
pub fn check_is_sync<S: Sync>(_: &S) {}
