use nanoid::nanoid;

use crate::errors::ValidationError;

/// Canonical alphabet for entity identifiers (no ambiguous glyphs).
const ENTITY_ID_ALPHABET: &[char] = &[
    'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'J', 'K', 'L', 'M', 'N', 'P', 'Q', 'R', 'S', 'T', 'U', 'V', 'W', 'X', 'Y',
    'Z', 'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'j', 'm', 'n', 'p', 'q', 'r', 's', 't', 'u', 'v', 'w', 'x', 'y', 'z',
];
/// Default entity id length.
const ENTITY_ID_LENGTH: usize = 20;

/// Generates a new entity identifier using the configured alphabet and length.
pub fn generate_entity_id() -> String {
    nanoid!(ENTITY_ID_LENGTH, ENTITY_ID_ALPHABET)
}

/// Returns `true` when `value` has the shape of an id produced by [`generate_entity_id`].
pub fn is_valid_entity_id(value: &str) -> bool {
    value.chars().count() == ENTITY_ID_LENGTH && value.chars().all(|c| ENTITY_ID_ALPHABET.contains(&c))
}

/// Rejects malformed ids before they reach the store.
pub fn ensure_entity_id(field: &str, value: &str) -> Result<(), ValidationError> {
    if is_valid_entity_id(value) {
        Ok(())
    } else {
        Err(ValidationError::single(field, "validation.id", format!("Invalid id '{value}'")))
    }
}
