//! Short code generation and alias validation.

use std::iter;

/// 62-character alphanumeric code alphabet.
const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Maximum accepted alias length. Aliases are case-sensitive.
const MAX_ALIAS_LENGTH: usize = 64;

/// Codes that collide with the service's own routes.
const RESERVED_ALIASES: &[&str] = &["api", "health", "admin", "metrics", "static"];

pub fn generate_random_code(length: usize) -> String {
    iter::repeat_with(|| CODE_ALPHABET[rand::random_range(0..CODE_ALPHABET.len())] as char)
        .take(length)
        .collect()
}

/// Source of fresh short codes. Injectable so tests can force collisions.
pub trait CodeGenerator: Send + Sync {
    fn generate(&self) -> String;
}

/// Default generator: uniformly random over the 62^length code space.
pub struct RandomCodeGenerator {
    length: usize,
}

impl RandomCodeGenerator {
    pub fn new(length: usize) -> Self {
        Self { length }
    }
}

impl CodeGenerator for RandomCodeGenerator {
    fn generate(&self) -> String {
        generate_random_code(self.length)
    }
}

#[derive(Debug)]
pub enum AliasValidationError {
    Empty,
    TooLong(usize),
    InvalidCharacters(String),
    Reserved(String),
}

impl std::fmt::Display for AliasValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "Alias cannot be empty"),
            Self::TooLong(len) => write!(
                f,
                "Alias is {} characters long, maximum is {}",
                len, MAX_ALIAS_LENGTH
            ),
            Self::InvalidCharacters(chars) => write!(
                f,
                "Alias contains invalid characters: '{}'. Only alphanumeric, underscore and hyphen allowed",
                chars
            ),
            Self::Reserved(alias) => write!(f, "Alias '{}' is reserved", alias),
        }
    }
}

impl std::error::Error for AliasValidationError {}

/// Validate a user-supplied alias against the alphabet/length/reserved-word
/// policy. Pure function of its input; the uniqueness check lives in the
/// persistence gateway.
pub fn validate_alias(alias: &str) -> Result<(), AliasValidationError> {
    if alias.is_empty() {
        return Err(AliasValidationError::Empty);
    }

    if alias.len() > MAX_ALIAS_LENGTH {
        return Err(AliasValidationError::TooLong(alias.len()));
    }

    let invalid: String = alias
        .chars()
        .filter(|c| !c.is_ascii_alphanumeric() && *c != '_' && *c != '-')
        .collect();
    if !invalid.is_empty() {
        return Err(AliasValidationError::InvalidCharacters(invalid));
    }

    if RESERVED_ALIASES.contains(&alias) {
        return Err(AliasValidationError::Reserved(alias.to_string()));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_code_length() {
        for length in [1, 6, 10, 32] {
            assert_eq!(generate_random_code(length).len(), length);
        }
    }

    #[test]
    fn test_generated_code_alphabet() {
        let code = generate_random_code(256);
        assert!(code.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_generator_trait() {
        let generator = RandomCodeGenerator::new(10);
        let a = generator.generate();
        let b = generator.generate();
        assert_eq!(a.len(), 10);
        assert_eq!(b.len(), 10);
        // 62^10 code space; a same-pair draw means a broken RNG
        assert_ne!(a, b);
    }

    #[test]
    fn test_valid_aliases() {
        assert!(validate_alias("myalias").is_ok());
        assert!(validate_alias("my-alias_2024").is_ok());
        assert!(validate_alias("X").is_ok());
        assert!(validate_alias(&"a".repeat(64)).is_ok());
    }

    #[test]
    fn test_empty_alias() {
        assert!(matches!(validate_alias(""), Err(AliasValidationError::Empty)));
    }

    #[test]
    fn test_alias_too_long() {
        assert!(matches!(
            validate_alias(&"a".repeat(65)),
            Err(AliasValidationError::TooLong(65))
        ));
    }

    #[test]
    fn test_alias_invalid_characters() {
        assert!(matches!(
            validate_alias("my alias"),
            Err(AliasValidationError::InvalidCharacters(chars)) if chars == " "
        ));
        assert!(matches!(
            validate_alias("foo/bar"),
            Err(AliasValidationError::InvalidCharacters(_))
        ));
        assert!(matches!(
            validate_alias("héllo"),
            Err(AliasValidationError::InvalidCharacters(_))
        ));
    }

    #[test]
    fn test_reserved_aliases() {
        assert!(matches!(
            validate_alias("api"),
            Err(AliasValidationError::Reserved(_))
        ));
        assert!(matches!(
            validate_alias("health"),
            Err(AliasValidationError::Reserved(_))
        ));
        // reserved-word matching is case-sensitive, like codes themselves
        assert!(validate_alias("API").is_ok());
    }
}
