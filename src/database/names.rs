//! Collection name rules
//!
//! A name becomes a file name under the database root, so it is restricted
//! to 1-64 ASCII letters, digits, `_` and `-`.

use crate::error::{HoardError, HoardResult};

/// File extension of collection files
pub const COLLECTION_EXTENSION: &str = "hoard";

/// Longest accepted collection name
pub const MAX_NAME_LEN: usize = 64;

/// Checks that `name` can be used as a collection file name.
pub fn validate_collection_name(name: &str) -> HoardResult<()> {
    if name.is_empty() {
        return Err(HoardError::invalid_name(name, "name is empty"));
    }

    if name.len() > MAX_NAME_LEN {
        return Err(HoardError::invalid_name(
            name,
            format!("longer than {} characters", MAX_NAME_LEN),
        ));
    }

    if let Some(c) = name
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || *c == '_' || *c == '-'))
    {
        return Err(HoardError::invalid_name(
            name,
            format!("character {:?} is not allowed", c),
        ));
    }

    Ok(())
}

/// File name for a validated collection name
pub fn collection_file_name(name: &str) -> String {
    format!("{}.{}", name, COLLECTION_EXTENSION)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HoardErrorCode;

    #[test]
    fn test_accepts_plain_names() {
        for name in ["test", "users_2024", "a-b", "X", "n".repeat(64).as_str()] {
            assert!(validate_collection_name(name).is_ok(), "{}", name);
        }
    }

    #[test]
    fn test_rejects_unsafe_names() {
        for name in ["", "../etc", "a/b", "a.b", "sp ace", "ünï", "n".repeat(65).as_str()] {
            let err = validate_collection_name(name).unwrap_err();
            assert_eq!(err.code(), HoardErrorCode::InvalidName, "{}", name);
        }
    }

    #[test]
    fn test_file_name() {
        assert_eq!(collection_file_name("users"), "users.hoard");
    }
}
