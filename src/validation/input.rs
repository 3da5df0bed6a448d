//! User input validation

use crate::error::{Result, WardenError};
use tracing::warn;

/// Validate and trim a user question before any generation work happens.
pub fn validate_user_question(input: &str, max_len: usize) -> Result<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        warn!("question is empty after trimming");
        return Err(WardenError::Input("question cannot be empty".to_string()));
    }
    if trimmed.len() > max_len {
        warn!("question exceeds max length: {} > {}", trimmed.len(), max_len);
        return Err(WardenError::Input(format!(
            "question is too long (max {} characters)",
            max_len
        )));
    }
    if trimmed.contains('\0') {
        return Err(WardenError::Input(
            "question contains invalid characters".to_string(),
        ));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_and_accepts_a_normal_question() {
        let q = validate_user_question("  how many orders?  ", 1000).unwrap();
        assert_eq!(q, "how many orders?");
    }

    #[test]
    fn rejects_empty_overlong_and_nul_input() {
        assert!(validate_user_question("   ", 1000).is_err());
        assert!(validate_user_question(&"x".repeat(1001), 1000).is_err());
        assert!(validate_user_question("bad\0input", 1000).is_err());
    }
}
