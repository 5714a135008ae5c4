//! Validation of reviewer and author notes attached to lifecycle actions.
//!
//! The dashboards validate these lengths too, but the server re-checks
//! every value before a transition is applied.

use crate::error::CoreError;

/// Minimum length (in characters, after trimming) of a rejection reason.
pub const MIN_REJECTION_REASON_LENGTH: usize = 10;

/// Maximum length (in characters, after trimming) of a rejection reason.
pub const MAX_REJECTION_REASON_LENGTH: usize = 500;

/// Maximum length of the optional note attached to a submission.
pub const MAX_SUBMISSION_MESSAGE_LENGTH: usize = 2000;

/// Validate a rejection reason and return it trimmed.
pub fn validate_rejection_reason(reason: &str) -> Result<String, CoreError> {
    let trimmed = reason.trim();
    let len = trimmed.chars().count();
    if len < MIN_REJECTION_REASON_LENGTH {
        return Err(CoreError::Validation(format!(
            "Rejection reason must be at least {MIN_REJECTION_REASON_LENGTH} characters, got {len}"
        )));
    }
    if len > MAX_REJECTION_REASON_LENGTH {
        return Err(CoreError::Validation(format!(
            "Rejection reason must not exceed {MAX_REJECTION_REASON_LENGTH} characters, got {len}"
        )));
    }
    Ok(trimmed.to_string())
}

/// Normalise an optional submission note: blank notes become `None`.
pub fn normalize_submission_message(message: Option<&str>) -> Result<Option<String>, CoreError> {
    let Some(trimmed) = message.map(str::trim).filter(|m| !m.is_empty()) else {
        return Ok(None);
    };
    let len = trimmed.chars().count();
    if len > MAX_SUBMISSION_MESSAGE_LENGTH {
        return Err(CoreError::Validation(format!(
            "Submission message must not exceed {MAX_SUBMISSION_MESSAGE_LENGTH} characters, got {len}"
        )));
    }
    Ok(Some(trimmed.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eleven_char_reason_accepted() {
        assert_eq!(
            validate_rejection_reason("needs more detail").unwrap(),
            "needs more detail"
        );
        assert_eq!(validate_rejection_reason("0123456789").unwrap().len(), 10);
    }

    #[test]
    fn short_reason_rejected() {
        let err = validate_rejection_reason("too short").unwrap_err();
        assert!(err.to_string().contains("at least 10"));
    }

    #[test]
    fn whitespace_padding_does_not_count() {
        assert!(validate_rejection_reason("   short    ").is_err());
        assert!(validate_rejection_reason("").is_err());
    }

    #[test]
    fn reason_upper_bound() {
        assert!(validate_rejection_reason(&"x".repeat(MAX_REJECTION_REASON_LENGTH)).is_ok());
        assert!(validate_rejection_reason(&"x".repeat(MAX_REJECTION_REASON_LENGTH + 1)).is_err());
    }

    #[test]
    fn reason_length_counts_characters_not_bytes() {
        // 10 characters, 20 bytes.
        assert!(validate_rejection_reason("éééééééééé").is_ok());
    }

    #[test]
    fn blank_submission_message_is_dropped() {
        assert_eq!(normalize_submission_message(None).unwrap(), None);
        assert_eq!(normalize_submission_message(Some("   ")).unwrap(), None);
        assert_eq!(
            normalize_submission_message(Some(" ready for review ")).unwrap(),
            Some("ready for review".to_string())
        );
    }

    #[test]
    fn oversized_submission_message_rejected() {
        let long = "m".repeat(MAX_SUBMISSION_MESSAGE_LENGTH + 1);
        assert!(normalize_submission_message(Some(&long)).is_err());
    }
}
