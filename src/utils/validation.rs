// Validation utilities for form and JSON fields

use chrono::{DateTime, NaiveDate, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use uuid::Uuid;

use super::service_error::ServiceError;

lazy_static! {
    static ref FILE_EXTENSION: Regex = Regex::new(r"^[A-Za-z0-9]{1,8}$").unwrap();
}

pub const PASSWORD_MIN_LEN: usize = 6;
pub const PASSWORD_MAX_LEN: usize = 72;

/// Trim and validate string fields
///
/// # Returns
/// * `Ok(String)` - The trimmed string if valid
/// * `Err(String)` - Error message if validation fails
pub fn trim_and_validate_field(field: &str, required: bool) -> Result<String, String> {
    let trimmed = field.trim().to_string();
    if trimmed.is_empty() && required {
        Err("Field cannot be empty".to_string())
    } else {
        Ok(trimmed)
    }
}

/// Trim an optional field, mapping blank input to `None`
pub fn trim_optional_field(field: Option<&String>) -> Option<String> {
    field.and_then(|s| {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

/// Names of the required fields that are absent or blank, in declaration order
pub fn missing_fields(fields: &[(&str, Option<&str>)]) -> Vec<String> {
    fields
        .iter()
        .filter(|(_, value)| value.map_or(true, |v| v.trim().is_empty()))
        .map(|(name, _)| name.to_string())
        .collect()
}

/// Fail with `MissingFields` when any required field is blank
pub fn require_fields(fields: &[(&str, Option<&str>)]) -> Result<(), ServiceError> {
    let missing = missing_fields(fields);
    if missing.is_empty() {
        Ok(())
    } else {
        Err(ServiceError::MissingFields(missing))
    }
}

/// Unwrap an id taken from a request body, failing with `message` on `field` when absent
pub fn require_id(id: Option<Uuid>, message: &str, field: &str) -> Result<Uuid, ServiceError> {
    id.ok_or_else(|| ServiceError::validation(message, &[field]))
}

/// Email addresses are only loosely checked; delivery is the real verification
pub fn is_plausible_email(email: &str) -> bool {
    let email = email.trim();
    !email.is_empty() && email.contains('@')
}

/// Accepts `YYYY-MM-DD` (midnight UTC) or an RFC 3339 timestamp
pub fn parse_start_date(input: &str) -> Result<DateTime<Utc>, ServiceError> {
    let input = input.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(input) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .ok_or_else(|| ServiceError::validation("Invalid start date", &["start_date"]))
}

/// Calendar date such as a birth date; the date part of a timestamp is accepted
pub fn parse_calendar_date(input: &str, field: &str) -> Result<NaiveDate, ServiceError> {
    let input = input.trim();
    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(input)
                .ok()
                .map(|ts| ts.date_naive())
        })
        .ok_or_else(|| ServiceError::Validation {
            message: format!("Invalid date for {}", field),
            fields: vec![field.to_string()],
        })
}

/// Extension taken from an uploaded file name, `bin` when absent or unusual
pub fn file_extension(file_name: &str) -> String {
    file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext)
        .filter(|ext| FILE_EXTENSION.is_match(ext))
        .map(|ext| ext.to_lowercase())
        .unwrap_or_else(|| "bin".to_string())
}

/// Password change rules. The last failing rule provides the message and every
/// failing rule contributes its fields.
pub fn validate_password_change(
    new_password1: &str,
    new_password2: &str,
    current_password: &str,
    is_recovery_session: bool,
) -> Result<(), ServiceError> {
    let mut message = None;
    let mut fields: Vec<&str> = Vec::new();

    if new_password1.is_empty() {
        message = Some("You must type a new password");
        fields.push("newPassword1");
    }
    if new_password2.is_empty() {
        message = Some("You must type the new password twice");
        fields.push("newPassword2");
    }
    let length = new_password1.chars().count();
    if length < PASSWORD_MIN_LEN {
        message = Some("The new password must be at least 6 characters long");
        fields.push("newPassword1");
    }
    if length > PASSWORD_MAX_LEN {
        message = Some("The new password can be at most 72 characters long");
        fields.push("newPassword1");
    }
    if new_password1 != new_password2 {
        message = Some("The passwords don't match");
        fields.push("newPassword1");
        fields.push("newPassword2");
    }
    if current_password.is_empty() && !is_recovery_session {
        message = Some(
            "You must include your current password. If you forgot it, sign out then use 'forgot password' on the sign in page.",
        );
        fields.push("currentPassword");
    }

    match message {
        None => Ok(()),
        Some(message) => {
            let mut unique: Vec<String> = Vec::new();
            for field in fields {
                if !unique.iter().any(|f| f == field) {
                    unique.push(field.to_string());
                }
            }
            Err(ServiceError::Validation {
                message: message.to_string(),
                fields: unique,
            })
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_trim_and_validate() {
        assert_eq!(trim_and_validate_field("  Rex ", true), Ok("Rex".to_string()));
        assert!(trim_and_validate_field("   ", true).is_err());
        assert_eq!(trim_and_validate_field("   ", false), Ok(String::new()));
        assert_eq!(trim_optional_field(Some(&"  ".to_string())), None);
    }

    #[test]
    fn test_missing_fields_in_order() {
        let missing = missing_fields(&[
            ("name", Some("Rex")),
            ("date_of_birth", None),
            ("gender", Some("  ")),
            ("breed", Some("Collie")),
        ]);
        assert_eq!(missing, vec!["date_of_birth", "gender"]);
    }

    #[test]
    fn test_require_fields_error() {
        let err = require_fields(&[("full_name", None)]).unwrap_err();
        assert_eq!(err, ServiceError::MissingFields(vec!["full_name".into()]));
    }

    #[test]
    fn test_require_id() {
        let id = Uuid::new_v4();
        assert_eq!(require_id(Some(id), "Contact ID is required", "contactId"), Ok(id));
        assert_eq!(
            require_id(None, "Contact ID is required", "contactId"),
            Err(ServiceError::validation("Contact ID is required", &["contactId"]))
        );
    }

    #[test]
    fn test_plausible_email() {
        assert!(is_plausible_email("owner@example.com"));
        assert!(!is_plausible_email("owner.example.com"));
        assert!(!is_plausible_email(""));
    }

    #[test]
    fn test_parse_start_date_forms() {
        let day = parse_start_date("2024-01-01").unwrap();
        assert_eq!((day.year(), day.month(), day.day(), day.hour()), (2024, 1, 1, 0));

        let ts = parse_start_date("2024-03-10T15:30:00+02:00").unwrap();
        assert_eq!(ts.hour(), 13);

        assert!(parse_start_date("next tuesday").is_err());
    }

    #[test]
    fn test_file_extension() {
        assert_eq!(file_extension("rex.JPG"), "jpg");
        assert_eq!(file_extension("archive.tar.gz"), "gz");
        assert_eq!(file_extension("no_extension"), "bin");
        assert_eq!(file_extension("weird.<script>"), "bin");
    }

    #[test]
    fn test_password_rules() {
        assert!(validate_password_change("hunter22", "hunter22", "old-secret", false).is_ok());

        let err = validate_password_change("short", "short", "old", false).unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Validation { ref fields, .. } if fields == &vec!["newPassword1".to_string()]
        ));

        let err = validate_password_change("hunter22", "hunter23", "old", false).unwrap_err();
        assert_eq!(
            err,
            ServiceError::Validation {
                message: "The passwords don't match".into(),
                fields: vec!["newPassword1".into(), "newPassword2".into()],
            }
        );
    }

    #[test]
    fn test_recovery_session_skips_current_password() {
        assert!(validate_password_change("hunter22", "hunter22", "", true).is_ok());

        let err = validate_password_change("hunter22", "hunter22", "", false).unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Validation { ref fields, .. } if fields == &vec!["currentPassword".to_string()]
        ));
    }

    #[test]
    fn test_overlong_password() {
        let long = "x".repeat(PASSWORD_MAX_LEN + 1);
        let err = validate_password_change(&long, &long, "old", false).unwrap_err();
        assert_eq!(
            err.to_string(),
            "The new password can be at most 72 characters long"
        );
    }
}
