//! Payload validation.
//!
//! Browser forms post loosely typed JSON: consent may arrive as `true` or
//! `"on"`, phone numbers as numbers. A field counts as missing when it is
//! absent, `null`, `false`, zero or a blank string.

use email_address::{EmailAddress, Options};
use serde_json::{Map, Value};
use thiserror::Error;

use super::types::{ContactFields, QuoteFields, SubmissionFields, SubmissionKind};

const CONSENT_FIELD: &str = "gdprConsent";

/// Why a payload was rejected. Rejected payloads are never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<String>),

    #[error("invalid email address: {0}")]
    InvalidEmail(String),
}

/// Validate a raw payload for `kind` and extract its typed fields.
///
/// Required fields are checked first (all missing ones are reported, in
/// canonical order), then the email address format.
pub fn validate(kind: SubmissionKind, payload: &Value) -> Result<SubmissionFields, ValidationError> {
    let empty = Map::new();
    let map = payload.as_object().unwrap_or(&empty);

    let missing: Vec<String> = kind
        .required_fields()
        .iter()
        .filter(|field| !is_present(map, field))
        .map(|field| field.to_string())
        .collect();

    if !missing.is_empty() {
        return Err(ValidationError::MissingFields(missing));
    }

    let email = required_text(map, "email");
    if !is_plain_address(&email) {
        return Err(ValidationError::InvalidEmail(email));
    }

    let fields = match kind {
        SubmissionKind::Quote => SubmissionFields::Quote(QuoteFields {
            first_name: required_text(map, "firstName"),
            last_name: required_text(map, "lastName"),
            email,
            phone: optional(map, "phone"),
            company: required_text(map, "company"),
            industry: required_text(map, "industry"),
            project_type: required_text(map, "projectType"),
            description: required_text(map, "description"),
            gdpr_consent: true,
        }),
        SubmissionKind::Contact => SubmissionFields::Contact(ContactFields {
            name: required_text(map, "name"),
            email,
            company: optional(map, "company"),
            subject: required_text(map, "subject"),
            message: required_text(map, "message"),
            gdpr_consent: true,
        }),
    };

    Ok(fields)
}

fn is_present(map: &Map<String, Value>, field: &str) -> bool {
    if field == CONSENT_FIELD {
        return map.get(field).map(is_truthy).unwrap_or(false);
    }
    text(map, field).is_some()
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.trim().is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// A bare `local@domain` address. Display-name forms such as
/// `Alice <alice@example.com>` are rejected: the value is used verbatim as a
/// recipient.
fn is_plain_address(email: &str) -> bool {
    EmailAddress::parse_with_options(email, Options::default().without_display_text()).is_ok()
}

/// Text value of a field, trimmed. Non-zero numbers are accepted and
/// stringified.
fn text(map: &Map<String, Value>, field: &str) -> Option<String> {
    match map.get(field)? {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) if n.as_f64() != Some(0.0) => Some(n.to_string()),
        _ => None,
    }
}

/// Optional field as given by the form. Blank values are kept; templates
/// decide how to show them.
fn optional(map: &Map<String, Value>, field: &str) -> Option<String> {
    match map.get(field)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Text of a field already known to be present.
fn required_text(map: &Map<String, Value>, field: &str) -> String {
    text(map, field).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn quote_payload() -> Value {
        json!({
            "firstName": "Omar",
            "lastName": "Benali",
            "email": "omar@example.com",
            "phone": "+212 600 000 000",
            "company": "Atlas Textiles",
            "industry": "textile",
            "projectType": "monitoring",
            "description": "Track OEE on line 3",
            "gdprConsent": true
        })
    }

    #[test]
    fn test_valid_quote() {
        let fields = validate(SubmissionKind::Quote, &quote_payload()).unwrap();

        match fields {
            SubmissionFields::Quote(q) => {
                assert_eq!(q.first_name, "Omar");
                assert_eq!(q.phone.as_deref(), Some("+212 600 000 000"));
                assert!(q.gdpr_consent);
            }
            _ => panic!("Expected Quote variant"),
        }
    }

    #[test]
    fn test_valid_contact_with_string_consent() {
        let payload = json!({
            "name": "Alice",
            "email": " alice@example.com ",
            "subject": "Info",
            "message": "Hello",
            "gdprConsent": "on"
        });

        let fields = validate(SubmissionKind::Contact, &payload).unwrap();

        assert_eq!(fields.kind(), SubmissionKind::Contact);
        assert_eq!(fields.email(), "alice@example.com");
    }

    #[test]
    fn test_missing_company_reported() {
        let mut payload = quote_payload();
        payload.as_object_mut().unwrap().remove("company");

        let err = validate(SubmissionKind::Quote, &payload).unwrap_err();

        assert_eq!(err, ValidationError::MissingFields(vec!["company".to_string()]));
    }

    #[test]
    fn test_missing_fields_in_canonical_order() {
        let payload = json!({"message": "Hello", "email": "alice@example.com"});

        let err = validate(SubmissionKind::Contact, &payload).unwrap_err();

        assert_eq!(
            err,
            ValidationError::MissingFields(vec![
                "name".to_string(),
                "subject".to_string(),
                "gdprConsent".to_string(),
            ])
        );
    }

    #[test]
    fn test_consent_false_or_absent_is_missing() {
        for consent in [json!(false), json!(null), json!(""), json!(0)] {
            let mut payload = quote_payload();
            payload["gdprConsent"] = consent;

            let err = validate(SubmissionKind::Quote, &payload).unwrap_err();
            assert_eq!(err, ValidationError::MissingFields(vec!["gdprConsent".to_string()]));
        }

        let mut payload = quote_payload();
        payload.as_object_mut().unwrap().remove("gdprConsent");
        assert!(matches!(
            validate(SubmissionKind::Quote, &payload),
            Err(ValidationError::MissingFields(f)) if f == vec!["gdprConsent".to_string()]
        ));
    }

    #[test]
    fn test_blank_string_is_missing() {
        let mut payload = quote_payload();
        payload["description"] = json!("   ");

        let err = validate(SubmissionKind::Quote, &payload).unwrap_err();

        assert_eq!(err, ValidationError::MissingFields(vec!["description".to_string()]));
    }

    #[test]
    fn test_invalid_email() {
        let mut payload = quote_payload();
        payload["email"] = json!("not-an-address");

        let err = validate(SubmissionKind::Quote, &payload).unwrap_err();

        assert_eq!(err, ValidationError::InvalidEmail("not-an-address".to_string()));
    }

    #[test]
    fn test_non_object_payload_misses_everything() {
        let err = validate(SubmissionKind::Contact, &json!("hello")).unwrap_err();

        match err {
            ValidationError::MissingFields(fields) => assert_eq!(fields.len(), 5),
            _ => panic!("Expected MissingFields"),
        }
    }

    #[test]
    fn test_non_text_value_for_text_field_is_missing() {
        let mut payload = quote_payload();
        payload["industry"] = json!(true);

        let err = validate(SubmissionKind::Quote, &payload).unwrap_err();

        assert_eq!(err, ValidationError::MissingFields(vec!["industry".to_string()]));
    }

    #[test]
    fn test_display_name_address_rejected() {
        let mut payload = quote_payload();
        payload["email"] = json!("Alice <alice@example.com>");

        let err = validate(SubmissionKind::Quote, &payload).unwrap_err();

        assert_eq!(
            err,
            ValidationError::InvalidEmail("Alice <alice@example.com>".to_string())
        );
    }

    #[test]
    fn test_accepted_address_parses_as_recipient() {
        let fields = validate(SubmissionKind::Quote, &quote_payload()).unwrap();

        assert!(fields.email().parse::<lettre::Address>().is_ok());
    }

    #[test]
    fn test_zero_is_missing_for_text_fields() {
        let payload = json!({
            "name": "Alice",
            "email": "alice@example.com",
            "subject": 0,
            "message": "Hello",
            "gdprConsent": true
        });

        let err = validate(SubmissionKind::Contact, &payload).unwrap_err();

        assert_eq!(err, ValidationError::MissingFields(vec!["subject".to_string()]));
    }

    #[test]
    fn test_optional_fields_stored_as_given() {
        let mut payload = quote_payload();
        payload["phone"] = json!("");

        match validate(SubmissionKind::Quote, &payload).unwrap() {
            SubmissionFields::Quote(q) => assert_eq!(q.phone.as_deref(), Some("")),
            _ => panic!("Expected Quote variant"),
        }

        let contact = json!({
            "name": "Alice",
            "email": "alice@example.com",
            "company": " Atlas ",
            "subject": "Info",
            "message": "Hello",
            "gdprConsent": true
        });
        match validate(SubmissionKind::Contact, &contact).unwrap() {
            SubmissionFields::Contact(c) => assert_eq!(c.company.as_deref(), Some(" Atlas ")),
            _ => panic!("Expected Contact variant"),
        }
    }

    #[test]
    fn test_numeric_phone_is_stringified() {
        let mut payload = quote_payload();
        payload["phone"] = json!(600000000);

        match validate(SubmissionKind::Quote, &payload).unwrap() {
            SubmissionFields::Quote(q) => assert_eq!(q.phone.as_deref(), Some("600000000")),
            _ => panic!("Expected Quote variant"),
        }
    }
}
