//! Input validation
//!
//! Request types declare their constraints with `validator` derives; this
//! module turns a failed `validate()` into a flat, stable list of field
//! violations that the error layer can render.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationErrors};

/// A single failed constraint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct FieldViolation {
    pub field: String,
    pub message: String,
}

/// Run the input's declared constraints, returning every violation
pub fn validate_input<T: Validate>(input: &T) -> Result<(), Vec<FieldViolation>> {
    input.validate().map_err(|errors| violations(&errors))
}

fn violations(errors: &ValidationErrors) -> Vec<FieldViolation> {
    let mut out: Vec<FieldViolation> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            let field = field.to_string();
            errs.iter().map(move |e| FieldViolation {
                field: field.clone(),
                message: e
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("{field} is invalid ({})", e.code)),
            })
        })
        .collect();

    // HashMap iteration order is random
    out.sort_by(|a, b| a.field.cmp(&b.field).then(a.message.cmp(&b.message)));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Validate)]
    struct Sample {
        #[validate(email(message = "email must be an email"))]
        email: String,
        #[validate(length(min = 6))]
        password: String,
    }

    #[test]
    fn test_valid_input() {
        let input = Sample {
            email: "a@x.com".to_string(),
            password: "secret1".to_string(),
        };
        assert!(validate_input(&input).is_ok());
    }

    #[test]
    fn test_collects_all_violations_sorted() {
        let input = Sample {
            email: "nope".to_string(),
            password: "123".to_string(),
        };

        let violations = validate_input(&input).unwrap_err();
        assert_eq!(violations.len(), 2);
        assert_eq!(violations[0].field, "email");
        assert_eq!(violations[0].message, "email must be an email");
        assert_eq!(violations[1].field, "password");
        assert!(violations[1].message.contains("length"));
    }
}
