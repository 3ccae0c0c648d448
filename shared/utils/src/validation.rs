use validator::{Validate, ValidationErrors};

/// Validate a model, returning a human-readable message on failure.
pub fn validate_model<T: Validate>(model: &T) -> Result<(), String> {
    model.validate().map_err(|errors| format_validation_errors(&errors))
}

pub fn format_validation_errors(errors: &ValidationErrors) -> String {
    let mut messages = Vec::new();

    for (field, field_errors) in errors.field_errors() {
        for error in field_errors {
            let message = match (&error.message, error.code.as_ref()) {
                (Some(message), _) => message.to_string(),
                (None, "length") => format!("Length validation failed for field '{}'", field),
                (None, "range") => format!("Value out of range for field '{}'", field),
                (None, "required") => format!("Field '{}' is required", field),
                (None, code) => format!("Validation failed for field '{}': {}", field, code),
            };
            messages.push(message);
        }
    }

    messages.sort();
    messages.join(", ")
}

/// Parse a row quantity; it must be a finite, strictly positive number.
pub fn validate_quantity(raw: &str) -> Result<f64, String> {
    match bomtree_models::parse_number(raw) {
        Some(value) if value > 0.0 => Ok(value),
        Some(value) => Err(format!("Quantity must be positive, got {}", value)),
        None if raw.trim().is_empty() => Err("Missing quantity".to_string()),
        None => Err(format!("Quantity '{}' is not a number", raw.trim())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bomtree_models::{AssemblyRow, PartRecord};

    #[test]
    fn test_validate_model_reports_custom_message() {
        let message = validate_model(&PartRecord::new("")).unwrap_err();
        assert_eq!(message, "Part number must be between 1 and 200 characters");

        let row = AssemblyRow::new(2, "Wheel", 4.0);
        assert!(validate_model(&row).is_ok());
    }

    #[test]
    fn test_validate_quantity() {
        assert_eq!(validate_quantity("4"), Ok(4.0));
        assert_eq!(validate_quantity(" 2.5 "), Ok(2.5));
        assert!(validate_quantity("0").is_err());
        assert!(validate_quantity("-3").is_err());
        assert_eq!(validate_quantity(""), Err("Missing quantity".to_string()));
        assert_eq!(validate_quantity("lots"), Err("Quantity 'lots' is not a number".to_string()));
    }
}
