use validator::ValidationError;

/// Strips the thousands separators people type into DNI fields
/// (`30.123.456` becomes `30123456`). Applied before any storage or lookup
/// so the column holds a single canonical form.
pub fn normalize_dni(raw: &str) -> String {
    raw.trim().chars().filter(|c| *c != '.').collect()
}

/// Phone numbers are stored as captured. The mobile country prefix is
/// dropped for display only.
pub fn display_phone(stored: &str) -> &str {
    stored.strip_prefix("549").unwrap_or(stored)
}

/// Custom validator for sign-up forms: a DNI must be all digits once
/// separators are removed, within the lengths the registry issues.
pub fn validate_dni(value: &str) -> Result<(), ValidationError> {
    let digits = normalize_dni(value);
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::new("dni")
            .with_message("DNI must contain only digits and optional dots".into()));
    }
    if !(6..=9).contains(&digits.len()) {
        return Err(
            ValidationError::new("dni").with_message("DNI must be 6 to 9 digits long".into())
        );
    }
    Ok(())
}
