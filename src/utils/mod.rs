use crate::error::AppError;

/// Normalizes a currency code to uppercase. Codes must be plain ASCII
/// letters; anything else is rejected before any I/O happens.
pub fn validate_currency_code(code: &str) -> Result<String, AppError> {
    let trimmed = code.trim();
    if trimmed.is_empty() || !trimmed.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(AppError::Validation(format!(
            "invalid currency code: {:?}",
            code
        )));
    }

    Ok(trimmed.to_ascii_uppercase())
}

/// Splits a comma-separated list of target currency codes, validating each
/// element and dropping duplicates while keeping the caller's order.
pub fn parse_target_list(raw: &str) -> Result<Vec<String>, AppError> {
    let mut targets: Vec<String> = Vec::new();
    for part in raw.split(',') {
        let code = validate_currency_code(part)?;
        if !targets.contains(&code) {
            targets.push(code);
        }
    }

    Ok(targets)
}
