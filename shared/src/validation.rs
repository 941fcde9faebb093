//! Validation utilities for the Fleet Operations Platform
//!
//! Includes the scan-code input filter shared by the browser scan loop and
//! the backend manual-entry endpoint, so both sides reject the same noise.

// ============================================================================
// Scan Code Validations
// ============================================================================

/// Minimum accepted length for a scanned or typed code
pub const SCAN_CODE_MIN_LEN: usize = 4;

/// Maximum accepted length for a scanned or typed code
pub const SCAN_CODE_MAX_LEN: usize = 20;

/// Validate a raw candidate code before it may enter the voting window.
///
/// Rejects empty input, out-of-range lengths, characters outside
/// `[A-Za-z0-9\-_]`, and known noise patterns (a single character repeated
/// for the whole code, which partial reads of quiet zones produce).
pub fn validate_scan_code(code: &str) -> Result<(), &'static str> {
    if code.is_empty() {
        return Err("Code cannot be empty");
    }
    if code.len() < SCAN_CODE_MIN_LEN {
        return Err("Code is too short");
    }
    if code.len() > SCAN_CODE_MAX_LEN {
        return Err("Code is too long");
    }
    if !code
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err("Code contains invalid characters");
    }
    if is_repeated_char(code) {
        return Err("Code is a repeated-character noise pattern");
    }
    Ok(())
}

/// Strict numeric variant of the filter: digits only, EAN-8 or EAN-13
/// length, valid mod-10 check digit.
pub fn validate_numeric_code(code: &str) -> Result<(), &'static str> {
    if !code.chars().all(|c| c.is_ascii_digit()) {
        return Err("Code must be numeric");
    }
    if code.len() != 8 && code.len() != 13 {
        return Err("Numeric code must be 8 or 13 digits");
    }
    if is_repeated_char(code) {
        return Err("Code is a repeated-character noise pattern");
    }
    if !ean_check_digit_valid(code) {
        return Err("Invalid check digit");
    }
    Ok(())
}

/// True when the whole code is one character repeated (e.g. "00000")
fn is_repeated_char(code: &str) -> bool {
    let mut chars = code.chars();
    match chars.next() {
        Some(first) => chars.all(|c| c == first),
        None => false,
    }
}

/// EAN/GTIN mod-10 check digit validation (EAN-8 and EAN-13)
pub fn ean_check_digit_valid(digits: &str) -> bool {
    let values: Vec<u32> = digits.chars().filter_map(|c| c.to_digit(10)).collect();
    if values.len() != digits.len() || values.len() < 2 {
        return false;
    }

    let (payload, check) = values.split_at(values.len() - 1);
    // Weights 3/1 alternate from the rightmost payload digit
    let sum: u32 = payload
        .iter()
        .rev()
        .enumerate()
        .map(|(i, &d)| if i % 2 == 0 { d * 3 } else { d })
        .sum();

    (10 - (sum % 10)) % 10 == check[0]
}

// ============================================================================
// Catalog Validations
// ============================================================================

/// Prefix of system-generated item references (assigned when an item is
/// created manually, without a scanned code)
pub const GENERATED_REFERENCE_PREFIX: &str = "STK-";

/// True when an item reference was assigned by the system rather than
/// scanned from the physical part
pub fn is_generated_reference(reference: &str) -> bool {
    reference.starts_with(GENERATED_REFERENCE_PREFIX)
}

/// Validate a container identifier (1-30 chars, alphanumeric plus `-` `_`)
pub fn validate_container_identifier(identifier: &str) -> Result<(), &'static str> {
    let trimmed = identifier.trim();
    if trimmed.is_empty() {
        return Err("Container identifier cannot be empty");
    }
    if trimmed.len() > 30 {
        return Err("Container identifier must be at most 30 characters");
    }
    if !trimmed
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err("Container identifier contains invalid characters");
    }
    Ok(())
}

/// Validate a site code format (2-8 uppercase alphanumeric)
pub fn validate_site_code(code: &str) -> Result<(), &'static str> {
    if code.len() < 2 {
        return Err("Site code must be at least 2 characters");
    }
    if code.len() > 8 {
        return Err("Site code must be at most 8 characters");
    }
    if !code.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()) {
        return Err("Site code must be uppercase alphanumeric only");
    }
    Ok(())
}

// ============================================================================
// General Validations
// ============================================================================

/// Validate email format (basic check)
pub fn validate_email(email: &str) -> Result<(), &'static str> {
    if email.contains('@') && email.contains('.') && email.len() >= 5 {
        Ok(())
    } else {
        Err("Invalid email format")
    }
}

/// Validate password strength
pub fn validate_password(password: &str) -> Result<(), &'static str> {
    if password.len() < 8 {
        return Err("Password must be at least 8 characters");
    }
    Ok(())
}

/// Validate a packed quantity (strictly positive)
pub fn validate_quantity(quantity: i64) -> Result<(), &'static str> {
    if quantity < 1 {
        return Err("Quantity must be at least 1");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    // ========================================================================
    // Scan Code Validation Tests
    // ========================================================================

    #[test]
    fn test_validate_scan_code_valid() {
        assert!(validate_scan_code("ABC123").is_ok());
        assert!(validate_scan_code("FH-998877").is_ok());
        assert!(validate_scan_code("part_0042").is_ok());
        assert!(validate_scan_code("1234").is_ok());
    }

    #[test]
    fn test_validate_scan_code_empty() {
        assert!(validate_scan_code("").is_err());
    }

    #[test]
    fn test_validate_scan_code_too_short() {
        assert!(validate_scan_code("AB").is_err());
        assert!(validate_scan_code("A1C").is_err());
    }

    #[test]
    fn test_validate_scan_code_too_long() {
        assert!(validate_scan_code("A12345678901234567890").is_err());
    }

    #[test]
    fn test_validate_scan_code_invalid_characters() {
        assert!(validate_scan_code("a b c!").is_err());
        assert!(validate_scan_code("ABC 123").is_err());
        assert!(validate_scan_code("code#1").is_err());
        assert!(validate_scan_code("héli-01").is_err());
    }

    #[test]
    fn test_validate_scan_code_repeated_noise() {
        assert!(validate_scan_code("00000").is_err());
        assert!(validate_scan_code("11111111").is_err());
        assert!(validate_scan_code("AAAA").is_err());
    }

    #[test]
    fn test_validate_numeric_code_valid() {
        // Real EAN-13 (7622210449283) and EAN-8 (96385074) check digits
        assert!(validate_numeric_code("7622210449283").is_ok());
        assert!(validate_numeric_code("96385074").is_ok());
    }

    #[test]
    fn test_validate_numeric_code_invalid() {
        assert!(validate_numeric_code("ABC12345").is_err()); // Not numeric
        assert!(validate_numeric_code("1234567").is_err()); // Bad length
        assert!(validate_numeric_code("7622210449284").is_err()); // Bad check digit
        assert!(validate_numeric_code("00000000").is_err()); // Noise
    }

    #[test]
    fn test_ean_check_digit() {
        assert!(ean_check_digit_valid("4006381333931"));
        assert!(!ean_check_digit_valid("4006381333932"));
        assert!(!ean_check_digit_valid("400638133393X"));
    }

    // ========================================================================
    // Catalog Validation Tests
    // ========================================================================

    #[test]
    fn test_generated_reference_detection() {
        assert!(is_generated_reference("STK-001"));
        assert!(is_generated_reference("STK-2024-0042"));
        assert!(!is_generated_reference("FH-998877"));
        assert!(!is_generated_reference("stk-001")); // Prefix is literal
    }

    #[test]
    fn test_validate_container_identifier_valid() {
        assert!(validate_container_identifier("C001").is_ok());
        assert!(validate_container_identifier("BOX-12").is_ok());
        assert!(validate_container_identifier("caisse_3").is_ok());
    }

    #[test]
    fn test_validate_container_identifier_invalid() {
        assert!(validate_container_identifier("").is_err());
        assert!(validate_container_identifier("   ").is_err());
        assert!(validate_container_identifier("C 001").is_err());
        assert!(validate_container_identifier(&"X".repeat(31)).is_err());
    }

    #[test]
    fn test_validate_site_code() {
        assert!(validate_site_code("NDJ").is_ok());
        assert!(validate_site_code("BASE2").is_ok());
        assert!(validate_site_code("A").is_err()); // Too short
        assert!(validate_site_code("ABCDEFGHI").is_err()); // Too long
        assert!(validate_site_code("ndj").is_err()); // Lowercase
    }

    // ========================================================================
    // General Validation Tests
    // ========================================================================

    #[test]
    fn test_validate_email() {
        assert!(validate_email("ops@example.com").is_ok());
        assert!(validate_email("invalid").is_err());
        assert!(validate_email("no@domain").is_err());
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("password123").is_ok());
        assert!(validate_password("short").is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(500).is_ok());
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-3).is_err());
    }
}
