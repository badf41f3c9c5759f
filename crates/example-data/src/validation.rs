//! Full name validation mirroring backend constraints.
//!
//! These rules match the backend's `FullName` type in
//! `backend/src/domain/user.rs`. Generated names must always be accepted by
//! the backend when a store is seeded.
//!
//! # Validation Rules
//!
//! - Length between 2 and 80 characters after trimming
//! - Allowed characters: letters, spaces, apostrophes, hyphens, dots
//! - Must not be whitespace-only

/// Minimum allowed length for a full name.
pub const FULL_NAME_MIN: usize = 2;

/// Maximum allowed length for a full name.
pub const FULL_NAME_MAX: usize = 80;

/// Validates a full name against backend constraints.
///
/// # Examples
///
/// ```
/// use example_data::is_valid_full_name;
///
/// assert!(is_valid_full_name("Ada Lovelace"));
/// assert!(is_valid_full_name("Mary-Jane O'Neil"));
/// assert!(!is_valid_full_name("A"));           // Too short
/// assert!(!is_valid_full_name("user_123"));    // Invalid characters
/// assert!(!is_valid_full_name("   "));         // Whitespace-only
/// ```
#[must_use]
pub fn is_valid_full_name(name: &str) -> bool {
    let trimmed = name.trim();
    let length = trimmed.chars().count();
    if !(FULL_NAME_MIN..=FULL_NAME_MAX).contains(&length) {
        return false;
    }
    trimmed.chars().all(is_valid_full_name_char)
}

fn is_valid_full_name_char(c: char) -> bool {
    c.is_alphabetic() || matches!(c, ' ' | '\'' | '-' | '.')
}

/// Removes characters a full name may not contain and collapses whitespace.
///
/// Length is not enforced.
///
/// ```
/// use example_data::sanitize_full_name;
///
/// assert_eq!(sanitize_full_name("  Ada  Lovelace3 "), "Ada Lovelace");
/// ```
#[must_use]
pub fn sanitize_full_name(name: &str) -> String {
    let kept: String = name
        .chars()
        .filter(|c| is_valid_full_name_char(*c))
        .collect();
    kept.split_whitespace().collect::<Vec<_>>().join(" ")
}
