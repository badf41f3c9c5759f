//! Driver and passenger profile records attached to a user.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::user::{PhoneNumber, UserId, UserValidationError};

/// Maximum length of free-text passenger preferences.
pub const PREFERENCES_MAX: usize = 500;

/// Validation errors for profile fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileValidationError {
    InvalidLicenseNumber,
    PreferencesTooLong { max: usize },
    EmergencyContact(UserValidationError),
}

impl fmt::Display for ProfileValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidLicenseNumber => write!(
                f,
                "license number must be 5 to 20 uppercase letters, digits, or dashes"
            ),
            Self::PreferencesTooLong { max } => {
                write!(f, "preferences must be at most {max} characters")
            }
            Self::EmergencyContact(inner) => write!(f, "emergency contact: {inner}"),
        }
    }
}

impl std::error::Error for ProfileValidationError {}

static LICENSE_RE: OnceLock<Regex> = OnceLock::new();

fn license_regex() -> &'static Regex {
    LICENSE_RE.get_or_init(|| {
        Regex::new(r"^[A-Z0-9\-]{5,20}$")
            .unwrap_or_else(|error| panic!("license regex failed to compile: {error}"))
    })
}

/// Driving licence number, upper-cased.
///
/// ```
/// use backend::domain::LicenseNumber;
///
/// assert_eq!(LicenseNumber::new(" d123-4567 ").unwrap().as_ref(), "D123-4567");
/// assert!(LicenseNumber::new("ab").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LicenseNumber(String);

impl LicenseNumber {
    /// Validate and normalise a licence number.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, ProfileValidationError> {
        let upper = raw.as_ref().trim().to_ascii_uppercase();
        if !license_regex().is_match(&upper) {
            return Err(ProfileValidationError::InvalidLicenseNumber);
        }
        Ok(Self(upper))
    }
}

impl AsRef<str> for LicenseNumber {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl From<LicenseNumber> for String {
    fn from(value: LicenseNumber) -> Self {
        value.0
    }
}

impl TryFrom<String> for LicenseNumber {
    type Error = ProfileValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Driver-specific profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DriverProfile {
    #[schema(value_type = String)]
    pub user_id: UserId,
    #[schema(value_type = String, example = "D1234567")]
    pub license_number: LicenseNumber,
    /// Upload URL of the scanned licence, if any.
    pub license_document: Option<String>,
    pub verified: bool,
}

impl DriverProfile {
    /// A fresh, unverified profile.
    pub fn new(user_id: UserId, license_number: LicenseNumber) -> Self {
        Self {
            user_id,
            license_number,
            license_document: None,
            verified: false,
        }
    }
}

/// Passenger-specific profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PassengerProfile {
    #[schema(value_type = String)]
    pub user_id: UserId,
    #[schema(value_type = Option<String>)]
    pub emergency_contact: Option<PhoneNumber>,
    pub preferences: Option<String>,
}

impl PassengerProfile {
    /// Validate passenger profile fields.
    pub fn try_new(
        user_id: UserId,
        emergency_contact: Option<&str>,
        preferences: Option<&str>,
    ) -> Result<Self, ProfileValidationError> {
        let emergency_contact = emergency_contact
            .map(PhoneNumber::new)
            .transpose()
            .map_err(ProfileValidationError::EmergencyContact)?;
        let preferences = preferences
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .map(|text| {
                if text.chars().count() > PREFERENCES_MAX {
                    Err(ProfileValidationError::PreferencesTooLong {
                        max: PREFERENCES_MAX,
                    })
                } else {
                    Ok(text.to_owned())
                }
            })
            .transpose()?;
        Ok(Self {
            user_id,
            emergency_contact,
            preferences,
        })
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("abcd")]
    #[case("ABCDEFGHIJKLMNOPQRSTU")]
    #[case("AB 12345")]
    #[case("AB_12345")]
    fn license_rejects_invalid(#[case] raw: &str) {
        assert_eq!(
            LicenseNumber::new(raw),
            Err(ProfileValidationError::InvalidLicenseNumber)
        );
    }

    #[rstest]
    fn passenger_profile_validates_preferences() {
        let long = "x".repeat(PREFERENCES_MAX + 1);
        let err = PassengerProfile::try_new(UserId::random(), None, Some(&long))
            .expect_err("too long");
        assert_eq!(
            err,
            ProfileValidationError::PreferencesTooLong {
                max: PREFERENCES_MAX
            }
        );
    }

    #[rstest]
    fn passenger_profile_drops_blank_preferences() {
        let profile = PassengerProfile::try_new(UserId::random(), Some("555 0100"), Some("  "))
            .expect("valid");
        assert!(profile.preferences.is_none());
        assert_eq!(
            profile.emergency_contact.as_ref().map(AsRef::as_ref),
            Some("5550100")
        );
    }

    #[rstest]
    fn passenger_profile_rejects_bad_contact() {
        let err = PassengerProfile::try_new(UserId::random(), Some("12"), None)
            .expect_err("bad phone");
        assert_eq!(
            err,
            ProfileValidationError::EmergencyContact(UserValidationError::InvalidPhone)
        );
    }
}
