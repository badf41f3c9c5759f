//! User data model.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Validation errors returned by the user value constructors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserValidationError {
    EmptyId,
    InvalidId,
    EmptyEmail,
    EmailTooLong { max: usize },
    InvalidEmail,
    EmptyFullName,
    FullNameTooShort { min: usize },
    FullNameTooLong { max: usize },
    FullNameInvalidCharacters,
    InvalidPhone,
    InvalidRole,
    InvalidProvider,
    InvalidAvatarUrl,
}

impl fmt::Display for UserValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyId => write!(f, "user id must not be empty"),
            Self::InvalidId => write!(f, "user id must be a valid UUID"),
            Self::EmptyEmail => write!(f, "email must not be empty"),
            Self::EmailTooLong { max } => write!(f, "email must be at most {max} characters"),
            Self::InvalidEmail => write!(f, "email must be a valid address"),
            Self::EmptyFullName => write!(f, "full name must not be empty"),
            Self::FullNameTooShort { min } => {
                write!(f, "full name must be at least {min} characters")
            }
            Self::FullNameTooLong { max } => {
                write!(f, "full name must be at most {max} characters")
            }
            Self::FullNameInvalidCharacters => write!(
                f,
                "full name may only contain letters, spaces, apostrophes, hyphens, or dots",
            ),
            Self::InvalidPhone => write!(f, "phone must contain 7 to 15 digits"),
            Self::InvalidRole => write!(f, "role must be driver or passenger"),
            Self::InvalidProvider => write!(f, "provider must be password or google"),
            Self::InvalidAvatarUrl => {
                write!(f, "avatar url must be an absolute path or http(s) URL")
            }
        }
    }
}

impl std::error::Error for UserValidationError {}

impl UserValidationError {
    /// JSON field name the error refers to.
    pub fn field(&self) -> &'static str {
        match self {
            Self::EmptyId | Self::InvalidId => "id",
            Self::EmptyEmail | Self::EmailTooLong { .. } | Self::InvalidEmail => "email",
            Self::EmptyFullName
            | Self::FullNameTooShort { .. }
            | Self::FullNameTooLong { .. }
            | Self::FullNameInvalidCharacters => "fullName",
            Self::InvalidPhone => "phone",
            Self::InvalidRole => "role",
            Self::InvalidProvider => "provider",
            Self::InvalidAvatarUrl => "avatarUrl",
        }
    }
}

/// Stable user identifier stored as a UUID.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(Uuid, String);

impl UserId {
    /// Validate and construct a [`UserId`] from borrowed input.
    pub fn new(id: impl AsRef<str>) -> Result<Self, UserValidationError> {
        Self::from_owned(id.as_ref().to_owned())
    }

    /// Generate a new random [`UserId`].
    pub fn random() -> Self {
        Self::from_uuid(Uuid::new_v4())
    }

    /// Wrap an already parsed UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid, uuid.to_string())
    }

    fn from_owned(id: String) -> Result<Self, UserValidationError> {
        if id.is_empty() {
            return Err(UserValidationError::EmptyId);
        }
        if id.trim() != id {
            return Err(UserValidationError::InvalidId);
        }

        let parsed = Uuid::parse_str(&id).map_err(|_| UserValidationError::InvalidId)?;
        Ok(Self(parsed, id))
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl AsRef<str> for UserId {
    fn as_ref(&self) -> &str {
        self.1.as_str()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<UserId> for String {
    fn from(value: UserId) -> Self {
        let UserId(_, raw) = value;
        raw
    }
}

impl TryFrom<String> for UserId {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_owned(value)
    }
}

/// Maximum allowed length for an email address.
pub const EMAIL_MAX: usize = 254;

/// Normalised (trimmed, lower-cased) email address.
///
/// ```
/// use backend::domain::Email;
///
/// let email = Email::new("  Ada@Example.COM ").expect("valid email");
/// assert_eq!(email.as_ref(), "ada@example.com");
/// assert!(Email::new("ada@localhost").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

impl Email {
    /// Validate and normalise an email address.
    pub fn new(email: impl AsRef<str>) -> Result<Self, UserValidationError> {
        let normalised = email.as_ref().trim().to_lowercase();
        if normalised.is_empty() {
            return Err(UserValidationError::EmptyEmail);
        }
        if normalised.chars().count() > EMAIL_MAX {
            return Err(UserValidationError::EmailTooLong { max: EMAIL_MAX });
        }
        let (local, domain) = normalised
            .split_once('@')
            .ok_or(UserValidationError::InvalidEmail)?;
        let domain_ok = domain.contains('.')
            && !domain.starts_with('.')
            && !domain.ends_with('.')
            && !domain.contains('@');
        if local.is_empty() || !domain_ok || normalised.chars().any(char::is_whitespace) {
            return Err(UserValidationError::InvalidEmail);
        }
        Ok(Self(normalised))
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<Email> for String {
    fn from(value: Email) -> Self {
        value.0
    }
}

impl TryFrom<String> for Email {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Minimum allowed length for a full name.
pub const FULL_NAME_MIN: usize = 2;
/// Maximum allowed length for a full name.
pub const FULL_NAME_MAX: usize = 80;

static FULL_NAME_RE: OnceLock<Regex> = OnceLock::new();

fn full_name_regex() -> &'static Regex {
    FULL_NAME_RE.get_or_init(|| {
        // Length is enforced separately; this regex constrains allowed characters.
        let pattern = r"^[\p{L} '.\-]+$";
        Regex::new(pattern)
            .unwrap_or_else(|error| panic!("full name regex failed to compile: {error}"))
    })
}

/// Human readable full name, trimmed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FullName(String);

impl FullName {
    /// Validate and construct a [`FullName`].
    pub fn new(full_name: impl AsRef<str>) -> Result<Self, UserValidationError> {
        let trimmed = full_name.as_ref().trim();
        if trimmed.is_empty() {
            return Err(UserValidationError::EmptyFullName);
        }

        let length = trimmed.chars().count();
        if length < FULL_NAME_MIN {
            return Err(UserValidationError::FullNameTooShort { min: FULL_NAME_MIN });
        }
        if length > FULL_NAME_MAX {
            return Err(UserValidationError::FullNameTooLong { max: FULL_NAME_MAX });
        }
        if !full_name_regex().is_match(trimmed) {
            return Err(UserValidationError::FullNameInvalidCharacters);
        }

        Ok(Self(trimmed.to_owned()))
    }
}

impl AsRef<str> for FullName {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for FullName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<FullName> for String {
    fn from(value: FullName) -> Self {
        value.0
    }
}

impl TryFrom<String> for FullName {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Phone number reduced to digits with an optional leading `+`.
///
/// ```
/// use backend::domain::PhoneNumber;
///
/// let phone = PhoneNumber::new("+1 555-010-9999").expect("valid phone");
/// assert_eq!(phone.as_ref(), "+15550109999");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PhoneNumber(String);

impl PhoneNumber {
    /// Validate and normalise a phone number.
    pub fn new(phone: impl AsRef<str>) -> Result<Self, UserValidationError> {
        let compact: String = phone
            .as_ref()
            .trim()
            .chars()
            .filter(|c| !matches!(c, ' ' | '-'))
            .collect();
        let (plus, digits) = match compact.strip_prefix('+') {
            Some(rest) => ("+", rest),
            None => ("", compact.as_str()),
        };
        let valid = (7..=15).contains(&digits.len()) && digits.chars().all(|c| c.is_ascii_digit());
        if !valid {
            return Err(UserValidationError::InvalidPhone);
        }
        Ok(Self(format!("{plus}{digits}")))
    }
}

impl AsRef<str> for PhoneNumber {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl From<PhoneNumber> for String {
    fn from(value: PhoneNumber) -> Self {
        value.0
    }
}

impl TryFrom<String> for PhoneNumber {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Whether the user primarily drives or rides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Driver,
    Passenger,
}

impl UserRole {
    /// Stable storage representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Driver => "driver",
            Self::Passenger => "passenger",
        }
    }
}

impl FromStr for UserRole {
    type Err = UserValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "driver" => Ok(Self::Driver),
            "passenger" => Ok(Self::Passenger),
            _ => Err(UserValidationError::InvalidRole),
        }
    }
}

/// How the account authenticates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AuthProvider {
    Password,
    Google,
}

impl AuthProvider {
    /// Stable storage representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Password => "password",
            Self::Google => "google",
        }
    }
}

impl FromStr for AuthProvider {
    type Err = UserValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "password" => Ok(Self::Password),
            "google" => Ok(Self::Google),
            _ => Err(UserValidationError::InvalidProvider),
        }
    }
}

/// Maximum stored length of an avatar URL.
pub const AVATAR_URL_MAX: usize = 2048;

/// Validate an avatar URL: a server-relative path or an absolute http(s) URL.
pub fn validate_avatar_url(raw: &str) -> Result<String, UserValidationError> {
    let trimmed = raw.trim();
    let shaped = trimmed.starts_with('/')
        || trimmed.starts_with("https://")
        || trimmed.starts_with("http://");
    if !shaped || trimmed.len() > AVATAR_URL_MAX || trimmed.chars().any(char::is_whitespace) {
        return Err(UserValidationError::InvalidAvatarUrl);
    }
    Ok(trimmed.to_owned())
}

/// Application user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[schema(value_type = String, example = "3fa85f64-5717-4562-b3fc-2c963f66afa6")]
    pub id: UserId,
    #[schema(value_type = String, example = "ada@example.com")]
    pub email: Email,
    #[schema(value_type = String, example = "Ada Lovelace")]
    pub full_name: FullName,
    #[schema(value_type = Option<String>, example = "+15550109999")]
    pub phone: Option<PhoneNumber>,
    pub role: UserRole,
    pub avatar_url: Option<String>,
    pub provider: AuthProvider,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Apply a validated partial update.
    pub fn apply(&mut self, update: UserProfileUpdate) {
        let UserProfileUpdate {
            full_name,
            phone,
            role,
            avatar_url,
        } = update;
        if let Some(full_name) = full_name {
            self.full_name = full_name;
        }
        if let Some(phone) = phone {
            self.phone = Some(phone);
        }
        if let Some(role) = role {
            self.role = role;
        }
        if let Some(avatar_url) = avatar_url {
            self.avatar_url = Some(avatar_url);
        }
    }
}

/// Partial profile update; `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserProfileUpdate {
    pub full_name: Option<FullName>,
    pub phone: Option<PhoneNumber>,
    pub role: Option<UserRole>,
    pub avatar_url: Option<String>,
}

impl UserProfileUpdate {
    /// Validate raw update fields.
    pub fn try_from_parts(
        full_name: Option<&str>,
        phone: Option<&str>,
        role: Option<&str>,
        avatar_url: Option<&str>,
    ) -> Result<Self, UserValidationError> {
        Ok(Self {
            full_name: full_name.map(FullName::new).transpose()?,
            phone: phone.map(PhoneNumber::new).transpose()?,
            role: role.map(str::parse).transpose()?,
            avatar_url: avatar_url.map(validate_avatar_url).transpose()?,
        })
    }

    /// True when the update changes nothing.
    pub fn is_empty(&self) -> bool {
        self.full_name.is_none()
            && self.phone.is_none()
            && self.role.is_none()
            && self.avatar_url.is_none()
    }
}

#[cfg(test)]
#[path = "user_tests.rs"]
mod tests;
