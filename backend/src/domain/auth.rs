//! Authentication primitives: credentials, registrations, password hashes and
//! gateway-asserted Google identities.
//!
//! Keep inbound payload parsing outside the domain by exposing constructors
//! that validate string inputs before a handler talks to a port or service.

use std::fmt;

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{self, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use zeroize::Zeroizing;

use super::user::{Email, FullName, PhoneNumber, User, UserRole, UserValidationError};

/// Minimum accepted password length for registrations.
pub const PASSWORD_MIN: usize = 8;
/// Maximum accepted password length for registrations.
pub const PASSWORD_MAX: usize = 128;

/// Domain error returned when login payload values are invalid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginValidationError {
    /// Email was missing or malformed.
    InvalidEmail(UserValidationError),
    /// Password was blank.
    EmptyPassword,
}

impl fmt::Display for LoginValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidEmail(inner) => write!(f, "{inner}"),
            Self::EmptyPassword => write!(f, "password must not be empty"),
        }
    }
}

impl std::error::Error for LoginValidationError {}

/// Validated login credentials used by authentication services.
///
/// ## Invariants
/// - `email` is normalised.
/// - `password` is non-empty and retains caller-provided whitespace.
///
/// # Examples
/// ```
/// use backend::domain::LoginCredentials;
///
/// let creds = LoginCredentials::try_from_parts("Ada@Example.com", "hunter22").unwrap();
/// assert_eq!(creds.email().as_ref(), "ada@example.com");
/// assert_eq!(creds.password(), "hunter22");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginCredentials {
    email: Email,
    password: Zeroizing<String>,
}

impl LoginCredentials {
    /// Construct credentials from raw email/password inputs.
    pub fn try_from_parts(email: &str, password: &str) -> Result<Self, LoginValidationError> {
        let email = Email::new(email).map_err(LoginValidationError::InvalidEmail)?;
        if password.is_empty() {
            return Err(LoginValidationError::EmptyPassword);
        }

        Ok(Self {
            email,
            password: Zeroizing::new(password.to_owned()),
        })
    }

    /// Email used for the account lookup.
    pub fn email(&self) -> &Email {
        &self.email
    }

    /// Password string provided by the caller.
    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}

/// Errors raised while validating a registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationValidationError {
    /// One of the user fields was invalid.
    User(UserValidationError),
    /// Password length falls outside the accepted range.
    PasswordLength { min: usize, max: usize },
}

impl fmt::Display for RegistrationValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User(inner) => write!(f, "{inner}"),
            Self::PasswordLength { min, max } => {
                write!(f, "password must be between {min} and {max} characters")
            }
        }
    }
}

impl std::error::Error for RegistrationValidationError {}

impl From<UserValidationError> for RegistrationValidationError {
    fn from(value: UserValidationError) -> Self {
        Self::User(value)
    }
}

/// Raw registration fields as received from an inbound adapter.
#[derive(Debug, Clone, Copy)]
pub struct RegistrationParts<'a> {
    pub email: &'a str,
    pub full_name: &'a str,
    pub password: &'a str,
    pub role: &'a str,
    pub phone: Option<&'a str>,
}

/// Validated sign-up request for a password account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub email: Email,
    pub full_name: FullName,
    pub password: Zeroizing<String>,
    pub role: UserRole,
    pub phone: Option<PhoneNumber>,
}

impl Registration {
    /// Validate every registration field.
    pub fn try_from_parts(parts: RegistrationParts<'_>) -> Result<Self, RegistrationValidationError> {
        let email = Email::new(parts.email)?;
        let full_name = FullName::new(parts.full_name)?;
        let role = parts.role.parse::<UserRole>()?;
        let phone = parts.phone.map(PhoneNumber::new).transpose()?;
        let length = parts.password.chars().count();
        if !(PASSWORD_MIN..=PASSWORD_MAX).contains(&length) {
            return Err(RegistrationValidationError::PasswordLength {
                min: PASSWORD_MIN,
                max: PASSWORD_MAX,
            });
        }
        Ok(Self {
            email,
            full_name,
            password: Zeroizing::new(parts.password.to_owned()),
            role,
            phone,
        })
    }
}

/// Failures while producing a password hash.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PasswordHashError {
    /// The hasher rejected its input.
    #[error("failed to hash password: {message}")]
    Hash { message: String },
    /// A stored hash could not be parsed as a PHC string.
    #[error("stored password hash is malformed: {message}")]
    Malformed { message: String },
}

/// Argon2id password hash stored as a PHC string.
///
/// ```
/// use backend::domain::PasswordHash;
///
/// let hash = PasswordHash::hash("correct horse").expect("hashing succeeds");
/// assert!(hash.verify("correct horse"));
/// assert!(!hash.verify("wrong horse"));
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct PasswordHash(String);

impl PasswordHash {
    /// Hash a password with a random salt.
    pub fn hash(password: &str) -> Result<Self, PasswordHashError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|err| PasswordHashError::Hash {
                message: err.to_string(),
            })?;
        Ok(Self(hash.to_string()))
    }

    /// Wrap a PHC string loaded from storage, checking it parses.
    pub fn from_phc(phc: impl Into<String>) -> Result<Self, PasswordHashError> {
        let phc = phc.into();
        password_hash::PasswordHash::new(&phc).map_err(|err| PasswordHashError::Malformed {
            message: err.to_string(),
        })?;
        Ok(Self(phc))
    }

    /// Check a candidate password against this hash.
    pub fn verify(&self, password: &str) -> bool {
        password_hash::PasswordHash::new(&self.0)
            .map(|parsed| {
                Argon2::default()
                    .verify_password(password.as_bytes(), &parsed)
                    .is_ok()
            })
            .unwrap_or(false)
    }

    /// PHC string for storage.
    pub fn as_phc(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for PasswordHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PasswordHash(..)")
    }
}

/// Identity asserted by the gateway after a Google OAuth code exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoogleIdentity {
    pub subject: String,
    pub email: Email,
    pub full_name: FullName,
    pub picture: Option<String>,
}

/// Errors raised while validating a Google identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GoogleIdentityValidationError {
    EmptySubject,
    User(UserValidationError),
}

impl fmt::Display for GoogleIdentityValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptySubject => write!(f, "google subject must not be empty"),
            Self::User(inner) => write!(f, "{inner}"),
        }
    }
}

impl std::error::Error for GoogleIdentityValidationError {}

impl GoogleIdentity {
    /// Validate the identity fields.
    ///
    /// Names Google returns may contain characters a [`FullName`] rejects, so
    /// they are sanitised first; a name that is still invalid falls back to
    /// the email's local part.
    pub fn try_from_parts(
        subject: &str,
        email: &str,
        name: Option<&str>,
        picture: Option<&str>,
    ) -> Result<Self, GoogleIdentityValidationError> {
        let subject = subject.trim();
        if subject.is_empty() {
            return Err(GoogleIdentityValidationError::EmptySubject);
        }
        let email = Email::new(email).map_err(GoogleIdentityValidationError::User)?;
        let full_name = name
            .and_then(|raw| FullName::new(sanitise_name(raw)).ok())
            .or_else(|| {
                let local = email.as_ref().split('@').next().unwrap_or_default();
                FullName::new(sanitise_name(&local.replace(['.', '_'], " "))).ok()
            })
            .map_or_else(|| FullName::new("Google User"), Ok)
            .map_err(GoogleIdentityValidationError::User)?;
        let picture = picture
            .map(str::trim)
            .filter(|url| url.starts_with("https://"))
            .map(str::to_owned);
        Ok(Self {
            subject: subject.to_owned(),
            email,
            full_name,
            picture,
        })
    }
}

fn sanitise_name(raw: &str) -> String {
    let kept: String = raw
        .chars()
        .filter(|c| c.is_alphabetic() || matches!(c, ' ' | '\'' | '-' | '.'))
        .collect();
    kept.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Stored account: the public user plus credentials.
#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    pub user: User,
    pub password_hash: Option<PasswordHash>,
    pub google_subject: Option<String>,
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("", "pw")]
    #[case("not-an-email", "pw")]
    fn login_rejects_invalid_email(#[case] email: &str, #[case] password: &str) {
        let err = LoginCredentials::try_from_parts(email, password).expect_err("invalid email");
        assert!(matches!(err, LoginValidationError::InvalidEmail(_)));
    }

    #[rstest]
    fn login_rejects_empty_password() {
        let err = LoginCredentials::try_from_parts("ada@example.com", "").expect_err("empty");
        assert_eq!(err, LoginValidationError::EmptyPassword);
    }

    fn parts<'a>(password: &'a str, role: &'a str) -> RegistrationParts<'a> {
        RegistrationParts {
            email: "ada@example.com",
            full_name: "Ada Lovelace",
            password,
            role,
            phone: None,
        }
    }

    #[rstest]
    #[case("short")]
    #[case(&"x".repeat(PASSWORD_MAX + 1))]
    fn registration_enforces_password_length(#[case] password: &str) {
        let err = Registration::try_from_parts(parts(password, "driver")).expect_err("length");
        assert_eq!(
            err,
            RegistrationValidationError::PasswordLength {
                min: PASSWORD_MIN,
                max: PASSWORD_MAX
            }
        );
    }

    #[rstest]
    fn registration_rejects_unknown_role() {
        let err = Registration::try_from_parts(parts("long enough", "pilot")).expect_err("role");
        assert_eq!(
            err,
            RegistrationValidationError::User(UserValidationError::InvalidRole)
        );
    }

    #[rstest]
    fn registration_accepts_valid_input() {
        let registration =
            Registration::try_from_parts(parts("long enough", "driver")).expect("valid");
        assert_eq!(registration.role, UserRole::Driver);
        assert_eq!(registration.password.as_str(), "long enough");
    }

    #[rstest]
    fn password_hash_round_trips_through_phc() {
        let hash = PasswordHash::hash("s3cret-pass").expect("hash");
        let restored = PasswordHash::from_phc(hash.as_phc()).expect("parse phc");
        assert!(restored.verify("s3cret-pass"));
        assert!(!restored.verify("S3cret-pass"));
        assert!(hash.as_phc().starts_with("$argon2id$"));
    }

    #[rstest]
    fn malformed_phc_is_rejected() {
        assert!(matches!(
            PasswordHash::from_phc("plaintext"),
            Err(PasswordHashError::Malformed { .. })
        ));
    }

    #[rstest]
    fn debug_output_hides_hash() {
        let hash = PasswordHash::hash("s3cret-pass").expect("hash");
        assert_eq!(format!("{hash:?}"), "PasswordHash(..)");
    }

    #[rstest]
    #[case(Some("Grace Hopper"), "Grace Hopper")]
    #[case(Some("ジョン"), "ジョン")]
    #[case(Some("R2-D2 ✨"), "R-D")]
    #[case(None, "grace hopper")]
    fn google_identity_derives_a_full_name(#[case] name: Option<&str>, #[case] expected: &str) {
        let identity =
            GoogleIdentity::try_from_parts("sub-1", "grace.hopper@example.com", name, None)
                .expect("valid identity");
        assert_eq!(identity.full_name.as_ref(), expected);
    }

    #[rstest]
    fn google_identity_requires_subject() {
        let err = GoogleIdentity::try_from_parts(" ", "a@example.com", None, None)
            .expect_err("missing subject");
        assert_eq!(err, GoogleIdentityValidationError::EmptySubject);
    }

    #[rstest]
    fn google_identity_drops_non_https_pictures() {
        let identity = GoogleIdentity::try_from_parts(
            "sub-1",
            "a@example.com",
            Some("Ann Lee"),
            Some("http://insecure/pic.png"),
        )
        .expect("valid identity");
        assert!(identity.picture.is_none());
    }
}
