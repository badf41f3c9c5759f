//! Tests for user value types.

use rstest::{fixture, rstest};

use super::*;

#[fixture]
fn ada() -> User {
    User {
        id: UserId::new("3fa85f64-5717-4562-b3fc-2c963f66afa6").expect("fixture id"),
        email: Email::new("ada@example.com").expect("fixture email"),
        full_name: FullName::new("Ada Lovelace").expect("fixture name"),
        phone: None,
        role: UserRole::Passenger,
        avatar_url: None,
        provider: AuthProvider::Password,
        created_at: Utc::now(),
    }
}

#[rstest]
#[case("", UserValidationError::EmptyId)]
#[case(" 3fa85f64-5717-4562-b3fc-2c963f66afa6", UserValidationError::InvalidId)]
#[case("not-a-uuid", UserValidationError::InvalidId)]
fn user_id_rejects_bad_input(#[case] raw: &str, #[case] expected: UserValidationError) {
    assert_eq!(UserId::new(raw), Err(expected));
}

#[rstest]
#[case("Ada@Example.com", "ada@example.com")]
#[case("  grace.hopper@navy.mil ", "grace.hopper@navy.mil")]
fn email_normalises(#[case] raw: &str, #[case] expected: &str) {
    assert_eq!(Email::new(raw).expect("valid").as_ref(), expected);
}

#[rstest]
#[case("", UserValidationError::EmptyEmail)]
#[case("ada", UserValidationError::InvalidEmail)]
#[case("@example.com", UserValidationError::InvalidEmail)]
#[case("ada@localhost", UserValidationError::InvalidEmail)]
#[case("ada@@example.com", UserValidationError::InvalidEmail)]
#[case("ada lovelace@example.com", UserValidationError::InvalidEmail)]
#[case("ada@example.", UserValidationError::InvalidEmail)]
fn email_rejects_invalid(#[case] raw: &str, #[case] expected: UserValidationError) {
    assert_eq!(Email::new(raw), Err(expected));
}

#[rstest]
fn email_rejects_overlong_addresses() {
    let raw = format!("{}@example.com", "a".repeat(EMAIL_MAX));
    assert_eq!(
        Email::new(raw),
        Err(UserValidationError::EmailTooLong { max: EMAIL_MAX })
    );
}

#[rstest]
#[case("Al")]
#[case("Mary-Jane O'Neil")]
#[case("J. R. R. Tolkien")]
#[case("Zoë Müller")]
fn full_name_accepts_valid(#[case] raw: &str) {
    assert!(FullName::new(raw).is_ok());
}

#[rstest]
#[case("   ", UserValidationError::EmptyFullName)]
#[case("A", UserValidationError::FullNameTooShort { min: FULL_NAME_MIN })]
#[case("R2D2", UserValidationError::FullNameInvalidCharacters)]
#[case("snake_case", UserValidationError::FullNameInvalidCharacters)]
fn full_name_rejects_invalid(#[case] raw: &str, #[case] expected: UserValidationError) {
    assert_eq!(FullName::new(raw), Err(expected));
}

#[rstest]
fn full_name_is_trimmed() {
    assert_eq!(FullName::new("  Ada  ").expect("valid").as_ref(), "Ada");
}

#[rstest]
#[case("555-0100", "5550100")]
#[case("+44 20 7946 0958", "+442079460958")]
fn phone_normalises(#[case] raw: &str, #[case] expected: &str) {
    assert_eq!(PhoneNumber::new(raw).expect("valid").as_ref(), expected);
}

#[rstest]
#[case("123")]
#[case("1234567890123456")]
#[case("+1 (555) 0100")]
#[case("++15550100")]
fn phone_rejects_invalid(#[case] raw: &str) {
    assert_eq!(PhoneNumber::new(raw), Err(UserValidationError::InvalidPhone));
}

#[rstest]
#[case("driver", UserRole::Driver)]
#[case(" Passenger ", UserRole::Passenger)]
fn role_parses(#[case] raw: &str, #[case] expected: UserRole) {
    assert_eq!(raw.parse::<UserRole>(), Ok(expected));
}

#[rstest]
#[case("/api/v1/uploads/abc")]
#[case("https://lh3.googleusercontent.com/a/photo")]
fn avatar_url_accepts_paths_and_urls(#[case] raw: &str) {
    assert!(validate_avatar_url(raw).is_ok());
}

#[rstest]
#[case("ftp://files/avatar.png")]
#[case("avatar.png")]
#[case("/with space")]
fn avatar_url_rejects_other_shapes(#[case] raw: &str) {
    assert_eq!(
        validate_avatar_url(raw),
        Err(UserValidationError::InvalidAvatarUrl)
    );
}

#[rstest]
fn apply_updates_only_supplied_fields(mut ada: User) {
    let update = UserProfileUpdate::try_from_parts(None, Some("555 0100 22"), Some("driver"), None)
        .expect("valid update");

    ada.apply(update);

    assert_eq!(ada.full_name.as_ref(), "Ada Lovelace");
    assert_eq!(ada.phone.as_ref().map(AsRef::as_ref), Some("555010022"));
    assert_eq!(ada.role, UserRole::Driver);
}

#[rstest]
fn update_revalidates_fields() {
    let result = UserProfileUpdate::try_from_parts(Some("x"), None, None, None);
    assert_eq!(
        result,
        Err(UserValidationError::FullNameTooShort { min: FULL_NAME_MIN })
    );
}

#[rstest]
fn user_serialises_camel_case(ada: User) {
    let value = serde_json::to_value(&ada).expect("serialise");
    assert_eq!(value["fullName"], "Ada Lovelace");
    assert_eq!(value["role"], "passenger");
    assert_eq!(value["provider"], "password");
}
