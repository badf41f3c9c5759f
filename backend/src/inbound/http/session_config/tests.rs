//! Unit tests for session configuration parsing.

use std::collections::HashMap;
use std::io::Write;

use mockable::MockEnv;
use rstest::rstest;
use tempfile::NamedTempFile;

use super::*;

fn key_file(len: usize) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("temp key file");
    file.write_all(&vec![b'k'; len]).expect("write key");
    file
}

fn env_with(vars: HashMap<&'static str, String>) -> MockEnv {
    let mut env = MockEnv::new();
    env.expect_string()
        .returning(move |name| vars.get(name).cloned());
    env
}

fn release_vars(key: &NamedTempFile) -> HashMap<&'static str, String> {
    HashMap::from([
        (KEY_FILE_ENV, key.path().display().to_string()),
        (COOKIE_SECURE_ENV, "1".to_owned()),
        (SAMESITE_ENV, "Strict".to_owned()),
        (ALLOW_EPHEMERAL_ENV, "0".to_owned()),
    ])
}

#[test]
fn release_accepts_complete_configuration() {
    let key = key_file(64);
    let settings = session_settings_from_env(&env_with(release_vars(&key)), BuildMode::Release)
        .expect("valid settings");

    assert!(settings.cookie_secure);
    assert_eq!(settings.same_site, SameSite::Strict);
    assert_eq!(settings.fingerprint().len(), 16);
}

#[test]
fn same_key_file_gives_same_fingerprint() {
    let key = key_file(64);
    let first = session_settings_from_env(&env_with(release_vars(&key)), BuildMode::Release)
        .expect("first");
    let second = session_settings_from_env(&env_with(release_vars(&key)), BuildMode::Release)
        .expect("second");

    assert_eq!(first.fingerprint(), second.fingerprint());
}

#[rstest]
#[case::missing_secure(COOKIE_SECURE_ENV)]
#[case::missing_samesite(SAMESITE_ENV)]
#[case::missing_ephemeral(ALLOW_EPHEMERAL_ENV)]
fn release_requires_each_toggle(#[case] removed: &'static str) {
    let key = key_file(64);
    let mut vars = release_vars(&key);
    vars.remove(removed);

    let err = session_settings_from_env(&env_with(vars), BuildMode::Release)
        .err()
        .expect("missing toggle");

    assert!(matches!(err, SessionConfigError::MissingEnv { name } if name == removed));
}

#[rstest]
#[case::bad_bool(COOKIE_SECURE_ENV, "maybe")]
#[case::bad_samesite(SAMESITE_ENV, "Sometimes")]
fn release_rejects_invalid_values(#[case] name: &'static str, #[case] value: &str) {
    let key = key_file(64);
    let mut vars = release_vars(&key);
    vars.insert(name, value.to_owned());

    let err = session_settings_from_env(&env_with(vars), BuildMode::Release)
        .err()
        .expect("invalid value");

    assert!(matches!(err, SessionConfigError::InvalidEnv { .. }));
}

#[test]
fn release_rejects_short_key() {
    let key = key_file(16);
    let err = session_settings_from_env(&env_with(release_vars(&key)), BuildMode::Release)
        .err()
        .expect("short key");

    assert!(matches!(
        err,
        SessionConfigError::KeyTooShort { length: 16, min_len: 64, .. }
    ));
}

#[test]
fn release_rejects_insecure_samesite_none() {
    let key = key_file(64);
    let mut vars = release_vars(&key);
    vars.insert(COOKIE_SECURE_ENV, "0".to_owned());
    vars.insert(SAMESITE_ENV, "None".to_owned());

    let err = session_settings_from_env(&env_with(vars), BuildMode::Release)
        .err()
        .expect("insecure none");

    assert!(matches!(err, SessionConfigError::InsecureSameSiteNone));
}

#[test]
fn release_rejects_ephemeral_keys() {
    let key = key_file(64);
    let mut vars = release_vars(&key);
    vars.insert(ALLOW_EPHEMERAL_ENV, "yes".to_owned());

    let err = session_settings_from_env(&env_with(vars), BuildMode::Release)
        .err()
        .expect("ephemeral");

    assert!(matches!(err, SessionConfigError::EphemeralNotAllowed));
}

#[test]
fn release_reports_unreadable_key() {
    let mut vars = HashMap::from([
        (COOKIE_SECURE_ENV, "1".to_owned()),
        (SAMESITE_ENV, "Lax".to_owned()),
        (ALLOW_EPHEMERAL_ENV, "0".to_owned()),
    ]);
    vars.insert(KEY_FILE_ENV, "/nonexistent/carpool/session_key".to_owned());

    let err = session_settings_from_env(&env_with(vars), BuildMode::Release)
        .err()
        .expect("missing key");

    assert!(matches!(err, SessionConfigError::KeyRead { .. }));
}

#[test]
fn debug_falls_back_to_defaults() {
    let vars = HashMap::from([(KEY_FILE_ENV, "/nonexistent/carpool/session_key".to_owned())]);

    let settings =
        session_settings_from_env(&env_with(vars), BuildMode::Debug).expect("debug defaults");

    assert!(settings.cookie_secure);
    assert_eq!(settings.same_site, SameSite::Lax);
}

#[rstest]
#[case("1", Some(true))]
#[case("Yes", Some(true))]
#[case("n", Some(false))]
#[case("FALSE", Some(false))]
#[case("2", None)]
fn parses_boolean_toggles(#[case] raw: &str, #[case] expected: Option<bool>) {
    assert_eq!(parse_bool(raw), expected);
}
