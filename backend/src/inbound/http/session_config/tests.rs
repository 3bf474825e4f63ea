//! Unit tests for session configuration parsing.

use std::collections::HashMap;
use std::io::Write as _;

use super::*;
use mockable::MockEnv;
use rstest::{fixture, rstest};
use tempfile::NamedTempFile;

fn key_file(len: usize) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("temp key file");
    file.write_all(&vec![b'k'; len]).expect("write key");
    file
}

#[fixture]
fn full_key() -> NamedTempFile {
    key_file(SESSION_KEY_MIN_LEN)
}

fn path_of(file: &NamedTempFile) -> String {
    file.path().to_string_lossy().into_owned()
}

fn mock_env(vars: HashMap<&'static str, String>) -> MockEnv {
    let mut env = MockEnv::new();
    env.expect_string()
        .times(0..)
        .returning(move |key| vars.get(key).cloned());
    env
}

fn release_vars(key_path: String) -> HashMap<&'static str, String> {
    HashMap::from([
        (KEY_FILE_ENV, key_path),
        (COOKIE_SECURE_ENV, "1".to_owned()),
        (SAMESITE_ENV, "Strict".to_owned()),
        (ALLOW_EPHEMERAL_ENV, "0".to_owned()),
    ])
}

fn release_error(vars: HashMap<&'static str, String>) -> SessionConfigError {
    match session_settings_from_env(&mock_env(vars), BuildMode::Release) {
        Ok(_) => panic!("release settings should be rejected"),
        Err(error) => error,
    }
}

#[rstest]
#[case::cookie_secure(COOKIE_SECURE_ENV)]
#[case::same_site(SAMESITE_ENV)]
#[case::allow_ephemeral(ALLOW_EPHEMERAL_ENV)]
fn release_requires_every_toggle(full_key: NamedTempFile, #[case] missing: &'static str) {
    let mut vars = release_vars(path_of(&full_key));
    vars.remove(missing);
    let err = release_error(vars);
    assert!(
        matches!(err, SessionConfigError::MissingEnv { name } if name == missing),
        "{err}"
    );
}

#[rstest]
#[case("maybe")]
#[case("")]
fn release_rejects_unparsable_cookie_secure(full_key: NamedTempFile, #[case] value: &str) {
    let mut vars = release_vars(path_of(&full_key));
    vars.insert(COOKIE_SECURE_ENV, value.to_owned());
    assert!(matches!(
        release_error(vars),
        SessionConfigError::InvalidEnv {
            name: COOKIE_SECURE_ENV,
            ..
        }
    ));
}

#[rstest]
fn release_rejects_ephemeral_keys(full_key: NamedTempFile) {
    let mut vars = release_vars(path_of(&full_key));
    vars.insert(ALLOW_EPHEMERAL_ENV, "yes".to_owned());
    assert!(matches!(
        release_error(vars),
        SessionConfigError::EphemeralNotAllowed
    ));
}

#[rstest]
fn release_rejects_unreadable_key() {
    let dir = tempfile::tempdir().expect("temp dir");
    let missing = dir.path().join("absent").to_string_lossy().into_owned();
    assert!(matches!(
        release_error(release_vars(missing)),
        SessionConfigError::KeyRead { .. }
    ));
}

#[rstest]
fn release_rejects_short_key() {
    let short = key_file(32);
    assert!(matches!(
        release_error(release_vars(path_of(&short))),
        SessionConfigError::KeyTooShort { length: 32, .. }
    ));
}

#[rstest]
fn release_rejects_insecure_same_site_none(full_key: NamedTempFile) {
    let mut vars = release_vars(path_of(&full_key));
    vars.insert(COOKIE_SECURE_ENV, "0".to_owned());
    vars.insert(SAMESITE_ENV, "None".to_owned());
    assert!(matches!(
        release_error(vars),
        SessionConfigError::InsecureSameSiteNone
    ));
}

#[rstest]
fn release_accepts_complete_settings(full_key: NamedTempFile) {
    let env = mock_env(release_vars(path_of(&full_key)));
    let settings = session_settings_from_env(&env, BuildMode::Release).expect("valid settings");
    assert!(settings.cookie_secure);
    assert_eq!(settings.same_site, SameSite::Strict);
}

#[rstest]
fn same_key_file_gives_same_fingerprint(full_key: NamedTempFile) {
    let first = session_settings_from_env(&mock_env(release_vars(path_of(&full_key))), BuildMode::Release)
        .expect("first load");
    let second = session_settings_from_env(&mock_env(release_vars(path_of(&full_key))), BuildMode::Release)
        .expect("second load");
    assert_eq!(
        fingerprint::key_fingerprint(&first.key),
        fingerprint::key_fingerprint(&second.key)
    );
}

#[rstest]
fn debug_defaults_to_secure_lax_with_temporary_key() {
    let dir = tempfile::tempdir().expect("temp dir");
    let missing = dir.path().join("absent").to_string_lossy().into_owned();
    let env = mock_env(HashMap::from([(KEY_FILE_ENV, missing)]));
    let settings = session_settings_from_env(&env, BuildMode::Debug).expect("debug defaults");
    assert!(settings.cookie_secure);
    assert_eq!(settings.same_site, SameSite::Lax);
}

#[rstest]
fn debug_tolerates_bad_values(full_key: NamedTempFile) {
    let env = mock_env(HashMap::from([
        (KEY_FILE_ENV, path_of(&full_key)),
        (COOKIE_SECURE_ENV, "perhaps".to_owned()),
        (SAMESITE_ENV, "unexpected".to_owned()),
        (ALLOW_EPHEMERAL_ENV, "?".to_owned()),
    ]));
    let settings = session_settings_from_env(&env, BuildMode::Debug).expect("debug fallback");
    assert!(settings.cookie_secure);
    assert_eq!(settings.same_site, SameSite::Lax);
}
