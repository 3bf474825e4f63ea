//! Argon2id implementation of the password port.
//!
//! Digests are stored in PHC string form (`$argon2id$v=19$...`), so the
//! parameters travel with each hash and can be tuned without a migration.

use argon2::Argon2;
use argon2::password_hash::{
    PasswordHash as PhcString, PasswordHasher as _, PasswordVerifier as _, SaltString,
};
use rand::RngCore;

use crate::domain::PasswordHash;
use crate::domain::ports::{PasswordHashError, PasswordHasher};

const SALT_LEN: usize = 16;

/// Argon2id with the crate's default cost parameters.
#[derive(Clone, Default)]
pub struct Argon2PasswordHasher {
    argon2: Argon2<'static>,
}

impl Argon2PasswordHasher {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PasswordHasher for Argon2PasswordHasher {
    fn hash(&self, raw: &str) -> Result<PasswordHash, PasswordHashError> {
        let mut bytes = [0_u8; SALT_LEN];
        rand::thread_rng().fill_bytes(&mut bytes);
        let salt = SaltString::encode_b64(&bytes)
            .map_err(|err| PasswordHashError::hashing(err.to_string()))?;
        let digest = self
            .argon2
            .hash_password(raw.as_bytes(), &salt)
            .map_err(|err| PasswordHashError::hashing(err.to_string()))?;
        Ok(PasswordHash::new(digest.to_string()))
    }

    fn verify(&self, raw: &str, hash: &PasswordHash) -> bool {
        PhcString::new(hash.as_str()).is_ok_and(|parsed| {
            self.argon2
                .verify_password(raw.as_bytes(), &parsed)
                .is_ok()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn hashes_verify_against_their_input() {
        let hasher = Argon2PasswordHasher::new();
        let digest = hasher.hash("correct horse").expect("hash");
        assert!(digest.as_str().starts_with("$argon2id$"));
        assert!(hasher.verify("correct horse", &digest));
        assert!(!hasher.verify("wrong horse", &digest));
    }

    #[rstest]
    fn salts_differ_between_calls() {
        let hasher = Argon2PasswordHasher::new();
        let a = hasher.hash("same").expect("first");
        let b = hasher.hash("same").expect("second");
        assert_ne!(a.as_str(), b.as_str());
    }

    #[rstest]
    #[case("")]
    #[case("plain-text")]
    #[case("$argon2id$broken")]
    fn malformed_digests_never_match(#[case] stored: &str) {
        let hasher = Argon2PasswordHasher::new();
        assert!(!hasher.verify("plain-text", &PasswordHash::new(stored)));
    }
}
