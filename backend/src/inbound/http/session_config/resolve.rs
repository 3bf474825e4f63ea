//! Build-mode aware resolution of individual session variables.
//!
//! A [`Resolver`] reads one variable at a time. Missing or unparsable values
//! degrade to a default in debug builds and become errors in release builds.

use std::fmt::Debug;

use actix_web::cookie::SameSite;
use mockable::Env;
use tracing::warn;

use super::{BuildMode, SessionConfigError};

const FLAG_SPELLINGS: &str = "1|0|true|false|yes|no|y|n";
const SAME_SITE_SPELLINGS: &str = "Strict|Lax|None";

pub(super) struct Resolver<'a, E> {
    env: &'a E,
    mode: BuildMode,
}

impl<'a, E: Env> Resolver<'a, E> {
    pub(super) fn new(env: &'a E, mode: BuildMode) -> Self {
        Self { env, mode }
    }

    pub(super) fn raw(&self, name: &str) -> Option<String> {
        self.env.string(name)
    }

    pub(super) fn flag(&self, name: &'static str, default: bool) -> Result<bool, SessionConfigError> {
        self.typed(name, default, FLAG_SPELLINGS, flag_value)
    }

    pub(super) fn same_site(
        &self,
        name: &'static str,
        default: SameSite,
    ) -> Result<SameSite, SessionConfigError> {
        self.typed(name, default, SAME_SITE_SPELLINGS, same_site_value)
    }

    /// Debug builds log `error` and keep `fallback`; release builds fail.
    pub(super) fn tolerate<T: Debug>(
        &self,
        fallback: T,
        error: SessionConfigError,
    ) -> Result<T, SessionConfigError> {
        match self.mode {
            BuildMode::Debug => {
                warn!(%error, ?fallback, "session setting tolerated in debug build");
                Ok(fallback)
            }
            BuildMode::Release => Err(error),
        }
    }

    fn typed<T: Copy + Debug>(
        &self,
        name: &'static str,
        default: T,
        expected: &'static str,
        parse: fn(&str) -> Option<T>,
    ) -> Result<T, SessionConfigError> {
        let Some(raw) = self.raw(name) else {
            return self.tolerate(default, SessionConfigError::MissingEnv { name });
        };
        match parse(raw.trim()) {
            Some(value) => Ok(value),
            None => self.tolerate(
                default,
                SessionConfigError::InvalidEnv {
                    name,
                    value: raw,
                    expected,
                },
            ),
        }
    }
}

pub(super) fn flag_value(raw: &str) -> Option<bool> {
    const TRUE: [&str; 4] = ["1", "true", "yes", "y"];
    const FALSE: [&str; 4] = ["0", "false", "no", "n"];
    if TRUE.iter().any(|s| raw.eq_ignore_ascii_case(s)) {
        Some(true)
    } else if FALSE.iter().any(|s| raw.eq_ignore_ascii_case(s)) {
        Some(false)
    } else {
        None
    }
}

pub(super) fn same_site_value(raw: &str) -> Option<SameSite> {
    [SameSite::Strict, SameSite::Lax, SameSite::None]
        .into_iter()
        .find(|candidate| raw.eq_ignore_ascii_case(&candidate.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use mockable::MockEnv;
    use rstest::rstest;

    fn env_with(vars: &[(&'static str, &'static str)]) -> MockEnv {
        let vars: HashMap<&str, String> = vars
            .iter()
            .map(|(name, value)| (*name, (*value).to_owned()))
            .collect();
        let mut env = MockEnv::new();
        env.expect_string()
            .times(0..)
            .returning(move |name| vars.get(name).cloned());
        env
    }

    #[rstest]
    #[case("1", Some(true))]
    #[case("YES", Some(true))]
    #[case("n", Some(false))]
    #[case("False", Some(false))]
    #[case("maybe", None)]
    #[case("", None)]
    fn flag_spellings(#[case] raw: &str, #[case] expected: Option<bool>) {
        assert_eq!(flag_value(raw), expected);
    }

    #[rstest]
    #[case("lax", Some(SameSite::Lax))]
    #[case("STRICT", Some(SameSite::Strict))]
    #[case("None", Some(SameSite::None))]
    #[case("sometimes", None)]
    fn same_site_spellings(#[case] raw: &str, #[case] expected: Option<SameSite>) {
        assert_eq!(same_site_value(raw), expected);
    }

    #[rstest]
    fn debug_keeps_the_default_for_garbage() {
        let env = env_with(&[("FLAG", "perhaps")]);
        let resolver = Resolver::new(&env, BuildMode::Debug);
        assert!(resolver.flag("FLAG", true).expect("tolerated"));
        assert!(!resolver.flag("ABSENT", false).expect("tolerated"));
    }

    #[rstest]
    fn release_reports_the_offending_value() {
        let env = env_with(&[("SITE", "sometimes")]);
        let resolver = Resolver::new(&env, BuildMode::Release);
        let err = resolver
            .same_site("SITE", SameSite::Strict)
            .expect_err("release rejects garbage");
        assert!(matches!(
            err,
            SessionConfigError::InvalidEnv { name: "SITE", ref value, .. } if value == "sometimes"
        ));
    }

    #[rstest]
    fn surrounding_whitespace_is_ignored() {
        let env = env_with(&[("FLAG", " no ")]);
        let resolver = Resolver::new(&env, BuildMode::Release);
        assert!(!resolver.flag("FLAG", true).expect("parsed"));
    }
}
