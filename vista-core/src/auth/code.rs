//! Process-wide numeric access code.

use std::fmt;

use rand::Rng;

/// Number of digits in a freshly generated code.
pub const DEFAULT_CODE_LENGTH: usize = 6;

/// A short decimal access code.
///
/// Exactly one code is valid at a time; [`Registry::regenerate_code`]
/// replaces it and every attempt still carrying the old value fails.
///
/// [`Registry::regenerate_code`]: crate::auth::Registry::regenerate_code
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessCode(String);

impl AccessCode {
    /// Generate `length` random decimal digits (at least one).
    pub fn generate(length: usize) -> Self {
        let mut rng = rand::thread_rng();
        let code = (0..length.max(1))
            .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
            .collect();
        Self(code)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether `candidate` equals this code. A missing candidate never matches.
    pub fn matches(&self, candidate: Option<&str>) -> bool {
        candidate.is_some_and(|c| c == self.0)
    }
}

impl fmt::Display for AccessCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
