//! Registry authentication.
//!
//! Internal registries authenticate every request with a caller-supplied
//! token. The registry's [`AuthMethod`] decides the `Authorization` scheme;
//! the token itself is an opaque [`Credential`].

use serde::{Deserialize, Serialize};
use std::fmt;

#[cfg(test)]
mod tests;

/// How a registry expects requests to be authenticated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthMethod {
    /// Anonymous access, no `Authorization` header
    #[default]
    None,
    /// `Authorization: Bearer <token>`
    Bearer,
    /// `Authorization: Basic <token>`, the token already encoded by the caller
    Basic,
}

impl AuthMethod {
    /// Returns the `Authorization` scheme for this method.
    pub fn scheme(&self) -> Option<&'static str> {
        match self {
            Self::None => None,
            Self::Bearer => Some("Bearer"),
            Self::Basic => Some("Basic"),
        }
    }

    pub fn requires_credential(&self) -> bool {
        !matches!(self, Self::None)
    }

    /// Builds the `Authorization` header value, if this method sends one.
    ///
    /// # Examples
    ///
    /// ```
    /// use libcantus::auth::{AuthMethod, Credential};
    ///
    /// let cred = Credential::parse("Bearer abc123").unwrap();
    /// assert_eq!(
    ///     AuthMethod::Bearer.header_value(Some(&cred)),
    ///     Some("Bearer abc123".to_string())
    /// );
    /// assert_eq!(AuthMethod::None.header_value(Some(&cred)), None);
    /// ```
    pub fn header_value(&self, credential: Option<&Credential>) -> Option<String> {
        let scheme = self.scheme()?;
        credential.map(|c| format!("{} {}", scheme, c.token()))
    }
}

impl fmt::Display for AuthMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::Bearer => write!(f, "bearer"),
            Self::Basic => write!(f, "basic"),
        }
    }
}

/// An opaque registry token.
///
/// The token is never printed by `Debug`.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Normalizes a raw credential.
    ///
    /// Callers may pass either the bare token or a full header value such as
    /// `Bearer abc`; only the last whitespace-separated word is kept. Blank
    /// input, or a scheme name with no token after it, yields `None`.
    ///
    /// # Examples
    ///
    /// ```
    /// use libcantus::auth::Credential;
    ///
    /// assert_eq!(Credential::parse("Bearer abc").unwrap().token(), "abc");
    /// assert_eq!(Credential::parse("abc").unwrap().token(), "abc");
    /// assert!(Credential::parse("   ").is_none());
    /// assert!(Credential::parse("Bearer ").is_none());
    /// ```
    pub fn parse(raw: &str) -> Option<Self> {
        let mut words = raw.split_whitespace();
        let first = words.next()?;
        let token = match words.last() {
            Some(last) => last,
            None if is_scheme(first) => return None,
            None => first,
        };
        Some(Self(token.to_string()))
    }

    pub fn token(&self) -> &str {
        &self.0
    }
}

fn is_scheme(word: &str) -> bool {
    [AuthMethod::Bearer, AuthMethod::Basic]
        .iter()
        .filter_map(AuthMethod::scheme)
        .any(|scheme| scheme.eq_ignore_ascii_case(word))
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}
