//! # Domain Entities
//!
//! Records persisted by the store and the outcomes its procedures return.

use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;
use uuid::Uuid;

/// Seconds since the Unix epoch.
pub type Timestamp = u64;

/// Number of random bytes in a freshly issued token.
pub const TOKEN_BYTES: usize = 32;

/// Maximum length of an asset name in bytes.
pub const MAX_ASSET_NAME_LEN: usize = 255;

/// Maximum length of a login in bytes.
pub const MAX_LOGIN_LEN: usize = 128;

/// Opaque bearer credential.
///
/// The front-end never inspects a token; it only forwards it together with
/// the caller's IP. The `Debug` output is redacted so tokens do not end up
/// in logs.
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct Token(String);

impl Token {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Issue a new random token (hex-encoded).
    pub fn generate() -> Self {
        let mut raw = [0u8; TOKEN_BYTES];
        rand::thread_rng().fill_bytes(&mut raw);
        Self(hex::encode(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tail = self
            .0
            .char_indices()
            .rev()
            .nth(3)
            .map(|(i, _)| &self.0[i..])
            .unwrap_or("");
        write!(f, "Token(…{})", tail)
    }
}

impl From<String> for Token {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for Token {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Stored account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountRecord {
    /// Owner namespace for the account's assets.
    pub account_id: Uuid,
    pub login: String,
    /// PHC-formatted Argon2id hash.
    pub password_hash: String,
    /// Disabled accounts authenticate but are never issued a token.
    pub disabled: bool,
    pub created_at: Timestamp,
}

/// Stored token binding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRecord {
    pub account_id: Uuid,
    pub login: String,
    /// Address the token was issued to.
    pub ip: IpAddr,
    pub issued_at: Timestamp,
    pub expires_at: Timestamp,
}

impl TokenRecord {
    pub fn is_expired(&self, now: Timestamp) -> bool {
        now >= self.expires_at
    }

    /// IP binding plus expiry.
    pub fn is_valid_for(&self, ip: IpAddr, now: Timestamp) -> bool {
        self.ip == ip && !self.is_expired(now)
    }
}

/// Result of the authenticate procedure.
///
/// `Denied` and `NotIssued` are different backend states (credentials
/// rejected vs. credentials accepted but no token handed out); callers
/// outside the store treat both as an authorization failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    Granted(Token),
    /// Unknown login or wrong password.
    Denied,
    /// Credentials matched a disabled account.
    NotIssued,
}

impl AuthOutcome {
    pub fn is_granted(&self) -> bool {
        matches!(self, AuthOutcome::Granted(_))
    }

    pub fn into_token(self) -> Option<Token> {
        match self {
            AuthOutcome::Granted(token) if !token.is_empty() => Some(token),
            _ => None,
        }
    }
}

/// Result of an auth-gated procedure addressing a single asset.
///
/// Existence is only representable once authorization passed, so an
/// unauthorized caller can never learn whether a name exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetAccess<T> {
    Unauthorized,
    Missing,
    Present(T),
}

impl<T> AssetAccess<T> {
    pub fn authorized(&self) -> bool {
        !matches!(self, AssetAccess::Unauthorized)
    }

    pub fn exists(&self) -> bool {
        matches!(self, AssetAccess::Present(_))
    }
}

/// Result of the list procedure. An empty `Names` is a valid listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetListing {
    Unauthorized,
    Names(Vec<String>),
}

impl AssetListing {
    pub fn authorized(&self) -> bool {
        matches!(self, AssetListing::Names(_))
    }
}

/// Validate an asset name before it becomes part of a storage key.
pub fn is_valid_asset_name(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= MAX_ASSET_NAME_LEN
        && !name.contains('/')
        && !name.chars().any(char::is_control)
}

/// Validate a login before it becomes part of a storage key.
pub fn is_valid_login(login: &str) -> bool {
    !login.is_empty() && login.len() <= MAX_LOGIN_LEN && !login.chars().any(char::is_control)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    #[test]
    fn test_generated_tokens_are_unique_hex() {
        let a = Token::generate();
        let b = Token::generate();
        assert_ne!(a, b);
        assert_eq!(a.as_str().len(), TOKEN_BYTES * 2);
        assert!(a.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_token_debug_is_redacted() {
        let token = Token::new("0123456789abcdef");
        let rendered = format!("{:?}", token);
        assert!(!rendered.contains("0123456789"));
        assert!(rendered.ends_with("cdef)"));
    }

    #[test]
    fn test_token_record_ip_binding() {
        let ip_a = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1));
        let ip_b = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 2));
        let record = TokenRecord {
            account_id: Uuid::new_v4(),
            login: "alice".into(),
            ip: ip_a,
            issued_at: 100,
            expires_at: 200,
        };

        assert!(record.is_valid_for(ip_a, 150));
        assert!(!record.is_valid_for(ip_b, 150));
        assert!(!record.is_valid_for(ip_a, 200));
    }

    #[test]
    fn test_denied_and_not_issued_yield_no_token() {
        assert_eq!(AuthOutcome::Denied.into_token(), None);
        assert_eq!(AuthOutcome::NotIssued.into_token(), None);
        assert_eq!(AuthOutcome::Granted(Token::default()).into_token(), None);
        assert!(AuthOutcome::Granted(Token::new("t")).into_token().is_some());
    }

    #[test]
    fn test_asset_access_flags() {
        let unauthorized: AssetAccess<()> = AssetAccess::Unauthorized;
        assert!(!unauthorized.authorized());
        assert!(!unauthorized.exists());

        let missing: AssetAccess<()> = AssetAccess::Missing;
        assert!(missing.authorized());
        assert!(!missing.exists());

        assert!(AssetAccess::Present(()).exists());
    }

    #[test]
    fn test_asset_name_validation() {
        assert!(is_valid_asset_name("report.pdf"));
        assert!(!is_valid_asset_name(""));
        assert!(!is_valid_asset_name("a/b"));
        assert!(!is_valid_asset_name("bad\nname"));
        assert!(!is_valid_asset_name(&"x".repeat(MAX_ASSET_NAME_LEN + 1)));
    }
}
