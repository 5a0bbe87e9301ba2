//! Webhook payload signatures — `<algorithm>=<hex HMAC of the raw body>`.
//!
//! Two schemes are understood:
//!
//! | Header                | Tag       | Digest      |
//! |-----------------------|-----------|-------------|
//! | `X-Hub-Signature`     | `sha1=`   | HMAC-SHA1   |
//! | `X-Hub-Signature-256` | `sha256=` | HMAC-SHA256 |
//!
//! Digests are compared with [`Mac::verify_slice`], which is constant-time in
//! the position of the first differing byte.

use std::fmt;

use hmac::{Hmac, Mac};
use sha1::Sha1;
use sha2::Sha256;

use crate::error::SignatureError;

type HmacSha1 = Hmac<Sha1>;
type HmacSha256 = Hmac<Sha256>;

/// Digest algorithm declared by a signature header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureScheme {
    /// Legacy GitHub scheme.
    Sha1,
    Sha256,
}

impl SignatureScheme {
    /// Schemes in order of preference.
    pub const ALL: [SignatureScheme; 2] = [SignatureScheme::Sha256, SignatureScheme::Sha1];

    pub fn tag(self) -> &'static str {
        match self {
            SignatureScheme::Sha1 => "sha1",
            SignatureScheme::Sha256 => "sha256",
        }
    }

    /// HTTP header that carries signatures of this scheme.
    pub fn header_name(self) -> &'static str {
        match self {
            SignatureScheme::Sha1 => "X-Hub-Signature",
            SignatureScheme::Sha256 => "X-Hub-Signature-256",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|scheme| scheme.tag().eq_ignore_ascii_case(tag))
    }
}

impl fmt::Display for SignatureScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Split `sha1=abcd…` into its scheme and hex digest.
pub fn parse_header(header: &str) -> Result<(SignatureScheme, &str), SignatureError> {
    let header = header.trim();
    if header.is_empty() {
        return Err(SignatureError::Missing);
    }
    let (tag, digest) = header
        .split_once('=')
        .ok_or_else(|| SignatureError::UnsupportedScheme(String::new()))?;
    let scheme = SignatureScheme::from_tag(tag)
        .ok_or_else(|| SignatureError::UnsupportedScheme(tag.to_string()))?;
    Ok((scheme, digest))
}

/// Check `header` against the HMAC of `body` keyed with `secret`.
///
/// Returns the scheme that matched. An absent or empty header is
/// [`SignatureError::Missing`]; an unknown tag is
/// [`SignatureError::UnsupportedScheme`]; anything else that does not verify
/// (bad hex, wrong length, wrong digest) is [`SignatureError::Mismatch`].
pub fn check(
    secret: &str,
    body: &[u8],
    header: Option<&str>,
) -> Result<SignatureScheme, SignatureError> {
    let (scheme, digest) = parse_header(header.ok_or(SignatureError::Missing)?)?;
    let expected = hex::decode(digest).map_err(|_| SignatureError::Mismatch)?;

    let matches = match scheme {
        SignatureScheme::Sha1 => verify_mac::<HmacSha1>(secret.as_bytes(), body, &expected),
        SignatureScheme::Sha256 => verify_mac::<HmacSha256>(secret.as_bytes(), body, &expected),
    };
    if matches {
        Ok(scheme)
    } else {
        Err(SignatureError::Mismatch)
    }
}

/// `true` when `header` is a valid signature of `body` under `secret`.
pub fn verify(secret: &str, body: &[u8], header: &str) -> bool {
    check(secret, body, Some(header)).is_ok()
}

/// Produce the header value a sender would attach to `body`.
pub fn sign(secret: &str, body: &[u8], scheme: SignatureScheme) -> Result<String, SignatureError> {
    let digest = match scheme {
        SignatureScheme::Sha1 => mac_bytes::<HmacSha1>(secret.as_bytes(), body)?,
        SignatureScheme::Sha256 => mac_bytes::<HmacSha256>(secret.as_bytes(), body)?,
    };
    Ok(format!("{}={}", scheme.tag(), hex::encode(digest)))
}

fn verify_mac<M: Mac + hmac::digest::KeyInit>(key: &[u8], body: &[u8], expected: &[u8]) -> bool {
    let Ok(mut mac) = <M as Mac>::new_from_slice(key) else {
        return false;
    };
    mac.update(body);
    mac.verify_slice(expected).is_ok()
}

fn mac_bytes<M: Mac + hmac::digest::KeyInit>(
    key: &[u8],
    body: &[u8],
) -> Result<Vec<u8>, SignatureError> {
    let mut mac = <M as Mac>::new_from_slice(key).map_err(|_| SignatureError::InvalidKey)?;
    mac.update(body);
    Ok(mac.finalize().into_bytes().to_vec())
}
