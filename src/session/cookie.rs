//! Signed session cookies.
//!
//! A cookie value is `{session_id}.{hex(hmac_sha256(secret, session_id))}`.
//! Values with a bad or missing signature are treated as absent.

use axum::http::header::COOKIE;
use axum::http::{HeaderMap, HeaderValue};
use hmac::digest::InvalidLength;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Attributes applied to every session cookie.
#[derive(Debug, Clone)]
pub struct CookieOptions {
    pub name: String,
    pub path: String,
    pub http_only: bool,
    pub secure: bool,
    pub max_age_secs: u64,
}

#[derive(Clone)]
pub struct CookieSigner {
    keyed: HmacSha256,
}

impl std::fmt::Debug for CookieSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CookieSigner").finish_non_exhaustive()
    }
}

impl CookieSigner {
    pub fn new(secret: impl AsRef<[u8]>) -> Result<Self, InvalidLength> {
        Ok(Self {
            keyed: HmacSha256::new_from_slice(secret.as_ref())?,
        })
    }

    fn mac(&self) -> HmacSha256 {
        self.keyed.clone()
    }

    pub fn sign(&self, session_id: &str) -> String {
        let mut mac = self.mac();
        mac.update(session_id.as_bytes());
        format!("{}.{}", session_id, hex::encode(mac.finalize().into_bytes()))
    }

    /// Return the session id if `value` carries a valid signature.
    pub fn verify<'a>(&self, value: &'a str) -> Option<&'a str> {
        let (session_id, signature) = value.rsplit_once('.')?;
        let signature = hex::decode(signature).ok()?;

        let mut mac = self.mac();
        mac.update(session_id.as_bytes());
        mac.verify_slice(&signature).ok()?;
        Some(session_id)
    }
}

/// Value of the cookie `name` in the request's `Cookie` headers.
pub fn find_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
}

/// Build a `Set-Cookie` header value.
pub fn set_cookie_header(options: &CookieOptions, value: &str) -> Option<HeaderValue> {
    let mut cookie = format!(
        "{}={}; Path={}; Max-Age={}",
        options.name, value, options.path, options.max_age_secs
    );
    if options.http_only {
        cookie.push_str("; HttpOnly");
    }
    if options.secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(secure: bool) -> CookieOptions {
        CookieOptions {
            name: "session".into(),
            path: "/".into(),
            http_only: true,
            secure,
            max_age_secs: 60,
        }
    }

    #[test]
    fn test_sign_and_verify() {
        let signer = CookieSigner::new("secret").unwrap();
        let value = signer.sign("abc123");
        assert!(value.starts_with("abc123."));
        assert_eq!(signer.verify(&value), Some("abc123"));
    }

    #[test]
    fn test_tampered_or_foreign_values_rejected() {
        let signer = CookieSigner::new("secret").unwrap();
        let value = signer.sign("abc123");

        assert_eq!(signer.verify(&value.replace("abc123", "abc124")), None);
        assert_eq!(CookieSigner::new("other").unwrap().verify(&value), None);
        assert_eq!(signer.verify("abc123"), None);
        assert_eq!(signer.verify("abc123.zz"), None);
    }

    #[test]
    fn test_find_cookie() {
        let mut headers = HeaderMap::new();
        headers.append(COOKIE, HeaderValue::from_static("theme=dark; session=s.1"));
        headers.append(COOKIE, HeaderValue::from_static("lang=sv"));

        assert_eq!(find_cookie(&headers, "session"), Some("s.1"));
        assert_eq!(find_cookie(&headers, "lang"), Some("sv"));
        assert_eq!(find_cookie(&headers, "missing"), None);
    }

    #[test]
    fn test_set_cookie_attributes() {
        let header = set_cookie_header(&options(true), "v").unwrap();
        assert_eq!(header, "session=v; Path=/; Max-Age=60; HttpOnly; Secure");

        let header = set_cookie_header(&options(false), "v").unwrap();
        assert_eq!(header, "session=v; Path=/; Max-Age=60; HttpOnly");
    }
}
