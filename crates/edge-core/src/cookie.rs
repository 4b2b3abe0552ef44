//! Request cookie jar and `Set-Cookie` serialization.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, TimeZone, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// `SameSite` attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SameSite {
    Strict,
    Lax,
    None,
}

impl SameSite {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Strict => "Strict",
            Self::Lax => "Lax",
            Self::None => "None",
        }
    }
}

/// Unit for a relative `Max-Age`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaxAgeUnit {
    Seconds,
    Minutes,
    Hours,
    Days,
    Weeks,
}

impl MaxAgeUnit {
    fn seconds(&self) -> i64 {
        match self {
            Self::Seconds => 1,
            Self::Minutes => 60,
            Self::Hours => 3_600,
            Self::Days => 86_400,
            Self::Weeks => 604_800,
        }
    }
}

/// Cookie expiry, either absolute or relative.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expiry {
    /// `Max-Age` in seconds.
    MaxAge(i64),
    /// `Max-Age` as a count of `unit`.
    MaxAgeIn(i64, MaxAgeUnit),
    /// `Expires` at a point in time.
    At(DateTime<Utc>),
}

/// Attributes for a `Set-Cookie` header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CookieOptions {
    pub domain: Option<String>,
    pub path: Option<String>,
    pub expiry: Option<Expiry>,
    pub same_site: Option<SameSite>,
    pub secure: bool,
    pub http_only: bool,
}

impl CookieOptions {
    /// Empty option set.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_max_age(mut self, secs: i64) -> Self {
        self.expiry = Some(Expiry::MaxAge(secs));
        self
    }

    pub fn with_max_age_in(mut self, count: i64, unit: MaxAgeUnit) -> Self {
        self.expiry = Some(Expiry::MaxAgeIn(count, unit));
        self
    }

    pub fn with_expires(mut self, at: DateTime<Utc>) -> Self {
        self.expiry = Some(Expiry::At(at));
        self
    }

    pub fn with_same_site(mut self, same_site: SameSite) -> Self {
        self.same_site = Some(same_site);
        self
    }

    pub fn secure(mut self) -> Self {
        self.secure = true;
        self
    }

    pub fn http_only(mut self) -> Self {
        self.http_only = true;
        self
    }
}

/// A cookie value read from the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieValue {
    value: String,
}

impl CookieValue {
    /// Raw decoded value.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Decode the value as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Option<T> {
        serde_json::from_str(&self.value).ok()
    }

    /// Parse the value as a number.
    pub fn number(&self) -> Option<f64> {
        self.value.parse().ok()
    }
}

/// Cookie jar: cookies sent by the client plus pending `Set-Cookie` values.
#[derive(Debug, Clone, Default)]
pub struct Cookie {
    request: HashMap<String, String>,
    response: BTreeMap<String, String>,
}

impl Cookie {
    /// Parse the inbound `Cookie` header.
    pub fn parse(header: Option<&str>) -> Self {
        let mut request = HashMap::new();

        if let Some(header) = header {
            for part in header.split(';') {
                let part = part.trim();
                if part.is_empty() {
                    continue;
                }
                let (name, value) = part.split_once('=').unwrap_or((part, ""));
                request.insert(decode_uri_component(name.trim()), decode_uri_component(value.trim()));
            }
        }

        Self {
            request,
            response: BTreeMap::new(),
        }
    }

    /// Get a request cookie.
    pub fn get(&self, name: &str) -> Option<CookieValue> {
        self.request.get(name).map(|value| CookieValue {
            value: value.clone(),
        })
    }

    /// Every request cookie.
    pub fn get_all(&self) -> HashMap<String, CookieValue> {
        self.request
            .iter()
            .map(|(k, v)| (k.clone(), CookieValue { value: v.clone() }))
            .collect()
    }

    /// Check if the request carried a cookie.
    pub fn has(&self, name: &str) -> bool {
        self.request.contains_key(name)
    }

    /// Record a `Set-Cookie` for `name`; a later call for the same name
    /// replaces the earlier one.
    pub fn set(&mut self, name: &str, value: &str, options: &CookieOptions) {
        let encoded = encode_uri_component(value);
        self.response
            .insert(name.to_string(), create_set_cookie_value(name, &encoded, options));
    }

    /// Record a `Set-Cookie` whose value is `value` serialized as JSON.
    pub fn set_json<T: Serialize>(
        &mut self,
        name: &str,
        value: &T,
        options: &CookieOptions,
    ) -> Result<(), serde_json::Error> {
        let json = serde_json::to_string(value)?;
        self.set(name, &json, options);
        Ok(())
    }

    /// Expire a cookie on the client.
    pub fn delete(&mut self, name: &str, options: &CookieOptions) {
        let options = CookieOptions {
            expiry: Some(Expiry::At(epoch())),
            ..options.clone()
        };
        self.set(name, "deleted", &options);
    }

    /// Pending `Set-Cookie` header values.
    pub fn headers(&self) -> Vec<String> {
        self.response.values().cloned().collect()
    }
}

fn epoch() -> DateTime<Utc> {
    Utc.timestamp_opt(0, 0).single().unwrap_or_default()
}

fn create_set_cookie_value(name: &str, value: &str, options: &CookieOptions) -> String {
    let mut parts = vec![format!("{}={}", name, value)];

    if let Some(domain) = &options.domain {
        parts.push(format!("Domain={}", domain));
    }

    match &options.expiry {
        Some(Expiry::MaxAge(secs)) => parts.push(format!("Max-Age={}", secs)),
        Some(Expiry::MaxAgeIn(count, unit)) => {
            parts.push(format!("Max-Age={}", count * unit.seconds()))
        }
        Some(Expiry::At(at)) => {
            parts.push(format!("Expires={}", at.format("%a, %d %b %Y %H:%M:%S GMT")))
        }
        None => {}
    }

    if options.http_only {
        parts.push("HttpOnly".to_string());
    }
    if let Some(path) = &options.path {
        parts.push(format!("Path={}", path));
    }
    if let Some(same_site) = options.same_site {
        parts.push(format!("SameSite={}", same_site.as_str()));
    }
    if options.secure {
        parts.push("Secure".to_string());
    }

    parts.join("; ")
}

/// Percent-encode everything except `A-Z a-z 0-9 - _ . ! ~ * ' ( )`.
fn encode_uri_component(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for byte in input.bytes() {
        match byte {
            b'A'..=b'Z'
            | b'a'..=b'z'
            | b'0'..=b'9'
            | b'-'
            | b'_'
            | b'.'
            | b'!'
            | b'~'
            | b'*'
            | b'\''
            | b'('
            | b')' => out.push(byte as char),
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}

/// Decode `%XX` escapes; malformed escapes are kept verbatim.
fn decode_uri_component(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            let hex = std::str::from_utf8(&bytes[i + 1..i + 3]).ok();
            if let Some(byte) = hex.and_then(|h| u8::from_str_radix(h, 16).ok()) {
                out.push(byte);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }

    String::from_utf8(out).unwrap_or_else(|_| input.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    // === Parsing Tests ===

    #[test]
    fn test_parse_request_cookies() {
        let jar = Cookie::parse(Some("session=abc123; theme=dark;  empty="));

        assert_eq!(jar.get("session").unwrap().value(), "abc123");
        assert_eq!(jar.get("theme").unwrap().value(), "dark");
        assert_eq!(jar.get("empty").unwrap().value(), "");
        assert!(!jar.has("missing"));
    }

    #[test]
    fn test_parse_decodes_values() {
        let jar = Cookie::parse(Some("name=hello%20world; data=%7B%22a%22%3A1%7D"));

        assert_eq!(jar.get("name").unwrap().value(), "hello world");
        let data: serde_json::Value = jar.get("data").unwrap().json().unwrap();
        assert_eq!(data["a"], 1);
    }

    #[test]
    fn test_parse_keeps_plus_and_bad_escapes() {
        let jar = Cookie::parse(Some("token=a+b%zz"));
        assert_eq!(jar.get("token").unwrap().value(), "a+b%zz");
    }

    #[test]
    fn test_number_value() {
        let jar = Cookie::parse(Some("count=42"));
        assert_eq!(jar.get("count").unwrap().number(), Some(42.0));
    }

    // === Set-Cookie Tests ===

    #[test]
    fn test_set_cookie_attributes() {
        let mut jar = Cookie::default();
        jar.set(
            "session",
            "a b",
            &CookieOptions::new()
                .with_domain("example.com")
                .with_path("/")
                .with_max_age_in(2, MaxAgeUnit::Hours)
                .with_same_site(SameSite::Lax)
                .secure()
                .http_only(),
        );

        assert_eq!(
            jar.headers(),
            vec!["session=a%20b; Domain=example.com; Max-Age=7200; HttpOnly; Path=/; SameSite=Lax; Secure"]
        );
    }

    #[test]
    fn test_set_replaces_same_name() {
        let mut jar = Cookie::default();
        jar.set("a", "1", &CookieOptions::new());
        jar.set("a", "2", &CookieOptions::new());

        assert_eq!(jar.headers(), vec!["a=2"]);
    }

    #[test]
    fn test_delete_expires_at_epoch() {
        let mut jar = Cookie::default();
        jar.delete("session", &CookieOptions::new().with_path("/"));

        assert_eq!(
            jar.headers(),
            vec!["session=deleted; Expires=Thu, 01 Jan 1970 00:00:00 GMT; Path=/"]
        );
    }

    #[test]
    fn test_set_json() {
        let mut jar = Cookie::default();
        jar.set_json("prefs", &serde_json::json!({"x": 1}), &CookieOptions::new())
            .unwrap();

        assert_eq!(jar.headers(), vec!["prefs=%7B%22x%22%3A1%7D"]);
    }
}
