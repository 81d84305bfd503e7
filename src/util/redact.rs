use url::Url;

const USER_PLACEHOLDER: &str = "redacted";

// Drops the password and masks the username: https://redacted@host/db
pub fn redact_url(raw: &str) -> String {
    let Ok(mut url) = Url::parse(raw) else {
        return redact_unparsed(raw);
    };
    if url.password().is_some() {
        let _ = url.set_password(None);
    }
    if !url.username().is_empty() {
        let _ = url.set_username(USER_PLACEHOLDER);
    }
    url.to_string()
}

// Unparseable input still loses everything before an `@` in the authority.
fn redact_unparsed(raw: &str) -> String {
    let (scheme, rest) = match raw.split_once("://") {
        Some((s, r)) => (format!("{s}://"), r),
        None => (String::new(), raw),
    };
    let authority_end = rest.find('/').unwrap_or(rest.len());
    match rest[..authority_end].rfind('@') {
        Some(at) => format!("{}{}@{}", scheme, USER_PLACEHOLDER, &rest[at + 1..]),
        None => raw.to_string(),
    }
}
