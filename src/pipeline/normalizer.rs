use url::Url;

/// A URL as typed by the user plus the form that gets parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedUrl {
    /// Trimmed original input, echoed back to the caller.
    pub display: String,
    /// `display` with `https://` prepended when no scheme was given.
    pub normalized: String,
}

pub fn normalize_url_input(raw: &str) -> NormalizedUrl {
    let display = raw.trim().to_string();
    let normalized = if has_explicit_scheme(&display) {
        display.clone()
    } else {
        format!("https://{display}")
    };
    NormalizedUrl {
        display,
        normalized,
    }
}

fn has_explicit_scheme(input: &str) -> bool {
    let Some((scheme, _)) = input.split_once("://") else {
        return false;
    };
    let mut chars = scheme.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

/// Raw authority of a `scheme://authority/...` string, before any parsing.
pub fn raw_authority(normalized: &str) -> &str {
    let rest = normalized
        .split_once("://")
        .map(|(_, rest)| rest)
        .unwrap_or(normalized);
    let end = rest
        .find(|c| matches!(c, '/' | '?' | '#' | '\\'))
        .unwrap_or(rest.len());
    &rest[..end]
}

/// Lowercase host with `www.`, userinfo, port and trailing dot removed.
pub fn normalize_host(host: &str) -> String {
    let host = host.trim();
    let host = host.rsplit('@').next().unwrap_or(host);
    let host = if host.starts_with('[') {
        host
    } else {
        host.split(':').next().unwrap_or(host)
    };
    let host = host.trim_end_matches('.').to_lowercase();
    match host.strip_prefix("www.") {
        Some(bare) => bare.to_string(),
        None => host,
    }
}

/// Drop sentence punctuation that the link pattern swallows.
pub fn trim_link(link: &str) -> &str {
    link.trim_end_matches(|c| matches!(c, '.' | ',' | ';' | ':' | '!' | '?'))
}

/// Host of an embedded link, normalized. `None` when the link has no host.
pub fn link_host(link: &str) -> Option<String> {
    let candidate = if link.to_ascii_lowercase().starts_with("www.") {
        format!("https://{link}")
    } else {
        link.to_string()
    };
    let parsed = Url::parse(&candidate).ok()?;
    let host = normalize_host(parsed.host_str()?);
    if host.is_empty() {
        None
    } else {
        Some(host)
    }
}

/// Digits of a phone-like token when it has a plausible length.
pub fn normalize_phone(token: &str) -> Option<String> {
    let plus = token.starts_with('+');
    let digits: String = token.chars().filter(|c| c.is_ascii_digit()).collect();
    if !(9..=15).contains(&digits.len()) {
        return None;
    }
    Some(if plus { format!("+{digits}") } else { digits })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scheme_less_input_gets_https() {
        let n = normalize_url_input("  example.com/login ");
        assert_eq!(n.display, "example.com/login");
        assert_eq!(n.normalized, "https://example.com/login");
    }

    #[test]
    fn explicit_scheme_is_kept() {
        assert_eq!(
            normalize_url_input("ftp://192.168.0.1/login").normalized,
            "ftp://192.168.0.1/login"
        );
        assert_eq!(
            normalize_url_input("HTTP://Example.com").normalized,
            "HTTP://Example.com"
        );
        assert_eq!(
            normalize_url_input("1x://host").normalized,
            "https://1x://host"
        );
    }

    #[test]
    fn authority_stops_at_path() {
        assert_eq!(raw_authority("https://user@bank.com/a@b"), "user@bank.com");
        assert_eq!(raw_authority("https://bank.com?x=@"), "bank.com");
    }

    #[test]
    fn host_normalization() {
        assert_eq!(normalize_host("User@WWW.Example.COM:8080"), "example.com");
        assert_eq!(normalize_host("example.com."), "example.com");
        assert_eq!(normalize_host("wwwexample.com"), "wwwexample.com");
    }

    #[test]
    fn link_hosts() {
        assert_eq!(link_host("www.Bit.ly/abc").as_deref(), Some("bit.ly"));
        assert_eq!(
            link_host("https://me@secure-login.xyz:8443/x").as_deref(),
            Some("secure-login.xyz")
        );
        assert_eq!(link_host("https://"), None);
    }

    #[test]
    fn phone_lengths() {
        assert_eq!(normalize_phone("+39 333 123 4567").as_deref(), Some("+393331234567"));
        assert_eq!(normalize_phone("2024-01-01"), None);
    }
}
