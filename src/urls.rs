use url::Url;

/// Canonicalize a user-supplied site URL into the crawl root:
/// trim, default to https when no scheme is given, drop one trailing slash.
pub fn normalize_site_input(raw: &str) -> String {
    let trimmed = raw.trim();
    let mut site = if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    };
    if site.ends_with('/') {
        site.pop();
    }
    site
}

/// Resolve a raw image reference against the page it was found on.
///
/// Returns `None` for empty references and `data:` URIs; callers drop
/// those candidates. Rules are checked in order: protocol-relative,
/// already absolute, root-relative, then standard relative resolution.
pub fn to_absolute(base: &Url, raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    let lower = raw.to_lowercase();
    if lower.starts_with("data:") {
        return None;
    }
    if let Some(rest) = raw.strip_prefix("//") {
        return Some(format!("{}://{}", base.scheme(), rest));
    }
    if lower.starts_with("http://") || lower.starts_with("https://") {
        return Some(raw.to_string());
    }
    if raw.starts_with('/') {
        let host = base.host_str()?;
        return Some(format!("{}://{}{}", base.scheme(), host, raw));
    }
    base.join(raw).ok().map(|u| u.to_string())
}
