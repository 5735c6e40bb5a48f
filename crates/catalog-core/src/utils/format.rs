/// Derive a URL-safe slug from a title or name.
///
/// Lowercases ASCII, collapses every run of non-alphanumeric characters into
/// a single hyphen and trims leading/trailing hyphens.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_hyphen = false;

    for c in text.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_hyphen = true;
        }
    }

    slug
}

/// Resolve an asset path returned by the API into an absolute URL.
///
/// Absolute `http(s)` URLs pass through. Relative paths are served from the
/// API's public storage directory.
pub fn asset_url(asset_base: &str, path: &str) -> Option<String> {
    let path = path.trim();
    if path.is_empty() {
        return None;
    }
    if path.starts_with("http://") || path.starts_with("https://") {
        return Some(path.to_string());
    }
    let relative = path.trim_start_matches('/');
    let relative = relative.strip_prefix("storage/").unwrap_or(relative);
    Some(format!(
        "{}/storage/{}",
        asset_base.trim_end_matches('/'),
        relative
    ))
}

/// Percent-encode a value for use as a single URL path segment
pub fn encode_path_segment(segment: &str) -> String {
    url::form_urlencoded::byte_serialize(segment.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

/// Initials for an avatar placeholder, e.g. "Ada Lovelace" -> "AL"
pub fn initials(name: &str, fallback: &str) -> String {
    let initials: String = name
        .split_whitespace()
        .filter_map(|word| word.chars().next())
        .flat_map(|c| c.to_uppercase())
        .collect();
    if initials.is_empty() {
        fallback.to_string()
    } else {
        initials
    }
}

/// Case-insensitive substring search
pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Truncate a string to a maximum length, adding ellipsis if needed
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    }
}
