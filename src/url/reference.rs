use url::Url;

/// Schemes that never point at a fetchable page or asset
const IGNORED_SCHEMES: &[&str] = &["javascript:", "mailto:", "tel:", "data:"];

/// Resolves an attribute value to an absolute HTTP(S) URL
///
/// Returns None if the reference should be ignored:
/// - empty or fragment-only values
/// - javascript:, mailto:, tel: and data: references
/// - values that fail to parse, or resolve to a non-HTTP(S) scheme
///
/// # Examples
///
/// ```
/// use catalog_grabber::url::resolve_reference;
/// use url::Url;
///
/// let base = Url::parse("https://example.com/videos/").unwrap();
/// let resolved = resolve_reference("clip-1/", &base).unwrap();
/// assert_eq!(resolved.as_str(), "https://example.com/videos/clip-1/");
/// ```
pub fn resolve_reference(value: &str, base: &Url) -> Option<Url> {
    let value = value.trim();

    if value.is_empty() || value.starts_with('#') {
        return None;
    }

    let lowered = value.to_ascii_lowercase();
    if IGNORED_SCHEMES
        .iter()
        .any(|scheme| lowered.starts_with(scheme))
    {
        return None;
    }

    let resolved = base.join(value).ok()?;
    match resolved.scheme() {
        "http" | "https" => Some(resolved),
        _ => None,
    }
}
