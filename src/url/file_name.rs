use crate::sanitize::sanitize_segment;
use crate::UrlError;
use url::Url;

/// Derives the local file name for an asset from its URL
///
/// The name is the last non-empty path segment, with query string and
/// fragment ignored, reduced to filesystem-safe characters.
///
/// # Returns
///
/// * `Ok(String)` - A non-empty, single-segment file name
/// * `Err(UrlError::NoFileName)` - The path has no usable segment
///
/// # Examples
///
/// ```
/// use catalog_grabber::url::asset_file_name;
/// use url::Url;
///
/// let url = Url::parse("https://cdn.example.com/v/clip_4k.mp4?token=abc").unwrap();
/// assert_eq!(asset_file_name(&url).unwrap(), "clip_4k.mp4");
/// ```
pub fn asset_file_name(url: &Url) -> Result<String, UrlError> {
    let segment = url
        .path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
        .ok_or_else(|| UrlError::NoFileName(url.to_string()))?;

    let name = sanitize_segment(segment);
    if name.is_empty() {
        return Err(UrlError::NoFileName(url.to_string()));
    }

    Ok(name)
}
