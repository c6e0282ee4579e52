use crate::ConfigError;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

/// Session cookies sent unchanged with every request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    cookies: BTreeMap<String, String>,
}

/// Accepted cookie file layouts
///
/// Either a plain `{"name": "value"}` object or the list of
/// `{"name": ..., "value": ...}` records browser exporters produce.
#[derive(Deserialize)]
#[serde(untagged)]
enum CookieFile {
    Map(BTreeMap<String, String>),
    Records(Vec<CookieRecord>),
}

#[derive(Deserialize)]
struct CookieRecord {
    name: String,
    value: String,
}

impl Credentials {
    /// Creates credentials with no cookies
    pub fn empty() -> Self {
        Self::default()
    }

    /// Creates credentials from name/value pairs
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            cookies: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Parses a JSON cookie file's contents
    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        let cookies = match serde_json::from_str::<CookieFile>(content)? {
            CookieFile::Map(map) => map,
            CookieFile::Records(records) => records
                .into_iter()
                .map(|record| (record.name, record.value))
                .collect(),
        };
        Ok(Self { cookies })
    }

    /// Loads a JSON cookie file from disk
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&content)
    }

    pub fn len(&self) -> usize {
        self.cookies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }

    /// Renders the `Cookie` request header value, if there is anything to send
    pub fn cookie_header(&self) -> Option<String> {
        if self.cookies.is_empty() {
            return None;
        }

        Some(
            self.cookies
                .iter()
                .map(|(name, value)| format!("{}={}", name, value))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_object_layout() {
        let creds = Credentials::from_json(r#"{"session": "abc", "age_ok": "1"}"#).unwrap();
        assert_eq!(creds.len(), 2);
        assert_eq!(
            creds.cookie_header(),
            Some("age_ok=1; session=abc".to_string())
        );
    }

    #[test]
    fn test_parse_record_layout() {
        let creds = Credentials::from_json(
            r#"[{"name": "session", "value": "abc", "domain": ".example.com"}]"#,
        )
        .unwrap();
        assert_eq!(creds.cookie_header(), Some("session=abc".to_string()));
    }

    #[test]
    fn test_empty_credentials_send_no_header() {
        assert_eq!(Credentials::empty().cookie_header(), None);
        assert!(Credentials::from_json("{}").unwrap().is_empty());
    }

    #[test]
    fn test_invalid_json_is_rejected() {
        let result = Credentials::from_json("not json");
        assert!(matches!(result, Err(ConfigError::Cookies(_))));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(br#"{"token": "xyz"}"#).unwrap();
        file.flush().unwrap();

        let creds = Credentials::load(file.path()).unwrap();
        assert_eq!(creds, Credentials::from_pairs([("token", "xyz")]));
    }

    #[test]
    fn test_load_missing_file() {
        let result = Credentials::load(Path::new("/nonexistent/cookies.json"));
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }
}
