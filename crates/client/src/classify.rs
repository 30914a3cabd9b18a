//! Request classification.
//!
//! Pure and synchronous: the result depends only on the request method and
//! the URL path.

use offgrid_core::{AppConfig, Request};
use serde::Serialize;

/// What kind of resource a cacheable request targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum AssetKind {
    Generic,
    /// Path ends in a configured static-asset suffix; content never changes
    /// under the same URL.
    ImmutableAsset,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, schemars::JsonSchema)]
pub struct Classification {
    pub cacheable: bool,
    pub kind: AssetKind,
}

impl Classification {
    pub const UNCACHEABLE: Classification = Classification { cacheable: false, kind: AssetKind::Generic };
}

/// Tags requests as cacheable or not, and as immutable assets by path suffix.
#[derive(Debug, Clone)]
pub struct RequestClassifier {
    suffixes: Vec<String>,
}

impl RequestClassifier {
    pub fn new<I, S>(suffixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self { suffixes: suffixes.into_iter().map(|s| s.as_ref().to_ascii_lowercase()).collect() }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(&config.immutable_suffixes)
    }

    pub fn classify(&self, request: &Request) -> Classification {
        if !request.is_safe() {
            return Classification::UNCACHEABLE;
        }

        let path = request.url().path().to_ascii_lowercase();
        let kind = if self.suffixes.iter().any(|suffix| path.ends_with(suffix.as_str())) {
            AssetKind::ImmutableAsset
        } else {
            AssetKind::Generic
        };

        Classification { cacheable: true, kind }
    }
}

/// Lower-cased extension of the last path segment, if any.
pub fn path_extension(request: &Request) -> Option<String> {
    let segment = request.url().path_segments()?.next_back()?;
    let (stem, ext) = segment.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::parse_request;

    fn classifier() -> RequestClassifier {
        RequestClassifier::from_config(&AppConfig::default())
    }

    #[test]
    fn test_non_get_is_uncacheable() {
        for method in ["POST", "PUT", "DELETE", "PATCH", "HEAD", "OPTIONS"] {
            let request = parse_request(method, "https://app.test/logo.png").unwrap();
            assert_eq!(classifier().classify(&request), Classification::UNCACHEABLE, "{method}");
        }
    }

    #[test]
    fn test_image_suffix_is_immutable_asset() {
        let request = parse_request("GET", "https://app.test/img/Logo.PNG").unwrap();
        let classification = classifier().classify(&request);
        assert!(classification.cacheable);
        assert_eq!(classification.kind, AssetKind::ImmutableAsset);
    }

    #[test]
    fn test_query_does_not_affect_suffix_match() {
        let asset = parse_request("GET", "https://app.test/logo.png?v=3").unwrap();
        assert_eq!(classifier().classify(&asset).kind, AssetKind::ImmutableAsset);

        let generic = parse_request("GET", "https://app.test/render?file=logo.png").unwrap();
        assert_eq!(classifier().classify(&generic).kind, AssetKind::Generic);
    }

    #[test]
    fn test_document_is_generic() {
        let request = parse_request("GET", "https://app.test/index.html").unwrap();
        let classification = classifier().classify(&request);
        assert!(classification.cacheable);
        assert_eq!(classification.kind, AssetKind::Generic);
    }

    #[test]
    fn test_custom_suffixes() {
        let classifier = RequestClassifier::new([".JS"]);
        let request = parse_request("GET", "https://app.test/bundle.js").unwrap();
        assert_eq!(classifier.classify(&request).kind, AssetKind::ImmutableAsset);
    }

    #[test]
    fn test_path_extension() {
        let ext = |u: &str| path_extension(&parse_request("GET", u).unwrap());
        assert_eq!(ext("https://app.test/a/photo.JPEG"), Some("jpeg".into()));
        assert_eq!(ext("https://app.test/a/"), None);
        assert_eq!(ext("https://app.test/.hidden"), None);
        assert_eq!(ext("https://app.test/api"), None);
    }
}
