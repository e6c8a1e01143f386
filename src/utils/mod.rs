//! Utility functions and helpers.

pub mod http;

use url::Url;

use crate::error::{AppError, Result};

/// Append path segments to a base URL, percent-encoding each segment.
///
/// Trailing slashes on the base are ignored, so `https://h/v1` and
/// `https://h/v1/` produce the same result.
pub fn join_segments<'a>(base: &str, segments: impl IntoIterator<Item = &'a str>) -> Result<Url> {
    let mut url = Url::parse(base)?;
    url.path_segments_mut()
        .map_err(|_| AppError::config(format!("'{base}' cannot be used as a base URL")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// Live-data endpoint for a resort or park scope.
pub fn live_data_url(base: &str, scope_id: &str) -> Result<Url> {
    join_segments(base, ["entity", scope_id, "live"])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_live_data_url() {
        let url = live_data_url("https://api.example.com/v1", "resort-1").unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/v1/entity/resort-1/live");
    }

    #[test]
    fn test_live_data_url_trailing_slash() {
        let url = live_data_url("https://api.example.com/v1/", "resort-1").unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/v1/entity/resort-1/live");
    }

    #[test]
    fn test_join_segments_encodes() {
        let url = join_segments("https://h.example/v4", ["values", "Wait Log!A1"]).unwrap();
        assert_eq!(url.as_str(), "https://h.example/v4/values/Wait%20Log!A1");
    }

    #[test]
    fn test_join_segments_rejects_opaque_base() {
        assert!(join_segments("mailto:someone@example.com", ["x"]).is_err());
    }
}
