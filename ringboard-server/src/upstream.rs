//! Errors shared by the upstream provider clients

use thiserror::Error;

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("provider returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("unexpected response: {0}")]
    InvalidResponse(String),
    #[error("invalid base url: {0}")]
    InvalidUrl(String),
}

/// `base` with each segment appended percent-encoded, so an id containing
/// `/`, `?` or `#` stays a single path segment.
pub(crate) fn endpoint(base: &str, segments: &[&str]) -> Result<reqwest::Url, UpstreamError> {
    let mut url =
        reqwest::Url::parse(base).map_err(|e| UpstreamError::InvalidUrl(format!("{base}: {e}")))?;
    url.path_segments_mut()
        .map_err(|()| UpstreamError::InvalidUrl(base.to_string()))?
        .pop_if_empty()
        .extend(segments.iter().copied());
    Ok(url)
}

/// Turn a non-success response into [`UpstreamError::Status`], keeping a
/// bounded slice of the body for logs.
pub(crate) async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, UpstreamError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let mut body = resp.text().await.unwrap_or_default();
    if body.len() > 512 {
        let mut cut = 512;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        body.truncate(cut);
    }
    Err(UpstreamError::Status {
        status: status.as_u16(),
        body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joins_segments() {
        let url = endpoint("https://api.vapi.ai", &["call", "call-1"]).unwrap();
        assert_eq!(url.as_str(), "https://api.vapi.ai/call/call-1");

        let url = endpoint("https://hub.test/api/", &["v1", "locations", "loc-1"]).unwrap();
        assert_eq!(url.as_str(), "https://hub.test/api/v1/locations/loc-1");
    }

    #[test]
    fn test_endpoint_encodes_ids() {
        let url = endpoint("https://api.vapi.ai", &["call", "a/../b?x#y"]).unwrap();
        assert_eq!(url.as_str(), "https://api.vapi.ai/call/a%2F..%2Fb%3Fx%23y");
        assert_eq!(url.path_segments().unwrap().count(), 2);
    }

    #[test]
    fn test_endpoint_rejects_bad_base() {
        assert!(matches!(
            endpoint("not a url", &["call"]),
            Err(UpstreamError::InvalidUrl(_))
        ));
    }
}
