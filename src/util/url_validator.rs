use thiserror::Error;
use url::Url;

/// Errors that can occur during URL validation.
#[derive(Error, Debug)]
pub enum UrlValidationError {
    /// The URL string could not be parsed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    /// The URL uses a scheme other than http or https.
    #[error("Unsupported scheme: {0} (only http/https allowed)")]
    UnsupportedScheme(String),
    /// The URL has no host component.
    #[error("URL has no host")]
    MissingHost,
}

/// Validates a URL string for use as a listing source or link base.
///
/// Unlike a feed reader, the publisher talks to a build server it is
/// configured for, which is usually on a private network, so private and
/// loopback hosts are accepted. Only the scheme and presence of a host are
/// enforced.
///
/// # Examples
///
/// ```
/// use buildfeed::util::validate_url;
///
/// let url = validate_url("https://builds.example.com/svnkit/").unwrap();
/// assert_eq!(url.host_str(), Some("builds.example.com"));
///
/// assert!(validate_url("file:///etc/passwd").is_err());
/// ```
pub fn validate_url(url_str: &str) -> Result<Url, UrlValidationError> {
    let url = Url::parse(url_str)?;

    match url.scheme() {
        "http" | "https" => {}
        scheme => return Err(UrlValidationError::UnsupportedScheme(scheme.to_owned())),
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(UrlValidationError::MissingHost);
    }

    Ok(url)
}

/// Joins a base URL and a relative segment with exactly one `/` between them.
///
/// This is plain string concatenation so rendered links are reproducible
/// byte for byte regardless of how the base was written.
///
/// ```
/// use buildfeed::util::join_url;
///
/// assert_eq!(join_url("https://x.org/dl/", "a.zip"), "https://x.org/dl/a.zip");
/// assert_eq!(join_url("https://x.org/dl", "/a.zip"), "https://x.org/dl/a.zip");
/// ```
pub fn join_url(base: &str, segment: &str) -> String {
    let base = base.trim_end_matches('/');
    let segment = segment.trim_start_matches('/');
    format!("{base}/{segment}")
}
