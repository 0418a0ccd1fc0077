use chrono::{DateTime, Utc};
use std::fmt;
use thiserror::Error;

/// Longest build id accepted from a listing.
const MAX_BUILD_ID_LEN: usize = 128;

/// Reasons a raw listing entry is refused as a build id.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BuildIdError {
    #[error("build id is empty")]
    Empty,
    #[error("build id exceeds {} bytes", MAX_BUILD_ID_LEN)]
    TooLong,
    #[error("build id must start with a letter or digit")]
    BadStart,
    #[error("build id contains forbidden character {0:?}")]
    ForbiddenChar(char),
}

/// Identifier of one published build, e.g. `1.1.0.2345`.
///
/// Build ids come straight out of scraped HTML and are then used to build
/// both remote URLs and local paths, so only `[A-Za-z0-9._-]` is allowed and
/// the first character must be alphanumeric. That rules out `..`, `/` and
/// anything that would need escaping.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BuildId(String);

impl BuildId {
    pub fn parse(raw: &str) -> Result<Self, BuildIdError> {
        let first = raw.chars().next().ok_or(BuildIdError::Empty)?;
        if raw.len() > MAX_BUILD_ID_LEN {
            return Err(BuildIdError::TooLong);
        }
        if !first.is_ascii_alphanumeric() {
            return Err(BuildIdError::BadStart);
        }
        if let Some(c) = raw
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')))
        {
            return Err(BuildIdError::ForbiddenChar(c));
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BuildId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The three archives released for every build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactNames {
    /// Self-contained library archive; its presence gates publication.
    pub standalone: String,
    pub source: String,
    /// Eclipse plugin update site.
    pub eclipse: String,
}

impl ArtifactNames {
    pub fn new(prefix: &str, id: &BuildId) -> Self {
        Self {
            standalone: format!("{prefix}_{id}{STANDALONE_SUFFIX}"),
            source: format!("{prefix}_{id}.src.zip"),
            eclipse: format!("{prefix}_{id}.eclipse.zip"),
        }
    }
}

/// Filename suffix of the standalone archive, shared with the local scan.
pub const STANDALONE_SUFFIX: &str = ".standalone.zip";

/// A build that is ready to be announced.
///
/// Only constructed once the changelog was fetched and the standalone
/// archive is present locally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildItem {
    pub build_id: BuildId,
    /// Notes for the newest version only; empty when the changelog has no
    /// `=`-delimited sections.
    pub changelog_excerpt: String,
    pub artifacts: ArtifactNames,
    /// Modification time of the local standalone archive.
    pub published_at: DateTime<Utc>,
}
