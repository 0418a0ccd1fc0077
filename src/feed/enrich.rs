use chrono::{DateTime, Utc};
use std::path::PathBuf;

use super::build::{ArtifactNames, BuildId, BuildItem};
use super::changelog::extract_excerpt;
use super::fetcher::Fetcher;
use crate::util::join_url;

/// Assembles a [`BuildItem`] from the remote changelog and the local archive.
///
/// A build is announced only once its standalone archive has been uploaded
/// to the artifact directory; being listed on the build server is not enough.
#[derive(Debug, Clone)]
pub struct Enricher {
    fetcher: Fetcher,
    listing_url: String,
    artifact_dir: PathBuf,
    artifact_prefix: String,
}

impl Enricher {
    pub fn new(
        fetcher: Fetcher,
        listing_url: impl Into<String>,
        artifact_dir: impl Into<PathBuf>,
        artifact_prefix: impl Into<String>,
    ) -> Self {
        Self {
            fetcher,
            listing_url: listing_url.into(),
            artifact_dir: artifact_dir.into(),
            artifact_prefix: artifact_prefix.into(),
        }
    }

    pub fn artifact_names(&self, id: &BuildId) -> ArtifactNames {
        ArtifactNames::new(&self.artifact_prefix, id)
    }

    /// Returns `None` when the changelog cannot be fetched or the standalone
    /// archive is missing locally. Neither case is an error.
    pub async fn enrich(&self, id: &BuildId) -> Option<BuildItem> {
        let artifacts = self.artifact_names(id);

        let changelog_url = join_url(&join_url(&self.listing_url, id.as_str()), "changelog.txt");
        let changelog = match self.fetcher.fetch_text(&changelog_url).await {
            Ok(text) => text,
            Err(e) => {
                tracing::debug!(build = %id, url = %changelog_url, error = %e, "No changelog, skipping build");
                return None;
            }
        };

        let artifact_path = self.artifact_dir.join(&artifacts.standalone);
        let published_at = match tokio::fs::metadata(&artifact_path).await {
            Ok(meta) if meta.is_file() => match meta.modified() {
                Ok(mtime) => DateTime::<Utc>::from(mtime),
                Err(e) => {
                    tracing::warn!(path = %artifact_path.display(), error = %e, "Artifact has no modification time");
                    return None;
                }
            },
            _ => {
                tracing::debug!(build = %id, path = %artifact_path.display(), "Artifact not uploaded yet, skipping build");
                return None;
            }
        };

        Some(BuildItem {
            build_id: id.clone(),
            changelog_excerpt: extract_excerpt(&changelog),
            artifacts,
            published_at,
        })
    }
}
