use std::cmp::Ordering;
use std::path::Path;

use super::build::{BuildId, STANDALONE_SUFFIX};

/// Finds the newest build from local standalone archives alone.
///
/// Used when the build server cannot be reached. Files are matched as
/// `<prefix>_<id>.standalone.zip`; ids that fail validation are ignored.
/// Returns `None` when the directory is missing or holds no archives.
pub async fn scan_latest(artifact_dir: &Path, prefix: &str) -> Option<BuildId> {
    let mut entries = match tokio::fs::read_dir(artifact_dir).await {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!(path = %artifact_dir.display(), error = %e, "Cannot scan artifact directory");
            return None;
        }
    };

    let head = format!("{prefix}_");
    let mut ids = Vec::new();
    loop {
        match entries.next_entry().await {
            Ok(Some(entry)) => {
                let name = entry.file_name();
                let Some(name) = name.to_str() else { continue };
                let Some(raw) = name
                    .strip_prefix(&head)
                    .and_then(|rest| rest.strip_suffix(STANDALONE_SUFFIX))
                else {
                    continue;
                };
                match BuildId::parse(raw) {
                    Ok(id) => ids.push(id),
                    Err(e) => tracing::debug!(file = %name, error = %e, "Ignoring archive with invalid build id"),
                }
            }
            Ok(None) => break,
            Err(e) => {
                tracing::warn!(path = %artifact_dir.display(), error = %e, "Artifact directory scan interrupted");
                break;
            }
        }
    }

    ids.into_iter().max_by(|a, b| compare_build_ids(a.as_str(), b.as_str()))
}

/// Orders ids the way the download page always has: two purely numeric ids
/// compare as numbers, anything else compares byte-wise.
///
/// Purely numeric ids rank above all others so the order stays total when
/// both kinds share a directory; otherwise `10 > 9 > 1a > 10` would make the
/// pick depend on directory order. Numeric ties such as `7` and `007` fall
/// back to bytes.
///
/// ```
/// use std::cmp::Ordering;
/// use buildfeed::feed::compare_build_ids;
///
/// assert_eq!(compare_build_ids("205", "37"), Ordering::Greater);
/// assert_eq!(compare_build_ids("1.1.0.37", "1.1.0.205"), Ordering::Greater);
/// assert_eq!(compare_build_ids("9", "1a"), Ordering::Greater);
/// ```
pub fn compare_build_ids(a: &str, b: &str) -> Ordering {
    match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
        (Ok(_), Err(_)) => Ordering::Greater,
        (Err(_), Ok(_)) => Ordering::Less,
        (Err(_), Err(_)) => a.cmp(b),
    }
}
