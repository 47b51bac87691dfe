// src/git/tags.rs

use std::path::Path;

use tracing::debug;

use super::VersionControl;
use crate::plan::TagSet;
use crate::types::Arch;

const SHORT_COMMIT_LEN: usize = 7;

/// Resolve the tag-template values for the checkout in `dir`.
///
/// Each git query is independent: a failing one leaves only its own field
/// empty. Repositories without tags therefore get empty `tag`/`tag_full`.
pub async fn resolve_tags(vcs: &dyn VersionControl, dir: &Path, host_arch: Arch) -> TagSet {
    let commit_full = vcs.head_commit(dir).await.unwrap_or_else(|e| {
        debug!(dir = %dir.display(), error = %e, "no commit hash");
        String::new()
    });
    let tag_full = vcs.describe(dir, false).await.unwrap_or_else(|e| {
        debug!(dir = %dir.display(), error = %e, "no describe output");
        String::new()
    });
    let tag = vcs.describe(dir, true).await.unwrap_or_else(|e| {
        debug!(dir = %dir.display(), error = %e, "no nearest tag");
        String::new()
    });

    TagSet {
        arch: host_arch.as_str().to_string(),
        commit_short: commit_full.chars().take(SHORT_COMMIT_LEN).collect(),
        commit_full,
        tag,
        tag_full,
    }
}
