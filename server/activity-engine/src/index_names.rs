//! Resolve raw/enriched index names for a repository and source kind.
//!
//! Explicit names always win; missing ones are derived as `<source>_<repo>_raw`
//! and `<source>_<repo>`. Resolution never touches the registry it came from.

use crate::types::{IndexNameSet, IndexOverrides, SourceKind};

pub fn derived_raw(repo: &str, source: SourceKind) -> String {
  format!("{}_{}_raw", source, repo)
}

pub fn derived_enrich(repo: &str, source: SourceKind) -> String {
  format!("{}_{}", source, repo)
}

/// Combine explicit overrides with derived defaults.
pub fn resolve(repo: &str, source: SourceKind, overrides: &IndexOverrides) -> IndexNameSet {
  IndexNameSet {
    repo: repo.to_string(),
    source,
    raw_index: overrides
      .raw
      .clone()
      .unwrap_or_else(|| derived_raw(repo, source)),
    enrich_index: overrides
      .enrich
      .clone()
      .unwrap_or_else(|| derived_enrich(repo, source)),
  }
}

/// Repository name from a URL or path: last non-empty segment, `.git` stripped.
///
/// `https://github.com/chaoss/grimoirelab-perceval.git` -> `grimoirelab-perceval`.
pub fn repo_name_from_locator(locator: &str) -> Option<String> {
  let segment = locator
    .trim()
    .trim_end_matches('/')
    .rsplit(|c| c == '/' || c == ':')
    .next()?;
  let name = segment.strip_suffix(".git").unwrap_or(segment);
  if name.is_empty() {
    None
  } else {
    Some(name.to_string())
  }
}
