//! Repository registry documents.
//!
//! Two JSON shapes are accepted, both keeping document order (it is the
//! ranking tie-break order):
//!
//! - registry: `{ "<owner>": { "<repo>": { "url": ..., "git_enrich": ..., ... } } }`
//! - index file: `{ "<repo>": { "git_enrich": ..., "github_enrich": ... } }`

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::EngineError;
use crate::index_names;
use crate::types::{IndexNameSet, IndexOverrides, SourceKind};

/// One repository entry as written in a registry document. Unknown fields are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RepoEntry {
  #[serde(default)]
  pub url: Option<String>,
  #[serde(default)]
  pub owner: Option<String>,
  #[serde(default)]
  pub git_raw: Option<String>,
  #[serde(default)]
  pub git_enrich: Option<String>,
  #[serde(default)]
  pub github_raw: Option<String>,
  #[serde(default)]
  pub github_enrich: Option<String>,
}

/// Immutable description of a repository: where it lives and which index names were pinned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoDescriptor {
  pub name: String,
  pub owner: Option<String>,
  pub url: Option<String>,
  pub git: IndexOverrides,
  pub github: IndexOverrides,
}

impl RepoDescriptor {
  pub fn new(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      owner: None,
      url: None,
      git: IndexOverrides::default(),
      github: IndexOverrides::default(),
    }
  }

  fn from_entry(name: &str, entry: RepoEntry, owner: Option<String>) -> Self {
    Self {
      name: name.to_string(),
      owner: owner.or(entry.owner),
      url: entry.url,
      git: IndexOverrides {
        raw: entry.git_raw,
        enrich: entry.git_enrich,
      },
      github: IndexOverrides {
        raw: entry.github_raw,
        enrich: entry.github_enrich,
      },
    }
  }

  pub fn overrides(&self, source: SourceKind) -> &IndexOverrides {
    match source {
      SourceKind::Git => &self.git,
      SourceKind::Github => &self.github,
    }
  }

  /// Resolved index names for `source`.
  pub fn indices(&self, source: SourceKind) -> IndexNameSet {
    index_names::resolve(&self.name, source, self.overrides(source))
  }
}

fn parse_object(json: &str, origin: &str) -> Result<Map<String, Value>, EngineError> {
  serde_json::from_str(json)
    .map_err(|e| EngineError::input_format(origin, format!("expected a JSON object: {}", e)))
}

fn parse_entry(value: Value, origin: &str, name: &str) -> Result<RepoEntry, EngineError> {
  serde_json::from_value(value)
    .map_err(|e| EngineError::input_format(format!("{}: {}", origin, name), e.to_string()))
}

/// Parse an owner-grouped registry, as used when indices are to be created.
///
/// Every repository needs a `url` for git ingestion.
pub fn parse_registry(json: &str, origin: &str) -> Result<Vec<RepoDescriptor>, EngineError> {
  let mut repos = Vec::new();
  for (owner, group) in parse_object(json, origin)? {
    let group = match group {
      Value::Object(map) => map,
      _ => {
        return Err(EngineError::input_format(
          format!("{}: {}", origin, owner),
          "owner entry must be an object of repositories",
        ))
      }
    };
    for (name, value) in group {
      let entry = parse_entry(value, origin, &name)?;
      if entry.url.as_deref().map_or(true, str::is_empty) {
        return Err(EngineError::config(
          &format!("{}.url", name),
          "repository url is required to create indices",
        ));
      }
      repos.push(RepoDescriptor::from_entry(&name, entry, Some(owner.clone())));
    }
  }
  Ok(repos)
}

/// Parse a flat `repo -> index names` document; missing names are derived later.
pub fn parse_index_file(json: &str, origin: &str) -> Result<Vec<RepoDescriptor>, EngineError> {
  parse_object(json, origin)?
    .into_iter()
    .map(|(name, value)| {
      let entry = parse_entry(value, origin, &name)?;
      Ok(RepoDescriptor::from_entry(&name, entry, None))
    })
    .collect()
}
