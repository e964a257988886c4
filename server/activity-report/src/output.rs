//! CSV output for the report tables.

use std::io::Write;
use std::path::{Path, PathBuf};

use activity_engine::MonthlyReport;
use activity_engine::RepoActivityRecord;
use serde::Serialize;
use tempfile::NamedTempFile;

use crate::error::ReportError;

pub const NEW_COMMITTER_HEADERS: [&str; 2] = ["Month", "Number of new commiters"];
pub const COMMITS_BY_AUTHOR_HEADERS: [&str; 3] = ["Month", "Author", "Number of commits"];
pub const RANKING_HEADERS: [&str; 5] = ["Name", "Commits", "Pull Requests", "Issues", "Total"];

/// Append `.csv` when the path has no extension.
pub fn with_csv_extension(path: &Path) -> PathBuf {
  if path.extension().is_some() {
    path.to_path_buf()
  } else {
    path.with_extension("csv")
  }
}

/// Write `rows` as CSV. Headers are always written, even for an empty table.
pub fn write_table<W: Write, S: Serialize>(
  writer: W,
  headers: &[&str],
  rows: &[S],
) -> Result<(), ReportError> {
  let mut wtr = csv::Writer::from_writer(writer);
  if rows.is_empty() {
    wtr.write_record(headers)?;
  }
  for row in rows {
    wtr.serialize(row)?;
  }
  wtr.flush().map_err(csv::Error::from)?;
  Ok(())
}

/// A table written next to its destination, not yet visible under its final name.
struct Staged {
  temp: NamedTempFile,
  path: PathBuf,
}

impl Staged {
  fn commit(self) -> Result<PathBuf, ReportError> {
    let path = self.path;
    self
      .temp
      .persist(&path)
      .map_err(|e| ReportError::io(&path, e.error))?;
    Ok(path)
  }
}

fn stage<S: Serialize>(path: &Path, headers: &[&str], rows: &[S]) -> Result<Staged, ReportError> {
  let path = with_csv_extension(path);
  let dir = match path.parent() {
    Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
    _ => PathBuf::from("."),
  };
  let mut temp = NamedTempFile::new_in(&dir).map_err(|e| ReportError::io(&path, e))?;
  write_table(temp.as_file_mut(), headers, rows)?;
  Ok(Staged { temp, path })
}

/// Write both monthly tables; returns the paths written.
///
/// Either both files appear or neither does.
pub fn write_monthly(
  report: &MonthlyReport,
  new_committers_path: &Path,
  commits_path: &Path,
) -> Result<(PathBuf, PathBuf), ReportError> {
  let a = stage(new_committers_path, &NEW_COMMITTER_HEADERS, &report.new_committers)?;
  let b = stage(commits_path, &COMMITS_BY_AUTHOR_HEADERS, &report.commits_by_author)?;

  let a = a.commit()?;
  match b.commit() {
    Ok(b) => Ok((a, b)),
    Err(e) => {
      let _ = std::fs::remove_file(&a);
      Err(e)
    }
  }
}

pub fn write_ranking(records: &[RepoActivityRecord], path: &Path) -> Result<PathBuf, ReportError> {
  stage(path, &RANKING_HEADERS, records)?.commit()
}

#[cfg(test)]
mod tests {
  use super::*;
  use activity_engine::types::{CommitsByAuthorRow, NewCommitterRow};

  fn render<S: Serialize>(headers: &[&str], rows: &[S]) -> String {
    let mut buf = Vec::new();
    write_table(&mut buf, headers, rows).unwrap();
    String::from_utf8(buf).unwrap()
  }

  #[test]
  fn serde_headers_match_declared_headers() {
    let out = render(
      &NEW_COMMITTER_HEADERS,
      &[NewCommitterRow {
        month: "January-2023".into(),
        new_committers: 2,
      }],
    );
    assert_eq!(out, "Month,Number of new commiters\nJanuary-2023,2\n");

    let out = render(
      &COMMITS_BY_AUTHOR_HEADERS,
      &[CommitsByAuthorRow {
        month: "January-2023".into(),
        author: "Doe, Jane".into(),
        commits: 3,
      }],
    );
    assert_eq!(out, "Month,Author,Number of commits\nJanuary-2023,\"Doe, Jane\",3\n");

    let out = render(&RANKING_HEADERS, &[RepoActivityRecord::new("x", 10, 2, 3)]);
    assert_eq!(out, "Name,Commits,Pull Requests,Issues,Total\nx,10,2,3,15\n");
  }

  #[test]
  fn empty_table_is_header_only() {
    let out = render::<RepoActivityRecord>(&RANKING_HEADERS, &[]);
    assert_eq!(out, "Name,Commits,Pull Requests,Issues,Total\n");
  }

  #[test]
  fn csv_extension_only_when_missing() {
    assert_eq!(with_csv_extension(Path::new("out/report")), PathBuf::from("out/report.csv"));
    assert_eq!(with_csv_extension(Path::new("ranking.csv")), PathBuf::from("ranking.csv"));
  }

  #[test]
  fn writes_monthly_files() {
    let dir = tempfile::tempdir().unwrap();
    let report = MonthlyReport::default();
    let (a, b) = write_monthly(&report, &dir.path().join("new"), &dir.path().join("commits")).unwrap();
    assert_eq!(std::fs::read_to_string(a).unwrap(), "Month,Number of new commiters\n");
    assert_eq!(std::fs::read_to_string(b).unwrap(), "Month,Author,Number of commits\n");
  }

  #[test]
  fn second_table_failure_leaves_no_files() {
    let dir = tempfile::tempdir().unwrap();
    let report = MonthlyReport {
      new_committers: vec![NewCommitterRow {
        month: "January-2023".into(),
        new_committers: 1,
      }],
      commits_by_author: vec![],
    };
    let err = write_monthly(
      &report,
      &dir.path().join("new"),
      &dir.path().join("missing_dir").join("commits"),
    )
    .unwrap_err();

    assert!(matches!(err, ReportError::Io { .. }));
    assert!(!dir.path().join("new.csv").exists());
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
  }

  #[test]
  fn ranking_leaves_only_the_final_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_ranking(&[], &dir.path().join("ranking")).unwrap();
    assert_eq!(path, dir.path().join("ranking.csv"));
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
  }
}
