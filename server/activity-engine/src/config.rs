//! Engine configuration with sane defaults.

/// How commits are credited to (month, author) cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AccumulationMode {
  /// Every commit increments its (month, author) cell.
  #[default]
  Total,
  /// Only write a cell when the author is globally new or already has a cell
  /// in that month. An existing author's first commit in a later month is
  /// dropped, which matches the legacy report tool.
  FirstSeenOnly,
}

/// Tunable report parameters.
#[derive(Debug, Clone)]
pub struct Config {
  /// Commit crediting rule for the monthly report.
  pub accumulation: AccumulationMode,
  /// Calendar months in the trailing ranking window.
  pub window_months: u32,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      accumulation: AccumulationMode::Total,
      window_months: 3,
    }
  }
}
