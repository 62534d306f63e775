//! Run clock: the timestamp and output root shared by every artifact of a test run.

use chrono::{DateTime, Local};

/// Format used for the per-run subdirectory (e.g. `20240115103045`)
pub const RUN_TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

/// One test-execution session.
///
/// Fixed at construction and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Run {
    started_at: DateTime<Local>,
    base_path: String,
}

impl Run {
    /// Start a run now, writing artifacts under `base_path`
    pub fn new(base_path: &str) -> Self {
        Self::at(base_path, Local::now())
    }

    /// Start a run with an explicit start time
    pub fn at(base_path: &str, started_at: DateTime<Local>) -> Self {
        Self {
            started_at,
            base_path: normalize_base_path(base_path),
        }
    }

    /// When the run started
    pub fn started_at(&self) -> DateTime<Local> {
        self.started_at
    }

    /// Output root, always ending with exactly one `/`
    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    /// Sortable, separator-free start time used as the run directory name
    pub fn timestamp(&self) -> String {
        self.started_at.format(RUN_TIMESTAMP_FORMAT).to_string()
    }
}

/// Strip trailing separators and append exactly one
fn normalize_base_path(path: &str) -> String {
    format!("{}/", path.trim_end_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_start() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 1, 15, 10, 30, 45).unwrap()
    }

    #[test]
    fn test_base_path_normalization() {
        assert_eq!(Run::at("/tmp/shots", fixed_start()).base_path(), "/tmp/shots/");
        assert_eq!(Run::at("/tmp/shots/", fixed_start()).base_path(), "/tmp/shots/");
        assert_eq!(Run::at("/tmp/shots///", fixed_start()).base_path(), "/tmp/shots/");
        assert_eq!(Run::at("shots", fixed_start()).base_path(), "shots/");
    }

    #[test]
    fn test_timestamp_format() {
        let run = Run::at("/tmp/shots", fixed_start());
        assert_eq!(run.timestamp(), "20240115103045");
    }

    #[test]
    fn test_timestamp_is_stable() {
        let run = Run::new("/tmp/shots");
        let first = run.timestamp();
        std::thread::sleep(std::time::Duration::from_millis(1100));
        assert_eq!(run.timestamp(), first);
        assert_eq!(first.len(), 14);
        assert!(first.chars().all(|c| c.is_ascii_digit()));
    }
}
