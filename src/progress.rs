// src/progress.rs

use anyhow::{Context, Result};
use chrono::Local;
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};
use tracing::info;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Append-only progress log: one `"<local timestamp> : <message>"` line per
/// pipeline stage transition.
pub struct ProgressLog {
    path: PathBuf,
}

impl ProgressLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Open in append mode, write one line, close. Failures are fatal.
    pub fn log(&self, message: &str) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating log directory {:?}", parent))?;
        }

        let line = format_line(&Local::now().format(TIMESTAMP_FORMAT).to_string(), message);
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("opening progress log {:?}", self.path))?;
        file.write_all(line.as_bytes())
            .with_context(|| format!("appending to progress log {:?}", self.path))?;

        info!(log = %self.path.display(), "{}", message);
        Ok(())
    }

    /// Whole log file, including lines from earlier runs.
    pub fn read_all(&self) -> Result<String> {
        fs::read_to_string(&self.path)
            .with_context(|| format!("reading progress log {:?}", self.path))
    }
}

fn format_line(timestamp: &str, message: &str) -> String {
    format!("{} : {}\n", timestamp, message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;
    use tempfile::tempdir;

    #[test]
    fn appends_timestamped_lines() {
        let tmp = tempdir().unwrap();
        let log = ProgressLog::new(tmp.path().join("logs").join("code_log.txt"));

        log.log("first").unwrap();
        log.log("second").unwrap();

        let content = log.read_all().unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);

        let (ts, msg) = lines[1].split_once(" : ").unwrap();
        assert_eq!(msg, "second");
        assert!(NaiveDateTime::parse_from_str(ts, TIMESTAMP_FORMAT).is_ok());
    }

    #[test]
    fn keeps_lines_from_previous_runs() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("code_log.txt");
        fs::write(&path, "2024-01-01 00:00:00 : old run\n").unwrap();

        ProgressLog::new(&path).log("new run").unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("2024-01-01 00:00:00 : old run\n"));
        assert!(content.ends_with(" : new run\n"));
    }

    #[test]
    fn read_all_fails_when_missing() {
        let tmp = tempdir().unwrap();
        assert!(ProgressLog::new(tmp.path().join("nope.txt"))
            .read_all()
            .is_err());
    }

    #[test]
    fn line_format() {
        assert_eq!(
            format_line("2023-09-08 09:16:35", "Data saved to CSV file"),
            "2023-09-08 09:16:35 : Data saved to CSV file\n"
        );
    }
}
