//! Durable flat-file report artifacts
//!
//! Both cumulative logs are append-only and never truncated; files are
//! opened, appended and closed per write so concurrent external readers
//! observe consistent whole-line appends. The success marker is written
//! atomically through a temp file.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

use tempfile::NamedTempFile;

use crate::error::{Error, Result};
use crate::run::record::RunRecord;
use crate::run::runtime::LogDump;
use crate::{EXIT_FAILURE, EXIT_SUCCESS};

/// Cumulative failure log, appended on every failing run
pub const FAILURE_LOG: &str = "test.log";

/// Cumulative message log, appended on every run
pub const MESSAGE_LOG: &str = "messages";

/// Writes the report artifacts for a run into one output directory
#[derive(Debug, Clone)]
pub struct Reporter {
    out_dir: PathBuf,
}

impl Reporter {
    /// Create a reporter writing into `out_dir`
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Reporter {
            out_dir: out_dir.into(),
        }
    }

    fn append(&self, file_name: &str, text: &str) -> Result<()> {
        let path = self.out_dir.join(file_name);
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| Error::report(path.display().to_string(), e))?;
        file.write_all(text.as_bytes())
            .map_err(|e| Error::report(path.display().to_string(), e))
    }

    /// Append this run's failure block to the cumulative failure log
    pub fn append_failures(&self, source_id: &str, record: &RunRecord) -> Result<()> {
        let mut block = format!("Failures in {}:\n", source_id);
        for entry in &record.failures {
            block.push_str(&format!("{}:\n", entry.test_id));
            for message in &entry.messages {
                block.push_str(&format!("  {}\n", message));
            }
        }
        self.append(FAILURE_LOG, &block)
    }

    /// Append this run's summary to the cumulative message log
    pub fn append_messages(&self, record: &RunRecord) -> Result<()> {
        let mut lines = String::new();
        for message in &record.messages {
            lines.push_str(message);
            lines.push('\n');
        }
        if record.executed == 0 {
            lines.push_str("NO tests executed\n");
        } else {
            lines.push_str(&format!("Executed {} tests\n", record.executed));
        }
        if record.failed > 0 {
            lines.push_str(&format!("{} FAILED:\n", record.failed));
            for entry in &record.failures {
                lines.push_str(&format!("  {}\n", entry.test_id));
                for message in &entry.messages {
                    lines.push_str(&format!("    {}\n", message));
                }
            }
        }
        for skip in &record.skipped {
            if skip.reason.is_empty() {
                lines.push_str(&format!("Skipped: {}\n", skip.test_id));
            } else {
                lines.push_str(&format!("Skipped: {}: {}\n", skip.test_id, skip.reason));
            }
        }
        self.append(MESSAGE_LOG, &lines)
    }

    /// Write the empty success marker `<stem>.ok`, atomically
    pub fn write_marker(&self, stem: &str) -> Result<()> {
        let path = self.out_dir.join(format!("{}.ok", stem));
        let file = NamedTempFile::new_in(&self.out_dir)
            .map_err(|e| Error::report(path.display().to_string(), e))?;
        file.persist(&path)
            .map_err(|e| Error::report(path.display().to_string(), e.error))?;
        Ok(())
    }

    /// Path of the marker artifact for `stem`
    pub fn marker_path(&self, stem: &str) -> PathBuf {
        self.out_dir.join(format!("{}.ok", stem))
    }

    /// Write captured diagnostic dumps for a failed test, one
    /// `<test>_<logsource>.testlog` file per source
    pub fn write_log_dumps(&self, test_name: &str, dumps: &[LogDump]) -> Result<()> {
        for dump in dumps {
            let path = self
                .out_dir
                .join(format!("{}_{}.testlog", test_name, dump.source));
            fs::write(&path, &dump.content)
                .map_err(|e| Error::report(path.display().to_string(), e))?;
        }
        Ok(())
    }

    /// Finalize a run: marker on success, failure block otherwise, summary
    /// always. Returns the process exit code for the run.
    pub fn finish(&self, source_id: &str, marker_stem: &str, record: &RunRecord) -> Result<i32> {
        if record.failed > 0 {
            self.append_failures(source_id, record)?;
        } else {
            self.write_marker(marker_stem)?;
        }
        self.append_messages(record)?;

        #[cfg(feature = "colors")]
        self.print_summary(record);

        Ok(if record.failed > 0 {
            EXIT_FAILURE
        } else {
            EXIT_SUCCESS
        })
    }

    /// One-line colored console summary, when stdout is a terminal
    #[cfg(feature = "colors")]
    fn print_summary(&self, record: &RunRecord) {
        use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

        if !atty::is(atty::Stream::Stdout) {
            return;
        }
        let mut stdout = StandardStream::stdout(ColorChoice::Auto);
        let color = if record.failed > 0 {
            Color::Red
        } else {
            Color::Green
        };
        let _ = stdout.set_color(ColorSpec::new().set_fg(Some(color)).set_bold(true));
        let _ = writeln!(
            &mut stdout,
            "{} executed, {} failed, {} skipped",
            record.executed,
            record.failed,
            record.skipped.len()
        );
        let _ = stdout.reset();
    }
}
