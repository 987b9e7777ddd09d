// src/notify.rs
//! Delivery of a finished report.
//!
//! The chat transport itself lives outside this crate; a `Notifier` takes
//! the message text and chart images and puts them wherever the caller
//! reads them.

use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use log::info;

use crate::config::consts::REPORT_FILE;
use crate::error::Result;
use crate::file::{ensure_directory, resolve_chart_filename, write_atomic};
use crate::report::Chart;

pub trait Notifier {
    fn deliver(&mut self, message: &str, charts: &[Chart]) -> Result<()>;
}

/// Writes `report.html` plus one `NN_<title>.png` per chart into a
/// directory. Files from an earlier run are overwritten.
pub struct DirNotifier {
    dir: PathBuf,
    written: Vec<PathBuf>,
}

impl DirNotifier {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into(), written: Vec::new() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Files produced by the last `deliver`.
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }
}

impl Notifier for DirNotifier {
    fn deliver(&mut self, message: &str, charts: &[Chart]) -> Result<()> {
        ensure_directory(&self.dir)?;
        self.written.clear();

        let report = self.dir.join(REPORT_FILE);
        write_atomic(&report, message.as_bytes())?;
        self.written.push(report);

        let mut seen = HashMap::new();
        for (i, chart) in charts.iter().enumerate() {
            let path = resolve_chart_filename(&self.dir, i, &chart.title, &mut seen, "png");
            fs::write(&path, &chart.png)?;
            self.written.push(path);
        }

        info!("Notify: wrote {} file(s) to {}", self.written.len(), self.dir.display());
        Ok(())
    }
}

/// Prints the message to stdout; charts are only counted.
pub struct StdoutNotifier<W: Write = io::Stdout> {
    out: W,
}

impl StdoutNotifier {
    pub fn new() -> Self {
        Self { out: io::stdout() }
    }
}

impl Default for StdoutNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write> StdoutNotifier<W> {
    pub fn with_writer(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Notifier for StdoutNotifier<W> {
    fn deliver(&mut self, message: &str, charts: &[Chart]) -> Result<()> {
        writeln!(self.out, "{message}")?;
        if !charts.is_empty() {
            let titles: Vec<&str> = charts.iter().map(|c| c.title.as_str()).collect();
            writeln!(self.out, "({} chart(s): {})", charts.len(), titles.join(", "))?;
        }
        self.out.flush()?;
        Ok(())
    }
}
