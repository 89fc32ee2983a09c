//! Manifest modules
//!
//! A manifest module is a text file listing the systems it registers, one per
//! line:
//!
//! ```text
//! # movement and rendering
//! system physics
//! system render
//! ```
//!
//! `fail <message>` aborts evaluation at that line; so does any malformed
//! line. Systems registered by earlier lines stay registered.

use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context};
use parking_lot::Mutex;

use crate::scheduler::{Scheduler, SystemHandle};
use super::ModuleEvaluator;

/// One meaningful line of a manifest
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManifestLine {
    System(String),
    Fail(String),
}

/// Parse one manifest line. Blank lines and comments yield `None`.
pub fn parse_line(line: &str) -> anyhow::Result<Option<ManifestLine>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let (keyword, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let rest = rest.trim();
    match keyword {
        "system" if !rest.is_empty() && !rest.contains(char::is_whitespace) => {
            Ok(Some(ManifestLine::System(rest.to_string())))
        }
        "system" => bail!("expected `system <name>`, got `{}`", line),
        "fail" => Ok(Some(ManifestLine::Fail(rest.to_string()))),
        other => bail!("unknown directive `{}`", other),
    }
}

/// Shared record of system executions, in run order
#[derive(Debug, Clone, Default)]
pub struct RunLog {
    runs: Arc<Mutex<Vec<String>>>,
}

impl RunLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, name: &str) {
        self.runs.lock().push(name.to_string());
    }

    /// Drain recorded runs
    pub fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.runs.lock())
    }

    pub fn count(&self, name: &str) -> usize {
        self.runs.lock().iter().filter(|run| run.as_str() == name).count()
    }
}

/// Evaluates manifest files, registering one logging system per `system` line
#[derive(Debug, Clone, Default)]
pub struct ManifestEvaluator {
    runs: RunLog,
}

impl ManifestEvaluator {
    pub fn new(runs: RunLog) -> Self {
        Self { runs }
    }

    pub fn runs(&self) -> &RunLog {
        &self.runs
    }
}

impl ModuleEvaluator for ManifestEvaluator {
    fn evaluate(&self, path: &Path, scheduler: &Scheduler) -> anyhow::Result<()> {
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read module {}", path.display()))?;

        for (index, line) in source.lines().enumerate() {
            let parsed = parse_line(line).with_context(|| format!("{}:{}", path.display(), index + 1))?;
            match parsed {
                Some(ManifestLine::System(name)) => {
                    let runs = self.runs.clone();
                    let label = name.clone();
                    scheduler.add_system(name, SystemHandle::new(move |_| runs.record(&label)));
                }
                Some(ManifestLine::Fail(message)) => {
                    bail!("{}:{}: {}", path.display(), index + 1, message)
                }
                None => {}
            }
        }

        Ok(())
    }
}
