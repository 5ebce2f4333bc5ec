//! Validation report.
//!
//! Collects the errors of every planning stage. In collect mode recording an
//! error lets the stage carry on; in fail-fast mode the first error is handed
//! back to the caller. Internal defects abort in both modes.

use crate::error::{ErrorKind, PlanError};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// How a planning run reacts to errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PlanMode {
    /// Evaluate everything and report all errors.
    #[default]
    Collect,
    /// Stop at the first error.
    FailFast,
}

impl FromStr for PlanMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "collect" => Ok(PlanMode::Collect),
            "fail-fast" | "fail_fast" | "failfast" => Ok(PlanMode::FailFast),
            other => Err(format!(
                "unknown plan mode '{other}', expected collect or fail-fast"
            )),
        }
    }
}

impl fmt::Display for PlanMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanMode::Collect => f.write_str("collect"),
            PlanMode::FailFast => f.write_str("fail-fast"),
        }
    }
}

/// Planning stage an error was raised in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Component {
    AddressSpace,
    SubnetPartitioner,
    TopologyPlanner,
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// One reported error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportEntry {
    pub component: Component,
    pub kind: ErrorKind,
    pub message: String,
    /// Id of the offending group, zone, resource or policy.
    pub entity: String,
}

/// Ordered errors of one planning run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    #[serde(skip)]
    mode: PlanMode,
    entries: Vec<ReportEntry>,
}

impl ValidationReport {
    pub fn new(mode: PlanMode) -> Self {
        ValidationReport {
            mode,
            entries: Vec::new(),
        }
    }

    pub fn mode(&self) -> PlanMode {
        self.mode
    }

    /// Record an error, or return it when the run has to stop.
    pub fn record(&mut self, component: Component, err: PlanError) -> Result<(), PlanError> {
        if err.is_internal() {
            log::error!("[{component}] internal planner defect: {err}");
            return Err(err);
        }
        match self.mode {
            PlanMode::FailFast => {
                log::warn!("[{component}] {err} (fail-fast)");
                Err(err)
            }
            PlanMode::Collect => {
                log::warn!("[{component}] {err}");
                self.entries.push(ReportEntry {
                    component,
                    kind: err.kind(),
                    message: err.to_string(),
                    entity: err.entity().to_string(),
                });
                Ok(())
            }
        }
    }

    /// Unwrap a stage result, recording the error and yielding `None` instead.
    pub fn check<T>(
        &mut self,
        component: Component,
        result: Result<T, PlanError>,
    ) -> Result<Option<T>, PlanError> {
        match result {
            Ok(value) => Ok(Some(value)),
            Err(err) => self.record(component, err).map(|()| None),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ReportEntry> {
        self.entries.iter()
    }

    pub fn has(&self, kind: ErrorKind) -> bool {
        self.entries.iter().any(|e| e.kind == kind)
    }

    pub fn count(&self, kind: ErrorKind) -> usize {
        self.entries.iter().filter(|e| e.kind == kind).count()
    }
}

impl<'a> IntoIterator for &'a ValidationReport {
    type Item = &'a ReportEntry;
    type IntoIter = std::slice::Iter<'a, ReportEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl fmt::Display for ReportEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.component, self.kind, self.message)
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "ValidationReport ({} issues):", self.entries.len())?;
        for entry in &self.entries {
            writeln!(f, "  - {entry}")?;
        }
        Ok(())
    }
}
