//! Structured error and warning types for config validation and simulation.
//!
//! All failure paths return values (no panics in library code); panics are
//! reserved for `InvariantViolation`, which indicates an implementation bug
//! rather than bad input.

use std::fmt;

/// Severity of a single config validation finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Blocks simulation from starting.
    Error,
    /// Surfaced alongside results; does not block.
    Warn,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warn => write!(f, "warn"),
        }
    }
}

/// A single config validation finding, with field path and severity.
#[derive(Debug, Clone)]
pub struct ConfigIssue {
    /// Dotted field path (e.g. `"battery.soc_min"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
    /// Whether this finding blocks simulation.
    pub severity: Severity,
}

impl ConfigIssue {
    pub fn error(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            severity: Severity::Error,
        }
    }

    pub fn warn(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            severity: Severity::Warn,
        }
    }

    pub fn is_fatal(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {} — {}", self.severity, self.field, self.message)
    }
}

/// Diagnostic snapshot raised when a hard invariant is violated mid-run.
///
/// This indicates a bug in the dispatch/engine logic, not bad input — the
/// pre/post SOC distance from bounds should never exceed the clamp epsilon.
#[derive(Debug, Clone)]
pub struct InvariantViolation {
    /// Absolute hour-of-year at which the violation was detected.
    pub hour: usize,
    /// Which §4.2 dispatch branch was active.
    pub branch: &'static str,
    /// Human-readable description of the violated invariant.
    pub detail: String,
    /// SOC immediately before the offending operation.
    pub soc_before: f32,
    /// SOC immediately after the offending operation.
    pub soc_after: f32,
}

impl fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invariant violation at hour {} (branch {}): {} (soc {:.6} -> {:.6})",
            self.hour, self.branch, self.detail, self.soc_before, self.soc_after
        )
    }
}

impl std::error::Error for InvariantViolation {}

/// Top-level error for fatal, pre-run or mid-run failures.
#[derive(Debug)]
pub enum SimError {
    /// One or more error-severity config rules failed; simulation never started.
    Config(Vec<ConfigIssue>),
    /// The solar profile was not exactly 8,760 non-negative values.
    InputShape(String),
    /// A hard invariant (SOC bounds, cycle cap, binary delivery, sign) was violated.
    Invariant(InvariantViolation),
}

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(issues) => {
                writeln!(f, "config validation failed:")?;
                for issue in issues {
                    writeln!(f, "  {issue}")?;
                }
                Ok(())
            }
            Self::InputShape(msg) => write!(f, "input shape error: {msg}"),
            Self::Invariant(v) => write!(f, "{v}"),
        }
    }
}

impl std::error::Error for SimError {}
