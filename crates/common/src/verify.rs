//! Verification scope for multi-field comparisons
//!
//! Collects every field-level mismatch in one pass instead of failing at
//! the first, then reports them together. Intended for diagnosing entity
//! round-trips in tests, where "which of the nine fields changed" matters
//! more than failing fast.

use std::fmt;
use std::fmt::Debug;

/// Severity of a recorded verification step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Informational; never fails the scope.
    Message,
    /// Suspicious but tolerated; never fails the scope.
    Warning,
    /// A mismatch; the scope fails if any of these were recorded.
    Error,
}

/// One recorded comparison or note.
#[derive(Debug, Clone)]
pub struct VerificationStep {
    pub severity: Severity,
    /// Label of the field or check this step belongs to.
    pub check: Option<String>,
    pub message: String,
}

impl fmt::Display for VerificationStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(check) = &self.check {
            writeln!(f, "{check}")?;
        }
        writeln!(f, "{}", self.message)
    }
}

/// Aggregated report of every failed step in a verification scope.
#[derive(Debug, Clone, thiserror::Error)]
pub struct VerificationFailure {
    pub steps: Vec<VerificationStep>,
}

impl fmt::Display for VerificationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} verification failure(s):", self.steps.len())?;
        for step in &self.steps {
            write!(f, "{step}")?;
        }
        Ok(())
    }
}

/// Accumulates comparison outcomes, reporting all mismatches together.
///
/// ```
/// use linecard_common::Verification;
///
/// let mut scope = Verification::new("classification round-trip");
/// scope.check("name", &"Test", &"Test");
/// scope.check("is_employee", &true, &true);
/// scope.finish().unwrap();
/// ```
#[must_use = "call finish() to observe the verification outcome"]
#[derive(Debug, Default)]
pub struct Verification {
    context: String,
    steps: Vec<VerificationStep>,
}

impl Verification {
    pub fn new(context: impl Into<String>) -> Self {
        Self {
            context: context.into(),
            steps: Vec::new(),
        }
    }

    /// Compare one labeled field; a mismatch is recorded, not raised.
    pub fn check<T: Debug + PartialEq + ?Sized>(&mut self, label: &str, expected: &T, actual: &T) {
        if expected == actual {
            self.steps.push(VerificationStep {
                severity: Severity::Message,
                check: Some(label.to_string()),
                message: format!("matched: {expected:?}"),
            });
        } else {
            self.steps.push(VerificationStep {
                severity: Severity::Error,
                check: Some(label.to_string()),
                message: format!("expected {expected:?}, actual {actual:?}"),
            });
        }
    }

    /// Record an informational step.
    pub fn note(&mut self, message: impl Into<String>) {
        self.steps.push(VerificationStep {
            severity: Severity::Message,
            check: None,
            message: message.into(),
        });
    }

    /// Record a warning step; warnings never fail the scope.
    pub fn warn(&mut self, label: &str, message: impl Into<String>) {
        self.steps.push(VerificationStep {
            severity: Severity::Warning,
            check: Some(label.to_string()),
            message: message.into(),
        });
    }

    pub fn has_failures(&self) -> bool {
        self.steps.iter().any(|s| s.severity == Severity::Error)
    }

    /// Close the scope: `Ok` when no Error steps were recorded, otherwise
    /// one aggregated failure listing every mismatch.
    pub fn finish(self) -> Result<(), VerificationFailure> {
        let failures: Vec<VerificationStep> = self
            .steps
            .into_iter()
            .filter(|s| s.severity == Severity::Error)
            .collect();

        if failures.is_empty() {
            Ok(())
        } else {
            tracing::debug!(
                context = %self.context,
                count = failures.len(),
                "verification scope failed"
            );
            Err(VerificationFailure { steps: failures })
        }
    }
}
