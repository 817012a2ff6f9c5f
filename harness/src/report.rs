//! Structured verification results. Checkers produce these; only the CLI
//! renders them.

/// Status of one check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckStatus {
    Passed,
    /// Not run, for a reason that is not a failure (e.g. no links manifest).
    Skipped,
    Failed,
}

/// One line of a verification report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckLine {
    /// Check name: `signature`, `spec hash`, a replay check name, a spec id.
    pub check: String,
    pub status: CheckStatus,
    /// Extra detail: byte count on pass, reason on skip, diagnostic on failure.
    pub detail: Option<String>,
}

impl CheckLine {
    #[must_use]
    pub fn passed(check: impl Into<String>) -> Self {
        Self {
            check: check.into(),
            status: CheckStatus::Passed,
            detail: None,
        }
    }

    #[must_use]
    pub fn passed_with(check: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            check: check.into(),
            status: CheckStatus::Passed,
            detail: Some(detail.into()),
        }
    }

    #[must_use]
    pub fn skipped(check: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            check: check.into(),
            status: CheckStatus::Skipped,
            detail: Some(reason.into()),
        }
    }

    #[must_use]
    pub fn failed(check: impl Into<String>, diagnostic: impl ToString) -> Self {
        Self {
            check: check.into(),
            status: CheckStatus::Failed,
            detail: Some(diagnostic.to_string()),
        }
    }
}

/// Ordered check lines for one verification run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VerifyReport {
    /// SHA-256 of the canonical payload bytes, once the signature verified.
    pub payload_sha256: Option<String>,
    pub lines: Vec<CheckLine>,
}

impl VerifyReport {
    pub fn push(&mut self, line: CheckLine) {
        self.lines.push(line);
    }

    /// True iff no line failed.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.lines.iter().all(|l| l.status != CheckStatus::Failed)
    }

    /// Lines with the given status, in order.
    pub fn with_status(&self, status: CheckStatus) -> impl Iterator<Item = &CheckLine> {
        self.lines.iter().filter(move |l| l.status == status)
    }
}
