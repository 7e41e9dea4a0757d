//! The host a rule runs against
//!
//! A [Runner] hands out the parsed files of the module being linted and accepts the [Issue]s a rule finds. The
//! [crate::source::Workspace] is the in-process implementation used by the CLI and by tests.
use crate::config::{ConfigFile, Severity};
use crate::source::SourceFile;
use crate::syntax::Range;
use serde::Serialize;

pub trait Runner {
    /// Parsed files of the module being linted, in a stable order
    fn files(&self) -> &[SourceFile];

    /// `false` for vendored or included modules
    fn is_root_module(&self) -> bool;

    /// Configuration file rule settings are read from, if any was found
    fn config(&self) -> Option<&ConfigFile>;

    fn emit_issue(&mut self, issue: Issue) -> Result<(), EmitError>;

    /// Position of a file in [Runner::files], used to order ranges across files
    fn file_order(&self, filename: &str) -> usize {
        self.files()
            .iter()
            .position(|file| file.name == filename)
            .unwrap_or(usize::MAX)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Issue {
    pub rule: &'static str,
    pub message: String,
    pub range: Range,
    pub severity: Severity,
}

#[derive(thiserror::Error, Debug)]
pub enum EmitError {
    #[error("range {0} does not point into a known file")]
    UnknownFile(Range),
}

/// Emits issues on behalf of one rule with its configured severity
#[derive(derive_new::new, Debug, Clone, Copy)]
pub struct Reporter {
    rule: &'static str,
    severity: Severity,
}

impl Reporter {
    /// Emit an issue; failures are logged and analysis goes on
    pub fn report(&self, runner: &mut dyn Runner, message: impl Into<String>, range: Range) {
        let message = message.into();
        tracing::debug!(rule = self.rule, %range, "{message}");

        let issue = Issue {
            rule: self.rule,
            message,
            range,
            severity: self.severity,
        };
        if let Err(err) = runner.emit_issue(issue) {
            tracing::error!(rule = self.rule, error = %err, "failed to emit issue");
        }
    }
}
