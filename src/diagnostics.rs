//! Diagnostics reported by the layout pass
//!
//! The pass never stops compilation. The only condition it reports is a
//! record carrying both `randomize_layout` and `no_randomize_layout`, which
//! is a warning.

use crate::decl::SourceLocation;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Warning,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::Warning => write!(f, "warning"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// Both opt-in and opt-out layout attributes on one record
    RandomizeAttrConflict,
}

/// A single diagnostic tied to a record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub level: Level,
    pub kind: DiagnosticKind,
    pub record: String,
    pub location: SourceLocation,
}

impl Diagnostic {
    pub fn warning(kind: DiagnosticKind, record: &str, location: SourceLocation) -> Self {
        Diagnostic {
            level: Level::Warning,
            kind,
            record: record.to_string(),
            location,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} at line {}, column {}: ",
            self.level, self.location.line, self.location.column
        )?;
        match self.kind {
            DiagnosticKind::RandomizeAttrConflict => write!(
                f,
                "'{}' is marked both 'randomize_layout' and 'no_randomize_layout'; \
                 'no_randomize_layout' takes precedence",
                self.record
            ),
        }
    }
}

/// Receiver for diagnostics emitted by the pass
pub trait DiagnosticSink {
    fn report(&mut self, diagnostic: Diagnostic);
}

/// Collecting sink that also mirrors every report to `tracing`
#[derive(Debug, Default)]
pub struct Diagnostics {
    reported: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn num_warnings(&self) -> usize {
        self.reported
            .iter()
            .filter(|d| d.level == Level::Warning)
            .count()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.reported.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.reported.is_empty()
    }
}

impl DiagnosticSink for Diagnostics {
    fn report(&mut self, diagnostic: Diagnostic) {
        match diagnostic.level {
            Level::Warning => tracing::warn!(record = %diagnostic.record, "{}", diagnostic),
        }
        self.reported.push(diagnostic);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflict_message() {
        let diagnostic = Diagnostic::warning(
            DiagnosticKind::RandomizeAttrConflict,
            "test_struct",
            SourceLocation::new(3, 9),
        );
        let message = diagnostic.to_string();
        assert!(message.starts_with("warning at line 3, column 9: "));
        assert!(message.contains("'test_struct'"));
    }

    #[test]
    fn test_collector_counts_warnings() {
        let mut diagnostics = Diagnostics::new();
        assert!(diagnostics.is_empty());
        diagnostics.report(Diagnostic::warning(
            DiagnosticKind::RandomizeAttrConflict,
            "a",
            SourceLocation::default(),
        ));
        assert_eq!(diagnostics.num_warnings(), 1);
        assert_eq!(diagnostics.iter().count(), 1);
    }
}
