use crate::patterns::Span;
use crate::settings::Feature;
use std::collections::HashSet;
use std::fmt;

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Error,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DiagnosticKind {
    DuplicateVariable,
    UnresolvedVariable,
    FinalPatternAssignment,
    IllegalModifier,
    LambdaRedeclaration,
    ConditionalRedeclaration,
    FeatureUnavailable,
    DominatedCaseLabel,
    IllegalFallThrough,
    DefaultAndUnconditional,
    DuplicateUnconditional,
}

/// Problem found while scoping pattern variables
///
/// These never stop the analysis: the offending binding or reference is reported and then
/// treated as if it were legal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub kind: DiagnosticKind,
    pub message: String,
    pub span: Span,
}

impl Diagnostic {
    fn error(kind: DiagnosticKind, message: String, span: Span) -> Diagnostic {
        Diagnostic {
            severity: Severity::Error,
            kind,
            message,
            span,
        }
    }

    pub fn duplicate_variable(name: &str, span: Span) -> Diagnostic {
        Diagnostic::error(
            DiagnosticKind::DuplicateVariable,
            format!("Duplicate local variable {}", name),
            span,
        )
    }

    pub fn unresolved_variable(name: &str, span: Span) -> Diagnostic {
        Diagnostic::error(
            DiagnosticKind::UnresolvedVariable,
            format!("{} cannot be resolved to a variable", name),
            span,
        )
    }

    pub fn final_pattern_assignment(name: &str, span: Span) -> Diagnostic {
        Diagnostic::error(
            DiagnosticKind::FinalPatternAssignment,
            format!(
                "The pattern variable {} is final and cannot be assigned again",
                name
            ),
            span,
        )
    }

    pub fn illegal_modifier(name: &str, span: Span) -> Diagnostic {
        Diagnostic::error(
            DiagnosticKind::IllegalModifier,
            format!(
                "Illegal modifier for the pattern variable {}; only final is permitted",
                name
            ),
            span,
        )
    }

    pub fn lambda_redeclaration(name: &str, span: Span) -> Diagnostic {
        Diagnostic::error(
            DiagnosticKind::LambdaRedeclaration,
            format!(
                "Lambda expression's parameter {} cannot redeclare another local variable defined in an enclosing scope. ",
                name
            ),
            span,
        )
    }

    pub fn conditional_redeclaration(span: Span) -> Diagnostic {
        Diagnostic::error(
            DiagnosticKind::ConditionalRedeclaration,
            String::from("A pattern variable with the same name is already defined in the statement"),
            span,
        )
    }

    pub fn feature_unavailable(feature: Feature, span: Span) -> Diagnostic {
        Diagnostic::error(
            DiagnosticKind::FeatureUnavailable,
            format!(
                "The Java feature '{}' is only available with source level {} and above",
                feature.name(),
                feature.since()
            ),
            span,
        )
    }

    pub fn dominated_case_label(span: Span) -> Diagnostic {
        Diagnostic::error(
            DiagnosticKind::DominatedCaseLabel,
            String::from("This case label is dominated by one of the preceding case labels"),
            span,
        )
    }

    pub fn illegal_fall_through(span: Span) -> Diagnostic {
        Diagnostic::error(
            DiagnosticKind::IllegalFallThrough,
            String::from("Illegal fall-through to a pattern"),
            span,
        )
    }

    pub fn default_and_unconditional(span: Span) -> Diagnostic {
        Diagnostic::error(
            DiagnosticKind::DefaultAndUnconditional,
            String::from("Switch case cannot have both unconditional pattern and default label"),
            span,
        )
    }

    pub fn duplicate_unconditional(span: Span) -> Diagnostic {
        Diagnostic::error(
            DiagnosticKind::DuplicateUnconditional,
            String::from("Duplicate unconditional pattern"),
            span,
        )
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let severity = match self.severity {
            Severity::Error => "error",
        };
        write!(
            f,
            "{} [{}..{}]: {}",
            severity, self.span.start, self.span.end, self.message
        )
    }
}

/// Drop repeated reports of the same problem and order the rest by position
pub(crate) fn normalize(diagnostics: &mut Vec<Diagnostic>) {
    let mut seen = HashSet::new();
    diagnostics.retain(|d| seen.insert((d.kind, d.span, d.message.clone())));
    diagnostics.sort_by(|a, b| {
        a.span
            .start
            .cmp(&b.span.start)
            .then_with(|| a.span.end.cmp(&b.span.end))
            .then_with(|| a.kind.cmp(&b.kind))
            .then_with(|| a.message.cmp(&b.message))
    });
}
