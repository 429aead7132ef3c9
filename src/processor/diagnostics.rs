//! Diagnostics of one compilation round and the expected-error protocol
//!
//! A declaration annotated with the expected-error annotation asserts that
//! validating it produces exactly that message. A matching error is
//! swallowed; a round that ends without the match reports
//! `Expected error not emitted` on the declaration instead.

use std::collections::BTreeMap;
use std::fmt;

use super::GeneratedSource;
use crate::host::{DeclId, DeclarationInspector, Location};

pub const EXPECTED_ERROR_NOT_EMITTED: &str = "Expected error not emitted";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    pub declaration: Option<DeclId>,
    pub location: Option<Location>,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.location {
            Some(location) => write!(f, "{}: {}", location, self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

/// Per-declaration progress through validation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssertionState {
    Pending,
    /// An error was emitted for the declaration
    Violated,
    /// An error equal to the declared expectation was swallowed
    Matched,
    /// Validation passed
    Clean,
}

/// Per-round context shared by every processing stage
#[derive(Debug)]
pub struct CompilationRound {
    expected_error_annotation: String,
    diagnostics: Vec<Diagnostic>,
    states: BTreeMap<DeclId, AssertionState>,
    generated: Vec<GeneratedSource>,
    finished: bool,
}

impl CompilationRound {
    pub fn new(expected_error_annotation: &str) -> Self {
        CompilationRound {
            expected_error_annotation: expected_error_annotation.to_string(),
            diagnostics: Vec::new(),
            states: BTreeMap::new(),
            generated: Vec::new(),
            finished: false,
        }
    }

    /// Report a usage error on `decl`, unless the declaration expects it
    pub fn report_error(&mut self, inspector: &dyn DeclarationInspector, decl: DeclId, message: &str) {
        let expected =
            inspector.annotation_value(decl, &self.expected_error_annotation, "value");
        if expected.as_deref() == Some(message) {
            log::debug!("expected error matched: {}", message);
            self.states.insert(decl, AssertionState::Matched);
            return;
        }

        self.push(inspector, decl, Severity::Error, message);
        let state = self.states.entry(decl).or_insert(AssertionState::Pending);
        if *state != AssertionState::Matched {
            *state = AssertionState::Violated;
        }
    }

    /// Report a warning; warnings never satisfy or violate an expected error
    pub fn report_warning(&mut self, inspector: &dyn DeclarationInspector, decl: DeclId, message: &str) {
        self.push(inspector, decl, Severity::Warning, message);
    }

    /// Record that `decl` passed validation
    pub fn mark_clean(&mut self, decl: DeclId) {
        let state = self.states.entry(decl).or_insert(AssertionState::Pending);
        if *state == AssertionState::Pending {
            *state = AssertionState::Clean;
        }
    }

    pub fn add_generated(&mut self, source: GeneratedSource) {
        self.generated.push(source);
    }

    /// Close the round: every unmatched expectation becomes an error
    pub fn finish(&mut self, inspector: &dyn DeclarationInspector) {
        if self.finished {
            return;
        }
        self.finished = true;

        for decl in inspector.annotated_with(&self.expected_error_annotation) {
            if self.state(decl) != AssertionState::Matched {
                self.push(inspector, decl, Severity::Error, EXPECTED_ERROR_NOT_EMITTED);
            }
        }
    }

    pub fn state(&self, decl: DeclId) -> AssertionState {
        self.states
            .get(&decl)
            .copied()
            .unwrap_or(AssertionState::Pending)
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
    }

    pub fn has_errors(&self) -> bool {
        self.errors().next().is_some()
    }

    pub fn generated(&self) -> &[GeneratedSource] {
        &self.generated
    }

    pub fn into_generated(self) -> Vec<GeneratedSource> {
        self.generated
    }

    fn push(&mut self, inspector: &dyn DeclarationInspector, decl: DeclId, severity: Severity, message: &str) {
        self.diagnostics.push(Diagnostic {
            severity,
            message: message.to_string(),
            declaration: Some(decl),
            location: inspector.location(decl),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::java::JavaModel;
    use std::path::Path;

    const EXPECTED: &str = "net.java.html.react.test.ExpectedError";

    fn model() -> JavaModel {
        let mut model = JavaModel::new();
        model
            .add_source(
                Path::new("src/T.java"),
                r#"
import net.java.html.react.test.ExpectedError;

abstract class T {
    @ExpectedError("boom")
    abstract void expects();

    abstract void plain();
}
"#,
            )
            .unwrap();
        model
    }

    #[test]
    fn test_matching_error_is_swallowed() {
        let model = model();
        let expects = model.find_method("T", "expects").unwrap();
        let mut round = CompilationRound::new(EXPECTED);

        round.report_error(&model, expects, "boom");
        assert_eq!(round.state(expects), AssertionState::Matched);
        assert!(round.diagnostics().is_empty());

        round.finish(&model);
        assert!(!round.has_errors());
    }

    #[test]
    fn test_match_is_case_sensitive() {
        let model = model();
        let expects = model.find_method("T", "expects").unwrap();
        let mut round = CompilationRound::new(EXPECTED);

        round.report_error(&model, expects, "Boom");
        assert_eq!(round.state(expects), AssertionState::Violated);
        round.finish(&model);

        let messages: Vec<&str> = round.errors().map(|d| d.message.as_str()).collect();
        assert_eq!(messages, vec!["Boom", EXPECTED_ERROR_NOT_EMITTED]);
    }

    #[test]
    fn test_unmatched_expectation_reported_once() {
        let model = model();
        let expects = model.find_method("T", "expects").unwrap();
        let plain = model.find_method("T", "plain").unwrap();
        let mut round = CompilationRound::new(EXPECTED);

        round.mark_clean(expects);
        round.mark_clean(plain);
        round.finish(&model);
        round.finish(&model);

        assert_eq!(round.diagnostics().len(), 1);
        let diagnostic = &round.diagnostics()[0];
        assert_eq!(diagnostic.message, EXPECTED_ERROR_NOT_EMITTED);
        assert_eq!(diagnostic.declaration, Some(expects));
        assert_eq!(diagnostic.to_string(), "src/T.java:5: Expected error not emitted");
        assert_eq!(round.state(plain), AssertionState::Clean);
    }

    #[test]
    fn test_error_without_expectation_is_emitted() {
        let model = model();
        let plain = model.find_method("T", "plain").unwrap();
        let mut round = CompilationRound::new(EXPECTED);

        round.report_error(&model, plain, "bad");
        round.mark_clean(plain);
        assert_eq!(round.state(plain), AssertionState::Violated);
        assert_eq!(round.errors().count(), 1);
    }

    #[test]
    fn test_warning_leaves_expectations_alone() {
        let model = model();
        let expects = model.find_method("T", "expects").unwrap();
        let mut round = CompilationRound::new(EXPECTED);

        round.report_warning(&model, expects, "boom");
        assert_eq!(round.state(expects), AssertionState::Pending);
        assert!(!round.has_errors());
        assert_eq!(round.diagnostics()[0].severity, Severity::Warning);
        assert_eq!(round.diagnostics()[0].severity.to_string(), "warning");
    }
}
