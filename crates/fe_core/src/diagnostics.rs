//! Structured diagnostics: errors, warnings, and notes with source snippets.
//!
//! Mirrors the rendering approach of the teacher's `Span::to_string` caret printer,
//! generalised into an append-only collector that every pass shares.

use std::fmt;

use colored::Colorize;

use crate::span::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Error,
    Warning,
    Note,
}

impl Level {
    fn label(self) -> &'static str {
        match self {
            Level::Error => "error",
            Level::Warning => "warning",
            Level::Note => "note",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub level: Level,
    pub message: String,
    pub span: Span,
    pub hint: Option<String>,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>, span: Span) -> Self {
        Self {
            level: Level::Error,
            message: message.into(),
            span,
            hint: None,
        }
    }

    pub fn warning(message: impl Into<String>, span: Span) -> Self {
        Self {
            level: Level::Warning,
            message: message.into(),
            span,
            hint: None,
        }
    }

    pub fn note(message: impl Into<String>, span: Span) -> Self {
        Self {
            level: Level::Note,
            message: message.into(),
            span,
            hint: None,
        }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    /// Render this diagnostic against `source`, the full text of `self.span.file`.
    /// Colour is applied unless `NO_COLOR` is set or `use_color` is false.
    pub fn render(&self, source: &str, use_color: bool) -> String {
        let header = format!("{}: {}", self.level.label(), self.message);
        let header = if use_color {
            match self.level {
                Level::Error => header.red().bold().to_string(),
                Level::Warning => header.yellow().bold().to_string(),
                Level::Note => header.cyan().bold().to_string(),
            }
        } else {
            header
        };

        let mut out = format!("{header}\n{}", self.span.render(source));
        if let Some(hint) = &self.hint {
            out.push_str(&format!("\n   │\n   = help: {hint}"));
        }
        out
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.level.label(), self.message)
    }
}

/// Append-only sink for diagnostics produced across a single compilation. Holds
/// the full source text so it can render failing lines without re-reading the
/// file — passes only ever append, consistent with spec.md's ordering guarantee.
#[derive(Debug, Clone)]
pub struct DiagnosticsCollector {
    source: String,
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticsCollector {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            diagnostics: Vec::new(),
        }
    }

    pub fn add_error(&mut self, message: impl Into<String>, span: Span) {
        self.diagnostics.push(Diagnostic::error(message, span));
    }

    pub fn add_warning(&mut self, message: impl Into<String>, span: Span) {
        self.diagnostics.push(Diagnostic::warning(message, span));
    }

    pub fn add_note(&mut self, message: impl Into<String>, span: Span) {
        self.diagnostics.push(Diagnostic::note(message, span));
    }

    pub fn add(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| d.level == Level::Error)
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    /// Render every diagnostic, in emission order, to `writer`.
    pub fn print(&self, writer: &mut dyn std::io::Write) -> std::io::Result<()> {
        let use_color = should_use_color();
        for diagnostic in &self.diagnostics {
            writeln!(writer, "{}", diagnostic.render(&self.source, use_color))?;
        }
        Ok(())
    }
}

/// `NO_COLOR` disables ANSI output unconditionally; otherwise colour is used
/// when stderr looks like a terminal. Checked per-call rather than cached so
/// tests can flip the environment variable between assertions.
fn should_use_color() -> bool {
    if std::env::var_os("NO_COLOR").is_some() {
        return false;
    }
    std::io::IsTerminal::is_terminal(&std::io::stderr())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    fn span() -> Span {
        Span::new(Rc::from("test.fe"), 1, 4, 2)
    }

    #[test]
    fn collector_is_append_only_and_ordered() {
        let mut collector = DiagnosticsCollector::new("if 42 {}");
        collector.add_error("condition is not a boolean", span());
        collector.add_warning("unused variable", span());

        let diagnostics = collector.diagnostics();
        assert_eq!(diagnostics[0].level, Level::Error);
        assert_eq!(diagnostics[1].level, Level::Warning);
    }

    #[test]
    fn has_errors_ignores_warnings_and_notes() {
        let mut collector = DiagnosticsCollector::new("");
        collector.add_warning("w", span());
        collector.add_note("n", span());
        assert!(!collector.has_errors());
        collector.add_error("e", span());
        assert!(collector.has_errors());
    }

    #[test]
    fn render_includes_hint() {
        let diagnostic = Diagnostic::error("bad thing", span()).with_hint("try this instead");
        let rendered = diagnostic.render("if 42 {}", false);
        assert!(rendered.contains("= help: try this instead"));
    }
}
