//! Source spans shared by the lexer, the AST, and the diagnostics collector.

use std::cmp::Ordering;
use std::rc::Rc;

/// A `(file, line, column, length)` location in a single source file.
///
/// `line` and `column` are 1-based, matching the rendering in [`Span::render`].
/// `file` is shared behind an `Rc<str>` rather than cloned per-token — a single
/// compilation unit has one file name but thousands of spans.
#[derive(Debug, Clone, Eq)]
pub struct Span {
    pub file: Rc<str>,
    pub line: usize,
    pub column: usize,
    pub length: usize,
}

impl Span {
    pub fn new(file: Rc<str>, line: usize, column: usize, length: usize) -> Self {
        Self {
            file,
            line,
            column,
            length: length.max(1),
        }
    }

    /// A span that does not correspond to real source text (e.g. a synthesised
    /// soft-fail node). Carries the same file so rendering still makes sense.
    pub fn synthetic(file: Rc<str>) -> Self {
        Self {
            file,
            line: 0,
            column: 0,
            length: 0,
        }
    }

    pub fn is_synthetic(&self) -> bool {
        self.line == 0 && self.column == 0
    }

    /// Combine two spans into one covering both, keeping this span's start and
    /// `other`'s end. Used when a grammar rule's span should cover several tokens.
    pub fn merge(&self, other: &Span) -> Span {
        let (start, end) = if self.line_col() <= other.line_col() {
            (self, other)
        } else {
            (other, self)
        };
        Span {
            file: start.file.clone(),
            line: start.line,
            column: start.column,
            length: (end.column + end.length).saturating_sub(start.column).max(end.length),
        }
    }

    fn line_col(&self) -> (usize, usize) {
        (self.line, self.column)
    }

    /// Render the source line this span points into, with a caret underline, in
    /// the `ariadne`/`rustc`-flavoured format specified for diagnostics.
    pub fn render(&self, source: &str) -> String {
        let lines: Vec<&str> = source.lines().collect();
        let Some(line_str) = self.line.checked_sub(1).and_then(|idx| lines.get(idx)) else {
            return format!("  ┌─ {}:{}:{}\n   │ <source unavailable>", self.file, self.line, self.column);
        };
        let margin = self.line.to_string().len();
        let fill = " ".repeat(margin);
        let caret_col = self.column.saturating_sub(1);
        let carets = "^".repeat(self.length.max(1));
        format!(
            "{fill}┌─ {file}:{line}:{col}\n{line:>margin$} │ {src}\n{fill} │ {pad}{carets}",
            file = self.file,
            line = self.line,
            col = self.column,
            src = line_str,
            pad = " ".repeat(caret_col),
            margin = margin,
        )
    }
}

// Spans compare equal whenever they denote the same location — two independently
// constructed spans pointing at the same token must be interchangeable as map keys.
impl PartialEq for Span {
    fn eq(&self, other: &Self) -> bool {
        self.file == other.file
            && self.line == other.line
            && self.column == other.column
            && self.length == other.length
    }
}

impl Ord for Span {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.line, self.column, self.length).cmp(&(other.line, other.column, other.length))
    }
}

impl PartialOrd for Span {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file() -> Rc<str> {
        Rc::from("test.fe")
    }

    #[test]
    fn merge_keeps_earliest_start() {
        let a = Span::new(file(), 1, 5, 3);
        let b = Span::new(file(), 1, 10, 2);
        let merged = a.merge(&b);
        assert_eq!(merged.column, 5);
    }

    #[test]
    fn render_marks_column() {
        let span = Span::new(file(), 1, 4, 2);
        let rendered = span.render("if 42 {");
        assert!(rendered.contains("if 42 {"));
        assert!(rendered.contains("^^"));
    }

    #[test]
    fn spans_at_same_location_are_equal() {
        let a = Span::new(file(), 2, 3, 1);
        let b = Span::new(file(), 2, 3, 1);
        assert_eq!(a, b);
    }
}
