use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

use thiserror::Error as ThisError;

use crate::core::generate::GeneratorError;
use crate::core::inspect::{InspectorError, InspectorErrorKind};
use crate::core::lexer::LexerError;
use crate::core::parse::ParserError;

/// Umbrella over the pipeline stage errors, plus driver-side I/O.
#[derive(Debug, ThisError)]
pub enum CompileError {
    #[error(transparent)]
    Lex(#[from] LexerError),

    #[error(transparent)]
    Parse(#[from] ParserError),

    #[error(transparent)]
    Inspect(#[from] InspectorError),

    #[error(transparent)]
    Generate(#[from] GeneratorError),

    #[error("IO error: {0}: {1}")]
    Io(PathBuf, std::io::Error),

    #[error("Failed to decode declarations: {0}: {1}")]
    Decode(PathBuf, serde_json::Error),
}

impl CompileError {
    pub fn span(&self) -> Option<Span> {
        match self {
            CompileError::Lex(e) => Some(e.span),
            CompileError::Parse(e) => Some(e.span),
            CompileError::Inspect(e) => Some(e.span),
            CompileError::Generate(_) | CompileError::Io(..) | CompileError::Decode(..) => None,
        }
    }

    /// 1 for user-visible pipeline errors, 2 for internal invariant
    /// violations.
    pub fn exit_code(&self) -> i32 {
        match self {
            CompileError::Inspect(e) if matches!(e.kind, InspectorErrorKind::InvalidAst(_)) => 2,
            _ => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Position {
    pub offset: usize,
    /// 0-based; rendered 1-based in user-facing messages.
    pub line: usize,
    /// 0-based; rendered 1-based in user-facing messages.
    pub column: usize,
}

impl Display for Position {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line + 1, self.column + 1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

impl Span {
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.offset.saturating_sub(self.start.offset)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Display for Span {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// Byte ranges of each line in a source text, for offset → position mapping.
#[derive(Debug, Clone)]
pub struct LineIndex {
    line_starts: Vec<usize>,
}

impl LineIndex {
    pub fn new(source: &str) -> Self {
        let mut line_starts = vec![0];
        for (i, b) in source.bytes().enumerate() {
            if b == b'\n' {
                line_starts.push(i + 1);
            }
        }
        Self { line_starts }
    }

    /// 0-based line containing the byte offset.
    pub fn line_of(&self, offset: usize) -> usize {
        match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(next) => next - 1,
        }
    }

    pub fn position(&self, offset: usize) -> Position {
        let line = self.line_of(offset);
        Position {
            offset,
            line,
            column: offset - self.line_starts[line],
        }
    }

    /// Span covering `length` bytes starting at `offset`.
    pub fn span(&self, offset: usize, length: usize) -> Span {
        Span::new(self.position(offset), self.position(offset + length))
    }
}

/// A source file handed to the pipeline, with its line index precomputed.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub path: PathBuf,
    pub source: String,
    lines: LineIndex,
}

impl SourceFile {
    pub fn new(path: impl Into<PathBuf>, source: impl Into<String>) -> Self {
        let source = source.into();
        let lines = LineIndex::new(&source);
        Self {
            path: path.into(),
            source,
            lines,
        }
    }

    pub fn lines(&self) -> &LineIndex {
        &self.lines
    }

    pub fn span(&self, offset: usize, length: usize) -> Span {
        self.lines.span(offset, length)
    }
}

/// An error kind bound to the file and span it was raised at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpannedError<K> {
    pub kind: K,
    pub span: Span,
    pub file: PathBuf,
}

impl<K> SpannedError<K> {
    pub fn new(kind: K, span: Span, file: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            span,
            file: file.into(),
        }
    }

    pub fn span(&self) -> Span {
        self.span
    }
}

impl<K: Display> Display for SpannedError<K> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{}: {}",
            self.file.display(),
            self.span.start.line + 1,
            self.kind
        )
    }
}

impl<K: Display + std::fmt::Debug> Error for SpannedError<K> {}

/// Renders an error with a one-line source excerpt and a caret marker:
///
/// ```text
/// error: Test.swift:3: Invalid annotation: @Weaver(.bogus)
///   |
/// 3 |     @Weaver(.bogus) var api: API
///   |     ^^^^^^^^^^^^^^^
/// ```
///
/// Only the line the span starts on is excerpted. A span reaching past that
/// line is marked to the end of the excerpt and summarized in a trailing
/// note instead of underlining every covered line.
pub fn format_error(source: &str, span: Span, error: impl Display) -> String {
    let line_text = source.lines().nth(span.start.line).unwrap_or("");
    let line_label = (span.start.line + 1).to_string();
    let gutter = " ".repeat(line_label.len());

    let marker_len = if span.end.line == span.start.line {
        span.end.column.saturating_sub(span.start.column)
    } else {
        line_text.chars().count().saturating_sub(span.start.column)
    }
    .max(1);
    let marker = format!("{}{}", " ".repeat(span.start.column), "^".repeat(marker_len));

    let mut out = format!("error: {error}\n");
    out.push_str(&format!("{gutter} |\n"));
    out.push_str(&format!("{line_label} | {line_text}\n"));
    out.push_str(&format!("{gutter} | {marker}\n"));
    if span.end.line > span.start.line {
        out.push_str(&format!(
            "{gutter} = note: the span continues over {} lines\n",
            span.end.line - span.start.line + 1
        ));
    }
    out
}

/// Convenience for errors raised at a file-level position (e.g. end of stream).
pub fn file_end_span(file: &SourceFile) -> Span {
    let pos = file.lines.position(file.source.len());
    Span::new(pos, pos)
}

#[cfg(test)]
#[path = "../tests/t_diag.rs"]
mod tests;
