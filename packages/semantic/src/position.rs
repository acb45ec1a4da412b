//! Source positions and spans.
//!
//! Every AST node carries a start/end position so that later passes can
//! build diagnostics that an IDE can click through. Adapted from the
//! teacher's `ParseLocation`/`ParseSourceSpan` pair: a location tracks an
//! absolute byte offset plus a 1-based line/column, a span is a pair of
//! locations into the same file.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFile {
    pub id: u32,
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextPosition {
    pub offset: usize,
    pub line: usize,
    pub column: usize,
}

impl TextPosition {
    pub fn new(offset: usize, line: usize, column: usize) -> Self {
        TextPosition { offset, line, column }
    }

    pub const fn synthetic() -> Self {
        TextPosition { offset: 0, line: 0, column: 0 }
    }
}

impl fmt::Display for TextPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A start/end range within one source file. Cheaply cloneable: the file
/// is reference counted since every node in a translation unit shares it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSpan {
    #[serde(skip, default = "synthetic_file")]
    pub file: Rc<SourceFile>,
    pub start: TextPosition,
    pub end: TextPosition,
}

fn synthetic_file() -> Rc<SourceFile> {
    Rc::new(SourceFile { id: u32::MAX, path: "<synthetic>".to_string() })
}

impl SourceSpan {
    pub fn new(file: Rc<SourceFile>, start: TextPosition, end: TextPosition) -> Self {
        SourceSpan { file, start, end }
    }

    /// A span with no real source backing, used for compiler-synthesized
    /// nodes (implicit constructors, inserted destructor calls, ...).
    pub fn synthetic() -> Self {
        SourceSpan {
            file: synthetic_file(),
            start: TextPosition::synthetic(),
            end: TextPosition::synthetic(),
        }
    }

    pub fn is_synthetic(&self) -> bool {
        self.file.id == u32::MAX
    }
}

impl fmt::Display for SourceSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}-{}", self.file.path, self.start, self.end)
    }
}
