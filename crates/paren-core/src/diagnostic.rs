use crate::span::Range;

/// A recoverable problem found during analysis.
///
/// Diagnostics are collected into a per-compilation `Vec<Diagnostic>`
/// threaded through the pipeline; each edit rebuilds the list from
/// scratch.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub range: Range,
    pub message: String,
}

impl Diagnostic {
    pub fn new(range: Range, message: impl Into<String>) -> Self {
        Diagnostic {
            range,
            message: message.into(),
        }
    }
}
