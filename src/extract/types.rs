use serde::{Deserialize, Serialize};

/// What to look for in a document: one rubric item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchSpec {
    /// Stable question id, e.g. `"Q2"`.
    pub id: String,
    /// Literal heading token, e.g. `"Criterion"`.
    pub search_label: String,
    /// Combine the label with the number in `id` (and `id + 1` as the terminator).
    pub auto_increment: bool,
}

impl SearchSpec {
    pub fn new(id: impl Into<String>, search_label: impl Into<String>, auto_increment: bool) -> Self {
        Self {
            id: id.into(),
            search_label: search_label.into(),
            auto_increment,
        }
    }

    /// First run of ASCII digits in the id (`"Q12b"` → 12).
    pub fn question_number(&self) -> Option<u64> {
        let digits: String = self
            .id
            .chars()
            .skip_while(|c| !c.is_ascii_digit())
            .take_while(|c| c.is_ascii_digit())
            .collect();
        digits.parse().ok()
    }
}

/// A located section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// The trimmed header line.
    pub header: String,
    /// Header line, newline, then every collected line; trimmed as a whole.
    pub paragraph: String,
}

/// Result of one extraction call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionOutcome {
    Found(ExtractionResult),
    /// The header never matched, or matched with an empty body.
    NotFound,
    /// The document could not be opened.
    Unreadable { reason: String },
}

impl ExtractionOutcome {
    #[inline]
    pub fn is_found(&self) -> bool {
        matches!(self, ExtractionOutcome::Found(_))
    }

    pub fn as_found(&self) -> Option<&ExtractionResult> {
        match self {
            ExtractionOutcome::Found(result) => Some(result),
            _ => None,
        }
    }

    pub fn into_found(self) -> Option<ExtractionResult> {
        match self {
            ExtractionOutcome::Found(result) => Some(result),
            _ => None,
        }
    }

    /// Short status label for logs and CLI output.
    pub fn label(&self) -> &'static str {
        match self {
            ExtractionOutcome::Found(_) => "found",
            ExtractionOutcome::NotFound => "not_found",
            ExtractionOutcome::Unreadable { .. } => "unreadable",
        }
    }
}
