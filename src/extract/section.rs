//! Line-level section scanner.
//!
//! Pages are fed in document order. While seeking, blank lines are skipped and the first
//! non-TOC header match opens the section. While collecting, every line is kept verbatim
//! (blank lines included) until the first non-blank, non-TOC terminator line, which is not
//! kept. Only the first header in the document is honored.

use super::patterns::HeaderPatterns;
use super::types::{ExtractionOutcome, ExtractionResult};

const NBSP: char = '\u{00A0}';

#[derive(Debug, Clone, PartialEq, Eq)]
enum ScanState {
    Seeking,
    Collecting { header: String, lines: Vec<String> },
    Done { header: String, lines: Vec<String> },
}

/// Incremental section scanner over page texts.
#[derive(Debug, Clone)]
pub struct SectionScanner<'a> {
    patterns: &'a HeaderPatterns,
    state: ScanState,
}

impl<'a> SectionScanner<'a> {
    pub fn new(patterns: &'a HeaderPatterns) -> Self {
        Self {
            patterns,
            state: ScanState::Seeking,
        }
    }

    /// `true` once the terminator has been seen; later pages cannot change the result.
    pub fn is_done(&self) -> bool {
        matches!(self.state, ScanState::Done { .. })
    }

    /// `true` while a header has been found and lines are being collected.
    pub fn is_collecting(&self) -> bool {
        matches!(self.state, ScanState::Collecting { .. })
    }

    /// Feeds the text of the next page.
    pub fn feed_page(&mut self, text: &str) {
        if self.is_done() {
            return;
        }
        let normalized = text.replace(NBSP, " ");
        for line in normalized.lines() {
            self.feed_line(line);
            if self.is_done() {
                return;
            }
        }
    }

    fn feed_line(&mut self, line: &str) {
        match &mut self.state {
            ScanState::Seeking => {
                let trimmed = line.trim();
                if !trimmed.is_empty() && self.patterns.is_header(trimmed) {
                    self.state = ScanState::Collecting {
                        header: trimmed.to_string(),
                        lines: Vec::new(),
                    };
                }
            }
            ScanState::Collecting { header, lines } => {
                let trimmed = line.trim();
                if !trimmed.is_empty() && self.patterns.is_terminator(trimmed) {
                    self.state = ScanState::Done {
                        header: std::mem::take(header),
                        lines: std::mem::take(lines),
                    };
                } else {
                    lines.push(line.to_string());
                }
            }
            ScanState::Done { .. } => {}
        }
    }

    /// Final result: not found unless a header was seen and the collected body is non-blank.
    pub fn finish(self) -> ExtractionOutcome {
        let (header, lines) = match self.state {
            ScanState::Seeking => return ExtractionOutcome::NotFound,
            ScanState::Collecting { header, lines } | ScanState::Done { header, lines } => {
                (header, lines)
            }
        };

        if lines.iter().all(|l| l.trim().is_empty()) {
            return ExtractionOutcome::NotFound;
        }

        let paragraph = format!("{}\n{}", header, lines.join("\n"))
            .trim()
            .to_string();

        ExtractionOutcome::Found(ExtractionResult {
            header: header.trim().to_string(),
            paragraph,
        })
    }
}

/// Scans already-extracted page texts in order.
pub fn extract_section<I, S>(patterns: &HeaderPatterns, pages: I) -> ExtractionOutcome
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut scanner = SectionScanner::new(patterns);
    for page in pages {
        scanner.feed_page(page.as_ref());
        if scanner.is_done() {
            break;
        }
    }
    scanner.finish()
}
