//! Header and terminator matchers built from a [`SearchSpec`].

use regex::{Regex, RegexBuilder};
use thiserror::Error;

use super::types::SearchSpec;
use crate::config::DEFAULT_HEADING_KEYWORDS;
use crate::constants::TOC_DOT_RUN;

/// Table-of-contents dot-leader rule: a run of four or more dots.
pub fn is_toc_line(line: &str) -> bool {
    let mut run = 0;
    for c in line.chars() {
        if c == '.' {
            run += 1;
            if run >= TOC_DOT_RUN {
                return true;
            }
        } else {
            run = 0;
        }
    }
    false
}

#[derive(Debug, Error)]
/// Matcher construction failure.
pub enum PatternError {
    #[error("invalid pattern `{pattern}`: {source}")]
    Regex {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// Generic "next section" heuristics used when no numbering scheme is known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadingHeuristics {
    keywords: Vec<String>,
}

impl HeadingHeuristics {
    /// Keywords that, followed by a number at line start, open a new section.
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keywords: keywords
                .into_iter()
                .map(Into::into)
                .filter(|k: &String| !k.trim().is_empty())
                .collect(),
        }
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }
}

impl Default for HeadingHeuristics {
    fn default() -> Self {
        Self::new(DEFAULT_HEADING_KEYWORDS.iter().copied())
    }
}

fn compile(pattern: String) -> Result<Regex, PatternError> {
    RegexBuilder::new(&pattern)
        .case_insensitive(true)
        .build()
        .map_err(|source| PatternError::Regex { pattern, source })
}

/// Ordered header and terminator matchers for one search.
#[derive(Debug, Clone)]
pub struct HeaderPatterns {
    headers: Vec<Regex>,
    terminators: Vec<Regex>,
}

impl HeaderPatterns {
    /// Builds matchers for `spec`.
    ///
    /// A blank label yields no header matchers, so every document reports not found.
    pub fn build(spec: &SearchSpec, heuristics: &HeadingHeuristics) -> Result<Self, PatternError> {
        let label = spec.search_label.trim();
        if label.is_empty() {
            return Ok(Self {
                headers: Vec::new(),
                terminators: Vec::new(),
            });
        }
        let label = regex::escape(label);

        if spec.auto_increment
            && let Some(n) = spec.question_number()
        {
            let numbered = |n: u64| {
                [
                    format!(r"\b(?:Award\s+)?{label}\s*{n}\b"),
                    format!(r"\b{n}\.?\s*{label}\b"),
                ]
            };
            return Ok(Self {
                headers: numbered(n).into_iter().map(compile).collect::<Result<_, _>>()?,
                terminators: numbered(n + 1)
                    .into_iter()
                    .map(compile)
                    .collect::<Result<_, _>>()?,
            });
        }

        let mut terminators = Vec::new();
        if !heuristics.keywords.is_empty() {
            let alternation = heuristics
                .keywords
                .iter()
                .map(|k| regex::escape(k.trim()))
                .collect::<Vec<_>>()
                .join("|");
            terminators.push(compile(format!(r"^\s*(?:{alternation})\s*\d+"))?);
        }
        terminators.push(compile(r"^\s*\d+\.\s".to_string())?);

        Ok(Self {
            headers: vec![compile(label)?],
            terminators,
        })
    }

    pub fn headers(&self) -> &[Regex] {
        &self.headers
    }

    pub fn terminators(&self) -> &[Regex] {
        &self.terminators
    }

    /// `true` when `line` opens the target section and is not a TOC entry.
    pub fn is_header(&self, line: &str) -> bool {
        !is_toc_line(line) && self.headers.iter().any(|re| re.is_match(line))
    }

    /// `true` when `line` opens the following section and is not a TOC entry.
    pub fn is_terminator(&self, line: &str) -> bool {
        !is_toc_line(line) && self.terminators.iter().any(|re| re.is_match(line))
    }
}
