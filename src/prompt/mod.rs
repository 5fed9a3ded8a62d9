//! Typed prompt templates.
//!
//! A template is parsed once into literal segments and `{name}` placeholders. Each
//! placeholder is optional unless marked required. Rendering substitutes known values;
//! a missing required value is an error, and any other unfilled placeholder is emitted
//! back as its literal `{name}`. Braces that do not enclose an identifier are plain text.

#[cfg(test)]
mod tests;

use std::collections::{BTreeMap, HashMap};

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("missing value for required placeholder {{{name}}}")]
    MissingRequired { name: String },

    #[error("template has no placeholder {{{name}}}")]
    UnknownPlaceholder { name: String },
}

/// Whether a placeholder must be supplied at render time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    Required,
    Optional,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Placeholder(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    segments: Vec<Segment>,
    placeholders: BTreeMap<String, Requirement>,
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

impl PromptTemplate {
    /// Parses `source`; every placeholder starts out optional.
    pub fn parse(source: &str) -> Self {
        let mut segments = Vec::new();
        let mut placeholders = BTreeMap::new();
        let mut literal = String::new();
        let mut rest = source;

        while let Some(open) = rest.find('{') {
            literal.push_str(&rest[..open]);
            let after = &rest[open + 1..];

            let name = after
                .find('}')
                .map(|close| &after[..close])
                .filter(|name| is_identifier(name));

            match name {
                Some(name) => {
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Placeholder(name.to_string()));
                    placeholders
                        .entry(name.to_string())
                        .or_insert(Requirement::Optional);
                    rest = &after[name.len() + 1..];
                }
                None => {
                    literal.push('{');
                    rest = after;
                }
            }
        }
        literal.push_str(rest);
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Self {
            segments,
            placeholders,
        }
    }

    /// Marks `name` as required.
    pub fn require(mut self, name: &str) -> Result<Self, TemplateError> {
        match self.placeholders.get_mut(name) {
            Some(requirement) => {
                *requirement = Requirement::Required;
                Ok(self)
            }
            None => Err(TemplateError::UnknownPlaceholder {
                name: name.to_string(),
            }),
        }
    }

    /// Placeholder names with their requirement, sorted by name.
    pub fn placeholders(&self) -> &BTreeMap<String, Requirement> {
        &self.placeholders
    }

    pub fn requirement(&self, name: &str) -> Option<Requirement> {
        self.placeholders.get(name).copied()
    }

    /// Renders with `values`.
    pub fn render(&self, values: &HashMap<&str, &str>) -> Result<String, TemplateError> {
        for (name, requirement) in &self.placeholders {
            if *requirement == Requirement::Required && !values.contains_key(name.as_str()) {
                return Err(TemplateError::MissingRequired { name: name.clone() });
            }
        }

        Ok(self.fill(values))
    }

    fn fill(&self, values: &HashMap<&str, &str>) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Placeholder(name) => match values.get(name.as_str()) {
                    Some(value) => out.push_str(value),
                    None => {
                        out.push('{');
                        out.push_str(name);
                        out.push('}');
                    }
                },
            }
        }
        out
    }
}

/// Parses and renders `source` in one step, treating every placeholder as optional.
pub fn render_template(source: &str, values: &HashMap<&str, &str>) -> String {
    PromptTemplate::parse(source).fill(values)
}
