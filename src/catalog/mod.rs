//! Question catalog: rubric items with their search configuration and scoring prompt.
//!
//! Seeds are JSON arrays of `{q_id, prompt_json, is_active, search_label, auto_increment}`
//! objects. The catalog itself persists as a JSON file in the same shape.

pub mod error;


pub use error::{CatalogError, CatalogResult};

use std::cmp::Ordering;
use std::collections::HashMap;
use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::extract::SearchSpec;

pub const DEFAULT_SEARCH_LABEL: &str = "Criterion";

fn default_true() -> bool {
    true
}

fn default_search_label() -> String {
    DEFAULT_SEARCH_LABEL.to_string()
}

/// One rubric item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub q_id: String,
    /// Scoring prompt configuration (free-form JSON).
    #[serde(default)]
    pub prompt_json: Value,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default = "default_search_label")]
    pub search_label: String,
    #[serde(default = "default_true")]
    pub auto_increment: bool,
}

impl Question {
    pub fn new(q_id: impl Into<String>) -> Self {
        Self {
            q_id: q_id.into(),
            prompt_json: Value::Object(Map::new()),
            is_active: true,
            search_label: default_search_label(),
            auto_increment: true,
        }
    }

    /// Search configuration for the section extractor.
    pub fn search_spec(&self) -> SearchSpec {
        SearchSpec::new(&self.q_id, &self.search_label, self.auto_increment)
    }

    /// Prompt text: a bare string, the `prompt`, `template` or `raw` field, or the JSON itself.
    pub fn prompt_text(&self) -> String {
        match &self.prompt_json {
            Value::String(s) => s.clone(),
            Value::Object(map) => ["prompt", "template", "raw"]
                .iter()
                .find_map(|k| map.get(*k).and_then(Value::as_str))
                .map(str::to_string)
                .unwrap_or_else(|| self.prompt_json.to_string()),
            other => other.to_string(),
        }
    }

    /// Builds a question from one seed object. Returns `None` for a blank `q_id`.
    fn from_seed(entry: &Value) -> Option<Self> {
        let q_id = match entry.get("q_id") {
            Some(Value::String(s)) => s.trim().to_string(),
            Some(Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        };
        if q_id.is_empty() {
            return None;
        }

        let flag = |key: &str| entry.get(key).map(truthy).unwrap_or(true);

        Some(Self {
            q_id,
            prompt_json: normalize_prompt(entry.get("prompt_json")),
            is_active: flag("is_active"),
            search_label: entry
                .get("search_label")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(default_search_label),
            auto_increment: flag("auto_increment"),
        })
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// String prompts holding JSON are parsed; other strings become `{"raw": ...}`.
fn normalize_prompt(value: Option<&Value>) -> Value {
    match value {
        None | Some(Value::Null) => Value::Object(Map::new()),
        Some(Value::String(s)) => serde_json::from_str(s).unwrap_or_else(|_| {
            let mut raw = Map::new();
            raw.insert("raw".to_string(), Value::String(s.clone()));
            Value::Object(raw)
        }),
        Some(other) => other.clone(),
    }
}

/// Orders ids by their first number, then lexically (`Q2` < `Q10` < `Q10a`).
pub fn natural_order(a: &str, b: &str) -> Ordering {
    fn number(id: &str) -> Option<u64> {
        let digits: String = id
            .chars()
            .skip_while(|c| !c.is_ascii_digit())
            .take_while(|c| c.is_ascii_digit())
            .collect();
        digits.parse().ok()
    }

    match (number(a), number(b)) {
        (Some(x), Some(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

/// Counts from one import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub created: usize,
    pub updated: usize,
    pub skipped: usize,
}

/// In-memory catalog keyed by `q_id`.
#[derive(Debug, Clone, Default)]
pub struct QuestionCatalog {
    questions: HashMap<String, Question>,
}

impl QuestionCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a catalog file. A missing file is an empty catalog.
    pub fn load(path: &Path) -> CatalogResult<Self> {
        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::new()),
            Err(e) => return Err(e.into()),
        };
        let questions: Vec<Question> = serde_json::from_slice(&bytes)?;
        debug!(path = %path.display(), count = questions.len(), "Loaded question catalog");
        Ok(Self {
            questions: questions.into_iter().map(|q| (q.q_id.clone(), q)).collect(),
        })
    }

    /// Writes the catalog in [`natural_order`], replacing `path` atomically.
    pub fn save(&self, path: &Path) -> CatalogResult<()> {
        let dir = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir)?;

        let mut temp = tempfile::NamedTempFile::new_in(dir)?;
        temp.write_all(self.export_json()?.as_bytes())?;
        temp.as_file().sync_all()?;
        temp.persist(path).map_err(|e| CatalogError::Io(e.error))?;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn get(&self, q_id: &str) -> Option<&Question> {
        self.questions.get(q_id)
    }

    /// Like [`QuestionCatalog::get`] but an unknown id is an error.
    pub fn require(&self, q_id: &str) -> CatalogResult<&Question> {
        self.get(q_id).ok_or_else(|| CatalogError::UnknownQuestion {
            q_id: q_id.to_string(),
        })
    }

    /// Inserts or replaces a question. Returns `true` if it was new.
    pub fn upsert(&mut self, question: Question) -> bool {
        self.questions
            .insert(question.q_id.clone(), question)
            .is_none()
    }

    /// All questions in [`natural_order`].
    pub fn ordered(&self) -> Vec<&Question> {
        let mut questions: Vec<&Question> = self.questions.values().collect();
        questions.sort_by(|a, b| natural_order(&a.q_id, &b.q_id));
        questions
    }

    /// Active questions in [`natural_order`].
    pub fn active(&self) -> Vec<&Question> {
        self.ordered().into_iter().filter(|q| q.is_active).collect()
    }

    /// Upserts every seed entry. Entries with a blank `q_id` are skipped.
    pub fn import(&mut self, seed: &[Value]) -> ImportReport {
        let mut report = ImportReport::default();
        for entry in seed {
            match Question::from_seed(entry) {
                Some(question) => {
                    if self.upsert(question) {
                        report.created += 1;
                    } else {
                        report.updated += 1;
                    }
                }
                None => report.skipped += 1,
            }
        }
        info!(
            created = report.created,
            updated = report.updated,
            skipped = report.skipped,
            "Imported questions"
        );
        report
    }

    /// Like [`QuestionCatalog::import`], but only into an empty catalog.
    pub fn import_blank(&mut self, seed: &[Value]) -> CatalogResult<ImportReport> {
        if !self.is_empty() {
            return Err(CatalogError::NotBlank { count: self.len() });
        }
        Ok(self.import(seed))
    }

    /// Pretty JSON array in [`natural_order`].
    pub fn export_json(&self) -> CatalogResult<String> {
        Ok(serde_json::to_string_pretty(&self.ordered())?)
    }
}

/// Parses a seed document: a JSON array of question objects.
pub fn parse_seed(bytes: &[u8]) -> CatalogResult<Vec<Value>> {
    match serde_json::from_slice::<Value>(bytes)? {
        Value::Array(entries) => Ok(entries),
        _ => Err(CatalogError::NotAnArray),
    }
}

/// Reads and parses a seed file.
pub fn read_seed(path: &Path) -> CatalogResult<Vec<Value>> {
    if !path.exists() {
        return Err(CatalogError::SeedNotFound {
            path: path.to_path_buf(),
        });
    }
    parse_seed(&std::fs::read(path)?)
}
