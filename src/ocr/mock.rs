use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use super::encode::EncodedImage;
use super::error::{OcrError, OcrResult};
use super::vision::VisionBackend;

pub const MOCK_VISION_MODEL: &str = "mock-vision";

/// Scripted [`VisionBackend`] that counts calls.
///
/// Replies are consumed in order; once exhausted the default reply repeats.
#[derive(Debug)]
pub struct MockVisionBackend {
    model: String,
    default_reply: Option<String>,
    scripted: Mutex<Vec<Option<String>>>,
    calls: AtomicUsize,
}

impl MockVisionBackend {
    /// Always answers `reply`.
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            model: MOCK_VISION_MODEL.to_string(),
            default_reply: Some(reply.into()),
            scripted: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Always fails with [`OcrError::EmptyResponse`].
    pub fn failing() -> Self {
        Self {
            default_reply: None,
            ..Self::new("")
        }
    }

    /// Answers `replies` in order (`None` fails that call), then falls back to the default.
    pub fn with_script<I>(mut self, replies: I) -> Self
    where
        I: IntoIterator<Item = Option<String>>,
    {
        let mut script: Vec<Option<String>> = replies.into_iter().collect();
        script.reverse();
        self.scripted = Mutex::new(script);
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VisionBackend for MockVisionBackend {
    fn model(&self) -> &str {
        &self.model
    }

    async fn transcribe(&self, _image: &EncodedImage, _max_tokens: u32) -> OcrResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let reply = match self.scripted.lock().pop() {
            Some(scripted) => scripted,
            None => self.default_reply.clone(),
        };

        match reply {
            Some(text) if !text.trim().is_empty() => Ok(text.trim().to_string()),
            _ => Err(OcrError::EmptyResponse),
        }
    }
}
