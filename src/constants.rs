//! Cross-cutting, shared constants.
//!
//! The OCR tuning values travel together at runtime as [`OcrSettings`]; the constants
//! here are its defaults and are also what the config layer falls back to.

/// A page whose trimmed native text has at most this many characters is treated as scanned.
pub const MIN_NATIVE_TEXT_CHARS: usize = 50;

/// Rasterization resolution for OCR.
pub const DEFAULT_RENDER_DPI: u32 = 200;
pub const MIN_RENDER_DPI: u32 = 72;
pub const MAX_RENDER_DPI: u32 = 600;

/// JPEG quality used for the vision payload.
pub const DEFAULT_JPEG_QUALITY: u8 = 85;

/// Output cap for one OCR completion. Longer pages are truncated, not retried.
pub const DEFAULT_OCR_MAX_TOKENS: u32 = 4096;

/// Default vision model identifier.
pub const DEFAULT_OCR_MODEL: &str = "gpt-4o";

/// Consecutive dots that mark a table-of-contents dot leader.
pub const TOC_DOT_RUN: usize = 4;

/// Runtime OCR settings shared by the page text source and the vision call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OcrSettings {
    /// Rasterization DPI.
    pub render_dpi: u32,
    /// JPEG quality (1-100).
    pub jpeg_quality: u8,
    /// Native-text threshold for scanned-page detection.
    pub min_native_chars: usize,
    /// Max completion tokens per OCR call.
    pub max_tokens: u32,
}

impl Default for OcrSettings {
    fn default() -> Self {
        Self {
            render_dpi: DEFAULT_RENDER_DPI,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            min_native_chars: MIN_NATIVE_TEXT_CHARS,
            max_tokens: DEFAULT_OCR_MAX_TOKENS,
        }
    }
}

impl OcrSettings {
    /// Checks the settings against the supported ranges.
    pub fn validate(&self) -> Result<(), OcrSettingsError> {
        if !(MIN_RENDER_DPI..=MAX_RENDER_DPI).contains(&self.render_dpi) {
            return Err(OcrSettingsError::DpiOutOfRange {
                dpi: self.render_dpi,
            });
        }
        if self.jpeg_quality == 0 || self.jpeg_quality > 100 {
            return Err(OcrSettingsError::QualityOutOfRange {
                quality: self.jpeg_quality,
            });
        }
        if self.max_tokens == 0 {
            return Err(OcrSettingsError::ZeroMaxTokens);
        }
        Ok(())
    }

    /// Returns `true` if `text` carries enough native content to skip OCR.
    #[inline]
    pub fn has_native_content(&self, text: &str) -> bool {
        text.trim().chars().count() > self.min_native_chars
    }
}

/// Invalid [`OcrSettings`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum OcrSettingsError {
    #[error("render DPI {dpi} outside {}..={}", MIN_RENDER_DPI, MAX_RENDER_DPI)]
    DpiOutOfRange { dpi: u32 },

    #[error("JPEG quality {quality} outside 1..=100")]
    QualityOutOfRange { quality: u8 },

    #[error("OCR max tokens must be greater than zero")]
    ZeroMaxTokens,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings_are_valid() {
        let settings = OcrSettings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.render_dpi, 200);
        assert_eq!(settings.jpeg_quality, 85);
        assert_eq!(settings.max_tokens, 4096);
    }

    #[test]
    fn test_dpi_range() {
        let low = OcrSettings {
            render_dpi: 50,
            ..Default::default()
        };
        assert_eq!(
            low.validate(),
            Err(OcrSettingsError::DpiOutOfRange { dpi: 50 })
        );

        let high = OcrSettings {
            render_dpi: 1200,
            ..Default::default()
        };
        assert!(high.validate().is_err());
    }

    #[test]
    fn test_quality_range() {
        let zero = OcrSettings {
            jpeg_quality: 0,
            ..Default::default()
        };
        assert!(zero.validate().is_err());

        let over = OcrSettings {
            jpeg_quality: 101,
            ..Default::default()
        };
        assert!(over.validate().is_err());
    }

    #[test]
    fn test_native_content_threshold() {
        let settings = OcrSettings::default();
        let exactly_fifty = "x".repeat(50);
        let fifty_one = "x".repeat(51);

        assert!(!settings.has_native_content(""));
        assert!(!settings.has_native_content(&exactly_fifty));
        assert!(settings.has_native_content(&fifty_one));
        assert!(!settings.has_native_content(&format!("   {}   \n", exactly_fifty)));
    }
}
