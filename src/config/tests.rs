use super::*;
use serial_test::serial;
use std::env;
use std::path::PathBuf;

fn with_env_vars<F, R>(vars: &[(&str, &str)], f: F) -> R
where
    F: FnOnce() -> R,
{
    // SAFETY: Test code only, we accept the thread-safety risk in tests.
    for (key, value) in vars {
        unsafe { env::set_var(key, value) };
    }

    let result = f();

    // SAFETY: Test code only, we accept the thread-safety risk in tests.
    for (key, _) in vars {
        unsafe { env::remove_var(key) };
    }

    result
}

fn clear_tenderlens_env() {
    // SAFETY: Test code only, we accept the thread-safety risk in tests.
    unsafe {
        env::remove_var("TENDERLENS_CACHE_PATH");
        env::remove_var("TENDERLENS_CACHE_CAPACITY");
        env::remove_var("TENDERLENS_RENDER_DPI");
        env::remove_var("TENDERLENS_JPEG_QUALITY");
        env::remove_var("TENDERLENS_MIN_NATIVE_CHARS");
        env::remove_var("TENDERLENS_OCR_MAX_TOKENS");
        env::remove_var("TENDERLENS_OCR_TIMEOUT_SECS");
        env::remove_var("TENDERLENS_PDFTOPPM_PATH");
        env::remove_var("TENDERLENS_HEADING_KEYWORDS");
        env::remove_var("OPENAI_API_KEY");
        env::remove_var("OPENAI_BASE_URL");
        env::remove_var("OPENAI_MODEL");
    }
}

#[test]
fn test_default_config() {
    let config = Config::default();

    assert_eq!(config.cache_path, PathBuf::from("./.data/ocr-cache"));
    assert_eq!(config.cache_capacity, 10_000);
    assert_eq!(config.ocr.render_dpi, 200);
    assert_eq!(config.ocr.jpeg_quality, 85);
    assert_eq!(config.ocr.min_native_chars, 50);
    assert_eq!(config.ocr.max_tokens, 4096);
    assert_eq!(config.ocr_timeout, Duration::from_secs(120));
    assert_eq!(config.pdftoppm_path, PathBuf::from("pdftoppm"));
    assert_eq!(
        config.heading_keywords,
        vec!["Award Criterion", "Criterion", "Section", "Question"]
    );
    assert!(config.openai_api_key.is_none());
    assert_eq!(config.openai_base_url, "https://api.openai.com/v1");
    assert_eq!(config.ocr_model, "gpt-4o");
    assert!(!config.has_ocr_backend());
}

#[test]
fn test_api_key_debug_is_redacted() {
    let config = Config {
        openai_api_key: Some(ApiKey::new("sk-secret-value")),
        ..Default::default()
    };

    let rendered = format!("{:?}", config);
    assert!(!rendered.contains("sk-secret-value"));
    assert!(rendered.contains("ApiKey(***)"));
    assert!(config.has_ocr_backend());
}

#[test]
#[serial]
fn test_from_env_with_defaults() {
    clear_tenderlens_env();

    let config = Config::from_env().expect("should parse with defaults");

    assert_eq!(config.ocr, OcrSettings::default());
    assert!(config.openai_api_key.is_none());
    assert!(config.validate().is_ok());
}

#[test]
#[serial]
fn test_from_env_ocr_overrides() {
    clear_tenderlens_env();

    with_env_vars(
        &[
            ("TENDERLENS_RENDER_DPI", "300"),
            ("TENDERLENS_JPEG_QUALITY", "70"),
            ("TENDERLENS_MIN_NATIVE_CHARS", "20"),
            ("TENDERLENS_OCR_MAX_TOKENS", "2048"),
            ("TENDERLENS_OCR_TIMEOUT_SECS", "30"),
        ],
        || {
            let config = Config::from_env().expect("should parse");
            assert_eq!(config.ocr.render_dpi, 300);
            assert_eq!(config.ocr.jpeg_quality, 70);
            assert_eq!(config.ocr.min_native_chars, 20);
            assert_eq!(config.ocr.max_tokens, 2048);
            assert_eq!(config.ocr_timeout, Duration::from_secs(30));
        },
    );
}

#[test]
#[serial]
fn test_from_env_invalid_number() {
    clear_tenderlens_env();

    with_env_vars(&[("TENDERLENS_RENDER_DPI", "high")], || {
        let result = Config::from_env();
        assert!(matches!(
            result,
            Err(ConfigError::InvalidNumber {
                name: "TENDERLENS_RENDER_DPI",
                ..
            })
        ));
    });
}

#[test]
#[serial]
fn test_from_env_openai_settings() {
    clear_tenderlens_env();

    with_env_vars(
        &[
            ("OPENAI_API_KEY", "  sk-test  "),
            ("OPENAI_BASE_URL", "http://localhost:11434/v1"),
            ("OPENAI_MODEL", "llava"),
        ],
        || {
            let config = Config::from_env().expect("should parse");
            assert_eq!(
                config.openai_api_key.as_ref().map(ApiKey::expose),
                Some("sk-test")
            );
            assert_eq!(config.openai_base_url, "http://localhost:11434/v1");
            assert_eq!(config.ocr_model, "llava");
        },
    );
}

#[test]
#[serial]
fn test_from_env_blank_api_key_disables_ocr() {
    clear_tenderlens_env();

    with_env_vars(&[("OPENAI_API_KEY", "   ")], || {
        let config = Config::from_env().expect("should parse");
        assert!(!config.has_ocr_backend());
    });
}

#[test]
#[serial]
fn test_from_env_heading_keywords() {
    clear_tenderlens_env();

    with_env_vars(
        &[("TENDERLENS_HEADING_KEYWORDS", "Lot, Schedule ,, Part")],
        || {
            let config = Config::from_env().expect("should parse");
            assert_eq!(config.heading_keywords, vec!["Lot", "Schedule", "Part"]);
        },
    );
}

#[test]
#[serial]
fn test_from_env_cache_path() {
    clear_tenderlens_env();

    with_env_vars(&[("TENDERLENS_CACHE_PATH", "/tmp/tenderlens-cache")], || {
        let config = Config::from_env().expect("should parse");
        assert_eq!(config.cache_path, PathBuf::from("/tmp/tenderlens-cache"));
    });
}

#[test]
fn test_validate_rejects_bad_dpi() {
    let config = Config {
        ocr: OcrSettings {
            render_dpi: 10,
            ..Default::default()
        },
        ..Default::default()
    };

    assert!(matches!(
        config.validate(),
        Err(ConfigError::OcrSettings(_))
    ));
}

#[test]
fn test_validate_rejects_empty_keywords() {
    let config = Config {
        heading_keywords: parse_keyword_list(" , "),
        ..Default::default()
    };

    assert!(matches!(
        config.validate(),
        Err(ConfigError::EmptyHeadingKeywords)
    ));
}

#[test]
fn test_validate_cache_path_is_file() {
    let file = tempfile::NamedTempFile::new().expect("temp file");
    let config = Config {
        cache_path: file.path().to_path_buf(),
        ..Default::default()
    };

    assert!(matches!(
        config.validate(),
        Err(ConfigError::NotADirectory { .. })
    ));
}

#[test]
fn test_validate_missing_cache_path_is_ok() {
    let dir = tempfile::tempdir().expect("temp dir");
    let config = Config {
        cache_path: dir.path().join("not-created-yet"),
        ..Default::default()
    };

    assert!(config.validate().is_ok());
}
