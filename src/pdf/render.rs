//! Page rasterization through poppler's `pdftoppm`.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use image::DynamicImage;
use tokio::process::Command;
use tracing::debug;

use super::error::{PdfError, PdfResult};

const DEFAULT_RENDER_TIMEOUT: Duration = Duration::from_secs(60);

/// Renders single pages to PNG with `pdftoppm` and decodes them.
#[derive(Debug, Clone)]
pub struct PdftoppmRasterizer {
    program: PathBuf,
    timeout: Duration,
}

impl Default for PdftoppmRasterizer {
    fn default() -> Self {
        Self {
            program: PathBuf::from("pdftoppm"),
            timeout: DEFAULT_RENDER_TIMEOUT,
        }
    }
}

impl PdftoppmRasterizer {
    /// Uses `program` instead of `pdftoppm` from `PATH`.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            ..Default::default()
        }
    }

    /// Overrides the per-page timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Renders page `page_index` (0-based) of `pdf` at `dpi`.
    pub async fn render(&self, pdf: &Path, page_index: usize, dpi: u32) -> PdfResult<DynamicImage> {
        let render_err = |reason: String| PdfError::Render {
            index: page_index,
            reason,
        };

        let work_dir = tempfile::tempdir()?;
        let prefix = work_dir.path().join("page");
        let page_number = (page_index + 1).to_string();

        let mut cmd = Command::new(&self.program);
        cmd.arg("-f")
            .arg(&page_number)
            .arg("-l")
            .arg(&page_number)
            .arg("-r")
            .arg(dpi.to_string())
            .arg("-png")
            .arg("-singlefile")
            .arg(pdf)
            .arg(&prefix)
            .kill_on_drop(true)
            .stdout(Stdio::null())
            .stderr(Stdio::piped());

        let child = cmd
            .spawn()
            .map_err(|e| render_err(format!("failed to spawn {}: {e}", self.program.display())))?;

        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(res) => res.map_err(|e| render_err(format!("failed waiting for pdftoppm: {e}")))?,
            Err(_) => {
                return Err(render_err(format!(
                    "pdftoppm timed out after {:?}",
                    self.timeout
                )));
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(render_err(format!(
                "pdftoppm exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        let png_path = prefix.with_extension("png");
        let bytes = tokio::fs::read(&png_path).await?;
        let image = image::load_from_memory(&bytes)
            .map_err(|e| render_err(format!("failed to decode rendered page: {e}")))?;

        debug!(
            page = page_index,
            dpi,
            width = image.width(),
            height = image.height(),
            "Rendered page"
        );

        Ok(image)
    }
}
