use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{error, info};

use crate::ReportError;

#[async_trait]
pub trait PdfRenderer: Send + Sync {
    async fn render_pdf(&self, html: &str) -> Result<Vec<u8>, ReportError>;
}

/// Prints HTML to PDF with a headless Chromium/Chrome child process.
///
/// Each call works in its own temporary directory, which is removed when the
/// call returns. The child is killed if the timeout elapses first.
pub struct ChromiumPdfRenderer {
    chrome_path: PathBuf,
    timeout: Duration,
}

impl ChromiumPdfRenderer {
    pub fn new(chrome_path: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            chrome_path: chrome_path.into(),
            timeout,
        }
    }
}

#[async_trait]
impl PdfRenderer for ChromiumPdfRenderer {
    async fn render_pdf(&self, html: &str) -> Result<Vec<u8>, ReportError> {
        let workdir = tempfile::tempdir()?;
        let input = workdir.path().join("manifest.html");
        let output = workdir.path().join("manifest.pdf");
        tokio::fs::write(&input, html).await?;

        let mut command = Command::new(&self.chrome_path);
        command
            .args([
                "--headless",
                "--disable-gpu",
                "--no-sandbox",
                "--no-pdf-header-footer",
            ])
            .arg(format!("--print-to-pdf={}", output.display()))
            .arg(format!("file://{}", input.display()))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let run = tokio::time::timeout(self.timeout, command.output())
            .await
            .map_err(|_| {
                error!("PDF rendering exceeded {:?}", self.timeout);
                ReportError::Timeout(self.timeout)
            })?
            .map_err(|source| ReportError::Launch {
                path: self.chrome_path.display().to_string(),
                source,
            })?;

        if !run.status.success() {
            let stderr = String::from_utf8_lossy(&run.stderr).trim().to_string();
            error!("Browser exited with {}: {}", run.status, stderr);
            return Err(ReportError::Browser(format!("{}: {}", run.status, stderr)));
        }

        let bytes = tokio::fs::read(&output).await?;
        if !bytes.starts_with(b"%PDF") {
            return Err(ReportError::Browser("browser did not produce a PDF document".to_string()));
        }

        info!("Rendered PDF manifest ({} bytes)", bytes.len());
        Ok(bytes)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;

    fn script(dir: &std::path::Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    // One test so the fake browsers are never written while another test forks.
    #[tokio::test]
    async fn test_render_with_fake_browsers() {
        let dir = tempfile::tempdir().unwrap();
        let timeout = Duration::from_secs(10);

        let good = script(
            dir.path(),
            "good-chrome",
            r#"for arg in "$@"; do
  case "$arg" in
    --print-to-pdf=*) printf '%%PDF-1.4 fake' > "${arg#--print-to-pdf=}" ;;
  esac
done"#,
        );
        let failing = script(dir.path(), "failing-chrome", "echo 'no display' >&2\nexit 3");
        let silent = script(dir.path(), "silent-chrome", "exit 0");
        let slow = script(dir.path(), "slow-chrome", "sleep 5");

        let pdf = ChromiumPdfRenderer::new(&good, timeout)
            .render_pdf("<html><body>ok</body></html>")
            .await
            .unwrap();
        assert!(pdf.starts_with(b"%PDF"));

        let err = ChromiumPdfRenderer::new(&failing, timeout)
            .render_pdf("<html></html>")
            .await
            .unwrap_err();
        assert!(matches!(err, ReportError::Browser(ref msg) if msg.contains("no display")));

        let err = ChromiumPdfRenderer::new(&silent, timeout)
            .render_pdf("<html></html>")
            .await
            .unwrap_err();
        assert!(matches!(err, ReportError::Io(_)));

        let err = ChromiumPdfRenderer::new(&slow, Duration::from_millis(200))
            .render_pdf("<html></html>")
            .await
            .unwrap_err();
        assert!(matches!(err, ReportError::Timeout(_)));

        let err = ChromiumPdfRenderer::new(dir.path().join("missing-chrome"), timeout)
            .render_pdf("<html></html>")
            .await
            .unwrap_err();
        assert!(matches!(err, ReportError::Launch { .. }));
    }
}
