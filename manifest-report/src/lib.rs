pub mod html;
pub mod pdf;

pub use html::render_manifest;
pub use pdf::{ChromiumPdfRenderer, PdfRenderer};

use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("Report I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to launch browser '{path}': {source}")]
    Launch {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Browser exited with an error: {0}")]
    Browser(String),
    #[error("PDF rendering timed out after {0:?}")]
    Timeout(Duration),
}
