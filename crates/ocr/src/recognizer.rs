use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::types::TextractResponse;

#[derive(Debug, Error)]
pub enum OcrError {
    #[error("OCR output for {path} not found")]
    Missing { path: String },
    #[error("IO error reading OCR output: {0}")]
    Io(#[from] std::io::Error),
    #[error("Malformed OCR response: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("OCR engine error: {0}")]
    Engine(String),
}

/// Abstraction over a document text detector.
/// Implementations take the path of a scanned check and return the
/// `DetectDocumentText` response for it.
pub trait OcrBackend: Send + Sync {
    fn detect_document_text(&self, document: &Path) -> Result<TextractResponse, OcrError>;
}

// ── Mock backend (always available, used for tests) ───────────────────────────

/// Returns a pre-set response for every document.
pub struct MockRecognizer {
    pub response: TextractResponse,
}

impl MockRecognizer {
    pub fn new(response: TextractResponse) -> Self {
        Self { response }
    }
}

impl OcrBackend for MockRecognizer {
    fn detect_document_text(&self, _document: &Path) -> Result<TextractResponse, OcrError> {
        Ok(self.response.clone())
    }
}

// ── Sidecar backend ───────────────────────────────────────────────────────────

/// Reads a response saved next to the document as `<file>.json`
/// (`cheque.pdf` → `cheque.pdf.json`), as exported by an external OCR run.
#[derive(Debug, Clone, Copy, Default)]
pub struct SidecarRecognizer;

impl SidecarRecognizer {
    pub fn sidecar_path(document: &Path) -> PathBuf {
        let mut name = document.as_os_str().to_owned();
        name.push(".json");
        PathBuf::from(name)
    }
}

impl OcrBackend for SidecarRecognizer {
    fn detect_document_text(&self, document: &Path) -> Result<TextractResponse, OcrError> {
        let sidecar = Self::sidecar_path(document);
        let content = match std::fs::read_to_string(&sidecar) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(OcrError::Missing { path: sidecar.display().to_string() })
            }
            Err(e) => return Err(e.into()),
        };
        Ok(serde_json::from_str(&content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Block;

    fn response(text: &str) -> TextractResponse {
        TextractResponse {
            blocks: vec![Block {
                block_type: "LINE".into(),
                text: Some(text.into()),
                confidence: Some(99.0),
                geometry: None,
            }],
        }
    }

    #[test]
    fn mock_returns_preset_response() {
        let r = MockRecognizer::new(response("PICHINCHA"));
        let out = r.detect_document_text(Path::new("anything.pdf")).unwrap();
        assert_eq!(out.blocks[0].text.as_deref(), Some("PICHINCHA"));
    }

    #[test]
    fn sidecar_path_appends_json() {
        assert_eq!(
            SidecarRecognizer::sidecar_path(Path::new("/in/cheque.pdf")),
            PathBuf::from("/in/cheque.pdf.json")
        );
    }

    #[test]
    fn sidecar_reads_saved_response() {
        let dir = tempfile::tempdir().unwrap();
        let doc = dir.path().join("c1.pdf");
        std::fs::write(
            dir.path().join("c1.pdf.json"),
            r#"{"Blocks":[{"BlockType":"PAGE"},{"BlockType":"LINE","Text":"AUSTRO","Confidence":97.5}]}"#,
        )
        .unwrap();
        let out = SidecarRecognizer.detect_document_text(&doc).unwrap();
        assert_eq!(out.blocks.len(), 2);
        assert_eq!(out.lines().len(), 1);
    }

    #[test]
    fn sidecar_missing_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let err = SidecarRecognizer
            .detect_document_text(&dir.path().join("none.pdf"))
            .unwrap_err();
        assert!(matches!(err, OcrError::Missing { .. }));
    }

    #[test]
    fn sidecar_malformed_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bad.pdf.json"), "{not json").unwrap();
        let err = SidecarRecognizer
            .detect_document_text(&dir.path().join("bad.pdf"))
            .unwrap_err();
        assert!(matches!(err, OcrError::Malformed(_)));
    }
}
