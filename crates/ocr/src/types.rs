use chequera_core::{BoundingBox, Confidence};
use serde::{Deserialize, Serialize};

// ── Textract `DetectDocumentText` response ───────────────────────────────────

/// The subset of a Textract `DetectDocumentText` response this crate reads.
///
/// Every nested field is optional so a malformed block degrades instead of
/// failing the whole document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TextractResponse {
    #[serde(default)]
    pub blocks: Vec<Block>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Block {
    #[serde(default)]
    pub block_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geometry: Option<Geometry>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Geometry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounding_box: Option<RawBoundingBox>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RawBoundingBox {
    #[serde(default)]
    pub width: Option<f32>,
    #[serde(default)]
    pub height: Option<f32>,
    #[serde(default)]
    pub left: Option<f32>,
    #[serde(default)]
    pub top: Option<f32>,
}

impl From<&RawBoundingBox> for BoundingBox {
    fn from(raw: &RawBoundingBox) -> Self {
        BoundingBox::new(
            raw.width.unwrap_or(0.0),
            raw.height.unwrap_or(0.0),
            raw.left.unwrap_or(0.0),
            raw.top.unwrap_or(0.0),
        )
    }
}

impl TextractResponse {
    /// The `LINE` blocks, in response order.
    pub fn lines(&self) -> Vec<OcrLine> {
        self.blocks
            .iter()
            .filter(|b| b.block_type == "LINE")
            .map(OcrLine::from)
            .collect()
    }
}

// ── Matcher input / output ───────────────────────────────────────────────────

/// One detected line of text on the page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OcrLine {
    pub text: String,
    /// OCR confidence in `[0, 100]`.
    pub confidence: f32,
    /// A line without geometry gets a zero-sized box at the origin.
    pub bbox: BoundingBox,
}

impl OcrLine {
    pub fn new(text: impl Into<String>, confidence: f32, bbox: BoundingBox) -> Self {
        Self { text: text.into(), confidence: Confidence::ocr(confidence).value(), bbox }
    }
}

impl From<&Block> for OcrLine {
    fn from(block: &Block) -> Self {
        let bbox = block
            .geometry
            .as_ref()
            .and_then(|g| g.bounding_box.as_ref())
            .map(BoundingBox::from)
            .unwrap_or_default();
        OcrLine::new(
            block.text.clone().unwrap_or_default(),
            block.confidence.unwrap_or(0.0),
            bbox,
        )
    }
}

/// Outcome of matching one template box against a page's lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub text: String,
    pub confidence: f32,
    pub iou: f32,
}

impl MatchResult {
    pub fn empty() -> Self {
        Self { text: String::new(), confidence: 0.0, iou: 0.0 }
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}
