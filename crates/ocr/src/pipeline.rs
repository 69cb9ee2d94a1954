use std::path::Path;
use std::sync::Arc;

use chequera_core::{Confidence, ConfidenceRow, FieldKind, Row, RowBuilder};
use thiserror::Error;

use crate::cache::{CacheError, ResponseCache};
use crate::corrector::ConfidenceCorrector;
use crate::extract::{clean_and_uppercase, extract_amount, extract_numbers, split_place_and_date};
use crate::gazetteer::Gazetteer;
use crate::intake;
use crate::matcher::match_field;
use crate::normalize::{FieldNormalizer, Passthrough};
use crate::recognizer::{OcrBackend, OcrError};
use crate::template::{BankTemplate, DetectionStrategy, TemplateRegistry};
use crate::types::{OcrLine, TextractResponse};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Cannot derive a document id from {0}")]
    InvalidDocumentName(String),
    #[error("OCR recognition failed: {0}")]
    Ocr(#[from] OcrError),
    #[error("Response cache error: {0}")]
    Cache(#[from] CacheError),
}

/// A check whose bank was recognized and whose fields were read.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedCheck {
    pub bank_code: String,
    pub row: Row,
    pub confidence: ConfidenceRow,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DocumentOutcome {
    Processed(ProcessedCheck),
    /// No known bank in the page header. The document stays where it is.
    Skipped,
}

/// Orchestrates: cache → OCR → bank detection → per-field match → format →
/// normalize → confidence correction.
pub struct CheckPipeline<R: OcrBackend> {
    recognizer: R,
    registry: Arc<TemplateRegistry>,
    corrector: ConfidenceCorrector,
    normalizer: Box<dyn FieldNormalizer>,
    strategy: DetectionStrategy,
    cache: Option<ResponseCache>,
}

impl<R: OcrBackend> CheckPipeline<R> {
    pub fn new(recognizer: R, registry: Arc<TemplateRegistry>, gazetteer: Arc<Gazetteer>) -> Self {
        Self {
            recognizer,
            registry,
            corrector: ConfidenceCorrector::new(gazetteer),
            normalizer: Box::new(Passthrough),
            strategy: DetectionStrategy::default(),
            cache: None,
        }
    }

    pub fn with_strategy(mut self, strategy: DetectionStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_normalizer(mut self, normalizer: impl FieldNormalizer + 'static) -> Self {
        self.normalizer = Box::new(normalizer);
        self
    }

    pub fn with_cache(mut self, cache: ResponseCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn registry(&self) -> &TemplateRegistry {
        &self.registry
    }

    /// Process a document on disk. Its id is the file stem.
    pub async fn process_file(&self, path: &Path) -> Result<DocumentOutcome, PipelineError> {
        let document_id = intake::document_id(path)
            .ok_or_else(|| PipelineError::InvalidDocumentName(path.display().to_string()))?;
        let response = self.fetch_response(&document_id, path).await?;
        Ok(self.process_response(&document_id, &response))
    }

    async fn fetch_response(&self, document_id: &str, path: &Path) -> Result<TextractResponse, PipelineError> {
        if let Some(cache) = &self.cache {
            if let Some(hit) = cache.get(document_id).await? {
                tracing::debug!(document = document_id, "OCR response cache hit");
                return Ok(hit);
            }
        }

        let response = self.recognizer.detect_document_text(path)?;

        if let Some(cache) = &self.cache {
            cache.put(document_id, &response).await?;
        }
        Ok(response)
    }

    /// Turn an OCR response into a row and its corrected confidences.
    pub fn process_response(&self, document_id: &str, response: &TextractResponse) -> DocumentOutcome {
        let lines = response.lines();
        let Some(template) = self.registry.detect(&lines, self.strategy) else {
            tracing::warn!(document = document_id, lines = lines.len(), "No bank detected, skipping");
            return DocumentOutcome::Skipped;
        };

        let (row, raw) = self.read_fields(document_id, template, &lines);
        let confidence = self.corrector.correct(&row, raw);

        tracing::info!(
            document = document_id,
            bank = %template.code,
            flagged = confidence.flagged_columns().len(),
            "Check processed"
        );
        DocumentOutcome::Processed(ProcessedCheck {
            bank_code: template.code.clone(),
            row,
            confidence,
        })
    }

    fn read_fields(
        &self,
        document_id: &str,
        template: &BankTemplate,
        lines: &[OcrLine],
    ) -> (Row, ConfidenceRow) {
        let mut builder = RowBuilder::new(document_id, template.display_name.as_str());

        for kind in FieldKind::ALL {
            let m = match_field(template.boxes.get(kind), lines, template.max_matches(kind));
            tracing::debug!(
                document = document_id,
                field = %kind,
                text = %m.text,
                confidence = m.confidence,
                iou = m.iou,
                "Field matched"
            );
            let conf = Confidence::ocr(m.confidence);

            match kind {
                FieldKind::AccountName => {
                    let value = self.normalizer.normalize(kind, clean_and_uppercase(&m.text));
                    builder.account_name(value, conf)
                }
                FieldKind::AccountNumber => builder.account_number(extract_numbers(&m.text), conf),
                FieldKind::Amount => builder.amount(extract_amount(&m.text), conf),
                FieldKind::CheckNumber => builder.check_number(extract_numbers(&m.text), conf),
                FieldKind::ClientName => {
                    let value = self.normalizer.normalize(kind, clean_and_uppercase(&m.text));
                    builder.client_name(value, conf)
                }
                FieldKind::PlaceAndDate => {
                    let (date, city) = split_place_and_date(&m.text);
                    let date = self.normalizer.normalize_date(&m.text, date);
                    let city = self.normalizer.normalize(kind, city);
                    builder.place_and_date(date, city, conf)
                }
            };
        }

        builder.build()
    }
}
