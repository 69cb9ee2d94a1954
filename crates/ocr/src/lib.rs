pub mod cache;
pub mod corrector;
pub mod extract;
pub mod gazetteer;
pub mod intake;
pub mod matcher;
pub mod normalize;
pub mod pipeline;
pub mod recognizer;
pub mod template;
pub mod types;

pub use cache::{CacheError, ResponseCache};
pub use corrector::{ConfidenceCorrector, ConfidenceRule};
pub use gazetteer::{Gazetteer, GazetteerError};
pub use matcher::match_field;
pub use normalize::{FieldNormalizer, Passthrough};
pub use pipeline::{CheckPipeline, DocumentOutcome, PipelineError, ProcessedCheck};
pub use recognizer::{MockRecognizer, OcrBackend, OcrError, SidecarRecognizer};
pub use template::{detect_bank, BankTemplate, DetectionStrategy, TemplateError, TemplateRegistry};
pub use types::{MatchResult, OcrLine, TextractResponse};
