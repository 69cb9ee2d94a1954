pub mod confidence;
pub mod field;
pub mod geometry;
pub mod money;
pub mod row;

pub use confidence::{Confidence, ConfidenceTier};
pub use field::{Column, FieldKind};
pub use geometry::{iou, BoundingBox};
pub use money::Money;
pub use row::{ConfidenceRow, Row, RowBuilder};
