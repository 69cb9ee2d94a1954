use std::cmp::Ordering;

use chequera_core::BoundingBox;

use crate::types::{MatchResult, OcrLine};

/// A line held in the top-k set together with its overlap score.
#[derive(Debug, Clone, Copy)]
struct Candidate<'a> {
    line: &'a OcrLine,
    iou: f32,
}

/// Match one expected box against every line on the page.
///
/// Keeps the `max_matches` lines with the highest IoU (a `max_matches` of
/// zero is treated as one). A line enters the set while there is room or when
/// it beats the weakest held score; on overflow the weakest candidate is
/// evicted, and among equal scores the earliest inserted one goes first.
///
/// Kept lines are joined in reading order (top, then left). Confidence and
/// IoU are the minimum over kept lines.
pub fn match_field(expected: &BoundingBox, lines: &[OcrLine], max_matches: usize) -> MatchResult {
    let capacity = max_matches.max(1);
    let mut held: Vec<Candidate<'_>> = Vec::with_capacity(capacity + 1);

    for line in lines {
        let iou = expected.iou(&line.bbox);
        let admit = held.len() < capacity || weakest(&held).is_some_and(|(_, min)| iou > min);
        if !admit {
            continue;
        }
        held.push(Candidate { line, iou });
        if held.len() > capacity {
            if let Some((idx, _)) = weakest(&held) {
                held.remove(idx);
            }
        }
    }

    if held.is_empty() {
        return MatchResult::empty();
    }

    // Stable sort: identical positions keep insertion order.
    held.sort_by(|a, b| reading_order(&a.line.bbox, &b.line.bbox));

    let text = held
        .iter()
        .map(|c| c.line.text.as_str())
        .collect::<Vec<_>>()
        .join(" ");
    let confidence = held.iter().map(|c| c.line.confidence).fold(f32::INFINITY, f32::min);
    let iou = held.iter().map(|c| c.iou).fold(f32::INFINITY, f32::min);

    MatchResult { text, confidence, iou }
}

/// Index and score of the lowest-scoring candidate; the first one on ties.
fn weakest(held: &[Candidate<'_>]) -> Option<(usize, f32)> {
    held.iter()
        .enumerate()
        .fold(None, |best: Option<(usize, f32)>, (idx, c)| match best {
            Some((_, min)) if c.iou >= min => best,
            _ => Some((idx, c.iou)),
        })
}

/// Top-to-bottom, then left-to-right.
pub(crate) fn reading_order(a: &BoundingBox, b: &BoundingBox) -> Ordering {
    a.top.total_cmp(&b.top).then_with(|| a.left.total_cmp(&b.left))
}
