use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle normalized to page fractions, anchored at `(left, top)`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub width: f32,
    pub height: f32,
    pub left: f32,
    pub top: f32,
}

impl BoundingBox {
    /// Non-finite or negative components are stored as `0.0`, which makes the
    /// box degenerate instead of poisoning later arithmetic.
    pub fn new(width: f32, height: f32, left: f32, top: f32) -> Self {
        Self {
            width: sanitize(width),
            height: sanitize(height),
            left: sanitize(left),
            top: sanitize(top),
        }
    }

    pub fn right(&self) -> f32 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.top + self.height
    }

    pub fn area(&self) -> f32 {
        self.width * self.height
    }

    pub fn is_degenerate(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// Whether the box starts in the top-left quarter of the page.
    pub fn in_top_left_quadrant(&self) -> bool {
        self.top < 0.5 && self.left < 0.5
    }

    /// Intersection over union with `other`, in `[0, 1]`.
    pub fn iou(&self, other: &BoundingBox) -> f32 {
        iou(self, other)
    }
}

fn sanitize(v: f32) -> f32 {
    if v.is_finite() && v > 0.0 {
        v
    } else {
        0.0
    }
}

/// Intersection over union of two boxes.
///
/// Returns `0.0` when the union has no area, so degenerate boxes never match.
pub fn iou(a: &BoundingBox, b: &BoundingBox) -> f32 {
    let left = a.left.max(b.left);
    let top = a.top.max(b.top);
    let right = a.right().min(b.right());
    let bottom = a.bottom().min(b.bottom());

    let intersection = (right - left).max(0.0) * (bottom - top).max(0.0);
    let union = a.area() + b.area() - intersection;

    if union > 0.0 {
        (intersection / union).clamp(0.0, 1.0)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bx(w: f32, h: f32, l: f32, t: f32) -> BoundingBox {
        BoundingBox::new(w, h, l, t)
    }

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn identical_boxes_are_one() {
        let b = bx(0.1, 0.1, 0.5, 0.5);
        assert!(approx(iou(&b, &b), 1.0));
    }

    #[test]
    fn disjoint_boxes_are_zero() {
        assert_eq!(iou(&bx(0.1, 0.1, 0.0, 0.0), &bx(0.1, 0.1, 0.5, 0.5)), 0.0);
    }

    #[test]
    fn half_shifted_box_is_one_third() {
        let v = iou(&bx(0.2, 0.2, 0.0, 0.0), &bx(0.2, 0.2, 0.1, 0.0));
        assert!(approx(v, 1.0 / 3.0), "iou was {v}");
    }

    #[test]
    fn symmetric() {
        let a = bx(0.3, 0.1, 0.05, 0.6);
        let b = bx(0.5, 0.12, 0.04, 0.6);
        assert_eq!(iou(&a, &b), iou(&b, &a));
    }

    #[test]
    fn touching_edges_do_not_overlap() {
        assert_eq!(iou(&bx(0.2, 0.2, 0.0, 0.0), &bx(0.2, 0.2, 0.2, 0.0)), 0.0);
    }

    #[test]
    fn degenerate_boxes_never_match() {
        let zero = BoundingBox::default();
        assert!(zero.is_degenerate());
        assert_eq!(iou(&zero, &zero), 0.0);
        assert_eq!(iou(&zero, &bx(0.1, 0.1, 0.0, 0.0)), 0.0);
    }

    #[test]
    fn non_finite_components_are_zeroed() {
        let b = bx(f32::NAN, 0.1, f32::INFINITY, -0.3);
        assert_eq!(b, bx(0.0, 0.1, 0.0, 0.0));
        assert_eq!(iou(&b, &bx(0.1, 0.1, 0.0, 0.0)), 0.0);
    }

    #[test]
    fn contained_box_ratio_is_area_ratio() {
        let outer = bx(0.4, 0.2, 0.0, 0.0);
        let inner = bx(0.2, 0.1, 0.1, 0.05);
        assert!(approx(iou(&outer, &inner), 0.25));
    }

    #[test]
    fn top_left_quadrant() {
        assert!(bx(0.3, 0.05, 0.1, 0.1).in_top_left_quadrant());
        assert!(!bx(0.3, 0.05, 0.6, 0.1).in_top_left_quadrant());
        assert!(!bx(0.3, 0.05, 0.1, 0.5).in_top_left_quadrant());
    }
}
