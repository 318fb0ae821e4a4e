//! Path geometry accumulated by the path-construction operators.

use crate::content::graphics_state::Matrix;
use crate::geometry::{Point, Rect};

/// Rule deciding which regions of a self-intersecting path are inside.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FillRule {
    /// Nonzero winding number (`f`, `B`, `b`, `W`)
    #[default]
    NonZero,
    /// Even-odd (`f*`, `B*`, `b*`, `W*`)
    EvenOdd,
}

/// One segment of a path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathSegment {
    /// Begin a new subpath
    MoveTo(Point),
    /// Straight line to a point
    LineTo(Point),
    /// Cubic Bézier: two control points and the end point
    CurveTo(Point, Point, Point),
    /// Close the current subpath
    Close,
}

/// A path in user space, plus the fill rule it is painted or clipped with.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PathData {
    segments: Vec<PathSegment>,
    fill_rule: FillRule,
}

impl PathData {
    /// Create an empty path with nonzero fill.
    pub fn new() -> Self {
        Self::default()
    }

    /// Segments in insertion order.
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// True when no segment has been added.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Fill rule used when this path is filled or clipped.
    pub fn fill_rule(&self) -> FillRule {
        self.fill_rule
    }

    /// Change the fill rule.
    pub fn set_fill_rule(&mut self, rule: FillRule) {
        self.fill_rule = rule;
    }

    /// Start a subpath at `p`.
    pub fn move_to(&mut self, p: Point) {
        self.segments.push(PathSegment::MoveTo(p));
    }

    /// Line from the current point to `p`.
    pub fn line_to(&mut self, p: Point) {
        self.segments.push(PathSegment::LineTo(p));
    }

    /// Cubic curve from the current point.
    pub fn cubic_to(&mut self, c1: Point, c2: Point, end: Point) {
        self.segments.push(PathSegment::CurveTo(c1, c2, end));
    }

    /// Closed rectangle subpath, as `re` appends it.
    pub fn add_rect(&mut self, rect: Rect) {
        let [a, b, c, d] = rect.corners();
        self.move_to(a);
        self.line_to(b);
        self.line_to(c);
        self.line_to(d);
        self.close();
    }

    /// Close the current subpath. Closing an empty or already closed path is a no-op.
    pub fn close(&mut self) {
        match self.segments.last() {
            None | Some(PathSegment::Close) => {},
            Some(_) => self.segments.push(PathSegment::Close),
        }
    }

    /// Remove every segment and restore nonzero fill.
    pub fn reset(&mut self) {
        self.segments.clear();
        self.fill_rule = FillRule::NonZero;
    }

    /// The two end points when the path is exactly one straight line.
    pub fn as_line(&self) -> Option<(Point, Point)> {
        match self.segments.as_slice() {
            [PathSegment::MoveTo(a), PathSegment::LineTo(b)] => Some((*a, *b)),
            _ => None,
        }
    }

    /// Bounds of all points, control points included. Empty paths have zero bounds.
    pub fn bounds(&self) -> Rect {
        let points = self.segments.iter().flat_map(|seg| match *seg {
            PathSegment::MoveTo(p) | PathSegment::LineTo(p) => vec![p],
            PathSegment::CurveTo(c1, c2, p) => vec![c1, c2, p],
            PathSegment::Close => Vec::new(),
        });
        Rect::bounding(points).unwrap_or_default()
    }

    /// Copy of the path with every point mapped through `m`.
    pub fn transformed(&self, m: &Matrix) -> PathData {
        let map = |p: Point| m.transform_point(p.x, p.y);
        let segments = self
            .segments
            .iter()
            .map(|seg| match *seg {
                PathSegment::MoveTo(p) => PathSegment::MoveTo(map(p)),
                PathSegment::LineTo(p) => PathSegment::LineTo(map(p)),
                PathSegment::CurveTo(c1, c2, p) => PathSegment::CurveTo(map(c1), map(c2), map(p)),
                PathSegment::Close => PathSegment::Close,
            })
            .collect();
        PathData {
            segments,
            fill_rule: self.fill_rule,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_rect_is_closed_subpath() {
        let mut path = PathData::new();
        path.add_rect(Rect::new(0.0, 0.0, 100.0, 50.0));
        assert_eq!(path.segments().len(), 5);
        assert_eq!(path.segments()[4], PathSegment::Close);
        assert_eq!(path.bounds(), Rect::new(0.0, 0.0, 100.0, 50.0));
    }

    #[test]
    fn test_single_line_detection() {
        let mut path = PathData::new();
        path.move_to(Point::new(0.0, 0.0));
        path.line_to(Point::new(10.0, 0.0));
        assert!(path.as_line().is_some());
        path.line_to(Point::new(10.0, 10.0));
        assert!(path.as_line().is_none());
    }

    #[test]
    fn test_close_is_idempotent() {
        let mut path = PathData::new();
        path.close();
        assert!(path.is_empty());
        path.move_to(Point::new(1.0, 1.0));
        path.close();
        path.close();
        assert_eq!(path.segments().len(), 2);
    }

    #[test]
    fn test_curve_bounds_include_control_points() {
        let mut path = PathData::new();
        path.move_to(Point::new(0.0, 0.0));
        path.cubic_to(Point::new(0.0, 20.0), Point::new(10.0, 20.0), Point::new(10.0, 0.0));
        assert_eq!(path.bounds().height, 20.0);
    }

    #[test]
    fn test_reset_restores_nonzero() {
        let mut path = PathData::new();
        path.move_to(Point::new(1.0, 1.0));
        path.set_fill_rule(FillRule::EvenOdd);
        path.reset();
        assert!(path.is_empty());
        assert_eq!(path.fill_rule(), FillRule::NonZero);
    }
}
