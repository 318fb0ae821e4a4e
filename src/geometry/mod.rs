//! Geometric primitives shared by paths, clips and the drawing surface.

/// A 2D point in user or device space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    /// X coordinate
    pub x: f32,
    /// Y coordinate
    pub y: f32,
}

impl Point {
    /// Create a new point.
    ///
    /// # Examples
    ///
    /// ```
    /// use pdf_interp::geometry::Point;
    ///
    /// let point = Point::new(10.0, 20.0);
    /// assert_eq!(point.x, 10.0);
    /// assert_eq!(point.y, 20.0);
    /// ```
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// An axis-aligned rectangle stored as origin plus size.
///
/// Width and height may be negative for rectangles built from unsorted
/// corners (as PDF `re` and `/BBox` allow); [`Rect::sorted`] normalizes them.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    /// X coordinate of the origin corner
    pub x: f32,
    /// Y coordinate of the origin corner
    pub y: f32,
    /// Width of rectangle
    pub width: f32,
    /// Height of rectangle
    pub height: f32,
}

impl Rect {
    /// Create a new rectangle from position and dimensions.
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Create a rectangle from two corner points.
    ///
    /// # Examples
    ///
    /// ```
    /// use pdf_interp::geometry::Rect;
    ///
    /// let rect = Rect::from_points(10.0, 20.0, 110.0, 70.0);
    /// assert_eq!(rect.width, 100.0);
    /// assert_eq!(rect.height, 50.0);
    /// ```
    pub fn from_points(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self {
            x: x0,
            y: y0,
            width: x1 - x0,
            height: y1 - y0,
        }
    }

    /// Build a rectangle from a PDF rectangle array `[llx lly urx ury]`.
    pub fn from_pdf_array(values: &[f64]) -> Option<Self> {
        match values {
            [x0, y0, x1, y1] => {
                Some(Self::from_points(*x0 as f32, *y0 as f32, *x1 as f32, *y1 as f32))
            },
            _ => None,
        }
    }

    /// Get the left edge x-coordinate.
    pub fn left(&self) -> f32 {
        self.x
    }

    /// Get the right edge x-coordinate.
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    /// Get the top edge y-coordinate.
    pub fn top(&self) -> f32 {
        self.y
    }

    /// Get the bottom edge y-coordinate.
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Same rectangle with non-negative width and height.
    ///
    /// # Examples
    ///
    /// ```
    /// use pdf_interp::geometry::Rect;
    ///
    /// let rect = Rect::from_points(10.0, 10.0, 0.0, 0.0).sorted();
    /// assert_eq!((rect.x, rect.y, rect.width, rect.height), (0.0, 0.0, 10.0, 10.0));
    /// ```
    pub fn sorted(&self) -> Self {
        let (x0, x1) = (self.left().min(self.right()), self.left().max(self.right()));
        let (y0, y1) = (self.top().min(self.bottom()), self.top().max(self.bottom()));
        Self::from_points(x0, y0, x1, y1)
    }

    /// True when the rectangle covers no area.
    pub fn is_empty(&self) -> bool {
        self.width == 0.0 || self.height == 0.0
    }

    /// Smallest rectangle containing every point, or `None` for no points.
    pub fn bounding(points: impl IntoIterator<Item = Point>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let (mut x0, mut y0, mut x1, mut y1) = (first.x, first.y, first.x, first.y);
        for p in iter {
            x0 = x0.min(p.x);
            y0 = y0.min(p.y);
            x1 = x1.max(p.x);
            y1 = y1.max(p.y);
        }
        Some(Self::from_points(x0, y0, x1, y1))
    }

    /// The four corners, clockwise from the origin corner.
    pub fn corners(&self) -> [Point; 4] {
        [
            Point::new(self.left(), self.top()),
            Point::new(self.right(), self.top()),
            Point::new(self.right(), self.bottom()),
            Point::new(self.left(), self.bottom()),
        ]
    }
}
