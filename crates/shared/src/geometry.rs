use serde::{Deserialize, Serialize};

use crate::error::QuizError;

/// A point in either screen or map units, depending on context.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Point { x, y }
    }

    /// Euclidean distance between two points.
    pub fn distance(self, other: Point) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn midpoint(self, other: Point) -> Point {
        Point {
            x: (self.x + other.x) / 2.0,
            y: (self.y + other.y) / 2.0,
        }
    }

    pub fn delta_from(self, origin: Point) -> Point {
        Point {
            x: self.x - origin.x,
            y: self.y - origin.y,
        }
    }
}

/// Axis-aligned rectangle in map units.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

/// The visible window into map coordinates.
pub type ViewRect = Rect;

/// Bounding geometry of a region in map coordinates.
pub type BoundingBox = Rect;

/// Used when a view box string cannot be parsed.
pub const FALLBACK_VIEW_BOX: Rect = Rect {
    x: 0.0,
    y: 0.0,
    w: 900.0,
    h: 800.0,
};

impl Rect {
    pub const fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Rect { x, y, w, h }
    }

    pub fn area(&self) -> f64 {
        self.w * self.h
    }

    pub fn center(&self) -> Point {
        Point {
            x: self.x + self.w / 2.0,
            y: self.y + self.h / 2.0,
        }
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x <= self.x + self.w && p.y >= self.y && p.y <= self.y + self.h
    }

    /// Grow the rectangle by `pad` on every side.
    pub fn inflate(&self, pad: f64) -> Rect {
        Rect {
            x: self.x - pad,
            y: self.y - pad,
            w: self.w + pad * 2.0,
            h: self.h + pad * 2.0,
        }
    }

    pub fn approx_eq(&self, other: &Rect, eps: f64) -> bool {
        (self.x - other.x).abs() < eps
            && (self.y - other.y).abs() < eps
            && (self.w - other.w).abs() < eps
            && (self.h - other.h).abs() < eps
    }

    /// Format as an SVG `viewBox` attribute value.
    pub fn to_view_box(&self) -> String {
        format!("{} {} {} {}", self.x, self.y, self.w, self.h)
    }
}

/// Parse an SVG `viewBox` string (`"x y w h"`, space or comma separated).
/// Anything malformed yields [`FALLBACK_VIEW_BOX`].
pub fn parse_view_box(raw: &str) -> Rect {
    let parts: Vec<f64> = raw
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<f64>().unwrap_or(f64::NAN))
        .collect();

    match parts.as_slice() {
        [x, y, w, h] if parts.iter().all(|n| n.is_finite()) => Rect::new(*x, *y, *w, *h),
        _ => FALLBACK_VIEW_BOX,
    }
}

/// Placement of the render target on screen.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ContainerRect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl ContainerRect {
    pub const fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        ContainerRect {
            left,
            top,
            width,
            height,
        }
    }

    pub fn is_degenerate(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }
}

/// Uniform "contain/meet" transform from map units to screen units.
///
/// `screen = map * scale + (tx, ty)`. The axis with spare room is centered,
/// exactly like `preserveAspectRatio="xMidYMid meet"`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitTransform {
    pub scale: f64,
    pub tx: f64,
    pub ty: f64,
}

impl FitTransform {
    pub fn new(view: &ViewRect, container: &ContainerRect) -> Result<Self, QuizError> {
        if container.is_degenerate() || !(view.w > 0.0 && view.h > 0.0) {
            return Err(QuizError::DegenerateViewport {
                width: container.width,
                height: container.height,
            });
        }

        let sx = container.width / view.w;
        let sy = container.height / view.h;
        let scale = sx.min(sy);

        let mut tx = -view.x * scale;
        let mut ty = -view.y * scale;
        if sx < sy {
            // Width constrained: center vertically
            ty += (container.height - view.h * scale) / 2.0;
        } else {
            tx += (container.width - view.w * scale) / 2.0;
        }

        Ok(FitTransform {
            scale,
            tx: tx + container.left,
            ty: ty + container.top,
        })
    }

    pub fn screen_to_map(&self, screen: Point) -> Point {
        Point {
            x: (screen.x - self.tx) / self.scale,
            y: (screen.y - self.ty) / self.scale,
        }
    }

    pub fn map_to_screen(&self, map: Point) -> Point {
        Point {
            x: map.x * self.scale + self.tx,
            y: map.y * self.scale + self.ty,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_distance() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(3.0, 4.0);
        assert!((a.distance(b) - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_rect_center_and_contains() {
        let r = Rect::new(10.0, 20.0, 100.0, 50.0);
        let c = r.center();
        assert!((c.x - 60.0).abs() < 1e-9);
        assert!((c.y - 45.0).abs() < 1e-9);
        assert!(r.contains(c));
        assert!(!r.contains(Point::new(5.0, 30.0)));
        assert!(r.inflate(10.0).contains(Point::new(5.0, 30.0)));
    }

    #[test]
    fn test_parse_view_box_spaces_and_commas() {
        assert_eq!(parse_view_box("50 50 700 700"), Rect::new(50.0, 50.0, 700.0, 700.0));
        assert_eq!(parse_view_box("130,-20, 800 800"), Rect::new(130.0, -20.0, 800.0, 800.0));
    }

    #[test]
    fn test_parse_view_box_fallback() {
        assert_eq!(parse_view_box(""), FALLBACK_VIEW_BOX);
        assert_eq!(parse_view_box("1 2 3"), FALLBACK_VIEW_BOX);
        assert_eq!(parse_view_box("0 0 abc 10"), FALLBACK_VIEW_BOX);
    }

    #[test]
    fn test_fit_width_constrained_centers_vertically() {
        // 800x600 container, 100x50 view: sx=8, sy=12 -> scale 8, 200px spare height
        let t = FitTransform::new(
            &Rect::new(0.0, 0.0, 100.0, 50.0),
            &ContainerRect::new(0.0, 0.0, 800.0, 600.0),
        )
        .unwrap();
        assert!((t.scale - 8.0).abs() < 1e-9);
        assert!((t.tx - 0.0).abs() < 1e-9);
        assert!((t.ty - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_fit_height_constrained_centers_horizontally() {
        let t = FitTransform::new(
            &Rect::new(0.0, 0.0, 100.0, 100.0),
            &ContainerRect::new(10.0, 20.0, 800.0, 600.0),
        )
        .unwrap();
        assert!((t.scale - 6.0).abs() < 1e-9);
        assert!((t.tx - (10.0 + 100.0)).abs() < 1e-9);
        assert!((t.ty - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_fit_round_trip() {
        let t = FitTransform::new(
            &Rect::new(370.0, 310.0, 280.0, 280.0),
            &ContainerRect::new(12.0, 34.0, 1024.0, 700.0),
        )
        .unwrap();
        let map = Point::new(512.5, 400.25);
        let back = t.screen_to_map(t.map_to_screen(map));
        assert!((back.x - map.x).abs() < 1e-9);
        assert!((back.y - map.y).abs() < 1e-9);
    }

    #[test]
    fn test_fit_degenerate_container() {
        let err = FitTransform::new(
            &Rect::new(0.0, 0.0, 100.0, 100.0),
            &ContainerRect::new(0.0, 0.0, 0.0, 600.0),
        );
        assert!(matches!(err, Err(QuizError::DegenerateViewport { .. })));
    }
}
