//! Viewport transform engine.
//!
//! Owns the visible rectangle (`current`) in map coordinates and converts
//! between screen and map space. The math lives in pure functions taking
//! explicit inputs, so gesture baselines never depend on a live render target;
//! [`Viewport`] adds the per-frame update buffer on top.

use serde::{Deserialize, Serialize};

use crate::error::QuizError;
use crate::geometry::{ContainerRect, FitTransform, Point, ViewRect};

/// Zoom limits relative to the base view.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ViewportConfig {
    /// Smallest zoom, `current.w <= base.w / min_scale`.
    pub min_scale: f64,
    /// Largest zoom, `current.w >= base.w / max_scale`.
    pub max_scale: f64,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            min_scale: 0.5,
            max_scale: 30.0,
        }
    }
}

pub fn screen_to_map(
    screen: Point,
    container: &ContainerRect,
    view: &ViewRect,
) -> Result<Point, QuizError> {
    Ok(FitTransform::new(view, container)?.screen_to_map(screen))
}

pub fn map_to_screen(
    map: Point,
    container: &ContainerRect,
    view: &ViewRect,
) -> Result<Point, QuizError> {
    Ok(FitTransform::new(view, container)?.map_to_screen(map))
}

/// Clamp a candidate view size into the allowed zoom range.
pub fn clamp_size(w: f64, h: f64, base: &ViewRect, config: &ViewportConfig) -> (f64, f64) {
    (
        w.clamp(base.w / config.max_scale, base.w / config.min_scale),
        h.clamp(base.h / config.max_scale, base.h / config.min_scale),
    )
}

/// Zoom `current` by `factor` keeping the map point under `anchor` fixed.
pub fn zoom_view_at(
    current: &ViewRect,
    base: &ViewRect,
    config: &ViewportConfig,
    anchor: Point,
    factor: f64,
    container: &ContainerRect,
) -> Result<ViewRect, QuizError> {
    let p = screen_to_map(anchor, container, current)?;
    let (w, h) = clamp_size(current.w / factor, current.h / factor, base, config);

    let kx = (p.x - current.x) / current.w;
    let ky = (p.y - current.y) / current.h;

    Ok(ViewRect {
        x: p.x - kx * w,
        y: p.y - ky * h,
        w,
        h,
    })
}

/// Pan the baseline view by a screen-space delta measured from the gesture start.
///
/// The delta is converted with the baseline scale, never the live one.
pub fn pan_view(
    delta: Point,
    baseline_view: &ViewRect,
    baseline_container: &ContainerRect,
) -> Result<ViewRect, QuizError> {
    let t = FitTransform::new(baseline_view, baseline_container)?;
    Ok(ViewRect {
        x: baseline_view.x - delta.x / t.scale,
        y: baseline_view.y - delta.y / t.scale,
        w: baseline_view.w,
        h: baseline_view.h,
    })
}

/// Scale the baseline view by `scale` and place it so `world_anchor` sits
/// under the live pinch `midpoint`.
#[allow(clippy::too_many_arguments)]
pub fn pinch_view(
    baseline_view: &ViewRect,
    baseline_container: &ContainerRect,
    world_anchor: Point,
    midpoint: Point,
    scale: f64,
    base: &ViewRect,
    config: &ViewportConfig,
) -> Result<ViewRect, QuizError> {
    let (w, h) = clamp_size(baseline_view.w / scale, baseline_view.h / scale, base, config);

    // Transform of a view with the new size at the origin; its offsets tell us
    // where the origin must move for the anchor to land on the midpoint.
    let t = FitTransform::new(&ViewRect::new(0.0, 0.0, w, h), baseline_container)?;

    Ok(ViewRect {
        x: world_anchor.x + (t.tx - midpoint.x) / t.scale,
        y: world_anchor.y + (t.ty - midpoint.y) / t.scale,
        w,
        h,
    })
}

/// The live view plus its frame-coalesced update buffer.
#[derive(Debug, Clone)]
pub struct Viewport {
    config: ViewportConfig,
    base: ViewRect,
    current: ViewRect,
    pending: Option<ViewRect>,
}

impl Viewport {
    pub fn new(base: ViewRect, config: ViewportConfig) -> Self {
        Viewport {
            config,
            base,
            current: base,
            pending: None,
        }
    }

    pub fn config(&self) -> &ViewportConfig {
        &self.config
    }

    pub fn base(&self) -> &ViewRect {
        &self.base
    }

    pub fn current(&self) -> &ViewRect {
        &self.current
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn screen_to_map(&self, screen: Point, container: &ContainerRect) -> Result<Point, QuizError> {
        screen_to_map(screen, container, &self.current)
    }

    pub fn map_to_screen(&self, map: Point, container: &ContainerRect) -> Result<Point, QuizError> {
        map_to_screen(map, container, &self.current)
    }

    /// Anchored zoom from the last flushed view. Returns whether a frame must
    /// be requested to apply it.
    pub fn zoom_at(
        &mut self,
        anchor: Point,
        factor: f64,
        container: &ContainerRect,
    ) -> Result<bool, QuizError> {
        let next = zoom_view_at(
            &self.current,
            &self.base,
            &self.config,
            anchor,
            factor,
            container,
        )?;
        Ok(self.schedule_update(next))
    }

    pub fn pan_by(
        &mut self,
        delta: Point,
        baseline_view: &ViewRect,
        baseline_container: &ContainerRect,
    ) -> Result<bool, QuizError> {
        let next = pan_view(delta, baseline_view, baseline_container)?;
        Ok(self.schedule_update(next))
    }

    /// Buffer `next` for the coming frame; the last write before a flush wins.
    ///
    /// Returns `true` when nothing was pending, i.e. the caller has to request
    /// a frame.
    pub fn schedule_update(&mut self, next: ViewRect) -> bool {
        self.pending.replace(next).is_none()
    }

    /// Apply the buffered update, if any.
    pub fn flush(&mut self) -> Option<ViewRect> {
        let next = self.pending.take()?;
        self.current = next;
        Some(next)
    }

    pub fn cancel_pending(&mut self) {
        self.pending = None;
    }

    /// Replace the base view (map load) and jump to it.
    pub fn reset(&mut self, base: ViewRect) {
        self.base = base;
        self.current = base;
        self.pending = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-6;

    fn container() -> ContainerRect {
        ContainerRect::new(0.0, 0.0, 800.0, 600.0)
    }

    fn base() -> ViewRect {
        ViewRect::new(50.0, 50.0, 700.0, 700.0)
    }

    #[test]
    fn test_screen_to_map_center() {
        // 700x700 view in 800x600: scale 6/7, centered horizontally.
        let p = screen_to_map(Point::new(400.0, 300.0), &container(), &base()).unwrap();
        assert!((p.x - 400.0).abs() < EPS);
        assert!((p.y - 400.0).abs() < EPS);
    }

    #[test]
    fn test_screen_to_map_degenerate() {
        let empty = ContainerRect::new(0.0, 0.0, 800.0, 0.0);
        assert!(screen_to_map(Point::new(1.0, 1.0), &empty, &base()).is_err());
    }

    #[test]
    fn test_zoom_anchor_invariance() {
        let before = base();
        let anchors = [
            Point::new(400.0, 300.0),
            Point::new(120.0, 80.0),
            Point::new(700.0, 550.0),
        ];
        for anchor in anchors {
            for factor in [0.6, 1.08, 2.0, 7.5] {
                let after = zoom_view_at(
                    &before,
                    &base(),
                    &ViewportConfig::default(),
                    anchor,
                    factor,
                    &container(),
                )
                .unwrap();
                let p0 = screen_to_map(anchor, &container(), &before).unwrap();
                let p1 = screen_to_map(anchor, &container(), &after).unwrap();
                assert!((p0.x - p1.x).abs() < EPS, "x drift at {anchor:?} x{factor}");
                assert!((p0.y - p1.y).abs() < EPS, "y drift at {anchor:?} x{factor}");
            }
        }
    }

    #[test]
    fn test_zoom_reversibility() {
        let config = ViewportConfig::default();
        let start = base();
        let anchor = Point::new(400.0, 300.0);
        let zoomed = zoom_view_at(&start, &base(), &config, anchor, 2.0, &container()).unwrap();
        let back = zoom_view_at(&zoomed, &base(), &config, anchor, 0.5, &container()).unwrap();
        assert!(back.approx_eq(&start, EPS), "{back:?} != {start:?}");
    }

    #[test]
    fn test_zoom_clamps_to_scale_limits() {
        let config = ViewportConfig::default();
        let anchor = Point::new(400.0, 300.0);
        let deep = zoom_view_at(&base(), &base(), &config, anchor, 1000.0, &container()).unwrap();
        assert!((deep.w - 700.0 / 30.0).abs() < EPS);
        let wide = zoom_view_at(&base(), &base(), &config, anchor, 0.01, &container()).unwrap();
        assert!((wide.w - 1400.0).abs() < EPS);
        assert!((wide.h - 1400.0).abs() < EPS);
    }

    #[test]
    fn test_pan_uses_baseline_scale() {
        // Scale is 6/7, so 60 screen units are 70 map units.
        let next = pan_view(Point::new(60.0, -30.0), &base(), &container()).unwrap();
        assert!((next.x - (50.0 - 70.0)).abs() < EPS);
        assert!((next.y - (50.0 + 35.0)).abs() < EPS);
        assert!((next.w - 700.0).abs() < EPS);
    }

    #[test]
    fn test_pinch_keeps_world_anchor_under_midpoint() {
        let config = ViewportConfig::default();
        let start_mid = Point::new(300.0, 200.0);
        let world = screen_to_map(start_mid, &container(), &base()).unwrap();

        let live_mid = Point::new(340.0, 260.0);
        let next = pinch_view(&base(), &container(), world, live_mid, 1.6, &base(), &config).unwrap();

        assert!((next.w - 700.0 / 1.6).abs() < EPS);
        let under = screen_to_map(live_mid, &container(), &next).unwrap();
        assert!((under.x - world.x).abs() < EPS);
        assert!((under.y - world.y).abs() < EPS);
    }

    #[test]
    fn test_schedule_coalesces_last_writer_wins() {
        let mut vp = Viewport::new(base(), ViewportConfig::default());
        assert!(vp.schedule_update(ViewRect::new(1.0, 1.0, 100.0, 100.0)));
        assert!(!vp.schedule_update(ViewRect::new(2.0, 2.0, 100.0, 100.0)));
        assert!(!vp.schedule_update(ViewRect::new(3.0, 3.0, 100.0, 100.0)));
        // Nothing visible changes until the flush.
        assert_eq!(*vp.current(), base());

        let applied = vp.flush().unwrap();
        assert_eq!(applied, ViewRect::new(3.0, 3.0, 100.0, 100.0));
        assert_eq!(*vp.current(), applied);
        assert!(vp.flush().is_none());
    }

    #[test]
    fn test_cancel_pending_drops_update() {
        let mut vp = Viewport::new(base(), ViewportConfig::default());
        vp.schedule_update(ViewRect::new(1.0, 1.0, 100.0, 100.0));
        vp.cancel_pending();
        assert!(vp.flush().is_none());
        assert_eq!(*vp.current(), base());
    }

    #[test]
    fn test_zoom_at_reads_flushed_view() {
        let mut vp = Viewport::new(base(), ViewportConfig::default());
        let anchor = Point::new(400.0, 300.0);
        assert!(vp.zoom_at(anchor, 2.0, &container()).unwrap());
        assert!(!vp.zoom_at(anchor, 2.0, &container()).unwrap());
        // Both notches were computed from the same flushed view.
        let applied = vp.flush().unwrap();
        assert!((applied.w - 350.0).abs() < EPS);
    }

    #[test]
    fn test_zoom_at_degenerate_is_skipped() {
        let mut vp = Viewport::new(base(), ViewportConfig::default());
        let empty = ContainerRect::new(0.0, 0.0, 0.0, 0.0);
        assert!(vp.zoom_at(Point::new(1.0, 1.0), 2.0, &empty).is_err());
        assert!(!vp.has_pending());
    }
}
