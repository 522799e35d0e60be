//! Gesture state machine: raw pointer contacts in, pan / zoom / click out.
//!
//! # State machine
//!
//! - `Idle`: no gesture. Contacts left over from a pinch may still be tracked
//!   but are inert until every contact lifts.
//! - `SingleCandidate`: one contact, not yet moved past the drag threshold.
//! - `Dragging`: one contact, moved past the threshold. Emits `Pan`.
//! - `Pinching`: two or more contacts. Emits `PinchZoom`.
//!
//! # Invariants
//!
//! 1. A contact that started dragging never produces a `Click`.
//! 2. Every pan and pinch view is computed from the baseline frozen at the
//!    start of the gesture, never from the previous move.
//! 3. After cancel or focus loss, no event is emitted until a fresh contact.

use serde::{Deserialize, Serialize};

use crate::geometry::{ContainerRect, Point, ViewRect};
use crate::regions::RegionId;
use crate::viewport::{self, Viewport};

/// Thresholds for gesture recognition.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GestureConfig {
    /// Movement (screen units, either axis) before a press becomes a drag.
    pub drag_threshold: f64,
    /// Pinch scales within this fraction of 1 snap to exactly 1.
    pub pinch_deadzone: f64,
    /// Pinch moves are ignored while either finger distance is at most this.
    pub min_pinch_distance: f64,
    /// Zoom factor per wheel notch towards the user (zoom in).
    pub wheel_zoom_in: f64,
    /// Zoom factor per wheel notch away from the user (zoom out).
    pub wheel_zoom_out: f64,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            drag_threshold: 5.0,
            pinch_deadzone: 0.05,
            min_pinch_distance: 5.0,
            wheel_zoom_in: 1.08,
            wheel_zoom_out: 0.92,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PointerId(pub i64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerKind {
    Mouse,
    Touch,
    Pen,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerPhase {
    Down,
    Move,
    Up,
    Cancel,
}

/// One raw event for one physical contact, in screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerInput {
    pub id: PointerId,
    pub kind: PointerKind,
    pub phase: PointerPhase,
    pub point: Point,
    /// Whether the primary button is the one that changed (mouse only).
    pub primary: bool,
}

/// Finds the regions drawn under a screen point, topmost first.
pub trait HitTester {
    fn regions_at(&self, screen: Point) -> Vec<RegionId>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum GestureEvent {
    Pan(ViewRect),
    PinchZoom(ViewRect),
    WheelZoom(ViewRect),
    Click {
        candidates: Vec<RegionId>,
        point: Point,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureStateKind {
    Idle,
    SingleCandidate,
    Dragging,
    Pinching,
}

/// Everything a gesture needs to know about the world at event time.
pub struct GestureContext<'a> {
    pub viewport: &'a Viewport,
    pub container: ContainerRect,
    pub hit: &'a dyn HitTester,
}

#[derive(Debug, Clone, Copy)]
struct Contact {
    id: PointerId,
    point: Point,
}

#[derive(Debug, Clone)]
struct DragBaseline {
    pointer: PointerId,
    start: Point,
    view: ViewRect,
    container: ContainerRect,
    down_region: Option<RegionId>,
}

#[derive(Debug, Clone)]
struct PinchBaseline {
    distance: f64,
    view: ViewRect,
    container: ContainerRect,
    world_midpoint: Point,
}

#[derive(Debug, Clone, Default)]
enum GestureState {
    #[default]
    Idle,
    SingleCandidate(DragBaseline),
    Dragging(DragBaseline),
    Pinching(PinchBaseline),
}

#[derive(Debug, Default)]
pub struct GestureMachine {
    config: GestureConfig,
    contacts: Vec<Contact>,
    state: GestureState,
}

impl GestureMachine {
    pub fn new(config: GestureConfig) -> Self {
        Self {
            config,
            contacts: Vec::new(),
            state: GestureState::Idle,
        }
    }

    pub fn state_kind(&self) -> GestureStateKind {
        match self.state {
            GestureState::Idle => GestureStateKind::Idle,
            GestureState::SingleCandidate(_) => GestureStateKind::SingleCandidate,
            GestureState::Dragging(_) => GestureStateKind::Dragging,
            GestureState::Pinching(_) => GestureStateKind::Pinching,
        }
    }

    pub fn contact_count(&self) -> usize {
        self.contacts.len()
    }

    /// Region under the press that started the current single-contact gesture.
    pub fn pressed_region(&self) -> Option<&RegionId> {
        match &self.state {
            GestureState::SingleCandidate(b) | GestureState::Dragging(b) => b.down_region.as_ref(),
            _ => None,
        }
    }

    /// Feed one pointer event. Returns at most one gesture event.
    pub fn handle(&mut self, input: &PointerInput, ctx: &GestureContext<'_>) -> Option<GestureEvent> {
        match input.phase {
            PointerPhase::Down => {
                self.contact_down(input, ctx);
                None
            }
            PointerPhase::Move => self.contact_move(input, ctx),
            PointerPhase::Up => self.contact_up(input, ctx),
            PointerPhase::Cancel => {
                self.reset();
                None
            }
        }
    }

    /// Wheel input bypasses contact tracking and hit testing, and zooms
    /// around `point`.
    pub fn wheel(
        &self,
        point: Point,
        delta_y: f64,
        vp: &Viewport,
        container: &ContainerRect,
    ) -> Option<GestureEvent> {
        if delta_y == 0.0 {
            return None;
        }
        let factor = if delta_y > 0.0 {
            self.config.wheel_zoom_out
        } else {
            self.config.wheel_zoom_in
        };
        match viewport::zoom_view_at(vp.current(), vp.base(), vp.config(), point, factor, container) {
            Ok(view) => Some(GestureEvent::WheelZoom(view)),
            Err(e) => {
                tracing::trace!(error = %e, "Wheel zoom skipped");
                None
            }
        }
    }

    /// Drop every contact and baseline without emitting anything
    /// (contact cancel, focus loss, map swap).
    pub fn reset(&mut self) {
        self.contacts.clear();
        self.state = GestureState::Idle;
    }

    fn contact_down(&mut self, input: &PointerInput, ctx: &GestureContext<'_>) {
        if input.kind == PointerKind::Mouse && !input.primary {
            return;
        }

        match self.contacts.iter_mut().find(|c| c.id == input.id) {
            Some(c) => c.point = input.point,
            None => self.contacts.push(Contact {
                id: input.id,
                point: input.point,
            }),
        }

        match self.contacts.len() {
            1 => {
                self.state = GestureState::SingleCandidate(DragBaseline {
                    pointer: input.id,
                    start: input.point,
                    view: *ctx.viewport.current(),
                    container: ctx.container,
                    down_region: ctx.hit.regions_at(input.point).into_iter().next(),
                });
            }
            2 => self.begin_pinch(ctx),
            _ => {}
        }
    }

    fn contact_move(&mut self, input: &PointerInput, ctx: &GestureContext<'_>) -> Option<GestureEvent> {
        let contact = self.contacts.iter_mut().find(|c| c.id == input.id)?;
        contact.point = input.point;

        let state = std::mem::take(&mut self.state);
        let (next, event) = match state {
            GestureState::SingleCandidate(b) if b.pointer == input.id => {
                let d = input.point.delta_from(b.start);
                if d.x.abs() > self.config.drag_threshold || d.y.abs() > self.config.drag_threshold {
                    let event = pan_event(&b, input.point);
                    (GestureState::Dragging(b), event)
                } else {
                    (GestureState::SingleCandidate(b), None)
                }
            }
            GestureState::Dragging(b) if b.pointer == input.id => {
                let event = pan_event(&b, input.point);
                (GestureState::Dragging(b), event)
            }
            GestureState::Pinching(b) => {
                let event = self.pinch_event(&b, ctx);
                (GestureState::Pinching(b), event)
            }
            other => (other, None),
        };
        self.state = next;
        event
    }

    fn contact_up(&mut self, input: &PointerInput, ctx: &GestureContext<'_>) -> Option<GestureEvent> {
        let pos = self.contacts.iter().position(|c| c.id == input.id)?;
        self.contacts.remove(pos);

        match std::mem::take(&mut self.state) {
            GestureState::SingleCandidate(b) if b.pointer == input.id => Some(GestureEvent::Click {
                candidates: ctx.hit.regions_at(input.point),
                point: input.point,
            }),
            GestureState::Pinching(_) if self.contacts.len() >= 2 => {
                self.begin_pinch(ctx);
                None
            }
            // Dragging ends silently; a pinch dropping below two contacts
            // resets instead of turning into a drag.
            _ => None,
        }
    }

    fn begin_pinch(&mut self, ctx: &GestureContext<'_>) {
        let (a, b) = match self.contacts.as_slice() {
            [a, b, ..] => (a.point, b.point),
            _ => return,
        };
        let midpoint = a.midpoint(b);
        let view = *ctx.viewport.current();

        self.state = match viewport::screen_to_map(midpoint, &ctx.container, &view) {
            Ok(world_midpoint) => GestureState::Pinching(PinchBaseline {
                distance: a.distance(b),
                view,
                container: ctx.container,
                world_midpoint,
            }),
            Err(e) => {
                tracing::trace!(error = %e, "Pinch ignored");
                GestureState::Idle
            }
        };
    }

    fn pinch_event(&self, b: &PinchBaseline, ctx: &GestureContext<'_>) -> Option<GestureEvent> {
        let (p0, p1) = match self.contacts.as_slice() {
            [p0, p1, ..] => (p0.point, p1.point),
            _ => return None,
        };
        let distance = p0.distance(p1);
        if distance <= self.config.min_pinch_distance || b.distance <= self.config.min_pinch_distance {
            return None;
        }

        let mut scale = distance / b.distance;
        if (scale - 1.0).abs() < self.config.pinch_deadzone {
            scale = 1.0;
        }

        let vp = ctx.viewport;
        match viewport::pinch_view(
            &b.view,
            &b.container,
            b.world_midpoint,
            p0.midpoint(p1),
            scale,
            vp.base(),
            vp.config(),
        ) {
            Ok(view) => Some(GestureEvent::PinchZoom(view)),
            Err(e) => {
                tracing::trace!(error = %e, "Pinch move skipped");
                None
            }
        }
    }
}

fn pan_event(b: &DragBaseline, point: Point) -> Option<GestureEvent> {
    match viewport::pan_view(point.delta_from(b.start), &b.view, &b.container) {
        Ok(view) => Some(GestureEvent::Pan(view)),
        Err(e) => {
            tracing::trace!(error = %e, "Pan skipped");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::viewport::ViewportConfig;

    const EPS: f64 = 1e-9;

    struct FixedHits(Vec<RegionId>);

    impl HitTester for FixedHits {
        fn regions_at(&self, _screen: Point) -> Vec<RegionId> {
            self.0.clone()
        }
    }

    fn viewport() -> Viewport {
        // Map and screen units coincide: 800x600 view in an 800x600 container.
        Viewport::new(ViewRect::new(0.0, 0.0, 800.0, 600.0), ViewportConfig::default())
    }

    fn touch(id: i64, phase: PointerPhase, x: f64, y: f64) -> PointerInput {
        PointerInput {
            id: PointerId(id),
            kind: PointerKind::Touch,
            phase,
            point: Point::new(x, y),
            primary: true,
        }
    }

    struct Harness {
        machine: GestureMachine,
        viewport: Viewport,
        hits: FixedHits,
        container: ContainerRect,
    }

    impl Harness {
        fn new() -> Self {
            Harness {
                machine: GestureMachine::new(GestureConfig::default()),
                viewport: viewport(),
                hits: FixedHits(vec![RegionId::from("AT"), RegionId::from("DE")]),
                container: ContainerRect::new(0.0, 0.0, 800.0, 600.0),
            }
        }

        fn send(&mut self, input: PointerInput) -> Option<GestureEvent> {
            let ctx = GestureContext {
                viewport: &self.viewport,
                container: self.container,
                hit: &self.hits,
            };
            self.machine.handle(&input, &ctx)
        }

        fn wheel(&self, delta_y: f64) -> Option<GestureEvent> {
            self.machine
                .wheel(Point::new(400.0, 300.0), delta_y, &self.viewport, &self.container)
        }
    }

    #[test]
    fn test_tap_emits_click_with_candidates() {
        let mut h = Harness::new();
        assert!(h.send(touch(1, PointerPhase::Down, 100.0, 100.0)).is_none());
        assert_eq!(h.machine.state_kind(), GestureStateKind::SingleCandidate);
        assert_eq!(h.machine.pressed_region(), Some(&RegionId::from("AT")));

        let event = h.send(touch(1, PointerPhase::Up, 100.0, 100.0));
        assert_eq!(
            event,
            Some(GestureEvent::Click {
                candidates: vec![RegionId::from("AT"), RegionId::from("DE")],
                point: Point::new(100.0, 100.0),
            })
        );
        assert_eq!(h.machine.state_kind(), GestureStateKind::Idle);
    }

    #[test]
    fn test_jitter_below_threshold_still_clicks() {
        let mut h = Harness::new();
        h.send(touch(1, PointerPhase::Down, 100.0, 100.0));
        assert!(h.send(touch(1, PointerPhase::Move, 105.0, 96.0)).is_none());
        assert_eq!(h.machine.state_kind(), GestureStateKind::SingleCandidate);
        assert!(matches!(
            h.send(touch(1, PointerPhase::Up, 105.0, 96.0)),
            Some(GestureEvent::Click { .. })
        ));
    }

    #[test]
    fn test_drag_pans_against_frozen_baseline() {
        let mut h = Harness::new();
        h.send(touch(1, PointerPhase::Down, 100.0, 100.0));

        let first = h.send(touch(1, PointerPhase::Move, 110.0, 100.0));
        assert_eq!(first, Some(GestureEvent::Pan(ViewRect::new(-10.0, 0.0, 800.0, 600.0))));
        assert_eq!(h.machine.state_kind(), GestureStateKind::Dragging);

        // Second move is measured from the press, not from the first move.
        let second = h.send(touch(1, PointerPhase::Move, 130.0, 90.0));
        assert_eq!(second, Some(GestureEvent::Pan(ViewRect::new(-30.0, 10.0, 800.0, 600.0))));
    }

    #[test]
    fn test_drag_release_emits_no_click() {
        let mut h = Harness::new();
        h.send(touch(1, PointerPhase::Down, 100.0, 100.0));
        h.send(touch(1, PointerPhase::Move, 200.0, 100.0));
        assert!(h.send(touch(1, PointerPhase::Up, 200.0, 100.0)).is_none());
        assert_eq!(h.machine.state_kind(), GestureStateKind::Idle);
    }

    #[test]
    fn test_pinch_zooms_around_baseline_world_point() {
        let mut h = Harness::new();
        h.send(touch(1, PointerPhase::Down, 300.0, 300.0));
        h.send(touch(2, PointerPhase::Down, 500.0, 300.0));
        assert_eq!(h.machine.state_kind(), GestureStateKind::Pinching);

        // Fingers spread to twice the distance around the same midpoint.
        let event = h.send(touch(2, PointerPhase::Move, 700.0, 300.0));
        h.send(touch(1, PointerPhase::Move, 100.0, 300.0));
        let Some(GestureEvent::PinchZoom(view)) = event else {
            panic!("expected pinch zoom, got {event:?}");
        };
        // Distance went 200 -> 400 with only finger 2 moved: scale 2, midpoint (500, 300).
        assert!((view.w - 400.0).abs() < EPS);
        assert!((view.h - 300.0).abs() < EPS);
        let under = viewport::screen_to_map(Point::new(500.0, 300.0), &h.container, &view).unwrap();
        assert!((under.x - 400.0).abs() < EPS);
        assert!((under.y - 300.0).abs() < EPS);
    }

    #[test]
    fn test_pinch_deadzone_snaps_scale() {
        let mut h = Harness::new();
        h.send(touch(1, PointerPhase::Down, 300.0, 300.0));
        h.send(touch(2, PointerPhase::Down, 500.0, 300.0));
        // 200 -> 206 is a 3% change: no zoom, only the midpoint shift pans.
        let event = h.send(touch(2, PointerPhase::Move, 506.0, 300.0));
        let Some(GestureEvent::PinchZoom(view)) = event else {
            panic!("expected pinch zoom, got {event:?}");
        };
        assert!((view.w - 800.0).abs() < EPS);
        assert!((view.x - (-3.0)).abs() < EPS);
    }

    #[test]
    fn test_pinch_ignores_tiny_distances() {
        let mut h = Harness::new();
        h.send(touch(1, PointerPhase::Down, 300.0, 300.0));
        h.send(touch(2, PointerPhase::Down, 302.0, 300.0));
        assert!(h.send(touch(2, PointerPhase::Move, 400.0, 300.0)).is_none());
    }

    #[test]
    fn test_pinch_end_does_not_resume_drag() {
        let mut h = Harness::new();
        h.send(touch(1, PointerPhase::Down, 300.0, 300.0));
        h.send(touch(2, PointerPhase::Down, 500.0, 300.0));
        assert!(h.send(touch(2, PointerPhase::Up, 500.0, 300.0)).is_none());
        assert_eq!(h.machine.state_kind(), GestureStateKind::Idle);
        assert_eq!(h.machine.contact_count(), 1);

        // The remaining finger is inert: no pan, no click on lift.
        assert!(h.send(touch(1, PointerPhase::Move, 400.0, 400.0)).is_none());
        assert!(h.send(touch(1, PointerPhase::Up, 400.0, 400.0)).is_none());
        assert_eq!(h.machine.contact_count(), 0);
    }

    #[test]
    fn test_cancel_discards_everything() {
        let mut h = Harness::new();
        h.send(touch(1, PointerPhase::Down, 100.0, 100.0));
        assert!(h.send(touch(1, PointerPhase::Cancel, 100.0, 100.0)).is_none());
        assert_eq!(h.machine.contact_count(), 0);
        assert!(h.send(touch(1, PointerPhase::Up, 100.0, 100.0)).is_none());
    }

    #[test]
    fn test_focus_loss_reset() {
        let mut h = Harness::new();
        h.send(touch(1, PointerPhase::Down, 100.0, 100.0));
        h.machine.reset();
        assert_eq!(h.machine.state_kind(), GestureStateKind::Idle);
        assert!(h.send(touch(1, PointerPhase::Up, 100.0, 100.0)).is_none());
    }

    #[test]
    fn test_secondary_mouse_button_ignored() {
        let mut h = Harness::new();
        let mut input = touch(1, PointerPhase::Down, 100.0, 100.0);
        input.kind = PointerKind::Mouse;
        input.primary = false;
        h.send(input);
        assert_eq!(h.machine.contact_count(), 0);
        assert_eq!(h.machine.state_kind(), GestureStateKind::Idle);
    }

    #[test]
    fn test_wheel_factors() {
        let h = Harness::new();
        let Some(GestureEvent::WheelZoom(out)) = h.wheel(120.0) else {
            panic!("expected wheel zoom");
        };
        assert!((out.w - 800.0 / 0.92).abs() < 1e-6);

        let Some(GestureEvent::WheelZoom(zoomed_in)) = h.wheel(-3.0) else {
            panic!("expected wheel zoom");
        };
        assert!((zoomed_in.w - 800.0 / 1.08).abs() < 1e-6);

        assert!(h.wheel(0.0).is_none());
    }

    #[test]
    fn test_wheel_ignores_hits_and_skips_degenerate_container() {
        let mut h = Harness::new();
        h.hits = FixedHits(Vec::new());
        assert!(matches!(h.wheel(-1.0), Some(GestureEvent::WheelZoom(_))));

        h.container = ContainerRect::new(0.0, 0.0, 800.0, 0.0);
        assert!(h.wheel(-1.0).is_none());
        assert_eq!(h.machine.state_kind(), GestureStateKind::Idle);
    }

    #[test]
    fn test_degenerate_container_suppresses_pan() {
        let mut h = Harness::new();
        h.container = ContainerRect::new(0.0, 0.0, 0.0, 0.0);
        h.send(touch(1, PointerPhase::Down, 100.0, 100.0));
        assert!(h.send(touch(1, PointerPhase::Move, 200.0, 100.0)).is_none());
        assert_eq!(h.machine.state_kind(), GestureStateKind::Dragging);
    }
}
