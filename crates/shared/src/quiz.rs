//! The quiz coordinator: one owner for the loaded map, the viewport, the
//! gesture machine, the session and the frame handles.
//!
//! Hosts feed it pointer, wheel and frame callbacks and render from its
//! accessors. Nothing here touches a DOM.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::clock::{Clock, FrameId, FrameRequester, Millis};
use crate::error::QuizError;
use crate::geometry::{ContainerRect, Point, ViewRect, FALLBACK_VIEW_BOX};
use crate::gesture::{GestureConfig, GestureContext, GestureEvent, GestureMachine, HitTester, PointerInput};
use crate::models::MapSource;
use crate::picker::TargetPicker;
use crate::regions::{IndexHitTester, RegionId, RegionIndex};
use crate::session::{GameSession, Phase, SessionConfig, SessionEvent};
use crate::viewport::{Viewport, ViewportConfig};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct QuizConfig {
    pub viewport: ViewportConfig,
    pub gesture: GestureConfig,
    pub session: SessionConfig,
    /// Extra hit margin around micro regions, in screen units.
    pub micro_hit_padding: f64,
}

impl Default for QuizConfig {
    fn default() -> Self {
        Self {
            viewport: ViewportConfig::default(),
            gesture: GestureConfig::default(),
            session: SessionConfig::default(),
            micro_hit_padding: 15.0,
        }
    }
}

/// What changed while servicing one frame callback.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameUpdate {
    /// The new view, if a buffered update was flushed.
    pub view: Option<ViewRect>,
    /// The running time, if the session ticked.
    pub elapsed: Option<Millis>,
}

pub struct Quiz {
    config: QuizConfig,
    map_key: Option<String>,
    index: Arc<RegionIndex>,
    viewport: Viewport,
    gestures: GestureMachine,
    session: GameSession,
    frames: Box<dyn FrameRequester>,
    flush_frame: Option<FrameId>,
    tick_frame: Option<FrameId>,
}

impl Quiz {
    pub fn new(
        config: QuizConfig,
        clock: Box<dyn Clock>,
        picker: Box<dyn TargetPicker>,
        frames: Box<dyn FrameRequester>,
    ) -> Self {
        Quiz {
            config,
            map_key: None,
            index: Arc::new(RegionIndex::default()),
            viewport: Viewport::new(FALLBACK_VIEW_BOX, config.viewport),
            gestures: GestureMachine::new(config.gesture),
            session: GameSession::new(config.session, clock, picker),
            frames,
            flush_frame: None,
            tick_frame: None,
        }
    }

    pub fn config(&self) -> &QuizConfig {
        &self.config
    }

    pub fn map_key(&self) -> Option<&str> {
        self.map_key.as_deref()
    }

    pub fn index(&self) -> &Arc<RegionIndex> {
        &self.index
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn session(&self) -> &GameSession {
        &self.session
    }

    pub fn gestures(&self) -> &GestureMachine {
        &self.gestures
    }

    pub fn set_leaderboard_cutoff(&mut self, cutoff: Option<Millis>) {
        self.session.set_leaderboard_cutoff(cutoff);
    }

    /// Swap in a new map. Session, gestures and pending frames of the old map
    /// are dropped together with it.
    pub fn load_map(&mut self, source: &MapSource) {
        let index = Arc::new(source.build_index());
        tracing::debug!(key = %source.key, regions = index.len(), "Map loaded");
        self.replace_index(Some(source.key.clone()), index, source.base_view());
    }

    /// Like [`Quiz::load_map`] for an index built elsewhere.
    pub fn replace_index(&mut self, key: Option<String>, index: Arc<RegionIndex>, base: ViewRect) {
        self.session.reset();
        self.cancel_tick();
        self.cancel_flush();
        self.gestures.reset();
        self.viewport.reset(base);
        self.index = index;
        self.map_key = key;
    }

    pub fn start(&mut self) -> Result<Vec<SessionEvent>, QuizError> {
        let events = self.session.start(&self.index)?;
        self.sync_tick();
        Ok(events)
    }

    pub fn start_subset(&mut self, ids: &[RegionId]) -> Result<Vec<SessionEvent>, QuizError> {
        let events = self.session.start_subset(ids, &self.index)?;
        self.sync_tick();
        Ok(events)
    }

    /// Abandon the run and return to the full map view.
    pub fn reset(&mut self) -> bool {
        let was_active = self.session.reset();
        self.cancel_tick();
        self.cancel_flush();
        self.gestures.reset();
        let base = *self.viewport.base();
        self.viewport.reset(base);
        was_active
    }

    /// Topmost-first regions under a screen point, by bounding box.
    pub fn hit_test(&self, screen: Point, container: ContainerRect) -> Vec<RegionId> {
        self.index_hits(container).regions_at(screen)
    }

    pub fn map_to_screen(&self, map: Point, container: &ContainerRect) -> Option<Point> {
        self.viewport.map_to_screen(map, container).ok()
    }

    /// Pointer input hit-tested against the region index.
    pub fn pointer(&mut self, input: &PointerInput, container: ContainerRect) -> Vec<SessionEvent> {
        let index = Arc::clone(&self.index);
        let hits = self.hits_over(&index, container);
        self.pointer_with(input, container, &hits)
    }

    /// Pointer input with a host-supplied hit test (e.g. the rendered DOM).
    pub fn pointer_with(
        &mut self,
        input: &PointerInput,
        container: ContainerRect,
        hit: &dyn HitTester,
    ) -> Vec<SessionEvent> {
        let ctx = GestureContext {
            viewport: &self.viewport,
            container,
            hit,
        };
        let event = self.gestures.handle(input, &ctx);
        self.apply(event)
    }

    pub fn wheel(&mut self, point: Point, delta_y: f64, container: ContainerRect) {
        let event = self
            .gestures
            .wheel(point, delta_y, &self.viewport, &container);
        self.apply(event);
    }

    /// Focus left the render target: drop any half-finished gesture.
    pub fn blur(&mut self) {
        self.gestures.reset();
    }

    /// Service one frame callback previously requested through the
    /// [`FrameRequester`]. Unknown ids are ignored.
    pub fn on_frame(&mut self, frame: FrameId) -> FrameUpdate {
        let mut update = FrameUpdate::default();

        if self.flush_frame == Some(frame) {
            self.flush_frame = None;
            update.view = self.viewport.flush();
        }

        if self.tick_frame == Some(frame) {
            self.tick_frame = None;
            update.elapsed = self.session.tick();
            self.sync_tick();
        }

        update
    }

    fn apply(&mut self, event: Option<GestureEvent>) -> Vec<SessionEvent> {
        match event {
            Some(GestureEvent::Pan(view))
            | Some(GestureEvent::PinchZoom(view))
            | Some(GestureEvent::WheelZoom(view)) => {
                if self.viewport.schedule_update(view) {
                    self.flush_frame = Some(self.frames.request_frame());
                }
                Vec::new()
            }
            Some(GestureEvent::Click { candidates, point }) => self.guess(candidates, point),
            None => Vec::new(),
        }
    }

    fn guess(&mut self, candidates: Vec<RegionId>, point: Point) -> Vec<SessionEvent> {
        let known: Vec<RegionId> = candidates
            .into_iter()
            .filter(|id| {
                let found = self.index.contains(id);
                if !found {
                    tracing::trace!(id = %id, "Dropping hit outside the region index");
                }
                found
            })
            .collect();
        if known.is_empty() {
            return Vec::new();
        }

        let events = self.session.submit_guess(&known, point, &self.index);
        self.sync_tick();
        events
    }

    fn index_hits(&self, container: ContainerRect) -> IndexHitTester<'_> {
        self.hits_over(&self.index, container)
    }

    /// Hit tester over `index` under the current view; the borrow of `index`
    /// is independent of `self`.
    fn hits_over<'a>(&self, index: &'a RegionIndex, container: ContainerRect) -> IndexHitTester<'a> {
        IndexHitTester {
            index,
            view: *self.viewport.current(),
            container,
            micro_padding: self.config.micro_hit_padding,
        }
    }

    /// Keep exactly one tick frame pending while running, none otherwise.
    fn sync_tick(&mut self) {
        if self.session.phase() == Phase::Running {
            if self.tick_frame.is_none() {
                self.tick_frame = Some(self.frames.request_frame());
            }
        } else {
            self.cancel_tick();
        }
    }

    fn cancel_tick(&mut self) {
        if let Some(id) = self.tick_frame.take() {
            self.frames.cancel_frame(id);
        }
    }

    fn cancel_flush(&mut self) {
        self.viewport.cancel_pending();
        if let Some(id) = self.flush_frame.take() {
            self.frames.cancel_frame(id);
        }
    }
}
