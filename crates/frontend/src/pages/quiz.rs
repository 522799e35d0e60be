use dioxus::prelude::*;
use gloo_timers::future::TimeoutFuture;
use mapquiz_shared::clock::{FrameQueue, Millis};
use mapquiz_shared::regions::RegionId;
use mapquiz_shared::session::{Phase, Resolution, RunOutcome, SessionEvent};
use mapquiz_shared::{Quiz, QuizConfig, QuizError};

use crate::api::{self, MapSummaryData};
use crate::components::help_overlay::HelpOverlay;
use crate::components::hud::{FoundList, Hud};
use crate::components::map_view::{MapView, MAP_CONTAINER_ID};
use crate::components::run_summary::RunSummary;
use crate::components::toast::ToastBanner;
use crate::coords;
use crate::notify::{self, MapLabel, Toast, ERROR_LABEL_MS, TOAST_MS};
use crate::platform::{MathRandomPicker, PerformanceClock};

/// Polling interval of the frame loop, about one display frame.
const FRAME_MS: u32 = 16;
const FLASH_MS: u32 = 600;

/// Ids of the regions failed in a finished run, in resolution order.
pub fn failed_ids(resolutions: &[Resolution]) -> Vec<RegionId> {
    resolutions
        .iter()
        .filter(|r| r.failed)
        .map(|r| r.id.clone())
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SpaceAction {
    Start,
    Reset,
}

/// Space starts from idle and resets a running or finished run.
fn space_action(phase: Phase) -> SpaceAction {
    match phase {
        Phase::Idle => SpaceAction::Start,
        Phase::Running | Phase::Done => SpaceAction::Reset,
    }
}

fn page_origin() -> Option<String> {
    web_sys::window()?.location().origin().ok()
}

/// Every piece of page state the session events feed into.
#[derive(Clone, Copy)]
struct QuizUi {
    quiz: Signal<Quiz>,
    elapsed: Signal<Millis>,
    labels: Signal<Vec<MapLabel>>,
    flash: Signal<Option<RegionId>>,
    toast: Signal<Option<Toast>>,
    toast_seq: Signal<u64>,
    summary: Signal<Option<(RunOutcome, bool)>>,
    seq: Signal<u64>,
}

impl QuizUi {
    fn next_seq(&mut self) -> u64 {
        let next = *self.seq.peek() + 1;
        self.seq.set(next);
        next
    }

    fn show_toast(&mut self, toast: Toast) {
        let seq = self.next_seq();
        self.toast.set(Some(toast));
        self.toast_seq.set(seq);

        let mut current = self.toast;
        let shown = self.toast_seq;
        spawn(async move {
            TimeoutFuture::new(TOAST_MS).await;
            if *shown.peek() == seq {
                current.set(None);
            }
        });
    }

    fn expire_label(&self, seq: u64) {
        let mut labels = self.labels;
        spawn(async move {
            TimeoutFuture::new(ERROR_LABEL_MS).await;
            labels.write().retain(|l| l.seq != seq);
        });
    }

    fn flash_region(&mut self, id: RegionId) {
        self.flash.set(Some(id.clone()));
        let mut flash = self.flash;
        spawn(async move {
            TimeoutFuture::new(FLASH_MS).await;
            if flash.peek().as_ref() == Some(&id) {
                flash.set(None);
            }
        });
    }

    fn clear_overlays(&mut self) {
        self.labels.write().clear();
        self.flash.set(None);
        self.summary.set(None);
        self.elapsed.set(0.0);
    }

    fn apply(mut self, events: Vec<SessionEvent>) {
        let container = coords::container_rect(MAP_CONTAINER_ID);
        let (index, config) = {
            let q = self.quiz.peek();
            (q.index().clone(), *q.config())
        };

        let mut outcome = None;
        let mut new_best = false;
        for event in &events {
            tracing::debug!(?event, "Session event");

            if let Some(toast) = notify::toast_for(event, &index, &config.session) {
                self.show_toast(toast);
            }

            let wrong_at = match event {
                SessionEvent::WrongGuess { point, .. } => container.and_then(|c| {
                    self.quiz.peek().viewport().screen_to_map(*point, &c).ok()
                }),
                _ => None,
            };
            let seq = self.next_seq();
            notify::update_labels(&mut self.labels.write(), event, &index, wrong_at, seq);
            if wrong_at.is_some() {
                self.expire_label(seq);
            }
            if let Some(id) = notify::wrong_region(event) {
                self.flash_region(id.clone());
            }

            match event {
                SessionEvent::RunComplete(o) => outcome = Some(*o),
                SessionEvent::QualifiesForLeaderboard { time } => {
                    new_best = true;
                    self.quiz.write().set_leaderboard_cutoff(Some(*time));
                }
                _ => {}
            }
        }

        if let Some(o) = outcome {
            tracing::info!(final_time = o.final_time, accuracy = o.accuracy, "Run complete");
            self.summary.set(Some((o, new_best)));
        }
    }

    fn started(mut self, result: Result<Vec<SessionEvent>, QuizError>) {
        match result {
            Ok(events) => {
                self.clear_overlays();
                self.apply(events);
            }
            Err(e) => {
                tracing::warn!(%e, "Cannot start run");
                self.show_toast(Toast::bad(e.to_string()));
            }
        }
    }

    fn start(self) {
        let mut quiz = self.quiz;
        let result = quiz.write().start();
        self.started(result);
    }

    fn start_subset(self, ids: Vec<RegionId>) {
        let mut quiz = self.quiz;
        let result = quiz.write().start_subset(&ids);
        self.started(result);
    }

    fn reset(mut self) {
        if self.quiz.write().reset() {
            tracing::debug!("Run reset");
        }
        self.clear_overlays();
    }
}

#[component]
pub fn QuizPage(map_key: Option<String>) -> Element {
    let maps_resource = use_resource(api::fetch_maps);
    let mut selected_key = use_signal(|| map_key.clone());
    let map_resource = use_resource(move || {
        let key = selected_key.read().clone();
        async move { api::fetch_map(key.as_deref()).await }
    });

    // Frame requests from the quiz land in this queue; the loop below drains it.
    let frames = use_hook(FrameQueue::new);
    let quiz = use_signal({
        let frames = frames.clone();
        move || {
            Quiz::new(
                QuizConfig::default(),
                Box::new(PerformanceClock),
                Box::new(MathRandomPicker),
                Box::new(frames),
            )
        }
    });

    let mut ui = QuizUi {
        quiz,
        elapsed: use_signal(|| 0.0),
        labels: use_signal(Vec::new),
        flash: use_signal(|| None),
        toast: use_signal(|| None),
        toast_seq: use_signal(|| 0),
        summary: use_signal(|| None),
        seq: use_signal(|| 0),
    };
    let mut show_help = use_signal(|| false);

    use_future(move || {
        let frames = frames.clone();
        let mut quiz = ui.quiz;
        let mut elapsed = ui.elapsed;
        async move {
            loop {
                TimeoutFuture::new(FRAME_MS).await;
                for frame in frames.take_due() {
                    let update = quiz.write().on_frame(frame);
                    if let Some(ms) = update.elapsed {
                        elapsed.set(ms);
                    }
                }
            }
        }
    });

    use_effect(move || {
        if let Some(Ok(source)) = &*map_resource.read() {
            let mut quiz = ui.quiz;
            if quiz.peek().map_key() != Some(source.key.as_str()) {
                tracing::info!(key = %source.key, regions = source.regions.len(), "Loading map");
                quiz.write().load_map(source);
                ui.clear_overlays();
            }
        }
    });

    let maps: Vec<MapSummaryData> = match &*maps_resource.read() {
        Some(Ok(m)) => m.clone(),
        _ => vec![],
    };
    let load_error = match &*map_resource.read() {
        Some(Err(e)) => Some(e.clone()),
        _ => None,
    };

    let (current_key, map_name, phase, retry_ids, config) = {
        let q = ui.quiz.read();
        let key = q.map_key().unwrap_or_default().to_string();
        let name = maps
            .iter()
            .find(|m| m.key == key)
            .map(|m| m.name.clone())
            .unwrap_or_default();
        (
            key,
            name,
            q.session().phase(),
            failed_ids(q.session().resolutions()),
            *q.config(),
        )
    };
    let share_url = page_origin()
        .filter(|_| !current_key.is_empty())
        .map(|origin| api::build_map_url(&origin, &current_key));
    let retry_count = retry_ids.len();
    let summary = ui.summary.read().clone();
    let penalty_seconds = (config.session.fail_penalty_ms / 1000.0).round() as u32;

    rsx! {
        div {
            class: "app",
            tabindex: "0",
            onkeydown: move |evt: Event<KeyboardData>| {
                match evt.key() {
                    Key::Character(c) if c == " " => {
                        evt.prevent_default();
                        let phase = ui.quiz.peek().session().phase();
                        match space_action(phase) {
                            SpaceAction::Start => ui.start(),
                            SpaceAction::Reset => ui.reset(),
                        }
                    }
                    Key::Character(c) if c == "h" || c == "?" => {
                        let open = *show_help.peek();
                        show_help.set(!open);
                    }
                    Key::Escape => {
                        if *show_help.peek() {
                            show_help.set(false);
                        } else {
                            ui.reset();
                        }
                    }
                    _ => {}
                }
            },

            div { class: "header",
                h1 { "Map Quiz" }
                span { class: "header-map", "{map_name}" }
                button {
                    class: "secondary help-button",
                    onclick: move |_| show_help.set(true),
                    "?"
                }
            }

            div { class: "sidebar",
                div { class: "panel",
                    h3 { "Map" }
                    select {
                        value: "{current_key}",
                        onchange: move |evt: Event<FormData>| {
                            selected_key.set(Some(evt.value().to_string()));
                        },
                        for m in &maps {
                            option {
                                value: "{m.key}",
                                selected: current_key == m.key,
                                "{m.name} ({m.region_count})"
                            }
                        }
                    }
                    if let Some(url) = share_url {
                        a { class: "share-link", href: "{url}", "Link to this map" }
                    }
                    if let Some(err) = load_error {
                        p { class: "error", "{err}" }
                    }
                }

                Hud {
                    quiz: ui.quiz,
                    elapsed: ui.elapsed,
                    on_start: move |_| ui.start(),
                    on_reset: move |_| ui.reset(),
                }

                if phase == Phase::Done && !retry_ids.is_empty() {
                    div { class: "panel",
                        button {
                            class: "secondary",
                            onclick: move |_| ui.start_subset(retry_ids.clone()),
                            "Retry failed ({retry_count})"
                        }
                    }
                }

                FoundList { quiz: ui.quiz }
            }

            div { class: "map-area",
                MapView {
                    quiz: ui.quiz,
                    labels: ui.labels,
                    flash: ui.flash,
                    on_events: move |events: Vec<SessionEvent>| ui.apply(events),
                }
                ToastBanner { toast: ui.toast }
            }

            if let Some((outcome, new_best)) = summary {
                RunSummary {
                    outcome,
                    new_best,
                    on_close: move |_| ui.summary.set(None),
                }
            }

            HelpOverlay {
                show: show_help,
                max_attempts: config.session.max_attempts,
                penalty_seconds,
            }
        }
    }
}
