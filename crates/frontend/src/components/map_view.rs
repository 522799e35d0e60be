use std::collections::HashMap;
use std::rc::Rc;

use dioxus::html::input_data::MouseButton;
use dioxus::prelude::*;
use mapquiz_shared::geometry::{Point, ViewRect};
use mapquiz_shared::gesture::{PointerId, PointerInput, PointerKind, PointerPhase};
use mapquiz_shared::regions::{IndexHitTester, Region, RegionId, RegionIndex};
use mapquiz_shared::session::{Resolution, SessionEvent};
use mapquiz_shared::Quiz;

use crate::coords::{self, DomHitTester, REGION_ATTR};
use crate::notify::{LabelKind, MapLabel};

pub const MAP_CONTAINER_ID: &str = "quiz-map-container";

/// Micro-region markers are drawn at this fraction of the larger view side,
/// so they keep roughly the same on-screen size while zooming.
const MICRO_MARKER_FRACTION: f64 = 0.008;

const FOUND_FILL: &str = "rgba(46, 204, 113, 0.85)";
const FAILED_FILL: &str = "rgba(231, 76, 60, 0.85)";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionStatus {
    Open,
    Found,
    Failed,
}

impl RegionStatus {
    fn class(self) -> &'static str {
        match self {
            RegionStatus::Open => "open",
            RegionStatus::Found => "found",
            RegionStatus::Failed => "failed",
        }
    }
}

/// Stable per-region tint derived from the id, so neighbours rarely match.
pub fn tint_color(id: &RegionId) -> String {
    let mut h: u32 = 0;
    for unit in id.as_str().encode_utf16() {
        h = h.wrapping_mul(31).wrapping_add(unit as u32);
    }
    format!("hsla({}, 78%, 56%, 0.45)", h % 360)
}

pub fn statuses(resolutions: &[Resolution]) -> HashMap<RegionId, RegionStatus> {
    resolutions
        .iter()
        .map(|r| {
            let status = if r.failed {
                RegionStatus::Failed
            } else {
                RegionStatus::Found
            };
            (r.id.clone(), status)
        })
        .collect()
}

fn escape_attr(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

// ---------------------------------------------------------------------------
// SVG builder
// ---------------------------------------------------------------------------

/// Build the inner SVG markup: one shape per region in draw order, then a
/// marker circle on top of every micro region.
pub fn build_svg_content(
    index: &RegionIndex,
    statuses: &HashMap<RegionId, RegionStatus>,
    flash: Option<&RegionId>,
    view: &ViewRect,
) -> String {
    let mut svg = String::with_capacity(index.len() * 256);
    let status_of = |id: &RegionId| statuses.get(id).copied().unwrap_or(RegionStatus::Open);

    for region in index.iter_draw_order() {
        build_region_shape(&mut svg, region, status_of(&region.id), flash == Some(&region.id));
    }

    let marker_r = view.w.max(view.h) * MICRO_MARKER_FRACTION;
    for region in index.iter_draw_order().filter(|r| r.is_micro) {
        build_micro_marker(&mut svg, region, status_of(&region.id), marker_r);
    }

    svg
}

fn fill_for(region: &Region, status: RegionStatus) -> String {
    match status {
        RegionStatus::Open => tint_color(&region.id),
        RegionStatus::Found => FOUND_FILL.to_string(),
        RegionStatus::Failed => FAILED_FILL.to_string(),
    }
}

fn build_region_shape(svg: &mut String, region: &Region, status: RegionStatus, flashing: bool) {
    let id = escape_attr(region.id.as_str());
    let fill = fill_for(region, status);
    let class = if flashing {
        format!("region {} flash", status.class())
    } else {
        format!("region {}", status.class())
    };

    match &region.path {
        Some(d) => svg.push_str(&format!(
            r#"<path d="{}" {REGION_ATTR}="{id}" class="{class}" fill="{fill}"/>"#,
            escape_attr(d)
        )),
        None => {
            let b = region.bounding_box;
            svg.push_str(&format!(
                r#"<rect x="{}" y="{}" width="{}" height="{}" {REGION_ATTR}="{id}" class="{class}" fill="{fill}"/>"#,
                b.x, b.y, b.w, b.h
            ));
        }
    }
}

fn build_micro_marker(svg: &mut String, region: &Region, status: RegionStatus, r: f64) {
    svg.push_str(&format!(
        r#"<circle cx="{}" cy="{}" r="{r}" {REGION_ATTR}="{}" class="micro {}" fill="{}"/>"#,
        region.center.x,
        region.center.y,
        escape_attr(region.id.as_str()),
        status.class(),
        fill_for(region, status)
    ));
}

// ---------------------------------------------------------------------------
// Pointer plumbing
// ---------------------------------------------------------------------------

fn pointer_kind(pointer_type: &str) -> PointerKind {
    match pointer_type {
        "mouse" => PointerKind::Mouse,
        "pen" => PointerKind::Pen,
        _ => PointerKind::Touch,
    }
}

fn to_input(evt: &PointerData, phase: PointerPhase) -> PointerInput {
    let kind = pointer_kind(&evt.pointer_type());
    // Moves report no button; only a non-primary press is filtered out.
    let primary = kind != PointerKind::Mouse
        || matches!(evt.trigger_button(), None | Some(MouseButton::Primary));
    let client = evt.client_coordinates();
    PointerInput {
        id: PointerId(evt.pointer_id() as i64),
        kind,
        phase,
        point: Point::new(client.x, client.y),
        primary,
    }
}

fn capture_pointer(pointer_id: i32) {
    let element = web_sys::window()
        .and_then(|w| w.document())
        .and_then(|d| d.get_element_by_id(MAP_CONTAINER_ID));
    if let Some(element) = element {
        if let Err(e) = element.set_pointer_capture(pointer_id) {
            tracing::debug!(?e, "Pointer capture refused");
        }
    }
}

/// Route one pointer event through the quiz with a DOM-backed hit test.
fn forward_pointer(
    mut quiz: Signal<Quiz>,
    on_events: EventHandler<Vec<SessionEvent>>,
    evt: &PointerData,
    phase: PointerPhase,
) {
    let Some(container) = coords::container_rect(MAP_CONTAINER_ID) else {
        return;
    };
    let input = to_input(evt, phase);

    let (index, view, micro_padding) = {
        let q = quiz.read();
        (
            q.index().clone(),
            *q.viewport().current(),
            q.config().micro_hit_padding,
        )
    };
    let hits = DomHitTester {
        fallback: IndexHitTester {
            index: &index,
            view,
            container,
            micro_padding,
        },
    };

    let events = quiz.write().pointer_with(&input, container, &hits);
    if !events.is_empty() {
        on_events.call(events);
    }
}

// ---------------------------------------------------------------------------
// Component
// ---------------------------------------------------------------------------

#[component]
pub fn MapView(
    quiz: Signal<Quiz>,
    labels: Signal<Vec<MapLabel>>,
    flash: Signal<Option<RegionId>>,
    on_events: EventHandler<Vec<SessionEvent>>,
) -> Element {
    // Switching windows mid-drag never reaches the div's own blur.
    use_hook(move || {
        let mut quiz = quiz;
        Rc::new(coords::WindowListener::register("blur", move || quiz.write().blur()))
    });

    // Rebuilt whenever the quiz or the flashed region changes; the output
    // comparison keeps pure gesture updates from touching the DOM.
    let svg_body = use_memo(move || {
        let q = quiz.read();
        let flashing = flash.read();
        build_svg_content(
            q.index(),
            &statuses(q.session().resolutions()),
            flashing.as_ref(),
            q.viewport().current(),
        )
    });

    let view_box = quiz.read().viewport().current().to_view_box();

    let container = coords::container_rect(MAP_CONTAINER_ID);
    let placed: Vec<(u64, String, &'static str, Point)> = match container {
        Some(c) => {
            let q = quiz.read();
            labels
                .read()
                .iter()
                .filter_map(|label| {
                    let screen = q.map_to_screen(label.at, &c)?;
                    let class = match label.kind {
                        LabelKind::Resolved => "map-label resolved",
                        LabelKind::Error => "map-label error",
                    };
                    Some((
                        label.seq,
                        label.text.clone(),
                        class,
                        coords::client_to_container(screen, &c),
                    ))
                })
                .collect()
        }
        None => Vec::new(),
    };

    rsx! {
        div {
            id: MAP_CONTAINER_ID,
            class: "map-container",
            tabindex: "0",

            onpointerdown: move |evt: Event<PointerData>| {
                evt.prevent_default();
                capture_pointer(evt.pointer_id());
                forward_pointer(quiz, on_events, &evt, PointerPhase::Down);
            },
            onpointermove: move |evt: Event<PointerData>| {
                forward_pointer(quiz, on_events, &evt, PointerPhase::Move);
            },
            onpointerup: move |evt: Event<PointerData>| {
                forward_pointer(quiz, on_events, &evt, PointerPhase::Up);
            },
            onpointercancel: move |evt: Event<PointerData>| {
                forward_pointer(quiz, on_events, &evt, PointerPhase::Cancel);
            },
            onwheel: move |evt: Event<WheelData>| {
                evt.prevent_default();
                let Some(container) = coords::container_rect(MAP_CONTAINER_ID) else { return };
                let delta_y = coords::wheel_delta_y(evt.data().delta());
                let client = evt.data().client_coordinates();
                quiz.write().wheel(Point::new(client.x, client.y), delta_y, container);
            },
            onblur: move |_| quiz.write().blur(),
            oncontextmenu: move |evt: Event<MouseData>| evt.prevent_default(),

            svg {
                class: "map-svg",
                view_box: "{view_box}",
                preserve_aspect_ratio: "xMidYMid meet",
                dangerous_inner_html: "{svg_body}",
            }

            div { class: "map-labels",
                for (seq, text, class, at) in placed {
                    span {
                        key: "{seq}",
                        class: "{class}",
                        style: "left:{at.x}px;top:{at.y}px;",
                        "{text}"
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mapquiz_shared::geometry::Rect;
    use mapquiz_shared::regions::RegionDescriptor;

    fn index() -> RegionIndex {
        let descriptors = vec![
            RegionDescriptor {
                id: "DE".to_string(),
                name: "Germany".to_string(),
                bounding_box: Rect::new(0.0, 0.0, 100.0, 100.0),
                path: Some("M0 0h100v100h-100z".to_string()),
            },
            RegionDescriptor {
                id: "LU".to_string(),
                name: "Luxembourg".to_string(),
                bounding_box: Rect::new(10.0, 10.0, 2.0, 2.0),
                path: None,
            },
        ];
        RegionIndex::build(&descriptors, &Rect::new(0.0, 0.0, 400.0, 400.0))
    }

    #[test]
    fn test_tint_color_is_stable_hsla() {
        let a = tint_color(&RegionId::from("DE"));
        assert_eq!(a, tint_color(&RegionId::from("DE")));
        // "DE" hashes to 68 * 31 + 69 = 2177, hue 2177 % 360 = 17
        assert_eq!(a, "hsla(17, 78%, 56%, 0.45)");
    }

    #[test]
    fn test_svg_tags_every_shape_with_region_id() {
        let idx = index();
        let svg = build_svg_content(&idx, &HashMap::new(), None, &Rect::new(0.0, 0.0, 400.0, 400.0));
        assert!(svg.contains(r#"<path d="M0 0h100v100h-100z" data-region="DE""#));
        assert!(svg.contains(r#"<rect x="10" y="10" width="2" height="2" data-region="LU""#));
        // Micro marker drawn last, after the shapes
        let circle = svg.find("<circle").unwrap();
        assert!(svg[circle..].contains(r#"data-region="LU""#));
    }

    #[test]
    fn test_svg_colors_follow_resolution() {
        let idx = index();
        let resolutions = vec![
            Resolution {
                id: RegionId::from("DE"),
                name: "Germany".to_string(),
                time_taken: 800.0,
                failed: false,
            },
            Resolution {
                id: RegionId::from("LU"),
                name: "Luxembourg".to_string(),
                time_taken: 9000.0,
                failed: true,
            },
        ];
        let svg = build_svg_content(&idx, &statuses(&resolutions), None, &Rect::new(0.0, 0.0, 400.0, 400.0));
        assert!(svg.contains(&format!(r#"class="region found" fill="{FOUND_FILL}""#)));
        assert!(svg.contains(&format!(r#"class="micro failed" fill="{FAILED_FILL}""#)));
        assert!(!svg.contains("hsla"));
    }

    #[test]
    fn test_svg_marks_flashed_region() {
        let idx = index();
        let flash = RegionId::from("DE");
        let svg = build_svg_content(&idx, &HashMap::new(), Some(&flash), &Rect::new(0.0, 0.0, 400.0, 400.0));
        assert!(svg.contains(r#"class="region open flash""#));
    }

    #[test]
    fn test_escape_attr() {
        assert_eq!(escape_attr(r#"a"b<c>&"#), "a&quot;b&lt;c&gt;&amp;");
    }

    #[test]
    fn test_pointer_kind() {
        assert_eq!(pointer_kind("mouse"), PointerKind::Mouse);
        assert_eq!(pointer_kind("pen"), PointerKind::Pen);
        assert_eq!(pointer_kind("touch"), PointerKind::Touch);
        assert_eq!(pointer_kind(""), PointerKind::Touch);
    }
}
