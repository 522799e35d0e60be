use dioxus::html::geometry::WheelDelta;
use mapquiz_shared::geometry::{ContainerRect, Point};
use mapquiz_shared::gesture::HitTester;
use mapquiz_shared::regions::{IndexHitTester, RegionId};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;

/// Attribute carrying the region id on every drawn region shape.
pub const REGION_ATTR: &str = "data-region";

/// Bounding client rect of an element, as the core's container rectangle.
pub fn container_rect(element_id: &str) -> Option<ContainerRect> {
    let document = web_sys::window()?.document()?;
    let element = document.get_element_by_id(element_id)?;
    let rect = element.get_bounding_client_rect();
    Some(ContainerRect::new(
        rect.left(),
        rect.top(),
        rect.width(),
        rect.height(),
    ))
}

/// Convert client (viewport) coordinates to container-relative pixel coordinates.
pub fn client_to_container(client: Point, container: &ContainerRect) -> Point {
    Point::new(client.x - container.left, client.y - container.top)
}

/// Convert a wheel delta (pixels / lines / pages) to a uniform pixel-like value.
pub fn wheel_delta_y(delta: WheelDelta) -> f64 {
    match delta {
        WheelDelta::Pixels(d) => d.y,
        WheelDelta::Lines(d) => d.y * 40.0,
        WheelDelta::Pages(d) => d.y * 400.0,
    }
}

/// Region ids from a topmost-first list of element attributes. Elements
/// without the attribute are skipped and repeated ids keep their first slot.
pub fn collect_region_ids<I>(attrs: I) -> Vec<RegionId>
where
    I: IntoIterator<Item = Option<String>>,
{
    let mut ids: Vec<RegionId> = Vec::new();
    for attr in attrs.into_iter().flatten() {
        let id = attr.trim();
        if id.is_empty() || ids.iter().any(|known| known.as_str() == id) {
            continue;
        }
        ids.push(RegionId::from(id));
    }
    ids
}

fn dom_regions_at(screen: Point) -> Vec<RegionId> {
    let Some(document) = web_sys::window().and_then(|w| w.document()) else {
        return Vec::new();
    };
    let stack = document.elements_from_point(screen.x as f32, screen.y as f32);
    collect_region_ids(stack.iter().map(|node| {
        node.dyn_into::<web_sys::Element>()
            .ok()
            .and_then(|el| el.get_attribute(REGION_ATTR))
    }))
}

/// Hit test against the rendered shapes, topped up with padded bounding-box
/// hits for micro regions that are too small to tap reliably.
pub struct DomHitTester<'a> {
    pub fallback: IndexHitTester<'a>,
}

impl HitTester for DomHitTester<'_> {
    fn regions_at(&self, screen: Point) -> Vec<RegionId> {
        let mut ids = dom_regions_at(screen);
        for id in self.fallback.regions_at(screen) {
            let micro = self
                .fallback
                .index
                .get(&id)
                .is_some_and(|r| r.is_micro);
            if micro && !ids.contains(&id) {
                ids.push(id);
            }
        }
        ids
    }
}

/// A listener on `window`, removed again when dropped.
pub struct WindowListener {
    event: &'static str,
    callback: Closure<dyn FnMut()>,
}

impl WindowListener {
    pub fn register(event: &'static str, handler: impl FnMut() + 'static) -> Option<Self> {
        let window = web_sys::window()?;
        let callback = Closure::<dyn FnMut()>::new(handler);
        if let Err(e) = window.add_event_listener_with_callback(event, callback.as_ref().unchecked_ref()) {
            tracing::warn!(?e, event, "Could not register window listener");
            return None;
        }
        Some(WindowListener { event, callback })
    }
}

impl Drop for WindowListener {
    fn drop(&mut self) {
        if let Some(window) = web_sys::window() {
            let _ = window.remove_event_listener_with_callback(
                self.event,
                self.callback.as_ref().unchecked_ref(),
            );
        }
    }
}
