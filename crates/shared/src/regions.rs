use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::geometry::{BoundingBox, ContainerRect, FitTransform, Point, ViewRect};
use crate::gesture::HitTester;

/// Regions whose bounding area is at most `median / MICRO_MEDIAN_DIVISOR` are micro.
const MICRO_MEDIAN_DIVISOR: f64 = 10.0;

/// Fallback micro threshold as a fraction of the base view area.
const MICRO_VIEW_AREA_FRACTION: f64 = 0.00035;

/// Stable identity of a selectable region, unique within one map.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegionId(pub String);

impl RegionId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RegionId {
    fn from(s: &str) -> Self {
        RegionId(s.to_string())
    }
}

impl From<String> for RegionId {
    fn from(s: String) -> Self {
        RegionId(s)
    }
}

/// A region as supplied by the map source, before indexing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionDescriptor {
    pub id: String,
    pub name: String,
    pub bounding_box: BoundingBox,
    /// SVG path data, only used for drawing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

/// One selectable map subdivision with precomputed geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Region {
    pub id: RegionId,
    pub name: String,
    pub bounding_box: BoundingBox,
    pub center: Point,
    pub is_micro: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

/// Flattened, read-only list of the regions of one loaded map.
///
/// Iteration order is alphabetical by name. Hit testing uses the source
/// (draw) order, where later regions sit on top.
#[derive(Debug, Clone, Default)]
pub struct RegionIndex {
    regions: Vec<Region>,
    by_id: HashMap<RegionId, usize>,
    draw_order: Vec<usize>,
}

impl RegionIndex {
    /// Build the index from source descriptors.
    ///
    /// Blank ids are dropped, names default to the id, and a duplicate id
    /// keeps its first occurrence.
    pub fn build(descriptors: &[RegionDescriptor], base_view: &ViewRect) -> Self {
        let mut seen: HashSet<String> = HashSet::new();
        let mut in_source_order: Vec<Region> = Vec::with_capacity(descriptors.len());

        for d in descriptors {
            let id = d.id.trim();
            if id.is_empty() {
                continue;
            }
            if !seen.insert(id.to_string()) {
                tracing::debug!(id, "Skipping duplicate region id");
                continue;
            }
            let name = match d.name.trim() {
                "" => id.to_string(),
                n => n.to_string(),
            };
            in_source_order.push(Region {
                id: RegionId::from(id),
                name,
                bounding_box: d.bounding_box,
                center: d.bounding_box.center(),
                is_micro: false,
                path: d.path.clone(),
            });
        }

        let threshold = micro_threshold(&in_source_order, base_view);
        for r in in_source_order.iter_mut() {
            r.is_micro = r.bounding_box.area() <= threshold;
        }

        // Sort by name, remembering where each region sat in the source.
        let mut order: Vec<usize> = (0..in_source_order.len()).collect();
        order.sort_by(|&a, &b| in_source_order[a].name.cmp(&in_source_order[b].name));

        let mut draw_order = vec![0; order.len()];
        for (sorted_pos, &source_pos) in order.iter().enumerate() {
            draw_order[source_pos] = sorted_pos;
        }

        let mut slots: Vec<Option<Region>> = in_source_order.into_iter().map(Some).collect();
        let regions: Vec<Region> = order.iter().filter_map(|&i| slots[i].take()).collect();

        let by_id = regions
            .iter()
            .enumerate()
            .map(|(i, r)| (r.id.clone(), i))
            .collect();

        RegionIndex {
            regions,
            by_id,
            draw_order,
        }
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn get(&self, id: &RegionId) -> Option<&Region> {
        self.by_id.get(id).map(|&i| &self.regions[i])
    }

    pub fn contains(&self, id: &RegionId) -> bool {
        self.by_id.contains_key(id)
    }

    /// Display name for `id`, falling back to the id itself.
    pub fn name_of(&self, id: &RegionId) -> String {
        self.get(id)
            .map(|r| r.name.clone())
            .unwrap_or_else(|| id.to_string())
    }

    /// Regions sorted by name.
    pub fn iter(&self) -> impl Iterator<Item = &Region> {
        self.regions.iter()
    }

    /// Regions in source (draw) order, bottom-most first.
    pub fn iter_draw_order(&self) -> impl Iterator<Item = &Region> {
        self.draw_order.iter().map(move |&i| &self.regions[i])
    }

    /// All ids in name order.
    pub fn ids(&self) -> Vec<RegionId> {
        self.regions.iter().map(|r| r.id.clone()).collect()
    }

    /// Ids of regions whose bounding box contains `p`, topmost first.
    ///
    /// Micro regions get their box grown by `micro_pad` map units so they stay
    /// tappable at low zoom.
    pub fn regions_at_map_point(&self, p: Point, micro_pad: f64) -> Vec<RegionId> {
        self.draw_order
            .iter()
            .rev()
            .map(|&i| &self.regions[i])
            .filter(|r| {
                let bbox = if r.is_micro {
                    r.bounding_box.inflate(micro_pad)
                } else {
                    r.bounding_box
                };
                bbox.contains(p)
            })
            .map(|r| r.id.clone())
            .collect()
    }
}

fn micro_threshold(regions: &[Region], base_view: &ViewRect) -> f64 {
    if regions.is_empty() {
        return 0.0;
    }
    let mut areas: Vec<f64> = regions
        .iter()
        .map(|r| r.bounding_box.area().max(0.000001))
        .collect();
    areas.sort_by(|a, b| a.total_cmp(b));

    let mid = areas.len() / 2;
    let median = if areas.len() % 2 != 0 {
        areas[mid]
    } else {
        (areas[mid - 1] + areas[mid]) / 2.0
    };

    if median > 0.0 {
        median / MICRO_MEDIAN_DIVISOR
    } else {
        base_view.area() * MICRO_VIEW_AREA_FRACTION
    }
}

/// Bounding-box hit test against a [`RegionIndex`] under a given view.
pub struct IndexHitTester<'a> {
    pub index: &'a RegionIndex,
    pub view: ViewRect,
    pub container: ContainerRect,
    /// Extra hit margin for micro regions, in screen units.
    pub micro_padding: f64,
}

impl HitTester for IndexHitTester<'_> {
    fn regions_at(&self, screen: Point) -> Vec<RegionId> {
        match FitTransform::new(&self.view, &self.container) {
            Ok(t) => self
                .index
                .regions_at_map_point(t.screen_to_map(screen), self.micro_padding / t.scale),
            Err(e) => {
                tracing::trace!(error = %e, "Hit test skipped");
                Vec::new()
            }
        }
    }
}
