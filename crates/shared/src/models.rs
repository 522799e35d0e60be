use serde::{Deserialize, Serialize};

use crate::error::QuizError;
use crate::geometry::{parse_view_box, ViewRect};
use crate::regions::{RegionDescriptor, RegionIndex};

/// One quiz map as supplied by the region source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapSource {
    /// URL-safe key. Derived from the name when left blank.
    #[serde(default)]
    pub key: String,
    pub name: String,
    /// SVG `viewBox` string, `"x y w h"`.
    #[serde(default)]
    pub view_box: String,
    pub regions: Vec<RegionDescriptor>,
}

impl MapSource {
    pub fn base_view(&self) -> ViewRect {
        parse_view_box(&self.view_box)
    }

    pub fn build_index(&self) -> RegionIndex {
        RegionIndex::build(&self.regions, &self.base_view())
    }

    /// `region_count` is what a run will contain: blank and duplicate ids
    /// are not counted.
    pub fn summary(&self) -> MapSummary {
        MapSummary {
            key: self.key.clone(),
            name: self.name.clone(),
            region_count: self.build_index().len(),
        }
    }
}

/// Catalog entry without the region payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapSummary {
    pub key: String,
    pub name: String,
    pub region_count: usize,
}

/// Every map the region source knows about, in file order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MapCatalog {
    pub maps: Vec<MapSource>,
}

impl MapCatalog {
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        let mut catalog: MapCatalog = serde_json::from_str(raw)?;
        for map in catalog.maps.iter_mut() {
            if map.key.trim().is_empty() {
                map.key = slug(&map.name);
            }
        }
        Ok(catalog)
    }

    pub fn len(&self) -> usize {
        self.maps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.maps.is_empty()
    }

    pub fn summaries(&self) -> Vec<MapSummary> {
        self.maps.iter().map(MapSource::summary).collect()
    }

    pub fn get(&self, key: &str) -> Result<&MapSource, QuizError> {
        self.maps
            .iter()
            .find(|m| m.key == key)
            .ok_or_else(|| QuizError::UnknownMap(key.to_string()))
    }

    /// The map shown when none was chosen yet.
    pub fn default_map(&self) -> Option<&MapSource> {
        self.maps.first()
    }
}

/// Generate a URL-safe slug from a display name.
pub fn slug(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '-' })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}
