use std::collections::HashSet;
use std::path::Path;

use mapquiz_shared::models::{MapCatalog, MapSource};

pub struct Assets {
    pub catalog: MapCatalog,
}

impl Assets {
    pub fn load(assets_dir: &Path) -> Result<Self, String> {
        let maps_path = assets_dir.join("maps.json");

        let maps_data = std::fs::read_to_string(&maps_path)
            .map_err(|e| format!("Failed to read {}: {}", maps_path.display(), e))?;

        let assets = Self::from_json(&maps_data)?;

        tracing::info!(
            maps = assets.catalog.len(),
            regions = assets
                .catalog
                .maps
                .iter()
                .map(|m| m.regions.len())
                .sum::<usize>(),
            "Loaded map catalog"
        );

        Ok(assets)
    }

    pub fn from_json(raw: &str) -> Result<Self, String> {
        let catalog = MapCatalog::from_json(raw)
            .map_err(|e| format!("Failed to parse maps.json: {}", e))?;

        let mut keys = HashSet::new();
        for map in &catalog.maps {
            if !keys.insert(map.key.as_str()) {
                return Err(format!("Duplicate map key in maps.json: {}", map.key));
            }
        }

        Ok(Assets { catalog })
    }

    pub fn find_map(&self, key: &str) -> Option<&MapSource> {
        self.catalog.get(key).ok()
    }
}
