use std::sync::Arc;

use async_graphql::{Context, EmptyMutation, EmptySubscription, Object, SimpleObject};
use mapquiz_shared::geometry::{Point, Rect};
use mapquiz_shared::models::MapSource;
use mapquiz_shared::regions::Region;

use crate::assets::Assets;

// GraphQL output types

#[derive(SimpleObject, Clone, Copy)]
pub struct GqlRect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl From<Rect> for GqlRect {
    fn from(r: Rect) -> Self {
        GqlRect {
            x: r.x,
            y: r.y,
            w: r.w,
            h: r.h,
        }
    }
}

#[derive(SimpleObject, Clone, Copy)]
pub struct GqlPoint {
    pub x: f64,
    pub y: f64,
}

impl From<Point> for GqlPoint {
    fn from(p: Point) -> Self {
        GqlPoint { x: p.x, y: p.y }
    }
}

#[derive(SimpleObject)]
pub struct GqlMapSummary {
    pub key: String,
    pub name: String,
    pub region_count: u64,
}

#[derive(SimpleObject)]
pub struct GqlRegion {
    pub id: String,
    pub name: String,
    pub bounding_box: GqlRect,
    pub center: GqlPoint,
    pub is_micro: bool,
    pub path: Option<String>,
}

impl From<&Region> for GqlRegion {
    fn from(r: &Region) -> Self {
        GqlRegion {
            id: r.id.to_string(),
            name: r.name.clone(),
            bounding_box: r.bounding_box.into(),
            center: r.center.into(),
            is_micro: r.is_micro,
            path: r.path.clone(),
        }
    }
}

#[derive(SimpleObject)]
pub struct GqlMap {
    pub key: String,
    pub name: String,
    /// Raw `viewBox` string as authored.
    pub view_box: String,
    /// Parsed view box, with the fallback applied.
    pub base_view: GqlRect,
    /// Indexed regions in draw order.
    pub regions: Vec<GqlRegion>,
}

impl From<&MapSource> for GqlMap {
    fn from(source: &MapSource) -> Self {
        let index = source.build_index();
        GqlMap {
            key: source.key.clone(),
            name: source.name.clone(),
            view_box: source.view_box.clone(),
            base_view: source.base_view().into(),
            regions: index.iter_draw_order().map(GqlRegion::from).collect(),
        }
    }
}

// Query root

pub struct QueryRoot;

#[Object]
impl QueryRoot {
    async fn maps(&self, ctx: &Context<'_>) -> async_graphql::Result<Vec<GqlMapSummary>> {
        let assets = ctx.data::<Arc<Assets>>()?;
        Ok(assets
            .catalog
            .summaries()
            .into_iter()
            .map(|s| GqlMapSummary {
                key: s.key,
                name: s.name,
                region_count: s.region_count as u64,
            })
            .collect())
    }

    /// A single map with its regions. `key` defaults to the first map.
    async fn map(&self, ctx: &Context<'_>, key: Option<String>) -> async_graphql::Result<GqlMap> {
        let assets = ctx.data::<Arc<Assets>>()?;
        let source = match key {
            Some(key) => assets.catalog.get(&key)?,
            None => assets
                .catalog
                .default_map()
                .ok_or_else(|| async_graphql::Error::new("No maps available"))?,
        };
        Ok(GqlMap::from(source))
    }
}

pub type Schema = async_graphql::Schema<QueryRoot, EmptyMutation, EmptySubscription>;

pub fn build_schema(assets: Arc<Assets>) -> Schema {
    async_graphql::Schema::build(QueryRoot, EmptyMutation, EmptySubscription)
        .data(assets)
        .finish()
}
