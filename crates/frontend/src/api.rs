use mapquiz_shared::geometry::Rect;
use mapquiz_shared::models::MapSource;
use mapquiz_shared::regions::RegionDescriptor;
use serde::{Deserialize, Serialize};

/// Build the variables JSON for a map query. `None` asks for the default map.
pub fn build_map_variables(key: Option<&str>) -> serde_json::Value {
    match key {
        Some(key) => serde_json::json!({ "key": key }),
        None => serde_json::json!({ "key": serde_json::Value::Null }),
    }
}

/// Build a shareable URL for one map.
pub fn build_map_url(origin: &str, key: &str) -> String {
    format!("{}/map/{}", origin, key)
}

#[derive(Debug, Clone, Serialize)]
pub struct GraphQLRequest {
    pub query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variables: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GraphQLResponse<T> {
    pub data: Option<T>,
    pub errors: Option<Vec<GraphQLError>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GraphQLError {
    pub message: String,
}

fn api_url() -> Result<String, String> {
    let origin = web_sys::window()
        .ok_or_else(|| "No window".to_string())?
        .location()
        .origin()
        .map_err(|_| "No origin".to_string())?;
    Ok(format!("{}/graphql", origin))
}

async fn query<T: for<'de> Deserialize<'de>>(
    query_str: &str,
    variables: Option<serde_json::Value>,
) -> Result<T, String> {
    let req = GraphQLRequest {
        query: query_str.to_string(),
        variables,
    };

    let resp = reqwest::Client::new()
        .post(api_url()?)
        .json(&req)
        .send()
        .await
        .map_err(|e| e.to_string())?;

    let gql_resp: GraphQLResponse<T> = resp.json().await.map_err(|e| e.to_string())?;
    unwrap_response(gql_resp)
}

fn unwrap_response<T>(resp: GraphQLResponse<T>) -> Result<T, String> {
    if let Some(errors) = resp.errors {
        if let Some(first) = errors.into_iter().next() {
            return Err(first.message);
        }
    }
    resp.data.ok_or_else(|| "No data returned".to_string())
}

// Types mirroring the GraphQL schema

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapSummaryData {
    pub key: String,
    pub name: String,
    pub region_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct RectData {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionData {
    pub id: String,
    pub name: String,
    pub bounding_box: RectData,
    pub path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapData {
    pub key: String,
    pub name: String,
    pub view_box: String,
    pub regions: Vec<RegionData>,
}

impl MapData {
    /// Back to the region-source shape the quiz core consumes.
    pub fn into_source(self) -> MapSource {
        MapSource {
            key: self.key,
            name: self.name,
            view_box: self.view_box,
            regions: self
                .regions
                .into_iter()
                .map(|r| RegionDescriptor {
                    id: r.id,
                    name: r.name,
                    bounding_box: Rect::new(
                        r.bounding_box.x,
                        r.bounding_box.y,
                        r.bounding_box.w,
                        r.bounding_box.h,
                    ),
                    path: r.path,
                })
                .collect(),
        }
    }
}

// API functions

#[derive(Deserialize)]
pub struct MapsResponse {
    pub maps: Vec<MapSummaryData>,
}

pub async fn fetch_maps() -> Result<Vec<MapSummaryData>, String> {
    let resp: MapsResponse = query(r#"query { maps { key name regionCount } }"#, None).await?;
    Ok(resp.maps)
}

#[derive(Deserialize)]
pub struct MapResponse {
    pub map: MapData,
}

pub async fn fetch_map(key: Option<&str>) -> Result<MapSource, String> {
    let resp: MapResponse = query(
        r#"query Map($key: String) {
            map(key: $key) {
                key name viewBox
                regions { id name boundingBox { x y w h } path }
            }
        }"#,
        Some(build_map_variables(key)),
    )
    .await?;
    tracing::debug!(key = %resp.map.key, regions = resp.map.regions.len(), "Fetched map");
    Ok(resp.map.into_source())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_graphql_request_omits_null_variables() {
        let req = GraphQLRequest {
            query: "query { maps { key } }".to_string(),
            variables: None,
        };
        let json = serde_json::to_value(&req).unwrap();
        assert!(json.get("variables").is_none());
    }

    #[test]
    fn test_build_map_variables() {
        assert_eq!(build_map_variables(Some("alps"))["key"], "alps");
        assert!(build_map_variables(None)["key"].is_null());
    }

    #[test]
    fn test_build_map_url() {
        assert_eq!(
            build_map_url("https://quiz.example.com", "central-europe"),
            "https://quiz.example.com/map/central-europe"
        );
    }

    #[test]
    fn test_maps_response_deserializes() {
        let json = r#"{"maps":[{"key":"alps","name":"The Alps","regionCount":12}]}"#;
        let resp: MapsResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.maps.len(), 1);
        assert_eq!(resp.maps[0].key, "alps");
        assert_eq!(resp.maps[0].region_count, 12);
    }

    #[test]
    fn test_map_response_converts_to_source() {
        let json = r#"{"map":{"key":"alps","name":"The Alps","viewBox":"0 0 300 200","regions":[
            {"id":"AT","name":"Austria","boundingBox":{"x":150.0,"y":80.0,"w":60.0,"h":40.0},"path":"M150 80h60v40h-60z"},
            {"id":"LI","name":"Liechtenstein","boundingBox":{"x":112.0,"y":95.0,"w":2.0,"h":3.0},"path":null}
        ]}}"#;
        let resp: MapResponse = serde_json::from_str(json).unwrap();
        let source = resp.map.into_source();
        assert_eq!(source.key, "alps");
        assert_eq!(source.regions[0].bounding_box, Rect::new(150.0, 80.0, 60.0, 40.0));
        assert!(source.regions[1].path.is_none());

        let index = source.build_index();
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn test_graphql_error_wins_over_data() {
        let json = r#"{"data":null,"errors":[{"message":"unknown map: atlantis"}]}"#;
        let resp: GraphQLResponse<MapResponse> = serde_json::from_str(json).unwrap();
        assert_eq!(unwrap_response(resp).err().unwrap(), "unknown map: atlantis");
    }

    #[test]
    fn test_missing_data_is_an_error() {
        let resp: GraphQLResponse<MapsResponse> = GraphQLResponse {
            data: None,
            errors: Some(vec![]),
        };
        assert_eq!(unwrap_response(resp).err().unwrap(), "No data returned");
    }
}
