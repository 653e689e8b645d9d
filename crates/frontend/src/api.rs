use serde::Deserialize;
use tourmap_shared::error::MapError;
use tourmap_shared::ingest;
use tourmap_shared::models::LatLng;

/// Turn a track or manifest reference into an absolute URL against `origin`.
pub fn resolve_url(origin: &str, src: &str) -> String {
    if src.starts_with("http://") || src.starts_with("https://") {
        src.to_string()
    } else if src.starts_with('/') {
        format!("{}{}", origin, src)
    } else {
        format!("{}/{}", origin, src)
    }
}

fn page_origin() -> Result<String, String> {
    let window = web_sys::window().ok_or("No window available")?;
    window
        .location()
        .origin()
        .map_err(|_| "Page origin is not readable".to_string())
}

async fn get(src: &str) -> Result<reqwest::Response, String> {
    let url = resolve_url(&page_origin()?, src);
    let resp = reqwest::get(&url).await.map_err(|e| e.to_string())?;
    if !resp.status().is_success() {
        return Err(format!("{} returned {}", url, resp.status()));
    }
    Ok(resp)
}

/// Fetch and decode a track file.
pub async fn fetch_track(src: &str) -> Result<Vec<LatLng>, MapError> {
    let body = get(src)
        .await
        .map_err(|message| MapError::TrackLoad { message })?
        .text()
        .await
        .map_err(|e| MapError::TrackLoad {
            message: e.to_string(),
        })?;
    ingest::parse_track(&body)
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TourData {
    pub title: String,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub maps: Vec<TourMapData>,
}

/// One map container on a tour page, carrying what a content page would put
/// in its `data-*` attributes.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TourMapData {
    #[serde(default)]
    pub track_src: Option<String>,
    #[serde(default)]
    pub peaks: serde_json::Value,
    #[serde(default)]
    pub map_config: Option<serde_json::Value>,
}

impl TourMapData {
    /// `data-peaks` text. Strings are passed through untouched so pages can
    /// hand over an already escaped attribute value.
    pub fn peaks_attribute(&self) -> Option<String> {
        match &self.peaks {
            serde_json::Value::Null => None,
            serde_json::Value::String(raw) => Some(raw.clone()),
            other => Some(other.to_string()),
        }
    }

    pub fn config_attribute(&self) -> Option<String> {
        self.map_config.as_ref().map(|c| c.to_string())
    }
}

pub async fn fetch_tour(slug: &str) -> Result<TourData, String> {
    get(&format!("/static/tours/{}.json", slug))
        .await?
        .json()
        .await
        .map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_url() {
        let origin = "https://example.org";
        assert_eq!(resolve_url(origin, "/gpx/a.gpx.json"), "https://example.org/gpx/a.gpx.json");
        assert_eq!(resolve_url(origin, "gpx/a.json"), "https://example.org/gpx/a.json");
        assert_eq!(resolve_url(origin, "https://cdn.example.org/t.json"), "https://cdn.example.org/t.json");
    }

    #[test]
    fn test_tour_manifest_decodes() {
        let raw = r#"{
            "title": "Stubaier Runde",
            "maps": [
                {
                    "trackSrc": "/tracks/stubai.json",
                    "peaks": [{"lat": 47.1, "lng": 11.2, "label": "Habicht"}],
                    "mapConfig": {"maxZoom": 16}
                },
                {"peaks": "[{&quot;lat&quot;: 47.0, &quot;lng&quot;: 11.0}]"}
            ]
        }"#;
        let tour: TourData = serde_json::from_str(raw).unwrap();
        assert_eq!(tour.maps.len(), 2);
        assert_eq!(tour.summary, None);

        let first = &tour.maps[0];
        assert_eq!(first.track_src.as_deref(), Some("/tracks/stubai.json"));
        assert!(first.peaks_attribute().unwrap().contains("Habicht"));
        assert_eq!(first.config_attribute().as_deref(), Some(r#"{"maxZoom":16}"#));

        let second = &tour.maps[1];
        assert_eq!(second.track_src, None);
        assert!(second.peaks_attribute().unwrap().starts_with("[{&quot;"));
    }

    #[test]
    fn test_missing_peaks_attribute() {
        let map: TourMapData = serde_json::from_str(r#"{"trackSrc": "/t.json"}"#).unwrap();
        assert_eq!(map.peaks_attribute(), None);
        assert_eq!(map.config_attribute(), None);
    }
}
