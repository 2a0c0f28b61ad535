//! Import of public drinking-water locations from an Overpass endpoint.
//!
//! Fetches nodes tagged `amenity=drinking_water` within a bounding box
//! and records each as an external water source. Imported records carry
//! no owning user, are flagged `is_external`, and keep the dataset's
//! node id so re-imports are idempotent.

use crate::app_config;
use crate::moderation::ModerationStatus;
use crate::water_source::{self, CreateWaterSource, SourceError};
use sea_orm::{DatabaseConnection, DbErr};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Import area, in decimal degrees.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub min_lon: f64,
    pub max_lat: f64,
    pub max_lon: f64,
}

impl BoundingBox {
    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.min_lat)
            && (-90.0..=90.0).contains(&self.max_lat)
            && (-180.0..=180.0).contains(&self.min_lon)
            && (-180.0..=180.0).contains(&self.max_lon)
            && self.min_lat < self.max_lat
            && self.min_lon < self.max_lon
    }
}

#[derive(Debug, Deserialize)]
struct OverpassResponse {
    #[serde(default)]
    elements: Vec<OverpassElement>,
}

#[derive(Debug, Deserialize)]
struct OverpassElement {
    id: i64,
    lat: Option<f64>,
    lon: Option<f64>,
    #[serde(default)]
    tags: HashMap<String, String>,
}

/// Counters reported back to the admin who triggered the import.
#[derive(Debug, Default, Serialize)]
pub struct ImportSummary {
    pub fetched: usize,
    pub imported: usize,
    pub skipped_existing: usize,
    pub skipped_duplicate_location: usize,
    pub skipped_invalid: usize,
}

#[derive(Debug)]
pub enum ImportError {
    InvalidBoundingBox,
    Http(reqwest::Error),
    Db(DbErr),
}

impl fmt::Display for ImportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImportError::InvalidBoundingBox => write!(f, "Invalid bounding box"),
            ImportError::Http(e) => write!(f, "Overpass request failed: {}", e),
            ImportError::Db(e) => write!(f, "Database error: {}", e),
        }
    }
}

impl std::error::Error for ImportError {}

impl From<reqwest::Error> for ImportError {
    fn from(e: reqwest::Error) -> Self {
        ImportError::Http(e)
    }
}

impl From<DbErr> for ImportError {
    fn from(e: DbErr) -> Self {
        ImportError::Db(e)
    }
}

fn build_query(bbox: &BoundingBox, timeout_seconds: u32) -> String {
    format!(
        "[out:json][timeout:{}];node[\"amenity\"=\"drinking_water\"]({},{},{},{});out;",
        timeout_seconds, bbox.min_lat, bbox.min_lon, bbox.max_lat, bbox.max_lon
    )
}

fn source_type_from_tags(tags: &HashMap<String, String>) -> String {
    if tags.get("man_made").map(String::as_str) == Some("water_tap") {
        "tap".to_owned()
    } else if tags.contains_key("fountain") {
        "fountain".to_owned()
    } else {
        "drinking_water".to_owned()
    }
}

async fn fetch_elements(bbox: &BoundingBox) -> Result<Vec<OverpassElement>, ImportError> {
    let import = app_config::import();
    let query = build_query(bbox, import.overpass_timeout_seconds);

    let response: OverpassResponse = reqwest::Client::new()
        .post(&import.overpass_url)
        .form(&[("data", query.as_str())])
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    Ok(response.elements)
}

/// Runs the import. Nodes already imported (by external id) and nodes
/// landing within the duplicate-location tolerance of any existing
/// source are skipped; everything else is inserted as an approved
/// external record with no owning user.
pub async fn import_drinking_water(
    db: &DatabaseConnection,
    bbox: &BoundingBox,
) -> Result<ImportSummary, ImportError> {
    if !bbox.is_valid() {
        return Err(ImportError::InvalidBoundingBox);
    }

    let elements = fetch_elements(bbox).await?;
    let mut summary = ImportSummary {
        fetched: elements.len(),
        ..Default::default()
    };

    for element in elements {
        let (lat, lon) = match (element.lat, element.lon) {
            (Some(lat), Some(lon)) => (lat, lon),
            _ => {
                summary.skipped_invalid += 1;
                continue;
            }
        };

        let external_id = format!("node/{}", element.id);
        if water_source::external_id_exists(db, &external_id).await? {
            summary.skipped_existing += 1;
            continue;
        }

        let input = CreateWaterSource {
            name: element
                .tags
                .get("name")
                .cloned()
                .unwrap_or_else(|| "Drinking water".to_owned()),
            source_type: source_type_from_tags(&element.tags),
            latitude: lat,
            longitude: lon,
            description: None,
            accessibility: element.tags.get("wheelchair").cloned(),
            schedule: element.tags.get("opening_hours").cloned(),
            address: None,
            city: None,
            country: None,
        };

        match water_source::create(
            db,
            None,
            &input,
            ModerationStatus::Approved,
            Some(external_id),
        )
        .await
        {
            Ok(_) => summary.imported += 1,
            Err(SourceError::DuplicateLocation) => summary.skipped_duplicate_location += 1,
            Err(SourceError::InvalidCoordinate) | Err(SourceError::NotFound) => {
                summary.skipped_invalid += 1
            }
            Err(SourceError::Db(e)) => return Err(e.into()),
        }
    }

    log::info!(
        "Overpass import finished: {} fetched, {} imported, {} already known, {} duplicate locations, {} invalid",
        summary.fetched,
        summary.imported,
        summary.skipped_existing,
        summary.skipped_duplicate_location,
        summary.skipped_invalid
    );

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounding_box_validation() {
        let ok = BoundingBox {
            min_lat: 40.0,
            min_lon: -4.0,
            max_lat: 41.0,
            max_lon: -3.0,
        };
        assert!(ok.is_valid());

        let inverted = BoundingBox {
            min_lat: 41.0,
            min_lon: -4.0,
            max_lat: 40.0,
            max_lon: -3.0,
        };
        assert!(!inverted.is_valid());

        let out_of_range = BoundingBox {
            min_lat: -95.0,
            min_lon: -4.0,
            max_lat: 40.0,
            max_lon: -3.0,
        };
        assert!(!out_of_range.is_valid());
    }

    #[test]
    fn query_contains_bbox_and_filter() {
        let bbox = BoundingBox {
            min_lat: 40.0,
            min_lon: -4.0,
            max_lat: 41.0,
            max_lon: -3.0,
        };
        let query = build_query(&bbox, 25);
        assert!(query.contains("amenity"));
        assert!(query.contains("drinking_water"));
        assert!(query.contains("(40,-4,41,-3)"));
        assert!(query.starts_with("[out:json][timeout:25];"));
    }

    #[test]
    fn parses_overpass_payload() {
        let payload = r#"{
            "version": 0.6,
            "elements": [
                {"type": "node", "id": 123, "lat": 40.1, "lon": -3.2,
                 "tags": {"amenity": "drinking_water", "name": "Fuente Vieja"}},
                {"type": "node", "id": 456, "lat": 40.2, "lon": -3.3}
            ]
        }"#;

        let parsed: OverpassResponse = serde_json::from_str(payload).unwrap();
        assert_eq!(parsed.elements.len(), 2);
        assert_eq!(parsed.elements[0].id, 123);
        assert_eq!(
            parsed.elements[0].tags.get("name").map(String::as_str),
            Some("Fuente Vieja")
        );
        assert!(parsed.elements[1].tags.is_empty());
    }
}
