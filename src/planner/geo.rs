//! GeoJSON regions for `GEO_WITHIN`
//!
//! Supported regions: `Polygon` (outer ring only) and `AeroCircle`
//! (`[[lng, lat], radius_meters]`). Points are GeoJSON `Point` values,
//! either as JSON objects or as GeoJSON text.

use serde_json::Value;

const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// A region a point can be tested against
#[derive(Debug, Clone, PartialEq)]
pub enum GeoRegion {
    /// Outer ring as `[lng, lat]` vertices
    Polygon(Vec<[f64; 2]>),
    Circle { center: [f64; 2], radius_meters: f64 },
}

impl GeoRegion {
    /// Parses a region given as a GeoJSON object or GeoJSON text
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(text) => Self::from_text(text),
            Value::Object(_) => Self::from_geojson(value),
            _ => None,
        }
    }

    pub fn from_text(text: &str) -> Option<Self> {
        serde_json::from_str::<Value>(text)
            .ok()
            .and_then(|value| Self::from_geojson(&value))
    }

    fn from_geojson(value: &Value) -> Option<Self> {
        let coordinates = value.get("coordinates")?;
        match value.get("type")?.as_str()? {
            "Polygon" => {
                let ring = coordinates
                    .get(0)?
                    .as_array()?
                    .iter()
                    .map(position)
                    .collect::<Option<Vec<_>>>()?;
                (ring.len() >= 3).then_some(GeoRegion::Polygon(ring))
            }
            "AeroCircle" => {
                let center = position(coordinates.get(0)?)?;
                let radius_meters = coordinates.get(1)?.as_f64()?;
                (radius_meters >= 0.0).then_some(GeoRegion::Circle {
                    center,
                    radius_meters,
                })
            }
            _ => None,
        }
    }

    /// Returns true if `point` is a GeoJSON Point inside the region
    pub fn contains(&self, point: &Value) -> bool {
        let Some(point) = point_of(point) else {
            return false;
        };
        match self {
            GeoRegion::Polygon(ring) => ring_contains(ring, point),
            GeoRegion::Circle {
                center,
                radius_meters,
            } => haversine_meters(*center, point) <= *radius_meters,
        }
    }
}

fn position(value: &Value) -> Option<[f64; 2]> {
    let pair = value.as_array()?;
    Some([pair.first()?.as_f64()?, pair.get(1)?.as_f64()?])
}

fn point_of(value: &Value) -> Option<[f64; 2]> {
    match value {
        Value::String(text) => serde_json::from_str::<Value>(text)
            .ok()
            .and_then(|parsed| point_of(&parsed)),
        Value::Object(_) if value.get("type")?.as_str()? == "Point" => {
            position(value.get("coordinates")?)
        }
        _ => None,
    }
}

/// Even-odd ray casting on the lng/lat plane
fn ring_contains(ring: &[[f64; 2]], [x, y]: [f64; 2]) -> bool {
    if ring.len() < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = ring.len() - 1;
    for i in 0..ring.len() {
        let [xi, yi] = ring[i];
        let [xj, yj] = ring[j];
        if (yi > y) != (yj > y) && x < (xj - xi) * (y - yi) / (yj - yi) + xi {
            inside = !inside;
        }
        j = i;
    }
    inside
}

fn haversine_meters([lng1, lat1]: [f64; 2], [lng2, lat2]: [f64; 2]) -> f64 {
    let (phi1, phi2) = (lat1.to_radians(), lat2.to_radians());
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lng2 - lng1).to_radians();
    let a = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_METERS * a.sqrt().asin()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn point(lng: f64, lat: f64) -> Value {
        json!({"type": "Point", "coordinates": [lng, lat]})
    }

    #[test]
    fn test_polygon_contains() {
        let square = GeoRegion::from_value(&json!({
            "type": "Polygon",
            "coordinates": [[[0.0, 0.0], [10.0, 0.0], [10.0, 10.0], [0.0, 10.0], [0.0, 0.0]]]
        }))
        .unwrap();

        assert!(square.contains(&point(5.0, 5.0)));
        assert!(!square.contains(&point(15.0, 5.0)));
        assert!(!square.contains(&json!("not a point")));
    }

    #[test]
    fn test_circle_contains() {
        let circle = GeoRegion::from_text(
            r#"{"type": "AeroCircle", "coordinates": [[-122.0, 37.5], 1000.0]}"#,
        )
        .unwrap();

        assert!(circle.contains(&point(-122.0, 37.5)));
        // ~0.005 degrees of latitude is ~556m
        assert!(circle.contains(&point(-122.0, 37.505)));
        assert!(!circle.contains(&point(-122.0, 37.52)));
    }

    #[test]
    fn test_point_as_text() {
        let circle = GeoRegion::Circle {
            center: [0.0, 0.0],
            radius_meters: 10.0,
        };
        assert!(circle.contains(&json!(r#"{"type": "Point", "coordinates": [0.0, 0.0]}"#)));
    }

    #[test]
    fn test_rejects_unsupported_regions() {
        assert!(GeoRegion::from_value(&json!({"type": "Point", "coordinates": [0.0, 0.0]})).is_none());
        assert!(GeoRegion::from_value(&json!({"type": "Polygon", "coordinates": [[[0.0, 0.0]]]})).is_none());
        assert!(GeoRegion::from_value(&json!(42)).is_none());
        assert!(GeoRegion::from_text("{").is_none());
    }

    #[test]
    fn test_degenerate_polygon_contains_nothing() {
        assert!(!GeoRegion::Polygon(vec![]).contains(&point(0.0, 0.0)));
        assert!(!GeoRegion::Polygon(vec![[0.0, 0.0], [1.0, 1.0]]).contains(&point(0.5, 0.5)));
    }
}
