//! TopoJSON boundary topology decoding.
//!
//! A [`Topology`] holds decoded arcs (absolute longitude/latitude positions)
//! and the named geometry objects referencing them. [`Topology::features`]
//! stitches an object's arcs back into polygon [`Feature`]s.
//!
//! Both quantized topologies (with a `transform` and delta-encoded arcs) and
//! plain ones are supported. Only `Polygon` and `MultiPolygon` geometries
//! produce features; other geometry types are skipped.

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::GeoError;

/// A linear ring of `[lon, lat]` positions.
pub type Ring = Vec<[f64; 2]>;

/// Polygonal feature geometry.
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    /// Rings of one polygon; the first is the exterior.
    Polygon(Vec<Ring>),
    /// Several polygons.
    MultiPolygon(Vec<Vec<Ring>>),
}

impl Geometry {
    /// Iterates over every ring of every polygon.
    pub fn rings(&self) -> Box<dyn Iterator<Item = &Ring> + '_> {
        match self {
            Self::Polygon(rings) => Box::new(rings.iter()),
            Self::MultiPolygon(polygons) => Box::new(polygons.iter().flatten()),
        }
    }
}

/// A region of a boundary topology.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    id: Option<String>,
    properties: Map<String, Value>,
    geometry: Geometry,
}

impl Feature {
    /// Returns the feature id, if any.
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Returns the region name (`properties.name`).
    pub fn name(&self) -> Option<&str> {
        self.properties.get("name").and_then(Value::as_str)
    }

    /// Returns all feature properties.
    pub fn properties(&self) -> &Map<String, Value> {
        &self.properties
    }

    /// Returns the polygonal geometry.
    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }
}

#[derive(Debug, Deserialize)]
struct RawTopology {
    #[serde(default)]
    transform: Option<RawTransform>,
    #[serde(default)]
    objects: IndexMap<String, RawGeometry>,
    #[serde(default)]
    arcs: Vec<Vec<Vec<f64>>>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
struct RawTransform {
    scale: [f64; 2],
    translate: [f64; 2],
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
enum RawGeometry {
    GeometryCollection {
        #[serde(default)]
        geometries: Vec<RawGeometry>,
    },
    Polygon {
        arcs: Vec<Vec<i64>>,
        #[serde(default)]
        id: Option<Value>,
        #[serde(default)]
        properties: Option<Map<String, Value>>,
    },
    MultiPolygon {
        arcs: Vec<Vec<Vec<i64>>>,
        #[serde(default)]
        id: Option<Value>,
        #[serde(default)]
        properties: Option<Map<String, Value>>,
    },
    #[serde(other)]
    Unsupported,
}

/// A decoded boundary topology.
///
/// # Examples
///
/// ```
/// use geodeck::topology::Topology;
///
/// let json = r#"{
///   "type": "Topology",
///   "objects": {"states": {"type": "GeometryCollection", "geometries": [
///     {"type": "Polygon", "arcs": [[0]], "properties": {"name": "X"}}
///   ]}},
///   "arcs": [[[0, 0], [1, 0], [1, 1], [0, 0]]]
/// }"#;
/// let topology = Topology::from_slice(json.as_bytes()).unwrap();
/// let features = topology.features("states").unwrap();
/// assert_eq!(features[0].name(), Some("X"));
/// ```
#[derive(Debug, Clone)]
pub struct Topology {
    arcs: Vec<Vec<[f64; 2]>>,
    objects: IndexMap<String, RawGeometry>,
}

impl Topology {
    /// Decodes a TopoJSON document.
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes are not a valid TopoJSON document.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        let raw: RawTopology = serde_json::from_slice(bytes)?;
        let arcs = raw
            .arcs
            .iter()
            .map(|arc| decode_arc(arc, raw.transform))
            .collect();
        Ok(Self {
            arcs,
            objects: raw.objects,
        })
    }

    /// Returns the names of the topology's objects.
    pub fn object_names(&self) -> impl Iterator<Item = &str> {
        self.objects.keys().map(String::as_str)
    }

    /// Returns the number of decoded arcs.
    pub fn arc_count(&self) -> usize {
        self.arcs.len()
    }

    /// Converts the named object into polygon features.
    ///
    /// # Errors
    ///
    /// Returns [`GeoError::Topology`] if the object does not exist or
    /// references an arc that is out of range.
    pub fn features(&self, object: &str) -> Result<Vec<Feature>, GeoError> {
        let geometry = self.objects.get(object).ok_or_else(|| {
            GeoError::Topology(format!("object `{object}` not found in topology"))
        })?;
        let mut features = Vec::new();
        self.collect_features(geometry, &mut features)?;
        Ok(features)
    }

    fn collect_features(
        &self,
        geometry: &RawGeometry,
        features: &mut Vec<Feature>,
    ) -> Result<(), GeoError> {
        match geometry {
            RawGeometry::GeometryCollection { geometries } => {
                for child in geometries {
                    self.collect_features(child, features)?;
                }
            }
            RawGeometry::Polygon {
                arcs,
                id,
                properties,
            } => features.push(Feature {
                id: id.as_ref().map(value_to_id),
                properties: properties.clone().unwrap_or_default(),
                geometry: Geometry::Polygon(self.polygon(arcs)?),
            }),
            RawGeometry::MultiPolygon {
                arcs,
                id,
                properties,
            } => features.push(Feature {
                id: id.as_ref().map(value_to_id),
                properties: properties.clone().unwrap_or_default(),
                geometry: Geometry::MultiPolygon(
                    arcs.iter()
                        .map(|polygon| self.polygon(polygon))
                        .collect::<Result<_, _>>()?,
                ),
            }),
            RawGeometry::Unsupported => {}
        }
        Ok(())
    }

    fn polygon(&self, rings: &[Vec<i64>]) -> Result<Vec<Ring>, GeoError> {
        rings.iter().map(|ring| self.ring(ring)).collect()
    }

    /// Stitches arcs into one ring; consecutive arcs share their joint point.
    fn ring(&self, indexes: &[i64]) -> Result<Ring, GeoError> {
        let mut points: Ring = Vec::new();
        for &index in indexes {
            let (arc_index, reversed) = if index < 0 {
                (!index, true)
            } else {
                (index, false)
            };
            let arc = usize::try_from(arc_index)
                .ok()
                .and_then(|i| self.arcs.get(i))
                .ok_or_else(|| GeoError::Topology(format!("arc index {index} out of range")))?;

            points.pop();
            if reversed {
                points.extend(arc.iter().rev());
            } else {
                points.extend(arc.iter());
            }
        }
        Ok(points)
    }
}

fn decode_arc(arc: &[Vec<f64>], transform: Option<RawTransform>) -> Vec<[f64; 2]> {
    let positions = arc
        .iter()
        .filter(|position| position.len() >= 2)
        .map(|position| [position[0], position[1]]);

    match transform {
        None => positions.collect(),
        Some(RawTransform { scale, translate }) => {
            let (mut x, mut y) = (0.0, 0.0);
            positions
                .map(|[dx, dy]| {
                    x += dx;
                    y += dy;
                    [x * scale[0] + translate[0], y * scale[1] + translate[1]]
                })
                .collect()
        }
    }
}

fn value_to_id(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUANTIZED: &str = r#"{
      "type": "Topology",
      "transform": {"scale": [0.5, 0.5], "translate": [-100, 30]},
      "objects": {
        "states": {"type": "GeometryCollection", "geometries": [
          {"type": "Polygon", "id": "01", "arcs": [[0, 1]], "properties": {"name": "West"}},
          {"type": "MultiPolygon", "id": 2, "arcs": [[[-2, 2]]], "properties": {"name": "East"}},
          {"type": "Point", "coordinates": [0, 0]}
        ]}
      },
      "arcs": [
        [[0, 0], [0, 2], [2, 0]],
        [[2, 2], [0, -2], [-2, 0]],
        [[2, 2], [2, 0], [0, -2], [-2, 0]]
      ]
    }"#;

    #[test]
    fn test_decode_quantized_arcs() {
        let topology = Topology::from_slice(QUANTIZED.as_bytes()).unwrap();
        assert_eq!(topology.arc_count(), 3);
        assert_eq!(
            topology.arcs[0],
            vec![[-100.0, 30.0], [-100.0, 31.0], [-99.0, 31.0]]
        );
    }

    #[test]
    fn test_features_stitch_arcs() {
        let topology = Topology::from_slice(QUANTIZED.as_bytes()).unwrap();
        let features = topology.features("states").unwrap();
        assert_eq!(features.len(), 2);

        let west = &features[0];
        assert_eq!(west.name(), Some("West"));
        assert_eq!(west.id(), Some("01"));
        let Geometry::Polygon(rings) = west.geometry() else {
            panic!("expected polygon");
        };
        assert_eq!(
            rings[0],
            vec![
                [-100.0, 30.0],
                [-100.0, 31.0],
                [-99.0, 31.0],
                [-99.0, 30.0],
                [-100.0, 30.0]
            ]
        );
    }

    #[test]
    fn test_reversed_arc() {
        let topology = Topology::from_slice(QUANTIZED.as_bytes()).unwrap();
        let features = topology.features("states").unwrap();
        let east = &features[1];
        assert_eq!(east.id(), Some("2"));
        let Geometry::MultiPolygon(polygons) = east.geometry() else {
            panic!("expected multipolygon");
        };
        let ring = &polygons[0][0];
        assert_eq!(ring.first(), Some(&[-100.0, 30.0]));
        assert_eq!(ring[1], [-99.0, 30.0]);
        assert_eq!(east.geometry().rings().count(), 1);
    }

    #[test]
    fn test_missing_object() {
        let topology = Topology::from_slice(QUANTIZED.as_bytes()).unwrap();
        assert!(matches!(
            topology.features("counties"),
            Err(GeoError::Topology(_))
        ));
    }

    #[test]
    fn test_arc_out_of_range() {
        let json = r#"{"objects": {"s": {"type": "Polygon", "arcs": [[7]]}}, "arcs": []}"#;
        let topology = Topology::from_slice(json.as_bytes()).unwrap();
        assert!(topology.features("s").is_err());
    }

    #[test]
    fn test_invalid_json() {
        assert!(Topology::from_slice(b"not json").is_err());
    }
}
