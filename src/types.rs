//! Shared value types: camera identifiers, the four calibration corners, the
//! named edges between them and the measurements a calibration session asks
//! the operator for.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Pixel coordinate `[x, y]` with x to the right and y pointing down.
pub type PixelPoint = [f64; 2];

/// One of the two fixed cameras watching the truck bed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CameraId {
    Camera1,
    Camera2,
}

impl CameraId {
    pub const ALL: [CameraId; 2] = [CameraId::Camera1, CameraId::Camera2];

    pub fn as_str(self) -> &'static str {
        match self {
            CameraId::Camera1 => "camera1",
            CameraId::Camera2 => "camera2",
        }
    }

    pub fn other(self) -> CameraId {
        match self {
            CameraId::Camera1 => CameraId::Camera2,
            CameraId::Camera2 => CameraId::Camera1,
        }
    }
}

impl fmt::Display for CameraId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CameraId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "camera1" | "cam1" | "1" => Ok(CameraId::Camera1),
            "camera2" | "cam2" | "2" => Ok(CameraId::Camera2),
            other => Err(format!("unknown camera '{other}' (expected camera1 or camera2)")),
        }
    }
}

/// Quadrilateral vertex in canonical order: top-left, top-right, bottom-left,
/// bottom-right.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Corner {
    P1,
    P2,
    P3,
    P4,
}

impl Corner {
    pub const ALL: [Corner; 4] = [Corner::P1, Corner::P2, Corner::P3, Corner::P4];

    #[inline]
    pub fn index(self) -> usize {
        match self {
            Corner::P1 => 0,
            Corner::P2 => 1,
            Corner::P3 => 2,
            Corner::P4 => 3,
        }
    }

    pub fn from_index(index: usize) -> Option<Corner> {
        Corner::ALL.get(index).copied()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Corner::P1 => "P1",
            Corner::P2 => "P2",
            Corner::P3 => "P3",
            Corner::P4 => "P4",
        }
    }
}

impl fmt::Display for Corner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unordered pair of distinct corners naming a side or a diagonal.
///
/// Serialized as `"P1-P2"`; parsing also accepts the short `"D12"` form and
/// either corner order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Edge {
    a: Corner,
    b: Corner,
}

impl Edge {
    pub const P1_P2: Edge = Edge { a: Corner::P1, b: Corner::P2 };
    pub const P1_P3: Edge = Edge { a: Corner::P1, b: Corner::P3 };
    pub const P1_P4: Edge = Edge { a: Corner::P1, b: Corner::P4 };
    pub const P2_P3: Edge = Edge { a: Corner::P2, b: Corner::P3 };
    pub const P2_P4: Edge = Edge { a: Corner::P2, b: Corner::P4 };
    pub const P3_P4: Edge = Edge { a: Corner::P3, b: Corner::P4 };

    /// Edges requested from the operator, in prompt order.
    pub const REQUIRED: [Edge; 5] = [
        Edge::P1_P2,
        Edge::P1_P3,
        Edge::P2_P3,
        Edge::P2_P4,
        Edge::P3_P4,
    ];

    /// Builds the edge between two corners; `None` when both are the same.
    pub fn new(a: Corner, b: Corner) -> Option<Edge> {
        match a.cmp(&b) {
            std::cmp::Ordering::Less => Some(Edge { a, b }),
            std::cmp::Ordering::Greater => Some(Edge { a: b, b: a }),
            std::cmp::Ordering::Equal => None,
        }
    }

    #[inline]
    pub fn corners(self) -> (Corner, Corner) {
        (self.a, self.b)
    }

    pub fn name(self) -> String {
        format!("{}-{}", self.a, self.b)
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.a, self.b)
    }
}

impl FromStr for Edge {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim().to_ascii_uppercase();
        let digits: Vec<usize> = trimmed
            .chars()
            .filter_map(|c| c.to_digit(10))
            .map(|d| d as usize)
            .collect();
        let well_formed = match trimmed.as_str() {
            t if t.starts_with('D') => t.len() == 3,
            t => t.len() == 5 && t.as_bytes()[2] == b'-' && t.starts_with('P'),
        };
        if !well_formed || digits.len() != 2 {
            return Err(format!("invalid edge name '{s}' (expected e.g. P1-P2 or D12)"));
        }
        let a = digits[0]
            .checked_sub(1)
            .and_then(Corner::from_index)
            .ok_or_else(|| format!("invalid corner in edge '{s}'"))?;
        let b = digits[1]
            .checked_sub(1)
            .and_then(Corner::from_index)
            .ok_or_else(|| format!("invalid corner in edge '{s}'"))?;
        Edge::new(a, b).ok_or_else(|| format!("edge '{s}' joins a corner to itself"))
    }
}

impl From<Edge> for String {
    fn from(edge: Edge) -> Self {
        edge.name()
    }
}

impl TryFrom<String> for Edge {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// A real-world quantity requested from the operator during calibration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Measurement {
    /// Length of a side or diagonal in meters.
    Edge(Edge),
    /// Camera height above the ground in meters.
    CameraHeight,
    /// Straight-line distance from the lens to a corner in meters.
    CameraDistance(Corner),
}

impl Measurement {
    /// Prompt text shown to the operator.
    pub fn prompt(self) -> String {
        match self {
            Measurement::Edge(edge) => format!("Real-world distance {edge} (meters)"),
            Measurement::CameraHeight => "Camera height above ground (meters)".to_string(),
            Measurement::CameraDistance(corner) => {
                format!("Distance from camera lens to {corner} (meters)")
            }
        }
    }
}

impl fmt::Display for Measurement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Measurement::Edge(edge) => write!(f, "edge {edge}"),
            Measurement::CameraHeight => f.write_str("camera height"),
            Measurement::CameraDistance(corner) => write!(f, "camera distance to {corner}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edge_parses_long_and_short_names() {
        assert_eq!("P1-P2".parse::<Edge>().unwrap(), Edge::P1_P2);
        assert_eq!("p3-p1".parse::<Edge>().unwrap(), Edge::P1_P3);
        assert_eq!("D23".parse::<Edge>().unwrap(), Edge::P2_P3);
        assert!("P1-P1".parse::<Edge>().is_err());
        assert!("P1-P5".parse::<Edge>().is_err());
        assert!("edge".parse::<Edge>().is_err());
    }

    #[test]
    fn edge_serializes_as_name() {
        let json = serde_json::to_string(&Edge::P2_P4).unwrap();
        assert_eq!(json, "\"P2-P4\"");
        let back: Edge = serde_json::from_str("\"D34\"").unwrap();
        assert_eq!(back, Edge::P3_P4);
    }

    #[test]
    fn camera_ids_round_trip_through_strings() {
        for cam in CameraId::ALL {
            assert_eq!(cam.as_str().parse::<CameraId>().unwrap(), cam);
            assert_eq!(cam.other().other(), cam);
        }
    }
}
