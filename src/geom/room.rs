//! Building model consumed by the shade analysis.
//!
//! Rooms own exterior apertures and the shades attached to them. Geometry is
//! stored as raw vertex loops as delivered by the host model. It is turned
//! into validated [`Polygon`](crate::Polygon)s only when an analysis indexes it,
//! so one bad shade cannot make a whole room unrepresentable.

use crate::{Identifier, Point, Vector};
use anyhow::Result;
use serde::{Deserialize, Serialize};

/// What lies on the other side of an aperture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BoundaryCondition {
    Outdoors,
    Ground,
    /// Interior aperture adjacent to the named surface.
    Surface(Identifier),
}

/// A shading device face attached to an aperture.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shade {
    pub identifier: Identifier,
    pub vertices: Vec<Point>,
}

impl Shade {
    pub fn new(identifier: &str, vertices: Vec<Point>) -> Self {
        Self {
            identifier: identifier.into(),
            vertices,
        }
    }
}

/// A glazed opening. The outward normal follows the vertex order (right-hand rule).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Aperture {
    pub identifier: Identifier,
    pub vertices: Vec<Point>,
    pub boundary: BoundaryCondition,
    #[serde(default)]
    pub shades: Vec<Shade>,
}

impl Aperture {
    /// Creates an exterior aperture without shades.
    pub fn new(identifier: &str, vertices: Vec<Point>) -> Self {
        Self {
            identifier: identifier.into(),
            vertices,
            boundary: BoundaryCondition::Outdoors,
            shades: Vec::new(),
        }
    }

    pub fn with_shade(mut self, shade: Shade) -> Self {
        self.shades.push(shade);
        self
    }

    pub fn with_boundary(mut self, boundary: BoundaryCondition) -> Self {
        self.boundary = boundary;
        self
    }

    pub fn is_exterior(&self) -> bool {
        self.boundary == BoundaryCondition::Outdoors
    }

    /// Exterior aperture with at least one attached shade.
    pub fn is_shaded(&self) -> bool {
        self.is_exterior() && !self.shades.is_empty()
    }

    /// Unit outward normal.
    pub fn normal(&self) -> Result<Vector> {
        Vector::newell(&self.vertices).normalize()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Room {
    pub identifier: Identifier,
    /// Thermal zone the room reports its loads under, if different from the room.
    #[serde(default)]
    pub zone: Option<String>,
    pub apertures: Vec<Aperture>,
}

impl Room {
    pub fn new(identifier: &str, apertures: Vec<Aperture>) -> Self {
        Self {
            identifier: identifier.into(),
            zone: None,
            apertures,
        }
    }

    /// Key under which the simulation reports this room's loads.
    pub fn load_key(&self) -> Identifier {
        match &self.zone {
            Some(zone) => Identifier::new(zone),
            None => self.identifier.clone(),
        }
    }

    pub fn shaded_apertures(&self) -> impl Iterator<Item = &Aperture> {
        self.apertures.iter().filter(|a| a.is_shaded())
    }
}

/// Returns copies of `rooms` with all aperture shades removed.
///
/// This is the first half of the two-phase protocol: the stripped copy goes
/// to the energy simulation, the original rooms go to the shade analysis.
pub fn strip_shades(rooms: &[Room]) -> Vec<Room> {
    rooms
        .iter()
        .map(|room| Room {
            identifier: room.identifier.clone(),
            zone: room.zone.clone(),
            apertures: room
                .apertures
                .iter()
                .map(|a| Aperture {
                    identifier: a.identifier.clone(),
                    vertices: a.vertices.clone(),
                    boundary: a.boundary.clone(),
                    shades: Vec::new(),
                })
                .collect(),
        })
        .collect()
}
