pub mod geom;
mod id;
pub mod io;
pub mod sim;
pub mod vecutils;

// Prelude
pub use geom::mesh::{Mesh, MeshFace};
pub use geom::point::Point;
pub use geom::polygon::Polygon;
pub use geom::room::{Aperture, BoundaryCondition, Room, Shade, strip_shades};
pub use geom::vector::Vector;
pub use id::Identifier;
pub use sim::shading::{
    AnalysisPeriod, Location, ShadeBenefitConfig, ShadeBenefitResult, ShadeBenefitSimulation,
    ShadeError, SimulationSeries,
};
