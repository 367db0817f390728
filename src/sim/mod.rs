pub mod engine;
pub mod shading;
