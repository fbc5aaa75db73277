// Domain layer: the metadata descriptor, its value types and the ports the engine talks through.

pub mod culture;
pub mod metadata;
pub mod model;
pub mod package;
pub mod ports;
pub mod version;
