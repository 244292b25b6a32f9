// Domain layer: table model and ports. Only std/serde beyond this point.

pub mod model;
pub mod ports;
