// Domain layer: the File model and the ports (interfaces) the adapters implement.

pub mod model;
pub mod ports;
