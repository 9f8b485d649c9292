// Domain layer: record batch model and the ports the pipeline is built against.

pub mod model;
pub mod ports;
