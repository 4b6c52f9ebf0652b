// Domain layer: order and label models plus the ports the pipeline is built on.

pub mod model;
pub mod ports;
