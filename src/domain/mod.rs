// Domain layer: page records, users and the ports the core depends on.

pub mod model;
pub mod ports;
