// Domain layer: transient models of remote resources and the ports the runner depends on.

pub mod model;
pub mod ports;
