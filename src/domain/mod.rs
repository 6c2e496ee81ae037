// Domain layer: core models and ports (interfaces).

pub mod credentials;
pub mod model;
pub mod ports;
pub mod template;
