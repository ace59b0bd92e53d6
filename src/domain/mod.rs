// Domain layer: shipment and quote models plus the ports the engine talks through.

pub mod model;
pub mod ports;
