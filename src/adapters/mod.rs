// Adapters layer: concrete implementations for external systems (rate provider HTTP, cart files).

pub mod cart_csv;
pub mod http;
