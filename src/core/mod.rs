pub mod aggregate;
pub mod quote_client;
pub mod selector;
pub mod specs;
pub mod units;

pub use crate::domain::model::{
    CheckoutState, FreightLine, LineItem, Product, Quote, QuoteFailure, QuoteSet, Shipment,
    ShipmentRequest, ShippingSpecs,
};
pub use crate::domain::ports::{CheckoutGate, QuoteSettings, RateProvider};
pub use crate::utils::error::Result;
