use crate::core::quote_client::ProviderResponse;
use crate::domain::model::ShipmentRequest;
use crate::utils::error::Result;
use async_trait::async_trait;

/// External rate-quote provider.
#[async_trait]
pub trait RateProvider: Send + Sync {
    async fn fetch(&self, request: &ShipmentRequest) -> Result<ProviderResponse>;
}

/// 結帳按鈕的協作者，只在狀態改變時收到通知
pub trait CheckoutGate: Send + Sync {
    fn checkout_changed(&self, enabled: bool);
}

/// Settings the quote engine needs, whatever the configuration source.
pub trait QuoteSettings: Send + Sync {
    fn origin_postal(&self) -> &str;
    fn origin_type(&self) -> crate::domain::model::LocationType;
    fn dest_type(&self) -> crate::domain::model::LocationType;
    fn freight_class(&self) -> crate::domain::model::FreightClass;
    fn min_weight_lbs(&self) -> u64;
    fn currency(&self) -> &str;
    fn timeout_seconds(&self) -> u64;
    fn compact_option_limit(&self) -> usize;
}
