use crate::core::units;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Per-unit physical descriptor. `None` means unknown, never zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ShippingSpecs {
    pub height_in: Option<f64>,
    pub width_in: Option<f64>,
    pub depth_in: Option<f64>,
    pub weight_lbs: Option<f64>,
}

impl ShippingSpecs {
    pub fn has_dimensions(&self) -> bool {
        self.height_in.is_some() || self.width_in.is_some() || self.depth_in.is_some()
    }

    pub fn dimensions(&self) -> Option<Dimensions> {
        self.has_dimensions().then_some(Dimensions {
            height_in: self.height_in,
            width_in: self.width_in,
            depth_in: self.depth_in,
        })
    }
}

/// 代表性尺寸，個別欄位仍可能未知
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Dimensions {
    pub height_in: Option<f64>,
    pub width_in: Option<f64>,
    pub depth_in: Option<f64>,
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let side = |v: Option<f64>| v.map(|n| n.to_string()).unwrap_or_else(|| "?".to_string());
        write!(
            f,
            "{} x {} x {} in (H x W x D)",
            side(self.height_in),
            side(self.width_in),
            side(self.depth_in)
        )
    }
}

/// Structured dimension record as stored on a catalog product (inches / pounds).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DimensionRecord {
    pub length: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub weight: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub dimensions: Option<DimensionRecord>,
    pub description: Option<String>,
    pub min_order_quantity: Option<u32>,
}

impl Product {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            dimensions: None,
            description: None,
            min_order_quantity: None,
        }
    }

    pub fn with_dimensions(mut self, dimensions: DimensionRecord) -> Self {
        self.dimensions = Some(dimensions);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_min_order_quantity(mut self, quantity: u32) -> Self {
        self.min_order_quantity = Some(quantity);
        self
    }

    /// 最小可下單數量，至少為 1
    pub fn minimum_quantity(&self) -> u32 {
        self.min_order_quantity.unwrap_or(1).max(1)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LineItem {
    product: Product,
    quantity: u32,
    specs: ShippingSpecs,
}

impl LineItem {
    /// Refuses quantities below 1 or below the product's minimum order quantity.
    pub fn new(
        product: Product,
        quantity: u32,
        specs: ShippingSpecs,
    ) -> crate::utils::error::Result<Self> {
        let minimum = product.minimum_quantity();
        if quantity < minimum {
            return Err(crate::utils::error::QuoteError::QuantityBelowMinimum {
                product: product.name.clone(),
                quantity,
                minimum,
            });
        }
        Ok(Self {
            product,
            quantity,
            specs,
        })
    }

    pub fn product(&self) -> &Product {
        &self.product
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn specs(&self) -> &ShippingSpecs {
        &self.specs
    }
}

/// Aggregated shipment before it is converted to the wire payload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Shipment {
    /// Unrounded; rounding happens at the wire-payload boundary.
    pub total_weight_lbs: f64,
    pub dimensions: Option<Dimensions>,
    pub breakdown: Vec<String>,
    pub line_count: usize,
}

impl Shipment {
    pub fn is_empty(&self) -> bool {
        self.line_count == 0
    }

    pub fn summary(&self) -> String {
        let dims = self
            .dimensions
            .map(|d| d.to_string())
            .unwrap_or_else(|| "dimensions unknown".to_string());
        format!(
            "{} lb total, {}, {} line item(s)",
            self.total_weight_lbs, dims, self.line_count
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LocationType {
    Business,
    Residential,
    #[serde(rename = "CONSTRUCTIONSITE")]
    ConstructionSite,
    #[serde(rename = "TRADESHOW")]
    TradeShow,
}

impl Default for LocationType {
    fn default() -> Self {
        LocationType::Residential
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Accessorial {
    #[serde(rename = "RESIDENTIAL")]
    Residential,
    #[serde(rename = "LIFTGATE_DLV")]
    LiftgateDelivery,
}

/// NMFC freight classes, serialized by their string code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum FreightClass {
    C50,
    C55,
    C60,
    C65,
    C70,
    C77_5,
    C85,
    C92_5,
    C100,
    C110,
    C125,
    C150,
    C175,
    C200,
    C250,
    C300,
    C400,
    C500,
}

impl FreightClass {
    const ALL: [(FreightClass, &'static str); 18] = [
        (FreightClass::C50, "50"),
        (FreightClass::C55, "55"),
        (FreightClass::C60, "60"),
        (FreightClass::C65, "65"),
        (FreightClass::C70, "70"),
        (FreightClass::C77_5, "77.5"),
        (FreightClass::C85, "85"),
        (FreightClass::C92_5, "92.5"),
        (FreightClass::C100, "100"),
        (FreightClass::C110, "110"),
        (FreightClass::C125, "125"),
        (FreightClass::C150, "150"),
        (FreightClass::C175, "175"),
        (FreightClass::C200, "200"),
        (FreightClass::C250, "250"),
        (FreightClass::C300, "300"),
        (FreightClass::C400, "400"),
        (FreightClass::C500, "500"),
    ];

    pub fn code(&self) -> &'static str {
        Self::ALL
            .iter()
            .find(|(class, _)| class == self)
            .map(|(_, code)| *code)
            .unwrap_or("70")
    }
}

impl Default for FreightClass {
    fn default() -> Self {
        FreightClass::C70
    }
}

impl FromStr for FreightClass {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|(_, code)| *code == s.trim())
            .map(|(class, _)| *class)
            .ok_or_else(|| format!("unknown freight class '{}'", s))
    }
}

impl TryFrom<String> for FreightClass {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<FreightClass> for String {
    fn from(class: FreightClass) -> Self {
        class.code().to_string()
    }
}

/// Outbound payload sent to the rate provider.
///
/// Fields are private so that `total_grams` can only be derived from
/// `total_lbs` through [`ShipmentRequest::new`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShipmentRequest {
    origin_postal: String,
    dest_postal: String,
    total_lbs: u64,
    total_grams: u64,
    freight_class: FreightClass,
    origin_type: LocationType,
    dest_type: LocationType,
    accessorials: BTreeSet<Accessorial>,
    currency: String,
}

impl ShipmentRequest {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        origin_postal: String,
        dest_postal: String,
        total_lbs: u64,
        freight_class: FreightClass,
        origin_type: LocationType,
        dest_type: LocationType,
        accessorials: BTreeSet<Accessorial>,
        currency: String,
    ) -> Self {
        Self {
            origin_postal,
            dest_postal,
            total_lbs,
            total_grams: units::lbs_to_grams(total_lbs),
            freight_class,
            origin_type,
            dest_type,
            accessorials,
            currency,
        }
    }

    pub fn origin_postal(&self) -> &str {
        &self.origin_postal
    }

    pub fn dest_postal(&self) -> &str {
        &self.dest_postal
    }

    pub fn total_lbs(&self) -> u64 {
        self.total_lbs
    }

    pub fn total_grams(&self) -> u64 {
        self.total_grams
    }

    pub fn freight_class(&self) -> FreightClass {
        self.freight_class
    }

    pub fn dest_type(&self) -> LocationType {
        self.dest_type
    }

    pub fn accessorials(&self) -> &BTreeSet<Accessorial> {
        &self.accessorials
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }
}

/// A priced carrier option. `amount` is in minor currency units (cents).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    pub amount: u64,
    pub carrier: String,
    pub service: String,
    pub quote_id: Option<String>,
    pub eta_min: Option<u32>,
    pub eta_max: Option<u32>,
}

impl Quote {
    pub fn display_amount(&self) -> String {
        format!("${}.{:02}", self.amount / 100, self.amount % 100)
    }

    pub fn eta(&self) -> Option<String> {
        match (self.eta_min, self.eta_max) {
            (Some(min), Some(max)) if min != max => Some(format!("{}-{} days", min, max)),
            (Some(days), _) | (None, Some(days)) => Some(format!("{} days", days)),
            (None, None) => None,
        }
    }
}

impl fmt::Display for Quote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.display_amount(), self.carrier, self.service)?;
        if let Some(eta) = self.eta() {
            write!(f, " ({})", eta)?;
        }
        Ok(())
    }
}

pub const DECLINED_MESSAGE: &str =
    "We could not get a live freight quote. You may continue; freight will be confirmed after checkout.";
/// Shown for a declined quote while checkout stays closed.
pub const DECLINED_BLOCKED_MESSAGE: &str =
    "We could not get a live freight quote. Checkout needs a freight option; check the ZIP or try again later.";
pub const NO_RATES_MESSAGE: &str = "No live rates for this lane.";
pub const TIMEOUT_MESSAGE: &str = "The freight quote request timed out. Please try again.";

/// Inline, non-crashing failure shown in place of quote options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuoteFailure {
    /// Provider explicitly declined (`ok:false`).
    Declined,
    /// Provider answered but no usable rate survived normalization.
    NoRates,
    Timeout,
    Transport(String),
}

impl QuoteFailure {
    pub fn message(&self) -> &str {
        match self {
            QuoteFailure::Declined => DECLINED_MESSAGE,
            QuoteFailure::NoRates => NO_RATES_MESSAGE,
            QuoteFailure::Timeout => TIMEOUT_MESSAGE,
            QuoteFailure::Transport(message) => message,
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, QuoteFailure::Timeout | QuoteFailure::Transport(_))
    }

    /// 供應商婉拒屬於軟性訊息，不算錯誤
    pub fn is_soft(&self) -> bool {
        matches!(self, QuoteFailure::Declined | QuoteFailure::NoRates)
    }

    /// Message consistent with the checkout gate: the "you may continue"
    /// wording is only used when checkout is actually open.
    pub fn notice(&self, may_proceed: bool) -> &str {
        match self {
            QuoteFailure::Declined if !may_proceed => DECLINED_BLOCKED_MESSAGE,
            _ => self.message(),
        }
    }
}

impl fmt::Display for QuoteFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct QuoteSet {
    options: Vec<Quote>,
    error: Option<QuoteFailure>,
    fetched_at: DateTime<Utc>,
}

impl QuoteSet {
    /// Sorts ascending by amount (stable). An empty list becomes `NoRates`.
    pub fn options(mut options: Vec<Quote>) -> Self {
        if options.is_empty() {
            return Self::failed(QuoteFailure::NoRates);
        }
        options.sort_by_key(|q| q.amount);
        Self {
            options,
            error: None,
            fetched_at: Utc::now(),
        }
    }

    pub fn failed(error: QuoteFailure) -> Self {
        Self {
            options: Vec::new(),
            error: Some(error),
            fetched_at: Utc::now(),
        }
    }

    pub fn quotes(&self) -> &[Quote] {
        &self.options
    }

    pub fn error(&self) -> Option<&QuoteFailure> {
        self.error.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    pub fn fetched_at(&self) -> DateTime<Utc> {
        self.fetched_at
    }

    pub fn cheapest(&self) -> Option<&Quote> {
        self.options.first()
    }

    pub(crate) fn truncate(&mut self, limit: usize) {
        self.options.truncate(limit.max(1));
    }
}

/// Checkout line item produced from the selected quote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FreightLine {
    pub label: String,
    pub amount: u64,
    pub carrier: String,
    pub service: String,
    pub quote_id: Option<String>,
}

impl From<&Quote> for FreightLine {
    fn from(quote: &Quote) -> Self {
        Self {
            label: format!("Freight: {} {}", quote.carrier, quote.service),
            amount: quote.amount,
            carrier: quote.carrier.clone(),
            service: quote.service.clone(),
            quote_id: quote.quote_id.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutState {
    pub may_proceed: bool,
    pub line: Option<FreightLine>,
    /// Inline failure text to show next to the checkout button.
    pub notice: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quote(amount: u64) -> Quote {
        Quote {
            amount,
            carrier: "Carrier".to_string(),
            service: "Standard".to_string(),
            quote_id: None,
            eta_min: None,
            eta_max: None,
        }
    }

    #[test]
    fn test_shipment_request_grams_follow_pounds() {
        let request = ShipmentRequest::new(
            "30301".to_string(),
            "90210".to_string(),
            10,
            FreightClass::default(),
            LocationType::Business,
            LocationType::Residential,
            BTreeSet::new(),
            "USD".to_string(),
        );
        assert_eq!(request.total_lbs(), 10);
        assert_eq!(request.total_grams(), 4536);
    }

    #[test]
    fn test_shipment_request_wire_format() {
        let mut accessorials = BTreeSet::new();
        accessorials.insert(Accessorial::LiftgateDelivery);
        accessorials.insert(Accessorial::Residential);
        let request = ShipmentRequest::new(
            "30301".to_string(),
            "90210".to_string(),
            12,
            FreightClass::C77_5,
            LocationType::Business,
            LocationType::ConstructionSite,
            accessorials,
            "USD".to_string(),
        );

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "originPostal": "30301",
                "destPostal": "90210",
                "totalLbs": 12,
                "totalGrams": 5443,
                "freightClass": "77.5",
                "originType": "BUSINESS",
                "destType": "CONSTRUCTIONSITE",
                "accessorials": ["RESIDENTIAL", "LIFTGATE_DLV"],
                "currency": "USD"
            })
        );
    }

    #[test]
    fn test_freight_class_parse() {
        assert_eq!("70".parse::<FreightClass>().unwrap(), FreightClass::C70);
        assert_eq!("92.5".parse::<FreightClass>().unwrap(), FreightClass::C92_5);
        assert!("71".parse::<FreightClass>().is_err());
        assert_eq!(FreightClass::default().code(), "70");
    }

    #[test]
    fn test_location_type_codes() {
        assert_eq!(
            serde_json::to_string(&LocationType::TradeShow).unwrap(),
            "\"TRADESHOW\""
        );
        let parsed: LocationType = serde_json::from_str("\"BUSINESS\"").unwrap();
        assert_eq!(parsed, LocationType::Business);
    }

    #[test]
    fn test_quote_set_sorted_ascending() {
        let set = QuoteSet::options(vec![quote(5200), quote(4100), quote(6000)]);
        let amounts: Vec<u64> = set.quotes().iter().map(|q| q.amount).collect();
        assert_eq!(amounts, vec![4100, 5200, 6000]);
        assert!(set.error().is_none());
    }

    #[test]
    fn test_empty_quote_set_is_no_rates() {
        let set = QuoteSet::options(vec![]);
        assert!(set.is_empty());
        assert_eq!(set.error(), Some(&QuoteFailure::NoRates));
    }

    #[test]
    fn test_line_item_rejects_below_minimum() {
        let product = Product::new("p1", "Pallet Jack").with_min_order_quantity(24);
        assert!(LineItem::new(product.clone(), 23, ShippingSpecs::default()).is_err());
        assert!(LineItem::new(product, 24, ShippingSpecs::default()).is_ok());

        let plain = Product::new("p2", "Crate");
        assert!(LineItem::new(plain, 0, ShippingSpecs::default()).is_err());
    }

    #[test]
    fn test_declined_notice_follows_checkout_gate() {
        let declined = QuoteFailure::Declined;
        assert!(declined.is_soft());
        assert_eq!(declined.notice(false), DECLINED_BLOCKED_MESSAGE);
        assert_eq!(declined.notice(true), DECLINED_MESSAGE);

        let timeout = QuoteFailure::Timeout;
        assert!(!timeout.is_soft());
        assert_eq!(timeout.notice(false), TIMEOUT_MESSAGE);
    }

    #[test]
    fn test_quote_display() {
        let mut q = quote(4105);
        q.eta_min = Some(3);
        q.eta_max = Some(5);
        assert_eq!(q.to_string(), "$41.05 Carrier Standard (3-5 days)");
    }
}
