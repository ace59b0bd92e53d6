use crate::core::units;
use crate::domain::model::{
    Accessorial, LocationType, Quote, QuoteFailure, QuoteSet, Shipment, ShipmentRequest,
};
use crate::domain::ports::QuoteSettings;
use crate::utils::error::{ErrorCategory, QuoteError, Result};
use crate::utils::validation::normalize_postal_code;
use serde_json::{Map, Value};
use std::collections::BTreeSet;

const DEFAULT_CARRIER: &str = "LTL Carrier";
const DEFAULT_SERVICE: &str = "Standard";

/// Per-request inputs supplied by the surface.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuoteOptions {
    pub dest_postal: String,
    pub liftgate: bool,
}

impl QuoteOptions {
    pub fn new(dest_postal: impl Into<String>) -> Self {
        Self {
            dest_postal: dest_postal.into(),
            liftgate: false,
        }
    }

    pub fn with_liftgate(mut self, liftgate: bool) -> Self {
        self.liftgate = liftgate;
        self
    }
}

/// Builds the outbound payload. Refuses locally (never sent) when the
/// destination is blank or the shipment has no positive, finite weight.
pub fn build_request<S: QuoteSettings + ?Sized>(
    shipment: &Shipment,
    options: &QuoteOptions,
    settings: &S,
) -> Result<ShipmentRequest> {
    let dest_postal = normalize_postal_code(&options.dest_postal)?;

    let weight = shipment.total_weight_lbs;
    if shipment.is_empty() || !weight.is_finite() || weight <= 0.0 {
        return Err(QuoteError::EmptyShipment);
    }

    let dest_type = settings.dest_type();
    let mut accessorials = BTreeSet::new();
    if dest_type == LocationType::Residential {
        accessorials.insert(Accessorial::Residential);
    }
    if options.liftgate {
        accessorials.insert(Accessorial::LiftgateDelivery);
    }

    let total_lbs = units::billable_lbs(shipment.total_weight_lbs, settings.min_weight_lbs());
    if (total_lbs as f64) > shipment.total_weight_lbs.round() {
        tracing::debug!(
            "Weight {} lb clamped up to the {} lb floor",
            shipment.total_weight_lbs,
            total_lbs
        );
    }

    Ok(ShipmentRequest::new(
        settings.origin_postal().to_string(),
        dest_postal,
        total_lbs,
        settings.freight_class(),
        settings.origin_type(),
        dest_type,
        accessorials,
        settings.currency().to_string(),
    ))
}

/// One raw option as the provider sent it, before amount coercion.
#[derive(Debug, Clone, PartialEq)]
pub struct RawOption {
    pub amount: Value,
    pub carrier: Option<String>,
    pub service: Option<String>,
    pub quote_id: Option<String>,
    pub eta_min: Option<u32>,
    pub eta_max: Option<u32>,
}

/// The response shapes the rate endpoint has been observed to return.
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderResponse {
    /// `{ok:false}` (or a legacy `{hasQuote:false}`).
    Declined,
    /// `{options:[...]}`
    Options(Vec<RawOption>),
    /// `{hasQuote:true, amount, carrier?, service?, quoteId?}`
    LegacySingle(RawOption),
    Malformed(String),
}

impl ProviderResponse {
    pub fn from_json(value: Value) -> Self {
        let Value::Object(obj) = value else {
            return ProviderResponse::Malformed("response is not a JSON object".to_string());
        };

        // 明確婉拒優先於其他欄位
        if obj.get("ok").and_then(Value::as_bool) == Some(false) {
            return ProviderResponse::Declined;
        }

        if let Some(options) = obj.get("options") {
            return match options {
                Value::Array(items) => {
                    ProviderResponse::Options(items.iter().filter_map(RawOption::from_json).collect())
                }
                _ => ProviderResponse::Malformed("options is not an array".to_string()),
            };
        }

        match obj.get("hasQuote").and_then(Value::as_bool) {
            Some(true) => ProviderResponse::LegacySingle(RawOption::from_object(&obj)),
            Some(false) => ProviderResponse::Declined,
            None => ProviderResponse::Malformed("unrecognized response shape".to_string()),
        }
    }

    pub fn from_body(body: &str) -> Self {
        match serde_json::from_str::<Value>(body) {
            Ok(value) => Self::from_json(value),
            Err(e) => ProviderResponse::Malformed(format!("invalid JSON: {}", e)),
        }
    }
}

impl RawOption {
    fn from_json(value: &Value) -> Option<Self> {
        value.as_object().map(Self::from_object)
    }

    fn from_object(obj: &Map<String, Value>) -> Self {
        let text = |key: &str| {
            obj.get(key).and_then(|v| match v {
                Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
        };
        let days = |key: &str| {
            obj.get(key)
                .and_then(Value::as_u64)
                .and_then(|d| u32::try_from(d).ok())
        };

        Self {
            // 缺少金額與無法解析的金額一樣，在 into_quote 時被丟棄
            amount: obj.get("amount").cloned().unwrap_or(Value::Null),
            carrier: text("carrier"),
            service: text("service"),
            quote_id: text("quoteId"),
            eta_min: days("etaMin"),
            eta_max: days("etaMax"),
        }
    }

    /// Coerces the amount to a finite, non-negative number of minor units.
    fn into_quote(self) -> Option<Quote> {
        let amount = match &self.amount {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
        .filter(|a| a.is_finite() && *a >= 0.0)?;

        Some(Quote {
            amount: amount.round() as u64,
            carrier: self.carrier.unwrap_or_else(|| DEFAULT_CARRIER.to_string()),
            service: self.service.unwrap_or_else(|| DEFAULT_SERVICE.to_string()),
            quote_id: self.quote_id,
            eta_min: self.eta_min,
            eta_max: self.eta_max,
        })
    }
}

/// Reduces any provider response to a uniform [`QuoteSet`].
///
/// `limit` keeps only the cheapest N options (compact surfaces); `None` keeps all.
pub fn normalize(response: ProviderResponse, limit: Option<usize>) -> QuoteSet {
    match response {
        ProviderResponse::Declined => {
            tracing::info!("🚫 Rate provider declined to quote");
            QuoteSet::failed(QuoteFailure::Declined)
        }
        ProviderResponse::Options(raw) => {
            let offered = raw.len();
            let quotes: Vec<Quote> = raw.into_iter().filter_map(RawOption::into_quote).collect();
            if quotes.len() < offered {
                tracing::warn!(
                    "Dropped {} option(s) with unusable amounts",
                    offered - quotes.len()
                );
            }

            let mut set = QuoteSet::options(quotes);
            if let Some(limit) = limit {
                set.truncate(limit);
            }
            set
        }
        ProviderResponse::LegacySingle(raw) => match raw.into_quote() {
            Some(quote) => QuoteSet::options(vec![quote]),
            None => QuoteSet::failed(QuoteFailure::NoRates),
        },
        ProviderResponse::Malformed(reason) => {
            tracing::warn!("⚠️ Malformed rate response: {}", reason);
            QuoteSet::failed(QuoteFailure::Transport(
                QuoteError::MalformedResponse { reason }.user_friendly_message(),
            ))
        }
    }
}

/// Converts a failed provider call into the inline failure the surface shows.
pub fn failure_from_error(error: &QuoteError) -> QuoteFailure {
    match error.category() {
        ErrorCategory::Timeout => QuoteFailure::Timeout,
        _ => QuoteFailure::Transport(error.user_friendly_message()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{FreightClass, LineItem, Product, ShippingSpecs};
    use serde_json::json;

    struct TestSettings {
        dest_type: LocationType,
        floor: u64,
    }

    impl QuoteSettings for TestSettings {
        fn origin_postal(&self) -> &str {
            "30301"
        }
        fn origin_type(&self) -> LocationType {
            LocationType::Business
        }
        fn dest_type(&self) -> LocationType {
            self.dest_type
        }
        fn freight_class(&self) -> FreightClass {
            FreightClass::C70
        }
        fn min_weight_lbs(&self) -> u64 {
            self.floor
        }
        fn currency(&self) -> &str {
            "USD"
        }
        fn timeout_seconds(&self) -> u64 {
            12
        }
        fn compact_option_limit(&self) -> usize {
            2
        }
    }

    fn residential() -> TestSettings {
        TestSettings {
            dest_type: LocationType::Residential,
            floor: 1,
        }
    }

    fn shipment(weight: f64) -> Shipment {
        Shipment {
            total_weight_lbs: weight,
            dimensions: None,
            breakdown: vec![],
            line_count: 1,
        }
    }

    fn amounts(set: &QuoteSet) -> Vec<u64> {
        set.quotes().iter().map(|q| q.amount).collect()
    }

    #[test]
    fn test_blank_destination_is_refused() {
        let err = build_request(&shipment(10.0), &QuoteOptions::new("   "), &residential())
            .unwrap_err();
        assert!(matches!(err, QuoteError::BlankDestination));
    }

    #[test]
    fn test_empty_shipment_is_refused() {
        let empty = Shipment::default();
        let err = build_request(&empty, &QuoteOptions::new("90210"), &residential()).unwrap_err();
        assert!(matches!(err, QuoteError::EmptyShipment));

        let weightless = shipment(0.0);
        let err =
            build_request(&weightless, &QuoteOptions::new("90210"), &residential()).unwrap_err();
        assert!(matches!(err, QuoteError::EmptyShipment));
    }

    #[test]
    fn test_overflowing_weight_is_refused() {
        let items = vec![LineItem::new(
            Product::new("huge", "Huge"),
            2,
            ShippingSpecs {
                weight_lbs: Some(1e308),
                ..ShippingSpecs::default()
            },
        )
        .unwrap()];
        let overflowed = crate::core::aggregate::aggregate(&items);
        assert!(overflowed.total_weight_lbs.is_infinite());

        let err = build_request(&overflowed, &QuoteOptions::new("90210"), &residential())
            .unwrap_err();
        assert!(matches!(err, QuoteError::EmptyShipment));
    }

    #[test]
    fn test_request_weights_and_accessorials() {
        let request = build_request(
            &shipment(12.0),
            &QuoteOptions::new(" 90210 ").with_liftgate(true),
            &residential(),
        )
        .unwrap();

        assert_eq!(request.dest_postal(), "90210");
        assert_eq!(request.total_lbs(), 12);
        assert_eq!(request.total_grams(), 5443);
        assert!(request.accessorials().contains(&Accessorial::Residential));
        assert!(request.accessorials().contains(&Accessorial::LiftgateDelivery));
    }

    #[test]
    fn test_business_destination_without_liftgate_has_no_accessorials() {
        let settings = TestSettings {
            dest_type: LocationType::Business,
            floor: 1,
        };
        let request = build_request(&shipment(40.0), &QuoteOptions::new("10001"), &settings)
            .unwrap();
        assert!(request.accessorials().is_empty());
    }

    #[test]
    fn test_light_shipment_clamped_to_floor() {
        let request =
            build_request(&shipment(0.3), &QuoteOptions::new("90210"), &residential()).unwrap();
        assert_eq!(request.total_lbs(), 1);
        assert_eq!(request.total_grams(), 454);
    }

    #[test]
    fn test_declined_shape() {
        let response = ProviderResponse::from_json(json!({"ok": false, "message": "lane closed"}));
        assert_eq!(response, ProviderResponse::Declined);

        let set = normalize(response, None);
        assert!(set.is_empty());
        assert_eq!(set.error(), Some(&QuoteFailure::Declined));
        assert!(set.error().unwrap().message().contains("You may continue"));
    }

    #[test]
    fn test_options_shape_sorted_ascending() {
        let response = ProviderResponse::from_json(json!({
            "ok": true,
            "options": [
                {"amount": 5200, "carrier": "Estes", "service": "Standard"},
                {"amount": 4100, "carrier": "Old Dominion", "service": "Guaranteed", "quoteId": "q-41"},
                {"amount": 6000, "carrier": "XPO"}
            ]
        }));

        let set = normalize(response, None);
        assert_eq!(amounts(&set), vec![4100, 5200, 6000]);
        assert_eq!(set.cheapest().unwrap().quote_id.as_deref(), Some("q-41"));
        assert_eq!(set.quotes()[2].service, DEFAULT_SERVICE);
    }

    #[test]
    fn test_options_coerce_and_drop_unusable_amounts() {
        let response = ProviderResponse::from_json(json!({
            "options": [
                {"amount": "4850"},
                {"amount": "abc"},
                {"amount": null},
                {"amount": -100},
                {"amount": 3999.6},
                {"carrier": "No Amount"}
            ]
        }));

        let set = normalize(response, None);
        assert_eq!(amounts(&set), vec![4000, 4850]);
    }

    #[test]
    fn test_compact_limit_keeps_cheapest_two() {
        let response = ProviderResponse::from_json(json!({
            "options": [{"amount": 300}, {"amount": 100}, {"amount": 200}]
        }));

        let set = normalize(response, Some(2));
        assert_eq!(amounts(&set), vec![100, 200]);
    }

    #[test]
    fn test_zero_survivors_is_no_rates() {
        let response = ProviderResponse::from_json(json!({"options": [{"amount": "n/a"}]}));
        let set = normalize(response, None);
        assert_eq!(set.error(), Some(&QuoteFailure::NoRates));
        assert_eq!(set.error().unwrap().message(), "No live rates for this lane.");

        let empty = normalize(ProviderResponse::from_json(json!({"options": []})), None);
        assert_eq!(empty.error(), Some(&QuoteFailure::NoRates));
    }

    #[test]
    fn test_legacy_single_quote_shape() {
        let response = ProviderResponse::from_json(json!({
            "hasQuote": true,
            "amount": 7525,
            "carrier": "Saia",
            "quoteId": 991
        }));

        let set = normalize(response, Some(2));
        assert_eq!(set.quotes().len(), 1);
        let quote = &set.quotes()[0];
        assert_eq!(quote.amount, 7525);
        assert_eq!(quote.carrier, "Saia");
        assert_eq!(quote.quote_id.as_deref(), Some("991"));
    }

    #[test]
    fn test_legacy_quote_without_usable_amount_is_no_rates() {
        for body in [
            json!({"hasQuote": true, "carrier": "Saia"}),
            json!({"hasQuote": true, "amount": "abc"}),
        ] {
            let response = ProviderResponse::from_json(body);
            assert!(matches!(response, ProviderResponse::LegacySingle(_)));

            let set = normalize(response, None);
            assert_eq!(set.error(), Some(&QuoteFailure::NoRates));
            assert!(!set.error().unwrap().is_retryable());
        }
    }

    #[test]
    fn test_unknown_shapes_are_malformed() {
        assert!(matches!(
            ProviderResponse::from_json(json!({"rates": []})),
            ProviderResponse::Malformed(_)
        ));
        assert!(matches!(
            ProviderResponse::from_json(json!([1, 2, 3])),
            ProviderResponse::Malformed(_)
        ));
        assert!(matches!(
            ProviderResponse::from_json(json!({"options": "none"})),
            ProviderResponse::Malformed(_)
        ));
        assert!(matches!(
            ProviderResponse::from_body("<html>502</html>"),
            ProviderResponse::Malformed(_)
        ));

        let set = normalize(ProviderResponse::Malformed("x".to_string()), None);
        assert!(set.error().unwrap().is_retryable());
    }

    #[test]
    fn test_failure_from_timeout_error() {
        assert_eq!(
            failure_from_error(&QuoteError::Timeout { seconds: 12 }),
            QuoteFailure::Timeout
        );
        assert!(matches!(
            failure_from_error(&QuoteError::HttpStatus { status: 503 }),
            QuoteFailure::Transport(_)
        ));
    }
}
