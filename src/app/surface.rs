use crate::core::aggregate;
use crate::core::quote_client::{self, ProviderResponse, QuoteOptions};
use crate::core::selector::QuoteSelector;
use crate::domain::model::{
    CheckoutState, LineItem, Product, Quote, QuoteFailure, QuoteSet, Shipment, ShipmentRequest,
    ShippingSpecs,
};
use crate::domain::ports::{CheckoutGate, QuoteSettings, RateProvider};
use crate::utils::error::{QuoteError, Result};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceKind {
    /// Full-cart surface: shows every option.
    Cart,
    /// Single-product surface: shows only the cheapest few.
    Product,
}

#[derive(Debug, Clone)]
enum Contents {
    Cart(Vec<LineItem>),
    Product {
        product: Product,
        specs: ShippingSpecs,
        quantity: u32,
    },
}

/// A request that has started but whose response has not been applied yet.
#[derive(Debug, Clone)]
pub struct PendingQuote {
    generation: u64,
    request: ShipmentRequest,
}

impl PendingQuote {
    pub fn request(&self) -> &ShipmentRequest {
        &self.request
    }
}

/// Quote engine behind one front end (cart page or product page).
///
/// Any input change or new request clears the displayed options and the
/// selection before anything else happens. Responses belonging to an older
/// request are dropped.
pub struct QuoteSurface {
    kind: SurfaceKind,
    contents: Contents,
    settings: Arc<dyn QuoteSettings>,
    destination: String,
    liftgate: bool,
    selector: QuoteSelector,
    generation: u64,
    in_flight: Option<u64>,
    auto_fetched: bool,
    last_request: Option<ShipmentRequest>,
}

impl QuoteSurface {
    pub fn cart(items: Vec<LineItem>, settings: Arc<dyn QuoteSettings>) -> Self {
        Self::with_contents(SurfaceKind::Cart, Contents::Cart(items), settings)
    }

    /// Quantity defaults to the product's minimum order quantity.
    pub fn product(product: Product, specs: ShippingSpecs, settings: Arc<dyn QuoteSettings>) -> Self {
        let quantity = product.minimum_quantity();
        Self::with_contents(
            SurfaceKind::Product,
            Contents::Product {
                product,
                specs,
                quantity,
            },
            settings,
        )
    }

    fn with_contents(kind: SurfaceKind, contents: Contents, settings: Arc<dyn QuoteSettings>) -> Self {
        Self {
            kind,
            contents,
            settings,
            destination: String::new(),
            liftgate: false,
            selector: QuoteSelector::new(),
            generation: 0,
            in_flight: None,
            auto_fetched: false,
            last_request: None,
        }
    }

    pub fn with_gate(mut self, gate: Arc<dyn CheckoutGate>) -> Self {
        self.selector = QuoteSelector::with_gate(gate);
        self
    }

    pub fn kind(&self) -> SurfaceKind {
        self.kind
    }

    pub fn destination(&self) -> &str {
        &self.destination
    }

    pub fn set_destination(&mut self, dest_postal: impl Into<String>) {
        let dest_postal = dest_postal.into();
        if dest_postal != self.destination {
            self.destination = dest_postal;
            self.invalidate();
        }
    }

    pub fn set_liftgate(&mut self, liftgate: bool) {
        if liftgate != self.liftgate {
            self.liftgate = liftgate;
            self.invalidate();
        }
    }

    pub fn quantity(&self) -> Option<u32> {
        match &self.contents {
            Contents::Product { quantity, .. } => Some(*quantity),
            Contents::Cart(_) => None,
        }
    }

    /// Product surfaces only; refuses quantities under the minimum order quantity.
    pub fn set_quantity(&mut self, new_quantity: u32) -> Result<()> {
        let Contents::Product {
            product, quantity, ..
        } = &mut self.contents
        else {
            return Err(QuoteError::ValidationError {
                message: "Cart quantities are changed by replacing the cart items".to_string(),
            });
        };

        let minimum = product.minimum_quantity();
        if new_quantity < minimum {
            return Err(QuoteError::QuantityBelowMinimum {
                product: product.name.clone(),
                quantity: new_quantity,
                minimum,
            });
        }

        if *quantity != new_quantity {
            *quantity = new_quantity;
            self.invalidate();
        }
        Ok(())
    }

    pub fn replace_items(&mut self, items: Vec<LineItem>) -> Result<()> {
        match &mut self.contents {
            Contents::Cart(current) => {
                *current = items;
                self.invalidate();
                Ok(())
            }
            Contents::Product { .. } => Err(QuoteError::ValidationError {
                message: "Product surfaces hold a single product".to_string(),
            }),
        }
    }

    pub fn shipment(&self) -> Result<Shipment> {
        match &self.contents {
            Contents::Cart(items) => Ok(aggregate::aggregate(items)),
            Contents::Product {
                product,
                specs,
                quantity,
            } => aggregate::single_product(product.clone(), *specs, *quantity),
        }
    }

    /// Starts a request: validates locally, then clears results and selection
    /// before the provider is contacted.
    pub fn begin_quote(&mut self) -> Result<PendingQuote> {
        let shipment = self.shipment()?;
        let options = QuoteOptions::new(self.destination.clone()).with_liftgate(self.liftgate);
        let request = quote_client::build_request(&shipment, &options, self.settings.as_ref())?;

        self.selector.clear();
        self.generation += 1;
        self.in_flight = Some(self.generation);
        self.last_request = Some(request.clone());

        tracing::info!(
            "🚚 Requesting freight quote #{}: {} lb to {} ({})",
            self.generation,
            request.total_lbs(),
            request.dest_postal(),
            shipment.summary()
        );

        Ok(PendingQuote {
            generation: self.generation,
            request,
        })
    }

    /// Applies a provider outcome. Returns `false` when the outcome belongs to
    /// a request that has since been superseded and was dropped.
    pub fn complete_quote(
        &mut self,
        pending: PendingQuote,
        outcome: Result<ProviderResponse>,
    ) -> bool {
        if self.in_flight != Some(pending.generation) {
            tracing::warn!(
                "Discarding stale quote response #{} (current #{})",
                pending.generation,
                self.generation
            );
            return false;
        }
        self.in_flight = None;

        let quote_set = match outcome {
            Ok(response) => quote_client::normalize(response, self.option_limit()),
            Err(e) => {
                tracing::error!("❌ Freight quote failed: {} (Category: {:?})", e, e.category());
                QuoteSet::failed(quote_client::failure_from_error(&e))
            }
        };
        self.selector.present(quote_set);
        true
    }

    /// Begins a request, calls the provider under the configured timeout and
    /// applies the result. Only local validation problems are returned as
    /// errors; provider failures become an inline [`QuoteFailure`].
    pub async fn request_quote<P: RateProvider + ?Sized>(&mut self, provider: &P) -> Result<()> {
        let pending = self.begin_quote()?;
        let seconds = self.settings.timeout_seconds();

        // 計時器在收到任何回應時即被取消
        let outcome = match tokio::time::timeout(
            Duration::from_secs(seconds),
            provider.fetch(pending.request()),
        )
        .await
        {
            Ok(outcome) => outcome,
            Err(_) => {
                tracing::warn!("⏱️ Freight quote timed out after {}s", seconds);
                Err(QuoteError::Timeout { seconds })
            }
        };

        self.complete_quote(pending, outcome);
        Ok(())
    }

    /// One-shot fetch for a saved address. Fires at most once per surface,
    /// and only when a non-blank ZIP is available. Returns whether it fired.
    pub async fn auto_fetch<P: RateProvider + ?Sized>(
        &mut self,
        provider: &P,
        saved_zip: Option<&str>,
    ) -> Result<bool> {
        if self.auto_fetched {
            return Ok(false);
        }
        let Some(zip) = saved_zip.map(str::trim).filter(|z| !z.is_empty()) else {
            return Ok(false);
        };

        self.auto_fetched = true;
        tracing::debug!("Auto-fetching freight quote for saved ZIP {}", zip);
        self.set_destination(zip);
        self.request_quote(provider).await?;
        Ok(true)
    }

    pub fn select(&mut self, index: usize) -> Result<&Quote> {
        self.selector.select(index)
    }

    pub fn options(&self) -> &[Quote] {
        self.selector.options()
    }

    pub fn failure(&self) -> Option<&QuoteFailure> {
        self.selector.failure()
    }

    pub fn selected(&self) -> Option<&Quote> {
        self.selector.selected()
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.selector.selected_index()
    }

    pub fn checkout(&self) -> CheckoutState {
        self.selector.checkout()
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn retry_enabled(&self) -> bool {
        !self.is_loading()
    }

    pub fn last_request(&self) -> Option<&ShipmentRequest> {
        self.last_request.as_ref()
    }

    fn option_limit(&self) -> Option<usize> {
        match self.kind {
            SurfaceKind::Cart => None,
            SurfaceKind::Product => Some(self.settings.compact_option_limit()),
        }
    }

    /// 輸入改變：清除結果並讓進行中的請求失效
    fn invalidate(&mut self) {
        self.selector.clear();
        if self.in_flight.take().is_some() {
            tracing::debug!("Inputs changed; in-flight quote #{} will be ignored", self.generation);
        }
    }
}
