use crate::domain::model::{CheckoutState, FreightLine, Quote, QuoteFailure, QuoteSet};
use crate::domain::ports::CheckoutGate;
use crate::utils::error::{QuoteError, Result};
use std::sync::Arc;

/// Tracks the presented quote set and the single selected option.
///
/// Checkout is enabled exactly when an option is selected; nothing else
/// participates. Provider declines and failures leave checkout disabled.
#[derive(Default)]
pub struct QuoteSelector {
    quote_set: Option<QuoteSet>,
    selected: Option<usize>,
    gate: Option<Arc<dyn CheckoutGate>>,
    gate_state: bool,
}

impl QuoteSelector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_gate(gate: Arc<dyn CheckoutGate>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::default()
        }
    }

    /// Shows a fresh quote set. Non-empty sets auto-select the cheapest option.
    pub fn present(&mut self, quote_set: QuoteSet) {
        self.selected = if quote_set.is_empty() { None } else { Some(0) };

        match (quote_set.cheapest(), quote_set.error()) {
            (Some(cheapest), _) => {
                tracing::info!(
                    "✅ {} freight option(s), auto-selected {}",
                    quote_set.quotes().len(),
                    cheapest
                )
            }
            (None, Some(failure)) => tracing::info!("Quote unavailable: {}", failure),
            (None, None) => {}
        }

        self.quote_set = Some(quote_set);
        self.sync_gate();
    }

    /// Radio semantics: picks one option, deselecting any other. Re-selecting
    /// the current option keeps it selected.
    pub fn select(&mut self, index: usize) -> Result<&Quote> {
        let available = self.options().len();
        if index >= available {
            return Err(QuoteError::InvalidSelection { index, available });
        }

        self.selected = Some(index);
        self.sync_gate();
        tracing::debug!("Selected freight option {}", index);
        Ok(&self.options()[index])
    }

    /// 新請求開始時立即清除，避免舊選擇跨越不同的出貨內容
    pub fn clear(&mut self) {
        self.quote_set = None;
        self.selected = None;
        self.sync_gate();
    }

    pub fn options(&self) -> &[Quote] {
        self.quote_set
            .as_ref()
            .map(QuoteSet::quotes)
            .unwrap_or(&[])
    }

    pub fn quote_set(&self) -> Option<&QuoteSet> {
        self.quote_set.as_ref()
    }

    pub fn failure(&self) -> Option<&QuoteFailure> {
        self.quote_set.as_ref().and_then(QuoteSet::error)
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.selected
    }

    pub fn selected(&self) -> Option<&Quote> {
        self.selected.and_then(|i| self.options().get(i))
    }

    pub fn checkout_enabled(&self) -> bool {
        self.selected().is_some()
    }

    pub fn freight_line(&self) -> Option<FreightLine> {
        self.selected().map(FreightLine::from)
    }

    pub fn checkout(&self) -> CheckoutState {
        let may_proceed = self.checkout_enabled();
        CheckoutState {
            may_proceed,
            line: self.freight_line(),
            notice: self.failure().map(|f| f.notice(may_proceed).to_string()),
        }
    }

    fn sync_gate(&mut self) {
        let enabled = self.checkout_enabled();
        if enabled != self.gate_state {
            self.gate_state = enabled;
            if let Some(gate) = &self.gate {
                gate.checkout_changed(enabled);
            }
        }
    }
}
