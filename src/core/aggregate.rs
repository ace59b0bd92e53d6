use crate::domain::model::{LineItem, Product, Shipment, ShippingSpecs};
use crate::utils::error::Result;

/// Combines line items into one shipment descriptor.
///
/// Unknown weights count as zero. The representative dimensions are taken from
/// the first item (in input order) that has any dimension at all; if no item
/// does, they stay unknown.
pub fn aggregate(items: &[LineItem]) -> Shipment {
    let mut total_weight_lbs = 0.0;
    let mut breakdown = Vec::with_capacity(items.len());

    for item in items {
        let specs = item.specs();
        total_weight_lbs += specs.weight_lbs.unwrap_or(0.0) * f64::from(item.quantity());
        breakdown.push(breakdown_line(item));
    }

    let dimensions = items
        .iter()
        .find_map(|item| item.specs().dimensions());

    let shipment = Shipment {
        total_weight_lbs,
        dimensions,
        breakdown,
        line_count: items.len(),
    };
    tracing::debug!("📦 Aggregated shipment: {}", shipment.summary());
    shipment
}

/// 單一商品購買：退化為一個 line item × 數量
pub fn single_product(product: Product, specs: ShippingSpecs, quantity: u32) -> Result<Shipment> {
    let item = LineItem::new(product, quantity, specs)?;
    Ok(aggregate(std::slice::from_ref(&item)))
}

fn breakdown_line(item: &LineItem) -> String {
    let name = &item.product().name;
    match item.specs().weight_lbs {
        Some(weight) => format!("{} – {} lb × {}", name, weight, item.quantity()),
        None => format!("{} – weight not found × {}", name, item.quantity()),
    }
}
