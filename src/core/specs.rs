use crate::domain::model::{DimensionRecord, Product, ShippingSpecs};
use crate::utils::error::Result;
use regex::Regex;

/// Derives per-unit shipping specs from a product.
///
/// Structured dimension records win. Otherwise the description is scanned for
/// `Height:`, `Width:`, `Depth:` and `Shipping:` (weight) labels, each optional
/// and matched case-insensitively. Parsed values are taken verbatim, including
/// zero and negative numbers.
pub struct SpecExtractor {
    height: Regex,
    width: Regex,
    depth: Regex,
    weight: Regex,
}

impl SpecExtractor {
    pub fn new() -> Result<Self> {
        Ok(Self {
            height: label_pattern("Height")?,
            width: label_pattern("Width")?,
            depth: label_pattern("Depth")?,
            weight: label_pattern("Shipping")?,
        })
    }

    pub fn extract(&self, product: &Product) -> ShippingSpecs {
        if let Some(record) = &product.dimensions {
            return from_record(record);
        }

        match product.description.as_deref() {
            Some(text) => self.from_description(text),
            None => {
                tracing::debug!("No dimensions or description for product {}", product.id);
                ShippingSpecs::default()
            }
        }
    }

    pub fn from_description(&self, text: &str) -> ShippingSpecs {
        ShippingSpecs {
            height_in: capture_number(&self.height, text),
            width_in: capture_number(&self.width, text),
            depth_in: capture_number(&self.depth, text),
            weight_lbs: capture_number(&self.weight, text),
        }
    }
}

fn label_pattern(label: &str) -> Result<Regex> {
    // 標籤後可有空白，數字可帶負號與小數
    let pattern = format!(r"(?i)\b{}:\s*(-?\d+(?:\.\d+)?|-?\.\d+)", regex::escape(label));
    Ok(Regex::new(&pattern)?)
}

fn capture_number(pattern: &Regex, text: &str) -> Option<f64> {
    pattern
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .filter(|value| value.is_finite())
}

/// length→depth, width→width, height→height, weight→weight
fn from_record(record: &DimensionRecord) -> ShippingSpecs {
    ShippingSpecs {
        height_in: record.height,
        width_in: record.width,
        depth_in: record.length,
        weight_lbs: record.weight,
    }
}
