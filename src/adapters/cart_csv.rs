use crate::core::specs::SpecExtractor;
use crate::domain::model::{DimensionRecord, LineItem, Product};
use crate::utils::error::Result;
use serde::Deserialize;
use std::io::Read;
use std::path::Path;

/// One cart row. Empty cells mean unknown.
#[derive(Debug, Deserialize)]
struct CartRow {
    name: String,
    quantity: u32,
    weight_lbs: Option<f64>,
    height_in: Option<f64>,
    width_in: Option<f64>,
    depth_in: Option<f64>,
    description: Option<String>,
    min_order_quantity: Option<u32>,
}

impl CartRow {
    fn into_product(self, row_number: usize) -> (Product, u32) {
        let has_structured = self.weight_lbs.is_some()
            || self.height_in.is_some()
            || self.width_in.is_some()
            || self.depth_in.is_some();

        let mut product = Product::new(format!("row-{}", row_number), self.name);
        if has_structured {
            product = product.with_dimensions(DimensionRecord {
                length: self.depth_in,
                width: self.width_in,
                height: self.height_in,
                weight: self.weight_lbs,
            });
        }
        if let Some(description) = self.description.filter(|d| !d.trim().is_empty()) {
            product = product.with_description(description);
        }
        if let Some(moq) = self.min_order_quantity {
            product = product.with_min_order_quantity(moq);
        }
        (product, self.quantity)
    }
}

pub fn load_cart<P: AsRef<Path>>(path: P, extractor: &SpecExtractor) -> Result<Vec<LineItem>> {
    let file = std::fs::File::open(path)?;
    read_cart(file, extractor)
}

/// Header: `name,quantity,weight_lbs,height_in,width_in,depth_in,description,min_order_quantity`
pub fn read_cart<R: Read>(reader: R, extractor: &SpecExtractor) -> Result<Vec<LineItem>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut items = Vec::new();
    for (index, row) in csv_reader.deserialize::<CartRow>().enumerate() {
        let (product, quantity) = row?.into_product(index + 1);
        let specs = extractor.extract(&product);
        items.push(LineItem::new(product, quantity, specs)?);
    }

    tracing::info!("🛒 Loaded {} cart line item(s)", items.len());
    Ok(items)
}
