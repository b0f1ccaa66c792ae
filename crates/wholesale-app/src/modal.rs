// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::{Product, ProductId, SupplyIncreaseRecord, find_product};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalVisibility {
    Closed,
    Open,
}

/// Supply-increase modal. Closing hides the payload without clearing it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupplyModal {
    pub visibility: ModalVisibility,
    pub payload: Option<Vec<SupplyIncreaseRecord>>,
    /// Product the request was issued for, captured at click time.
    pub subject: Option<(ProductId, String)>,
}

impl Default for SupplyModal {
    fn default() -> Self {
        Self {
            visibility: ModalVisibility::Closed,
            payload: None,
            subject: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SupplyQuantity {
    Units(i64),
    NoData,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SupplySummary {
    Increase {
        product_id: ProductId,
        product_name: String,
        quantity: SupplyQuantity,
    },
    NoRecords {
        product_name: Option<String>,
    },
}

impl SupplyModal {
    pub fn open(&mut self, records: Vec<SupplyIncreaseRecord>) {
        self.payload = Some(records);
        self.visibility = ModalVisibility::Open;
    }

    pub fn close(&mut self) {
        self.visibility = ModalVisibility::Closed;
    }

    pub fn is_visible(&self) -> bool {
        self.visibility == ModalVisibility::Open && self.payload.is_some()
    }

    pub fn headline(&self) -> Option<&SupplyIncreaseRecord> {
        self.payload.as_ref().and_then(|records| records.first())
    }

    /// Resolves the display name against the current list, then the name
    /// captured when the request was issued, then a placeholder.
    pub fn summary(&self, products: &[Product]) -> Option<SupplySummary> {
        self.payload.as_ref()?;

        let Some(record) = self.headline() else {
            return Some(SupplySummary::NoRecords {
                product_name: self.subject.as_ref().map(|(_, name)| name.clone()),
            });
        };

        let product_name = find_product(products, record.product_id)
            .map(|product| product.name.clone())
            .or_else(|| {
                self.subject
                    .as_ref()
                    .filter(|(id, _)| *id == record.product_id)
                    .map(|(_, name)| name.clone())
            })
            .unwrap_or_else(|| format!("unknown product #{}", record.product_id));

        let quantity = match record.total_quantity_2023 {
            Some(units) => SupplyQuantity::Units(units),
            None => SupplyQuantity::NoData,
        };

        Some(SupplySummary::Increase {
            product_id: record.product_id,
            product_name,
            quantity,
        })
    }
}
