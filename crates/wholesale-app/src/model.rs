// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::ids::*;

pub const DEFAULT_MIN_PRICE: &str = "0";
pub const DEFAULT_MAX_PRICE: &str = "1000";
pub const DEFAULT_NO_PRICE_INCREASE_LIMIT: usize = 2;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub product_id: ProductId,
    pub name: String,
    #[serde(deserialize_with = "deserialize_price")]
    pub price: f64,
}

/// Supplier row. `id` wins over `supplier_id`; when both are sent the latter
/// stays in `fields`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "SupplierRow")]
pub struct Supplier {
    pub id: SupplierId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(flatten)]
    pub fields: BTreeMap<String, Value>,
}

#[derive(Deserialize)]
struct SupplierRow {
    #[serde(default)]
    id: Option<SupplierId>,
    #[serde(default)]
    supplier_id: Option<SupplierId>,
    #[serde(default)]
    name: Option<String>,
    #[serde(flatten)]
    fields: BTreeMap<String, Value>,
}

impl TryFrom<SupplierRow> for Supplier {
    type Error = String;

    fn try_from(row: SupplierRow) -> Result<Self, Self::Error> {
        let SupplierRow {
            id,
            supplier_id,
            name,
            mut fields,
        } = row;
        let id = match (id, supplier_id) {
            (Some(id), Some(alias)) => {
                fields.insert("supplier_id".to_owned(), Value::from(alias.get()));
                id
            }
            (Some(id), None) | (None, Some(id)) => id,
            (None, None) => return Err("missing field `id`".to_owned()),
        };
        Ok(Self { id, name, fields })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplyIncreaseRecord {
    pub product_id: ProductId,
    /// Increase of supplied units in 2023 over the previous year. `None` when
    /// the server aggregated over no rows.
    #[serde(deserialize_with = "deserialize_quantity")]
    pub total_quantity_2023: Option<i64>,
    #[serde(flatten)]
    pub fields: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Asc => "cheapest first",
            Self::Desc => "most expensive first",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PriceField {
    Min,
    Max,
}

impl PriceField {
    pub const fn query_key(self) -> &'static str {
        match self {
            Self::Min => "minPrice",
            Self::Max => "maxPrice",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Min => "price from",
            Self::Max => "price to",
        }
    }
}

/// Raw filter inputs. Values are forwarded to the server untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceRange {
    pub min: String,
    pub max: String,
}

impl Default for PriceRange {
    fn default() -> Self {
        Self {
            min: DEFAULT_MIN_PRICE.to_owned(),
            max: DEFAULT_MAX_PRICE.to_owned(),
        }
    }
}

impl PriceRange {
    pub fn new(min: impl Into<String>, max: impl Into<String>) -> Self {
        Self {
            min: min.into(),
            max: max.into(),
        }
    }

    pub fn get(&self, field: PriceField) -> &str {
        match field {
            PriceField::Min => &self.min,
            PriceField::Max => &self.max,
        }
    }

    pub fn get_mut(&mut self, field: PriceField) -> &mut String {
        match field {
            PriceField::Min => &mut self.min,
            PriceField::Max => &mut self.max,
        }
    }
}

/// Stable sort by numeric price. Equal prices keep their relative order.
pub fn sort_products(products: &[Product], order: SortOrder) -> Vec<Product> {
    let mut sorted = products.to_vec();
    sorted.sort_by(|left, right| match order {
        SortOrder::Asc => left.price.total_cmp(&right.price),
        SortOrder::Desc => right.price.total_cmp(&left.price),
    });
    sorted
}

pub fn find_product(products: &[Product], product_id: ProductId) -> Option<&Product> {
    products
        .iter()
        .find(|product| product.product_id == product_id)
}

// PostgreSQL numeric and bigint aggregates arrive as JSON strings.
#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrText {
    Number(serde_json::Number),
    Text(String),
}

fn deserialize_price<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let price = match NumberOrText::deserialize(deserializer)? {
        NumberOrText::Number(number) => number
            .as_f64()
            .ok_or_else(|| de::Error::custom(format!("price {number} is out of range")))?,
        NumberOrText::Text(text) => text
            .trim()
            .parse::<f64>()
            .map_err(|_| de::Error::custom(format!("price {text:?} is not a number")))?,
    };
    if !price.is_finite() {
        return Err(de::Error::custom("price must be finite"));
    }
    Ok(price)
}

fn deserialize_quantity<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(raw) = Option::<NumberOrText>::deserialize(deserializer)? else {
        return Ok(None);
    };
    let quantity = match raw {
        NumberOrText::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().and_then(integral))
            .ok_or_else(|| de::Error::custom(format!("quantity {number} is not an integer")))?,
        NumberOrText::Text(text) => {
            let trimmed = text.trim();
            trimmed
                .parse::<i64>()
                .ok()
                .or_else(|| trimmed.parse::<f64>().ok().and_then(integral))
                .ok_or_else(|| de::Error::custom(format!("quantity {text:?} is not an integer")))?
        }
    };
    Ok(Some(quantity))
}

fn integral(value: f64) -> Option<i64> {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        Some(value as i64)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::{PriceRange, Product, SortOrder, Supplier, SupplyIncreaseRecord, sort_products};
    use crate::{ProductId, SupplierId};

    fn product(id: i64, name: &str, price: f64) -> Product {
        Product {
            product_id: ProductId::new(id),
            name: name.to_owned(),
            price,
        }
    }

    fn names(products: &[Product]) -> Vec<&str> {
        products.iter().map(|product| product.name.as_str()).collect()
    }

    #[test]
    fn sort_orders_by_numeric_price() {
        let products = vec![product(1, "A", 50.0), product(2, "B", 10.0)];

        assert_eq!(names(&sort_products(&products, SortOrder::Desc)), ["A", "B"]);
        assert_eq!(names(&sort_products(&products, SortOrder::Asc)), ["B", "A"]);
    }

    #[test]
    fn sort_keeps_original_order_for_equal_prices() {
        let products = vec![
            product(1, "first", 5.0),
            product(2, "cheap", 1.0),
            product(3, "second", 5.0),
            product(4, "third", 5.0),
        ];

        assert_eq!(
            names(&sort_products(&products, SortOrder::Asc)),
            ["cheap", "first", "second", "third"]
        );
        assert_eq!(
            names(&sort_products(&products, SortOrder::Desc)),
            ["first", "second", "third", "cheap"]
        );
    }

    #[test]
    fn sort_compares_numbers_not_text() {
        let products = vec![product(1, "nine", 9.0), product(2, "eighty", 80.0)];
        assert_eq!(
            names(&sort_products(&products, SortOrder::Asc)),
            ["nine", "eighty"]
        );
    }

    #[test]
    fn product_price_accepts_numbers_and_numeric_strings() {
        let products: Vec<Product> = serde_json::from_str(
            r#"[{"product_id":1,"name":"Bolt","price":12.5},{"product_id":2,"name":"Nut","price":"7.00"}]"#,
        )
        .expect("decode products");
        assert_eq!(products[0].price, 12.5);
        assert_eq!(products[1].price, 7.0);
    }

    #[test]
    fn product_price_rejects_non_numeric_text() {
        let error = serde_json::from_str::<Product>(r#"{"product_id":1,"name":"Bolt","price":"cheap"}"#)
            .expect_err("text price should fail");
        assert!(error.to_string().contains("not a number"));
    }

    #[test]
    fn product_requires_name() {
        let error = serde_json::from_str::<Product>(r#"{"product_id":1,"price":3}"#)
            .expect_err("missing name should fail");
        assert!(error.to_string().contains("name"));
    }

    #[test]
    fn supplier_keeps_unknown_fields() {
        let supplier: Supplier = serde_json::from_str(
            r#"{"supplier_id":4,"name":"Northwind","city":"Omsk","rating":5}"#,
        )
        .expect("decode supplier");
        assert_eq!(supplier.id, SupplierId::new(4));
        assert_eq!(supplier.name.as_deref(), Some("Northwind"));
        assert_eq!(supplier.fields.len(), 2);
        assert_eq!(supplier.fields["city"], "Omsk");
    }

    #[test]
    fn supplier_prefers_id_when_both_keys_are_sent() {
        let suppliers: Vec<Supplier> = serde_json::from_str(
            r#"[{"id":1,"supplier_id":9,"name":"Acme"},{"supplier_id":2}]"#,
        )
        .expect("decode suppliers");
        assert_eq!(suppliers[0].id, SupplierId::new(1));
        assert_eq!(suppliers[0].fields["supplier_id"], 9);
        assert_eq!(suppliers[1].id, SupplierId::new(2));
        assert!(suppliers[1].fields.is_empty());
    }

    #[test]
    fn supplier_without_any_id_is_rejected() {
        let error = serde_json::from_str::<Supplier>(r#"{"name":"Acme"}"#)
            .expect_err("missing id should fail");
        assert!(error.to_string().contains("id"));
    }

    #[test]
    fn supply_quantity_accepts_bigint_strings_and_null() {
        let records: Vec<SupplyIncreaseRecord> = serde_json::from_str(
            r#"[{"product_id":1,"total_quantity_2023":"30"},{"product_id":2,"total_quantity_2023":null,"total_quantity_2022":"4"}]"#,
        )
        .expect("decode supply records");
        assert_eq!(records[0].total_quantity_2023, Some(30));
        assert_eq!(records[1].total_quantity_2023, None);
        assert_eq!(records[1].fields["total_quantity_2022"], "4");
    }

    #[test]
    fn supply_quantity_is_required() {
        let error = serde_json::from_str::<SupplyIncreaseRecord>(r#"{"product_id":1}"#)
            .expect_err("missing quantity should fail");
        assert!(error.to_string().contains("total_quantity_2023"));
    }

    #[test]
    fn price_range_defaults_match_initial_inputs() {
        let range = PriceRange::default();
        assert_eq!(range.min, "0");
        assert_eq!(range.max, "1000");
    }
}
