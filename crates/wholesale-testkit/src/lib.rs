// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod mock;

pub use mock::{MockApi, MockResponse, MockRoutes};

use serde_json::{Value, json};
use std::collections::BTreeMap;
use url::Url;
use wholesale_app::{Product, ProductId, Supplier, SupplierId, SupplyIncreaseRecord};

const GOODS: [&str; 16] = [
    "Sugar",
    "Buckwheat",
    "Rice",
    "Sunflower oil",
    "Flour",
    "Salt",
    "Black tea",
    "Ground coffee",
    "Pasta",
    "Canned peas",
    "Condensed milk",
    "Oat flakes",
    "Honey",
    "Semolina",
    "Lentils",
    "Millet",
];
const PACKAGING: [&str; 6] = ["1 kg", "5 kg", "25 kg sack", "50 kg sack", "12 pack", "pallet"];

const SUPPLIER_PREFIXES: [&str; 10] = [
    "Volga",
    "Ural",
    "Siberian",
    "Northern",
    "Baltic",
    "Altai",
    "Kuban",
    "Don",
    "Oka",
    "Kama",
];
const SUPPLIER_SUFFIXES: [&str; 5] = ["Trade", "Foods", "Agro", "Supply", "Logistics"];
const CITIES: [&str; 10] = [
    "Kazan",
    "Samara",
    "Perm",
    "Omsk",
    "Tver",
    "Tula",
    "Kaluga",
    "Saratov",
    "Ufa",
    "Vologda",
];

#[derive(Debug, Clone)]
struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    fn new(seed: u64) -> Self {
        let mut state = seed ^ 0x9E37_79B9_7F4A_7C15;
        if state == 0 {
            state = 0xA409_3822_299F_31D0;
        }
        Self { state }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);

        let mut x = self.state;
        x ^= x >> 13;
        x ^= x << 7;
        x ^= x >> 17;
        x
    }

    fn int_n(&mut self, n: usize) -> usize {
        if n <= 1 {
            return 0;
        }
        (self.next_u64() % (n as u64)) as usize
    }

    fn bool(&mut self) -> bool {
        (self.next_u64() & 1) == 1
    }
}

/// Product plus the history the server would aggregate over.
#[derive(Debug, Clone, PartialEq)]
pub struct DemoProduct {
    pub product: Product,
    pub price_increased: bool,
    pub quantity_2022: i64,
    pub quantity_2023: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DemoCatalog {
    pub products: Vec<DemoProduct>,
    pub suppliers: Vec<Supplier>,
}

#[derive(Debug, Clone)]
pub struct CatalogFaker {
    rng: DeterministicRng,
}

impl CatalogFaker {
    pub fn new(seed: u64) -> Self {
        let normalized = if seed == 0 { 1 } else { seed };
        Self {
            rng: DeterministicRng::new(normalized),
        }
    }

    pub fn product(&mut self, id: i64) -> DemoProduct {
        let good = self.pick(&GOODS);
        let packaging = self.pick(&PACKAGING);
        // Whole roubles most of the time, kopecks now and then.
        let mut price = self.int_range_i64(15, 4_800) as f64;
        if self.rng.bool() {
            price += self.int_range_i64(0, 99) as f64 / 100.0;
        }
        let quantity_2022 = self.int_range_i64(0, 900);

        DemoProduct {
            product: Product {
                product_id: ProductId::new(id),
                name: format!("{good}, {packaging}"),
                price,
            },
            price_increased: self.rng.int_n(3) > 0,
            quantity_2022,
            quantity_2023: quantity_2022 + self.int_range_i64(-120, 400),
        }
    }

    pub fn supplier(&mut self, id: i64) -> Supplier {
        let prefix = self.pick(&SUPPLIER_PREFIXES);
        let suffix = self.pick(&SUPPLIER_SUFFIXES);
        let city = self.pick(&CITIES);
        let mut fields = BTreeMap::new();
        fields.insert("city".to_owned(), Value::from(city));
        fields.insert(
            "phone".to_owned(),
            Value::from(format!(
                "+7 ({:03}) {:03}-{:02}-{:02}",
                self.int_range_i64(800, 999),
                self.int_range_i64(100, 999),
                self.int_range_i64(0, 99),
                self.int_range_i64(0, 99),
            )),
        );
        Supplier {
            id: SupplierId::new(id),
            name: Some(format!("{prefix} {suffix}")),
            fields,
        }
    }

    pub fn catalog(&mut self, products: usize, suppliers: usize) -> DemoCatalog {
        DemoCatalog {
            products: (1..=products as i64).map(|id| self.product(id)).collect(),
            suppliers: (1..=suppliers as i64).map(|id| self.supplier(id)).collect(),
        }
    }

    fn pick<'a>(&mut self, items: &'a [&'a str]) -> &'a str {
        items[self.rng.int_n(items.len())]
    }

    fn int_range_i64(&mut self, min: i64, max: i64) -> i64 {
        if max <= min {
            return min;
        }
        let span = max - min + 1;
        min + (self.rng.next_u64() % (span as u64)) as i64
    }
}

impl DemoCatalog {
    pub fn products(&self) -> Vec<Product> {
        self.products.iter().map(|row| row.product.clone()).collect()
    }

    pub fn filter(&self, min: f64, max: f64) -> Vec<Product> {
        self.products
            .iter()
            .filter(|row| row.product.price >= min && row.product.price <= max)
            .map(|row| row.product.clone())
            .collect()
    }

    pub fn without_price_increase(&self) -> Vec<Product> {
        self.products
            .iter()
            .filter(|row| !row.price_increased)
            .map(|row| row.product.clone())
            .collect()
    }

    pub fn supply_increase(&self, product_id: ProductId) -> Vec<SupplyIncreaseRecord> {
        self.products
            .iter()
            .filter(|row| row.product.product_id == product_id)
            .map(|row| {
                let mut fields = BTreeMap::new();
                fields.insert("total_quantity_2022".to_owned(), Value::from(row.quantity_2022));
                SupplyIncreaseRecord {
                    product_id,
                    total_quantity_2023: Some(row.quantity_2023 - row.quantity_2022),
                    fields,
                }
            })
            .collect()
    }

    /// Serves the catalog the way the real API would for `path_and_query`.
    pub fn respond(&self, path_and_query: &str) -> MockResponse {
        let Ok(url) = Url::parse(&format!("http://demo.invalid{path_and_query}")) else {
            return MockResponse::error(400, "malformed request url");
        };
        let query = |key: &str| {
            url.query_pairs()
                .find(|(name, _)| name == key)
                .map(|(_, value)| value.into_owned())
        };

        match url.path() {
            "/api/products" => MockResponse::json(&self.products()),
            "/api/suppliers" => MockResponse::json(&self.suppliers),
            "/api/products/filter" => {
                let bounds = query("minPrice")
                    .and_then(|min| min.trim().parse::<f64>().ok())
                    .zip(query("maxPrice").and_then(|max| max.trim().parse::<f64>().ok()));
                match bounds {
                    Some((min, max)) => MockResponse::json(&self.filter(min, max)),
                    None => MockResponse::error(400, "minPrice and maxPrice must be numbers"),
                }
            }
            "/api/products/no-price-increase" => MockResponse::json(&self.without_price_increase()),
            "/api/supplies/increase" => {
                match query("productId").and_then(|id| id.trim().parse::<i64>().ok()) {
                    Some(id) => MockResponse::json(&self.supply_increase(ProductId::new(id))),
                    None => MockResponse::error(400, "productId must be an integer"),
                }
            }
            other => MockResponse::new(404, format!("Cannot GET {other}")),
        }
    }
}

pub fn products_json(products: &[(i64, &str, f64)]) -> String {
    Value::Array(
        products
            .iter()
            .map(|(id, name, price)| json!({ "product_id": id, "name": name, "price": price }))
            .collect(),
    )
    .to_string()
}
