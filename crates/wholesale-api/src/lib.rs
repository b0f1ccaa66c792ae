// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, bail};
use reqwest::StatusCode;
use reqwest::blocking::Client as HttpClient;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::error::Error as _;
use std::time::Duration;
use tracing::debug;
use url::Url;
use wholesale_app::{
    FetchError, FetchPayload, FetchRequest, PriceField, PriceRange, Product, ProductId, Supplier,
    SupplyIncreaseRecord,
};

pub const PRODUCTS_PATH: &str = "/api/products";
pub const SUPPLIERS_PATH: &str = "/api/suppliers";
pub const FILTER_PATH: &str = "/api/products/filter";
pub const NO_PRICE_INCREASE_PATH: &str = "/api/products/no-price-increase";
pub const SUPPLY_INCREASE_PATH: &str = "/api/supplies/increase";

pub const fn endpoint_path(request: &FetchRequest) -> &'static str {
    match request {
        FetchRequest::Products => PRODUCTS_PATH,
        FetchRequest::Suppliers => SUPPLIERS_PATH,
        FetchRequest::FilterByPrice(_) => FILTER_PATH,
        FetchRequest::NoPriceIncrease => NO_PRICE_INCREASE_PATH,
        FetchRequest::SupplyIncrease(_) => SUPPLY_INCREASE_PATH,
    }
}

fn query_pairs(request: &FetchRequest) -> Vec<(&'static str, String)> {
    match request {
        FetchRequest::FilterByPrice(range) => vec![
            (PriceField::Min.query_key(), range.min.clone()),
            (PriceField::Max.query_key(), range.max.clone()),
        ],
        FetchRequest::SupplyIncrease(product_id) => vec![("productId", product_id.to_string())],
        FetchRequest::Products | FetchRequest::Suppliers | FetchRequest::NoPriceIncrease => {
            Vec::new()
        }
    }
}

/// Blocking client for the wholesale catalog API. Every call is a single
/// attempt; callers decide what to do with failures.
#[derive(Debug, Clone)]
pub struct Client {
    base_url: String,
    timeout: Duration,
    http: HttpClient,
}

impl Client {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = base_url.trim().trim_end_matches('/').to_owned();
        if base_url.is_empty() {
            bail!("api.base_url must not be empty");
        }
        let parsed =
            Url::parse(&base_url).with_context(|| format!("parse api.base_url {base_url:?}"))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            bail!(
                "api.base_url {base_url:?} must use http or https, got {}",
                parsed.scheme()
            );
        }

        let http = HttpClient::builder()
            .timeout(timeout)
            .build()
            .context("build HTTP client")?;

        Ok(Self {
            base_url,
            timeout,
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn endpoint_url(&self, request: &FetchRequest) -> Result<Url, FetchError> {
        let raw = format!("{}{}", self.base_url, endpoint_path(request));
        let mut url = Url::parse(&raw).map_err(|error| FetchError::InvalidUrl {
            url: raw.clone(),
            message: error.to_string(),
        })?;
        let pairs = query_pairs(request);
        if !pairs.is_empty() {
            url.query_pairs_mut().extend_pairs(pairs);
        }
        Ok(url)
    }

    pub fn execute(&self, request: &FetchRequest) -> Result<FetchPayload, FetchError> {
        let payload = match request {
            FetchRequest::Products => FetchPayload::Products(self.list_products()?),
            FetchRequest::Suppliers => FetchPayload::Suppliers(self.list_suppliers()?),
            FetchRequest::FilterByPrice(range) => {
                FetchPayload::Products(self.filter_products(range)?)
            }
            FetchRequest::NoPriceIncrease => {
                FetchPayload::Products(self.products_without_price_increase()?)
            }
            FetchRequest::SupplyIncrease(product_id) => {
                FetchPayload::SupplyIncrease(self.supply_increase(*product_id)?)
            }
        };
        Ok(payload)
    }

    pub fn list_products(&self) -> Result<Vec<Product>, FetchError> {
        self.get_json(self.endpoint_url(&FetchRequest::Products)?)
    }

    pub fn list_suppliers(&self) -> Result<Vec<Supplier>, FetchError> {
        self.get_json(self.endpoint_url(&FetchRequest::Suppliers)?)
    }

    pub fn filter_products(&self, range: &PriceRange) -> Result<Vec<Product>, FetchError> {
        self.get_json(self.endpoint_url(&FetchRequest::FilterByPrice(range.clone()))?)
    }

    /// Full server response; the view applies its own cap.
    pub fn products_without_price_increase(&self) -> Result<Vec<Product>, FetchError> {
        self.get_json(self.endpoint_url(&FetchRequest::NoPriceIncrease)?)
    }

    pub fn supply_increase(
        &self,
        product_id: ProductId,
    ) -> Result<Vec<SupplyIncreaseRecord>, FetchError> {
        self.get_json(self.endpoint_url(&FetchRequest::SupplyIncrease(product_id))?)
    }

    fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, FetchError> {
        debug!(%url, "GET");
        let response = self
            .http
            .get(url.clone())
            .send()
            .map_err(|error| transport_error(&url, &error))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(clean_error_response(&url, status, &body));
        }

        let body = response
            .text()
            .map_err(|error| transport_error(&url, &error))?;
        serde_json::from_str(&body).map_err(|error| FetchError::Malformed {
            url: url.to_string(),
            message: error.to_string(),
        })
    }
}

fn transport_error(url: &Url, error: &reqwest::Error) -> FetchError {
    let mut message = if error.is_timeout() {
        "request timed out".to_owned()
    } else {
        error.to_string()
    };
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    FetchError::Transport {
        url: url.to_string(),
        message,
    }
}

fn clean_error_response(url: &Url, status: StatusCode, body: &str) -> FetchError {
    let message = if let Ok(parsed) = serde_json::from_str::<ErrorEnvelope>(body)
        && let Some(text) = parsed.error.or(parsed.message)
        && !text.is_empty()
    {
        text
    } else if !body.is_empty() && body.len() < 100 && !body.contains('{') {
        body.trim().to_owned()
    } else {
        format!("server returned {}", status.as_u16())
    };

    FetchError::Status {
        url: url.to_string(),
        status: status.as_u16(),
        message,
    }
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: Option<String>,
    message: Option<String>,
}
