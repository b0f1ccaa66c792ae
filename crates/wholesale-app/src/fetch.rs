// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use thiserror::Error;
use time::OffsetDateTime;

use crate::{PriceRange, Product, ProductId, RequestId, Supplier, SupplyIncreaseRecord};

/// Part of the state replaced as a unit by a completed fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Slice {
    Products,
    Suppliers,
    SupplyModal,
}

impl Slice {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Products => "products",
            Self::Suppliers => "suppliers",
            Self::SupplyModal => "supplies",
        }
    }

    pub(crate) const fn index(self) -> usize {
        match self {
            Self::Products => 0,
            Self::Suppliers => 1,
            Self::SupplyModal => 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchRequest {
    Products,
    Suppliers,
    FilterByPrice(PriceRange),
    NoPriceIncrease,
    SupplyIncrease(ProductId),
}

impl FetchRequest {
    pub const fn slice(&self) -> Slice {
        match self {
            Self::Products | Self::FilterByPrice(_) | Self::NoPriceIncrease => Slice::Products,
            Self::Suppliers => Slice::Suppliers,
            Self::SupplyIncrease(_) => Slice::SupplyModal,
        }
    }

    pub const fn label(&self) -> &'static str {
        match self {
            Self::Products => "load products",
            Self::Suppliers => "load suppliers",
            Self::FilterByPrice(_) => "filter products by price",
            Self::NoPriceIncrease => "load products without price increase",
            Self::SupplyIncrease(_) => "load supply increase",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FetchPayload {
    Products(Vec<Product>),
    Suppliers(Vec<Supplier>),
    SupplyIncrease(Vec<SupplyIncreaseRecord>),
}

impl FetchPayload {
    pub fn len(&self) -> usize {
        match self {
            Self::Products(rows) => rows.len(),
            Self::Suppliers(rows) => rows.len(),
            Self::SupplyIncrease(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("cannot reach {url}: {message}")]
    Transport { url: String, message: String },
    #[error("server error ({status}) from {url}: {message}")]
    Status {
        url: String,
        status: u16,
        message: String,
    },
    #[error("malformed response from {url}: {message}")]
    Malformed { url: String, message: String },
    #[error("invalid request url {url:?}: {message}")]
    InvalidUrl { url: String, message: String },
}

impl FetchError {
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Transport { .. } => "transport",
            Self::Status { .. } => "status",
            Self::Malformed { .. } => "malformed",
            Self::InvalidUrl { .. } => "invalid_url",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FetchCompletion {
    pub id: RequestId,
    pub request: FetchRequest,
    pub result: Result<FetchPayload, FetchError>,
    pub received_at: OffsetDateTime,
}

impl FetchCompletion {
    pub fn new(
        id: RequestId,
        request: FetchRequest,
        result: Result<FetchPayload, FetchError>,
    ) -> Self {
        Self {
            id,
            request,
            result,
            received_at: OffsetDateTime::now_utc(),
        }
    }
}

/// Hands out request ids and remembers the newest outstanding one per slice.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestSequencer {
    last_issued: u64,
    outstanding: [Option<RequestId>; 3],
}

impl RequestSequencer {
    pub fn issue(&mut self, slice: Slice) -> RequestId {
        self.last_issued = self.last_issued.saturating_add(1);
        let id = RequestId::new(self.last_issued);
        self.outstanding[slice.index()] = Some(id);
        id
    }

    pub fn is_current(&self, slice: Slice, id: RequestId) -> bool {
        self.outstanding[slice.index()] == Some(id)
    }

    /// Accepts `id` if it is the newest outstanding request for `slice`.
    pub fn settle(&mut self, slice: Slice, id: RequestId) -> bool {
        if !self.is_current(slice, id) {
            return false;
        }
        self.outstanding[slice.index()] = None;
        true
    }

    pub fn supersede(&mut self, slice: Slice) -> Option<RequestId> {
        self.outstanding[slice.index()].take()
    }

    pub fn is_pending(&self, slice: Slice) -> bool {
        self.outstanding[slice.index()].is_some()
    }
}
