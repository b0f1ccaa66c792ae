// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use time::OffsetDateTime;
use tracing::{debug, warn};

use crate::{
    DEFAULT_NO_PRICE_INCREASE_LIMIT, FetchCompletion, FetchPayload, FetchRequest, PriceField,
    PriceRange, Product, ProductId, RequestId, RequestSequencer, Slice, SortOrder, Supplier,
    SupplyModal, find_product, sort_products,
};

pub const EMPTY_LIST_ALERT: &str = "The product list is empty";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFocus {
    List,
    Price(PriceField),
}

impl InputFocus {
    pub const fn next(self) -> Self {
        match self {
            Self::List => Self::Price(PriceField::Min),
            Self::Price(PriceField::Min) => Self::Price(PriceField::Max),
            Self::Price(PriceField::Max) => Self::List,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CatalogState {
    pub products: Vec<Product>,
    pub suppliers: Vec<Supplier>,
    pub price_range: PriceRange,
    pub sort_order: SortOrder,
    pub modal: SupplyModal,
    pub alert: Option<String>,
    pub focus: InputFocus,
    pub status_line: Option<String>,
    pub no_price_increase_limit: usize,
    pub products_updated_at: Option<OffsetDateTime>,
    requests: RequestSequencer,
}

impl Default for CatalogState {
    fn default() -> Self {
        Self {
            products: Vec::new(),
            suppliers: Vec::new(),
            price_range: PriceRange::default(),
            sort_order: SortOrder::Asc,
            modal: SupplyModal::default(),
            alert: None,
            focus: InputFocus::List,
            status_line: None,
            no_price_increase_limit: DEFAULT_NO_PRICE_INCREASE_LIMIT,
            products_updated_at: None,
            requests: RequestSequencer::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogCommand {
    Mount,
    Reload,
    ApplyPriceFilter,
    Sort(SortOrder),
    LoadNoPriceIncrease,
    ViewSupplies(ProductId),
    CloseModal,
    DismissAlert,
    FocusNext,
    FocusList,
    InputChar(char),
    InputBackspace,
    SetStatus(String),
    ClearStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogEvent {
    FetchRequested {
        id: RequestId,
        request: FetchRequest,
    },
    ProductsReplaced {
        count: usize,
    },
    SuppliersReplaced {
        count: usize,
    },
    ProductsSorted(SortOrder),
    ModalOpened,
    ModalClosed,
    AlertRaised(String),
    AlertDismissed,
    FocusChanged(InputFocus),
    PriceInputChanged {
        field: PriceField,
        value: String,
    },
    FetchFailed {
        id: RequestId,
        kind: &'static str,
    },
    StaleResponseDiscarded {
        id: RequestId,
        slice: Slice,
    },
    StatusUpdated(String),
    StatusCleared,
}

impl CatalogState {
    pub fn new(price_range: PriceRange, no_price_increase_limit: usize) -> Self {
        Self {
            price_range,
            no_price_increase_limit,
            ..Self::default()
        }
    }

    pub fn dispatch(&mut self, command: CatalogCommand) -> Vec<CatalogEvent> {
        // The alert is modal: nothing but dismissal gets through until then.
        if self.alert.is_some()
            && !matches!(
                command,
                CatalogCommand::DismissAlert
                    | CatalogCommand::SetStatus(_)
                    | CatalogCommand::ClearStatus
            )
        {
            return Vec::new();
        }

        match command {
            CatalogCommand::Mount => vec![
                self.issue(FetchRequest::Products),
                self.issue(FetchRequest::Suppliers),
            ],
            CatalogCommand::Reload => vec![self.issue(FetchRequest::Products)],
            CatalogCommand::ApplyPriceFilter => {
                let range = self.price_range.clone();
                vec![self.issue(FetchRequest::FilterByPrice(range))]
            }
            CatalogCommand::Sort(order) => self.sort(order),
            CatalogCommand::LoadNoPriceIncrease => vec![self.issue(FetchRequest::NoPriceIncrease)],
            CatalogCommand::ViewSupplies(product_id) => {
                debug!(%product_id, "view supplies");
                self.modal.subject = find_product(&self.products, product_id)
                    .map(|product| (product_id, product.name.clone()));
                vec![self.issue(FetchRequest::SupplyIncrease(product_id))]
            }
            CatalogCommand::CloseModal => {
                if !self.modal.is_visible() {
                    return Vec::new();
                }
                self.modal.close();
                vec![CatalogEvent::ModalClosed]
            }
            CatalogCommand::DismissAlert => match self.alert.take() {
                Some(_) => vec![CatalogEvent::AlertDismissed],
                None => Vec::new(),
            },
            CatalogCommand::FocusNext => {
                self.focus = self.focus.next();
                vec![CatalogEvent::FocusChanged(self.focus)]
            }
            CatalogCommand::FocusList => {
                if self.focus == InputFocus::List {
                    return Vec::new();
                }
                self.focus = InputFocus::List;
                vec![CatalogEvent::FocusChanged(self.focus)]
            }
            CatalogCommand::InputChar(ch) => self.edit_price(|value| value.push(ch)),
            CatalogCommand::InputBackspace => self.edit_price(|value| {
                value.pop();
            }),
            CatalogCommand::SetStatus(message) => vec![self.set_status(message)],
            CatalogCommand::ClearStatus => {
                self.status_line = None;
                vec![CatalogEvent::StatusCleared]
            }
        }
    }

    pub fn complete(&mut self, completion: FetchCompletion) -> Vec<CatalogEvent> {
        let FetchCompletion {
            id,
            request,
            result,
            received_at,
        } = completion;
        let slice = request.slice();

        if !self.requests.settle(slice, id) {
            debug!(request = request.label(), %id, "discarding stale response");
            return vec![CatalogEvent::StaleResponseDiscarded { id, slice }];
        }

        let payload = match result {
            Ok(payload) => payload,
            Err(error) => {
                warn!(request = request.label(), kind = error.kind(), %id, "{error}");
                return vec![CatalogEvent::FetchFailed {
                    id,
                    kind: error.kind(),
                }];
            }
        };
        debug!(request = request.label(), %id, rows = payload.len(), "response applied");

        match (request, payload) {
            (FetchRequest::NoPriceIncrease, FetchPayload::Products(mut products)) => {
                products.truncate(self.no_price_increase_limit);
                self.replace_products(products, received_at)
            }
            (
                FetchRequest::Products | FetchRequest::FilterByPrice(_),
                FetchPayload::Products(products),
            ) => self.replace_products(products, received_at),
            (FetchRequest::Suppliers, FetchPayload::Suppliers(suppliers)) => {
                let count = suppliers.len();
                self.suppliers = suppliers;
                vec![CatalogEvent::SuppliersReplaced { count }]
            }
            (FetchRequest::SupplyIncrease(_), FetchPayload::SupplyIncrease(records)) => {
                self.modal.open(records);
                vec![CatalogEvent::ModalOpened]
            }
            (request, _) => {
                warn!(
                    request = request.label(),
                    kind = "malformed",
                    %id,
                    "payload does not match request"
                );
                vec![CatalogEvent::FetchFailed {
                    id,
                    kind: "malformed",
                }]
            }
        }
    }

    pub fn is_loading(&self, slice: Slice) -> bool {
        self.requests.is_pending(slice)
    }

    fn issue(&mut self, request: FetchRequest) -> CatalogEvent {
        let id = self.requests.issue(request.slice());
        debug!(request = request.label(), %id, "fetch issued");
        CatalogEvent::FetchRequested { id, request }
    }

    fn sort(&mut self, order: SortOrder) -> Vec<CatalogEvent> {
        if self.products.is_empty() {
            self.alert = Some(EMPTY_LIST_ALERT.to_owned());
            return vec![CatalogEvent::AlertRaised(EMPTY_LIST_ALERT.to_owned())];
        }

        if let Some(id) = self.requests.supersede(Slice::Products) {
            debug!(%id, "sort supersedes outstanding product fetch");
        }
        self.products = sort_products(&self.products, order);
        self.sort_order = order;
        debug!(order = order.as_str(), rows = self.products.len(), "products sorted");
        vec![
            CatalogEvent::ProductsSorted(order),
            self.set_status(format!("sorted: {}", order.label())),
        ]
    }

    fn replace_products(
        &mut self,
        products: Vec<Product>,
        received_at: OffsetDateTime,
    ) -> Vec<CatalogEvent> {
        let count = products.len();
        self.products = products;
        self.products_updated_at = Some(received_at);
        vec![CatalogEvent::ProductsReplaced { count }]
    }

    fn edit_price(&mut self, edit: impl FnOnce(&mut String)) -> Vec<CatalogEvent> {
        let InputFocus::Price(field) = self.focus else {
            return Vec::new();
        };
        let value = self.price_range.get_mut(field);
        edit(value);
        vec![CatalogEvent::PriceInputChanged {
            field,
            value: value.clone(),
        }]
    }

    fn set_status(&mut self, message: impl Into<String>) -> CatalogEvent {
        let message = message.into();
        self.status_line = Some(message.clone());
        CatalogEvent::StatusUpdated(message)
    }
}
