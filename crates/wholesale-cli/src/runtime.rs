// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use std::sync::mpsc::Sender;
use std::thread;
use tracing::debug;
use wholesale_api::Client;
use wholesale_app::{FetchCompletion, FetchError, FetchPayload, FetchRequest, RequestId};
use wholesale_tui::{CatalogRuntime, InternalEvent};

/// Runs every fetch on its own short-lived worker thread.
pub struct ApiRuntime {
    client: Client,
}

impl ApiRuntime {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

impl CatalogRuntime for ApiRuntime {
    fn fetch(&mut self, request: &FetchRequest) -> Result<FetchPayload, FetchError> {
        self.client.execute(request)
    }

    fn spawn_fetch(
        &mut self,
        id: RequestId,
        request: FetchRequest,
        tx: Sender<InternalEvent>,
    ) -> Result<()> {
        let client = self.client.clone();
        thread::Builder::new()
            .name(format!("fetch-{}", id.get()))
            .spawn(move || {
                let result = client.execute(&request);
                // The UI may have quit while the request was in flight.
                if tx
                    .send(InternalEvent::Fetch(FetchCompletion::new(id, request, result)))
                    .is_err()
                {
                    debug!(%id, "completion dropped; ui gone");
                }
            })
            .with_context(|| format!("spawn worker for request {id}"))?;
        Ok(())
    }
}
