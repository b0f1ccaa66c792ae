// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, anyhow};
use serde::Serialize;
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use tiny_http::{Header, Response, Server};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockResponse {
    pub status: u16,
    pub body: String,
    pub content_type: &'static str,
}

impl MockResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
            content_type: "text/plain; charset=utf-8",
        }
    }

    pub fn raw_json(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
            content_type: "application/json",
        }
    }

    pub fn json<T: Serialize + ?Sized>(value: &T) -> Self {
        match serde_json::to_string(value) {
            Ok(body) => Self::raw_json(200, body),
            Err(error) => Self::error(500, &error.to_string()),
        }
    }

    pub fn error(status: u16, message: &str) -> Self {
        Self::raw_json(status, json!({ "error": message }).to_string())
    }
}

/// Canned responses keyed by exact `path?query`, falling back to the path.
#[derive(Debug, Clone, Default)]
pub struct MockRoutes {
    routes: BTreeMap<String, MockResponse>,
}

impl MockRoutes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn json(self, route: &str, body: impl Into<String>) -> Self {
        self.respond(route, MockResponse::raw_json(200, body))
    }

    pub fn respond(mut self, route: &str, response: MockResponse) -> Self {
        self.routes.insert(route.to_owned(), response);
        self
    }

    pub fn lookup(&self, path_and_query: &str) -> MockResponse {
        let path = path_and_query
            .split_once('?')
            .map_or(path_and_query, |(path, _)| path);
        self.routes
            .get(path_and_query)
            .or_else(|| self.routes.get(path))
            .cloned()
            .unwrap_or_else(|| MockResponse::new(404, format!("Cannot GET {path}")))
    }
}

/// In-process HTTP server for tests and demo mode. Stops on drop.
pub struct MockApi {
    base_url: String,
    server: Arc<Server>,
    requests: Arc<Mutex<Vec<String>>>,
    handle: Option<JoinHandle<()>>,
}

impl MockApi {
    pub fn start(routes: MockRoutes) -> Result<Self> {
        Self::start_with(move |path_and_query| routes.lookup(path_and_query))
    }

    pub fn start_with<F>(handler: F) -> Result<Self>
    where
        F: Fn(&str) -> MockResponse + Send + 'static,
    {
        let server = Server::http("127.0.0.1:0")
            .map_err(|error| anyhow!("start mock server: {error}"))?;
        let base_url = format!("http://{}", server.server_addr());
        let server = Arc::new(server);
        let requests = Arc::new(Mutex::new(Vec::new()));

        let handle = {
            let server = Arc::clone(&server);
            let requests = Arc::clone(&requests);
            thread::spawn(move || {
                for request in server.incoming_requests() {
                    let url = request.url().to_owned();
                    requests
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .push(url.clone());

                    let reply = handler(&url);
                    let mut response =
                        Response::from_string(reply.body).with_status_code(reply.status);
                    if let Ok(header) = Header::from_bytes("Content-Type", reply.content_type) {
                        response = response.with_header(header);
                    }
                    let _ = request.respond(response);
                }
            })
        };

        Ok(Self {
            base_url,
            server,
            requests,
            handle: Some(handle),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Every `path?query` received so far, in arrival order.
    pub fn requests(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Drop for MockApi {
    fn drop(&mut self) {
        self.server.unblock();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
