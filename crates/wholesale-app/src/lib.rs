// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub mod fetch;
pub mod ids;
pub mod modal;
pub mod model;
pub mod state;

pub use fetch::*;
pub use ids::*;
pub use modal::*;
pub use model::*;
pub use state::*;
