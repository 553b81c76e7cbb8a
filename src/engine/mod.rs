// SPDX-License-Identifier: Apache-2.0

// Driver layer
// Synchronous connectivity abstraction over heterogeneous backends

pub mod connection_url;
pub mod drivers;
pub mod error;
pub mod registry;
pub mod traits;
pub mod types;

pub use error::{EngineError, EngineResult};
pub use registry::{init_backend, DriverRegistry};
pub use traits::{Connection, Connector, Cursor, Statement};
pub use types::*;
