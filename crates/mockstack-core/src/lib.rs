//! Mock service dispatch engine for mockstack.
//!
//! This crate defines the pieces the session router drives:
//! - `MockStack`: one engine instance routing requests to named services
//! - `Service`: a mock service mounted under a single path segment
//! - `ServiceDescriptor`: a recipe for building fresh service instances
//! - `MockRequest` / `MockResponse`: the values exchanged with the engine

mod error;
mod message;
mod service;
pub mod services;
mod stack;

pub use error::EngineError;
pub use message::{
    MockRequest, MockResponse, STATUS_ROUTE_NOT_HANDLED, STATUS_SERVICE_FAILURE,
    STATUS_UNKNOWN_SERVICE,
};
pub use service::{Call, Holds, Service, ServiceDescriptor};
pub use stack::MockStack;
