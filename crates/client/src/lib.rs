//! Reference service abstraction and implementations for GSP.
//!
//! This crate provides a trait-based client interface to the backend that
//! owns referencias, with an in-memory mock and an HTTP implementation.

#![warn(missing_docs)]

pub mod trait_;
pub mod mock;
#[cfg(feature = "http")]
pub mod http;

pub use trait_::{ReferenceServiceClient, ClientError, Result};
pub use mock::{MockReferenceService, MockConfig};
#[cfg(feature = "http")]
pub use http::{HttpReferenceService, DEFAULT_BASE_URL};
