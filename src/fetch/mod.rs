use serde::Serialize;

use crate::error::Result;

mod client;
pub mod decode;
pub mod fallback;
pub mod request;

pub use client::VendorClient;
pub use decode::{parse_history, parse_quotes, PriceHistory, PricePoint, Quote};

pub type FetchResult<T> = Result<T>;

/// Outcome of a vendor call. Upstream failures are carried in-band as `Fallback`
/// with a synthetic payload of the same shape.
#[derive(Debug, Clone, PartialEq)]
pub enum VendorResult<T> {
    Live(T),
    Fallback(T),
}

impl<T> VendorResult<T> {
    pub fn is_fallback(&self) -> bool {
        matches!(self, VendorResult::Fallback(_))
    }

    pub fn data(&self) -> &T {
        match self {
            VendorResult::Live(data) | VendorResult::Fallback(data) => data,
        }
    }

    pub fn into_inner(self) -> T {
        match self {
            VendorResult::Live(data) | VendorResult::Fallback(data) => data,
        }
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> VendorResult<U> {
        match self {
            VendorResult::Live(data) => VendorResult::Live(f(data)),
            VendorResult::Fallback(data) => VendorResult::Fallback(f(data)),
        }
    }
}

/// Every payload shape the vendor client produces, as stored in the response cache.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MarketPayload {
    Indices(Vec<Quote>),
    History(PriceHistory),
}
