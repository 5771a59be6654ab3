//! metalcore-client: Fetches relationship subgraphs from the scoring API.
//!
//! All graph reads flow through [`GraphSource`]. The production implementation
//! is [`GraphFetchClient`], a thin wrapper over `GET /api/network/graph`; the
//! view engine only depends on the trait so it can run against fakes.

pub mod client;
pub mod queries;

pub use client::{FetchError, GraphFetchClient, GraphSource};
pub use queries::GraphQuery;
