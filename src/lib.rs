//! This crate provides a query and comparison service for annual energy generation datasets.
//!
//! A dataset is an ordered series of yearly records, each mapping energy types (solar, wind,
//! coal, ...) to an optional numeric value. Datasets are listed in a catalog manifest and loaded
//! once at startup. The service can then:
//!
//! * filter a dataset by an inclusive year range and a selection of energy types;
//! * summarise a dataset into per energy type minimum, maximum, average and total;
//! * compare several datasets under one filter, querying each concurrently and reporting
//!   failures per dataset.
//!
//! The service is built on top of a number of open source components.
//!
//! * [Tokio](tokio), the most popular asynchronous Rust runtime.
//! * [Axum](axum) web framework, built by the Tokio team, on top of the [hyper] HTTP library.
//! * [Serde](serde) performs (de)serialisation of JSON datasets and response data.
//! * [reqwest] is used by the comparison client to query a remote server.

pub mod app;
pub mod app_state;
pub mod catalog;
pub mod cli;
pub mod comparison;
pub mod dataset_source_http;
pub mod error;
pub mod filter;
pub mod loader;
pub mod metrics;
pub mod models;
pub mod query;
pub mod server;
pub mod summary;
#[cfg(test)]
pub mod test_utils;
pub mod tracing;
pub mod types;
pub mod validated_query;
