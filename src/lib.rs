pub mod app;
pub mod catalog;
pub mod config;
pub mod dataset;
pub mod domain;
pub mod error;
pub mod fetch;
pub mod filter;
pub mod openkim;
pub mod options;
pub mod output;
pub mod query;
pub mod store;
