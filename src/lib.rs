pub mod cache;
pub mod config;
pub mod error;
pub mod model;
pub mod mutation;
pub mod panel;
pub mod poller;
pub mod query;
pub mod store;
