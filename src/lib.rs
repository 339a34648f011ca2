pub mod api;
pub mod cache;
pub mod cli;
pub mod clock;
pub mod config;
pub mod dashboard;
pub mod fetch_stats;
pub mod fetcher;
pub mod filter;
pub mod models;
pub mod registry;
pub mod view;
