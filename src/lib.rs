//! internscout - internship listing ingestion pipeline.
//!
//! Scrapes the careers pages of registered companies, normalizes and
//! deduplicates the internship postings found there, and serves them over
//! an HTTP API alongside an admin surface for running the scraper.

pub mod cli;
pub mod config;
pub mod ingest;
pub mod models;
pub mod repository;
pub mod schema;
pub mod scheduler;
pub mod scrapers;
pub mod server;
