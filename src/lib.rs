//! NASA APOD web backend: proxies the picture-of-the-day API, keeps
//! favorites and last-seen pictures in MongoDB, notifies a Kafka topic when
//! a favorite is added, and exposes Prometheus metrics for scraping.

pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod server;
pub mod views;

// Layered boundaries: use cases and ports, with infrastructure adapters
pub mod app;
pub mod infra;
