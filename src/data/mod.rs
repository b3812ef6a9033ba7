//! Data layer: core types, loading, recoding, filtering and aggregation.
//!
//! Architecture:
//! ```text
//!  .csv / .json / .parquet
//!        │
//!        ▼
//!   ┌──────────────┐
//!   │ cache+loader │  parse file once per (path, mtime) → Table
//!   └──────────────┘
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  recode  │  short codes → display labels
//!   └──────────┘
//!        │
//!        ├──────────────────┐
//!        ▼                  ▼
//!   ┌──────────┐     ┌───────────┐
//!   │  filter  │     │ aggregate │  means, group-by, correlation, pivot
//!   └──────────┘     └───────────┘
//! ```

pub mod aggregate;
pub mod cache;
pub mod filter;
pub mod loader;
pub mod model;
pub mod recode;
