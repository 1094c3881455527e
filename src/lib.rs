//! Luxe-migrate: one-off catalog migration utilities
//!
//! This crate moves the Luxe e-commerce catalog between three
//! representations, one batch pass per invocation:
//!
//! 1. **Extract** -- Parse a PostgreSQL logical dump (`COPY ... FROM
//!    stdin` blocks) into a denormalized JSON catalog: products joined
//!    with their categories, variants, prices, and images
//! 2. **Restore** -- Regenerate an idempotent SQL upsert script from the
//!    JSON catalog, for replay against the original live schema
//! 3. **Import** -- Load the JSON catalog directly into a live
//!    PostgreSQL database with a redesigned schema, one transaction per
//!    product
//!
//! # Architecture
//!
//! The forward pipeline is a strict one-way flow: dump text -> table
//! blocks -> decoded rows -> lookup joins -> assembled catalog ->
//! serialized artifact. Everything runs single-threaded over in-memory
//! data; the only persisted artifacts are the catalog file and the
//! generated script. A run either completes and writes its full output
//! or fails before writing anything.
//!
//! Parsing is deliberately lenient: missing COPY blocks degrade to zero
//! rows, malformed rows are skipped, and non-integer numerics become
//! absent values. Only an unreadable input or unwritable output is
//! fatal.
//!
//! # Key Modules
//!
//! - [`dump`] -- Line-ending normalization, COPY block extraction, row
//!   decoding
//! - [`rows`] -- Positional column layouts and typed source rows
//! - [`join`] -- In-memory lookup structures and price normalization
//! - [`catalog`] -- Catalog assembly, skip rules, JSON read/write
//! - [`extract`] -- Forward pipeline orchestration
//! - [`restore`] -- SQL script generation (inverse direction)
//! - [`import`] -- Direct PostgreSQL load via tokio-postgres
//! - [`models`] -- Catalog data types
//! - [`stats`] -- Run counters and skip diagnostics
//! - [`config`] -- Policy constants (currency, stock placeholder,
//!   price threshold)
//!
//! # Example Usage
//!
//! ```bash
//! # Parse a logical dump into the JSON catalog
//! luxe-migrate extract -i import.sql -o products_catalog.json
//!
//! # Regenerate an upsert script from the catalog
//! luxe-migrate restore -i products_catalog.json -o restore_data.sql
//!
//! # Load the catalog into a live database
//! luxe-migrate import -i products_catalog.json --db-url "host=localhost dbname=luxe_db"
//! ```

pub mod catalog;
pub mod config;
pub mod dump;
pub mod extract;
pub mod import;
pub mod join;
pub mod models;
pub mod restore;
pub mod rows;
pub mod stats;
