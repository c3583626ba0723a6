//! Shortloop - a link-resolution engine
//!
//! Clients submit a long URL (optionally with a custom alias and an
//! expiration timestamp) and receive a short code; lookups of the code
//! resolve to the original URL until it expires.
//!
//! # Architecture
//! - `services`: the link resolver, the only component with invariants
//!   (uniqueness, expiry, cache coherence)
//! - `storages`: durable code -> link mapping, source of truth for uniqueness
//! - `cache`: advisory cache-aside layer with TTL bounded by true expiry
//! - `api`: thin actix-web adapter over the resolver
//! - `config`: configuration management
//! - `utils`: code generation, alias/URL validation, clock

pub mod api;
pub mod cache;
pub mod config;
pub mod errors;
pub mod logging;
pub mod services;
pub mod storages;
pub mod utils;
