//! Aviateur upload/listing gateway.
//!
//! A thin HTTP service that accepts single-file multipart uploads, stages
//! them in a local scratch directory, streams them into a remote blob store
//! under a collision-resistant key, and exposes a recency-sorted listing of
//! stored objects decorated with public CDN URLs.

pub mod config;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;
