//! Core data models for the upload/listing gateway.
//!
//! These entities represent stored blobs as they are exposed over HTTP.
//! They serialize naturally as JSON via `serde`.

pub mod object;
