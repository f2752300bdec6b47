//! Service layer: the blob-store seam and the gateway logic built on it.

pub mod blob_store;
pub mod disk_store;
pub mod gateway_service;
pub mod s3_store;
