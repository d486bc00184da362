//! Directory Service HTTP adapter
//!
//! Implements `DirectoryPort` (sign-in, conversations) and `FileUploader`
//! (smart file upload) over the service's JSON API.

pub mod client;
pub mod error;

pub use client::DirectoryClient;
