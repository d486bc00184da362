//! Use cases (application services)

pub mod ingest_attachments;
pub mod run_turn;
