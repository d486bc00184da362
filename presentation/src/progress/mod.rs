//! Turn progress indicators

pub mod reporter;
