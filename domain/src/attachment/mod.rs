//! File attachments.
//!
//! [`reference`] pulls `@path` tokens out of raw input; [`media`] decides
//! how each resolved file reaches the model.

pub mod media;
pub mod reference;

pub use media::{Delivery, FileFacts, MediaPolicy};
pub use reference::{FileReference, ParsedInput, ResolutionState, parse_attachments};
