pub mod conversion;
pub mod source;

pub use source::{SourceCommand, SourceError, SourceEvent};
