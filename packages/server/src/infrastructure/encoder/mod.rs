pub mod tuio2;

pub use tuio2::{Dimension, SourceDescriptor, Tuio2Encoder};
