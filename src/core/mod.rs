pub mod types;

pub use types::{Frame, GrayImage, RawDetection, Symbology, UnknownSymbology};
