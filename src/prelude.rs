//! `use barscan::prelude::*;` для типичного встраивания.

pub use crate::checksum::{is_valid_barcode, validate};
pub use crate::config::{ScannerConfig, StrategyPreference};
pub use crate::core::{Frame, RawDetection, Symbology};
pub use crate::decoder::{FrameDecoder, NativeDetector, NativeHit, StrategyKind};
pub use crate::error::{ScanError, TorchError};
pub use crate::gtin::{normalize, NormalizedGtin};
pub use crate::region::Region;
pub use crate::session::{
    CameraBackend, CameraStream, DeviceInfo, FacingMode, ScanEvent, ScannerSession, StartOptions, StillCamera,
    SwitchOutcome,
};
pub use crate::stabilizer::{Stabilizer, Verdict};
