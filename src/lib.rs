#![forbid(unsafe_code)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

// Ядро: типы, контрольные суммы, GTIN
pub mod checksum;
pub mod core;
pub mod gtin;

// Программный движок 1D
pub mod binarize;
pub mod one_d;

// Конвейер кадра
pub mod decoder;
pub mod region;
pub mod stabilizer;

// Сессия, камера, настройки
pub mod config;
pub mod error;
pub mod session;

pub mod prelude;

pub use crate::config::ScannerConfig;
pub use crate::core::{Frame, GrayImage, RawDetection, Symbology};
pub use crate::error::{ConfigError, DecodeFailure, ScanError, TorchError};
pub use crate::session::{ScanEvent, ScannerSession};
