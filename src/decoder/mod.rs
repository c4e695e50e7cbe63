//! Стратегии распознавания кадров.
//!
//! Две реализации одного трейта: нативный детектор платформы (весь кадр,
//! каждые ~16 мс) и программный декодер по строкам (ROI, раз в ~250 мс).
//! Выбор делается один раз при старте сессии.

pub mod native;
pub mod software;

use std::fmt;
use std::time::{Duration, Instant};

use crate::config::{DecoderConfig, StrategyPreference};
use crate::core::{Frame, RawDetection};
use crate::region::Region;

pub use native::{NativeDetector, NativeHit, NativeStrategy};
pub use software::SoftwareStrategy;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StrategyKind {
    Native,
    Software,
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StrategyKind::Native => "native",
            StrategyKind::Software => "software",
        })
    }
}

/// Один шаг распознавания. Пустой результат - не ошибка.
pub trait FrameDecoder: Send {
    fn kind(&self) -> StrategyKind;

    /// Интервал между кадрами для этой стратегии.
    fn cadence(&self) -> Duration;

    fn decode(&mut self, frame: &Frame, at: Instant) -> Vec<RawDetection>;
}

/// Выбрать стратегию по возможностям камеры и настройке.
pub fn select_strategy(
    native: Option<Box<dyn NativeDetector>>,
    cfg: &DecoderConfig,
    region: Region,
) -> Box<dyn FrameDecoder> {
    let software = || -> Box<dyn FrameDecoder> { Box::new(SoftwareStrategy::new(cfg, region)) };
    match (cfg.strategy, native) {
        (StrategyPreference::Software, _) => software(),
        (StrategyPreference::Auto | StrategyPreference::Native, Some(detector)) => {
            Box::new(NativeStrategy::new(detector, Duration::from_millis(cfg.native_interval_ms)))
        }
        (StrategyPreference::Native, None) => {
            tracing::warn!("native_detector_missing_fallback_software");
            software()
        }
        (StrategyPreference::Auto, None) => software(),
    }
}
