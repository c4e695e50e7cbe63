//! Обёртка над нативным детектором платформы.

use std::time::{Duration, Instant};

use crate::core::{Frame, RawDetection};
use crate::decoder::{FrameDecoder, StrategyKind};
use crate::error::DecodeFailure;
use crate::gtin::infer_symbology;

/// Сырой результат платформенного детектора: текст и строка формата.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NativeHit {
    pub raw_value: String,
    /// Например `"ean_13"`, `"upc_a"`; может быть пустой.
    pub format: String,
}

impl NativeHit {
    pub fn new(raw_value: impl Into<String>, format: impl Into<String>) -> Self {
        Self { raw_value: raw_value.into(), format: format.into() }
    }
}

/// Детектор, который камера отдаёт, если платформа его поддерживает.
pub trait NativeDetector: Send {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<NativeHit>, DecodeFailure>;
}

pub struct NativeStrategy {
    detector: Box<dyn NativeDetector>,
    cadence: Duration,
}

impl NativeStrategy {
    pub fn new(detector: Box<dyn NativeDetector>, cadence: Duration) -> Self {
        Self { detector, cadence }
    }
}

impl FrameDecoder for NativeStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Native
    }

    fn cadence(&self) -> Duration {
        self.cadence
    }

    fn decode(&mut self, frame: &Frame, at: Instant) -> Vec<RawDetection> {
        match self.detector.detect(frame) {
            Ok(hits) => hits
                .into_iter()
                .filter(|h| !h.raw_value.is_empty())
                .map(|h| {
                    let symbology = infer_symbology(&h.format, &h.raw_value);
                    RawDetection::new(h.raw_value, symbology, at)
                })
                .collect(),
            Err(err) => {
                tracing::debug!(error = %err, "native_detect_failed");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Symbology;

    struct Scripted(Vec<Result<Vec<NativeHit>, DecodeFailure>>);

    impl NativeDetector for Scripted {
        fn detect(&mut self, _frame: &Frame) -> Result<Vec<NativeHit>, DecodeFailure> {
            if self.0.is_empty() {
                Ok(Vec::new())
            } else {
                self.0.remove(0)
            }
        }
    }

    #[test]
    fn maps_formats_and_absorbs_failures() {
        let script = vec![
            Ok(vec![NativeHit::new("036000291452", "upc_a"), NativeHit::new("", "ean_13")]),
            Err(DecodeFailure("blurred".into())),
        ];
        let mut s = NativeStrategy::new(Box::new(Scripted(script)), Duration::from_millis(16));
        let frame = Frame::new_luma8(4, 4);
        let at = Instant::now();

        let first = s.decode(&frame, at);
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].symbology, Symbology::UpcA);
        assert_eq!(first[0].confidence, None);

        assert!(s.decode(&frame, at).is_empty());
    }
}
