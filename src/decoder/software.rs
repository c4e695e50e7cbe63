//! Программная стратегия: ROI → 8-бит яркость → построчные 1D-декодеры.

use std::time::{Duration, Instant};

use crate::config::DecoderConfig;
use crate::core::{Frame, GrayImage, RawDetection, Symbology};
use crate::decoder::{FrameDecoder, StrategyKind};
use crate::one_d::{self, DecodeOptions};
use crate::region::Region;

pub struct SoftwareStrategy {
    opts: DecodeOptions,
    region: Region,
    cadence: Duration,
}

impl SoftwareStrategy {
    pub fn new(cfg: &DecoderConfig, region: Region) -> Self {
        Self {
            opts: DecodeOptions {
                scan_rows: cfg.scan_rows.max(1),
                ean: cfg.ean,
                code128: cfg.code128,
                ..DecodeOptions::default()
            },
            region: region.clamped(),
            cadence: Duration::from_millis(cfg.software_interval_ms),
        }
    }

    pub fn region(&self) -> Region {
        self.region
    }
}

impl FrameDecoder for SoftwareStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Software
    }

    fn cadence(&self) -> Duration {
        self.cadence
    }

    fn decode(&mut self, frame: &Frame, at: Instant) -> Vec<RawDetection> {
        let (x, y, w, h) = self.region.to_pixels(frame.width(), frame.height());
        let luma = frame.crop_imm(x, y, w, h).to_luma8();
        let img = GrayImage::from_luma(&luma);
        let scanned = img.sample_rows(self.opts.scan_rows).count();
        if scanned == 0 {
            return Vec::new();
        }

        // одинаковые чтения с разных строк → одна детекция
        let mut groups: Vec<(Symbology, String, usize)> = Vec::new();
        for bc in one_d::scan(&img, &self.opts) {
            match groups.iter_mut().find(|(s, t, _)| *s == bc.symbology && *t == bc.text) {
                Some(g) => g.2 += 1,
                None => groups.push((bc.symbology, bc.text, 1)),
            }
        }
        tracing::trace!(rows = scanned, reads = groups.len(), "software_frame_scanned");

        groups
            .into_iter()
            .map(|(symbology, text, rows)| {
                RawDetection::new(text, symbology, at).with_confidence(rows as f32 / scanned as f32)
            })
            .collect()
    }
}
