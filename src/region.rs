//! Область интереса (ROI) в долях кадра.

use serde::{Deserialize, Serialize};

/// Прямоугольник в координатах экрана (пиксели вывода видео).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DisplayRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// ROI: доли `[0, 1]` относительно кадра.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Default for Region {
    fn default() -> Self {
        Self::default_band()
    }
}

impl Region {
    pub const FULL: Region = Region { x: 0.0, y: 0.0, width: 1.0, height: 1.0 };

    /// Центральная полоса 80%×60%.
    pub const fn default_band() -> Self {
        Region { x: 0.1, y: 0.2, width: 0.8, height: 0.6 }
    }

    /// Доли приводятся в `[0, 1]`, ширина/высота не выходят за край.
    pub fn clamped(self) -> Self {
        let x = finite_or(self.x, 0.0).clamp(0.0, 1.0);
        let y = finite_or(self.y, 0.0).clamp(0.0, 1.0);
        Region {
            x,
            y,
            width: finite_or(self.width, 1.0).clamp(0.0, 1.0 - x),
            height: finite_or(self.height, 1.0).clamp(0.0, 1.0 - y),
        }
    }

    /// Рамка, нарисованная поверх видео, → доли кадра.
    /// Вырожденный прямоугольник видео даёт весь кадр.
    pub fn from_display(roi: DisplayRect, video: DisplayRect) -> Self {
        if video.width <= 0.0 || video.height <= 0.0 {
            return Region::FULL;
        }
        Region {
            x: (roi.x - video.x) / video.width,
            y: (roi.y - video.y) / video.height,
            width: roi.width / video.width,
            height: roi.height / video.height,
        }
        .clamped()
    }

    /// Пиксельный прямоугольник `(x, y, w, h)` внутри кадра `w×h`, минимум 1×1.
    pub fn to_pixels(&self, frame_w: u32, frame_h: u32) -> (u32, u32, u32, u32) {
        let r = self.clamped();
        let fw = frame_w as f32;
        let fh = frame_h as f32;
        let x = ((r.x * fw) as u32).min(frame_w.saturating_sub(1));
        let y = ((r.y * fh) as u32).min(frame_h.saturating_sub(1));
        let w = ((r.width * fw).round() as u32).clamp(1, (frame_w - x).max(1));
        let h = ((r.height * fh).round() as u32).clamp(1, (frame_h - y).max(1));
        (x, y, w, h)
    }
}

#[inline]
fn finite_or(v: f32, fallback: f32) -> f32 {
    if v.is_finite() { v } else { fallback }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_band_in_pixels() {
        assert_eq!(Region::default().to_pixels(1000, 500), (100, 100, 800, 300));
    }

    #[test]
    fn display_rect_maps_to_fractions() {
        let video = DisplayRect { x: 0.0, y: 100.0, width: 400.0, height: 300.0 };
        let roi = DisplayRect { x: 40.0, y: 160.0, width: 320.0, height: 180.0 };
        let r = Region::from_display(roi, video);
        assert!((r.x - 0.1).abs() < 1e-6);
        assert!((r.y - 0.2).abs() < 1e-6);
        assert!((r.width - 0.8).abs() < 1e-6);
        assert!((r.height - 0.6).abs() < 1e-6);
    }

    #[test]
    fn overflowing_roi_is_clamped() {
        let r = Region { x: 0.9, y: -0.5, width: 0.5, height: f32::NAN }.clamped();
        assert_eq!(r.x, 0.9);
        assert_eq!(r.y, 0.0);
        assert!((r.width - 0.1).abs() < 1e-6);
        assert_eq!(r.height, 1.0);
        assert_eq!(Region::from_display(r_rect(), DisplayRect { x: 0.0, y: 0.0, width: 0.0, height: 5.0 }), Region::FULL);
    }

    #[test]
    fn tiny_frames_stay_non_empty() {
        let (_, _, w, h) = Region { x: 0.99, y: 0.99, width: 0.0, height: 0.0 }.to_pixels(10, 10);
        assert_eq!((w, h), (1, 1));
        assert_eq!(Region::FULL.to_pixels(0, 0), (0, 0, 1, 1));
    }

    fn r_rect() -> DisplayRect {
        DisplayRect { x: 1.0, y: 1.0, width: 1.0, height: 1.0 }
    }
}
