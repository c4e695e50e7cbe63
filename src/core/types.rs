// src/core/types.rs
//
// Общие типы конвейера, не зависящие от конкретных декодеров и камер.

use std::fmt;
use std::str::FromStr;
use std::time::Instant;

use serde::{Deserialize, Serialize};

/// Захваченный кадр видеопотока.
pub type Frame = image::DynamicImage;

/// Представление градаций серого поверх чужого буфера.
/// Буфер `data` - построчно (row-major), 8 бит на пиксель.
#[derive(Clone, Copy, Debug)]
pub struct GrayImage<'a> {
    pub data: &'a [u8],
    pub width: usize,
    pub height: usize,
}

impl<'a> GrayImage<'a> {
    /// Вид на 8-битный буфер из `image`.
    #[inline]
    pub fn from_luma(img: &'a image::GrayImage) -> Self {
        Self {
            data: img.as_raw(),
            width: img.width() as usize,
            height: img.height() as usize,
        }
    }

    #[inline]
    pub fn row(&self, y: usize) -> &'a [u8] {
        let start = y * self.width;
        &self.data[start..start + self.width]
    }

    /// Индексы `count` строк, равномерно распределённых по высоте.
    pub fn sample_rows(&self, count: usize) -> impl Iterator<Item = usize> {
        let h = self.height;
        let rows = count.max(1).min(h);
        (0..rows).map(move |i| (i * (h - 1)) / (rows - 1).max(1))
    }
}

/// Тип символики штрих-кода.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum Symbology {
    #[serde(rename = "EAN_13")]
    Ean13,
    #[serde(rename = "EAN_8")]
    Ean8,
    #[serde(rename = "UPC_A")]
    UpcA,
    #[serde(rename = "UPC_E")]
    UpcE,
    #[serde(rename = "CODE_128")]
    Code128,
}

impl Symbology {
    pub const ALL: [Symbology; 5] = [
        Symbology::Ean13,
        Symbology::Ean8,
        Symbology::UpcA,
        Symbology::UpcE,
        Symbology::Code128,
    ];

    /// Розничный GTIN (с контрольной цифрой). Code 128 - нет.
    #[inline]
    pub fn is_retail(self) -> bool {
        !matches!(self, Symbology::Code128)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Symbology::Ean13 => "EAN_13",
            Symbology::Ean8 => "EAN_8",
            Symbology::UpcA => "UPC_A",
            Symbology::UpcE => "UPC_E",
            Symbology::Code128 => "CODE_128",
        }
    }
}

impl fmt::Display for Symbology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("неизвестная символика: {0}")]
pub struct UnknownSymbology(pub String);

impl FromStr for Symbology {
    type Err = UnknownSymbology;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Symbology::ALL
            .into_iter()
            .find(|sym| sym.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownSymbology(s.to_string()))
    }
}

/// Одна попытка распознавания. Живёт до передачи в стабилизатор.
#[derive(Clone, Debug, PartialEq)]
pub struct RawDetection {
    pub text: String,
    pub symbology: Symbology,
    pub timestamp: Instant,
    /// 0..=1, если движок его сообщает.
    pub confidence: Option<f32>,
}

impl RawDetection {
    #[inline]
    pub fn new(text: impl Into<String>, symbology: Symbology, timestamp: Instant) -> Self {
        Self {
            text: text.into(),
            symbology,
            timestamp,
            confidence: None,
        }
    }

    #[inline]
    pub fn with_confidence(mut self, c: f32) -> Self {
        self.confidence = Some(c.clamp(0.0, 1.0));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbology_parses_wire_names() {
        assert_eq!("EAN_13".parse::<Symbology>(), Ok(Symbology::Ean13));
        assert_eq!("upc_e".parse::<Symbology>(), Ok(Symbology::UpcE));
        assert!("qr_code".parse::<Symbology>().is_err());
        assert_eq!(Symbology::Code128.to_string(), "CODE_128");
    }

    #[test]
    fn sample_rows_cover_edges() {
        let data = vec![0u8; 10 * 5];
        let img = GrayImage { data: &data, width: 10, height: 5 };
        let rows: Vec<usize> = img.sample_rows(3).collect();
        assert_eq!(rows, vec![0, 2, 4]);
        // больше строк, чем есть в картинке - берём все
        assert_eq!(img.sample_rows(15).count(), 5);
    }
}
