//! Программные 1D-декодеры по строкам: EAN-13/UPC-A, EAN-8, Code 128.

pub mod code128;
pub mod ean;
pub mod synth;

use crate::core::{GrayImage, Symbology};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Barcode {
    pub symbology: Symbology,
    pub text: String,
    /// y-координата строки, на которой код прочитан.
    pub row: usize,
}

#[derive(Clone, Debug)]
pub struct DecodeOptions {
    /// Сколько строк сканировать (равномерно по высоте).
    pub scan_rows: usize,
    /// Строки короче этого (в пикселях) не пробуем.
    pub min_modules: usize,
    pub ean: bool,
    pub code128: bool,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            scan_rows: 15,
            min_modules: 30,
            ean: true,
            code128: true,
        }
    }
}

/// Один ряд: сначала семейство EAN/UPC, затем Code 128.
pub fn decode_row(row: &[u8], opts: &DecodeOptions) -> Option<(Symbology, String)> {
    if opts.ean {
        if let Some(hit) = ean::decode_row(row, opts) {
            return Some(hit);
        }
    }
    if opts.code128 {
        if let Some(text) = code128::decode_row(row, opts) {
            return Some((Symbology::Code128, text));
        }
    }
    None
}

/// Прогнать `scan_rows` строк изображения. Каждая удачная строка - отдельный
/// `Barcode`, дубли по строкам не схлопываются.
pub fn scan(img: &GrayImage<'_>, opts: &DecodeOptions) -> Vec<Barcode> {
    img.sample_rows(opts.scan_rows)
        .filter_map(|y| {
            decode_row(img.row(y), opts).map(|(symbology, text)| Barcode { symbology, text, row: y })
        })
        .collect()
}

/// Манхэттенское расстояние между паттернами ширин.
#[inline]
pub(crate) fn patdist<const N: usize>(p: &[u8; N], q: &[u8; N]) -> u32 {
    p.iter()
        .zip(q)
        .map(|(&a, &b)| (a as i32 - b as i32).unsigned_abs())
        .sum()
}

/// Ближайший паттерн словаря: (индекс, расстояние).
pub(crate) fn best_match<const N: usize>(pat: &[u8; N], dict: &[[u8; N]]) -> (usize, u32) {
    let mut best = (0usize, u32::MAX);
    for (i, q) in dict.iter().enumerate() {
        let d = patdist(pat, q);
        if d < best.1 {
            best = (i, d);
            if d == 0 {
                break;
            }
        }
    }
    best
}
