//! Синтез идеальных строк штрих-кодов: тесты, бенчи и `scan_synthetic`.
//!
//! Строка - пиксели 0/255, слева и справа quiet-зона 10 модулей, начинается
//! с белого. Невалидный вход → `None`.

use image::{DynamicImage, GrayImage as LumaBuffer, Luma};

use crate::checksum::{validate_ean13, validate_ean8};
use crate::core::Frame;
use crate::one_d::code128::{CodeSet, PATTERNS, STOP};
use crate::one_d::ean::{A_PATTERNS, B_PATTERNS, C_PATTERNS, FIRST_DIGIT_MASKS};

const QUIET: u8 = 10;

/// Модули (чередование white/black, начиная с белого) → пиксели.
fn render(modules: &[u8], unit: usize) -> Vec<u8> {
    let unit = unit.max(1);
    let mut px = Vec::with_capacity(modules.iter().map(|&m| m as usize).sum::<usize>() * unit);
    for (i, &m) in modules.iter().enumerate() {
        let v = if i % 2 == 0 { 255 } else { 0 };
        px.extend(std::iter::repeat(v).take(m as usize * unit));
    }
    px
}

fn digit_values(code: &str) -> Vec<u8> {
    code.bytes().map(|b| b - b'0').collect()
}

/// EAN-13 (13 цифр) или UPC-A (12 цифр, кодируется с ведущим 0).
pub fn ean13_row(code: &str, unit: usize) -> Option<Vec<u8>> {
    let full = match code.len() {
        12 => format!("0{code}"),
        _ => code.to_string(),
    };
    if !validate_ean13(&full) {
        return None;
    }
    let d = digit_values(&full);
    let mask = FIRST_DIGIT_MASKS[d[0] as usize];

    let mut modules = vec![QUIET, 1, 1, 1];
    for (k, &digit) in d[1..7].iter().enumerate() {
        let table = if mask[k] { &B_PATTERNS } else { &A_PATTERNS };
        modules.extend_from_slice(&table[digit as usize]);
    }
    modules.extend_from_slice(&[1, 1, 1, 1, 1]);
    for &digit in &d[7..] {
        modules.extend_from_slice(&C_PATTERNS[digit as usize]);
    }
    modules.extend_from_slice(&[1, 1, 1, QUIET]);
    Some(render(&modules, unit))
}

pub fn ean8_row(code: &str, unit: usize) -> Option<Vec<u8>> {
    if !validate_ean8(code) {
        return None;
    }
    let d = digit_values(code);
    let mut modules = vec![QUIET, 1, 1, 1];
    for &digit in &d[..4] {
        modules.extend_from_slice(&A_PATTERNS[digit as usize]);
    }
    modules.extend_from_slice(&[1, 1, 1, 1, 1]);
    for &digit in &d[4..] {
        modules.extend_from_slice(&C_PATTERNS[digit as usize]);
    }
    modules.extend_from_slice(&[1, 1, 1, QUIET]);
    Some(render(&modules, unit))
}

/// Code 128 в одном наборе, без переключений.
pub fn code128_row(text: &str, set: CodeSet, unit: usize) -> Option<Vec<u8>> {
    let mut codes: Vec<u8> = vec![set.start_value()];
    match set {
        CodeSet::A => {
            for b in text.bytes() {
                codes.push(match b {
                    32..=95 => b - 32,
                    0..=31 => b + 64,
                    _ => return None,
                });
            }
        }
        CodeSet::B => {
            for b in text.bytes() {
                if !(32..=127).contains(&b) {
                    return None;
                }
                codes.push(b - 32);
            }
        }
        CodeSet::C => {
            let bytes = text.as_bytes();
            if bytes.len() % 2 != 0 || !bytes.iter().all(u8::is_ascii_digit) {
                return None;
            }
            codes.extend(bytes.chunks(2).map(|p| (p[0] - b'0') * 10 + (p[1] - b'0')));
        }
    }
    if codes.len() < 2 {
        return None;
    }

    let sum = codes
        .iter()
        .enumerate()
        .skip(1)
        .fold(codes[0] as u32, |acc, (i, &v)| acc + v as u32 * i as u32);
    codes.push((sum % 103) as u8);

    let mut modules = vec![QUIET];
    for &c in &codes {
        modules.extend_from_slice(&PATTERNS[c as usize]);
    }
    modules.extend_from_slice(&STOP);
    modules.push(QUIET);
    Some(render(&modules, unit))
}

/// Кадр из одной строки, повторённой `height` раз, с белыми полями `pad`.
pub fn frame_from_row(row: &[u8], height: u32, pad: u32) -> Frame {
    let width = row.len() as u32 + 2 * pad;
    let img = LumaBuffer::from_fn(width, height.max(1), |x, _| {
        let v = x
            .checked_sub(pad)
            .and_then(|i| row.get(i as usize))
            .copied()
            .unwrap_or(255);
        Luma([v])
    });
    DynamicImage::ImageLuma8(img)
}
