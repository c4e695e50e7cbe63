//! Контрольные цифры розничных символик: EAN-13, EAN-8, UPC-A, плюс развёртка UPC-E.
//!
//! Все функции тотальные: на любой строке (не цифры, не та длина) возвращают
//! `false`/`None` и никогда не паникуют.

use crate::core::Symbology;

/// Длины, допустимые для общей проверки `is_valid_barcode`.
pub const ACCEPTED_LENGTHS: [usize; 3] = [8, 12, 13];

/// Строка из ровно `N` ASCII-цифр → массив значений 0..=9.
fn digits<const N: usize>(code: &str) -> Option<[u8; N]> {
    let bytes = code.as_bytes();
    if bytes.len() != N {
        return None;
    }
    let mut out = [0u8; N];
    for (slot, &b) in out.iter_mut().zip(bytes) {
        if !b.is_ascii_digit() {
            return None;
        }
        *slot = b - b'0';
    }
    Some(out)
}

/// Взвешенная сумма → контрольная цифра `(10 - sum mod 10) mod 10`.
fn check_digit(ds: &[u8], weight: impl Fn(usize) -> u32) -> u8 {
    let sum: u32 = ds
        .iter()
        .enumerate()
        .map(|(i, &d)| d as u32 * weight(i))
        .sum();
    ((10 - sum % 10) % 10) as u8
}

#[inline]
fn ean13_weight(i: usize) -> u32 {
    if i % 2 == 0 { 1 } else { 3 }
}

// EAN-8 и UPC-A: ×3 на чётных индексах (0-based), ×1 на нечётных
#[inline]
fn odd_position_weight(i: usize) -> u32 {
    if i % 2 == 0 { 3 } else { 1 }
}

/// Контрольная цифра EAN-13 по первым 12 цифрам.
pub fn ean13_checksum(first12: &str) -> Option<u8> {
    digits::<12>(first12).map(|d| check_digit(&d, ean13_weight))
}

/// Контрольная цифра EAN-8 по первым 7 цифрам.
pub fn ean8_checksum(first7: &str) -> Option<u8> {
    digits::<7>(first7).map(|d| check_digit(&d, odd_position_weight))
}

/// Контрольная цифра UPC-A по первым 11 цифрам.
pub fn upca_checksum(first11: &str) -> Option<u8> {
    digits::<11>(first11).map(|d| check_digit(&d, odd_position_weight))
}

pub fn validate_ean13(code: &str) -> bool {
    digits::<13>(code).is_some_and(|d| check_digit(&d[..12], ean13_weight) == d[12])
}

pub fn validate_ean8(code: &str) -> bool {
    digits::<8>(code).is_some_and(|d| check_digit(&d[..7], odd_position_weight) == d[7])
}

pub fn validate_upca(code: &str) -> bool {
    digits::<12>(code).is_some_and(|d| check_digit(&d[..11], odd_position_weight) == d[11])
}

/// Развернуть 8-значный UPC-E в 12-значную форму.
///
/// Раскладка входа: система нумерации, пять значащих цифр, контрольная цифра
/// и цифра-селектор. Селектор (последняя цифра) выбирает схему вставки нулей:
///
/// | селектор | результат (без NS и контрольной) |
/// |----------|----------------------------------|
/// | 0..=2    | `m1 m2 S 0000 m3 m4 m5`          |
/// | 3        | `m1 m2 m3 00000 m4 m5`           |
/// | 4        | `m1 m2 m3 m4 00000 m5`           |
/// | 5..=9    | `m1 m2 m3 m4 m5 0000 S`          |
///
/// Контрольная цифра переносится как есть.
pub fn expand_upce(code: &str) -> Option<String> {
    let d = digits::<8>(code)?;
    let (ns, m, check, sel) = (d[0], &d[1..6], d[6], d[7]);
    let body: [u8; 10] = match sel {
        0..=2 => [m[0], m[1], sel, 0, 0, 0, 0, m[2], m[3], m[4]],
        3 => [m[0], m[1], m[2], 0, 0, 0, 0, 0, m[3], m[4]],
        4 => [m[0], m[1], m[2], m[3], 0, 0, 0, 0, 0, m[4]],
        _ => [m[0], m[1], m[2], m[3], m[4], 0, 0, 0, 0, sel],
    };
    let mut out = String::with_capacity(12);
    out.push(char::from(b'0' + ns));
    out.extend(body.iter().map(|&v| char::from(b'0' + v)));
    out.push(char::from(b'0' + check));
    Some(out)
}

/// UPC-E валиден, если это 8 цифр и он разворачивается.
#[inline]
pub fn validate_upce(code: &str) -> bool {
    expand_upce(code).is_some()
}

/// Общая проверка по длине: 13 → EAN-13, 12 → UPC-A, 8 → EAN-8.
pub fn is_valid_barcode(code: &str) -> bool {
    match code.len() {
        13 => validate_ean13(code),
        12 => validate_upca(code),
        8 => validate_ean8(code),
        _ => false,
    }
}

/// Проверка под конкретную символику. Code 128 без контрольной цифры:
/// годится любой непустой текст.
pub fn validate(symbology: Symbology, code: &str) -> bool {
    match symbology {
        Symbology::Ean13 => validate_ean13(code),
        Symbology::Ean8 => validate_ean8(code),
        Symbology::UpcA => validate_upca(code),
        Symbology::UpcE => validate_upce(code),
        Symbology::Code128 => !code.is_empty(),
    }
}

/// Оставить только цифры (ручной ввод, вставка из буфера).
pub fn sanitize(raw: &str) -> String {
    raw.chars().filter(char::is_ascii_digit).collect()
}
