//! Семейство EAN/UPC по одной строке: EAN-13 (и UPC-A как EAN-13 с ведущим 0), EAN-8.
//!
//! Алгоритм:
//! 1) Бинаризуем строку (адаптивно, с фоллбэком на глобальную) и строим run-lengths.
//! 2) Нормализуем run'ы в модули (1..4).
//! 3) Перебираем чёрные стартовые guard'ы (101); для каждого пробуем раскладку
//!    EAN-13, затем EAN-8: левая половина, центральный guard (01010), правая, финальный guard.
//! 4) EAN-13: левые цифры декодируем с учётом A/B (B = реверс A), первая цифра - по маске A/B.
//!    EAN-8: слева только A.
//! 5) Контрольная сумма через `checksum`.

use crate::binarize::{normalize_modules, row_runs};
use crate::checksum::{validate_ean13, validate_ean8};
use crate::core::Symbology;
use crate::one_d::{best_match, DecodeOptions};

// A (L) - левые паттерны (space/bar/space/bar), сумма = 7 модулей
pub(crate) const A_PATTERNS: [[u8; 4]; 10] = [
    [3, 2, 1, 1],
    [2, 2, 2, 1],
    [2, 1, 2, 2],
    [1, 4, 1, 1],
    [1, 1, 3, 2],
    [1, 2, 3, 1],
    [1, 1, 1, 4],
    [1, 3, 1, 2],
    [1, 2, 1, 3],
    [3, 1, 1, 2],
];

// B (G) - реверс A
pub(crate) const B_PATTERNS: [[u8; 4]; 10] = [
    [1, 1, 2, 3],
    [1, 2, 2, 2],
    [2, 2, 1, 2],
    [1, 1, 4, 1],
    [2, 3, 1, 1],
    [1, 3, 2, 1],
    [4, 1, 1, 1],
    [2, 1, 3, 1],
    [3, 1, 2, 1],
    [2, 1, 1, 3],
];

// C (R) - правая сторона; по ширинам совпадает с A
pub(crate) const C_PATTERNS: [[u8; 4]; 10] = A_PATTERNS;

/// Маски типов шести левых цифр EAN-13 (true = B) → первая цифра.
pub(crate) const FIRST_DIGIT_MASKS: [[bool; 6]; 10] = [
    [false, false, false, false, false, false],
    [false, false, true, false, true, true],
    [false, false, true, true, false, true],
    [false, false, true, true, true, false],
    [false, true, false, false, true, true],
    [false, true, true, false, false, true],
    [false, true, true, true, false, false],
    [false, true, false, true, false, true],
    [false, true, false, true, true, false],
    [false, true, true, false, true, false],
];

/// Допуск на цифру (манхэттен по модулям).
const MAX_DIGIT_DIST: u32 = 2;

/// Минимум run'ов для EAN-8: guard'ы 3+5+3, восемь цифр по 4.
const EAN8_MIN_RUNS: usize = 43;

/// Попытка декодировать один ряд. UPC-A возвращается 12 цифрами с символикой `UpcA`.
pub fn decode_row(row_gray: &[u8], opts: &DecodeOptions) -> Option<(Symbology, String)> {
    if row_gray.len() < opts.min_modules {
        return None;
    }
    let rr = row_runs(row_gray, EAN8_MIN_RUNS)?;
    let modules = normalize_modules(&rr.widths, 4);

    (0..modules.len())
        .filter(|&i| rr.is_black(i) && is_guard(&modules, i, 3))
        .find_map(|i| decode_ean13_at(&modules, i).or_else(|| decode_ean8_at(&modules, i)))
}

#[inline]
fn is_guard(m: &[u8], i: usize, len: usize) -> bool {
    m.get(i..i + len).is_some_and(|s| s.iter().all(|&v| v == 1))
}

#[inline]
fn digit_at(m: &[u8], idx: usize) -> Option<[u8; 4]> {
    m.get(idx..idx + 4)?.try_into().ok()
}

fn right_digit(m: &[u8], idx: usize) -> Option<u8> {
    let (d, dist) = best_match(&digit_at(m, idx)?, &C_PATTERNS);
    (dist <= MAX_DIGIT_DIST).then_some(d as u8)
}

fn to_text(ds: &[u8]) -> String {
    ds.iter().map(|&d| char::from(b'0' + d)).collect()
}

fn decode_ean13_at(m: &[u8], start: usize) -> Option<(Symbology, String)> {
    let mut idx = start + 3;
    let mut digits = [0u8; 13];
    let mut parity = [false; 6];

    for k in 0..6 {
        let pat = digit_at(m, idx)?;
        let (da, dist_a) = best_match(&pat, &A_PATTERNS);
        let (db, dist_b) = best_match(&pat, &B_PATTERNS);
        let (d, dist, is_b) = if dist_a <= dist_b { (da, dist_a, false) } else { (db, dist_b, true) };
        if dist > MAX_DIGIT_DIST {
            return None;
        }
        digits[1 + k] = d as u8;
        parity[k] = is_b;
        idx += 4;
    }

    if !is_guard(m, idx, 5) {
        return None;
    }
    idx += 5;

    for k in 0..6 {
        digits[7 + k] = right_digit(m, idx)?;
        idx += 4;
    }

    if !is_guard(m, idx, 3) {
        return None;
    }

    digits[0] = FIRST_DIGIT_MASKS.iter().position(|mask| *mask == parity)? as u8;
    let text = to_text(&digits);
    if !validate_ean13(&text) {
        return None;
    }

    // UPC-A - это EAN-13 с ведущим 0.
    Some(if digits[0] == 0 {
        (Symbology::UpcA, text[1..].to_string())
    } else {
        (Symbology::Ean13, text)
    })
}

fn decode_ean8_at(m: &[u8], start: usize) -> Option<(Symbology, String)> {
    let mut idx = start + 3;
    let mut digits = [0u8; 8];

    for k in 0..4 {
        let pat = digit_at(m, idx)?;
        let (d, dist_a) = best_match(&pat, &A_PATTERNS);
        let (_, dist_b) = best_match(&pat, &B_PATTERNS);
        if dist_a > MAX_DIGIT_DIST || dist_b < dist_a {
            return None;
        }
        digits[k] = d as u8;
        idx += 4;
    }

    if !is_guard(m, idx, 5) {
        return None;
    }
    idx += 5;

    for k in 0..4 {
        digits[4 + k] = right_digit(m, idx)?;
        idx += 4;
    }

    if !is_guard(m, idx, 3) {
        return None;
    }

    let text = to_text(&digits);
    validate_ean8(&text).then_some((Symbology::Ean8, text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::one_d::synth;
    use test_case::test_case;

    #[test_case("5901234123457", Symbology::Ean13, "5901234123457" ; "ean13")]
    #[test_case("4006381333931", Symbology::Ean13, "4006381333931" ; "ean13 second")]
    #[test_case("036000291452", Symbology::UpcA, "036000291452" ; "upca")]
    #[test_case("0036000291452", Symbology::UpcA, "036000291452" ; "ean13 leading zero")]
    fn decodes_ean13_family(code: &str, sym: Symbology, text: &str) {
        let row = synth::ean13_row(code, 2).expect("valid code");
        let got = decode_row(&row, &DecodeOptions::default());
        assert_eq!(got, Some((sym, text.to_string())));
    }

    #[test_case(1)]
    #[test_case(2)]
    #[test_case(3)]
    fn decodes_ean8_at_any_unit(unit: usize) {
        let row = synth::ean8_row("55123457", unit).expect("valid code");
        let got = decode_row(&row, &DecodeOptions::default());
        assert_eq!(got, Some((Symbology::Ean8, "55123457".to_string())));
    }

    #[test]
    fn flat_row_decodes_nothing() {
        assert_eq!(decode_row(&[255u8; 300], &DecodeOptions::default()), None);
    }

    #[test]
    fn masks_and_b_patterns_are_consistent() {
        for (a, b) in A_PATTERNS.iter().zip(B_PATTERNS.iter()) {
            let mut rev = *a;
            rev.reverse();
            assert_eq!(rev, *b);
        }
        assert!(FIRST_DIGIT_MASKS.iter().all(|m| !m[0]));
    }
}
