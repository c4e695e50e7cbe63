//! Code 128: декодер по одной строке.
//!
//! Поддержка:
//! - Наборы A/B/C, коды CODE A/B/C, SHIFT, FNC1 (ASCII 29, GS).
//! - Проверка checksum (mod 103).
//! - Детект всех трёх старт-кодов + STOP.
//!
//! Ищем STOP-паттерн (7 run'ов, сумма 13), затем идём НАЗАД по 6-run
//! блокам до старт-кода. Так поток выравнивается без угадывания, с какого
//! run'а начинать.

use crate::binarize::row_runs;
use crate::one_d::{best_match, patdist, DecodeOptions};

/// Паттерны 0..=105: по 6 чисел (bars/spaces), сумма 11.
const PATTERN_STR: [&str; 106] = [
    "212222", "222122", "222221", "121223", "121322", "131222", "122213", "122312", "132212",
    "221213", "221312", "231212", "112232", "122132", "122231", "113222", "123122", "123221",
    "223211", "221132", "221231", "213212", "223112", "312131", "311222", "321122", "321221",
    "312212", "322112", "322211", "212123", "212321", "232121", "111323", "131123", "131321",
    "112313", "132113", "132311", "211313", "231113", "231311", "112133", "112331", "132131",
    "113123", "113321", "133121", "313121", "211331", "231131", "213113", "213311", "213131",
    "311123", "311321", "331121", "312113", "312311", "332111", "314111", "221411", "431111",
    "111224", "111422", "121124", "121421", "141122", "141221", "112214", "112412", "122114",
    "122411", "142112", "142211", "241211", "221114", "413111", "241112", "134111", "111242",
    "121142", "121241", "114212", "124112", "124211", "411212", "421112", "421211", "212141",
    "214121", "412121", "111143", "111341", "131141", "114113", "114311", "411113", "411311",
    "113141", "114131", "311141", "411131", "211412", "211214",
    "211232", // 103..105 = Start A/B/C
];

const fn parse_patterns() -> [[u8; 6]; 106] {
    let mut out = [[0u8; 6]; 106];
    let mut i = 0;
    while i < 106 {
        let b = PATTERN_STR[i].as_bytes();
        let mut k = 0;
        while k < 6 {
            out[i][k] = b[k] - b'0';
            k += 1;
        }
        i += 1;
    }
    out
}

pub(crate) const PATTERNS: [[u8; 6]; 106] = parse_patterns();

/// STOP-паттерн (7 чисел, сумма 13).
pub(crate) const STOP: [u8; 7] = [2, 3, 3, 1, 1, 1, 2];

pub(crate) const START_A: u8 = 103;
pub(crate) const START_B: u8 = 104;
pub(crate) const START_C: u8 = 105;

/// start + checksum + stop + хотя бы один символ данных.
const MIN_RUNS: usize = 24;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CodeSet {
    A,
    B,
    C,
}

impl CodeSet {
    fn from_start(v: u8) -> Option<Self> {
        match v {
            START_A => Some(CodeSet::A),
            START_B => Some(CodeSet::B),
            START_C => Some(CodeSet::C),
            _ => None,
        }
    }

    pub(crate) fn start_value(self) -> u8 {
        match self {
            CodeSet::A => START_A,
            CodeSet::B => START_B,
            CodeSet::C => START_C,
        }
    }
}

/// Попытка декодировать один ряд в Code128. Успех → строка.
pub fn decode_row(row_gray: &[u8], opts: &DecodeOptions) -> Option<String> {
    if row_gray.len() < opts.min_modules {
        return None;
    }
    let rr = row_runs(row_gray, MIN_RUNS)?;
    let rl = &rr.widths;

    // STOP: окно из 7 run'ов, начинается с бара, нормализуем к сумме 13
    (0..=rl.len() - 7)
        .filter(|&i| rr.is_black(i))
        .filter(|&i| {
            let cand: [u8; 7] = normalize_symbol(&rl[i..i + 7], 13);
            patdist(&cand, &STOP) <= 1
        })
        .find_map(|i| decode_before_stop(rl, i))
}

/// Идём назад от STOP по 6-run символам до Start A/B/C.
fn decode_before_stop(rl: &[usize], stop_i: usize) -> Option<String> {
    let mut idx = stop_i;
    let mut vals_rev: Vec<u8> = Vec::new();
    let mut start_set: Option<CodeSet> = None;

    while idx >= 6 {
        let pat: [u8; 6] = normalize_symbol(&rl[idx - 6..idx], 11);
        let (val, dist) = best_match(&pat, &PATTERNS);
        if dist > 1 {
            return None;
        }
        if let Some(set) = CodeSet::from_start(val as u8) {
            start_set = Some(set);
            break;
        }
        vals_rev.push(val as u8);
        idx -= 6;
    }

    let start_set = start_set?;
    // в прямой порядок: [payload..., checksum]
    vals_rev.reverse();
    let (&checksum, payload) = vals_rev.split_last()?;
    if payload.is_empty() {
        return None;
    }

    let sum = payload
        .iter()
        .enumerate()
        .fold(start_set.start_value() as u32, |acc, (i, &v)| acc + v as u32 * (i as u32 + 1));
    if sum % 103 != checksum as u32 {
        return None;
    }

    decode_values_to_text(payload, start_set)
}

/// Нормализовать `N` ширин к сумме `total` модулей (каждый 1..=4).
fn normalize_symbol<const N: usize>(slice: &[usize], total: i32) -> [u8; N] {
    debug_assert_eq!(slice.len(), N);
    let sum: usize = slice.iter().sum();
    let scale = sum as f32 / total as f32;
    let mut out = [0u8; N];
    for (o, &w) in out.iter_mut().zip(slice) {
        *o = ((w as f32 / scale).round() as i32).clamp(1, 4) as u8;
    }
    adjust_sum_to(&mut out, total);
    out
}

fn adjust_sum_to<const N: usize>(v: &mut [u8; N], target: i32) {
    let mut sum: i32 = v.iter().map(|&x| x as i32).sum();
    while sum != target {
        if sum > target {
            // уменьшаем самый широкий
            let Some((i, _)) = v.iter().enumerate().max_by_key(|&(_, &x)| x) else { break };
            if v[i] <= 1 {
                break;
            }
            v[i] -= 1;
            sum -= 1;
        } else {
            let Some((i, _)) = v.iter().enumerate().min_by_key(|&(_, &x)| x) else { break };
            if v[i] >= 4 {
                break;
            }
            v[i] += 1;
            sum += 1;
        }
    }
}

#[derive(PartialEq, Eq, Clone, Copy, Debug)]
enum NextShift {
    None,
    A,
    B,
}

fn decode_values_to_text(vals: &[u8], mut set: CodeSet) -> Option<String> {
    let mut out = String::new();
    let mut shift = NextShift::None;

    for &v in vals {
        // SHIFT действует на один следующий символ
        let effective = match (set, shift) {
            (CodeSet::A, NextShift::B) => CodeSet::B,
            (CodeSet::B, NextShift::A) => CodeSet::A,
            _ => set,
        };

        match (effective, v) {
            (CodeSet::A, 0..=63) => out.push(char::from(v + 32)),
            (CodeSet::A, 64..=95) => out.push(char::from(v - 64)),
            (CodeSet::B, 0..=95) => out.push(char::from(v + 32)),
            (CodeSet::C, 0..=99) => {
                out.push(char::from(b'0' + v / 10));
                out.push(char::from(b'0' + v % 10));
            }
            // FNC3/FNC2, SHIFT и «остаться в том же наборе» - без вывода
            (CodeSet::A | CodeSet::B, 96 | 97 | 98) => {}
            (CodeSet::A, 101) | (CodeSet::B, 100) => {}
            (CodeSet::A | CodeSet::B, 99) => set = CodeSet::C,
            (CodeSet::A | CodeSet::C, 100) => set = CodeSet::B,
            (CodeSet::B | CodeSet::C, 101) => set = CodeSet::A,
            (_, 102) => out.push('\u{1d}'), // FNC1 -> ASCII GS
            _ => return None,
        }

        if shift != NextShift::None {
            shift = NextShift::None;
        } else if v == 98 {
            shift = match set {
                CodeSet::A => NextShift::B,
                CodeSet::B => NextShift::A,
                CodeSet::C => NextShift::None,
            };
        }
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::one_d::synth;
    use test_case::test_case;

    #[test_case("HELLO-128", CodeSet::B ; "set b")]
    #[test_case("0123456789", CodeSet::C ; "set c digits")]
    #[test_case("ABcd[]", CodeSet::B ; "set b ascii span")]
    #[test_case("SKU 42", CodeSet::A ; "set a")]
    #[test_case("1299", CodeSet::C ; "set c trailing 99 pair")]
    #[test_case("990012", CodeSet::C ; "set c leading 99 pair")]
    fn decodes_synthetic_rows(text: &str, set: CodeSet) {
        let row = synth::code128_row(text, set, 2).expect("encodable text");
        assert_eq!(decode_row(&row, &DecodeOptions::default()).as_deref(), Some(text));
    }

    #[test]
    fn patterns_sum_to_eleven() {
        assert!(PATTERNS.iter().all(|p| p.iter().map(|&x| x as u32).sum::<u32>() == 11));
    }

    #[test]
    fn shift_applies_to_one_symbol() {
        // B: 'a', SHIFT, A-символ 'A'(33), снова B: 'b'
        let vals = [65, 98, 33, 66];
        assert_eq!(decode_values_to_text(&vals, CodeSet::B).as_deref(), Some("aAb"));
    }

    #[test]
    fn value_99_is_a_digit_pair_only_in_set_c() {
        assert_eq!(decode_values_to_text(&[12, 99], CodeSet::C).as_deref(), Some("1299"));
        // в B значение 99 переключает на C
        assert_eq!(decode_values_to_text(&[33, 99, 99], CodeSet::B).as_deref(), Some("A99"));
    }
}
