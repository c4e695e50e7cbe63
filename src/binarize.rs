//! Бинаризация строки кадра и измерение ширин баров.
//!
//! Два порога:
//! - адаптивный по скользящему среднему - основной, устойчив к неравномерной
//!   подсветке (типично для камеры телефона);
//! - глобальный (смесь среднего и середины min/max) - фоллбэк.

/// Простой глобальный порог: смесь среднего и середины между min/max.
#[inline]
pub fn otsu_like_threshold(row: &[u8]) -> u8 {
    if row.is_empty() {
        return 0;
    }
    let (mut min_v, mut max_v) = (u8::MAX, 0u8);
    let mut sum: u64 = 0;
    for &v in row {
        min_v = min_v.min(v);
        max_v = max_v.max(v);
        sum += v as u64;
    }
    let mean = (sum / row.len() as u64) as u16;
    let mid = (min_v as u16 + max_v as u16) / 2;
    ((mean + mid) / 2) as u8
}

/// Глобальная бинаризация строки: true=чёрный, false=белый.
pub fn binarize_row(row: &[u8]) -> Vec<bool> {
    let t = otsu_like_threshold(row);
    row.iter().map(|&v| v < t).collect()
}

/// Адаптивная бинаризация: пиксель чёрный, если он темнее среднего по окну
/// на `bias`. Окно - width/32 в диапазоне [8..64].
pub fn binarize_row_adaptive(row: &[u8]) -> Vec<bool> {
    let n = row.len();
    if n == 0 {
        return Vec::new();
    }
    let win = (n / 32).clamp(8, 64);
    let bias: i32 = 5;

    // префиксные суммы для среднего по окну
    let mut pref: Vec<u32> = Vec::with_capacity(n + 1);
    let mut acc = 0u32;
    pref.push(acc);
    for &v in row {
        acc += v as u32;
        pref.push(acc);
    }

    (0..n)
        .map(|i| {
            let left = i.saturating_sub(win);
            let right = (i + win).min(n - 1);
            let len = (right - left + 1) as u32;
            let mean = ((pref[right + 1] - pref[left]) / len) as i32;
            (row[i] as i32) < mean - bias
        })
        .collect()
}

/// Бинарная строка → ширины run'ов (первый run - как есть, чаще белый).
pub fn runs(row_bin: &[bool]) -> Vec<usize> {
    let Some((&first, rest)) = row_bin.split_first() else {
        return Vec::new();
    };
    let mut v = Vec::new();
    let mut cur = first;
    let mut len = 1usize;
    for &b in rest {
        if b == cur {
            len += 1;
        } else {
            v.push(len);
            cur = b;
            len = 1;
        }
    }
    v.push(len);
    v
}

/// Ширины run'ов строки вместе с цветом первого run'а.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RowRuns {
    pub widths: Vec<usize>,
    pub first_black: bool,
}

impl RowRuns {
    fn from_binary(row_bin: &[bool]) -> Self {
        Self {
            widths: runs(row_bin),
            first_black: row_bin.first().copied().unwrap_or(false),
        }
    }

    /// Run `i` - бар (чёрный)?
    #[inline]
    pub fn is_black(&self, i: usize) -> bool {
        (i % 2 == 0) == self.first_black
    }
}

/// Run-lengths строки: адаптивный порог, при слишком малом числе run'ов -
/// повтор с глобальным. `None`, если и там меньше `min_runs`.
pub fn row_runs(row: &[u8], min_runs: usize) -> Option<RowRuns> {
    let rr = RowRuns::from_binary(&binarize_row_adaptive(row));
    if rr.widths.len() >= min_runs {
        return Some(rr);
    }
    let rr = RowRuns::from_binary(&binarize_row(row));
    (rr.widths.len() >= min_runs).then_some(rr)
}

/// Привести ширины run'ов к «модулям» 1..=`max_module`.
/// Базовый модуль - нижний квартиль ширин (устойчиво к широким quiet-зонам).
pub fn normalize_modules(rl: &[usize], max_module: u8) -> Vec<u8> {
    if rl.is_empty() {
        return Vec::new();
    }
    let mut sorted = rl.to_vec();
    sorted.sort_unstable();
    let base = sorted[sorted.len() / 4].max(1);
    rl.iter()
        .map(|&w| ((w + base / 2) / base).clamp(1, max_module as usize) as u8)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bars(widths: &[usize], unit: usize) -> Vec<u8> {
        let mut px = Vec::new();
        for (i, &w) in widths.iter().enumerate() {
            let v = if i % 2 == 0 { 255 } else { 0 };
            px.extend(std::iter::repeat(v).take(w * unit));
        }
        px
    }

    #[test]
    fn runs_follow_color_changes() {
        let row = [false, false, true, true, true, false];
        assert_eq!(runs(&row), vec![2, 3, 1]);
        assert!(runs(&[]).is_empty());
    }

    #[test]
    fn adaptive_and_global_agree_on_clean_bars() {
        let row = bars(&[10, 1, 1, 2, 3, 1, 4, 1, 10], 3);
        assert_eq!(runs(&binarize_row_adaptive(&row)), runs(&binarize_row(&row)));
    }

    #[test]
    fn modules_are_rounded_to_unit() {
        let widths = [20, 2, 2, 4, 6, 2, 8, 2, 2, 20];
        assert_eq!(normalize_modules(&widths, 4), vec![4, 1, 1, 2, 3, 1, 4, 1, 1, 4]);
    }

    #[test]
    fn row_runs_keep_first_color() {
        let row = bars(&[10, 1, 1, 2, 3, 1, 4, 1, 10], 3);
        let rr = row_runs(&row, 5).expect("bars present");
        assert!(!rr.first_black);
        assert!(rr.is_black(1) && !rr.is_black(2));
    }

    #[test]
    fn row_runs_rejects_flat_rows() {
        assert_eq!(row_runs(&[255u8; 200], 10), None);
    }
}
