//! Нормализация GTIN: каноническая (по возможности EAN-13) форма плюс алиасы.
//!
//! EAN-13 с ведущим нулём и UPC-A - одно и то же значение; UPC-E - сжатая
//! запись UPC-A. Стабилизатор складывает все эти формы в одного кандидата.

use std::collections::BTreeSet;

use crate::checksum::{ean13_checksum, expand_upce};
use crate::core::Symbology;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NormalizedGtin {
    pub primary: String,
    /// Инвариант: `primary` здесь никогда не лежит.
    pub aliases: BTreeSet<String>,
}

impl NormalizedGtin {
    fn new(primary: impl Into<String>, aliases: impl IntoIterator<Item = String>) -> Self {
        let primary = primary.into();
        let aliases = aliases.into_iter().filter(|a| *a != primary).collect();
        Self { primary, aliases }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.primary.is_empty()
    }

    /// Все представления: сначала основное, затем алиасы.
    pub fn forms(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.primary.as_str()).chain(self.aliases.iter().map(String::as_str))
    }
}

fn all_digits(s: &str) -> bool {
    s.bytes().all(|b| b.is_ascii_digit())
}

/// `0` + 12 цифр → 12-значная UPC-A форма.
pub fn ean13_to_upca(ean13: &str) -> Option<String> {
    (ean13.len() == 13 && ean13.starts_with('0') && all_digits(ean13)).then(|| ean13[1..].to_string())
}

/// UPC-A → EAN-13 с ведущим нулём и пересчитанной контрольной цифрой.
pub fn upca_to_ean13(upca: &str) -> Option<String> {
    if upca.len() != 12 || !all_digits(upca) {
        return None;
    }
    let mut out = String::with_capacity(13);
    out.push('0');
    out.push_str(&upca[..11]);
    let check = ean13_checksum(&out)?;
    out.push(char::from(b'0' + check));
    Some(out)
}

pub fn normalize(symbology: Symbology, code: &str) -> NormalizedGtin {
    if code.is_empty() {
        return NormalizedGtin::default();
    }
    match symbology {
        Symbology::Ean13 => NormalizedGtin::new(code, ean13_to_upca(code)),
        Symbology::UpcA => match upca_to_ean13(code) {
            Some(ean) => NormalizedGtin::new(ean, [code.to_string()]),
            None => NormalizedGtin::new(code, None::<String>),
        },
        Symbology::UpcE => {
            let Some(expanded) = expand_upce(code) else {
                return NormalizedGtin::new(code, None::<String>);
            };
            let primary = upca_to_ean13(&expanded).unwrap_or_else(|| expanded.clone());
            NormalizedGtin::new(primary, [expanded, code.to_string()])
        }
        Symbology::Ean8 | Symbology::Code128 => NormalizedGtin::new(code, None::<String>),
    }
}

/// Определить символику по строке формата от движка, а если она не
/// распознана - по длине кода.
pub fn infer_symbology(format_hint: &str, code: &str) -> Symbology {
    let fmt = format_hint.to_ascii_lowercase();
    if fmt.contains("ean_8") {
        return Symbology::Ean8;
    }
    if fmt.contains("ean") {
        return Symbology::Ean13;
    }
    if fmt.contains("upc_e") {
        return Symbology::UpcE;
    }
    if fmt.contains("upc") {
        return Symbology::UpcA;
    }
    if fmt.contains("code_128") {
        return Symbology::Code128;
    }
    match code.len() {
        8 => Symbology::Ean8,
        12 => Symbology::UpcA,
        13 => Symbology::Ean13,
        _ => Symbology::Code128,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn ean13_with_leading_zero_gets_upca_alias() {
        let n = normalize(Symbology::Ean13, "0123456789012");
        assert_eq!(n.primary, "0123456789012");
        assert!(n.aliases.contains("123456789012"));
    }

    #[test]
    fn ean13_without_leading_zero_has_no_alias() {
        let n = normalize(Symbology::Ean13, "4006381333931");
        assert_eq!(n.primary, "4006381333931");
        assert!(n.aliases.is_empty());
    }

    #[test]
    fn upca_maps_to_ean13_primary() {
        let n = normalize(Symbology::UpcA, "036000291452");
        assert_eq!(n.primary, "0036000291452");
        assert_eq!(n.aliases.iter().collect::<Vec<_>>(), vec!["036000291452"]);
    }

    #[test]
    fn upce_expands_into_aliases() {
        let n = normalize(Symbology::UpcE, "04210005");
        assert!(n.aliases.contains("042100000050"));
        assert!(n.aliases.contains("04210005"));
        assert_eq!(n.primary.len(), 13);
        assert!(n.primary.starts_with("004210000005"));
        assert!(!n.aliases.contains(&n.primary));
    }

    #[test]
    fn malformed_upce_stays_as_is() {
        let n = normalize(Symbology::UpcE, "042100");
        assert_eq!(n.primary, "042100");
        assert!(n.aliases.is_empty());
    }

    #[test]
    fn malformed_upca_never_aliases_itself() {
        let n = normalize(Symbology::UpcA, "12345");
        assert_eq!(n.primary, "12345");
        assert!(n.aliases.is_empty());
    }

    #[test_case(Symbology::Ean8, "55123457")]
    #[test_case(Symbology::Code128, "HELLO-128")]
    fn passthrough_symbologies(sym: Symbology, code: &str) {
        let n = normalize(sym, code);
        assert_eq!(n.primary, code);
        assert!(n.aliases.is_empty());
    }

    #[test]
    fn empty_input_is_empty() {
        for sym in Symbology::ALL {
            assert!(normalize(sym, "").is_empty());
        }
    }

    #[test_case("upc_a", "123456789012", Symbology::UpcA)]
    #[test_case("ean", "0001234567890", Symbology::Ean13)]
    #[test_case("", "55123457", Symbology::Ean8)]
    #[test_case("EAN_8", "0001234567890", Symbology::Ean8 ; "hint beats length")]
    #[test_case("ean_13", "55123457", Symbology::Ean13 ; "ean13 hint")]
    #[test_case("UPC_E", "04210005", Symbology::UpcE ; "upce hint")]
    #[test_case("code_128", "4006381333931", Symbology::Code128 ; "code128 hint")]
    #[test_case("qr_code", "4006381333931", Symbology::Ean13 ; "unknown hint length 13")]
    #[test_case("", "123456789012", Symbology::UpcA ; "length 12")]
    #[test_case("", "ABC-1", Symbology::Code128 ; "fallback")]
    fn inference(hint: &str, code: &str, expected: Symbology) {
        assert_eq!(infer_symbology(hint, code), expected);
    }
}
