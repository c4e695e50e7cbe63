// tests/checksum_props.rs
//
// Свойства контрольных сумм и нормализации на случайных цифрах.

use barscan::checksum::{
    ean13_checksum, ean8_checksum, is_valid_barcode, upca_checksum, validate_ean13, validate_ean8, validate_upca,
};
use barscan::gtin::{normalize, upca_to_ean13};
use barscan::Symbology;
use proptest::prelude::*;

fn with_check(body: &str, check: u8) -> String {
    format!("{body}{check}")
}

proptest! {
    #[test]
    fn computed_check_digit_validates(body in "[0-9]{12}") {
        let check = ean13_checksum(&body).expect("12 digits");
        prop_assert!(validate_ean13(&with_check(&body, check)));
        prop_assert!(is_valid_barcode(&with_check(&body, check)));
    }

    #[test]
    fn wrong_check_digit_fails(body in "[0-9]{12}", delta in 1u8..10) {
        let check = ean13_checksum(&body).expect("12 digits");
        let wrong = (check + delta) % 10;
        prop_assert!(!is_valid_barcode(&with_check(&body, wrong)));
    }

    #[test]
    fn ean8_and_upca_check_digits(b7 in "[0-9]{7}", b11 in "[0-9]{11}") {
        let c8 = ean8_checksum(&b7).expect("7 digits");
        prop_assert!(is_valid_barcode(&with_check(&b7, c8)));
        let c12 = upca_checksum(&b11).expect("11 digits");
        prop_assert!(is_valid_barcode(&with_check(&b11, c12)));
    }

    #[test]
    fn wrong_ean8_check_digit_fails(body in "[0-9]{7}", delta in 1u8..10) {
        let wrong = (ean8_checksum(&body).expect("7 digits") + delta) % 10;
        prop_assert!(!validate_ean8(&with_check(&body, wrong)));
        prop_assert!(!is_valid_barcode(&with_check(&body, wrong)));
    }

    #[test]
    fn wrong_upca_check_digit_fails(body in "[0-9]{11}", delta in 1u8..10) {
        let wrong = (upca_checksum(&body).expect("11 digits") + delta) % 10;
        prop_assert!(!validate_upca(&with_check(&body, wrong)));
        prop_assert!(!is_valid_barcode(&with_check(&body, wrong)));
    }

    #[test]
    fn valid_upca_widens_to_valid_ean13(b11 in "[0-9]{11}") {
        let upca = with_check(&b11, upca_checksum(&b11).expect("11 digits"));
        let ean = upca_to_ean13(&upca).expect("12 digits");
        prop_assert_eq!(&ean[1..], upca.as_str());
        prop_assert!(validate_ean13(&ean));

        let n = normalize(Symbology::UpcA, &upca);
        prop_assert_eq!(&n.primary, &ean);
        prop_assert!(!n.aliases.contains(&n.primary));
    }

    #[test]
    fn arbitrary_text_never_panics(s in "\\PC{0,20}") {
        let _ = is_valid_barcode(&s);
        for sym in Symbology::ALL {
            let n = normalize(sym, &s);
            prop_assert!(!n.aliases.contains(&n.primary));
        }
    }
}
