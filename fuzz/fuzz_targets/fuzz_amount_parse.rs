//! Fuzz target for decimal amount parsing
//!
//! This target ensures:
//! 1. Parsing never panics
//! 2. Accepted amounts print back to the same canonical digits
//! 3. The 32-byte encoding fails only above 256 bits

#![no_main]

use libfuzzer_sys::fuzz_target;
use solvency_primitives::{Amount, SignedAmount};

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    if let Ok(amount) = Amount::parse_decimal(text) {
        let printed = amount.to_string();
        assert_eq!(Amount::parse_decimal(&printed).unwrap(), amount);
        assert!(printed.bytes().all(|b| b.is_ascii_digit()));
        if amount.as_biguint().bits() <= 256 {
            assert!(amount.to_be_bytes32().is_ok());
        } else {
            assert!(amount.to_be_bytes32().is_err());
        }
    }

    if let Ok(signed) = SignedAmount::parse_decimal(text) {
        assert_eq!(signed.to_amount().is_ok(), !signed.is_negative());
    }
});
