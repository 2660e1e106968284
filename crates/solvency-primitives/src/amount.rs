//! Arbitrary-precision amounts
//!
//! Balances are denominated in the smallest unit (wei-equivalent) and are
//! carried as big integers end to end. At every serialization boundary they
//! travel as decimal strings; inside hashes they use a fixed 32-byte
//! big-endian encoding.

use num_bigint::{BigInt, BigUint, Sign};
use num_traits::{Signed, Zero};
use std::fmt;
use std::ops::{Add, AddAssign};
use std::str::FromStr;
use thiserror::Error;

/// Width of the fixed amount encoding used in hashes
pub const AMOUNT_BYTES: usize = 32;

/// Sign byte for non-negative signed amounts
pub const SIGN_NON_NEGATIVE: u8 = 0x00;

/// Sign byte for negative signed amounts
pub const SIGN_NEGATIVE: u8 = 0x01;

/// Errors raised while parsing or encoding amounts
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AmountError {
    #[error("amount string is empty")]
    Empty,

    #[error("invalid decimal amount '{0}'")]
    InvalidDecimal(String),

    #[error("negative amount {0} where a non-negative amount is required")]
    Negative(String),

    #[error("amount {0} does not fit in 256 bits")]
    TooLarge(String),
}

/// A non-negative arbitrary-precision integer
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount(BigUint);

impl Amount {
    pub fn zero() -> Self {
        Self(BigUint::zero())
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn as_biguint(&self) -> &BigUint {
        &self.0
    }

    /// Parse a plain decimal string (ASCII digits only, no sign, no exponent)
    pub fn parse_decimal(s: &str) -> Result<Self, AmountError> {
        let signed = SignedAmount::parse_decimal(s)?;
        signed.to_amount()
    }

    /// Fixed 32-byte big-endian encoding
    pub fn to_be_bytes32(&self) -> Result<[u8; AMOUNT_BYTES], AmountError> {
        biguint_to_be_bytes32(&self.0)
    }

    /// Returns `None` if `other` is larger than `self`
    pub fn checked_sub(&self, other: &Amount) -> Option<Amount> {
        if other.0 > self.0 {
            None
        } else {
            Some(Amount(&self.0 - &other.0))
        }
    }

    pub fn to_signed(&self) -> SignedAmount {
        SignedAmount(BigInt::from_biguint(Sign::Plus, self.0.clone()))
    }
}

fn biguint_to_be_bytes32(value: &BigUint) -> Result<[u8; AMOUNT_BYTES], AmountError> {
    if value.bits() > (AMOUNT_BYTES as u64) * 8 {
        return Err(AmountError::TooLarge(value.to_string()));
    }
    let bytes = value.to_bytes_be();
    let mut out = [0u8; AMOUNT_BYTES];
    out[AMOUNT_BYTES - bytes.len()..].copy_from_slice(&bytes);
    Ok(out)
}

impl From<u64> for Amount {
    fn from(value: u64) -> Self {
        Self(BigUint::from(value))
    }
}

impl From<u128> for Amount {
    fn from(value: u128) -> Self {
        Self(BigUint::from(value))
    }
}

impl From<BigUint> for Amount {
    fn from(value: BigUint) -> Self {
        Self(value)
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_decimal(s)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Add<&Amount> for &Amount {
    type Output = Amount;

    fn add(self, rhs: &Amount) -> Amount {
        Amount(&self.0 + &rhs.0)
    }
}

impl Add for Amount {
    type Output = Amount;

    fn add(self, rhs: Amount) -> Amount {
        Amount(self.0 + rhs.0)
    }
}

impl AddAssign<&Amount> for Amount {
    fn add_assign(&mut self, rhs: &Amount) {
        self.0 += &rhs.0;
    }
}

impl<'a> std::iter::Sum<&'a Amount> for Amount {
    fn sum<I: Iterator<Item = &'a Amount>>(iter: I) -> Self {
        iter.fold(Amount::zero(), |mut acc, a| {
            acc += a;
            acc
        })
    }
}

impl std::iter::Sum for Amount {
    fn sum<I: Iterator<Item = Amount>>(iter: I) -> Self {
        iter.fold(Amount::zero(), |acc, a| acc + a)
    }
}

impl serde::Serialize for Amount {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> serde::Deserialize<'de> for Amount {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse_decimal(&s).map_err(serde::de::Error::custom)
    }
}

/// A signed arbitrary-precision integer (surpluses, debts)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct SignedAmount(BigInt);

impl SignedAmount {
    pub fn zero() -> Self {
        Self(BigInt::zero())
    }

    /// `lhs - rhs`, which may be negative
    pub fn difference(lhs: &Amount, rhs: &Amount) -> Self {
        Self(lhs.to_signed().0 - rhs.to_signed().0)
    }

    pub fn as_bigint(&self) -> &BigInt {
        &self.0
    }

    pub fn is_negative(&self) -> bool {
        self.0.is_negative()
    }

    /// Parse a decimal string with an optional leading `-`
    pub fn parse_decimal(s: &str) -> Result<Self, AmountError> {
        if s.is_empty() {
            return Err(AmountError::Empty);
        }
        let (negative, digits) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s),
        };
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(AmountError::InvalidDecimal(s.to_string()));
        }
        let magnitude = BigUint::parse_bytes(digits.as_bytes(), 10)
            .ok_or_else(|| AmountError::InvalidDecimal(s.to_string()))?;
        let sign = if negative { Sign::Minus } else { Sign::Plus };
        Ok(Self(BigInt::from_biguint(sign, magnitude)))
    }

    /// Convert to a non-negative amount, failing on negative values
    pub fn to_amount(&self) -> Result<Amount, AmountError> {
        match self.0.to_biguint() {
            Some(value) => Ok(Amount(value)),
            None => Err(AmountError::Negative(self.0.to_string())),
        }
    }

    /// Sign byte followed by the 32-byte big-endian magnitude
    pub fn to_signed_bytes33(&self) -> Result<[u8; AMOUNT_BYTES + 1], AmountError> {
        let magnitude = biguint_to_be_bytes32(self.0.magnitude())?;
        let mut out = [0u8; AMOUNT_BYTES + 1];
        out[0] = if self.is_negative() {
            SIGN_NEGATIVE
        } else {
            SIGN_NON_NEGATIVE
        };
        out[1..].copy_from_slice(&magnitude);
        Ok(out)
    }
}

impl From<Amount> for SignedAmount {
    fn from(value: Amount) -> Self {
        Self(BigInt::from_biguint(Sign::Plus, value.0))
    }
}

impl From<i64> for SignedAmount {
    fn from(value: i64) -> Self {
        Self(BigInt::from(value))
    }
}

impl FromStr for SignedAmount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_decimal(s)
    }
}

impl fmt::Display for SignedAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl serde::Serialize for SignedAmount {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> serde::Deserialize<'de> for SignedAmount {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse_decimal(&s).map_err(serde::de::Error::custom)
    }
}
