//! Arbitrary-magnitude number used for every economy value.
//!
//! Idle progression multiplies rewards chapter after chapter, so gold and
//! stat values leave the `f64` range quickly. [`BigNumber`] keeps a signed
//! mantissa in `[1, 10)` and a base-10 `i64` exponent, trading precision
//! beyond ~15 significant digits for an effectively unbounded range.
//!
//! ```
//! use runner_core::BigNumber;
//!
//! let gold: BigNumber = "1.5e300".parse().unwrap();
//! let doubled = gold * BigNumber::from(2u32) * BigNumber::from(1e300);
//! assert_eq!(doubled.exponent(), 600);
//! ```

use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, AddAssign, Mul, MulAssign, Neg, Sub, SubAssign};
use std::str::FromStr;

use thiserror::Error;

/// Exponent gap past which the smaller operand no longer affects a sum.
const PRECISION_DIGITS: i64 = 17;

/// Largest integer-part length parsed directly as `f64`.
const MAX_DIRECT_DIGITS: usize = 17;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid number literal: {input:?}")]
pub struct NumberParseError {
    pub input: String,
}

/// Signed `mantissa × 10^exponent` with `1 <= |mantissa| < 10`, or zero.
#[derive(Clone, Copy, Debug)]
pub struct BigNumber {
    mantissa: f64,
    exponent: i64,
}

impl BigNumber {
    pub const ZERO: Self = Self {
        mantissa: 0.0,
        exponent: 0,
    };

    pub const ONE: Self = Self {
        mantissa: 1.0,
        exponent: 0,
    };

    /// Builds a value from raw parts, normalizing the mantissa.
    pub fn from_parts(mantissa: f64, exponent: i64) -> Self {
        Self::normalize(mantissa, exponent)
    }

    pub fn mantissa(&self) -> f64 {
        self.mantissa
    }

    pub fn exponent(&self) -> i64 {
        self.exponent
    }

    pub fn is_zero(&self) -> bool {
        self.mantissa == 0.0
    }

    pub fn is_positive(&self) -> bool {
        self.mantissa > 0.0
    }

    pub fn is_negative(&self) -> bool {
        self.mantissa < 0.0
    }

    pub fn abs(self) -> Self {
        Self {
            mantissa: self.mantissa.abs(),
            exponent: self.exponent,
        }
    }

    /// Truncates toward negative infinity.
    pub fn floor(self) -> Self {
        if self.exponent >= PRECISION_DIGITS {
            return self;
        }
        if self.exponent < 0 {
            return if self.is_negative() {
                Self::from(-1.0)
            } else {
                Self::ZERO
            };
        }
        Self::from(self.to_f64().floor())
    }

    /// Division, `None` when `rhs` is zero.
    pub fn checked_div(self, rhs: Self) -> Option<Self> {
        if rhs.is_zero() {
            return None;
        }
        Some(Self::normalize(
            self.mantissa / rhs.mantissa,
            self.exponent - rhs.exponent,
        ))
    }

    /// Raises to a real power. `None` for results that are not real numbers
    /// (negative base with fractional power, zero to a negative power).
    pub fn checked_pow(self, power: f64) -> Option<Self> {
        if !power.is_finite() {
            return None;
        }
        if power == 0.0 {
            return Some(Self::ONE);
        }
        if self.is_zero() {
            return if power > 0.0 { Some(Self::ZERO) } else { None };
        }

        if power.fract() == 0.0 && power.abs() <= i32::MAX as f64 {
            // Square-and-multiply keeps integral powers exact where f64 allows.
            let mut result = Self::ONE;
            let mut base = self;
            let mut n = power.abs() as u64;
            while n > 0 {
                if n & 1 == 1 {
                    result *= base;
                }
                base *= base;
                n >>= 1;
            }
            return if power < 0.0 {
                Self::ONE.checked_div(result)
            } else {
                Some(result)
            };
        }
        if self.is_negative() {
            return None;
        }

        let log = (self.mantissa.log10() + self.exponent as f64) * power;
        if !log.is_finite() {
            return None;
        }
        let exponent = log.floor();
        Some(Self::normalize(10f64.powf(log - exponent), exponent as i64))
    }

    /// Narrows to `f64`, saturating at the finite range.
    pub fn to_f64(&self) -> f64 {
        if self.is_zero() {
            return 0.0;
        }
        if self.exponent > f64::MAX_10_EXP as i64 {
            return if self.is_negative() { f64::MIN } else { f64::MAX };
        }
        if self.exponent < f64::MIN_10_EXP as i64 - PRECISION_DIGITS {
            return 0.0;
        }
        let value = self.mantissa * 10f64.powi(self.exponent as i32);
        if value.is_finite() {
            value
        } else if self.is_negative() {
            f64::MIN
        } else {
            f64::MAX
        }
    }

    /// Narrows to `f32` for percentages, speeds and other small stats.
    pub fn to_f32(&self) -> f32 {
        self.to_f64().clamp(f32::MIN as f64, f32::MAX as f64) as f32
    }

    fn normalize(mantissa: f64, exponent: i64) -> Self {
        if mantissa == 0.0 || !mantissa.is_finite() {
            return Self::ZERO;
        }

        let shift = mantissa.abs().log10().floor() as i64;
        // Two steps: 10^shift alone under- or overflows at the subnormal end.
        let half = (shift / 2) as i32;
        let mut mantissa = mantissa / 10f64.powi(half) / 10f64.powi(shift as i32 - half);
        let mut exponent = exponent.saturating_add(shift);

        // log10 rounding can leave the mantissa one step outside [1, 10).
        if mantissa.abs() >= 10.0 {
            mantissa /= 10.0;
            exponent = exponent.saturating_add(1);
        } else if mantissa.abs() < 1.0 {
            mantissa *= 10.0;
            exponent = exponent.saturating_sub(1);
        }

        Self { mantissa, exponent }
    }

    fn parse_literal(input: &str) -> Option<Self> {
        let trimmed = input.trim();
        let (negative, body) = match trimmed.as_bytes().first()? {
            b'-' => (true, &trimmed[1..]),
            b'+' => (false, &trimmed[1..]),
            _ => (false, trimmed),
        };

        let (digits, exp_part) = match body.find(['e', 'E']) {
            Some(idx) => (&body[..idx], Some(&body[idx + 1..])),
            None => (body, None),
        };
        let extra_exponent = match exp_part {
            Some(exp) => exp.parse::<i64>().ok()?,
            None => 0,
        };

        let (int_part, frac_part) = match digits.split_once('.') {
            Some((int_part, frac_part)) => (int_part, frac_part),
            None => (digits, ""),
        };
        if int_part.is_empty() && frac_part.is_empty() {
            return None;
        }
        if !int_part.bytes().chain(frac_part.bytes()).all(|b| b.is_ascii_digit()) {
            return None;
        }

        let int_part = int_part.trim_start_matches('0');
        let (mantissa, shift) = if int_part.len() > MAX_DIRECT_DIGITS {
            let head = &int_part[..MAX_DIRECT_DIGITS];
            let mantissa = head.parse::<f64>().ok()?;
            (mantissa, (int_part.len() - MAX_DIRECT_DIGITS) as i64)
        } else {
            let int_part = if int_part.is_empty() { "0" } else { int_part };
            let literal = if frac_part.is_empty() {
                int_part.to_owned()
            } else {
                format!("{int_part}.{frac_part}")
            };
            (literal.parse::<f64>().ok()?, 0)
        };

        let mantissa = if negative { -mantissa } else { mantissa };
        Some(Self::normalize(
            mantissa,
            shift.saturating_add(extra_exponent),
        ))
    }
}

impl Default for BigNumber {
    fn default() -> Self {
        Self::ZERO
    }
}

impl From<f64> for BigNumber {
    fn from(value: f64) -> Self {
        Self::normalize(value, 0)
    }
}

impl From<f32> for BigNumber {
    fn from(value: f32) -> Self {
        Self::normalize(value as f64, 0)
    }
}

impl From<u32> for BigNumber {
    fn from(value: u32) -> Self {
        Self::normalize(value as f64, 0)
    }
}

impl From<i64> for BigNumber {
    fn from(value: i64) -> Self {
        Self::normalize(value as f64, 0)
    }
}

impl FromStr for BigNumber {
    type Err = NumberParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_literal(s).ok_or_else(|| NumberParseError {
            input: s.to_owned(),
        })
    }
}

impl PartialEq for BigNumber {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for BigNumber {}

impl PartialOrd for BigNumber {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for BigNumber {
    fn cmp(&self, other: &Self) -> Ordering {
        let sign = |n: &Self| n.mantissa.partial_cmp(&0.0).unwrap_or(Ordering::Equal);
        match sign(self).cmp(&sign(other)) {
            Ordering::Equal => {}
            unequal => return unequal,
        }
        if self.is_zero() {
            return Ordering::Equal;
        }

        let magnitude = self
            .exponent
            .cmp(&other.exponent)
            .then_with(|| {
                self.mantissa
                    .abs()
                    .partial_cmp(&other.mantissa.abs())
                    .unwrap_or(Ordering::Equal)
            });
        if self.is_negative() {
            magnitude.reverse()
        } else {
            magnitude
        }
    }
}

impl Neg for BigNumber {
    type Output = Self;

    fn neg(self) -> Self {
        Self {
            mantissa: -self.mantissa,
            exponent: self.exponent,
        }
    }
}

impl Add for BigNumber {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        if self.is_zero() {
            return rhs;
        }
        if rhs.is_zero() {
            return self;
        }

        let (big, small) = if self.exponent >= rhs.exponent {
            (self, rhs)
        } else {
            (rhs, self)
        };
        let gap = big.exponent - small.exponent;
        if gap > PRECISION_DIGITS {
            return big;
        }
        let mantissa = big.mantissa + small.mantissa / 10f64.powi(gap as i32);
        Self::normalize(mantissa, big.exponent)
    }
}

impl AddAssign for BigNumber {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sub for BigNumber {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        self + (-rhs)
    }
}

impl SubAssign for BigNumber {
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl Mul for BigNumber {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        if self.is_zero() || rhs.is_zero() {
            return Self::ZERO;
        }
        Self::normalize(
            self.mantissa * rhs.mantissa,
            self.exponent.saturating_add(rhs.exponent),
        )
    }
}

impl MulAssign for BigNumber {
    fn mul_assign(&mut self, rhs: Self) {
        *self = *self * rhs;
    }
}

impl Mul<f64> for BigNumber {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self {
        self * Self::from(rhs)
    }
}

impl Mul<f32> for BigNumber {
    type Output = Self;

    fn mul(self, rhs: f32) -> Self {
        self * Self::from(rhs)
    }
}

impl MulAssign<f32> for BigNumber {
    fn mul_assign(&mut self, rhs: f32) {
        *self = *self * rhs;
    }
}

impl std::iter::Sum for BigNumber {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl fmt::Display for BigNumber {
    /// Plain notation below one million, `m.mme<exp>` above. The formatter's
    /// precision sets the fractional digits (default 2).
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let precision = f.precision().unwrap_or(2);
        if (-3..6).contains(&self.exponent) || self.is_zero() {
            let plain = format!("{:.*}", precision, self.to_f64());
            let plain = if plain.contains('.') {
                plain.trim_end_matches('0').trim_end_matches('.')
            } else {
                plain.as_str()
            };
            f.write_str(plain)
        } else {
            write!(f, "{:.*}e{}", precision, self.mantissa, self.exponent)
        }
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for BigNumber {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("{}e{}", self.mantissa, self.exponent))
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for BigNumber {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        use serde::de::{self, Visitor};

        struct BigNumberVisitor;

        impl Visitor<'_> for BigNumberVisitor {
            type Value = BigNumber;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a number or a numeric string such as \"1.5e42\"")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<BigNumber, E> {
                v.parse().map_err(E::custom)
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<BigNumber, E> {
                Ok(BigNumber::from(v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<BigNumber, E> {
                Ok(BigNumber::from(v))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<BigNumber, E> {
                Ok(BigNumber::from(v as f64))
            }
        }

        deserializer.deserialize_any(BigNumberVisitor)
    }
}
