//! Resource quantities
//!
//! A small, exact implementation of the Kubernetes quantity grammar. Values
//! are stored as a signed count of nano-units, which is enough to represent
//! everything from `1n` up to `8Ei` without loss. Finer precision is rounded
//! up to the next nano-unit, matching the API server.

use regex::Regex;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use std::sync::OnceLock;
use thiserror::Error;

/// Grammar every quantity string must match
pub const QUANTITY_PATTERN: &str = r"^([+-]?[0-9.]+)([eEinumkKMGTP]*[-+]?[0-9]*)$";

/// Nano-units per whole unit
const NANOS_PER_UNIT: i128 = 1_000_000_000;

/// Nano-units per milli-unit
pub(crate) const NANOS_PER_MILLI: i128 = 1_000_000;

/// Binary suffixes with their power-of-two shift, smallest first
const BINARY_SUFFIXES: &[(&str, u32)] = &[
    ("Ki", 10),
    ("Mi", 20),
    ("Gi", 30),
    ("Ti", 40),
    ("Pi", 50),
    ("Ei", 60),
];

/// Decimal SI suffixes with their base-10 exponent, smallest first
const DECIMAL_SUFFIXES: &[(&str, i32)] = &[
    ("n", -9),
    ("u", -6),
    ("m", -3),
    ("", 0),
    ("k", 3),
    ("M", 6),
    ("G", 9),
    ("T", 12),
    ("P", 15),
    ("E", 18),
];

static QUANTITY_REGEX: OnceLock<Regex> = OnceLock::new();

fn quantity_regex() -> &'static Regex {
    QUANTITY_REGEX.get_or_init(|| Regex::new(QUANTITY_PATTERN).expect("quantity pattern is valid"))
}

/// Reason a quantity string was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum QuantityError {
    #[error("quantities must match the regular expression '^([+-]?[0-9.]+)([eEinumkKMGTP]*[-+]?[0-9]*)$'")]
    Format,
    #[error("unable to parse numeric part of quantity")]
    Numeric,
    #[error("unable to parse quantity's suffix")]
    Suffix,
    #[error("quantity is too large")]
    OutOfRange,
}

/// How a quantity was written, used to pick its canonical rendering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuantityFormat {
    /// Powers of two, e.g. `30Mi`
    BinarySI,
    /// Powers of ten with SI suffixes, e.g. `250m` or `1k`
    DecimalSI,
    /// Powers of ten with an exponent, e.g. `1e3`
    DecimalExponent,
}

#[derive(Debug, Clone, Copy)]
enum Suffix {
    Binary(u32),
    Decimal(i32),
    Exponent(i32),
}

impl Suffix {
    fn parse(raw: &str) -> Result<Self, QuantityError> {
        if let Some((_, shift)) = BINARY_SUFFIXES.iter().find(|(s, _)| *s == raw) {
            return Ok(Suffix::Binary(*shift));
        }
        if let Some((_, exp)) = DECIMAL_SUFFIXES.iter().find(|(s, _)| *s == raw) {
            return Ok(Suffix::Decimal(*exp));
        }
        if let Some(exp) = raw.strip_prefix(&['e', 'E'][..]) {
            return exp
                .parse::<i32>()
                .map(Suffix::Exponent)
                .map_err(|_| QuantityError::Suffix);
        }
        Err(QuantityError::Suffix)
    }

    fn format(self) -> QuantityFormat {
        match self {
            Suffix::Binary(_) => QuantityFormat::BinarySI,
            Suffix::Decimal(_) => QuantityFormat::DecimalSI,
            Suffix::Exponent(_) => QuantityFormat::DecimalExponent,
        }
    }
}

/// An exact resource quantity such as `256Mi`, `.5` or `200m`
///
/// Equality, ordering and hashing only look at the numeric value, so
/// `2000m == 2` even though the two render differently.
#[derive(Debug, Clone, Copy)]
pub struct Quantity {
    nanos: i128,
    format: QuantityFormat,
}

impl Quantity {
    /// Parse a quantity string
    pub fn parse(raw: &str) -> Result<Self, QuantityError> {
        let caps = quantity_regex()
            .captures(raw)
            .ok_or(QuantityError::Format)?;
        let number = caps.get(1).map_or("", |m| m.as_str());
        let suffix = Suffix::parse(caps.get(2).map_or("", |m| m.as_str()))?;

        let (negative, mantissa, frac_digits) = parse_number(number)?;
        let magnitude = scale_to_nanos(mantissa, frac_digits, suffix)?;

        Ok(Self {
            nanos: if negative { -magnitude } else { magnitude },
            format: suffix.format(),
        })
    }

    /// Build a quantity from milli-units, e.g. milli-cores
    pub fn from_millis(millis: i128) -> Self {
        Self {
            nanos: millis.saturating_mul(NANOS_PER_MILLI),
            format: QuantityFormat::DecimalSI,
        }
    }

    pub fn format(&self) -> QuantityFormat {
        self.format
    }

    pub fn is_zero(&self) -> bool {
        self.nanos == 0
    }

    /// Exact value in nano-units
    pub(crate) fn nanos(&self) -> i128 {
        self.nanos
    }

    /// Value in milli-units, rounded up
    pub fn milli_value_ceil(&self) -> i128 {
        div_ceil(self.nanos, NANOS_PER_MILLI)
    }

    /// Value in whole units, rounded up
    pub fn value_ceil(&self) -> i128 {
        div_ceil(self.nanos, NANOS_PER_UNIT)
    }

    fn render_binary(&self) -> Option<String> {
        if self.nanos % NANOS_PER_UNIT != 0 {
            return None;
        }
        let whole = self.nanos / NANOS_PER_UNIT;
        BINARY_SUFFIXES.iter().rev().find_map(|(suffix, shift)| {
            let multiple = 1i128 << shift;
            (whole.abs() >= multiple && whole % multiple == 0)
                .then(|| format!("{}{}", whole / multiple, suffix))
        })
    }

    /// Largest power-of-1000 bucket that divides the value evenly
    fn decimal_parts(&self) -> (i128, &'static str, i32) {
        for (suffix, exp) in DECIMAL_SUFFIXES.iter().rev() {
            let Some(divisor) = pow10((exp + 9) as u32) else {
                continue;
            };
            if self.nanos % divisor == 0 {
                return (self.nanos / divisor, suffix, *exp);
            }
        }
        (self.nanos, "n", -9)
    }
}

fn parse_number(number: &str) -> Result<(bool, i128, u32), QuantityError> {
    let (negative, unsigned) = match number.as_bytes().first() {
        Some(b'-') => (true, &number[1..]),
        Some(b'+') => (false, &number[1..]),
        _ => (false, number),
    };

    let (whole, frac) = match unsigned.split_once('.') {
        Some((whole, frac)) => (whole, frac),
        None => (unsigned, ""),
    };
    if (whole.is_empty() && frac.is_empty()) || frac.contains('.') {
        return Err(QuantityError::Numeric);
    }

    let digits = format!("{whole}{frac}");
    let significant = digits.trim_start_matches('0');
    let mantissa = if significant.is_empty() {
        0
    } else {
        significant
            .parse::<i128>()
            .map_err(|_| QuantityError::OutOfRange)?
    };

    Ok((negative, mantissa, frac.len() as u32))
}

fn scale_to_nanos(mantissa: i128, frac_digits: u32, suffix: Suffix) -> Result<i128, QuantityError> {
    let (mantissa, exp10) = match suffix {
        Suffix::Binary(shift) => {
            let scaled = mantissa
                .checked_mul(1i128 << shift)
                .ok_or(QuantityError::OutOfRange)?;
            (scaled, 0)
        }
        Suffix::Decimal(exp) | Suffix::Exponent(exp) => (mantissa, exp),
    };

    let exp10 = exp10 as i64 + 9 - frac_digits as i64;
    if exp10 >= 0 {
        let factor = u32::try_from(exp10)
            .ok()
            .and_then(pow10)
            .ok_or(QuantityError::OutOfRange)?;
        return mantissa
            .checked_mul(factor)
            .ok_or(QuantityError::OutOfRange);
    }

    match u32::try_from(-exp10).ok().and_then(pow10) {
        Some(divisor) => Ok(div_ceil(mantissa, divisor)),
        // Smaller than a nano-unit: anything non-zero rounds up to one.
        None => Ok(i128::from(mantissa != 0)),
    }
}

fn pow10(exp: u32) -> Option<i128> {
    10i128.checked_pow(exp)
}

/// Ceiling division for a positive divisor
pub(crate) fn div_ceil(value: i128, divisor: i128) -> i128 {
    value.div_euclid(divisor) + i128::from(value.rem_euclid(divisor) != 0)
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.nanos == 0 {
            return f.write_str("0");
        }
        if self.format == QuantityFormat::BinarySI {
            if let Some(rendered) = self.render_binary() {
                return f.write_str(&rendered);
            }
        }

        let (mantissa, suffix, exp) = self.decimal_parts();
        match self.format {
            QuantityFormat::DecimalExponent if exp != 0 => write!(f, "{mantissa}e{exp}"),
            QuantityFormat::DecimalExponent => write!(f, "{mantissa}"),
            _ => write!(f, "{mantissa}{suffix}"),
        }
    }
}

impl FromStr for Quantity {
    type Err = QuantityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl PartialEq for Quantity {
    fn eq(&self, other: &Self) -> bool {
        self.nanos == other.nanos
    }
}

impl Eq for Quantity {}

impl PartialOrd for Quantity {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Quantity {
    fn cmp(&self, other: &Self) -> Ordering {
        self.nanos.cmp(&other.nanos)
    }
}

impl Hash for Quantity {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.nanos.hash(state);
    }
}

impl Serialize for Quantity {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Quantity {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct QuantityVisitor;

        impl Visitor<'_> for QuantityVisitor {
            type Value = Quantity;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a quantity string such as \"256Mi\" or a number")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Quantity, E> {
                Quantity::parse(v).map_err(|e| E::custom(format!("{v}: {e}")))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Quantity, E> {
                self.visit_str(&v.to_string())
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Quantity, E> {
                self.visit_str(&v.to_string())
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<Quantity, E> {
                self.visit_str(&v.to_string())
            }
        }

        deserializer.deserialize_any(QuantityVisitor)
    }
}

/// Convert a legacy CF size such as `30M` or `1GB` into its binary SI form
///
/// The legacy dialect writes `M` and `MB` for mebibytes, so a bare decimal
/// multiplier gets an `i` appended. Anything else passes through unchanged
/// and is rejected later, when it's parsed.
pub fn cf_to_si_units(raw: &str) -> String {
    let unit_part = raw.strip_suffix('B').unwrap_or(raw);
    match unit_part.chars().last() {
        Some('T' | 'G' | 'M' | 'K') => format!("{unit_part}i"),
        _ => raw.to_string(),
    }
}
