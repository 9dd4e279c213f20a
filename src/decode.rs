//! Decoding of share records into interpolation points.
//!
//! A record carries its index as a base-10 string and its value as a digit
//! string in a declared radix between 2 and 36. Digits past `9` are letters,
//! matched case-insensitively.
use num_bigint::BigInt;
use serde::Deserialize;

use crate::{sort_points, Point, SssError};

pub const MIN_BASE: u32 = 2;
pub const MAX_BASE: u32 = 36;

/// One distributed share as read from a record store
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ShareRecord {
    /// Radix of `value`, as a base-10 string
    pub base: String,
    /// Digits of the share value in `base`
    pub value: String,
}

impl ShareRecord {
    /// Creates a record from its base and digit strings
    pub fn new(base: impl Into<String>, value: impl Into<String>) -> Self {
        ShareRecord {
            base: base.into(),
            value: value.into(),
        }
    }
}

/// Decodes `(index, record)` pairs into points sorted ascending by `x`.
///
/// Fails on the first malformed record, and with `SssError::DuplicateIndex` when
/// two indices name the same integer (`"1"` and `"01"` included).
///
/// # Example
/// ```
/// # use num_bigint::BigInt;
/// # use shamir_reconstruct::{decode_points, ShareRecord};
/// let records = vec![
///     ("3".to_string(), ShareRecord::new("16", "c")),
///     ("2".to_string(), ShareRecord::new("2", "111")),
/// ];
/// let points = decode_points(records.iter().map(|(i, r)| (i.as_str(), r))).unwrap();
/// assert_eq!(points[0].x, 2);
/// assert_eq!(points[0].y, BigInt::from(7));
/// assert_eq!(points[1].y, BigInt::from(12));
/// ```
pub fn decode_points<'a, I>(records: I) -> Result<Vec<Point>, SssError>
where
    I: IntoIterator<Item = (&'a str, &'a ShareRecord)>,
{
    let points = records
        .into_iter()
        .map(|(index, record)| decode_point(index, record))
        .collect::<Result<Vec<_>, _>>()?;

    let points = sort_points(points)?;
    log::debug!("decoded {} share points", points.len());
    Ok(points)
}

/// Decodes a single record keyed by `index`; does not check for duplicates.
pub fn decode_point(index: &str, record: &ShareRecord) -> Result<Point, SssError> {
    let x = parse_index(index)?;
    let base = parse_base(index, &record.base)?;
    let y = parse_value(index, base, &record.value)?;

    Ok(Point { x, y })
}

/// Parses a share index as a base-10 signed integer
pub fn parse_index(index: &str) -> Result<i64, SssError> {
    index.parse().map_err(|_| SssError::MalformedIndex {
        index: index.to_owned(),
    })
}

/// Parses a declared radix, accepting only 2..=36
pub fn parse_base(index: &str, base: &str) -> Result<u32, SssError> {
    base.parse::<u32>()
        .ok()
        .filter(|radix| (MIN_BASE..=MAX_BASE).contains(radix))
        .ok_or_else(|| SssError::InvalidBase {
            index: index.to_owned(),
            base: base.to_owned(),
        })
}

/// Parses an optionally signed digit string in `base`.
///
/// Unlike `BigInt::parse_bytes`, underscores are rejected: every character after
/// the sign must be a digit of the radix. A radix outside 2..=36 is reported as
/// `SssError::InvalidBase`.
pub fn parse_value(index: &str, base: u32, value: &str) -> Result<BigInt, SssError> {
    if !(MIN_BASE..=MAX_BASE).contains(&base) {
        return Err(SssError::InvalidBase {
            index: index.to_owned(),
            base: base.to_string(),
        });
    }

    let invalid = |position| SssError::InvalidDigitString {
        index: index.to_owned(),
        base,
        position,
    };

    let digits = value
        .strip_prefix(|c: char| c == '+' || c == '-')
        .unwrap_or(value);
    let sign_len = value.len() - digits.len();

    if digits.is_empty() {
        return Err(invalid(sign_len));
    }
    if let Some(position) = digits.chars().position(|c| !c.is_digit(base)) {
        return Err(invalid(sign_len + position));
    }

    BigInt::parse_bytes(value.as_bytes(), base).ok_or_else(|| invalid(0))
}

/// Renders `value` in `base` with lowercase letters, the inverse of
/// [`parse_value`]. Returns `None` for a radix outside 2..=36.
pub fn encode_value(value: &BigInt, base: u32) -> Option<String> {
    (MIN_BASE..=MAX_BASE)
        .contains(&base)
        .then(|| value.to_str_radix(base))
}
