//! Loosely typed scalar handling
//!
//! Property lists and SQLite rows hand back timestamps as integers, reals or
//! strings depending on the producer. [`RawValue`] captures whatever was
//! found and [`RawValue::to_float_or_fail`] is the single place where it is
//! turned into a number. [`RawValue::mask_low_32_bits`] builds on it for
//! fields known to carry garbage above 32 bits.

use crate::diag::Diagnostics;
use crate::errors::Error;

const TARGET: &str = "dockitems::coerce";

/// A timestamp or number as found in an artifact, before interpretation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RawValue<'a> {
    /// The field did not exist
    Absent,
    Signed(i64),
    Unsigned(u64),
    Real(f64),
    Text(&'a str),

    /// A value that is not a scalar (dictionary, array, data, ...), named by
    /// its type
    Unsupported(&'static str),
}

impl<'a> RawValue<'a> {
    /// Maps an optional plist value onto a raw value.
    ///
    /// ```
    /// use dockitems::RawValue;
    ///
    /// let value = plist::Value::Integer(42.into());
    /// assert_eq!(RawValue::from_plist(Some(&value)), RawValue::Signed(42));
    /// assert_eq!(RawValue::from_plist(None), RawValue::Absent);
    /// ```
    pub fn from_plist(value: Option<&'a plist::Value>) -> RawValue<'a> {
        let Some(value) = value else {
            return RawValue::Absent;
        };

        match value {
            plist::Value::Integer(i) => match i.as_signed() {
                Some(v) => RawValue::Signed(v),
                None => i
                    .as_unsigned()
                    .map(RawValue::Unsigned)
                    .unwrap_or(RawValue::Unsupported("integer")),
            },
            plist::Value::Real(r) => RawValue::Real(*r),
            plist::Value::String(s) => RawValue::Text(s.as_str()),
            // false is the zero sentinel
            plist::Value::Boolean(b) => RawValue::Signed(i64::from(*b)),
            plist::Value::Data(_) => RawValue::Unsupported("data"),
            plist::Value::Date(_) => RawValue::Unsupported("date"),
            plist::Value::Array(_) => RawValue::Unsupported("array"),
            plist::Value::Dictionary(_) => RawValue::Unsupported("dictionary"),
            plist::Value::Uid(_) => RawValue::Unsupported("uid"),
            _ => RawValue::Unsupported("unknown"),
        }
    }

    /// Returns true for the values producers use to mean "no timestamp":
    /// absent, zero, or an empty string.
    #[must_use]
    pub fn is_sentinel(&self) -> bool {
        match *self {
            RawValue::Absent => true,
            RawValue::Signed(v) => v == 0,
            RawValue::Unsigned(v) => v == 0,
            RawValue::Real(v) => v == 0.0,
            RawValue::Text(s) => s.is_empty(),
            RawValue::Unsupported(_) => false,
        }
    }

    /// Interprets the value as a floating point number.
    ///
    /// Numbers pass through unchanged and text is parsed as a float literal
    /// after trimming surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns a coercion error when the value is absent, is not a scalar,
    /// or is text that does not parse.
    pub fn to_float_or_fail(&self) -> Result<f64, Error> {
        match *self {
            RawValue::Signed(v) => Ok(v as f64),
            RawValue::Unsigned(v) => Ok(v as f64),
            RawValue::Real(v) => Ok(v),
            RawValue::Text(s) => s
                .trim()
                .parse::<f64>()
                .map_err(|_| Error::coercion(format!("{:?}", s))),
            RawValue::Absent => Err(Error::coercion("an absent value")),
            RawValue::Unsupported(kind) => Err(Error::coercion(format!("a {} value", kind))),
        }
    }

    /// Interprets the value as a number and keeps only its low 32 bits when
    /// it does not fit in 32 bits. Smaller values are returned as is.
    ///
    /// Integers, and text holding an integer, are masked exactly. Reals are
    /// truncated first.
    ///
    /// ```
    /// use dockitems::RawValue;
    ///
    /// assert_eq!(RawValue::Signed(0x1_0000_0005).mask_low_32_bits().unwrap(), RawValue::Signed(5));
    /// assert_eq!(RawValue::Text("4294967297").mask_low_32_bits().unwrap(), RawValue::Unsigned(1));
    /// assert_eq!(RawValue::Signed(7).mask_low_32_bits().unwrap(), RawValue::Signed(7));
    /// ```
    ///
    /// # Errors
    ///
    /// Fails like [`RawValue::to_float_or_fail`] for values that are not
    /// numbers.
    pub fn mask_low_32_bits(&self) -> Result<RawValue<'a>, Error> {
        const MASK: u64 = 0xFFFF_FFFF;
        match *self {
            RawValue::Signed(v) if v > MASK as i64 => Ok(RawValue::Signed(v & MASK as i64)),
            RawValue::Unsigned(v) if v > MASK => Ok(RawValue::Unsigned(v & MASK)),
            RawValue::Signed(_) | RawValue::Unsigned(_) => Ok(*self),
            RawValue::Real(v) if v > MASK as f64 && v < u64::MAX as f64 => {
                Ok(RawValue::Unsigned(v as u64 & MASK))
            }
            RawValue::Real(_) => Ok(*self),
            RawValue::Text(s) => match s.trim().parse::<u64>() {
                Ok(v) => RawValue::Unsigned(v).mask_low_32_bits(),
                Err(_) => RawValue::Real(self.to_float_or_fail()?).mask_low_32_bits(),
            },
            RawValue::Absent | RawValue::Unsupported(_) => {
                self.to_float_or_fail().map(|_| *self)
            }
        }
    }
}

impl std::fmt::Display for RawValue<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RawValue::Absent => write!(f, "<absent>"),
            RawValue::Signed(v) => write!(f, "{}", v),
            RawValue::Unsigned(v) => write!(f, "{}", v),
            RawValue::Real(v) => write!(f, "{}", v),
            RawValue::Text(s) => write!(f, "{:?}", s),
            RawValue::Unsupported(kind) => write!(f, "<{}>", kind),
        }
    }
}

impl From<i64> for RawValue<'_> {
    fn from(value: i64) -> Self {
        RawValue::Signed(value)
    }
}

impl From<u64> for RawValue<'_> {
    fn from(value: u64) -> Self {
        RawValue::Unsigned(value)
    }
}

impl From<u32> for RawValue<'_> {
    fn from(value: u32) -> Self {
        RawValue::Signed(i64::from(value))
    }
}

impl From<f64> for RawValue<'_> {
    fn from(value: f64) -> Self {
        RawValue::Real(value)
    }
}

impl<'a> From<&'a str> for RawValue<'a> {
    fn from(value: &'a str) -> Self {
        RawValue::Text(value)
    }
}

impl<'a, T: Into<RawValue<'a>>> From<Option<T>> for RawValue<'a> {
    fn from(value: Option<T>) -> Self {
        value.map_or(RawValue::Absent, Into::into)
    }
}

/// Parses an integer in the given radix, falling back to `default`.
///
/// Missing or empty input is an expected condition and returns `default`
/// silently. Anything else that fails to parse is reported through `diag`
/// before falling back.
///
/// ```
/// use dockitems::{int_from_str, NullDiagnostics};
///
/// assert_eq!(int_from_str(Some("ff"), 16, 0, &NullDiagnostics), 255);
/// assert_eq!(int_from_str(Some("-12"), 10, 0, &NullDiagnostics), -12);
/// assert_eq!(int_from_str(None, 10, 7, &NullDiagnostics), 7);
/// ```
pub fn int_from_str(text: Option<&str>, radix: u32, default: i64, diag: &dyn Diagnostics) -> i64 {
    let Some(text) = text.filter(|s| !s.is_empty()) else {
        return default;
    };

    match parse_int(text, radix) {
        Some(value) => value,
        None => {
            diag.error(
                TARGET,
                format_args!("Could not convert string {:?} to int (base {})", text, radix),
            );
            default
        }
    }
}

fn parse_int(text: &str, radix: u32) -> Option<i64> {
    if !(2..=36).contains(&radix) {
        return None;
    }

    let trimmed = text.trim();
    let (negative, digits) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };

    let digits = if radix == 16 {
        digits
            .strip_prefix("0x")
            .or_else(|| digits.strip_prefix("0X"))
            .unwrap_or(digits)
    } else {
        digits
    };

    // from_str_radix accepts its own sign, which would allow "--1"
    if digits.is_empty() || digits.starts_with(['-', '+']) {
        return None;
    }

    let magnitude = u64::from_str_radix(digits, radix).ok()?;
    if negative {
        0i64.checked_sub_unsigned(magnitude)
    } else {
        i64::try_from(magnitude).ok()
    }
}
