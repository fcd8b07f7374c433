//! Scalar converters: from a raw JSON [`Scalar`] to a parameter's Rust type.
//!
//! Numbers arrive as `f64`; integer targets accept them only when the value is
//! integral and in range. Dates and timestamps are read from strings
//! (`NaiveDate` as `YYYY-MM-DD`, `DateTime` as RFC 3339).
//!
//! User-defined leaf types (enums, newtypes) implement [`FromScalar`] and
//! declare themselves with `DeclaredType::scalar::<Self>()`.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Utc};

use crate::error::{Result, SeedError};
use crate::token::Scalar;
use crate::types::{DeclaredType, Reconstruct};

pub trait FromScalar: Sized {
    fn from_scalar(scalar: &Scalar) -> Result<Self>;
}

fn expected(what: &str, found: &Scalar) -> SeedError {
    SeedError::invalid(what, found.to_string())
}

impl FromScalar for Scalar {
    fn from_scalar(scalar: &Scalar) -> Result<Self> {
        Ok(scalar.clone())
    }
}

impl FromScalar for String {
    fn from_scalar(scalar: &Scalar) -> Result<Self> {
        match scalar {
            Scalar::String(s) => Ok(s.clone()),
            other => Err(expected("string", other)),
        }
    }
}

impl FromScalar for char {
    fn from_scalar(scalar: &Scalar) -> Result<Self> {
        if let Scalar::String(s) = scalar {
            let mut chars = s.chars();
            if let (Some(c), None) = (chars.next(), chars.next()) {
                return Ok(c);
            }
        }
        Err(expected("single-character string", scalar))
    }
}

impl FromScalar for bool {
    fn from_scalar(scalar: &Scalar) -> Result<Self> {
        match scalar {
            Scalar::Bool(b) => Ok(*b),
            other => Err(expected("boolean", other)),
        }
    }
}

impl FromScalar for f64 {
    fn from_scalar(scalar: &Scalar) -> Result<Self> {
        match scalar {
            Scalar::Number(n) => Ok(*n),
            other => Err(expected("number", other)),
        }
    }
}

impl FromScalar for f32 {
    fn from_scalar(scalar: &Scalar) -> Result<Self> {
        match scalar {
            Scalar::Number(n) => Ok(*n as f32),
            other => Err(expected("number", other)),
        }
    }
}

macro_rules! integer_from_scalar {
    ($($ty:ty),* $(,)?) => {$(
        impl FromScalar for $ty {
            fn from_scalar(scalar: &Scalar) -> Result<Self> {
                match scalar {
                    Scalar::Number(n)
                        if n.fract() == 0.0
                            && *n >= <$ty>::MIN as f64
                            && *n < <$ty>::MAX as f64 + 1.0 =>
                    {
                        Ok(*n as $ty)
                    }
                    other => Err(expected(concat!("integer in range of ", stringify!($ty)), other)),
                }
            }
        }
    )*};
}

integer_from_scalar!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl FromScalar for NaiveDate {
    fn from_scalar(scalar: &Scalar) -> Result<Self> {
        match scalar {
            Scalar::String(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .map_err(|e| SeedError::invalid("date (YYYY-MM-DD)", format!("{s:?}: {e}"))),
            other => Err(expected("date string", other)),
        }
    }
}

impl FromScalar for NaiveDateTime {
    fn from_scalar(scalar: &Scalar) -> Result<Self> {
        match scalar {
            Scalar::String(s) => s
                .parse::<NaiveDateTime>()
                .map_err(|e| SeedError::invalid("local date-time", format!("{s:?}: {e}"))),
            other => Err(expected("date-time string", other)),
        }
    }
}

impl FromScalar for DateTime<FixedOffset> {
    fn from_scalar(scalar: &Scalar) -> Result<Self> {
        match scalar {
            Scalar::String(s) => DateTime::parse_from_rfc3339(s)
                .map_err(|e| SeedError::invalid("RFC 3339 timestamp", format!("{s:?}: {e}"))),
            other => Err(expected("timestamp string", other)),
        }
    }
}

impl FromScalar for DateTime<Utc> {
    fn from_scalar(scalar: &Scalar) -> Result<Self> {
        DateTime::<FixedOffset>::from_scalar(scalar).map(|dt| dt.with_timezone(&Utc))
    }
}

macro_rules! scalar_types {
    ($($ty:ty),* $(,)?) => {$(
        impl Reconstruct for $ty {
            fn declared_type() -> DeclaredType {
                DeclaredType::scalar::<$ty>()
            }
        }
    )*};
}

scalar_types!(
    Scalar,
    String,
    char,
    bool,
    f32,
    f64,
    i8,
    i16,
    i32,
    i64,
    isize,
    u8,
    u16,
    u32,
    u64,
    usize,
    NaiveDate,
    NaiveDateTime,
    DateTime<FixedOffset>,
    DateTime<Utc>,
);
