use alloy::primitives::U256;
use serde::{Serialize, Serializer};
use sqlx::encode::IsNull;
use sqlx::error::BoxDynError;
use sqlx::sqlite::SqliteTypeInfo;
use sqlx::{Database, Decode, Encode, Sqlite, Type};
use std::fmt;
use std::iter::Sum;
use std::ops::Add;
use std::str::FromStr;

/// Number of decimals between ether and wei.
pub const DECIMALS: usize = 18;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AmountError {
    #[error("amount is empty")]
    Empty,
    #[error("amount `{0}` is not a non-negative decimal number")]
    Malformed(String),
    #[error("amount `{0}` has more than 18 decimals")]
    TooPrecise(String),
    #[error("amount `{0}` overflows 256 bits")]
    Overflow(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Amount(U256);

fn wei_per_ether() -> U256 {
    U256::from(1_000_000_000_000_000_000u64)
}

impl Amount {
    pub const ZERO: Amount = Amount(U256::ZERO);

    pub fn from_wei(wei: U256) -> Self {
        Self(wei)
    }

    pub fn wei(&self) -> U256 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let s = input.trim();
        if s.is_empty() {
            return Err(AmountError::Empty);
        }

        let (whole, fraction) = match s.split_once('.') {
            Some((whole, fraction)) => (whole, fraction),
            None => (s, ""),
        };
        let is_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
        if (whole.is_empty() && fraction.is_empty()) || !is_digits(whole) || !is_digits(fraction) {
            return Err(AmountError::Malformed(input.to_string()));
        }
        if fraction.len() > DECIMALS {
            return Err(AmountError::TooPrecise(input.to_string()));
        }

        let overflow = || AmountError::Overflow(input.to_string());
        let whole = if whole.is_empty() {
            U256::ZERO
        } else {
            U256::from_str_radix(whole, 10).map_err(|_| overflow())?
        };
        let padded = format!("{fraction:0<DECIMALS$}");
        let fraction = U256::from_str_radix(&padded, 10).map_err(|_| overflow())?;

        let wei = whole
            .checked_mul(wei_per_ether())
            .and_then(|wei| wei.checked_add(fraction))
            .ok_or_else(overflow)?;
        Ok(Self(wei))
    }
}

impl fmt::Display for Amount {
    // Canonical form: no trailing zeros, no trailing dot ("1000", "0.1").
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / wei_per_ether();
        let fraction = self.0 % wei_per_ether();
        if fraction.is_zero() {
            return write!(f, "{whole}");
        }
        let digits = fraction.to_string();
        let padded = format!("{}{digits}", "0".repeat(DECIMALS - digits.len()));
        write!(f, "{whole}.{}", padded.trim_end_matches('0'))
    }
}

impl Add for Amount {
    type Output = Amount;

    fn add(self, rhs: Amount) -> Amount {
        Amount(self.0.saturating_add(rhs.0))
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Amount>>(iter: I) -> Self {
        iter.fold(Amount::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Amount> for Amount {
    fn sum<I: Iterator<Item = &'a Amount>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

impl Serialize for Amount {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

// Stored as canonical decimal TEXT.
impl Type<Sqlite> for Amount {
    fn type_info() -> SqliteTypeInfo {
        <str as Type<Sqlite>>::type_info()
    }

    fn compatible(ty: &SqliteTypeInfo) -> bool {
        <str as Type<Sqlite>>::compatible(ty)
    }
}

impl<'q> Encode<'q, Sqlite> for Amount {
    fn encode_by_ref(
        &self,
        buf: &mut <Sqlite as Database>::ArgumentBuffer<'q>,
    ) -> Result<IsNull, BoxDynError> {
        <String as Encode<'q, Sqlite>>::encode(self.to_string(), buf)
    }
}

impl<'r> Decode<'r, Sqlite> for Amount {
    fn decode(value: <Sqlite as Database>::ValueRef<'r>) -> Result<Self, BoxDynError> {
        let text = <&str as Decode<'r, Sqlite>>::decode(value)?;
        Ok(text.parse()?)
    }
}

/// Re-renders a decimal string in canonical form.
pub fn canonicalize(input: &str) -> Result<String, AmountError> {
    Ok(input.parse::<Amount>()?.to_string())
}
