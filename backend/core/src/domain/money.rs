// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Exact monetary amounts held as integer minor units (two decimal places).

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MoneyError {
    #[error("Invalid amount: {0}")]
    Invalid(String),

    #[error("Amount must not be negative")]
    Negative,

    #[error("Amount overflow")]
    Overflow,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    pub fn from_minor(minor: i64) -> Result<Self, MoneyError> {
        if minor < 0 {
            return Err(MoneyError::Negative);
        }
        Ok(Self(minor))
    }

    pub fn minor(&self) -> i64 {
        self.0
    }

    pub fn checked_mul(self, quantity: u32) -> Option<Money> {
        self.0.checked_mul(i64::from(quantity)).map(Money)
    }

    pub fn checked_add(self, other: Money) -> Option<Money> {
        self.0.checked_add(other.0).map(Money)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

impl FromStr for Money {
    type Err = MoneyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.starts_with('-') {
            return Err(MoneyError::Negative);
        }
        let (whole, fraction) = match s.split_once('.') {
            Some((whole, fraction)) => (whole, fraction),
            None => (s, ""),
        };
        if whole.is_empty() || fraction.len() > 2 {
            return Err(MoneyError::Invalid(s.to_string()));
        }
        if !whole.bytes().all(|b| b.is_ascii_digit()) || !fraction.bytes().all(|b| b.is_ascii_digit()) {
            return Err(MoneyError::Invalid(s.to_string()));
        }

        let whole: i64 = whole.parse().map_err(|_| MoneyError::Overflow)?;
        let cents: i64 = match fraction.len() {
            0 => 0,
            1 => fraction.parse::<i64>().map_err(|_| MoneyError::Invalid(s.to_string()))? * 10,
            _ => fraction.parse().map_err(|_| MoneyError::Invalid(s.to_string()))?,
        };

        whole
            .checked_mul(100)
            .and_then(|w| w.checked_add(cents))
            .map(Money)
            .ok_or(MoneyError::Overflow)
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        assert_eq!("15.99".parse::<Money>().unwrap().minor(), 1599);
        assert_eq!("7.5".parse::<Money>().unwrap().minor(), 750);
        assert_eq!("12".parse::<Money>().unwrap().to_string(), "12.00");
        assert_eq!(Money::from_minor(5).unwrap().to_string(), "0.05");
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert_eq!("-1.00".parse::<Money>(), Err(MoneyError::Negative));
        assert!(matches!("1.999".parse::<Money>(), Err(MoneyError::Invalid(_))));
        assert!(matches!("abc".parse::<Money>(), Err(MoneyError::Invalid(_))));
        assert!(matches!(".50".parse::<Money>(), Err(MoneyError::Invalid(_))));
    }

    #[test]
    fn test_arithmetic_is_checked() {
        let price = Money::from_minor(1299).unwrap();
        assert_eq!(price.checked_mul(3).unwrap().minor(), 3897);
        assert!(Money::from_minor(i64::MAX).unwrap().checked_mul(2).is_none());
    }

    #[test]
    fn test_serde_as_string() {
        let json = serde_json::to_string(&Money::from_minor(2599).unwrap()).unwrap();
        assert_eq!(json, "\"25.99\"");
        let back: Money = serde_json::from_str("\"25.99\"").unwrap();
        assert_eq!(back.minor(), 2599);
    }
}
