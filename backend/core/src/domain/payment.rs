// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::domain::ids::{PaymentMethodId, UserId};
use crate::domain::resource::{AttrValue, Scoped};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PaymentError {
    #[error("{0} requires card_last4 and card_brand")]
    MissingCardDetails(PaymentType),

    #[error("card_last4 must be exactly 4 digits")]
    InvalidCardLast4,

    #[error("UPI payment methods require upi_id")]
    MissingUpiId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentType {
    CreditCard,
    DebitCard,
    NetBanking,
    Upi,
    Wallet,
    CashOnDelivery,
}

impl PaymentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentType::CreditCard => "CREDIT_CARD",
            PaymentType::DebitCard => "DEBIT_CARD",
            PaymentType::NetBanking => "NET_BANKING",
            PaymentType::Upi => "UPI",
            PaymentType::Wallet => "WALLET",
            PaymentType::CashOnDelivery => "CASH_ON_DELIVERY",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "CREDIT_CARD" => Some(PaymentType::CreditCard),
            "DEBIT_CARD" => Some(PaymentType::DebitCard),
            "NET_BANKING" => Some(PaymentType::NetBanking),
            "UPI" => Some(PaymentType::Upi),
            "WALLET" => Some(PaymentType::Wallet),
            "CASH_ON_DELIVERY" => Some(PaymentType::CashOnDelivery),
            _ => None,
        }
    }

    pub fn is_card(&self) -> bool {
        matches!(self, PaymentType::CreditCard | PaymentType::DebitCard)
    }
}

impl fmt::Display for PaymentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentMethod {
    pub id: PaymentMethodId,
    pub user_id: UserId,
    pub payment_type: PaymentType,
    /// At most one method per owner carries the flag.
    pub is_default: bool,
    pub card_last4: Option<String>,
    pub card_brand: Option<String>,
    pub upi_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PaymentMethod {
    pub fn new(user_id: UserId, payment_type: PaymentType) -> Self {
        let now = Utc::now();
        Self {
            id: PaymentMethodId::new(),
            user_id,
            payment_type,
            is_default: false,
            card_last4: None,
            card_brand: None,
            upi_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn validate(&self) -> Result<(), PaymentError> {
        if self.payment_type.is_card() {
            let last4 = non_blank(&self.card_last4);
            let brand = non_blank(&self.card_brand);
            let (Some(last4), Some(_)) = (last4, brand) else {
                return Err(PaymentError::MissingCardDetails(self.payment_type));
            };
            if last4.len() != 4 || !last4.bytes().all(|b| b.is_ascii_digit()) {
                return Err(PaymentError::InvalidCardLast4);
            }
        }
        if self.payment_type == PaymentType::Upi && non_blank(&self.upi_id).is_none() {
            return Err(PaymentError::MissingUpiId);
        }
        Ok(())
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl Scoped for PaymentMethod {
    fn attribute(&self, field: &str) -> Option<AttrValue> {
        match field {
            "id" => Some(AttrValue::Id(self.id.as_uuid())),
            "user_id" => Some(AttrValue::Id(self.user_id.as_uuid())),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_card_requires_brand_and_last4() {
        let mut method = PaymentMethod::new(UserId::new(), PaymentType::CreditCard);
        assert_eq!(
            method.validate(),
            Err(PaymentError::MissingCardDetails(PaymentType::CreditCard))
        );

        method.card_last4 = Some("4242".into());
        assert!(method.validate().is_err());

        method.card_brand = Some("Visa".into());
        assert_eq!(method.validate(), Ok(()));

        method.card_last4 = Some("42a2".into());
        assert_eq!(method.validate(), Err(PaymentError::InvalidCardLast4));
    }

    #[test]
    fn test_upi_requires_upi_id() {
        let mut method = PaymentMethod::new(UserId::new(), PaymentType::Upi);
        method.upi_id = Some("   ".into());
        assert_eq!(method.validate(), Err(PaymentError::MissingUpiId));
        method.upi_id = Some("thor@upi".into());
        assert_eq!(method.validate(), Ok(()));
    }

    #[test]
    fn test_cash_needs_nothing() {
        let method = PaymentMethod::new(UserId::new(), PaymentType::CashOnDelivery);
        assert_eq!(method.validate(), Ok(()));
        assert_eq!(PaymentType::parse("CASH_ON_DELIVERY"), Some(PaymentType::CashOnDelivery));
    }
}
