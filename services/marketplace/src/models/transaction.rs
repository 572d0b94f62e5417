//! Transaction model and the platform fee split

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Share of every booking kept by the marketplace (15%)
pub const PLATFORM_FEE_RATE: Decimal = Decimal::from_parts(15, 0, 0, false, 2);

/// Escrow state of the money behind a booking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Held,
    Released,
    Refunded,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Held => "held",
            TransactionStatus::Released => "released",
            TransactionStatus::Refunded => "refunded",
        }
    }
}

impl FromStr for TransactionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "held" => Ok(TransactionStatus::Held),
            "released" => Ok(TransactionStatus::Released),
            "refunded" => Ok(TransactionStatus::Refunded),
            other => Err(format!("unknown transaction status: {}", other)),
        }
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Transaction entity
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub creator_id: Uuid,
    pub amount: Decimal,
    pub platform_fee: Decimal,
    pub creator_payout: Decimal,
    pub status: TransactionStatus,
    pub stripe_payment_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// How a booking's price is divided between platform and creator
///
/// `amount == platform_fee + creator_payout` always holds; the fee is
/// rounded to cents (midpoint away from zero) and the creator receives the
/// exact remainder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeSplit {
    pub amount: Decimal,
    pub platform_fee: Decimal,
    pub creator_payout: Decimal,
}

impl FeeSplit {
    pub fn for_amount(amount: Decimal) -> Self {
        let amount = to_cents(amount);
        let platform_fee = to_cents(amount * PLATFORM_FEE_RATE);
        let creator_payout = amount - platform_fee;

        Self {
            amount,
            platform_fee,
            creator_payout,
        }
    }
}

/// Express an amount with exactly two decimal places, as stored
pub fn to_cents(amount: Decimal) -> Decimal {
    let mut cents = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    cents.rescale(2);
    cents
}
