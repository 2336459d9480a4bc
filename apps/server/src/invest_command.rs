//! Free-text investment command recognition.
//!
//! Chat messages such as "buy 10 shares of TCS at 3500" are scanned for a
//! purchase instruction, which is then checked against the player's cash.

use std::str::FromStr;

use chrono::NaiveDate;
use lazy_static::lazy_static;
use regex::{Captures, Regex};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

lazy_static! {
    /// "invest in RELIANCE stock buy 10 shares at ₹2500 per share"
    static ref INVEST_IN_BUY_REGEX: Regex = Regex::new(
        r"(?i)invest\s+in\s+([A-Za-z0-9_]+)\s+stock\s+buy\s+([0-9]+)\s+shares?\s+(?:at|@)?\s*₹?\s*([0-9]+(?:\.[0-9]+)?)"
    )
    .expect("Invalid regex pattern");

    /// "buy 10 shares of TCS at 3500"
    static ref BUY_SHARES_OF_REGEX: Regex = Regex::new(
        r"(?i)buy\s+([0-9]+)\s+shares?\s+of\s+([A-Za-z0-9_]+)\s+(?:at|@)?\s*₹?\s*([0-9]+(?:\.[0-9]+)?)"
    )
    .expect("Invalid regex pattern");

    /// "invest 5000 rupees in INFY stock"
    static ref INVEST_AMOUNT_REGEX: Regex = Regex::new(
        r"(?i)invest\s+([0-9]+)\s+(?:rupees|₹)\s+in\s+([A-Za-z0-9_]+)\s+stock"
    )
    .expect("Invalid regex pattern");
}

/// A purchase instruction recognized in a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvestmentCommand {
    pub symbol: String,
    pub shares: u64,
    pub price: Decimal,
    pub total_cost: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovedPurchase {
    pub shares: u64,
    pub buy_price: Decimal,
    pub total_cost: Decimal,
    pub investment_amount: Decimal,
    pub purchase_date: NaiveDate,
}

/// Outcome of checking a command against the available cash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    #[serde(flatten)]
    pub approved: Option<ApprovedPurchase>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl PurchaseResult {
    fn rejected(symbol: Option<String>, reason: String) -> Self {
        Self {
            success: false,
            symbol,
            approved: None,
            reason: Some(reason),
        }
    }
}

/// Find the first investment command in `message`.
///
/// Patterns are tried in a fixed order and the first match wins. Numbers
/// too large to represent make the message count as having no command.
pub fn parse_investment_command(message: &str) -> Option<InvestmentCommand> {
    if let Some(caps) = INVEST_IN_BUY_REGEX.captures(message) {
        return share_purchase(&caps, 1, 2, 3);
    }
    if let Some(caps) = BUY_SHARES_OF_REGEX.captures(message) {
        return share_purchase(&caps, 2, 1, 3);
    }
    if let Some(caps) = INVEST_AMOUNT_REGEX.captures(message) {
        // A lump sum buys a single unit at that amount
        let amount = Decimal::from_str(&caps[1]).ok()?;
        return Some(InvestmentCommand {
            symbol: caps[2].to_uppercase(),
            shares: 1,
            price: amount,
            total_cost: amount,
        });
    }
    None
}

fn share_purchase(
    caps: &Captures<'_>,
    symbol_group: usize,
    shares_group: usize,
    price_group: usize,
) -> Option<InvestmentCommand> {
    let shares: u64 = caps[shares_group].parse().ok()?;
    let price = Decimal::from_str(&caps[price_group]).ok()?;
    let total_cost = Decimal::from(shares).checked_mul(price)?;
    Some(InvestmentCommand {
        symbol: caps[symbol_group].to_uppercase(),
        shares,
        price,
        total_cost,
    })
}

/// Check `command` against `cash_balance`, dating an approved purchase `today`.
pub fn validate_purchase(
    command: &InvestmentCommand,
    cash_balance: Decimal,
    today: NaiveDate,
) -> PurchaseResult {
    if command.shares == 0 || command.price <= Decimal::ZERO {
        return PurchaseResult::rejected(
            None,
            format!(
                "Invalid investment details: shares={}, price={}",
                command.shares,
                command.price.normalize()
            ),
        );
    }

    if cash_balance >= command.total_cost {
        return PurchaseResult {
            success: true,
            symbol: Some(command.symbol.clone()),
            approved: Some(ApprovedPurchase {
                shares: command.shares,
                buy_price: command.price,
                total_cost: command.total_cost,
                investment_amount: command.total_cost,
                purchase_date: today,
            }),
            reason: None,
        };
    }

    PurchaseResult::rejected(
        Some(command.symbol.clone()),
        format!(
            "Insufficient funds. Need ₹{} but only have ₹{}",
            format_inr(command.total_cost),
            format_inr(cash_balance)
        ),
    )
}

/// Format an amount with Indian digit grouping, e.g. `12,34,567.5`.
///
/// At most three fraction digits are kept, halves rounding away from zero,
/// and trailing zeros are dropped.
pub fn format_inr(amount: Decimal) -> String {
    let amount = amount
        .round_dp_with_strategy(3, RoundingStrategy::MidpointAwayFromZero)
        .normalize();
    let text = amount.abs().to_string();
    let (int_part, frac_part) = match text.split_once('.') {
        Some((int_part, frac_part)) => (int_part, Some(frac_part)),
        None => (text.as_str(), None),
    };

    let mut out = String::new();
    if amount.is_sign_negative() && !amount.is_zero() {
        out.push('-');
    }

    if int_part.len() <= 3 {
        out.push_str(int_part);
    } else {
        // Last three digits form one group, everything before groups in pairs
        let (head, tail) = int_part.split_at(int_part.len() - 3);
        for (i, digit) in head.chars().enumerate() {
            if i > 0 && (head.len() - i) % 2 == 0 {
                out.push(',');
            }
            out.push(digit);
        }
        out.push(',');
        out.push_str(tail);
    }

    if let Some(frac_part) = frac_part {
        out.push('.');
        out.push_str(frac_part);
    }
    out
}
