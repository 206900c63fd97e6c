//! Human readable summaries of operation results.

use {
    crate::{
        domain::{Field, StateSnapshot, Token, Tokens, UserBalance, Vendor},
        infra::submitter::Submission,
    },
    alloy::primitives::U256,
    number::{DEFAULT_DECIMALS, format_visible},
    serde::Serialize,
    std::fmt::Write,
};

/// Fractional digits shown for amounts.
const DIGITS: u8 = 6;

/// What an operation produced.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Output {
    Status(Box<StateSnapshot>),
    Balance(Box<UserBalance>),
    Vendor(Vendor),
    Submission(Box<Submission>),
}

pub fn render(output: &Output, tokens: &Tokens) -> String {
    match output {
        Output::Status(snapshot) => status(snapshot, tokens),
        Output::Balance(balance) => balance_summary(balance, tokens),
        Output::Vendor(vendor) => vendor_summary(vendor, tokens),
        Output::Submission(submission) => submission_summary(submission),
    }
}

fn amount(value: Option<U256>, token: &Token) -> String {
    match value {
        Some(value) => format!("{} {}", format_visible(value, token.decimals, DIGITS), token.name),
        None => "unavailable".to_owned(),
    }
}

fn ratio(snapshot: &StateSnapshot, field: Field) -> String {
    snapshot
        .uint(field)
        .map(|value| format_visible(value, DEFAULT_DECIMALS, DIGITS))
        .unwrap_or_else(|| "unavailable".to_owned())
}

fn status(snapshot: &StateSnapshot, tokens: &Tokens) -> String {
    let usd = Token::new("USD");
    let uint = |field| snapshot.uint(field);
    let priced = [
        (&tokens.reserve, "price", Field::ReservePrice, &usd),
        (&tokens.reserve, "EMA price", Field::ReserveEmaPrice, &usd),
        (&tokens.governance, "price", Field::GovernancePrice, &usd),
        (&tokens.collateral, "price", Field::TcPriceInUsd, &usd),
        (&tokens.leveraged, "price", Field::TxPriceInReserve, &tokens.reserve),
        (&tokens.pegged, "available to mint", Field::TpAvailableToMint, &tokens.pegged),
        (&tokens.pegged, "available to redeem", Field::TpAvailableToRedeem, &tokens.pegged),
        (&tokens.collateral, "available to redeem", Field::TcAvailableToRedeem, &tokens.collateral),
        (&tokens.leveraged, "available to mint", Field::TxAvailableToMint, &tokens.leveraged),
        (&tokens.reserve, "in contract", Field::TotalReserve, &tokens.reserve),
    ];
    let ratios = [
        ("Global coverage", Field::GlobalCoverage),
        ("C0 leverage", Field::C0Leverage),
        ("C0 target coverage", Field::C0TargetCoverage),
        ("X2 coverage", Field::X2Coverage),
        ("X2 leverage", Field::X2Leverage),
    ];

    let mut out = String::new();
    let _ = writeln!(out, "Block: {}", snapshot.block);
    let _ = writeln!(out, "Mode: {}", snapshot.mode);
    for (subject, label, field, unit) in priced {
        let _ = writeln!(out, "{} {label}: {}", subject.name, amount(uint(field), unit));
    }
    for (label, field) in ratios {
        let _ = writeln!(out, "{label}: {}", ratio(snapshot, field));
    }
    let _ = writeln!(
        out,
        "Blocks to settlement: {}",
        uint(Field::BlocksToSettlement)
            .map(|value| value.to_string())
            .unwrap_or_else(|| "unavailable".to_owned())
    );
    let _ = writeln!(
        out,
        "Paused: {}",
        snapshot
            .flag(Field::Paused)
            .map(|paused| paused.to_string())
            .unwrap_or_else(|| "unavailable".to_owned())
    );
    out
}

fn balance_summary(balance: &UserBalance, tokens: &Tokens) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Account: {}", balance.account);
    let _ = writeln!(out, "Block: {}", balance.block);
    let rows = [
        ("balance", balance.reserve, &tokens.reserve),
        ("allowance", balance.reserve_allowance, &tokens.reserve),
        ("balance", balance.pegged, &tokens.pegged),
        ("queued to redeem", balance.pegged_to_redeem, &tokens.pegged),
        ("balance", balance.collateral, &tokens.collateral),
        ("balance", balance.leveraged, &tokens.leveraged),
        ("balance", balance.governance, &tokens.governance),
        ("allowance", balance.governance_allowance, &tokens.governance),
    ];
    for (label, value, token) in rows {
        let _ = writeln!(out, "{} {label}: {}", token.name, amount(value, token));
    }
    if balance.legacy_pegged.is_some() || balance.legacy_pegged_allowance.is_some() {
        let _ = writeln!(
            out,
            "Legacy {} balance: {}",
            tokens.pegged.name,
            amount(balance.legacy_pegged, &tokens.pegged)
        );
        let _ = writeln!(
            out,
            "Legacy {} allowance: {}",
            tokens.pegged.name,
            amount(balance.legacy_pegged_allowance, &tokens.pegged)
        );
    }
    let _ = writeln!(
        out,
        "{} interest on a full mint: {}",
        tokens.leveraged.name,
        amount(balance.potential_leveraged_interest, &tokens.reserve)
    );
    out
}

fn vendor_summary(vendor: &Vendor, tokens: &Tokens) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Vendor: {}", vendor.account);
    let _ = writeln!(out, "Active: {}", vendor.is_active);
    let _ = writeln!(
        out,
        "Markup: {}",
        format_visible(vendor.markup, DEFAULT_DECIMALS, DIGITS)
    );
    let _ = writeln!(
        out,
        "Total paid: {}",
        amount(Some(vendor.total_paid_in_governance), &tokens.governance)
    );
    let _ = writeln!(
        out,
        "Staking: {}",
        amount(Some(vendor.staking), &tokens.governance)
    );
    out
}

fn submission_summary(submission: &Submission) -> String {
    let mut out = String::new();
    match submission {
        Submission::Confirmed { receipt, events } => {
            let _ = writeln!(out, "Transaction {} confirmed", receipt.transaction_hash);
            let _ = writeln!(
                out,
                "Block: {}",
                receipt
                    .block_number
                    .map(|block| block.to_string())
                    .unwrap_or_default()
            );
            let _ = writeln!(out, "Gas used: {}", receipt.gas_used);
            for event in events {
                let _ = writeln!(out, "Event {} at {}", event.name, event.address);
                for field in &event.fields {
                    let _ = writeln!(out, "  {}: {}", field.name, field.value);
                }
            }
        }
        Submission::PendingConfirmation { tx_hash } => {
            let _ = writeln!(out, "Transaction {tx_hash} sent, not confirmed yet");
        }
    }
    out
}
