//! Typed contract query responses.
//!
//! Shapes mirror the contract's JSON output exactly. Amounts are decimal
//! strings; the SDK never converts them to floats.

use serde::{Deserialize, Serialize};

use crate::contract::msg::{BetDirection, MarketStatus, RoundStatus};

/// Pool split for one round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundPayouts {
    pub up: String,
    pub dn: String,
    pub pool: String,
}

/// One betting round. Rounds are identified by their open height; the
/// expected times are what the scheduler aimed for, the plain times are
/// what actually happened on-chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundResponse {
    pub open_height: u64,
    pub open_time: u64,
    pub expected_lock_time: u64,
    pub lock_height: u64,
    pub lock_time: u64,
    pub lock_price: String,
    pub expected_close_time: u64,
    pub close_height: u64,
    pub close_time: u64,
    pub close_price: String,
    pub payouts: RoundPayouts,
    pub status: RoundStatus,
}

/// Static market configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigResponse {
    pub asset: String,
    pub denom: String,
    pub description: String,
    pub interval: u64,
    pub min_bet: String,
    pub tax: String,
    pub owner: String,
    pub symbol: String,
    pub treasury: String,
}

/// Current round lineage of a market.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketResponse {
    pub open_round_id: u64,
    pub locked_round_id: u64,
    pub closed_round_id: u64,
    pub status: MarketStatus,
}

/// Itemized result amounts for a bet (current generation).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BetResults {
    pub loss: String,
    pub refund: String,
    pub won: String,
}

/// Itemized result counters across rounds (current generation).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BetCounters {
    pub loss: u64,
    pub refund: u64,
    pub won: u64,
}

/// One bet with itemized results (current generation).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BetInfoResponse {
    pub address: String,
    pub amount: String,
    pub claimed: bool,
    pub direction: Option<BetDirection>,
    pub is_claimable: bool,
    pub results: BetResults,
    pub round: Option<RoundResponse>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BetHistoryResponse {
    pub bets: Vec<BetInfoResponse>,
}

/// Aggregate statistics for one address (current generation).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BetStatsResponse {
    pub amount_played: String,
    pub amount_to_claim: String,
    pub counters: BetCounters,
    pub results: BetResults,
    pub rounds_claimed: Vec<u64>,
    pub rounds_played: u64,
    pub rounds_to_claim: Vec<u64>,
    pub rounds_unfinished: u64,
    pub unfinished_amount: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundHistoryResponse {
    pub rounds: Vec<RoundResponse>,
}

/// One bet from a legacy-generation market: a single net `amount_won`
/// instead of itemized results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegacyBetInfoResponse {
    pub address: String,
    pub amount: String,
    pub claimed: bool,
    pub direction: Option<BetDirection>,
    pub is_claimable: bool,
    pub amount_won: String,
    pub round: Option<RoundResponse>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegacyBetHistoryResponse {
    pub bets: Vec<LegacyBetInfoResponse>,
}

/// Legacy aggregate statistics: scalar counts, no itemized counters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegacyBetStatsResponse {
    pub amount_played: String,
    pub amount_to_claim: String,
    pub amount_won: String,
    pub rounds_played: u64,
    pub rounds_won: u64,
    pub rounds_lost: u64,
}
