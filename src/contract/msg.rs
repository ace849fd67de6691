//! Contract message catalog.
//!
//! Every execute and query operation the market contract understands,
//! modeled as externally tagged serde enums so that serialization yields
//! the canonical `{"operation": {..args}}` documents the contract
//! deserializes. Field names, optionality, and nesting are part of the
//! wire contract; builders perform no business validation.
//!
//! Two query schema generations exist on-chain. They are distinct Rust
//! types (`QueryMsg` vs [`LegacyQueryMsg`]) so a caller can never hand one
//! generation's argument shape to the other.

use serde::{Deserialize, Serialize};

/// Direction of a wager on a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BetDirection {
    #[serde(rename = "up")]
    Up,
    /// Wire value is "dn", not "down".
    #[serde(rename = "dn")]
    Down,
}

/// Lifecycle status of a market.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketStatus {
    Open,
    Closed,
    Paused,
}

/// Lifecycle status of a single betting round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundStatus {
    Open,
    Locked,
    Closed,
    Canceled,
}

/// Result filter for bet-history queries (current generation only).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BetFilter {
    All,
    ToClaim,
    Claimed,
}

/// Ordering for round-history queries (current generation only).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderBy {
    Asc,
    Desc,
}

/// Commands accepted by the market contract. Shared by both schema
/// generations.
///
/// Amounts and prices are decimal strings (Uint128 semantics); the
/// contract rejects anything else.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecuteMsg {
    /// Place a wager on the currently open round. The bet amount must be
    /// attached as funds on the surrounding transaction.
    Bet {
        round_id: u64,
        amount: String,
        direction: BetDirection,
    },
    /// Claim winnings and refunds for the given finished rounds.
    Claim { rounds: Vec<u64> },
    /// Advance the round lineage: lock the open round, close the locked
    /// round, and optionally open a new one.
    NextRound {
        lock_height: u64,
        lock_time: u64,
        lock_price: String,
        close_height: u64,
        close_time: u64,
        close_price: String,
        open_new: bool,
    },
    /// Cancel a round and make its bets refundable.
    CancelRound { round_id: u64 },
    /// Owner-only market parameter update. `None` fields are left
    /// untouched by the contract and omitted from the wire document.
    UpdateConfig {
        #[serde(skip_serializing_if = "Option::is_none")]
        owner: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        tax: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        min_bet: Option<String>,
    },
    CloseMarket {},
    OpenMarket {},
    PauseMarket {},
}

/// Queries for the current schema generation: itemized bet results and
/// filterable history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryMsg {
    BetInfo {
        address: String,
        round_id: u64,
    },
    BetHistory {
        address: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        bets_to_return: Option<BetFilter>,
        #[serde(skip_serializing_if = "Option::is_none")]
        rounds_before: Option<u64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        limit: Option<u32>,
    },
    BetStats {
        address: String,
    },
    Config {},
    Market {},
    Round {
        round_id: u64,
    },
    RoundHistory {
        #[serde(skip_serializing_if = "Option::is_none")]
        rounds_after: Option<u64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        limit: Option<u32>,
        #[serde(skip_serializing_if = "Option::is_none")]
        order: Option<OrderBy>,
    },
}

/// Queries for the legacy schema generation still deployed on older
/// markets: a single net `amount_won` per bet, no result filter, cursor
/// pagination only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LegacyQueryMsg {
    BetInfo {
        address: String,
        round_id: u64,
    },
    BetHistory {
        address: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        rounds_before: Option<u64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        limit: Option<u32>,
    },
    BetStats {
        address: String,
    },
    Config {},
    Market {},
    Round {
        round_id: u64,
    },
    RoundHistory {
        #[serde(skip_serializing_if = "Option::is_none")]
        rounds_after: Option<u64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        limit: Option<u32>,
    },
}
