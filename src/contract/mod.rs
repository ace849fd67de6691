//! Market contract client: command intents and typed queries.
//!
//! Signing/broadcast and on-chain query execution are external
//! capabilities injected behind the [`TransactionSigner`] and
//! [`QueryExecutor`] traits. This layer only fabricates wire-exact
//! messages, wraps them with sender identity and funds, and maps raw
//! query responses into typed results. It never retries; collaborator
//! failures propagate unchanged.

pub mod msg;
pub mod types;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use self::msg::{BetDirection, BetFilter, ExecuteMsg, LegacyQueryMsg, OrderBy, QueryMsg};
use self::types::{
    BetHistoryResponse, BetInfoResponse, BetStatsResponse, ConfigResponse,
    LegacyBetHistoryResponse, LegacyBetInfoResponse, LegacyBetStatsResponse, MarketResponse,
    RoundHistoryResponse, RoundResponse,
};

/// A native coin attached to a transaction. Amount is a decimal string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coin {
    pub denom: String,
    pub amount: String,
}

impl Coin {
    pub fn new(denom: impl Into<String>, amount: impl Into<String>) -> Self {
        Self {
            denom: denom.into(),
            amount: amount.into(),
        }
    }
}

/// An executable transaction intent addressed to the market contract.
/// Not yet signed or broadcast.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecuteIntent {
    pub sender: String,
    pub contract: String,
    pub msg: ExecuteMsg,
    pub funds: Vec<Coin>,
}

/// Outcome of a broadcast transaction, as reported by the signer.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TxResult {
    pub txhash: String,
    pub height: u64,
}

/// Opaque failure from the signing/broadcast capability. Passed through
/// unmodified; the SDK attaches no interpretation.
#[derive(Error, Debug)]
#[error("transaction failed: {0}")]
pub struct TransactionError(#[source] pub Box<dyn std::error::Error + Send + Sync>);

impl TransactionError {
    pub fn new(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self(err.into())
    }
}

/// Failure of a contract query.
#[derive(Error, Debug)]
pub enum QueryError {
    /// The injected executor reported a failure (node unreachable,
    /// contract panicked, ...).
    #[error("contract query failed: {0}")]
    Executor(#[source] Box<dyn std::error::Error + Send + Sync>),
    /// The response did not match the expected shape. Indicates schema
    /// drift between this client and the live contract.
    #[error("response schema mismatch: {0}")]
    Schema(#[from] serde_json::Error),
}

impl QueryError {
    pub fn executor(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Executor(err.into())
    }
}

/// Wallet capability: signs and broadcasts an [`ExecuteIntent`].
#[async_trait]
pub trait TransactionSigner: Send + Sync {
    async fn sign_and_broadcast(&self, intent: &ExecuteIntent) -> Result<TxResult, TransactionError>;
}

/// Read-only chain capability: runs a smart query against a contract.
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    async fn smart_query(
        &self,
        contract: &str,
        msg: &serde_json::Value,
    ) -> Result<serde_json::Value, QueryError>;
}

async fn smart_query<R>(
    executor: &dyn QueryExecutor,
    contract: &str,
    msg: &impl Serialize,
) -> Result<R, QueryError>
where
    R: DeserializeOwned,
{
    let msg = serde_json::to_value(msg)?;
    let raw = executor.smart_query(contract, &msg).await?;
    Ok(serde_json::from_value(raw)?)
}

/// The market commands. Identical across both schema generations, so both
/// contract clients get them from this trait.
pub trait MarketCommands {
    fn contract_address(&self) -> &str;

    fn intent(&self, sender: &str, msg: ExecuteMsg, funds: Vec<Coin>) -> ExecuteIntent {
        ExecuteIntent {
            sender: sender.to_string(),
            contract: self.contract_address().to_string(),
            msg,
            funds,
        }
    }

    /// Place a bet. The wagered amount moves value, so it must also be
    /// attached as `funds`.
    fn bet(
        &self,
        sender: &str,
        round_id: u64,
        amount: &str,
        direction: BetDirection,
        funds: Vec<Coin>,
    ) -> ExecuteIntent {
        self.intent(
            sender,
            ExecuteMsg::Bet {
                round_id,
                amount: amount.to_string(),
                direction,
            },
            funds,
        )
    }

    fn claim(&self, sender: &str, rounds: Vec<u64>) -> ExecuteIntent {
        self.intent(sender, ExecuteMsg::Claim { rounds }, Vec::new())
    }

    #[allow(clippy::too_many_arguments)]
    fn next_round(
        &self,
        sender: &str,
        lock_height: u64,
        lock_time: u64,
        lock_price: &str,
        close_height: u64,
        close_time: u64,
        close_price: &str,
        open_new: bool,
    ) -> ExecuteIntent {
        self.intent(
            sender,
            ExecuteMsg::NextRound {
                lock_height,
                lock_time,
                lock_price: lock_price.to_string(),
                close_height,
                close_time,
                close_price: close_price.to_string(),
                open_new,
            },
            Vec::new(),
        )
    }

    fn cancel_round(&self, sender: &str, round_id: u64) -> ExecuteIntent {
        self.intent(sender, ExecuteMsg::CancelRound { round_id }, Vec::new())
    }

    fn update_config(
        &self,
        sender: &str,
        owner: Option<String>,
        tax: Option<String>,
        min_bet: Option<String>,
    ) -> ExecuteIntent {
        self.intent(
            sender,
            ExecuteMsg::UpdateConfig {
                owner,
                tax,
                min_bet,
            },
            Vec::new(),
        )
    }

    fn close_market(&self, sender: &str) -> ExecuteIntent {
        self.intent(sender, ExecuteMsg::CloseMarket {}, Vec::new())
    }

    fn open_market(&self, sender: &str) -> ExecuteIntent {
        self.intent(sender, ExecuteMsg::OpenMarket {}, Vec::new())
    }

    fn pause_market(&self, sender: &str) -> ExecuteIntent {
        self.intent(sender, ExecuteMsg::PauseMarket {}, Vec::new())
    }
}

/// Client for a current-generation market contract (itemized results).
#[derive(Debug, Clone)]
pub struct MarketContract {
    address: String,
}

impl MarketContract {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub async fn bet_info(
        &self,
        executor: &dyn QueryExecutor,
        address: &str,
        round_id: u64,
    ) -> Result<BetInfoResponse, QueryError> {
        let msg = QueryMsg::BetInfo {
            address: address.to_string(),
            round_id,
        };
        smart_query(executor, &self.address, &msg).await
    }

    pub async fn bet_history(
        &self,
        executor: &dyn QueryExecutor,
        address: &str,
        bets_to_return: Option<BetFilter>,
        rounds_before: Option<u64>,
        limit: Option<u32>,
    ) -> Result<BetHistoryResponse, QueryError> {
        let msg = QueryMsg::BetHistory {
            address: address.to_string(),
            bets_to_return,
            rounds_before,
            limit,
        };
        smart_query(executor, &self.address, &msg).await
    }

    pub async fn bet_stats(
        &self,
        executor: &dyn QueryExecutor,
        address: &str,
    ) -> Result<BetStatsResponse, QueryError> {
        let msg = QueryMsg::BetStats {
            address: address.to_string(),
        };
        smart_query(executor, &self.address, &msg).await
    }

    pub async fn config(&self, executor: &dyn QueryExecutor) -> Result<ConfigResponse, QueryError> {
        smart_query(executor, &self.address, &QueryMsg::Config {}).await
    }

    pub async fn market(&self, executor: &dyn QueryExecutor) -> Result<MarketResponse, QueryError> {
        smart_query(executor, &self.address, &QueryMsg::Market {}).await
    }

    pub async fn round(
        &self,
        executor: &dyn QueryExecutor,
        round_id: u64,
    ) -> Result<RoundResponse, QueryError> {
        smart_query(executor, &self.address, &QueryMsg::Round { round_id }).await
    }

    pub async fn round_history(
        &self,
        executor: &dyn QueryExecutor,
        rounds_after: Option<u64>,
        limit: Option<u32>,
        order: Option<OrderBy>,
    ) -> Result<RoundHistoryResponse, QueryError> {
        let msg = QueryMsg::RoundHistory {
            rounds_after,
            limit,
            order,
        };
        smart_query(executor, &self.address, &msg).await
    }
}

impl MarketCommands for MarketContract {
    fn contract_address(&self) -> &str {
        &self.address
    }
}

/// Client for a legacy-generation market contract (net results). Query
/// argument and response shapes differ from [`MarketContract`]; commands
/// are the same.
#[derive(Debug, Clone)]
pub struct LegacyMarketContract {
    address: String,
}

impl LegacyMarketContract {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub async fn bet_info(
        &self,
        executor: &dyn QueryExecutor,
        address: &str,
        round_id: u64,
    ) -> Result<LegacyBetInfoResponse, QueryError> {
        let msg = LegacyQueryMsg::BetInfo {
            address: address.to_string(),
            round_id,
        };
        smart_query(executor, &self.address, &msg).await
    }

    pub async fn bet_history(
        &self,
        executor: &dyn QueryExecutor,
        address: &str,
        rounds_before: Option<u64>,
        limit: Option<u32>,
    ) -> Result<LegacyBetHistoryResponse, QueryError> {
        let msg = LegacyQueryMsg::BetHistory {
            address: address.to_string(),
            rounds_before,
            limit,
        };
        smart_query(executor, &self.address, &msg).await
    }

    pub async fn bet_stats(
        &self,
        executor: &dyn QueryExecutor,
        address: &str,
    ) -> Result<LegacyBetStatsResponse, QueryError> {
        let msg = LegacyQueryMsg::BetStats {
            address: address.to_string(),
        };
        smart_query(executor, &self.address, &msg).await
    }

    pub async fn config(&self, executor: &dyn QueryExecutor) -> Result<ConfigResponse, QueryError> {
        smart_query(executor, &self.address, &LegacyQueryMsg::Config {}).await
    }

    pub async fn market(&self, executor: &dyn QueryExecutor) -> Result<MarketResponse, QueryError> {
        smart_query(executor, &self.address, &LegacyQueryMsg::Market {}).await
    }

    pub async fn round(
        &self,
        executor: &dyn QueryExecutor,
        round_id: u64,
    ) -> Result<RoundResponse, QueryError> {
        smart_query(executor, &self.address, &LegacyQueryMsg::Round { round_id }).await
    }

    pub async fn round_history(
        &self,
        executor: &dyn QueryExecutor,
        rounds_after: Option<u64>,
        limit: Option<u32>,
    ) -> Result<RoundHistoryResponse, QueryError> {
        let msg = LegacyQueryMsg::RoundHistory {
            rounds_after,
            limit,
        };
        smart_query(executor, &self.address, &msg).await
    }
}

impl MarketCommands for LegacyMarketContract {
    fn contract_address(&self) -> &str {
        &self.address
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex;

    /// Records the queries it receives and replies with a canned response.
    struct MockExecutor {
        seen: Mutex<Vec<(String, serde_json::Value)>>,
        response: serde_json::Value,
    }

    impl MockExecutor {
        fn returning(response: serde_json::Value) -> Self {
            Self {
                seen: Mutex::new(Vec::new()),
                response,
            }
        }
    }

    #[async_trait]
    impl QueryExecutor for MockExecutor {
        async fn smart_query(
            &self,
            contract: &str,
            msg: &serde_json::Value,
        ) -> Result<serde_json::Value, QueryError> {
            self.seen
                .lock()
                .unwrap()
                .push((contract.to_string(), msg.clone()));
            Ok(self.response.clone())
        }
    }

    struct FailingExecutor;

    #[async_trait]
    impl QueryExecutor for FailingExecutor {
        async fn smart_query(
            &self,
            _contract: &str,
            _msg: &serde_json::Value,
        ) -> Result<serde_json::Value, QueryError> {
            Err(QueryError::executor("node unreachable"))
        }
    }

    #[test]
    fn bet_intent_carries_funds() {
        let contract = MarketContract::new("terra1market");
        let intent = contract.bet(
            "terra1sender",
            5,
            "100",
            BetDirection::Up,
            vec![Coin::new("uusd", "100")],
        );
        assert_eq!(intent.sender, "terra1sender");
        assert_eq!(intent.contract, "terra1market");
        assert_eq!(intent.funds, vec![Coin::new("uusd", "100")]);
        assert_eq!(
            serde_json::to_value(&intent.msg).unwrap(),
            json!({"bet": {"round_id": 5, "amount": "100", "direction": "up"}})
        );
    }

    #[test]
    fn lifecycle_intents_attach_no_funds() {
        let contract = MarketContract::new("terra1market");
        assert!(contract.close_market("terra1owner").funds.is_empty());
        assert!(contract.open_market("terra1owner").funds.is_empty());
        assert!(contract.pause_market("terra1owner").funds.is_empty());
        assert!(contract.claim("terra1sender", vec![1, 2]).funds.is_empty());
    }

    #[test]
    fn legacy_contract_builds_identical_commands() {
        let current = MarketContract::new("terra1market");
        let legacy = LegacyMarketContract::new("terra1market");
        assert_eq!(
            current.cancel_round("terra1owner", 9),
            legacy.cancel_round("terra1owner", 9)
        );
    }

    #[tokio::test]
    async fn market_query_sends_expected_message() {
        let executor = MockExecutor::returning(json!({
            "open_round_id": 12,
            "locked_round_id": 11,
            "closed_round_id": 10,
            "status": "open"
        }));
        let contract = MarketContract::new("terra1market");
        let market = contract.market(&executor).await.unwrap();
        assert_eq!(market.open_round_id, 12);
        assert_eq!(market.status, msg::MarketStatus::Open);

        let seen = executor.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].0, "terra1market");
        assert_eq!(seen[0].1, json!({"market": {}}));
    }

    #[tokio::test]
    async fn legacy_bet_stats_maps_scalar_counts() {
        let executor = MockExecutor::returning(json!({
            "amount_played": "400",
            "amount_to_claim": "0",
            "amount_won": "120",
            "rounds_played": 4,
            "rounds_won": 1,
            "rounds_lost": 3
        }));
        let contract = LegacyMarketContract::new("terra1market");
        let stats = contract.bet_stats(&executor, "terra1addr").await.unwrap();
        assert_eq!(stats.rounds_won, 1);
        assert_eq!(stats.amount_won, "120");
    }

    #[tokio::test]
    async fn shape_mismatch_surfaces_schema_error() {
        // Legacy-shaped response fed to a current-generation client.
        let executor = MockExecutor::returning(json!({
            "address": "terra1addr",
            "amount": "100",
            "claimed": false,
            "direction": "up",
            "is_claimable": false,
            "amount_won": "0"
        }));
        let contract = MarketContract::new("terra1market");
        let err = contract
            .bet_info(&executor, "terra1addr", 5)
            .await
            .unwrap_err();
        assert!(matches!(err, QueryError::Schema(_)));
    }

    #[tokio::test]
    async fn executor_failure_propagates() {
        let contract = MarketContract::new("terra1market");
        let err = contract.config(&FailingExecutor).await.unwrap_err();
        assert!(matches!(err, QueryError::Executor(_)));
    }

    #[tokio::test]
    async fn signer_failure_passes_through() {
        struct RejectingSigner;

        #[async_trait]
        impl TransactionSigner for RejectingSigner {
            async fn sign_and_broadcast(
                &self,
                _intent: &ExecuteIntent,
            ) -> Result<TxResult, TransactionError> {
                Err(TransactionError::new("insufficient funds"))
            }
        }

        let contract = MarketContract::new("terra1market");
        let intent = contract.claim("terra1sender", vec![3]);
        let err = RejectingSigner
            .sign_and_broadcast(&intent)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("transaction failed"));
    }
}
