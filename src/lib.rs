//! Client SDK for UpDown round-based price prediction markets.
//!
//! Fabricates wire-exact contract messages (bets, round lifecycle,
//! claims, queries), wraps them into transaction intents or typed
//! queries, resolves market symbols through the off-chain directory, and
//! maintains the persistent hub connection that streams per-symbol
//! market updates.

pub mod api;
pub mod config;
pub mod contract;
pub mod ws;
