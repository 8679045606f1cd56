#![deny(unreachable_pub)]
pub mod config;
pub mod market;

pub use crate::config::Settings;
pub use market::{
    calculate_recycle_coins, format_length, market_menu, ChatEvent, ConfirmOutcome, ConfirmPolicy,
    ConfirmRegistry, ListReceipt, Listing, MarketBook, MarketCommand, MarketConfig, MarketError,
    MarketHandler, MarketManager, MarketResult, MarketRunner, ProfileStore, PurchaseReceipt,
    RecyclePreview, RecycleReceipt, Reply, RunnerConfig, StateManager, StatusOracle, UserProfile,
};
