//! 牛牛集市 - the marketplace feature module
//!
//! Users list their niuniu for sale, buy each other's, or recycle their own
//! for coins. The module is organized into several sub-modules:
//!
//! - [`config`] - market configuration (state file, confirmation window, policy)
//! - [`types`] - core data types (Listing, UserProfile, receipts)
//! - [`errors`] - market-specific error types
//! - [`state`] - the market book with JSON persistence
//! - [`profile`] - external profile/status seams (mockable for testing)
//! - [`manager`] - the four operations: list, buy, recycle, preview
//! - [`commands`] - the chat-text command surface
//! - [`confirm`] - the recycle confirmation state machine
//! - [`handler`] - chat-event entry point with the global gates
//! - [`runner`] - event-loop wiring over channels
//!
//! # Example Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use niuniu_market::market::profile::mock::{MemoryProfileStore, StaticStatusOracle};
//! use niuniu_market::{ChatEvent, MarketConfig, MarketHandler};
//!
//! let profiles = Arc::new(MemoryProfileStore::new());
//! let status = Arc::new(StaticStatusOracle::new());
//! let handler = MarketHandler::new(
//!     MarketConfig::new().with_state_file("data/market_book.json"),
//!     profiles,
//!     status,
//! );
//!
//! // Feed chat messages in; Some(reply) means market traffic was handled
//! let event = ChatEvent::new("group", "user", "昵称", "牛牛集市");
//! let reply = handler.handle_event(&event).await;
//! ```

pub mod commands;
pub mod config;
pub mod confirm;
pub mod errors;
pub mod handler;
pub mod manager;
pub mod profile;
pub mod runner;
pub mod state;
pub mod types;

// Re-export commonly used types
pub use commands::{market_menu, MarketCommand, BUY_USAGE, LIST_USAGE};
// self:: disambiguates from the `config` crate
pub use self::config::{ConfirmPolicy, MarketConfig};
pub use confirm::{ConfirmOutcome, ConfirmRegistry, PendingRecycle};
pub use errors::{MarketError, MarketResult};
pub use handler::{ChatEvent, MarketHandler, RECYCLE_CANCELLED};
pub use manager::{calculate_recycle_coins, MarketManager};
pub use profile::{ProfileStore, StatusOracle};
pub use runner::{MarketRunner, Reply, RunnerConfig};
pub use state::{MarketBook, StateManager};
pub use types::{
    format_length, ListReceipt, Listing, PurchaseReceipt, RecyclePreview, RecycleReceipt,
    UserProfile,
};
