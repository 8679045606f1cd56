//! Market-specific error types

use thiserror::Error;

/// Errors that can occur in market operations
///
/// Precondition failures carry their user-facing rejection text as the
/// `Display` message, so the command layer replies with them directly.
#[derive(Error, Debug, Clone)]
pub enum MarketError {
    #[error("你还没有注册牛牛")]
    NotRegistered,

    #[error("变性状态下无法使用牛牛集市")]
    StatusLocked,

    #[error("你的牛牛长度太小，无法上架")]
    LengthTooSmall,

    #[error("你已经有牛牛在集市上了")]
    AlreadyListed,

    #[error("价格必须为正整数")]
    InvalidPrice,

    #[error("该商品不存在或已被购买")]
    ListingNotFound,

    #[error("不能购买自己的商品")]
    SelfPurchase,

    #[error("金币不足，需要{needed}金币")]
    InsufficientCoins { needed: i64 },

    #[error("无法完成交易，卖家数据异常")]
    SellerDataAnomaly,

    #[error("你没有可回收的牛牛")]
    NothingToRecycle,

    #[error("牛牛长度已发生变化，回收已取消")]
    LengthChanged,

    #[error("State persistence error: {0}")]
    Persistence(String),

    #[error("Profile store error: {0}")]
    Profile(String),
}

impl From<std::io::Error> for MarketError {
    fn from(err: std::io::Error) -> Self {
        MarketError::Persistence(err.to_string())
    }
}

impl From<serde_json::Error> for MarketError {
    fn from(err: serde_json::Error) -> Self {
        MarketError::Persistence(err.to_string())
    }
}

/// Result type for market operations
pub type MarketResult<T> = std::result::Result<T, MarketError>;
