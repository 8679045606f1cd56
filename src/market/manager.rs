//! Core market operations - listing, purchase, recycle

use std::sync::Arc;

use log::{error, info};

use super::config::{ConfirmPolicy, MarketConfig};
use super::errors::{MarketError, MarketResult};
use super::profile::{ProfileStore, StatusOracle};
use super::state::{MarketBook, StateManager};
use super::types::{
    format_length, ListReceipt, Listing, PurchaseReceipt, RecyclePreview, RecycleReceipt,
    UserProfile,
};

/// One coin is paid per started chunk of this many cm when recycling
const RECYCLE_CHUNK_CM: f64 = 20.0;

/// Coins gained by recycling the given length
///
/// Ceiling division: a partial chunk still pays a full coin.
pub fn calculate_recycle_coins(length: f64) -> i64 {
    (length / RECYCLE_CHUNK_CM).ceil() as i64
}

/// Market manager - owns the book and the four operations
///
/// Every mutating operation holds the book's write lock across its whole
/// check-then-mutate-then-persist span, so concurrent list/buy/recycle
/// calls serialize instead of interleaving on the shared book.
pub struct MarketManager<P, S> {
    config: MarketConfig,
    profiles: Arc<P>,
    status: Arc<S>,
    state: StateManager,
}

impl<P: ProfileStore, S: StatusOracle> MarketManager<P, S> {
    pub fn new(config: MarketConfig, profiles: Arc<P>, status: Arc<S>) -> Self {
        let state = StateManager::load_or_create(&config);
        Self {
            config,
            profiles,
            status,
            state,
        }
    }

    pub fn config(&self) -> &MarketConfig {
        &self.config
    }

    /// Preconditions for listing, first failure wins
    pub async fn check_listing_allowed(&self, group_id: &str, user_id: &str) -> MarketResult<()> {
        let book = self.state.read().await;
        self.check_listing_allowed_in(&book, group_id, user_id).await
    }

    async fn check_listing_allowed_in(
        &self,
        book: &MarketBook,
        group_id: &str,
        user_id: &str,
    ) -> MarketResult<()> {
        let user = self
            .profiles
            .get_user(group_id, user_id)
            .await?
            .ok_or(MarketError::NotRegistered)?;

        if self.status.is_gender_surgery_active(group_id, user_id).await {
            return Err(MarketError::StatusLocked);
        }

        if user.length <= 0.0 {
            return Err(MarketError::LengthTooSmall);
        }

        if book.has_listing_by(group_id, user_id) {
            return Err(MarketError::AlreadyListed);
        }

        Ok(())
    }

    /// 上架牛牛: snapshot the user's niuniu into a new listing
    ///
    /// All checks precede all mutation; on failure nothing changes.
    pub async fn list(&self, group_id: &str, user_id: &str, price: i64) -> MarketResult<ListReceipt> {
        let mut book = self.state.write().await;

        self.check_listing_allowed_in(&book, group_id, user_id).await?;
        if price <= 0 {
            return Err(MarketError::InvalidPrice);
        }

        let mut user = self
            .profiles
            .get_user(group_id, user_id)
            .await?
            .ok_or(MarketError::NotRegistered)?;
        let length = user.length;
        let hardness = user.hardness;

        let item_id = book.allocate_id();
        book.insert(item_id, Listing::new(group_id, user_id, length, hardness, price));

        user.length = 0.0;
        self.store_profile(group_id, user_id, &user).await;
        self.state.persist(&book);

        info!(
            "{}@{} listed item {} ({}) for {} coins",
            user_id,
            group_id,
            item_id,
            format_length(length),
            price
        );
        Ok(ListReceipt {
            item_id,
            length,
            price,
        })
    }

    /// 购买牛牛: transfer the listing to the buyer for its asking price
    ///
    /// The seller is looked up fresh from the profile store; if the profile
    /// has since become unavailable the purchase fails and nothing mutates.
    pub async fn buy(
        &self,
        group_id: &str,
        buyer_id: &str,
        item_id: u64,
    ) -> MarketResult<PurchaseReceipt> {
        let mut book = self.state.write().await;

        let listing = book
            .get(item_id)
            .cloned()
            .ok_or(MarketError::ListingNotFound)?;

        if listing.is_owned_by(group_id, buyer_id) {
            return Err(MarketError::SelfPurchase);
        }

        let mut buyer = self
            .profiles
            .get_user(group_id, buyer_id)
            .await?
            .ok_or(MarketError::NotRegistered)?;

        if self.status.is_gender_surgery_active(group_id, buyer_id).await {
            return Err(MarketError::StatusLocked);
        }

        if buyer.coins < listing.price {
            return Err(MarketError::InsufficientCoins {
                needed: listing.price,
            });
        }

        let mut seller = self
            .profiles
            .get_user(&listing.group_id, &listing.seller_id)
            .await?
            .ok_or(MarketError::SellerDataAnomaly)?;

        buyer.coins -= listing.price;
        seller.coins += listing.price;
        buyer.length += listing.length;
        buyer.hardness = buyer.hardness.max(listing.hardness);

        book.remove(item_id);

        self.store_profile(group_id, buyer_id, &buyer).await;
        self.store_profile(&listing.group_id, &listing.seller_id, &seller)
            .await;
        self.state.persist(&book);

        info!(
            "{}@{} bought item {} from {}@{} for {} coins",
            buyer_id, group_id, item_id, listing.seller_id, listing.group_id, listing.price
        );
        Ok(PurchaseReceipt {
            length: listing.length,
            hardness: listing.hardness,
            seller_nickname: seller.nickname.clone(),
            price: listing.price,
            new_length: buyer.length,
        })
    }

    /// 回收牛牛: convert the user's length into coins
    pub async fn recycle(&self, group_id: &str, user_id: &str) -> MarketResult<RecycleReceipt> {
        self.recycle_inner(group_id, user_id, None).await
    }

    /// Execute a confirmed recycle, applying the configured stale-preview policy
    pub async fn recycle_confirmed(
        &self,
        group_id: &str,
        user_id: &str,
        previewed_length: f64,
    ) -> MarketResult<RecycleReceipt> {
        let expected = match self.config.confirm_policy {
            ConfirmPolicy::RecycleCurrent => None,
            ConfirmPolicy::RequireUnchanged => Some(previewed_length),
        };
        self.recycle_inner(group_id, user_id, expected).await
    }

    async fn recycle_inner(
        &self,
        group_id: &str,
        user_id: &str,
        expected_length: Option<f64>,
    ) -> MarketResult<RecycleReceipt> {
        // The book is untouched, but the guard serializes a confirmed
        // recycle against a racing list or buy.
        let _book = self.state.write().await;

        let mut user = self
            .profiles
            .get_user(group_id, user_id)
            .await?
            .ok_or(MarketError::NotRegistered)?;

        if self.status.is_gender_surgery_active(group_id, user_id).await {
            return Err(MarketError::StatusLocked);
        }

        if user.length <= 0.0 {
            return Err(MarketError::NothingToRecycle);
        }

        if let Some(expected) = expected_length {
            if (user.length - expected).abs() > f64::EPSILON {
                return Err(MarketError::LengthChanged);
            }
        }

        let length = user.length;
        let coins = calculate_recycle_coins(length);
        user.coins += coins;
        user.length = 0.0;
        self.store_profile(group_id, user_id, &user).await;

        info!(
            "{}@{} recycled {} for {} coins",
            user_id,
            group_id,
            format_length(length),
            coins
        );
        Ok(RecycleReceipt {
            length,
            coins,
            total_coins: user.coins,
        })
    }

    /// Preview of what a recycle would pay right now
    ///
    /// Only registration and length are checked here; the full precondition
    /// chain runs again when the recycle executes.
    pub async fn recycle_preview(
        &self,
        group_id: &str,
        user_id: &str,
    ) -> MarketResult<RecyclePreview> {
        let user = self
            .profiles
            .get_user(group_id, user_id)
            .await?
            .ok_or(MarketError::NotRegistered)?;

        if user.length <= 0.0 {
            return Err(MarketError::NothingToRecycle);
        }

        Ok(RecyclePreview {
            length: user.length,
            coins: calculate_recycle_coins(user.length),
        })
    }

    /// 查看集市: one line per listing, or the empty-market notice
    pub async fn render_listings(&self) -> String {
        let book = self.state.read().await;
        if book.is_empty() {
            return "🏪 牛牛集市空空如也，快来上架你的牛牛吧！".to_string();
        }

        let mut lines = vec!["🏪 牛牛集市商品列表：".to_string()];
        for (item_id, item) in &book.items {
            let seller_nickname = self.nickname(&item.group_id, &item.seller_id).await;
            lines.push(format!(
                "编号: {} | {}的牛牛 | 长度: {} | 价格: {}金币 | 硬度: {}",
                item_id,
                seller_nickname,
                format_length(item.length),
                item.price,
                item.hardness
            ));
        }
        lines.join("\n")
    }

    async fn nickname(&self, group_id: &str, user_id: &str) -> String {
        match self.profiles.get_user(group_id, user_id).await {
            Ok(Some(profile)) if !profile.nickname.is_empty() => profile.nickname,
            _ => "未知用户".to_string(),
        }
    }

    /// Profile writes are best-effort: the in-memory decision already
    /// happened, a failed save is logged and swallowed
    async fn store_profile(&self, group_id: &str, user_id: &str, profile: &UserProfile) {
        if let Err(e) = self.profiles.store_user(group_id, user_id, profile).await {
            error!("Failed to persist profile for {}@{}: {}", user_id, group_id, e);
        }
    }
}
