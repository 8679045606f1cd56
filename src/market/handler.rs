//! Chat-event entry point for the market

use std::sync::Arc;

use log::{debug, error};

use super::commands::{market_menu, MarketCommand, BUY_USAGE, LIST_USAGE};
use super::config::MarketConfig;
use super::confirm::{ConfirmOutcome, ConfirmRegistry};
use super::manager::MarketManager;
use super::profile::{ProfileStore, StatusOracle};
use super::types::format_length;

/// One inbound chat message
#[derive(Debug, Clone)]
pub struct ChatEvent {
    pub group_id: String,
    pub user_id: String,
    pub nickname: String,
    pub text: String,
}

impl ChatEvent {
    pub fn new(
        group_id: impl Into<String>,
        user_id: impl Into<String>,
        nickname: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            group_id: group_id.into(),
            user_id: user_id.into(),
            nickname: nickname.into(),
            text: text.into(),
        }
    }
}

/// Reply sent when a confirmation window closes without 「确认回收」
pub const RECYCLE_CANCELLED: &str = "❌ 回收操作已取消";

/// Market front door: resolves confirmations, applies the global gates,
/// and dispatches parsed commands to the manager
pub struct MarketHandler<P, S> {
    manager: MarketManager<P, S>,
    confirms: ConfirmRegistry,
    profiles: Arc<P>,
    status: Arc<S>,
}

impl<P: ProfileStore, S: StatusOracle> MarketHandler<P, S> {
    pub fn new(config: MarketConfig, profiles: Arc<P>, status: Arc<S>) -> Self {
        let confirms = ConfirmRegistry::new(config.confirm_timeout());
        let manager = MarketManager::new(config, profiles.clone(), status.clone());
        Self {
            manager,
            confirms,
            profiles,
            status,
        }
    }

    pub fn manager(&self) -> &MarketManager<P, S> {
        &self.manager
    }

    /// Handle one chat message; `None` when it is not market traffic
    pub async fn handle_event(&self, event: &ChatEvent) -> Option<String> {
        let command = MarketCommand::parse(&event.text)?;

        // A pending confirmation is resolved before any gate; the matcher
        // sees raw traffic
        if command == MarketCommand::ConfirmRecycle {
            return self.resolve_confirmation(event).await;
        }

        match self.profiles.is_plugin_enabled(&event.group_id).await {
            Ok(true) => {}
            Ok(false) => return Some("❌ 插件未启用".to_string()),
            Err(e) => {
                error!("Failed to read group data for {}: {}", event.group_id, e);
                return Some("❌ 插件未启用".to_string());
            }
        }

        if self
            .status
            .is_user_working(&event.group_id, &event.user_id)
            .await
        {
            return Some(format!("小南娘：{}，服务的时候要认真哦！", event.nickname));
        }

        Some(self.dispatch(command, event).await)
    }

    async fn dispatch(&self, command: MarketCommand, event: &ChatEvent) -> String {
        let group_id = &event.group_id;
        let user_id = &event.user_id;

        match command {
            MarketCommand::ShowMenu => market_menu(),
            MarketCommand::ListMarket => self.manager.render_listings().await,
            MarketCommand::List { price } => {
                match self.manager.list(group_id, user_id, price).await {
                    Ok(receipt) => format!(
                        "🎉 成功上架牛牛！\n编号: {}\n长度: {}\n价格: {}金币",
                        receipt.item_id,
                        format_length(receipt.length),
                        receipt.price
                    ),
                    Err(e) => e.to_string(),
                }
            }
            MarketCommand::ListUsage => LIST_USAGE.to_string(),
            MarketCommand::Buy { item_id } => {
                match self.manager.buy(group_id, user_id, item_id).await {
                    Ok(receipt) => format!(
                        "🎉 成功购买牛牛！\n长度: +{}\n硬度: {}\n卖家: {}\n花费: {}金币\n当前长度: {}",
                        format_length(receipt.length),
                        receipt.hardness,
                        receipt.seller_nickname,
                        receipt.price,
                        format_length(receipt.new_length)
                    ),
                    Err(e) => e.to_string(),
                }
            }
            MarketCommand::BuyUsage => BUY_USAGE.to_string(),
            MarketCommand::Recycle => self.begin_recycle(event).await,
            // Resolved before the gates; nothing pending means not market traffic
            MarketCommand::ConfirmRecycle => String::new(),
        }
    }

    async fn begin_recycle(&self, event: &ChatEvent) -> String {
        match self
            .manager
            .recycle_preview(&event.group_id, &event.user_id)
            .await
        {
            Ok(preview) => {
                let replaced = self
                    .confirms
                    .begin(
                        &event.group_id,
                        &event.user_id,
                        preview.length,
                        preview.coins,
                    )
                    .await;
                if replaced {
                    debug!(
                        "Replaced pending recycle confirmation for {}@{}",
                        event.user_id, event.group_id
                    );
                }
                format!(
                    "📊 回收预览:\n牛牛长度: {}\n预计可得: {}金币\n\n确认回收请回复「确认回收」",
                    format_length(preview.length),
                    preview.coins
                )
            }
            Err(e) => format!("❌ {}", e),
        }
    }

    async fn resolve_confirmation(&self, event: &ChatEvent) -> Option<String> {
        match self
            .confirms
            .take_confirmed(&event.group_id, &event.user_id)
            .await
        {
            ConfirmOutcome::Confirmed(pending) => Some(
                match self
                    .manager
                    .recycle_confirmed(&event.group_id, &event.user_id, pending.previewed_length)
                    .await
                {
                    Ok(receipt) => format!(
                        "🔄 成功回收牛牛！\n长度: {}\n获得金币: {}\n当前金币: {}",
                        format_length(receipt.length),
                        receipt.coins,
                        receipt.total_coins
                    ),
                    Err(e) => e.to_string(),
                },
            ),
            ConfirmOutcome::TimedOut => Some(RECYCLE_CANCELLED.to_string()),
            ConfirmOutcome::NotPending => None,
        }
    }

    /// Conversations whose confirmation window closed; the caller replies
    /// with [`RECYCLE_CANCELLED`] for each
    pub async fn take_expired_confirmations(&self) -> Vec<(String, String)> {
        self.confirms.take_expired().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::config::ConfirmPolicy;
    use crate::market::profile::mock::{MemoryProfileStore, StaticStatusOracle};
    use crate::market::types::UserProfile;
    use tokio::time::Duration;

    type TestHandler = MarketHandler<MemoryProfileStore, StaticStatusOracle>;

    async fn setup() -> (TestHandler, Arc<MemoryProfileStore>, Arc<StaticStatusOracle>) {
        setup_with(MarketConfig::default()).await
    }

    async fn setup_with(
        config: MarketConfig,
    ) -> (TestHandler, Arc<MemoryProfileStore>, Arc<StaticStatusOracle>) {
        let profiles = Arc::new(MemoryProfileStore::new());
        let status = Arc::new(StaticStatusOracle::new());
        profiles.set_plugin_enabled("g1", true).await;
        profiles
            .seed_user("g1", "alice", UserProfile::new("小爱", 40.0, 3, 10))
            .await;
        let handler = MarketHandler::new(config, profiles.clone(), status.clone());
        (handler, profiles, status)
    }

    fn event(user: &str, text: &str) -> ChatEvent {
        ChatEvent::new("g1", user, user, text)
    }

    #[tokio::test]
    async fn menu_and_non_commands() {
        let (handler, _, _) = setup().await;
        let reply = handler.handle_event(&event("alice", "牛牛集市")).await.unwrap();
        assert!(reply.starts_with("🏪 牛牛集市功能菜单："));

        assert!(handler.handle_event(&event("alice", "随便聊聊")).await.is_none());
    }

    #[tokio::test]
    async fn disabled_group_gate() {
        let (handler, profiles, _) = setup().await;
        profiles.set_plugin_enabled("g1", false).await;

        let reply = handler.handle_event(&event("alice", "查看集市")).await.unwrap();
        assert_eq!(reply, "❌ 插件未启用");
    }

    #[tokio::test]
    async fn working_user_gate() {
        let (handler, _, status) = setup().await;
        status.set_working("g1", "alice", true).await;

        let reply = handler.handle_event(&event("alice", "查看集市")).await.unwrap();
        assert_eq!(reply, "小南娘：alice，服务的时候要认真哦！");
    }

    #[tokio::test]
    async fn listing_and_usage_replies() {
        let (handler, _, _) = setup().await;

        let reply = handler.handle_event(&event("alice", "上架牛牛 100")).await.unwrap();
        assert_eq!(reply, "🎉 成功上架牛牛！\n编号: 1\n长度: 40cm\n价格: 100金币");

        let reply = handler.handle_event(&event("alice", "上架牛牛 好多")).await.unwrap();
        assert_eq!(reply, LIST_USAGE);

        let reply = handler.handle_event(&event("alice", "购买牛牛 x")).await.unwrap();
        assert_eq!(reply, BUY_USAGE);
    }

    #[tokio::test]
    async fn purchase_reply_contains_the_trade() {
        let (handler, profiles, _) = setup().await;
        profiles
            .seed_user("g1", "bob", UserProfile::new("阿波", 5.0, 2, 200))
            .await;

        handler.handle_event(&event("alice", "上架牛牛 150")).await.unwrap();
        let reply = handler.handle_event(&event("bob", "购买牛牛 1")).await.unwrap();
        assert_eq!(
            reply,
            "🎉 成功购买牛牛！\n长度: +40cm\n硬度: 3\n卖家: 小爱\n花费: 150金币\n当前长度: 45cm"
        );

        let reply = handler.handle_event(&event("bob", "购买牛牛 1")).await.unwrap();
        assert_eq!(reply, "该商品不存在或已被购买");
    }

    #[tokio::test]
    async fn recycle_preview_then_confirmation_applies_once() {
        let (handler, profiles, _) = setup().await;

        let reply = handler.handle_event(&event("alice", "回收牛牛")).await.unwrap();
        assert_eq!(
            reply,
            "📊 回收预览:\n牛牛长度: 40cm\n预计可得: 2金币\n\n确认回收请回复「确认回收」"
        );

        // Chatter in between does not consume the pending confirmation
        assert!(handler.handle_event(&event("alice", "还在吗")).await.is_none());
        assert_eq!(profiles.user("g1", "alice").await.unwrap().length, 40.0);

        let reply = handler.handle_event(&event("alice", "确认回收")).await.unwrap();
        assert_eq!(reply, "🔄 成功回收牛牛！\n长度: 40cm\n获得金币: 2\n当前金币: 12");

        let alice = profiles.user("g1", "alice").await.unwrap();
        assert_eq!(alice.length, 0.0);
        assert_eq!(alice.coins, 12);

        // A second confirmation has nothing to apply
        assert!(handler.handle_event(&event("alice", "确认回收")).await.is_none());
        assert_eq!(profiles.user("g1", "alice").await.unwrap().coins, 12);
    }

    #[tokio::test]
    async fn confirmation_without_preview_is_ignored() {
        let (handler, profiles, _) = setup().await;
        assert!(handler.handle_event(&event("alice", "确认回收")).await.is_none());
        assert_eq!(profiles.user("g1", "alice").await.unwrap().length, 40.0);
    }

    #[tokio::test]
    async fn recycle_preview_rejections_are_prefixed() {
        let (handler, profiles, _) = setup().await;
        profiles
            .seed_user("g1", "carol", UserProfile::new("carol", 0.0, 1, 0))
            .await;

        let reply = handler.handle_event(&event("carol", "回收牛牛")).await.unwrap();
        assert_eq!(reply, "❌ 你没有可回收的牛牛");

        let reply = handler.handle_event(&event("ghost", "回收牛牛")).await.unwrap();
        assert_eq!(reply, "❌ 你还没有注册牛牛");
    }

    #[tokio::test(start_paused = true)]
    async fn late_confirmation_cancels_instead_of_recycling() {
        let (handler, profiles, _) = setup().await;

        handler.handle_event(&event("alice", "回收牛牛")).await.unwrap();
        tokio::time::advance(Duration::from_secs(31)).await;

        let reply = handler.handle_event(&event("alice", "确认回收")).await.unwrap();
        assert_eq!(reply, RECYCLE_CANCELLED);
        assert_eq!(profiles.user("g1", "alice").await.unwrap().length, 40.0);
    }

    #[tokio::test(start_paused = true)]
    async fn expired_confirmations_are_swept() {
        let (handler, _, _) = setup().await;
        handler.handle_event(&event("alice", "回收牛牛")).await.unwrap();

        assert!(handler.take_expired_confirmations().await.is_empty());
        tokio::time::advance(Duration::from_secs(31)).await;
        assert_eq!(
            handler.take_expired_confirmations().await,
            vec![("g1".to_string(), "alice".to_string())]
        );
        // Swept once; the late confirmation is then ignored entirely
        assert!(handler.handle_event(&event("alice", "确认回收")).await.is_none());
    }

    #[tokio::test]
    async fn strict_policy_cancels_on_stale_preview() {
        let config = MarketConfig::new().with_confirm_policy(ConfirmPolicy::RequireUnchanged);
        let (handler, profiles, _) = setup_with(config).await;

        handler.handle_event(&event("alice", "回收牛牛")).await.unwrap();
        profiles
            .seed_user("g1", "alice", UserProfile::new("小爱", 21.0, 3, 10))
            .await;

        let reply = handler.handle_event(&event("alice", "确认回收")).await.unwrap();
        assert_eq!(reply, "牛牛长度已发生变化，回收已取消");
        assert_eq!(profiles.user("g1", "alice").await.unwrap().length, 21.0);
    }
}
