//! Command-text surface: parsing and the static menu

/// Usage hint for a malformed listing price
pub const LIST_USAGE: &str = "❌ 请输入正确的价格，例如：上架牛牛 100";

/// Usage hint for a malformed item id
pub const BUY_USAGE: &str = "❌ 请输入正确的商品编号，例如：购买牛牛 1";

/// A parsed market command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarketCommand {
    /// 牛牛集市
    ShowMenu,
    /// 查看集市
    ListMarket,
    /// 上架牛牛 <价格>
    List { price: i64 },
    /// 上架牛牛 with a malformed price
    ListUsage,
    /// 购买牛牛 <编号>
    Buy { item_id: u64 },
    /// 购买牛牛 with a malformed id
    BuyUsage,
    /// 回收牛牛
    Recycle,
    /// 确认回收
    ConfirmRecycle,
}

impl MarketCommand {
    /// Parse a chat message; `None` when it is not market traffic
    pub fn parse(text: &str) -> Option<Self> {
        let msg = text.trim();
        match msg {
            "牛牛集市" => return Some(Self::ShowMenu),
            "查看集市" => return Some(Self::ListMarket),
            "回收牛牛" => return Some(Self::Recycle),
            "确认回收" => return Some(Self::ConfirmRecycle),
            _ => {}
        }

        if let Some(rest) = msg.strip_prefix("上架牛牛") {
            return Some(match rest.trim().parse::<i64>() {
                Ok(price) => Self::List { price },
                Err(_) => Self::ListUsage,
            });
        }

        if let Some(rest) = msg.strip_prefix("购买牛牛") {
            return Some(match rest.trim().parse::<u64>() {
                Ok(item_id) => Self::Buy { item_id },
                Err(_) => Self::BuyUsage,
            });
        }

        None
    }
}

/// 牛牛集市功能菜单
pub fn market_menu() -> String {
    [
        "🏪 牛牛集市功能菜单：",
        "📌 上架牛牛 [价格] - 将你的牛牛上架到集市",
        "📋 查看集市 - 查看所有在售的牛牛",
        "💰 购买牛牛 [编号] - 购买集市上的牛牛",
        "♻️ 回收牛牛 - 直接回收自己的牛牛（每20cm=1金币）",
        "",
        "⚠️ 注意：变性状态下无法使用牛牛集市",
        "⚠️ 上架或回收牛牛后，你的牛牛长度将变为0",
    ]
    .join("\n")
}
