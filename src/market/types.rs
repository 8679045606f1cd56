//! Core data types for the niuniu market

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// A niuniu listed for sale
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Listing {
    /// Seller's user id
    pub seller_id: String,
    /// Group the seller listed from
    pub group_id: String,
    /// Length snapshotted at listing time, in cm
    pub length: f64,
    /// Hardness snapshotted at listing time
    pub hardness: i64,
    /// Asking price in coins
    pub price: i64,
    /// Unix timestamp of listing creation, informational only
    pub time: i64,
}

impl Listing {
    /// Create a new listing stamped with the current time
    pub fn new(group_id: &str, seller_id: &str, length: f64, hardness: i64, price: i64) -> Self {
        Self {
            seller_id: seller_id.to_string(),
            group_id: group_id.to_string(),
            length,
            hardness,
            price,
            time: Utc::now().timestamp(),
        }
    }

    /// Whether this listing belongs to the given user in the given group
    pub fn is_owned_by(&self, group_id: &str, user_id: &str) -> bool {
        self.seller_id == user_id && self.group_id == group_id
    }
}

/// A user's profile as seen through the external profile store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Display name
    pub nickname: String,
    /// Current length, in cm
    pub length: f64,
    /// Current hardness
    pub hardness: i64,
    /// Coin balance
    pub coins: i64,
}

impl UserProfile {
    pub fn new(nickname: impl Into<String>, length: f64, hardness: i64, coins: i64) -> Self {
        Self {
            nickname: nickname.into(),
            length,
            hardness,
            coins,
        }
    }
}

/// Result of a successful listing
#[derive(Debug, Clone)]
pub struct ListReceipt {
    /// Id assigned to the new listing
    pub item_id: u64,
    /// Length moved into the listing
    pub length: f64,
    /// Asking price
    pub price: i64,
}

/// Result of a successful purchase
#[derive(Debug, Clone)]
pub struct PurchaseReceipt {
    /// Length gained by the buyer
    pub length: f64,
    /// Hardness of the purchased niuniu
    pub hardness: i64,
    /// Seller's display name at purchase time
    pub seller_nickname: String,
    /// Coins paid
    pub price: i64,
    /// Buyer's total length after the purchase
    pub new_length: f64,
}

/// Result of a successful recycle
#[derive(Debug, Clone)]
pub struct RecycleReceipt {
    /// Length that was recycled
    pub length: f64,
    /// Coins gained
    pub coins: i64,
    /// Coin balance after the recycle
    pub total_coins: i64,
}

/// Preview shown before a recycle is confirmed
#[derive(Debug, Clone)]
pub struct RecyclePreview {
    /// Length that would be recycled
    pub length: f64,
    /// Coins that would be gained
    pub coins: i64,
}

/// Format a length for display; 100cm and above renders in meters
pub fn format_length(length: f64) -> String {
    if length >= 100.0 {
        format!("{:.2}m", length / 100.0)
    } else {
        let cm = format!("{:.2}", length);
        let cm = cm.trim_end_matches('0').trim_end_matches('.');
        format!("{}cm", cm)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listing_ownership_needs_both_keys() {
        let listing = Listing::new("g1", "alice", 40.0, 3, 100);
        assert!(listing.is_owned_by("g1", "alice"));
        assert!(!listing.is_owned_by("g2", "alice"));
        assert!(!listing.is_owned_by("g1", "bob"));
    }

    #[test]
    fn short_lengths_render_in_cm() {
        assert_eq!(format_length(42.0), "42cm");
        assert_eq!(format_length(45.6), "45.6cm");
        assert_eq!(format_length(0.25), "0.25cm");
    }

    #[test]
    fn long_lengths_render_in_meters() {
        assert_eq!(format_length(100.0), "1.00m");
        assert_eq!(format_length(123.0), "1.23m");
        assert_eq!(format_length(250.5), "2.51m");
    }
}
