//! Payment provider webhook payloads

use serde::{Deserialize, Serialize};

/// Event name that upgrades a user to Chirpy Red
pub const USER_UPGRADED_EVENT: &str = "user.upgraded";

/// Webhook request body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookEvent {
    pub event: String,

    #[serde(default)]
    pub data: WebhookData,
}

/// Webhook event data
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookData {
    /// Target user ID, unparsed
    #[serde(default)]
    pub user_id: String,
}

impl WebhookEvent {
    /// Create an upgrade event for a user
    pub fn user_upgraded(user_id: impl Into<String>) -> Self {
        Self {
            event: USER_UPGRADED_EVENT.to_string(),
            data: WebhookData {
                user_id: user_id.into(),
            },
        }
    }

    /// Check if this event upgrades a user
    pub fn is_upgrade(&self) -> bool {
        self.event == USER_UPGRADED_EVENT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_webhook_event_parse() {
        let event: WebhookEvent = serde_json::from_str(
            r#"{"event":"user.upgraded","data":{"user_id":"3311741c-680c-4546-99f3-fc9efac2036c"}}"#,
        )
        .unwrap();

        assert!(event.is_upgrade());
        assert_eq!(event.data.user_id, "3311741c-680c-4546-99f3-fc9efac2036c");
    }

    #[test]
    fn test_webhook_other_event_without_data() {
        let event: WebhookEvent = serde_json::from_str(r#"{"event":"user.payment_failed"}"#).unwrap();
        assert!(!event.is_upgrade());
        assert!(event.data.user_id.is_empty());
    }
}
