// Queue Settings Domain Model

use crate::domain::error::{DomainError, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Operator-facing queue configuration.
///
/// Lives in the persisted record and changes only through explicit setting updates.
/// Missing fields fall back to defaults so older records still load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueSettings {
    /// Master switch for interception
    pub enabled: bool,
    /// Pacing gap enforced before every send (also the retry cool-down)
    pub delay_ms: u64,
    /// Admission capacity ceiling (>= 1)
    pub max_queue_size: usize,
    /// When false the queue accumulates but is never drained
    pub auto_send: bool,
    /// Gate for enqueue/sent notifications
    pub show_notifications: bool,
    /// When set, composer submissions bypass the queue entirely
    pub queue_on_enter: bool,
}

impl Default for QueueSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            delay_ms: 2000,
            max_queue_size: 50,
            auto_send: true,
            show_notifications: true,
            queue_on_enter: false,
        }
    }
}

impl QueueSettings {
    /// Check invariants after deserialization or construction from config.
    pub fn validate(&self) -> Result<()> {
        if self.max_queue_size == 0 {
            return Err(DomainError::InvalidSettingValue {
                key: SettingKey::MaxQueueSize.to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Apply a single named update. The record is untouched on error.
    pub fn apply(&mut self, key: SettingKey, value: &serde_json::Value) -> Result<()> {
        match key {
            SettingKey::Enabled => self.enabled = expect_bool(key, value)?,
            SettingKey::AutoSend => self.auto_send = expect_bool(key, value)?,
            SettingKey::ShowNotifications => self.show_notifications = expect_bool(key, value)?,
            SettingKey::QueueOnEnter => self.queue_on_enter = expect_bool(key, value)?,
            SettingKey::DelayMs => self.delay_ms = expect_u64(key, value)?,
            SettingKey::MaxQueueSize => {
                let size = expect_u64(key, value)?;
                if size == 0 {
                    return Err(DomainError::InvalidSettingValue {
                        key: key.to_string(),
                        reason: "must be at least 1".to_string(),
                    });
                }
                self.max_queue_size = usize::try_from(size).map_err(|_| {
                    DomainError::InvalidSettingValue {
                        key: key.to_string(),
                        reason: "too large".to_string(),
                    }
                })?;
            }
        }
        Ok(())
    }
}

/// Recognized setting names
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingKey {
    Enabled,
    DelayMs,
    MaxQueueSize,
    AutoSend,
    ShowNotifications,
    QueueOnEnter,
}

impl SettingKey {
    pub const ALL: [SettingKey; 6] = [
        SettingKey::Enabled,
        SettingKey::DelayMs,
        SettingKey::MaxQueueSize,
        SettingKey::AutoSend,
        SettingKey::ShowNotifications,
        SettingKey::QueueOnEnter,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SettingKey::Enabled => "enabled",
            SettingKey::DelayMs => "delay_ms",
            SettingKey::MaxQueueSize => "max_queue_size",
            SettingKey::AutoSend => "auto_send",
            SettingKey::ShowNotifications => "show_notifications",
            SettingKey::QueueOnEnter => "queue_on_enter",
        }
    }
}

impl std::fmt::Display for SettingKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SettingKey {
    type Err = DomainError;

    // Accepts the snake_case names plus the camelCase spelling hosts tend to use.
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "enabled" => Ok(SettingKey::Enabled),
            "delay_ms" | "delayMs" | "delay" => Ok(SettingKey::DelayMs),
            "max_queue_size" | "maxQueueSize" => Ok(SettingKey::MaxQueueSize),
            "auto_send" | "autoSend" => Ok(SettingKey::AutoSend),
            "show_notifications" | "showNotifications" => Ok(SettingKey::ShowNotifications),
            "queue_on_enter" | "queueOnEnter" => Ok(SettingKey::QueueOnEnter),
            other => Err(DomainError::UnknownSetting(other.to_string())),
        }
    }
}

fn expect_bool(key: SettingKey, value: &serde_json::Value) -> Result<bool> {
    value
        .as_bool()
        .ok_or_else(|| DomainError::InvalidSettingValue {
            key: key.to_string(),
            reason: format!("expected a boolean, got {}", value),
        })
}

fn expect_u64(key: SettingKey, value: &serde_json::Value) -> Result<u64> {
    value
        .as_u64()
        .ok_or_else(|| DomainError::InvalidSettingValue {
            key: key.to_string(),
            reason: format!("expected a non-negative integer, got {}", value),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let settings = QueueSettings::default();
        assert!(settings.enabled);
        assert_eq!(settings.delay_ms, 2000);
        assert_eq!(settings.max_queue_size, 50);
        assert!(settings.auto_send);
        assert!(settings.show_notifications);
        assert!(!settings.queue_on_enter);
    }

    #[test]
    fn test_key_parsing_accepts_both_spellings() {
        assert_eq!("delay_ms".parse::<SettingKey>().unwrap(), SettingKey::DelayMs);
        assert_eq!("delayMs".parse::<SettingKey>().unwrap(), SettingKey::DelayMs);
        assert_eq!(
            "maxQueueSize".parse::<SettingKey>().unwrap(),
            SettingKey::MaxQueueSize
        );
        assert!(matches!(
            "showFloatingButton".parse::<SettingKey>(),
            Err(DomainError::UnknownSetting(_))
        ));
    }

    #[test]
    fn test_apply_type_mismatch_leaves_record_untouched() {
        let mut settings = QueueSettings::default();
        let before = settings.clone();

        assert!(settings.apply(SettingKey::Enabled, &json!("yes")).is_err());
        assert!(settings.apply(SettingKey::DelayMs, &json!(-5)).is_err());
        assert!(settings.apply(SettingKey::MaxQueueSize, &json!(0)).is_err());

        assert_eq!(settings, before);
    }

    #[test]
    fn test_apply_updates_single_field() {
        let mut settings = QueueSettings::default();
        settings.apply(SettingKey::DelayMs, &json!(500)).unwrap();
        settings.apply(SettingKey::AutoSend, &json!(false)).unwrap();

        assert_eq!(settings.delay_ms, 500);
        assert!(!settings.auto_send);
        assert_eq!(settings.max_queue_size, 50);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let settings: QueueSettings = serde_json::from_str(r#"{"delay_ms": 750}"#).unwrap();
        assert_eq!(settings.delay_ms, 750);
        assert_eq!(settings.max_queue_size, 50);
    }
}
