//! Security-focused logging module to track authentication events
//!
//! Identities are only written to the log in development mode; secrets and
//! hashes never reach this module.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// Types of security events to track
#[derive(Debug, Clone)]
pub enum SecurityEvent {
    // Authentication events
    LoginFailed { identity: String },
    LoginSucceeded { identity: String },
    TokenRejected { reason: String },

    // Account changes
    SecretChanged { identity: String },
    IdentityChanged { old_identity: String, new_identity: String },
    ChangeRejected { identity: String, operation: String, reason: String },

    // Provisioning
    AccountCreated { identity: String },
}

/// Security event with timestamp
#[derive(Debug, Clone)]
struct TimestampedEvent {
    event: SecurityEvent,
    timestamp: Instant,
}

/// Security logger for tracking and alerting on security events
pub struct SecurityLogger {
    events: Arc<RwLock<Vec<TimestampedEvent>>>,
    event_counts: Arc<RwLock<HashMap<String, usize>>>,
    max_events: usize,
    alert_thresholds: HashMap<String, usize>,
    reveal_identities: bool,
}

impl Default for SecurityLogger {
    fn default() -> Self {
        Self::new(false)
    }
}

impl SecurityLogger {
    /// Create a new security logger; `reveal_identities` puts account names into log lines
    pub fn new(reveal_identities: bool) -> Self {
        let mut alert_thresholds = HashMap::new();
        alert_thresholds.insert("login_failed".to_string(), 5);
        alert_thresholds.insert("token_rejected".to_string(), 10);
        alert_thresholds.insert("change_rejected".to_string(), 5);

        Self {
            events: Arc::new(RwLock::new(Vec::new())),
            event_counts: Arc::new(RwLock::new(HashMap::new())),
            max_events: 10000,
            alert_thresholds,
            reveal_identities,
        }
    }

    fn who<'a>(&self, identity: &'a str) -> &'a str {
        if self.reveal_identities {
            identity
        } else {
            "<hidden>"
        }
    }

    /// Log a security event
    pub async fn log_event(&self, event: SecurityEvent) {
        let event_key = Self::event_key(&event);

        {
            let mut events = self.events.write().await;
            events.push(TimestampedEvent {
                event: event.clone(),
                timestamp: Instant::now(),
            });

            // Limit memory usage
            if events.len() > self.max_events {
                let events_to_remove = events.len() - self.max_events;
                events.drain(0..events_to_remove);
            }
        }

        {
            let mut counts = self.event_counts.write().await;
            let count = counts.entry(event_key.to_string()).or_insert(0);
            *count += 1;

            if let Some(&threshold) = self.alert_thresholds.get(event_key) {
                if *count % threshold == 0 {
                    log::error!(
                        "SECURITY ALERT: {} events of type '{}' recorded",
                        count,
                        event_key
                    );
                }
            }
        }

        match &event {
            SecurityEvent::LoginFailed { identity } => {
                log::warn!("SECURITY: Login failed - User: {}", self.who(identity));
            }
            SecurityEvent::LoginSucceeded { identity } => {
                log::info!("SECURITY: Login succeeded - User: {}", self.who(identity));
            }
            SecurityEvent::TokenRejected { reason } => {
                log::warn!("SECURITY: Token rejected - Reason: {}", reason);
            }
            SecurityEvent::SecretChanged { identity } => {
                log::info!("SECURITY: Password changed - User: {}", self.who(identity));
            }
            SecurityEvent::IdentityChanged { old_identity, new_identity } => {
                log::info!(
                    "SECURITY: Username changed - From: {}, To: {}",
                    self.who(old_identity),
                    self.who(new_identity)
                );
            }
            SecurityEvent::ChangeRejected { identity, operation, reason } => {
                log::warn!(
                    "SECURITY: {} rejected - User: {}, Reason: {}",
                    operation,
                    self.who(identity),
                    reason
                );
            }
            SecurityEvent::AccountCreated { identity } => {
                log::info!("SECURITY: Account created - User: {}", self.who(identity));
            }
        }
    }

    fn event_key(event: &SecurityEvent) -> &'static str {
        match event {
            SecurityEvent::LoginFailed { .. } => "login_failed",
            SecurityEvent::LoginSucceeded { .. } => "login_succeeded",
            SecurityEvent::TokenRejected { .. } => "token_rejected",
            SecurityEvent::SecretChanged { .. } => "secret_changed",
            SecurityEvent::IdentityChanged { .. } => "identity_changed",
            SecurityEvent::ChangeRejected { .. } => "change_rejected",
            SecurityEvent::AccountCreated { .. } => "account_created",
        }
    }

    /// Get recent security events
    pub async fn get_recent_events(&self, duration: Duration) -> Vec<SecurityEvent> {
        let events = self.events.read().await;
        let now = Instant::now();

        events
            .iter()
            .filter(|event| now.duration_since(event.timestamp) <= duration)
            .map(|event| event.event.clone())
            .collect()
    }

    /// Get event statistics
    pub async fn get_event_stats(&self) -> HashMap<String, usize> {
        self.event_counts.read().await.clone()
    }

    /// Clean up old events
    pub async fn cleanup_old_events(&self, max_age: Duration) {
        let mut events = self.events.write().await;
        let now = Instant::now();

        events.retain(|event| now.duration_since(event.timestamp) <= max_age);
    }

    /// Start periodic cleanup task
    pub fn start_cleanup_task(self: Arc<Self>) {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(300)); // Every 5 minutes
            loop {
                interval.tick().await;
                self.cleanup_old_events(Duration::from_secs(3600 * 24)).await; // Keep 24 hours
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_events_are_counted() {
        let logger = SecurityLogger::new(false);
        for _ in 0..3 {
            logger
                .log_event(SecurityEvent::LoginFailed { identity: "admin".to_string() })
                .await;
        }
        logger
            .log_event(SecurityEvent::TokenRejected { reason: "expired".to_string() })
            .await;

        let stats = logger.get_event_stats().await;
        assert_eq!(stats.get("login_failed"), Some(&3));
        assert_eq!(stats.get("token_rejected"), Some(&1));
        assert_eq!(logger.get_recent_events(Duration::from_secs(60)).await.len(), 4);
    }

    #[tokio::test]
    async fn test_event_list_is_bounded() {
        let mut logger = SecurityLogger::new(false);
        logger.max_events = 2;
        for i in 0..5 {
            logger
                .log_event(SecurityEvent::TokenRejected { reason: i.to_string() })
                .await;
        }

        let recent = logger.get_recent_events(Duration::from_secs(60)).await;
        assert_eq!(recent.len(), 2);
        assert!(matches!(&recent[1], SecurityEvent::TokenRejected { reason } if reason == "4"));
    }

    #[test]
    fn test_identities_hidden_unless_revealed() {
        assert_eq!(SecurityLogger::new(false).who("admin"), "<hidden>");
        assert_eq!(SecurityLogger::new(true).who("admin"), "admin");
    }

    #[tokio::test]
    async fn test_cleanup_drops_everything_older_than_max_age() {
        let logger = SecurityLogger::new(false);
        logger
            .log_event(SecurityEvent::AccountCreated { identity: "admin".to_string() })
            .await;
        tokio::time::sleep(Duration::from_millis(5)).await;

        logger.cleanup_old_events(Duration::from_millis(0)).await;
        assert!(logger.get_recent_events(Duration::from_secs(60)).await.is_empty());
    }
}
