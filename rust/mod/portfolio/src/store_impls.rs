//! KvStore implementations for portfolio models.

use portfolio_core::now_rfc3339;
use portfolio_store::KvStore;

use crate::model::*;

// ── Account ──

impl KvStore for Account {
    const KIND: &'static str = "account";

    fn kv_prefix() -> &'static str {
        "portfolio:account:"
    }

    fn key_value(&self) -> String {
        self.id.to_string()
    }

    fn before_create(&mut self) {
        if self.date_joined.is_empty() {
            self.date_joined = now_rfc3339();
        }
    }

    fn unique_field(&self) -> Option<(&'static str, String)> {
        Some(("username", self.username.clone()))
    }
}

// ── Permission ──

impl KvStore for Permission {
    const KIND: &'static str = "permission";

    fn kv_prefix() -> &'static str {
        "portfolio:permission:"
    }

    fn key_value(&self) -> String {
        self.id.to_string()
    }
}

// ── AuditRecord ──

impl KvStore for AuditRecord {
    const KIND: &'static str = "audit record";

    fn kv_prefix() -> &'static str {
        "portfolio:audit:"
    }

    fn key_value(&self) -> String {
        self.id.to_string()
    }

    fn before_create(&mut self) {
        self.timestamp = now_rfc3339();
    }
}

// ── Session ──

impl KvStore for Session {
    const KIND: &'static str = "session";

    fn kv_prefix() -> &'static str {
        "portfolio:session:"
    }

    fn key_value(&self) -> String {
        self.id.clone()
    }
}
