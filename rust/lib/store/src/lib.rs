//! Typed record storage on top of the byte-level KV store.
//!
//! A model implements [`KvStore`] to declare its key prefix and hooks;
//! [`KvOps`] provides the CRUD operations.
//!
//! ```ignore
//! impl KvStore for Account {
//!     const KIND: &'static str = "account";
//!     fn kv_prefix() -> &'static str { "portfolio:account:" }
//!     fn key_value(&self) -> String { self.id.to_string() }
//! }
//! ```

pub mod kv;

pub use kv::{KvOps, KvStore};
