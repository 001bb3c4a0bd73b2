//! KvStore trait + KvOps CRUD operations.

use std::marker::PhantomData;
use std::sync::Arc;

use portfolio_core::ServiceError;
use portfolio_kv::{KVError, KVStore};
use serde::{de::DeserializeOwned, Serialize};

/// Trait implemented by models to declare KV storage behavior.
///
/// Hooks have default no-op impls. They only touch the record itself;
/// cross-record reactions belong to the service that owns the model.
pub trait KvStore: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Human-readable record kind, used in error messages.
    const KIND: &'static str;

    /// KV key prefix: "{module}:{resource}:".
    fn kv_prefix() -> &'static str;

    /// Key of this instance, appended to the prefix.
    fn key_value(&self) -> String;

    /// Called before inserting a new record.
    fn before_create(&mut self) {}

    /// A field whose value must be unique across records, as
    /// `(field name, value)`. Claimed in the same transaction as the
    /// record write.
    fn unique_field(&self) -> Option<(&'static str, String)> {
        None
    }
}

/// CRUD operations for a KvStore model.
pub struct KvOps<T: KvStore> {
    kv: Arc<dyn KVStore>,
    _phantom: PhantomData<T>,
}

impl<T: KvStore> Clone for KvOps<T> {
    fn clone(&self) -> Self {
        Self::new(Arc::clone(&self.kv))
    }
}

impl<T: KvStore> KvOps<T> {
    pub fn new(kv: Arc<dyn KVStore>) -> Self {
        Self {
            kv,
            _phantom: PhantomData,
        }
    }

    fn make_key(id: &str) -> String {
        format!("{}{}", T::kv_prefix(), id)
    }

    fn kv_err(e: KVError) -> ServiceError {
        ServiceError::Storage(e.to_string())
    }

    fn decode(bytes: &[u8]) -> Result<T, ServiceError> {
        serde_json::from_slice(bytes)
            .map_err(|e| ServiceError::Internal(format!("deserialize {}: {}", T::KIND, e)))
    }

    fn encode(record: &T) -> Result<Vec<u8>, ServiceError> {
        serde_json::to_vec(record)
            .map_err(|e| ServiceError::Internal(format!("serialize {}: {}", T::KIND, e)))
    }

    /// Allocate the next numeric id for this model (1, 2, 3, ...).
    ///
    /// The counter lives outside the record prefix so `list` never sees it.
    pub fn next_id(&self) -> Result<u64, ServiceError> {
        let key = format!("seq:{}", T::kv_prefix().trim_end_matches(':'));
        self.kv.increment(&key).map_err(Self::kv_err)
    }

    /// Get a record by key value. Returns None if not found.
    pub fn get(&self, id: &str) -> Result<Option<T>, ServiceError> {
        match self.kv.get(&Self::make_key(id)).map_err(Self::kv_err)? {
            Some(bytes) => Self::decode(&bytes).map(Some),
            None => Ok(None),
        }
    }

    /// Get a record or return NotFound.
    pub fn get_or_err(&self, id: &str) -> Result<T, ServiceError> {
        self.get(id)?
            .ok_or_else(|| ServiceError::NotFound(format!("{} '{}' not found", T::KIND, id)))
    }

    /// All records under this prefix, in key order.
    pub fn list(&self) -> Result<Vec<T>, ServiceError> {
        self.kv
            .scan(T::kv_prefix())
            .map_err(Self::kv_err)?
            .iter()
            .map(|(_key, bytes)| Self::decode(bytes))
            .collect()
    }

    /// First record matching a predicate, scanning in key order.
    pub fn find(&self, pred: impl Fn(&T) -> bool) -> Result<Option<T>, ServiceError> {
        Ok(self.list()?.into_iter().find(|r| pred(r)))
    }

    pub fn count(&self) -> Result<usize, ServiceError> {
        Ok(self.kv.scan(T::kv_prefix()).map_err(Self::kv_err)?.len())
    }

    fn unique_key(field: &str, value: &str) -> String {
        format!("unique:{}{}:{}", T::kv_prefix(), field, value)
    }

    fn taken(field: &str, value: &str) -> ServiceError {
        ServiceError::Conflict(format!("{} '{}' is already taken", field, value))
    }

    /// Look a record up through its unique field.
    pub fn find_unique(&self, field: &str, value: &str) -> Result<Option<T>, ServiceError> {
        let index = self
            .kv
            .get(&Self::unique_key(field, value))
            .map_err(Self::kv_err)?;
        match index {
            Some(id) => self.get(&String::from_utf8_lossy(&id)),
            None => Ok(None),
        }
    }

    /// Insert a new record. Calls before_create, rejects duplicate keys and
    /// taken unique values; the checks and the write are one transaction.
    pub fn save_new(&self, mut record: T) -> Result<T, ServiceError> {
        record.before_create();

        let id = record.key_value();
        let key = Self::make_key(&id);
        let data = Self::encode(&record)?;
        let unique = record.unique_field().map(|(field, value)| {
            let index = Self::unique_key(field, &value);
            (field, value, index)
        });

        let mut guards = vec![key.as_str()];
        let mut sets = vec![(key.as_str(), data.as_slice())];
        if let Some((_, _, index)) = &unique {
            guards.push(index.as_str());
            sets.push((index.as_str(), id.as_bytes()));
        }

        if self
            .kv
            .write_if_absent(&guards, &sets, &[])
            .map_err(Self::kv_err)?
        {
            return Ok(record);
        }
        if let Some((field, value, index)) = unique {
            if self.kv.get(&index).map_err(Self::kv_err)?.is_some() {
                return Err(Self::taken(field, &value));
            }
        }
        Err(ServiceError::Conflict(format!(
            "{} '{}' already exists",
            T::KIND,
            id
        )))
    }

    /// Overwrite a record. A changed unique value is claimed and the old
    /// one released in the same transaction.
    pub fn save(&self, record: T) -> Result<T, ServiceError> {
        let id = record.key_value();
        let key = Self::make_key(&id);
        let data = Self::encode(&record)?;

        let Some((field, value)) = record.unique_field() else {
            self.kv.set(&key, &data).map_err(Self::kv_err)?;
            return Ok(record);
        };
        let previous = self
            .get(&id)?
            .and_then(|old| old.unique_field())
            .map(|(_, old)| old);
        if previous.as_deref() == Some(value.as_str()) {
            self.kv.set(&key, &data).map_err(Self::kv_err)?;
            return Ok(record);
        }

        let index = Self::unique_key(field, &value);
        let released = previous.map(|old| Self::unique_key(field, &old));
        let deletes: Vec<&str> = released.iter().map(String::as_str).collect();
        let claimed = self
            .kv
            .write_if_absent(
                &[index.as_str()],
                &[(key.as_str(), data.as_slice()), (index.as_str(), id.as_bytes())],
                &deletes,
            )
            .map_err(Self::kv_err)?;
        if !claimed {
            return Err(Self::taken(field, &value));
        }
        Ok(record)
    }

    /// Write several records in one transaction, without hooks or
    /// unique-field claims.
    pub fn save_all(&self, records: &[T]) -> Result<(), ServiceError> {
        let encoded = records
            .iter()
            .map(|r| Ok((Self::make_key(&r.key_value()), Self::encode(r)?)))
            .collect::<Result<Vec<_>, ServiceError>>()?;
        let entries: Vec<(&str, &[u8])> = encoded
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_slice()))
            .collect();
        self.kv.batch_set(&entries).map_err(Self::kv_err)
    }
}
