use serde::{Deserialize, Serialize};

/// Pagination for admin list pages.
#[derive(Debug, Clone, Deserialize)]
pub struct ListParams {
    /// Page size. Admin change lists show 100 rows per page.
    #[serde(default = "default_limit")]
    pub limit: usize,

    #[serde(default)]
    pub offset: usize,
}

fn default_limit() -> usize {
    100
}

impl Default for ListParams {
    fn default() -> Self {
        Self {
            limit: default_limit(),
            offset: 0,
        }
    }
}

impl ListParams {
    /// Slice an already-ordered collection into one page.
    pub fn page<T: Serialize>(&self, all: Vec<T>) -> ListResult<T> {
        let total = all.len();
        let items = all.into_iter().skip(self.offset).take(self.limit).collect();
        ListResult { items, total }
    }
}

/// Result wrapper for list operations.
#[derive(Debug, Clone, Serialize)]
pub struct ListResult<T: Serialize> {
    pub items: Vec<T>,
    pub total: usize,
}

/// Generate a new random opaque id (UUIDv4, no dashes).
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string().replace('-', "")
}

/// Current time as an RFC 3339 string.
pub fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// Merge a JSON patch into a base value (RFC 7386).
///
/// `null` removes the key, nested objects merge recursively, anything
/// else replaces.
pub fn merge_patch(base: &mut serde_json::Value, patch: &serde_json::Value) {
    if let (Some(base_obj), Some(patch_obj)) = (base.as_object_mut(), patch.as_object()) {
        for (key, value) in patch_obj {
            if value.is_null() {
                base_obj.remove(key);
            } else if value.is_object() {
                let entry = base_obj
                    .entry(key.clone())
                    .or_insert_with(|| serde_json::Value::Object(serde_json::Map::new()));
                merge_patch(entry, value);
            } else {
                base_obj.insert(key.clone(), value.clone());
            }
        }
    } else {
        *base = patch.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_id_has_no_dashes() {
        let id = new_id();
        assert_eq!(id.len(), 32);
        assert!(!id.contains('-'));
    }

    #[test]
    fn page_slices_and_counts() {
        let params = ListParams { limit: 2, offset: 1 };
        let page = params.page(vec![1, 2, 3, 4]);
        assert_eq!(page.items, vec![2, 3]);
        assert_eq!(page.total, 4);

        let past_end = ListParams { limit: 10, offset: 9 }.page(vec![1, 2]);
        assert!(past_end.items.is_empty());
        assert_eq!(past_end.total, 2);
    }

    #[test]
    fn merge_patch_removes_and_nests() {
        let mut base = serde_json::json!({
            "phone_number": "0123456789",
            "location": {"latitude": 1.0, "longitude": 2.0}
        });
        let patch = serde_json::json!({
            "phone_number": null,
            "location": {"latitude": -33.9},
            "home_address": "Cape Town"
        });
        merge_patch(&mut base, &patch);
        assert_eq!(
            base,
            serde_json::json!({
                "location": {"latitude": -33.9, "longitude": 2.0},
                "home_address": "Cape Town"
            })
        );
    }
}
