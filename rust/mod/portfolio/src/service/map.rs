use portfolio_core::ServiceError;
use serde_json::{json, Value};

use crate::model::Account;
use crate::service::PortfolioService;

/// `[username, longitude, latitude, phone, home_address]`.
///
/// The phone is emitted as an integer when it parses as one, as an empty
/// string when absent, and verbatim otherwise.
fn map_row(account: &Account) -> Option<Value> {
    let location = account.location?;
    let phone = match account.phone_number.as_deref().map(str::trim) {
        None | Some("") => json!(""),
        Some(raw) => raw
            .trim_start_matches('+')
            .parse::<i64>()
            .map(Value::from)
            .unwrap_or_else(|_| json!(raw)),
    };
    Some(json!([
        account.username,
        location.longitude,
        location.latitude,
        phone,
        account.home_address,
    ]))
}

impl PortfolioService {
    /// One row per located account, ordered by id. Open to everyone.
    pub fn map_rows(&self) -> Result<Vec<Value>, ServiceError> {
        Ok(self.all_accounts()?.iter().filter_map(map_row).collect())
    }
}
