//! Government official records managed by admins.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Official as returned by `/admin/officials`.
///
/// Fields the client does not interpret are kept in `extra` so the record
/// round-trips unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Official {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
