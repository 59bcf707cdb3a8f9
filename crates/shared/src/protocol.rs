use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::domain::{EntryId, GrowthStage, UserId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEntryRequest {
    pub title: String,
    pub content: String,
    pub growth_stage: GrowthStage,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEntryResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry: Option<Entry>,
}

impl CreateEntryResponse {
    /// Identifier of the created entry, if the service returned a usable one.
    pub fn entry_id(&self) -> Option<&EntryId> {
        self.entry
            .as_ref()
            .and_then(|entry| entry.id.as_ref())
            .filter(|id| !id.as_str().trim().is_empty())
    }
}

/// Entry as echoed by the service. Every field is optional on the wire since
/// the JSON mapping omits default values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<EntryId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub content: String,
    #[serde(
        default,
        deserialize_with = "lenient_growth_stage",
        skip_serializing_if = "Option::is_none"
    )]
    pub growth_stage: Option<GrowthStage>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub link_count: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

// The service may know stages this client does not; an unfamiliar echoed stage
// must not turn a successful creation into a decode failure.
fn lenient_growth_stage<'de, D>(deserializer: D) -> Result<Option<GrowthStage>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|raw| serde_json::from_value(raw).ok()))
}

// Proto JSON writers may emit `null` for unset scalars.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
