use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockHeader {
    pub height: u64,
    pub hash: String,
    /// Unix milliseconds.
    pub timestamp: i64,
    /// Runtime spec version the block was produced with.
    pub spec_version: u32,
}

impl BlockHeader {
    pub fn time(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.timestamp).unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: String,
    pub index_in_block: u32,
    /// Pallet-qualified name, e.g. `Posts.PostCreated`.
    pub name: String,
    #[serde(default)]
    pub args: JsonValue,
    #[serde(default)]
    pub call_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Call {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub args: JsonValue,
    /// `{"__kind": "system", "value": {"__kind": "Signed", "value": <account>}}`
    #[serde(default)]
    pub origin: Option<JsonValue>,
    #[serde(default = "default_success")]
    pub success: bool,
}

fn default_success() -> bool {
    true
}

impl Call {
    /// Account of a signed origin.
    pub fn signer(&self) -> Option<&str> {
        let system = self.origin.as_ref()?;
        if system.get("__kind")?.as_str()? != "system" {
            return None;
        }
        let inner = system.get("value")?;
        if inner.get("__kind")?.as_str()? != "Signed" {
            return None;
        }
        inner.get("value")?.as_str()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Extrinsic {
    pub index: u32,
    #[serde(default)]
    pub call_id: Option<String>,
    #[serde(default)]
    pub success: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub header: BlockHeader,
    #[serde(default)]
    pub events: Vec<Event>,
    #[serde(default)]
    pub calls: Vec<Call>,
    #[serde(default)]
    pub extrinsics: Vec<Extrinsic>,
}

impl Block {
    pub fn call(&self, id: &str) -> Option<&Call> {
        self.calls.iter().find(|call| call.id == id)
    }

    /// The call that emitted `event`, if the archive recorded one.
    pub fn call_of(&self, event: &Event) -> Option<&Call> {
        event.call_id.as_deref().and_then(|id| self.call(id))
    }
}
