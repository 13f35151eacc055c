use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// One logged draw event as rendered by the in-game record table.
///
/// Field names mirror the table columns so the saved JSON matches what the
/// player sees: category, item name, draw count, timestamp, and the rarity
/// class the UI attached to the name cell (e.g. `quality5`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GachaRecord {
    #[serde(rename = "type")]
    pub draw_type: String,
    pub name: String,
    pub count: u32,
    pub time: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality: Option<String>,
}

/// Draw type → records, in scrape order (insertion order is preserved both
/// for categories and for records within a category, which approximates the
/// reverse-chronological order the UI renders).
///
/// Categories that yielded no records are absent, not mapped to `[]`.
pub type GachaRecordMap = IndexMap<String, Vec<GachaRecord>>;
