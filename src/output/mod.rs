//! Final JSON persistence.

use std::path::Path;

use anyhow::{Context, Result};

use crate::core::types::GachaRecordMap;

/// Write the record map as indented JSON. Not retried on failure.
pub async fn save_records(records: &GachaRecordMap, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(records).context("serializing record map")?;
    tokio::fs::write(path, json)
        .await
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::GachaRecord;

    #[tokio::test]
    async fn test_save_writes_indented_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gacha_records.json");

        let mut map = GachaRecordMap::new();
        map.insert(
            "Featured".to_string(),
            vec![GachaRecord {
                draw_type: "Featured".to_string(),
                name: "Verina".to_string(),
                count: 1,
                time: "2024-06-01 12:00:00".to_string(),
                quality: Some("quality5".to_string()),
            }],
        );

        save_records(&map, &path).await.unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains('\n'), "output should be indented");
        let parsed: serde_json::Value = serde_json::from_str(&written).unwrap();
        assert_eq!(parsed["Featured"][0]["name"], "Verina");
    }
}
