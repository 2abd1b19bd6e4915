use std::{collections::BTreeMap, path::Path};

use serde::{Deserialize, Serialize};

use crate::ItemId;

/// The selected price per item plus the time it was captured at, as written to disk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub data: BTreeMap<String, u64>,
    /// Seconds since the Unix epoch
    pub last_update: f64,
}

#[derive(Debug)]
pub enum SnapshotError {
    Io(std::io::Error),
    Json(serde_json::Error),
}

impl std::fmt::Display for SnapshotError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::Json(e) => write!(f, "JSON error: {e}"),
        }
    }
}

impl std::error::Error for SnapshotError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Json(e) => Some(e),
        }
    }
}

impl From<std::io::Error> for SnapshotError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for SnapshotError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

impl Snapshot {
    pub fn new(prices: impl IntoIterator<Item = (ItemId, u64)>, last_update: f64) -> Self {
        Self {
            data: prices
                .into_iter()
                .map(|(item, price)| (item.to_string(), price))
                .collect(),
            last_update,
        }
    }

    pub fn price(&self, item: ItemId) -> Option<u64> {
        self.data.get(&item.to_string()).copied()
    }

    /// Pretty printed with a 4 space indent
    pub fn to_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.serialize(&mut serializer)?;

        Ok(buf)
    }

    /// Replaces the file at `path`. The content goes to a sibling file first which then gets
    /// renamed, so readers never observe a partially written snapshot.
    #[tracing::instrument(skip(self), fields(items = self.data.len()))]
    pub async fn write(&self, path: &Path) -> Result<(), SnapshotError> {
        let content = self.to_json()?;

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "snapshot".to_string());
        let tmp_path = path.with_file_name(format!(".{file_name}.tmp"));

        tokio::fs::write(&tmp_path, &content).await?;
        if let Err(e) = tokio::fs::rename(&tmp_path, path).await {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(e.into());
        }

        tracing::debug!("Wrote {} bytes", content.len());

        Ok(())
    }

    pub async fn read(path: &Path) -> Result<Self, SnapshotError> {
        let raw = tokio::fs::read(path).await?;
        Ok(serde_json::from_slice(&raw)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_layout() {
        let snapshot = Snapshot::new([(2091, 0), (1703, 48500)], 1763380800.25);

        let raw = String::from_utf8(snapshot.to_json().unwrap()).unwrap();

        assert_eq!(
            raw,
            "{\n    \"data\": {\n        \"1703\": 48500,\n        \"2091\": 0\n    },\n    \"last_update\": 1763380800.25\n}"
        );
    }

    #[test]
    fn lookup_by_item() {
        let snapshot = Snapshot::new([(1703, 48500)], 0.0);

        assert_eq!(snapshot.price(1703), Some(48500));
        assert_eq!(snapshot.price(2091), None);
    }
}
