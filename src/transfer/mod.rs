pub mod client;
pub mod personal;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A named remote storage location reachable through the transfer service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Endpoint {
    pub id: String,
    pub display_name: String,
    #[serde(default)]
    pub owner_string: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Dir,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirEntry {
    pub name: String,
    #[serde(default)]
    pub size: u64,
    #[serde(rename = "type")]
    pub kind: EntryKind,
}

impl DirEntry {
    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Dir
    }
}

/// One file-or-directory move request within a transfer submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferItem {
    #[serde(rename = "DATA_TYPE")]
    pub data_type: String,
    pub source_path: String,
    pub destination_path: String,
    pub recursive: bool,
}

impl TransferItem {
    /// Paths are plain concatenation of the panel's base path and the entry
    /// name; base paths keep their trailing slash.
    pub fn for_entry(source_base: &str, destination_base: &str, entry: &DirEntry) -> Self {
        Self {
            data_type: "transfer_item".to_string(),
            source_path: format!("{}{}", source_base, entry.name),
            destination_path: format!("{}{}", destination_base, entry.name),
            recursive: entry.is_dir(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferRequest {
    #[serde(rename = "DATA_TYPE")]
    pub data_type: String,
    pub source_endpoint: String,
    pub destination_endpoint: String,
    #[serde(rename = "DATA")]
    pub items: Vec<TransferItem>,
}

impl TransferRequest {
    pub fn new(source_endpoint: String, destination_endpoint: String, items: Vec<TransferItem>) -> Self {
        Self {
            data_type: "transfer".to_string(),
            source_endpoint,
            destination_endpoint,
            items,
        }
    }
}

/// Returned by the service on a successful submission. The message is shown
/// verbatim in the result area.
#[derive(Debug, Clone, Deserialize)]
pub struct TransferReceipt {
    pub message: String,
    #[serde(default)]
    pub task_id: Option<String>,
}

/// Failures surfaced by the transfer service API. Every variant carries a
/// message suitable for inline display; nothing is retried.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The service answered with an error document.
    #[error("{0}")]
    Service(String),

    /// The request never produced a usable response.
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transfer_item_for_file_entry() {
        let entry = DirEntry {
            name: "data.csv".to_string(),
            size: 2048,
            kind: EntryKind::File,
        };
        let item = TransferItem::for_entry("/~/", "/out/", &entry);

        assert_eq!(item.data_type, "transfer_item");
        assert_eq!(item.source_path, "/~/data.csv");
        assert_eq!(item.destination_path, "/out/data.csv");
        assert!(!item.recursive);
    }

    #[test]
    fn test_transfer_item_for_dir_entry_is_recursive() {
        let entry = DirEntry {
            name: "results".to_string(),
            size: 0,
            kind: EntryKind::Dir,
        };
        let item = TransferItem::for_entry("/~/", "/backup/", &entry);

        assert_eq!(item.source_path, "/~/results");
        assert_eq!(item.destination_path, "/backup/results");
        assert!(item.recursive);
    }

    #[test]
    fn test_entry_kind_wire_format() {
        let entry: DirEntry =
            serde_json::from_str(r#"{"name": "notes.txt", "size": 12, "type": "file"}"#).unwrap();
        assert_eq!(entry.kind, EntryKind::File);

        let entry: DirEntry =
            serde_json::from_str(r#"{"name": "src", "size": 0, "type": "dir"}"#).unwrap();
        assert_eq!(entry.kind, EntryKind::Dir);
    }

    #[test]
    fn test_transfer_request_wire_format() {
        let entry = DirEntry {
            name: "data.csv".to_string(),
            size: 2048,
            kind: EntryKind::File,
        };
        let request = TransferRequest::new(
            "A".to_string(),
            "B".to_string(),
            vec![TransferItem::for_entry("/~/", "/out/", &entry)],
        );

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["DATA_TYPE"], "transfer");
        assert_eq!(value["source_endpoint"], "A");
        assert_eq!(value["destination_endpoint"], "B");
        assert_eq!(value["DATA"][0]["DATA_TYPE"], "transfer_item");
        assert_eq!(value["DATA"][0]["source_path"], "/~/data.csv");
        assert_eq!(value["DATA"][0]["destination_path"], "/out/data.csv");
        assert_eq!(value["DATA"][0]["recursive"], false);
    }

    #[test]
    fn test_empty_item_set_serializes() {
        let request = TransferRequest::new("A".to_string(), "B".to_string(), Vec::new());
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["DATA"].as_array().unwrap().len(), 0);
    }
}
