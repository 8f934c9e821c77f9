//! Binary payload slots.
//!
//! The hosting context hands files to operations through named binary slots.
//! Asking for an absent slot produces an error that names the slots that do
//! exist, since a misspelled slot name is the common failure.

use std::collections::BTreeMap;

use crate::error::{ClientError, Result};

/// One file payload with its metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileUpload {
    /// Raw file bytes
    pub data: Vec<u8>,
    /// Original file name
    pub file_name: String,
    /// MIME type of the payload
    pub mime_type: String,
}

impl FileUpload {
    pub fn new(data: Vec<u8>, file_name: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self { data, file_name: file_name.into(), mime_type: mime_type.into() }
    }
}

/// Named binary slots available to the current item.
#[derive(Debug, Clone, Default)]
pub struct BinaryStore {
    slots: BTreeMap<String, FileUpload>,
}

impl BinaryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, slot: impl Into<String>, file: FileUpload) {
        self.slots.insert(slot.into(), file);
    }

    /// Fetch the payload in `slot`, or a descriptive error naming the slots
    /// that are present.
    pub fn get(&self, slot: &str) -> Result<&FileUpload> {
        self.slots.get(slot).ok_or_else(|| ClientError::MissingBinary {
            requested: slot.to_string(),
            available: if self.slots.is_empty() {
                "none".to_string()
            } else {
                self.slots.keys().cloned().collect::<Vec<_>>().join(", ")
            },
        })
    }
}
