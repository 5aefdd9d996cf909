//! Saved-invoice archive: an append-only JSON list on disk.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::Invoice;
use crate::now_iso;

/// One archived snapshot. The invoice fields are flattened so the file
/// reads as a list of invoices with a `savedAt` stamp on each.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedInvoice {
    #[serde(flatten)]
    pub invoice: Invoice,
    pub saved_at: String,
}

/// Archive file handle. Every save is a full read-modify-write of the
/// list; entries are never deduplicated, so saving the same invoice twice
/// records two snapshots.
pub struct InvoiceArchive {
    path: PathBuf,
}

impl InvoiceArchive {
    pub fn new(path: impl Into<PathBuf>) -> InvoiceArchive {
        InvoiceArchive { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Missing file reads as the empty archive; a present but malformed
    /// file is an error (never silently truncate someone's history).
    pub fn load(&self) -> Result<Vec<SavedInvoice>, String> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let raw = fs::read_to_string(&self.path).map_err(|e| e.to_string())?;
        if raw.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&raw).map_err(|e| e.to_string())
    }

    /// Appends a snapshot stamped with the current time and returns the
    /// stored entry.
    pub fn save(&self, invoice: &Invoice) -> Result<SavedInvoice, String> {
        self.save_at(invoice, now_iso())
    }

    fn save_at(&self, invoice: &Invoice, saved_at: String) -> Result<SavedInvoice, String> {
        let mut entries = self.load()?;
        let entry = SavedInvoice {
            invoice: invoice.clone(),
            saved_at,
        };
        entries.push(entry.clone());
        self.write(&entries)?;
        Ok(entry)
    }

    fn write(&self, entries: &[SavedInvoice]) -> Result<(), String> {
        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() {
                fs::create_dir_all(dir).map_err(|e| e.to_string())?;
            }
        }
        let json = serde_json::to_string_pretty(entries).map_err(|e| e.to_string())?;
        fs::write(&self.path, json).map_err(|e| e.to_string())
    }
}
