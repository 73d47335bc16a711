pub mod dedup;
pub mod table;
pub mod types;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, error, warn};

use table::{LeadTable, Merge};
use types::{StoreEntry, StoreLocation, StoreStatus, UpsertOutcome};

/// Primary store: whole-table JSON, deduplicated.
pub const PRIMARY_FILE: &str = "imobiliaria_leads.json";
/// Secondary store: append-only CSV, used when the primary path fails.
pub const SECONDARY_FILE: &str = "imobiliaria_leads.csv";

/// Upsert-by-dedup-key persistence over two files in one directory.
///
/// Every primary write reads the whole table, changes it in memory and
/// writes it back. There is no locking: two processes (or two sessions
/// racing through `spawn_blocking`) can overwrite each other's rows.
pub struct LeadStore {
    dir: PathBuf,
}

impl LeadStore {
    pub fn open(dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create leads dir {}", dir.display()))?;
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    pub fn primary_path(&self) -> PathBuf {
        self.dir.join(PRIMARY_FILE)
    }

    pub fn secondary_path(&self) -> PathBuf {
        self.dir.join(SECONDARY_FILE)
    }

    /// Insert or update `entry` in the primary table, degrading to a blind
    /// append on the secondary store if the primary cannot be read or
    /// written. Errors only when both paths fail.
    pub fn upsert(&self, entry: &StoreEntry) -> Result<UpsertOutcome> {
        let cells = table::entry_cells(entry);

        let primary_err = match self.upsert_primary(&cells) {
            Ok(status) => {
                debug!(dedup_key = %entry.dedup_key, status = status.as_str(), "lead stored");
                return Ok(UpsertOutcome {
                    location: StoreLocation::Primary,
                    file_name: PRIMARY_FILE.to_string(),
                    status,
                });
            }
            Err(e) => e,
        };

        warn!(
            dedup_key = %entry.dedup_key,
            error = %format!("{:#}", primary_err),
            "primary lead store failed, appending to fallback"
        );

        match table::append_csv_row(&self.secondary_path(), &cells) {
            Ok(()) => Ok(UpsertOutcome {
                location: StoreLocation::Secondary,
                file_name: SECONDARY_FILE.to_string(),
                status: StoreStatus::AppendedFallback,
            }),
            Err(fallback_err) => {
                error!(
                    dedup_key = %entry.dedup_key,
                    "lead could not be persisted to either store"
                );
                Err(anyhow::anyhow!(
                    "lead could not be persisted (primary: {:#}; fallback: {:#})",
                    primary_err,
                    fallback_err
                ))
            }
        }
    }

    fn upsert_primary(&self, cells: &[(&str, serde_json::Value)]) -> Result<StoreStatus> {
        let path = self.primary_path();
        let mut table = if path.exists() {
            LeadTable::load(&path)?
        } else {
            LeadTable::new()
        };
        let merged = table.merge(cells);
        table.save(&path)?;
        Ok(match merged {
            Merge::Inserted => StoreStatus::Created,
            Merge::Replaced => StoreStatus::Updated,
        })
    }

    /// Primary-store rows as column maps, newest `created_at` first.
    /// Rows only present in the fallback CSV are not listed.
    pub fn recent(&self, limit: usize) -> Result<Vec<serde_json::Map<String, serde_json::Value>>> {
        let path = self.primary_path();
        if !path.exists() {
            return Ok(vec![]);
        }
        let mut records = LeadTable::load(&path)?.records();
        let created = |r: &serde_json::Map<String, serde_json::Value>| {
            r.get("created_at")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string()
        };
        records.sort_by_key(|r| std::cmp::Reverse(created(r)));
        records.truncate(limit);
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leads::types::{Attribution, LeadRecord, Operation, PropertyType, Urgency};
    use pretty_assertions::assert_eq;

    fn entry(name: &str, phone: &str, email: &str, area: u64) -> StoreEntry {
        StoreEntry {
            id: uuid::Uuid::new_v4().to_string(),
            created_at: chrono::Utc::now().to_rfc3339(),
            origin: "discord".to_string(),
            attribution: Attribution::default(),
            dedup_key: dedup::dedup_key(phone, email),
            lead: LeadRecord {
                name: name.to_string(),
                phone: phone.to_string(),
                email: email.to_string(),
                operation: Operation::Purchase,
                property_type: PropertyType::Apartment,
                area,
                bedrooms: 2,
                price_range: "até 500 mil".to_string(),
                urgency: Urgency::High,
            },
        }
    }

    fn rows_for(store: &LeadStore, key: &str) -> usize {
        let table = LeadTable::load(&store.primary_path()).unwrap();
        let col = table.column_index(table::DEDUP_COLUMN).unwrap();
        table.rows.iter().filter(|r| r[col] == serde_json::json!(key)).count()
    }

    #[test]
    fn test_first_upsert_creates_table() {
        let dir = tempfile::tempdir().unwrap();
        let store = LeadStore::open(dir.path()).unwrap();
        let out = store.upsert(&entry("Ana Silva", "11987654321", "ana@example.com", 80)).unwrap();
        assert_eq!(out.status, StoreStatus::Created);
        assert_eq!(out.location, StoreLocation::Primary);
        assert_eq!(out.file_name, PRIMARY_FILE);
        let table = LeadTable::load(&store.primary_path()).unwrap();
        assert_eq!(table.columns, table::columns());
        assert_eq!(table.rows.len(), 1);
    }

    #[test]
    fn test_same_key_updates_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let store = LeadStore::open(dir.path()).unwrap();
        let first = entry("Ana Silva", "11987654321", "ana@example.com", 80);
        let second = entry("Ana Souza", "11987654321", "ana@example.com", 120);
        assert_eq!(first.dedup_key, second.dedup_key);

        store.upsert(&first).unwrap();
        let out = store.upsert(&second).unwrap();
        assert_eq!(out.status, StoreStatus::Updated);
        assert_eq!(rows_for(&store, &first.dedup_key), 1);

        let rows = store.recent(10).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["nome"], serde_json::json!("Ana Souza"));
        assert_eq!(rows[0]["metragem"], serde_json::json!(120));
        assert_eq!(rows[0]["dedup_key"], serde_json::json!(first.dedup_key));
    }

    #[test]
    fn test_new_key_adds_one_row() {
        let dir = tempfile::tempdir().unwrap();
        let store = LeadStore::open(dir.path()).unwrap();
        store.upsert(&entry("Ana Silva", "11987654321", "ana@example.com", 80)).unwrap();
        let out = store.upsert(&entry("Bruno Lima", "21912345678", "bruno@example.com", 60)).unwrap();
        assert_eq!(out.status, StoreStatus::Created);
        assert_eq!(store.recent(10).unwrap().len(), 2);
    }

    #[test]
    fn test_unreadable_primary_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let store = LeadStore::open(dir.path()).unwrap();
        std::fs::write(store.primary_path(), b"not a table").unwrap();

        let e = entry("Ana Silva", "11987654321", "ana@example.com", 80);
        let out = store.upsert(&e).unwrap();
        assert_eq!(out.status, StoreStatus::AppendedFallback);
        assert_eq!(out.location, StoreLocation::Secondary);
        // Appends are blind: the same person twice means two rows.
        store.upsert(&e).unwrap();

        let csv = std::fs::read_to_string(store.secondary_path()).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], table::columns().join(","));
        assert!(lines[1].contains(&e.dedup_key));
        // Primary is left as it was.
        assert_eq!(std::fs::read(store.primary_path()).unwrap(), b"not a table");
    }

    #[test]
    fn test_unwritable_primary_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let store = LeadStore::open(dir.path()).unwrap();
        let first = entry("Ana Silva", "11987654321", "ana@example.com", 80);
        store.upsert(&first).unwrap();

        // Table still loads; only the rewrite fails.
        std::fs::create_dir(store.primary_path().with_extension("tmp")).unwrap();
        let second = entry("Bruno Lima", "21912345678", "bruno@example.com", 60);
        let out = store.upsert(&second).unwrap();
        assert_eq!(out.status, StoreStatus::AppendedFallback);
        assert_eq!(out.location, StoreLocation::Secondary);

        let csv = std::fs::read_to_string(store.secondary_path()).unwrap();
        assert!(csv.contains(&second.dedup_key));
        // Earlier leads survive in the primary.
        assert_eq!(rows_for(&store, &first.dedup_key), 1);
        assert_eq!(store.recent(10).unwrap().len(), 1);
    }

    #[test]
    fn test_primary_without_dedup_column_appends() {
        let dir = tempfile::tempdir().unwrap();
        let store = LeadStore::open(dir.path()).unwrap();
        std::fs::write(
            store.primary_path(),
            r#"{"columns":["nome","telefone"],"rows":[["Lead Antigo","11900000000"]]}"#,
        )
        .unwrap();

        let out = store.upsert(&entry("Ana Silva", "11987654321", "ana@example.com", 80)).unwrap();
        assert_eq!(out.status, StoreStatus::Created);
        let table = LeadTable::load(&store.primary_path()).unwrap();
        assert_eq!(table.rows.len(), 2);
        let dedup = table.column_index(table::DEDUP_COLUMN).unwrap();
        assert_eq!(table.rows[0][dedup], serde_json::json!(""));
        assert_eq!(table.columns.len(), 18);
    }

    #[test]
    fn test_both_paths_failing_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = LeadStore::open(dir.path()).unwrap();
        // Directories where the files should be: unreadable and unappendable.
        std::fs::create_dir(store.primary_path()).unwrap();
        std::fs::create_dir(store.secondary_path()).unwrap();

        let err = store
            .upsert(&entry("Ana Silva", "11987654321", "ana@example.com", 80))
            .unwrap_err();
        assert!(err.to_string().contains("could not be persisted"));
    }

    #[test]
    fn test_recent_on_empty_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = LeadStore::open(dir.path()).unwrap();
        assert!(store.recent(5).unwrap().is_empty());
    }
}
