//! On-disk formats for the two lead stores.
//!
//! The primary store is a whole-file JSON table (`columns` + positional
//! `rows`); the secondary store is a CSV file that only ever grows.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::types::StoreEntry;
use crate::funnel::fields::FUNNEL;

pub const DEDUP_COLUMN: &str = "dedup_key";

/// Metadata columns, in persisted order. Field columns follow in funnel order.
pub const META_COLUMNS: [&str; 9] = [
    "id",
    "created_at",
    "origem",
    "utm_source",
    "utm_medium",
    "utm_campaign",
    "utm_term",
    "utm_content",
    DEDUP_COLUMN,
];

/// Full column list for a fresh store.
pub fn columns() -> Vec<String> {
    META_COLUMNS
        .iter()
        .copied()
        .chain(FUNNEL.iter().map(|f| f.as_str()))
        .map(str::to_string)
        .collect()
}

fn empty_cell() -> Value {
    Value::String(String::new())
}

/// Flatten an entry into `(column, cell)` pairs in persisted order.
pub fn entry_cells(entry: &StoreEntry) -> Vec<(&'static str, Value)> {
    let lead = &entry.lead;
    let a = &entry.attribution;
    vec![
        ("id", Value::from(entry.id.as_str())),
        ("created_at", Value::from(entry.created_at.as_str())),
        ("origem", Value::from(entry.origin.as_str())),
        ("utm_source", Value::from(a.utm_source.as_str())),
        ("utm_medium", Value::from(a.utm_medium.as_str())),
        ("utm_campaign", Value::from(a.utm_campaign.as_str())),
        ("utm_term", Value::from(a.utm_term.as_str())),
        ("utm_content", Value::from(a.utm_content.as_str())),
        (DEDUP_COLUMN, Value::from(entry.dedup_key.as_str())),
        ("nome", Value::from(lead.name.as_str())),
        ("telefone", Value::from(lead.phone.as_str())),
        ("email", Value::from(lead.email.as_str())),
        ("operacao", Value::from(lead.operation.as_str())),
        ("tipo_imovel", Value::from(lead.property_type.as_str())),
        ("metragem", Value::from(lead.area)),
        ("quartos", Value::from(lead.bedrooms)),
        ("faixa_preco", Value::from(lead.price_range.as_str())),
        ("urgencia", Value::from(lead.urgency.as_str())),
    ]
}

/// Whether [`LeadTable::merge`] replaced a row or added one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Merge {
    Inserted,
    Replaced,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LeadTable {
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(default)]
    pub rows: Vec<Vec<Value>>,
}

impl LeadTable {
    pub fn new() -> Self {
        Self {
            columns: columns(),
            rows: Vec::new(),
        }
    }

    /// Read a table written by [`LeadTable::save`]. Missing sections load as
    /// empty and every row is cut or padded to the header width, so older or
    /// hand-edited files stay usable.
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read lead table {}", path.display()))?;
        let mut table: LeadTable =
            serde_json::from_slice(&bytes).context("Failed to parse lead table")?;
        let width = table.columns.len();
        for row in &mut table.rows {
            row.resize(width, empty_cell());
        }
        Ok(table)
    }

    /// Write via a `.tmp` sibling and rename, so a failed write never
    /// truncates the table already on disk.
    pub fn save(&self, path: &Path) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(self).context("serialize lead table")?;
        let tmp = path.with_extension("tmp");
        std::fs::write(&tmp, bytes)
            .with_context(|| format!("Failed to write lead table {}", tmp.display()))?;
        std::fs::rename(&tmp, path)
            .with_context(|| format!("Failed to replace lead table {}", path.display()))
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Index of `name`, appending it (empty on every existing row) if absent.
    fn ensure_column(&mut self, name: &str) -> usize {
        if let Some(idx) = self.column_index(name) {
            return idx;
        }
        self.columns.push(name.to_string());
        for row in &mut self.rows {
            row.push(empty_cell());
        }
        self.columns.len() - 1
    }

    /// Row whose dedup column equals `key`. `None` when the table has no
    /// dedup column at all.
    pub fn find_by_dedup_key(&self, key: &str) -> Option<usize> {
        let col = self.column_index(DEDUP_COLUMN)?;
        self.rows
            .iter()
            .position(|row| row.get(col).and_then(Value::as_str) == Some(key))
    }

    /// Upsert `cells` keyed on the dedup column. The lookup runs against the
    /// table as loaded; a table without the column always gets a new row.
    pub fn merge(&mut self, cells: &[(&str, Value)]) -> Merge {
        let key = cells
            .iter()
            .find(|(name, _)| *name == DEDUP_COLUMN)
            .and_then(|(_, v)| v.as_str())
            .unwrap_or_default()
            .to_string();
        let existing = self.find_by_dedup_key(&key);

        let indices: Vec<usize> = cells.iter().map(|(name, _)| self.ensure_column(name)).collect();
        let row_idx = match existing {
            Some(idx) => idx,
            None => {
                self.rows.push(vec![empty_cell(); self.columns.len()]);
                self.rows.len() - 1
            }
        };
        let row = &mut self.rows[row_idx];
        for (idx, (_, value)) in indices.into_iter().zip(cells) {
            row[idx] = value.clone();
        }

        if existing.is_some() {
            Merge::Replaced
        } else {
            Merge::Inserted
        }
    }

    /// Rows as column-name maps, for display.
    pub fn records(&self) -> Vec<serde_json::Map<String, Value>> {
        self.rows
            .iter()
            .map(|row| {
                self.columns
                    .iter()
                    .cloned()
                    .zip(row.iter().cloned())
                    .collect()
            })
            .collect()
    }
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn csv_field(text: &str) -> String {
    if text.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", text.replace('"', "\"\""))
    } else {
        text.to_string()
    }
}

fn csv_line<I, S>(fields: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut line = fields
        .into_iter()
        .map(|f| csv_field(f.as_ref()))
        .collect::<Vec<_>>()
        .join(",");
    line.push('\n');
    line
}

/// Blind append of one row; writes the header first when the file is new
/// or empty.
pub fn append_csv_row(path: &Path, cells: &[(&str, Value)]) -> Result<()> {
    let needs_header = std::fs::metadata(path).map(|m| m.len() == 0).unwrap_or(true);
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open fallback store {}", path.display()))?;

    let mut out = String::new();
    if needs_header {
        out.push_str(&csv_line(cells.iter().map(|(name, _)| *name)));
    }
    out.push_str(&csv_line(cells.iter().map(|(_, v)| cell_text(v))));
    file.write_all(out.as_bytes())
        .with_context(|| format!("Failed to append to fallback store {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn cells(key: &str, name: &str) -> Vec<(&'static str, Value)> {
        vec![
            (DEDUP_COLUMN, json!(key)),
            ("nome", json!(name)),
        ]
    }

    #[test]
    fn test_columns_order() {
        let cols = columns();
        assert_eq!(cols.len(), 18);
        assert_eq!(cols[0], "id");
        assert_eq!(cols[8], DEDUP_COLUMN);
        assert_eq!(cols[9], "nome");
        assert_eq!(cols[17], "urgencia");
    }

    #[test]
    fn test_merge_replaces_same_key() {
        let mut table = LeadTable::new();
        assert_eq!(table.merge(&cells("k1", "Ana Silva")), Merge::Inserted);
        assert_eq!(table.merge(&cells("k2", "Bruno Lima")), Merge::Inserted);
        assert_eq!(table.merge(&cells("k1", "Ana Souza")), Merge::Replaced);
        assert_eq!(table.rows.len(), 2);
        let name = table.column_index("nome").unwrap();
        assert_eq!(table.rows[0][name], json!("Ana Souza"));
    }

    #[test]
    fn test_merge_adds_missing_columns() {
        let mut table = LeadTable {
            columns: vec!["nome".into()],
            rows: vec![vec![json!("Velho Registro")]],
        };
        assert_eq!(table.merge(&cells("k1", "Ana Silva")), Merge::Inserted);
        assert_eq!(table.columns, vec!["nome".to_string(), DEDUP_COLUMN.to_string()]);
        assert_eq!(table.rows[0], vec![json!("Velho Registro"), json!("")]);
        assert_eq!(table.rows[1], vec![json!("Ana Silva"), json!("k1")]);
    }

    #[test]
    fn test_load_pads_short_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.json");
        std::fs::write(&path, r#"{"columns":["a","b","c"],"rows":[["x"]]}"#).unwrap();
        let table = LeadTable::load(&path).unwrap();
        assert_eq!(table.rows[0], vec![json!("x"), json!(""), json!("")]);
    }

    #[test]
    fn test_load_trims_long_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.json");
        std::fs::write(&path, r#"{"columns":["nome"],"rows":[["Velho","stray"]]}"#).unwrap();
        let mut table = LeadTable::load(&path).unwrap();
        assert_eq!(table.rows[0], vec![json!("Velho")]);

        table.merge(&cells("k1", "Ana Silva"));
        let dedup = table.column_index(DEDUP_COLUMN).unwrap();
        assert_eq!(table.rows[0][dedup], json!(""));
        assert!(table.rows.iter().all(|r| r.len() == table.columns.len()));
    }

    #[test]
    fn test_failed_save_keeps_previous_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("leads.json");
        let mut table = LeadTable::new();
        table.merge(&cells("k1", "Ana Silva"));
        table.save(&path).unwrap();

        // A directory in the way of the temp file makes the write fail.
        std::fs::create_dir(path.with_extension("tmp")).unwrap();
        table.merge(&cells("k2", "Bruno Lima"));
        assert!(table.save(&path).is_err());

        let on_disk = LeadTable::load(&path).unwrap();
        assert_eq!(on_disk.rows.len(), 1);
        assert_eq!(on_disk.find_by_dedup_key("k1"), Some(0));
    }

    #[test]
    fn test_save_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("leads.json");
        LeadTable::new().save(&path).unwrap();
        assert!(path.exists());
        assert!(!path.with_extension("tmp").exists());
    }

    #[test]
    fn test_load_tolerates_missing_sections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.json");
        std::fs::write(&path, "{}").unwrap();
        let table = LeadTable::load(&path).unwrap();
        assert!(table.columns.is_empty());
        assert_eq!(table.find_by_dedup_key("k1"), None);
    }

    #[test]
    fn test_load_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.json");
        std::fs::write(&path, "PK\x03\x04 not json").unwrap();
        assert!(LeadTable::load(&path).is_err());
    }

    #[test]
    fn test_csv_quoting() {
        assert_eq!(csv_field("simples"), "simples");
        assert_eq!(csv_field("até 500 mil, à vista"), "\"até 500 mil, à vista\"");
        assert_eq!(csv_field("diz \"oi\""), "\"diz \"\"oi\"\"\"");
    }

    #[test]
    fn test_append_csv_writes_header_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("leads.csv");
        append_csv_row(&path, &cells("k1", "Ana Silva")).unwrap();
        append_csv_row(&path, &cells("k1", "Ana Silva")).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, "dedup_key,nome\nk1,Ana Silva\nk1,Ana Silva\n");
    }
}
