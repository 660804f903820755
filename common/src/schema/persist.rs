use super::model::Schema;
use crate::error::Result;
use chrono::Local;
use std::path::{Path, PathBuf};

pub const DEFAULT_OUTPUT_DIR: &str = "output";

/// file name for a schema captured at `timestamp`
pub fn schema_file_name(schema: &Schema, timestamp: chrono::DateTime<Local>) -> String {
    format!(
        "{}_{}_schema.json",
        timestamp.format("%Y%m%d_%H%M%S"),
        schema.backend()
    )
}

/// write the schema as pretty json under `output_dir` and return the path
#[tracing::instrument(skip(schema), fields(tables = schema.tables().len()))]
pub fn save_schema(schema: &Schema, output_dir: Option<&Path>) -> Result<PathBuf> {
    let dir = output_dir
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR));
    std::fs::create_dir_all(&dir)?;

    let path = dir.join(schema_file_name(schema, Local::now()));
    let json = serde_json::to_string_pretty(schema)?;
    std::fs::write(&path, json)?;

    tracing::info!("schema saved to {}", path.display());
    Ok(path)
}

pub fn load_schema(path: &Path) -> Result<Schema> {
    let text = std::fs::read_to_string(path)?;
    let schema: Schema = serde_json::from_str(&text)?;
    tracing::info!(
        tables = schema.tables().len(),
        "loaded {} schema from {}",
        schema.backend(),
        path.display()
    );
    Ok(schema)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::model::{BackendKind, Column, Table};
    use chrono::TimeZone;

    fn sample_schema() -> Schema {
        Schema::new(
            BackendKind::Relational,
            vec![Table {
                name: "users".to_string(),
                namespace: "public".to_string(),
                columns: vec![Column {
                    name: "id".to_string(),
                    data_type: "integer".to_string(),
                    nullable: false,
                    default: None,
                    comment: None,
                }],
                constraints: Some(vec![]),
                partitions: None,
            }],
        )
    }

    #[test]
    fn test_schema_file_name_format() {
        let ts = Local.with_ymd_and_hms(2024, 5, 6, 7, 8, 9).unwrap();
        assert_eq!(
            schema_file_name(&sample_schema(), ts),
            "20240506_070809_postgresql_schema.json"
        );
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("schemas");

        let path = save_schema(&sample_schema(), Some(&nested)).unwrap();
        assert!(path.starts_with(&nested));
        assert!(path.file_name().unwrap().to_str().unwrap().ends_with("_postgresql_schema.json"));

        let loaded = load_schema(&path).unwrap();
        assert_eq!(loaded, sample_schema());
    }

    #[test]
    fn test_load_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_schema(&dir.path().join("missing.json")).is_err());
    }
}
