use super::{CommandOutput, WarehouseSession};
use crate::error::Result;
use crate::schema::{PartitionListing, RawWarehouseTable, Row};

/// column labels engines use for the table name in `SHOW TABLES`
const TABLE_NAME_LABELS: [&str; 3] = ["tab_name", "tablename", "table_name"];

/// backtick-quote an identifier for hive / spark sql
pub fn quote_identifier(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

/// hive returns one `tab_name` column; spark returns (namespace, tableName, isTemporary)
fn table_name_index(output: &CommandOutput) -> usize {
    output
        .columns
        .iter()
        .position(|c| TABLE_NAME_LABELS.contains(&c.to_lowercase().as_str()))
        .unwrap_or(0)
}

/// one `k1=v1/k2=v2` string per partition. hive and spark already print that
/// form in a single `partition` column; databricks returns one column per
/// key, so bare values are prefixed with their column label.
fn partition_specs(output: CommandOutput) -> Vec<Row> {
    let labels = output.columns;
    output
        .rows
        .into_iter()
        .map(|row| {
            let parts: Vec<String> = row
                .into_iter()
                .enumerate()
                .filter_map(|(i, field)| {
                    let value = field?.trim().to_string();
                    if value.is_empty() {
                        return None;
                    }
                    match labels.get(i) {
                        Some(label) if !value.contains('=') && label != "partition" => {
                            Some(format!("{}={}", label, value))
                        }
                        _ => Some(value),
                    }
                })
                .collect();
            vec![(!parts.is_empty()).then(|| parts.join("/"))]
        })
        .collect()
}

/// list tables, then describe each one and try to list its partitions
#[tracing::instrument(skip(session))]
pub async fn extract<S>(session: &mut S) -> Result<Vec<RawWarehouseTable>>
where
    S: WarehouseSession + ?Sized,
{
    let listing = session.execute("SHOW TABLES").await?;
    let idx = table_name_index(&listing);
    let names: Vec<String> = listing
        .rows
        .into_iter()
        .filter_map(|row| row.into_iter().nth(idx).flatten())
        .filter(|name| !name.trim().is_empty())
        .collect();

    tracing::info!("found {} tables", names.len());

    let mut tables = Vec::with_capacity(names.len());

    for name in names {
        let quoted = quote_identifier(&name);

        let columns = session.execute(&format!("DESCRIBE {}", quoted)).await?.rows;

        let partitions = match session.execute(&format!("SHOW PARTITIONS {}", quoted)).await {
            Ok(output) => PartitionListing::Rows(partition_specs(output)),
            Err(e) => {
                tracing::debug!(table = %name, "partition listing unavailable: {}", e);
                PartitionListing::Failed(e.to_string())
            }
        };

        tables.push(RawWarehouseTable {
            name,
            columns,
            partitions,
        });
    }

    Ok(tables)
}
