use super::RelationalSession;
use crate::error::Result;
use crate::schema::{CatalogColumnRow, CatalogConstraintRow, RawRelationalTable, Row};

pub const LIST_TABLES_SQL: &str = "SELECT table_name::text, table_schema::text \
     FROM information_schema.tables \
     WHERE table_schema NOT IN ('pg_catalog', 'information_schema') \
     ORDER BY table_schema, table_name";

pub const LIST_COLUMNS_SQL: &str = "SELECT column_name::text, data_type::text, is_nullable::text, column_default::text \
     FROM information_schema.columns \
     WHERE table_name = $1 AND table_schema = $2 \
     ORDER BY ordinal_position";

pub const LIST_CONSTRAINTS_SQL: &str = "SELECT constraint_name::text, constraint_type::text \
     FROM information_schema.table_constraints \
     WHERE table_name = $1 AND table_schema = $2 \
     ORDER BY constraint_name";

fn field(row: &Row, idx: usize) -> Option<String> {
    row.get(idx).cloned().flatten()
}

/// walk `information_schema` table by table, in catalog order
#[tracing::instrument(skip(session))]
pub async fn extract<S>(session: &mut S) -> Result<Vec<RawRelationalTable>>
where
    S: RelationalSession + ?Sized,
{
    let table_rows = session.query(LIST_TABLES_SQL, &[]).await?;
    tracing::info!("found {} tables", table_rows.len());

    let mut tables = Vec::with_capacity(table_rows.len());

    for row in table_rows {
        let (Some(name), Some(namespace)) = (field(&row, 0), field(&row, 1)) else {
            tracing::warn!("skipping catalog row without table name or schema");
            continue;
        };

        let columns = session
            .query(LIST_COLUMNS_SQL, &[name.as_str(), namespace.as_str()])
            .await?
            .into_iter()
            .filter_map(|r| {
                Some(CatalogColumnRow {
                    name: field(&r, 0)?,
                    data_type: field(&r, 1).unwrap_or_default(),
                    is_nullable: field(&r, 2).unwrap_or_default(),
                    default: field(&r, 3),
                })
            })
            .collect::<Vec<_>>();

        let constraints = session
            .query(LIST_CONSTRAINTS_SQL, &[name.as_str(), namespace.as_str()])
            .await?
            .into_iter()
            .filter_map(|r| {
                Some(CatalogConstraintRow {
                    name: field(&r, 0)?,
                    constraint_type: field(&r, 1).unwrap_or_default(),
                })
            })
            .collect::<Vec<_>>();

        tracing::debug!(
            table = %name,
            schema = %namespace,
            columns = columns.len(),
            constraints = constraints.len(),
            "described table"
        );

        tables.push(RawRelationalTable {
            name,
            namespace,
            columns,
            constraints,
        });
    }

    Ok(tables)
}
