use crate::schema::{Column, Schema, Table};

/// output contract the model must follow; `{backend}` is the upper-cased backend
const REQUIREMENTS: [&str; 6] = [
    "Return only SQL code and SQL comments (such as -- comment or /* comment */).",
    "Do not add any explanation or description outside of the SQL.",
    "Do not use markdown formatting such as ```sql.",
    "Do not add a \"SQL query:\" or similar prefix.",
    "The returned SQL must be directly executable on {backend}.",
    "You may add comments that help explain the logic of the SQL.",
];

/// render the schema and question into a single text-to-sql prompt.
///
/// tables and columns are emitted in the order the schema holds them, so the
/// same input always yields the same bytes.
pub fn synthesize(schema: &Schema, question: &str) -> String {
    let backend = schema.backend().as_str().to_uppercase();

    let mut prompt = format!(
        "You are a {} expert. Based on the database structure and the user question below, \
         write a suitable SQL query.\n\n## Requirements\n",
        backend
    );

    for (idx, requirement) in REQUIREMENTS.iter().enumerate() {
        prompt.push_str(&format!(
            "{}. {}\n",
            idx + 1,
            requirement.replace("{backend}", &backend)
        ));
    }

    prompt.push_str("\nDatabase structure:\n");

    for table in schema.tables() {
        prompt.push_str(&render_table(table));
    }

    prompt.push_str(&format!("\nUser question: {}\n", question));
    prompt.push_str(&format!("\nGenerate a SQL query for {}:", backend));

    prompt
}

fn render_table(table: &Table) -> String {
    let mut block = format!("\nTable: {} (Schema: {})\nColumns:\n", table.name, table.namespace);

    for column in &table.columns {
        block.push_str(&format!("  - {}\n", render_column(column)));
    }

    if !table.constraints().is_empty() {
        block.push_str("Constraints:\n");
        for constraint in table.constraints() {
            block.push_str(&format!("  - {} ({})\n", constraint.name, constraint.kind));
        }
    }

    if !table.partitions().is_empty() {
        block.push_str("Partitions:\n");
        for partition in table.partitions() {
            block.push_str(&format!("  - {}\n", partition));
        }
    }

    block
}

fn render_column(column: &Column) -> String {
    let mut parts = vec![
        column.name.clone(),
        column.data_type.clone(),
        if column.nullable { "NULL" } else { "NOT NULL" }.to_string(),
    ];

    if let Some(default) = column.default.as_deref().filter(|d| !d.is_empty()) {
        parts.push(format!("DEFAULT {}", default));
    }
    if let Some(comment) = column.comment.as_deref().filter(|c| !c.is_empty()) {
        parts.push(format!("COMMENT '{}'", comment));
    }

    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{BackendKind, Constraint};

    fn column(name: &str, data_type: &str, nullable: bool) -> Column {
        Column {
            name: name.to_string(),
            data_type: data_type.to_string(),
            nullable,
            default: None,
            comment: None,
        }
    }

    fn relational_schema() -> Schema {
        let mut id = column("id", "integer", false);
        id.default = Some("nextval('users_id_seq'::regclass)".to_string());

        Schema::new(
            BackendKind::Relational,
            vec![
                Table {
                    name: "users".to_string(),
                    namespace: "public".to_string(),
                    columns: vec![id, column("email", "text", true)],
                    constraints: Some(vec![Constraint {
                        name: "users_pkey".to_string(),
                        kind: "PRIMARY KEY".to_string(),
                    }]),
                    partitions: None,
                },
                Table {
                    name: "audit".to_string(),
                    namespace: "ops".to_string(),
                    columns: vec![column("at", "timestamp", true)],
                    constraints: Some(vec![]),
                    partitions: None,
                },
            ],
        )
    }

    #[test]
    fn test_synthesize_renders_sections_in_order() {
        let prompt = synthesize(&relational_schema(), "how many users signed up today?");

        assert!(prompt.starts_with("You are a POSTGRESQL expert."));
        assert!(prompt.contains("5. The returned SQL must be directly executable on POSTGRESQL.\n"));
        assert!(prompt.contains(
            "\nTable: users (Schema: public)\nColumns:\n  - id integer NOT NULL DEFAULT nextval('users_id_seq'::regclass)\n  - email text NULL\nConstraints:\n  - users_pkey (PRIMARY KEY)\n"
        ));
        assert!(prompt.contains("\nTable: audit (Schema: ops)\nColumns:\n  - at timestamp NULL\n"));
        assert!(!prompt.contains("Partitions:"));

        let requirements = prompt.find("## Requirements").unwrap();
        let users = prompt.find("Table: users").unwrap();
        let audit = prompt.find("Table: audit").unwrap();
        let question = prompt.find("User question: how many users signed up today?").unwrap();
        assert!(requirements < users && users < audit && audit < question);
        assert!(prompt.ends_with("Generate a SQL query for POSTGRESQL:"));
    }

    #[test]
    fn test_synthesize_renders_comments_verbatim_with_partitions() {
        let mut dt = column("dt", "string", true);
        dt.comment = Some("load date, 'yyyy-mm-dd'".to_string());

        let schema = Schema::new(
            BackendKind::Warehouse,
            vec![Table {
                name: "events".to_string(),
                namespace: "default".to_string(),
                columns: vec![column("id", "bigint", true), dt],
                constraints: None,
                partitions: Some(vec!["dt=2024-01-01".to_string()]),
            }],
        );

        let prompt = synthesize(&schema, "count events per day");
        assert!(prompt.starts_with("You are a HIVE expert."));
        assert!(prompt.contains("  - dt string NULL COMMENT 'load date, 'yyyy-mm-dd''\n"));
        assert!(prompt.contains("Partitions:\n  - dt=2024-01-01\n"));
        assert!(!prompt.contains("Constraints:"));
    }

    #[test]
    fn test_synthesize_is_deterministic() {
        let schema = relational_schema();
        let first = synthesize(&schema, "list emails");
        let second = synthesize(&schema, "list emails");
        assert_eq!(first.as_bytes(), second.as_bytes());
    }

    #[test]
    fn test_synthesize_lists_six_numbered_requirements() {
        let prompt = synthesize(&relational_schema(), "q");
        for n in 1..=6 {
            assert!(prompt.contains(&format!("\n{}. ", n)));
        }
        assert!(!prompt.contains("\n7. "));
    }
}
