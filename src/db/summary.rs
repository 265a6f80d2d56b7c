//! Bounded schema summaries used as LLM context.
//!
//! A summary is regenerated on every query request and carries its outcome
//! in the type: downstream stages branch on the variant instead of sniffing
//! sentinel substrings. `render()` still produces the exact sentinel text
//! for display and for the model prompt.

/// Upper bound on table names listed in the summary header.
pub const MAX_LISTED_TABLES: usize = 100;

/// Upper bound on tables whose columns are described in detail.
pub const MAX_DESCRIBED_TABLES: usize = 60;

/// Outcome of a schema introspection run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaSummary {
    /// Tables were found; the rendered summary text.
    Tables(String),
    /// The database has no tables. Soft failure, not an error.
    Empty,
    /// Introspection failed; reason includes any hint already applied.
    Failed(String),
}

impl SchemaSummary {
    /// Returns true when the summary cannot back a generation attempt.
    pub fn is_unusable(&self) -> bool {
        matches!(self, Self::Empty | Self::Failed(_))
    }

    /// Renders the summary as prompt/display text.
    pub fn render(&self) -> String {
        match self {
            Self::Tables(text) => text.clone(),
            Self::Empty => "The database is empty. No tables found.".to_string(),
            Self::Failed(reason) => {
                format!("Could not fetch schema. Database error: {reason}")
            }
        }
    }
}

/// A table name with its column descriptions, when they could be fetched.
#[derive(Debug, Clone)]
pub struct DescribedTable {
    pub name: String,
    /// (column name, declared type) pairs.
    pub columns: Vec<(String, String)>,
}

/// Builds the summary text from the full table list and the described
/// subset. Both bounds are enforced here: the name list is truncated to
/// [`MAX_LISTED_TABLES`] and detail lines to [`MAX_DESCRIBED_TABLES`],
/// so the rendered text never exceeds what its own header promises.
pub fn build_summary(table_names: &[String], described: &[DescribedTable]) -> String {
    let all_tables_header = if table_names.len() > MAX_LISTED_TABLES {
        format!(
            "{}... (and more)",
            table_names[..MAX_LISTED_TABLES].join(", ")
        )
    } else {
        table_names.join(", ")
    };

    let mut context = String::from("DATABASE SCHEMA:\n");
    context.push_str(&format!("Total Tables Found: {}\n", table_names.len()));
    context.push_str(&format!("All Table Names: {all_tables_header}\n\n"));
    context.push_str(&format!(
        "COLUMN DETAILS (for first {MAX_DESCRIBED_TABLES} tables):\n"
    ));

    for table in described.iter().take(MAX_DESCRIBED_TABLES) {
        let details = table
            .columns
            .iter()
            .map(|(name, ty)| format!("{name} ({ty})"))
            .collect::<Vec<_>>()
            .join(", ");
        context.push_str(&format!("- {}: [{}]\n", table.name, details));
    }

    context
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("table_{i:03}")).collect()
    }

    #[test]
    fn test_empty_sentinel_text() {
        assert_eq!(
            SchemaSummary::Empty.render(),
            "The database is empty. No tables found."
        );
    }

    #[test]
    fn test_failed_sentinel_text() {
        let summary = SchemaSummary::Failed("Access denied for user 'x'".to_string());
        assert_eq!(
            summary.render(),
            "Could not fetch schema. Database error: Access denied for user 'x'"
        );
    }

    #[test]
    fn test_usability() {
        assert!(SchemaSummary::Empty.is_unusable());
        assert!(SchemaSummary::Failed("boom".into()).is_unusable());
        assert!(!SchemaSummary::Tables("DATABASE SCHEMA:".into()).is_unusable());
    }

    #[test]
    fn test_summary_lists_all_names_under_cap() {
        let table_names = names(3);
        let text = build_summary(&table_names, &[]);

        assert!(text.contains("Total Tables Found: 3"));
        assert!(text.contains("table_000, table_001, table_002"));
        assert!(!text.contains("(and more)"));
    }

    #[test]
    fn test_summary_truncates_names_above_cap() {
        let table_names = names(130);
        let text = build_summary(&table_names, &[]);

        assert!(text.contains("Total Tables Found: 130"));
        // Exactly 100 names in the header, then the truncation marker.
        assert!(text.contains("table_099... (and more)"));
        assert!(!text.contains("table_100,"));
    }

    #[test]
    fn test_summary_caps_described_tables() {
        let table_names = names(70);
        let described: Vec<DescribedTable> = table_names
            .iter()
            .map(|name| DescribedTable {
                name: name.clone(),
                columns: vec![("id".to_string(), "int".to_string())],
            })
            .collect();

        let text = build_summary(&table_names, &described);

        let detail_lines = text.lines().filter(|line| line.starts_with("- ")).count();
        assert_eq!(detail_lines, MAX_DESCRIBED_TABLES);
        assert!(text.contains("- table_059:"));
        assert!(!text.contains("- table_060:"));
    }

    #[test]
    fn test_summary_column_details() {
        let table_names = names(1);
        let described = vec![DescribedTable {
            name: "table_000".to_string(),
            columns: vec![
                ("id".to_string(), "int(11)".to_string()),
                ("name".to_string(), "varchar(255)".to_string()),
            ],
        }];
        let text = build_summary(&table_names, &described);

        assert!(text.contains("- table_000: [id (int(11)), name (varchar(255))]"));
        assert!(text.contains("COLUMN DETAILS (for first 60 tables):"));
    }
}
