//! Read-only enforcement for generated SQL.
//!
//! Two passes run before any database connection is opened: a keyword
//! blacklist on the normalized text, then an AST check with sqlparser's
//! MySQL dialect that only admits read statements. SQL that sqlparser
//! cannot parse passes the second stage (generated SQL is sometimes
//! dialect-odd), so the blacklist is the floor, not the ceiling.

use sqlparser::ast::Statement;
use sqlparser::dialect::MySqlDialect;
use sqlparser::parser::Parser;

use crate::error::{QuerionError, Result};

/// Statement keywords that are never allowed, checked as a leading word or
/// as a standalone space-delimited token.
const FORBIDDEN_KEYWORDS: [&str; 9] = [
    "DELETE", "DROP", "UPDATE", "INSERT", "ALTER", "TRUNCATE", "CREATE", "GRANT", "REVOKE",
];

/// Rejects SQL that is not a single read-only statement.
///
/// Must be called before opening a connection; a rejected statement never
/// reaches the driver.
pub fn ensure_read_only(sql: &str) -> Result<()> {
    let upper = sql.trim().to_uppercase();

    let is_destructive = FORBIDDEN_KEYWORDS.iter().any(|keyword| {
        upper.starts_with(keyword) || upper.contains(&format!(" {keyword} "))
    });
    if is_destructive {
        return Err(QuerionError::security(
            "Only SELECT queries are allowed.",
        ));
    }

    // Second opinion from the parser. The blacklist misses things like
    // comment-split keywords; a clean parse lets us check statement shape.
    if let Ok(statements) = Parser::parse_sql(&MySqlDialect {}, sql) {
        if statements.len() > 1 {
            return Err(QuerionError::security(
                "Multiple SQL statements are not allowed.",
            ));
        }
        for statement in &statements {
            if !is_read_statement(statement) {
                return Err(QuerionError::security(format!(
                    "Only SELECT queries are allowed, got: {}",
                    statement_name(statement)
                )));
            }
        }
    }

    Ok(())
}

/// Returns true for statements that only read.
fn is_read_statement(statement: &Statement) -> bool {
    match statement {
        Statement::Query(_) => true,
        // Plain EXPLAIN shows the plan; EXPLAIN ANALYZE executes, so the
        // inner statement must itself be a query.
        Statement::Explain {
            analyze, statement, ..
        } => !*analyze || matches!(**statement, Statement::Query(_)),
        Statement::ExplainTable { .. } => true,
        Statement::ShowVariable { .. }
        | Statement::ShowTables { .. }
        | Statement::ShowColumns { .. }
        | Statement::ShowCreate { .. }
        | Statement::ShowFunctions { .. }
        | Statement::ShowStatus { .. }
        | Statement::ShowCollation { .. } => true,
        _ => false,
    }
}

fn statement_name(statement: &Statement) -> &'static str {
    match statement {
        Statement::Insert(_) => "INSERT",
        Statement::Update { .. } => "UPDATE",
        Statement::Delete(_) => "DELETE",
        Statement::Drop { .. } => "DROP",
        Statement::Truncate { .. } => "TRUNCATE",
        Statement::AlterTable { .. } | Statement::AlterView { .. } => "ALTER",
        Statement::CreateTable { .. }
        | Statement::CreateIndex { .. }
        | Statement::CreateView { .. }
        | Statement::CreateDatabase { .. } => "CREATE",
        Statement::Grant { .. } => "GRANT",
        Statement::Revoke { .. } => "REVOKE",
        _ => "a non-read statement",
    }
}
