//! SQL safety validation
//!
//! Ordered checks over a candidate query: forbidden keywords, statement
//! count, comments, then schema membership of every referenced table.
//! The textual checks run first so a parse error can never bypass them.

use super::table_refs::extract_table_refs;
use super::token_tree::parse_token_tree;
use super::transient::transient_names;
use crate::error::WardenError;
use crate::schema::AllowedTables;
use itertools::Itertools;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::debug;

/// Statement keywords a candidate query may never contain.
pub const FORBIDDEN_KEYWORDS: &[&str] = &[
    "DROP", "DELETE", "UPDATE", "INSERT", "ALTER", "TRUNCATE", "CREATE", "GRANT", "REVOKE",
    "EXECUTE", "EXEC",
];

lazy_static! {
    static ref FORBIDDEN: Regex = Regex::new(
        r"(?i)\b(DROP|DELETE|UPDATE|INSERT|ALTER|TRUNCATE|CREATE|GRANT|REVOKE|EXECUTE|EXEC)\b"
    )
    .unwrap();
}

/// Why a candidate query was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RejectionKind {
    ForbiddenKeyword(String),
    MultipleStatements,
    CommentsPresent,
    UnknownTables(BTreeSet<String>),
    ParseFailure(String),
}

/// Result of one validation pass. The detail phrasing is stable: the
/// error-feedback classifier pattern-matches it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidationOutcome {
    Accepted,
    Rejected { kind: RejectionKind, detail: String },
}

impl ValidationOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, ValidationOutcome::Accepted)
    }

    pub fn detail(&self) -> Option<&str> {
        match self {
            ValidationOutcome::Accepted => None,
            ValidationOutcome::Rejected { detail, .. } => Some(detail),
        }
    }

    fn rejected(kind: RejectionKind, detail: String) -> Self {
        ValidationOutcome::Rejected { kind, detail }
    }
}

/// Validate a candidate query against the allowed-table set.
///
/// Pure and deterministic: the same text and allowed set always produce
/// the same outcome. Checks short-circuit in order: forbidden keywords,
/// multiple statements, comments, unknown tables, parse failure.
pub fn validate(sql: &str, allowed: &AllowedTables) -> ValidationOutcome {
    if let Some(found) = FORBIDDEN.find(sql) {
        let keyword = found.as_str().to_uppercase();
        return ValidationOutcome::rejected(
            RejectionKind::ForbiddenKeyword(keyword.clone()),
            format!("Forbidden SQL keyword: {}", keyword),
        );
    }

    // One trailing separator is tolerated; any other means a second statement.
    let trimmed = sql.trim();
    let single = trimmed.strip_suffix(';').unwrap_or(trimmed);
    if single.contains(';') {
        return ValidationOutcome::rejected(
            RejectionKind::MultipleStatements,
            "Multiple SQL statements not allowed".to_string(),
        );
    }

    if sql.contains("--") || sql.contains("/*") {
        return ValidationOutcome::rejected(
            RejectionKind::CommentsPresent,
            "SQL comments not allowed".to_string(),
        );
    }

    let nodes = match parse_token_tree(single) {
        Ok(nodes) => nodes,
        Err(e) => {
            let message = match e {
                WardenError::SqlParse(msg) => msg,
                other => other.to_string(),
            };
            return ValidationOutcome::rejected(
                RejectionKind::ParseFailure(message.clone()),
                format!("SQL parsing failed: {}", message),
            );
        }
    };

    let referenced = extract_table_refs(&nodes);
    let transient = transient_names(single, &nodes);
    let unknown: BTreeSet<String> = referenced
        .iter()
        .map(|r| r.name.clone())
        .filter(|name| !transient.contains(name) && !allowed.contains(name))
        .collect();

    if !unknown.is_empty() {
        let listed = unknown.iter().map(|n| format!("'{}'", n)).join(", ");
        return ValidationOutcome::rejected(
            RejectionKind::UnknownTables(unknown),
            format!("Unknown tables in query: {{{}}}", listed),
        );
    }

    debug!(
        referenced = referenced.len(),
        transient = transient.len(),
        "sql validation passed"
    );
    ValidationOutcome::Accepted
}

/// Replace forbidden keywords so terminal messages never echo them.
pub fn redact_forbidden_keywords(text: &str) -> String {
    FORBIDDEN.replace_all(text, "[blocked]").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn allowed() -> AllowedTables {
        AllowedTables::new(["orders", "customers"])
    }

    fn rejection_kind(outcome: ValidationOutcome) -> RejectionKind {
        match outcome {
            ValidationOutcome::Rejected { kind, .. } => kind,
            ValidationOutcome::Accepted => panic!("expected rejection"),
        }
    }

    #[test]
    fn accepts_a_well_scoped_query() {
        let outcome = validate("SELECT * FROM orders", &allowed());
        assert!(outcome.is_accepted());
    }

    #[test]
    fn a_trailing_semicolon_is_tolerated() {
        assert!(validate("SELECT * FROM orders;", &allowed()).is_accepted());
    }

    #[test]
    fn rejects_every_forbidden_keyword() {
        for keyword in FORBIDDEN_KEYWORDS {
            let sql = format!("{} something", keyword.to_lowercase());
            let kind = rejection_kind(validate(&sql, &allowed()));
            assert_eq!(kind, RejectionKind::ForbiddenKeyword(keyword.to_string()));
        }
    }

    #[test]
    fn keyword_check_needs_word_boundaries() {
        // "created_at" contains CREATE but is not the keyword.
        let outcome = validate(r#"SELECT "created_at" FROM orders"#, &allowed());
        assert!(outcome.is_accepted());
    }

    #[test]
    fn forbidden_keyword_wins_over_multiple_statements() {
        let kind = rejection_kind(validate("SELECT 1; DROP TABLE x", &allowed()));
        assert_eq!(kind, RejectionKind::ForbiddenKeyword("DROP".to_string()));
    }

    #[test]
    fn rejects_multiple_statements() {
        let kind = rejection_kind(validate("SELECT 1; SELECT 2", &allowed()));
        assert_eq!(kind, RejectionKind::MultipleStatements);
    }

    #[test]
    fn rejects_line_and_block_comments() {
        let kind = rejection_kind(validate("SELECT * FROM orders -- sneaky", &allowed()));
        assert_eq!(kind, RejectionKind::CommentsPresent);
        let kind = rejection_kind(validate("SELECT * FROM orders /* hidden */", &allowed()));
        assert_eq!(kind, RejectionKind::CommentsPresent);
    }

    #[test]
    fn rejects_unknown_tables_with_their_names() {
        let kind = rejection_kind(validate("SELECT * FROM ord", &allowed()));
        match kind {
            RejectionKind::UnknownTables(names) => {
                assert_eq!(names.into_iter().collect::<Vec<_>>(), vec!["ord"]);
            }
            other => panic!("unexpected kind: {:?}", other),
        }
    }

    #[test]
    fn cte_names_are_never_unknown_tables() {
        let sql = "WITH cte AS (SELECT * FROM orders) SELECT * FROM cte";
        assert!(validate(sql, &allowed()).is_accepted());
        // Even with an empty allowed set, the CTE itself is not reported.
        let outcome = validate(sql, &AllowedTables::default());
        match rejection_kind(outcome) {
            RejectionKind::UnknownTables(names) => assert!(!names.contains("cte")),
            other => panic!("unexpected kind: {:?}", other),
        }
    }

    #[test]
    fn subquery_alias_is_resolved_as_transient() {
        let outcome = validate("SELECT * FROM (SELECT * FROM orders) AS o", &allowed());
        assert!(outcome.is_accepted());
    }

    #[test]
    fn function_from_does_not_produce_a_table() {
        let sql = r#"SELECT EXTRACT(DOW FROM "dateTime"::timestamp) FROM orders"#;
        assert!(validate(sql, &AllowedTables::new(["orders"])).is_accepted());
    }

    #[test]
    fn parse_failure_is_reported_when_text_checks_pass() {
        let kind = rejection_kind(validate("SELECT * FROM orders)", &allowed()));
        assert!(matches!(kind, RejectionKind::ParseFailure(_)));
    }

    #[test]
    fn validation_is_idempotent() {
        let sql = "SELECT * FROM orders JOIN ghosts ON 1 = 1";
        let first = validate(sql, &allowed());
        let second = validate(sql, &allowed());
        assert_eq!(first, second);
    }

    #[test]
    fn redaction_strips_keyword_text() {
        let redacted = redact_forbidden_keywords("Forbidden SQL keyword: DROP");
        assert!(!redacted.contains("DROP"));
        assert!(redacted.contains("[blocked]"));
    }
}
