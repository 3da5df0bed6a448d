//! Error classification and feedback routing
//!
//! Maps validator rejections and execution-error messages to the targeted
//! feedback appended to the next generation prompt. Message classification
//! is a priority-ordered list of (predicate, kind) pairs kept as plain
//! data: first match wins, later entries are never evaluated, and a new
//! phrasing is one line in the list.

use super::feedbacks::{
    alias_reference_feedback, column_not_found_feedback, datetime_format_feedback,
    division_by_zero_feedback, forbidden_keyword_feedback, multiple_statements_feedback,
    parsing_error_feedback, sql_comments_feedback, unknown_tables_feedback,
};
use super::state::{ExecutionOutcome, StepOutcome};
use crate::config::WorkflowConfig;
use crate::schema::AllowedTables;
use crate::validation::{redact_forbidden_keywords, RejectionKind, ValidationOutcome};
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::BTreeSet;
use tracing::debug;

/// Classes an execution-error message can fall into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlErrorKind {
    UnknownTables,
    MultipleStatements,
    CommentsPresent,
    ForbiddenKeyword,
    ColumnNotFound,
    DivisionByZero,
    DatetimeFormat,
    Generic,
}

type Predicate = fn(&str) -> bool;

/// Priority-ordered classification table. First match wins.
pub static CLASSIFIERS: &[(Predicate, SqlErrorKind)] = &[
    (contains_unknown_tables as Predicate, SqlErrorKind::UnknownTables),
    (contains_multiple_statements as Predicate, SqlErrorKind::MultipleStatements),
    (contains_comments as Predicate, SqlErrorKind::CommentsPresent),
    (contains_forbidden_keyword as Predicate, SqlErrorKind::ForbiddenKeyword),
    (contains_column_not_found as Predicate, SqlErrorKind::ColumnNotFound),
    (contains_division_by_zero as Predicate, SqlErrorKind::DivisionByZero),
    (contains_datetime_format as Predicate, SqlErrorKind::DatetimeFormat),
];

fn contains_unknown_tables(message: &str) -> bool {
    message.contains("Unknown tables in query")
}

fn contains_multiple_statements(message: &str) -> bool {
    message.contains("Multiple SQL statements not allowed")
}

fn contains_comments(message: &str) -> bool {
    message.contains("SQL comments not allowed")
}

fn contains_forbidden_keyword(message: &str) -> bool {
    message.contains("Forbidden SQL keyword")
}

fn contains_column_not_found(message: &str) -> bool {
    let lower = message.to_lowercase();
    lower.contains("column") && lower.contains("does not exist")
}

fn contains_division_by_zero(message: &str) -> bool {
    message.to_lowercase().contains("division by zero")
}

fn contains_datetime_format(message: &str) -> bool {
    let lower = message.to_lowercase();
    lower.contains("datetime") && lower.contains("format")
}

/// Classify an error message. Falls through to [`SqlErrorKind::Generic`].
pub fn classify(message: &str) -> SqlErrorKind {
    for (matches, kind) in CLASSIFIERS {
        if matches(message) {
            return *kind;
        }
    }
    SqlErrorKind::Generic
}

lazy_static! {
    static ref UNKNOWN_TABLES_RE: Regex =
        Regex::new(r"Unknown tables in query: \{(.*?)\}").unwrap();
    static ref MISSING_COLUMN_RE: Regex =
        Regex::new(r#"column "(.+?)" does not exist"#).unwrap();
    static ref FORBIDDEN_KEYWORD_RE: Regex =
        Regex::new(r"Forbidden SQL keyword: (\w+)").unwrap();
    static ref SELECT_ALIAS_RE: Regex =
        Regex::new(r#"(?i)\bAS\s+"?([A-Za-z_][A-Za-z0-9_]*)"?"#).unwrap();
}

/// Aliases bound with `AS` in the failed statement. Used to tell an alias
/// misused in the same clause from a genuinely missing column.
pub fn select_aliases(sql: &str) -> BTreeSet<String> {
    SELECT_ALIAS_RE
        .captures_iter(sql)
        .map(|c| c[1].to_lowercase())
        .collect()
}

fn parse_unknown_tables(message: &str) -> BTreeSet<String> {
    UNKNOWN_TABLES_RE
        .captures(message)
        .map(|c| {
            c[1].split(',')
                .map(|part| part.trim().trim_matches('\'').trim_matches('"').to_lowercase())
                .filter(|name| !name.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

/// Feedback for the outcome of one attempt, or `None` when it succeeded.
/// Validator rejections carry structured kinds and skip message parsing;
/// execution errors go through the classifier.
pub fn feedback_for_outcome(
    outcome: &StepOutcome,
    failed_sql: Option<&str>,
    allowed: &AllowedTables,
    config: &WorkflowConfig,
) -> Option<String> {
    match outcome {
        StepOutcome::Validation(ValidationOutcome::Rejected { kind, detail }) => {
            Some(match kind {
                RejectionKind::ForbiddenKeyword(keyword) => forbidden_keyword_feedback(keyword),
                RejectionKind::MultipleStatements => multiple_statements_feedback(),
                RejectionKind::CommentsPresent => sql_comments_feedback(),
                RejectionKind::UnknownTables(names) => {
                    let likely_alias =
                        names.iter().any(|n| n.len() <= config.alias_name_max_len);
                    unknown_tables_feedback(names, allowed, likely_alias)
                }
                RejectionKind::ParseFailure(_) => parsing_error_feedback(detail),
            })
        }
        StepOutcome::Execution(ExecutionOutcome::Failed(message)) => {
            Some(feedback_for_message(message, failed_sql, allowed, config))
        }
        _ => None,
    }
}

/// Feedback for a collaborator-origin error message string.
pub fn feedback_for_message(
    message: &str,
    failed_sql: Option<&str>,
    allowed: &AllowedTables,
    config: &WorkflowConfig,
) -> String {
    let kind = classify(message);
    debug!(?kind, "classified execution error");
    match kind {
        SqlErrorKind::UnknownTables => {
            let invalid = parse_unknown_tables(message);
            if invalid.is_empty() {
                return parsing_error_feedback(message);
            }
            let likely_alias = invalid.iter().any(|n| n.len() <= config.alias_name_max_len);
            unknown_tables_feedback(&invalid, allowed, likely_alias)
        }
        SqlErrorKind::MultipleStatements => multiple_statements_feedback(),
        SqlErrorKind::CommentsPresent => sql_comments_feedback(),
        SqlErrorKind::ForbiddenKeyword => {
            let keyword = FORBIDDEN_KEYWORD_RE
                .captures(message)
                .map(|c| c[1].to_string())
                .unwrap_or_else(|| "CREATE".to_string());
            forbidden_keyword_feedback(&keyword)
        }
        SqlErrorKind::ColumnNotFound => match MISSING_COLUMN_RE.captures(message) {
            Some(caps) => {
                let column = caps[1].to_string();
                let is_alias = failed_sql
                    .map(|sql| select_aliases(sql).contains(&column.to_lowercase()))
                    .unwrap_or(false);
                if is_alias {
                    alias_reference_feedback(&column)
                } else {
                    column_not_found_feedback(Some(&column))
                }
            }
            None => column_not_found_feedback(None),
        },
        SqlErrorKind::DivisionByZero => division_by_zero_feedback(),
        SqlErrorKind::DatetimeFormat => datetime_format_feedback(),
        SqlErrorKind::Generic => parsing_error_feedback(message),
    }
}

/// Terminal message shown when the run gives up. Surfaces only the last
/// human-readable error line, with forbidden-keyword text redacted and no
/// backtraces.
pub fn final_error_message(outcome: Option<&StepOutcome>) -> String {
    let detail = outcome
        .and_then(|o| o.error_detail())
        .unwrap_or("the query could not be generated");
    let first_line = detail.lines().next().unwrap_or(detail).trim();
    format!(
        "I could not answer this question: {}. Please try rephrasing it.",
        redact_forbidden_keywords(first_line)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn allowed() -> AllowedTables {
        AllowedTables::new(["orders", "customers"])
    }

    #[test]
    fn classification_follows_priority_order() {
        // A message matching both table and column phrasing classifies as
        // unknown tables because that entry comes first.
        let message = "Unknown tables in query: {'x'} and column \"y\" does not exist";
        assert_eq!(classify(message), SqlErrorKind::UnknownTables);
        assert_eq!(classify("column \"y\" does not exist"), SqlErrorKind::ColumnNotFound);
        assert_eq!(classify("integer division by zero"), SqlErrorKind::DivisionByZero);
        assert_eq!(classify("something else entirely"), SqlErrorKind::Generic);
    }

    #[test]
    fn unknown_table_names_are_parsed_from_the_message() {
        let names = parse_unknown_tables("Error: Unknown tables in query: {'ord', 'cust'}");
        assert_eq!(names.into_iter().collect::<Vec<_>>(), vec!["cust", "ord"]);
    }

    #[test]
    fn select_aliases_are_collected_case_insensitively() {
        let aliases = select_aliases(
            r#"SELECT SUM("amount") AS total, AVG("amount") AS "avgAmount" FROM orders"#,
        );
        assert!(aliases.contains("total"));
        assert!(aliases.contains("avgamount"));
    }

    #[test]
    fn column_errors_split_on_select_alias_membership() {
        let config = WorkflowConfig::default();
        let sql = r#"SELECT "amount" / 2 AS half FROM orders WHERE half > 10"#;
        let feedback = feedback_for_message(
            r#"Error: column "half" does not exist"#,
            Some(sql),
            &allowed(),
            &config,
        );
        assert!(feedback.contains("Alias Reference Error"));

        let feedback = feedback_for_message(
            r#"Error: column "ghost" does not exist"#,
            Some(sql),
            &allowed(),
            &config,
        );
        assert!(feedback.contains("non-existent column 'ghost'"));
    }

    #[test]
    fn short_unknown_names_trigger_the_alias_variant() {
        let config = WorkflowConfig::default();
        let feedback = feedback_for_message(
            "Error: Unknown tables in query: {'o'}",
            None,
            &allowed(),
            &config,
        );
        assert!(feedback.contains("CTE (WITH clause)"));
    }

    #[test]
    fn final_message_redacts_forbidden_keywords() {
        let outcome = StepOutcome::Execution(ExecutionOutcome::Failed(
            "Error: syntax error near DROP\nstack frame 1\nstack frame 2".to_string(),
        ));
        let message = final_error_message(Some(&outcome));
        assert!(!message.contains("DROP"));
        assert!(!message.contains("stack frame"));
    }
}
