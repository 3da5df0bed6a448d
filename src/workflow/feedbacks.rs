//! Generation feedback templates
//!
//! One template per error kind, appended to the regeneration prompt to
//! steer the next attempt. Kept apart from the classification logic so
//! wording can change without touching control flow.

use crate::schema::AllowedTables;
use itertools::Itertools;
use std::collections::BTreeSet;

/// Feedback for rejected table names. Short names get the forgotten-CTE
/// variant; longer names get the exact allowed list plus a closest-match
/// hint for likely typos.
pub fn unknown_tables_feedback(
    invalid: &BTreeSet<String>,
    allowed: &AllowedTables,
    likely_alias: bool,
) -> String {
    let invalid_list = invalid.iter().map(|n| format!("'{}'", n)).join(", ");

    if likely_alias {
        let first = invalid.iter().next().map(String::as_str).unwrap_or("t");
        return format!(
            r#"

**CRITICAL FIX REQUIRED:**
Your previous attempt used a subquery with alias {{{invalid_list}}}, which caused a validation error.

ALWAYS use a CTE (WITH clause) instead of a subquery in the FROM clause.

Example:
WITH ranked AS (
    SELECT *, RANK() OVER (PARTITION BY "category" ORDER BY "value" DESC) AS rank
    FROM data_table
)
SELECT * FROM ranked WHERE rank = 1

Do NOT use: FROM (SELECT ...) AS {first}
"#
        );
    }

    let allowed_list = allowed.names().map(|t| format!("\"{}\"", t)).join(", ");
    let hints = closest_matches(invalid, allowed);
    let hint_line = if hints.is_empty() {
        String::new()
    } else {
        format!("\nDid you mean: {}?\n", hints)
    };

    format!(
        r#"

**CRITICAL FIX REQUIRED:**
Your previous attempt used invalid table(s): {{{invalid_list}}}

These tables DO NOT EXIST in the schema.
{hint_line}
Use ONLY these exact table names: {allowed_list}

Rules:
- Do NOT abbreviate table names
- Do NOT invent new table names
- Do NOT use aliases without defining them as CTEs first
- Copy table names EXACTLY as shown above
"#
    )
}

fn closest_matches(invalid: &BTreeSet<String>, allowed: &AllowedTables) -> String {
    invalid
        .iter()
        .filter_map(|bad| {
            allowed
                .names()
                .map(|good| (strsim::jaro_winkler(bad, good), good))
                .max_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal))
                .filter(|(score, _)| *score >= 0.8)
                .map(|(_, good)| format!("'{}' -> \"{}\"", bad, good))
        })
        .join(", ")
}

pub fn multiple_statements_feedback() -> String {
    r#"

**CRITICAL FIX REQUIRED:**
Your previous attempt had multiple SQL statements (separated by semicolons).

Generate EXACTLY ONE query. Use a CTE (WITH clause) for multi-step logic:

WITH temp AS (
    SELECT "entity_id", SUM("amount") AS total
    FROM transactions
    GROUP BY "entity_id"
)
SELECT e."name", t.total
FROM entities e
JOIN temp t ON e."id" = t."entity_id"
"#
    .to_string()
}

pub fn sql_comments_feedback() -> String {
    r#"

**CRITICAL FIX REQUIRED:**
Your previous attempt had SQL comments (-- or /* */).

Remove ALL comments. Return ONLY the SQL query with no explanations, inside <sql></sql> tags.
"#
    .to_string()
}

pub fn forbidden_keyword_feedback(keyword: &str) -> String {
    if keyword.eq_ignore_ascii_case("CREATE") {
        return r#"

**CRITICAL FIX REQUIRED:**
Your previous attempt used CREATE TEMP TABLE.

Use a CTE (WITH clause) instead:

WITH temp AS (
    SELECT "item_id", COUNT(*) AS record_count
    FROM transactions
    GROUP BY "item_id"
)
SELECT * FROM temp WHERE record_count > 10

CTEs are temporary and automatically cleaned up after the query.
"#
        .to_string();
    }

    format!(
        r#"

**CRITICAL FIX REQUIRED:**
Your previous attempt used the forbidden keyword: {keyword}

This system only allows read-only SELECT queries. Statements that modify
data or schema objects are blocked.

Generate a SELECT query that retrieves the requested information without
modifying anything.
"#
    )
}

pub fn column_not_found_feedback(column: Option<&str>) -> String {
    let column_info = column.map(|c| format!(" '{}'", c)).unwrap_or_default();
    format!(
        r#"

**CRITICAL FIX REQUIRED:**
Your previous attempt referenced a non-existent column{column_info}.

PostgreSQL column name rules:
1. Unquoted names fold to lowercase, so mixed-case columns fail unquoted.
2. ALWAYS double-quote columns for exact matching: t."customerName"
3. Quoted names are case-sensitive.
4. Check the schema for exact column names and quote them correctly.
"#
    )
}

pub fn alias_reference_feedback(column: &str) -> String {
    format!(
        r#"

**Fix: Alias Reference Error ("{column}" does not exist)**
- You defined "{column}" as an ALIAS in the SELECT clause (e.g. `... AS {column}`).
- You CANNOT use an alias in the same SELECT or WHERE clause.
- Solution: wrap the calculation in a CTE first.
- Example:
  WITH stats AS (SELECT a + b AS my_alias FROM data_table)
  SELECT * FROM stats WHERE my_alias > 10
"#
    )
}

pub fn division_by_zero_feedback() -> String {
    r#"

**Fix: Division by Zero Error**
- You are dividing by a value that is ZERO (often STDDEV, SUM, or COUNT).
- Use `NULLIF(column, 0)` to handle division by zero safely.
- Example: `col_a / NULLIF(col_b, 0)` returns NULL instead of an error.
"#
    .to_string()
}

pub fn datetime_format_feedback() -> String {
    r#"

**Fix: Datetime Format Error**
- Date/time columns stored as TEXT may hold ISO formats (e.g. '2023-01-01T12:00:00').
- Your format string in TO_TIMESTAMP() failed.
- Use direct casting instead: `"dateTime"::timestamp`
- PostgreSQL handles ISO formats automatically when casting.
"#
    .to_string()
}

pub fn parsing_error_feedback(error_message: &str) -> String {
    format!(
        r#"

**CRITICAL FIX REQUIRED:**
Your previous attempt had a SQL error: {error_message}

Common issues:
1. Missing quotes around mixed-case column names
2. Incorrect JOIN syntax
3. Missing GROUP BY for aggregated columns
4. Mismatched parentheses in CTEs
"#
    )
}
