//! Generation prompts
//!
//! Prompt builders for the text generator plus the tag extractors used to
//! read its output. The simplified prompt is the fallback-mode strategy:
//! fetch raw rows and leave the analysis to a downstream step.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref SQL_TAG: Regex = Regex::new(r"(?is)<sql>(.*?)</sql>").unwrap();
    static ref ANSWER_TAG: Regex = Regex::new(r"(?is)<answer>(.*?)</answer>").unwrap();
}

/// Full SQL generation prompt with reasoning guidance.
pub fn sql_generation_prompt(schema_info: &str, question: &str) -> String {
    format!(
        r#"You are an expert PostgreSQL query generator. Analyze the question carefully before generating SQL.

<database_schema>
{schema_info}
</database_schema>

<user_question>
{question}
</user_question>

<instructions>
Before writing the query, think through which tables contain the data, what
foreign keys connect them, and whether the question needs CTEs or window
functions.

CRITICAL RULES:
1. Use EXACT table names from the schema - never abbreviate or invent.
2. Table aliases are allowed: FROM transactions t JOIN entities e ON ...
3. Double-quote ALL columns - PostgreSQL is case-sensitive: t."columnName"
4. Single query only - no semicolons, NO comments (-- or /**/), no temp tables.
5. Use CTEs, NOT subqueries in the FROM clause.
6. Dates stored as TEXT: cast with column_name::timestamp, never TO_DATE with a format.
7. Guard divisions with NULLIF(denominator, 0).
8. Do NOT reference a SELECT alias at the same level - wrap it in a CTE first.
</instructions>

<output_format>
Write your reasoning inside <reasoning> tags, then ONLY the SQL query inside <sql> tags.
</output_format>

Now generate your response following the format above:
"#
    )
}

/// Simplified prompt for fallback mode: fetch raw rows only, so a
/// downstream script-based analysis step can compute the result.
pub fn simplified_sql_prompt(schema_info: &str, question: &str) -> String {
    format!(
        r#"You are an expert PostgreSQL query generator. The analysis itself will be
performed by a downstream script, NOT in SQL.

<database_schema>
{schema_info}
</database_schema>

<user_question>
{question}
</user_question>

TASK: generate a SIMPLE SELECT query that fetches the RAW DATA needed for the analysis.

CRITICAL RULES:
1. Do NOT perform statistical calculations (no AVG, STDDEV, percentiles).
2. Do NOT use window functions.
3. Do NOT use date functions (no EXTRACT, DATE_TRUNC).
4. Just SELECT the relevant columns AS-IS from the appropriate table(s).
5. JOINs and WHERE filters are allowed.

Return ONLY the SQL query inside <sql> tags. No explanations.
"#
    )
}

/// Prompt for the final natural-language answer over the result rows.
pub fn answer_prompt(question: &str, rows_json: &str) -> String {
    format!(
        r#"Answer the user's question from the query result below.

<user_question>
{question}
</user_question>

<query_result>
{rows_json}
</query_result>

Write a short, direct answer in plain language. Do not mention SQL or the
result format. Put the answer inside <answer> tags.
"#
    )
}

/// Pull the SQL out of generator output: `<sql>` tags first, then a
/// markdown-fence fallback for generators that ignore the format.
pub fn extract_sql(raw: &str) -> String {
    if let Some(caps) = SQL_TAG.captures(raw) {
        return caps[1].trim().to_string();
    }
    raw.trim()
        .trim_start_matches("```sql")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim()
        .trim_start_matches("SQL:")
        .trim()
        .to_string()
}

/// Pull the answer text out of generator output, falling back to the raw
/// content when the tags are missing.
pub fn extract_answer(raw: &str) -> String {
    match ANSWER_TAG.captures(raw) {
        Some(caps) => caps[1].trim().to_string(),
        None => raw.trim().to_string(),
    }
}
