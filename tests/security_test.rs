//! Injection-prevention tests for the SQL safety validator.

use querywarden::schema::AllowedTables;
use querywarden::validation::{validate, RejectionKind, ValidationOutcome};

fn allowed_tables() -> AllowedTables {
    AllowedTables::new(["sales", "products", "customers"])
}

fn rejection(sql: &str) -> RejectionKind {
    match validate(sql, &allowed_tables()) {
        ValidationOutcome::Rejected { kind, .. } => kind,
        ValidationOutcome::Accepted => panic!("expected {:?} to be rejected", sql),
    }
}

#[test]
fn multiple_statements_blocked() {
    // DROP is caught first: the keyword check runs before statement counting.
    assert_eq!(
        rejection("SELECT * FROM sales; DROP TABLE users;"),
        RejectionKind::ForbiddenKeyword("DROP".to_string())
    );
    assert_eq!(
        rejection("SELECT * FROM sales; SELECT * FROM products"),
        RejectionKind::MultipleStatements
    );
}

#[test]
fn inline_comments_blocked() {
    assert_eq!(
        rejection("SELECT * FROM sales -- comment"),
        RejectionKind::CommentsPresent
    );
}

#[test]
fn block_comments_blocked() {
    assert_eq!(
        rejection("SELECT * FROM sales /* comment */"),
        RejectionKind::CommentsPresent
    );
}

#[test]
fn write_statements_blocked() {
    for (sql, keyword) in [
        ("DROP TABLE sales", "DROP"),
        ("DELETE FROM sales", "DELETE"),
        ("UPDATE sales SET price = 0", "UPDATE"),
        ("INSERT INTO sales VALUES (1, 2, 3)", "INSERT"),
        ("ALTER TABLE sales ADD COLUMN fake INT", "ALTER"),
        ("TRUNCATE sales", "TRUNCATE"),
        ("CREATE TEMP TABLE t AS SELECT 1", "CREATE"),
        ("GRANT ALL ON sales TO intruder", "GRANT"),
        ("EXEC sp_helptext", "EXEC"),
    ] {
        assert_eq!(
            rejection(sql),
            RejectionKind::ForbiddenKeyword(keyword.to_string()),
            "sql: {}",
            sql
        );
    }
}

#[test]
fn unknown_table_blocked_with_names_reported() {
    match rejection("SELECT * FROM secret_table") {
        RejectionKind::UnknownTables(names) => {
            assert!(names.contains("secret_table"));
        }
        other => panic!("unexpected rejection: {:?}", other),
    }
}

#[test]
fn safe_select_accepted() {
    assert!(validate("SELECT * FROM sales", &allowed_tables()).is_accepted());
    assert!(validate("SELECT * FROM sales;", &allowed_tables()).is_accepted());
}

#[test]
fn cte_and_subquery_aliases_are_not_schema_tables() {
    let cte = "WITH monthly AS (SELECT * FROM sales) SELECT * FROM monthly";
    assert!(validate(cte, &allowed_tables()).is_accepted());

    let subquery = "SELECT * FROM (SELECT * FROM sales) AS s";
    assert!(validate(subquery, &allowed_tables()).is_accepted());
}

#[test]
fn keyword_inside_an_identifier_does_not_trip_the_check() {
    let sql = r#"SELECT "updated_at", "created_by" FROM sales"#;
    assert!(validate(sql, &allowed_tables()).is_accepted());
}

#[test]
fn function_from_is_not_a_table_reference() {
    let sql = r#"SELECT EXTRACT(DOW FROM "soldAt"::timestamp), COUNT(*) FROM sales GROUP BY 1"#;
    assert!(validate(sql, &allowed_tables()).is_accepted());
}

#[test]
fn validation_is_deterministic() {
    let sql = "SELECT * FROM sales JOIN unknown_t ON 1 = 1";
    assert_eq!(
        validate(sql, &allowed_tables()),
        validate(sql, &allowed_tables())
    );
}
