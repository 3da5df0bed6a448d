//! Transient-name resolution
//!
//! Names introduced by the query itself (CTE names and subquery aliases)
//! are not schema tables and must be removed from the extractor's output
//! before membership checking. Over-catching is safe here: a name bound
//! with `AS (` or aliasing a parenthesized body is never a schema table.

use super::token_tree::SqlNode;
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::BTreeSet;

lazy_static! {
    /// `name AS (`: a CTE head, or anything shaped like one.
    static ref CTE_HEAD: Regex =
        Regex::new(r"(?i)\b([A-Za-z_][A-Za-z0-9_]*)\s+AS\s*\(").unwrap();
}

/// CTE names, from a raw-text pass.
pub fn cte_names(sql: &str) -> BTreeSet<String> {
    CTE_HEAD
        .captures_iter(sql)
        .map(|c| c[1].to_lowercase())
        .collect()
}

/// Aliases whose subject is a parenthesized body (subqueries, and
/// conservatively also aliased function calls), from a tree pass.
pub fn subquery_aliases(nodes: &[SqlNode]) -> BTreeSet<String> {
    let mut out = BTreeSet::new();
    collect_aliases(nodes, &mut out);
    out
}

fn collect_aliases(nodes: &[SqlNode], out: &mut BTreeSet<String>) {
    for node in nodes {
        match node {
            SqlNode::Group { body, alias } => {
                if let Some(alias) = alias {
                    out.insert(alias.clone());
                }
                collect_aliases(body, out);
            }
            SqlNode::Function { alias: Some(alias), .. } => {
                out.insert(alias.clone());
            }
            _ => {}
        }
    }
}

/// Union of both passes, lowercase, ready for subtraction.
pub fn transient_names(sql: &str, nodes: &[SqlNode]) -> BTreeSet<String> {
    let mut names = cte_names(sql);
    names.extend(subquery_aliases(nodes));
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::token_tree::parse_token_tree;

    #[test]
    fn finds_single_and_chained_cte_names() {
        let sql = "WITH a AS (SELECT 1), b AS (SELECT 2) SELECT * FROM a JOIN b ON 1 = 1";
        let names = cte_names(sql);
        assert!(names.contains("a"));
        assert!(names.contains("b"));
        assert_eq!(names.len(), 2);
    }

    #[test]
    fn plain_column_aliases_are_not_cte_names() {
        assert!(cte_names("SELECT amount AS total FROM orders").is_empty());
    }

    #[test]
    fn subquery_alias_is_recorded_not_the_inner_tables() {
        let nodes = parse_token_tree("SELECT * FROM (SELECT * FROM orders) AS o").unwrap();
        let aliases = subquery_aliases(&nodes);
        assert!(aliases.contains("o"));
        assert!(!aliases.contains("orders"));
    }

    #[test]
    fn bare_subquery_alias_without_as_keyword() {
        let nodes = parse_token_tree("SELECT * FROM (SELECT 1) sub").unwrap();
        assert!(subquery_aliases(&nodes).contains("sub"));
    }

    #[test]
    fn aliased_function_call_is_conservatively_transient() {
        let nodes = parse_token_tree("SELECT * FROM generate_series(1, 3) AS g").unwrap();
        assert!(subquery_aliases(&nodes).contains("g"));
    }

    #[test]
    fn union_of_both_passes() {
        let sql = "WITH cte AS (SELECT 1) SELECT * FROM cte, (SELECT 2) x";
        let nodes = parse_token_tree(sql).unwrap();
        let names = transient_names(sql, &nodes);
        assert!(names.contains("cte"));
        assert!(names.contains("x"));
    }
}
