//! Table reference extraction
//!
//! Walks the token tree and records every table-like identifier in
//! FROM/JOIN position, descending into parenthesized subqueries but never
//! into opaque subtrees. `EXTRACT(DOW FROM col)` uses FROM for an
//! unrelated purpose and must not contribute a reference; the opaque-group
//! predicate on [`SqlNode`] is what guarantees that.

use super::token_tree::SqlNode;
use sqlparser::keywords::Keyword;
use std::collections::{BTreeMap, BTreeSet};

/// Where in the statement a table reference was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefPosition {
    /// FROM/JOIN position of the outermost statement.
    TopLevel,
    /// FROM/JOIN position inside a nested subquery.
    Nested,
}

/// A table name extracted from FROM/JOIN position, lowercased and unquoted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferencedTable {
    pub name: String,
    pub position: RefPosition,
}

/// Keywords that arm the "expecting table" flag.
const TABLE_INTRODUCERS: &[Keyword] = &[
    Keyword::FROM,
    Keyword::JOIN,
    Keyword::INNER,
    Keyword::LEFT,
    Keyword::RIGHT,
    Keyword::FULL,
    Keyword::CROSS,
];

/// Keywords that disarm it.
const TABLE_TERMINATORS: &[Keyword] = &[Keyword::OUTER, Keyword::ON, Keyword::USING];

/// Every table referenced in FROM/JOIN position, at any reachable nesting
/// level. A name seen both top-level and nested is reported top-level.
pub fn extract_table_refs(nodes: &[SqlNode]) -> Vec<ReferencedTable> {
    let mut found: BTreeMap<String, RefPosition> = BTreeMap::new();
    walk(nodes, 0, &mut found);
    found
        .into_iter()
        .map(|(name, position)| ReferencedTable { name, position })
        .collect()
}

/// Just the names, for set arithmetic against the transient and allowed sets.
pub fn referenced_names(nodes: &[SqlNode]) -> BTreeSet<String> {
    extract_table_refs(nodes)
        .into_iter()
        .map(|r| r.name)
        .collect()
}

fn walk(nodes: &[SqlNode], depth: usize, found: &mut BTreeMap<String, RefPosition>) {
    let mut expecting_table = false;
    let mut after_ref = false;
    for node in nodes {
        let mut recorded = false;
        match node {
            SqlNode::Keyword(kw) => {
                if TABLE_INTRODUCERS.contains(kw) {
                    expecting_table = true;
                } else if TABLE_TERMINATORS.contains(kw) {
                    expecting_table = false;
                }
            }
            SqlNode::Ident { name, .. } => {
                if expecting_table {
                    let position = if depth == 0 {
                        RefPosition::TopLevel
                    } else {
                        RefPosition::Nested
                    };
                    found
                        .entry(name.clone())
                        .and_modify(|p| {
                            if position == RefPosition::TopLevel {
                                *p = RefPosition::TopLevel;
                            }
                        })
                        .or_insert(position);
                    expecting_table = false;
                    recorded = true;
                }
            }
            SqlNode::Comma => {
                // A comma directly after a recorded reference continues an
                // identifier list: `FROM a, b` must yield both members.
                if after_ref {
                    expecting_table = true;
                }
            }
            SqlNode::Function { .. } => {
                // Opaque; a function in table position is not a schema table.
                expecting_table = false;
            }
            SqlNode::Group { body, .. } => {
                if !node.is_opaque() {
                    walk(body, depth + 1, found);
                }
                expecting_table = false;
            }
            SqlNode::Other => {}
        }
        after_ref = recorded;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::token_tree::parse_token_tree;

    fn names(sql: &str) -> Vec<String> {
        referenced_names(&parse_token_tree(sql).unwrap())
            .into_iter()
            .collect()
    }

    #[test]
    fn simple_from_clause() {
        assert_eq!(names("SELECT * FROM orders"), vec!["orders"]);
    }

    #[test]
    fn comma_list_yields_every_member() {
        assert_eq!(
            names("SELECT * FROM orders o, customers c, refunds"),
            vec!["customers", "orders", "refunds"]
        );
    }

    #[test]
    fn join_family_and_terminators() {
        assert_eq!(
            names(
                "SELECT * FROM orders o \
                 LEFT OUTER JOIN customers c ON o.customer_id = c.id \
                 CROSS JOIN refunds"
            ),
            vec!["customers", "orders", "refunds"]
        );
    }

    #[test]
    fn function_from_immunity() {
        // FROM inside EXTRACT is not a table introducer.
        assert_eq!(
            names(r#"SELECT EXTRACT(DOW FROM "dateTime"::timestamp) FROM orders"#),
            vec!["orders"]
        );
    }

    #[test]
    fn descends_into_from_position_subqueries() {
        let refs =
            extract_table_refs(&parse_token_tree("SELECT * FROM (SELECT * FROM orders) AS o").unwrap());
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].name, "orders");
        assert_eq!(refs[0].position, RefPosition::Nested);
    }

    #[test]
    fn alias_is_stripped_and_case_is_normalized() {
        assert_eq!(
            names(r#"SELECT * FROM "Orders" AS o JOIN sales.Customers cust ON 1 = 1"#),
            vec!["customers", "orders"]
        );
    }

    #[test]
    fn set_function_in_table_position_is_not_a_table() {
        assert_eq!(names("SELECT * FROM generate_series(1, 10) AS t(i)"), Vec::<String>::new());
    }

    #[test]
    fn union_branches_are_both_seen() {
        assert_eq!(
            names("SELECT id FROM orders UNION SELECT id FROM refunds"),
            vec!["orders", "refunds"]
        );
    }
}
