//! Token tree
//!
//! Groups the flat sqlparser token stream into the small tree the
//! extractor and resolver walk: keywords, identifiers (alias folded in),
//! function calls, and parenthesized groups. Function argument lists are
//! opaque subtrees and are dropped at build time.

use crate::error::{Result, WardenError};
use sqlparser::dialect::PostgreSqlDialect;
use sqlparser::keywords::Keyword;
use sqlparser::tokenizer::{Token, Tokenizer, Word};

#[derive(Debug, Clone, PartialEq)]
pub enum SqlNode {
    /// Reserved word, unquoted.
    Keyword(Keyword),
    /// Identifier; `name` is the unquoted, lowercased real name (the last
    /// segment of a qualified name), with any alias folded in.
    Ident { name: String, alias: Option<String> },
    /// Function call. The argument list is not retained.
    Function { name: String, alias: Option<String> },
    /// Parenthesized group, possibly aliased (`(...) AS x` or `(...) x`).
    Group { body: Vec<SqlNode>, alias: Option<String> },
    Comma,
    /// Operator, literal or punctuation we keep no structure for.
    Other,
}

impl SqlNode {
    /// The opaque-subtree predicate: true when a composite node must be
    /// skipped rather than descended into. Function argument lists are
    /// always opaque; a parenthesized group is opaque unless its body is a
    /// subquery. `EXTRACT(DOW FROM col)` therefore never exposes its inner
    /// FROM to the extractor.
    pub fn is_opaque(&self) -> bool {
        match self {
            SqlNode::Function { .. } => true,
            SqlNode::Group { body, .. } => !starts_subquery(body),
            _ => false,
        }
    }
}

/// A group is a subquery when its body leads with SELECT or WITH.
pub fn starts_subquery(body: &[SqlNode]) -> bool {
    matches!(
        body.first(),
        Some(SqlNode::Keyword(Keyword::SELECT)) | Some(SqlNode::Keyword(Keyword::WITH))
    )
}

/// Tokenize `sql` with the Postgres dialect and group it into a tree.
pub fn parse_token_tree(sql: &str) -> Result<Vec<SqlNode>> {
    let dialect = PostgreSqlDialect {};
    let tokens = Tokenizer::new(&dialect, sql)
        .tokenize()
        .map_err(|e| WardenError::SqlParse(e.to_string()))?;
    let significant: Vec<Token> = tokens
        .into_iter()
        .filter(|t| !matches!(t, Token::Whitespace(_) | Token::EOF))
        .collect();

    let mut pos = 0usize;
    let nodes = parse_nodes(&significant, &mut pos)?;
    if pos < significant.len() {
        // Only an unmatched closing parenthesis stops the walk early.
        return Err(WardenError::SqlParse(
            "unbalanced closing parenthesis".to_string(),
        ));
    }
    Ok(nodes)
}

fn parse_nodes(tokens: &[Token], pos: &mut usize) -> Result<Vec<SqlNode>> {
    let mut nodes = Vec::new();
    while *pos < tokens.len() {
        match &tokens[*pos] {
            Token::RParen => return Ok(nodes),
            Token::LParen => {
                *pos += 1;
                let body = parse_nodes(tokens, pos)?;
                if !matches!(tokens.get(*pos), Some(Token::RParen)) {
                    return Err(WardenError::SqlParse("unclosed parenthesis".to_string()));
                }
                *pos += 1;
                let alias = take_alias(tokens, pos);
                nodes.push(SqlNode::Group { body, alias });
            }
            Token::Word(w) => {
                let word = w.clone();
                *pos += 1;
                if is_reserved(&word) {
                    nodes.push(SqlNode::Keyword(word.keyword));
                } else {
                    nodes.push(parse_identifier(&word, tokens, pos));
                }
            }
            Token::Comma => {
                nodes.push(SqlNode::Comma);
                *pos += 1;
            }
            _ => {
                nodes.push(SqlNode::Other);
                *pos += 1;
            }
        }
    }
    Ok(nodes)
}

/// Continue an identifier starting at `first` (already consumed): fold a
/// qualified name down to its last segment, detect a call, take an alias.
fn parse_identifier(first: &Word, tokens: &[Token], pos: &mut usize) -> SqlNode {
    let mut name = normalize(first);
    while matches!(tokens.get(*pos), Some(Token::Period)) {
        match tokens.get(*pos + 1) {
            Some(Token::Word(w)) => {
                name = normalize(w);
                *pos += 2;
            }
            _ => {
                *pos += 1;
                break;
            }
        }
    }

    if matches!(tokens.get(*pos), Some(Token::LParen)) {
        skip_argument_list(tokens, pos);
        let alias = take_alias(tokens, pos);
        SqlNode::Function { name, alias }
    } else {
        let alias = take_alias(tokens, pos);
        SqlNode::Ident { name, alias }
    }
}

/// Consume `AS name` or a bare trailing identifier and return the alias.
/// `AS (` is left untouched: that shape introduces a CTE body or a column
/// list, not an alias.
fn take_alias(tokens: &[Token], pos: &mut usize) -> Option<String> {
    match tokens.get(*pos) {
        Some(Token::Word(w)) if w.quote_style.is_none() && w.keyword == Keyword::AS => {
            match tokens.get(*pos + 1) {
                Some(Token::Word(next)) if !is_reserved(next) => {
                    let alias = normalize(next);
                    *pos += 2;
                    Some(alias)
                }
                _ => None,
            }
        }
        Some(Token::Word(w)) if !is_reserved(w) => {
            let alias = normalize(w);
            *pos += 1;
            Some(alias)
        }
        _ => None,
    }
}

/// Skip a balanced `( ... )` argument list, leaving `pos` just past it.
fn skip_argument_list(tokens: &[Token], pos: &mut usize) {
    let mut depth = 0usize;
    while *pos < tokens.len() {
        match tokens[*pos] {
            Token::LParen => depth += 1,
            Token::RParen => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    *pos += 1;
                    return;
                }
            }
            _ => {}
        }
        *pos += 1;
    }
}

fn is_reserved(w: &Word) -> bool {
    w.quote_style.is_none() && w.keyword != Keyword::NoKeyword
}

fn normalize(w: &Word) -> String {
    w.value.to_lowercase()
}
