// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Compilation of filter trees into parameterized SQL fragments.
//!
//! Every relationship segment becomes a `LEFT JOIN` on the relation of its
//! parent alias. Join aliases are the root alias plus a per-query ordinal
//! (`course_1`, `course_2`, ...), so distinct paths never share one. The
//! final segment becomes a column comparison against a
//! positional parameter. Identifiers are validated before any text is
//! produced and literals never appear in the output text.

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;
use serde_json::Value;

use super::path::{validate_identifier, FieldPath};
use super::tree::FilterTree;
use crate::error::FilterResult;

// =============================================================================
// Join
// =============================================================================

/// A relation join: `LEFT JOIN parent.relation alias`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Join {
    /// Alias of the joined-from table.
    pub parent: String,
    /// Relation name on the parent.
    pub relation: String,
    /// Alias of the joined table.
    pub alias: String,
}

impl fmt::Display for Join {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LEFT JOIN {}.{} {}", self.parent, self.relation, self.alias)
    }
}

// =============================================================================
// CompiledFilter
// =============================================================================

/// Output of [`SqlFilter::compile`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompiledFilter {
    /// Joins in first-use order, each relationship path once.
    pub joins: Vec<Join>,
    /// Boolean expression with `$n` placeholders.
    pub where_clause: String,
    /// Parameter values; `params[0]` binds `$1`.
    pub params: Vec<Value>,
}

impl CompiledFilter {
    /// Returns `true` if the filter excludes every row.
    pub fn is_nothing(&self) -> bool {
        self.where_clause == FALSE
    }

    /// Renders the joins and the `WHERE` clause as one fragment.
    pub fn to_sql(&self) -> String {
        let mut sql = String::new();
        for join in &self.joins {
            sql.push_str(&join.to_string());
            sql.push('\n');
        }
        sql.push_str("WHERE ");
        sql.push_str(&self.where_clause);
        sql
    }
}

const TRUE: &str = "1 = 1";
const FALSE: &str = "1 = 0";

// =============================================================================
// SqlFilter
// =============================================================================

/// Compiles filter trees against a root table alias.
///
/// # Examples
///
/// ```
/// use campus_core::filter::{FilterTree, SqlFilter};
///
/// let tree = FilterTree::Or(vec![FilterTree::eq("teacher.user.id", 2)]);
/// let compiled = SqlFilter::new("course").compile(Some(&tree)).unwrap();
///
/// assert_eq!(compiled.joins.len(), 2);
/// assert_eq!(compiled.where_clause, "course_2.id = $1");
/// ```
#[derive(Debug, Clone)]
pub struct SqlFilter {
    root_alias: String,
}

impl SqlFilter {
    /// Creates a compiler for the given root alias.
    pub fn new(root_alias: impl Into<String>) -> Self {
        Self {
            root_alias: root_alias.into(),
        }
    }

    /// Compiles a tree. `None` (unrestricted) compiles to `1 = 1`.
    pub fn compile(&self, tree: Option<&FilterTree>) -> FilterResult<CompiledFilter> {
        validate_identifier(&self.root_alias, &self.root_alias)?;

        let mut ctx = Context {
            root: &self.root_alias,
            joins: Vec::new(),
            seen: HashMap::new(),
            params: Vec::new(),
        };

        let where_clause = match tree {
            Some(tree) => ctx.expr(tree)?,
            None => TRUE.to_string(),
        };

        Ok(CompiledFilter {
            joins: ctx.joins,
            where_clause,
            params: ctx.params,
        })
    }
}

struct Context<'a> {
    root: &'a str,
    joins: Vec<Join>,
    /// `parent.relation` to alias.
    seen: HashMap<String, String>,
    params: Vec<Value>,
}

impl Context<'_> {
    fn expr(&mut self, tree: &FilterTree) -> FilterResult<String> {
        match tree {
            FilterTree::And(children) => self.group(children, " AND ", TRUE),
            FilterTree::Or(children) => self.group(children, " OR ", FALSE),
            FilterTree::Not(child) => Ok(format!("NOT ({})", self.expr(child)?)),
            FilterTree::Eq { path, value } => self.comparison(path, value),
        }
    }

    fn group(&mut self, children: &[FilterTree], op: &str, empty: &str) -> FilterResult<String> {
        match children {
            [] => Ok(empty.to_string()),
            [only] => self.expr(only),
            _ => {
                let parts = children
                    .iter()
                    .map(|child| self.expr(child))
                    .collect::<FilterResult<Vec<_>>>()?;
                Ok(format!("({})", parts.join(op)))
            }
        }
    }

    fn comparison(&mut self, path: &FieldPath, value: &Value) -> FilterResult<String> {
        path.validate()?;

        let mut alias = self.root.to_string();
        for relation in path.relations() {
            alias = self.join(&alias, relation);
        }

        let field = path.field().unwrap_or_default();
        if value.is_null() {
            return Ok(format!("{}.{} IS NULL", alias, field));
        }

        self.params.push(value.clone());
        Ok(format!("{}.{} = ${}", alias, field, self.params.len()))
    }

    fn join(&mut self, parent: &str, relation: &str) -> String {
        let key = format!("{}.{}", parent, relation);
        if let Some(alias) = self.seen.get(&key) {
            return alias.clone();
        }

        let alias = format!("{}_{}", self.root, self.joins.len() + 1);
        self.joins.push(Join {
            parent: parent.to_string(),
            relation: relation.to_string(),
            alias: alias.clone(),
        });
        self.seen.insert(key, alias.clone());
        alias
    }
}

// =============================================================================
// Tests
// =============================================================================
