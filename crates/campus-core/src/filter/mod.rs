// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Query filter translation.
//!
//! This module provides:
//! - [`to_filter`]: rule set to [`FilterTree`] (AND/OR of path equalities)
//! - [`FilterTree::matches`] for in-memory rows
//! - [`SqlFilter`]: tree to parameterized SQL with deduplicated joins
//!
//! Paths are validated against a strict identifier pattern before any query
//! text is produced. Literals are always bound as parameters.

mod path;
mod sql;
mod tree;

pub use path::{is_identifier, FieldPath};
pub use sql::{CompiledFilter, Join, SqlFilter};
pub use tree::{to_filter, FilterTree};
