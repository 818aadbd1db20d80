// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Fixed rules derived from role tags.

use super::grant::Grant;
use super::{actions, resources};
use crate::identity::{Role, Subject};

/// Returns the rules a role contributes for a subject.
///
/// | Role    | Rules |
/// |---------|-------|
/// | Admin   | `manage all` |
/// | Teacher | `get Course` and `update Course [description]` where `teacher.user.id` is the subject |
/// | Student | `get Course` where `enrollments.student.user.id` is the subject and `enrollments.status` is `ACTIVE` |
pub fn role_rules(role: Role, subject: &Subject) -> Vec<Grant> {
    let uid = subject.id.get();

    match role {
        Role::Admin => vec![Grant::manage_all()],
        Role::Teacher => vec![
            Grant::new(actions::GET, resources::COURSE).when("teacher.user.id", uid),
            Grant::new(actions::UPDATE, resources::COURSE)
                .when("teacher.user.id", uid)
                .fields(["description"]),
        ],
        Role::Student => vec![
            Grant::new(actions::GET, resources::COURSE)
                .when("enrollments.student.user.id", uid)
                .when("enrollments.status", "ACTIVE"),
        ],
    }
}

// =============================================================================
// Tests
// =============================================================================
