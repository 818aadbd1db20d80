// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Integration tests for role rules, instance checks and row filters.
//!
//! Exercises campus-core alone: rule sets resolved from subjects are checked
//! against course instances shaped like the API's, and translated into row
//! filters that are evaluated in memory and compiled to SQL.

use campus_core::ability::{actions, resources, Grant, PermittedFields, RuleSet};
use campus_core::filter::{to_filter, FilterTree, SqlFilter};
use campus_core::{resolve, AbilityError, Role, Subject, UserId};
use serde_json::{json, Value};

// =============================================================================
// Helpers
// =============================================================================

fn subject(id: i64, roles: &[Role]) -> Subject {
    roles
        .iter()
        .fold(
            Subject::builder(UserId::new(id), format!("user{}", id), format!("user{}@user.com", id)),
            |b, role| b.role(*role),
        )
        .build()
}

fn course(id: i64, teacher: i64, enrollments: &[(i64, &str)]) -> Value {
    json!({
        "id": id,
        "name": format!("Course {}", id),
        "description": "",
        "teacher": { "id": teacher, "user": { "id": teacher } },
        "enrollments": enrollments
            .iter()
            .map(|(student, status)| json!({
                "status": status,
                "student": { "id": student, "user": { "id": student } }
            }))
            .collect::<Vec<_>>(),
    })
}

fn catalog() -> Vec<Value> {
    vec![
        course(1, 2, &[(4, "ACTIVE")]),
        course(2, 3, &[(4, "DROPPED")]),
        course(3, 2, &[]),
    ]
}

fn visible_ids(rules: &RuleSet) -> Vec<i64> {
    let filter = to_filter(rules, actions::GET, resources::COURSE);
    catalog()
        .into_iter()
        .filter(|c| filter.as_ref().is_none_or(|f| f.matches(c)))
        .map(|c| c["id"].as_i64().unwrap())
        .collect()
}

// =============================================================================
// Role Resolution
// =============================================================================

#[test]
fn test_admin_manages_everything() {
    let rules = resolve(&subject(1, &[Role::Admin])).unwrap();

    assert!(rules.is_absolute());
    assert!(rules.can(actions::DELETE, resources::USER));
    assert!(rules.can_on(actions::UPDATE, resources::COURSE, &course(9, 99, &[])));
    assert_eq!(
        rules.permitted_fields(actions::UPDATE, resources::COURSE, None),
        PermittedFields::All
    );
    assert_eq!(visible_ids(&rules), vec![1, 2, 3]);
}

#[test]
fn test_teacher_reaches_only_own_courses() {
    let rules = resolve(&subject(2, &[Role::Teacher])).unwrap();

    assert!(rules.can(actions::GET, resources::COURSE));
    assert!(rules.can_on(actions::GET, resources::COURSE, &catalog()[0]));
    assert!(!rules.can_on(actions::GET, resources::COURSE, &catalog()[1]));
    assert!(!rules.can(actions::DELETE, resources::COURSE));
    assert_eq!(visible_ids(&rules), vec![1, 3]);
}

#[test]
fn test_teacher_may_update_description_only() {
    let rules = resolve(&subject(2, &[Role::Teacher])).unwrap();
    let own = &catalog()[0];

    let fields = rules.permitted_fields(actions::UPDATE, resources::COURSE, Some(own));
    assert!(fields.contains("description"));
    assert!(!fields.contains("name"));

    assert!(rules
        .authorize_fields(actions::UPDATE, resources::COURSE, own, ["description"])
        .is_ok());
    assert!(matches!(
        rules.authorize_fields(actions::UPDATE, resources::COURSE, own, ["description", "name"]),
        Err(AbilityError::FieldNotPermitted { .. })
    ));
    assert!(matches!(
        rules.authorize_fields(actions::UPDATE, resources::COURSE, &catalog()[1], ["description"]),
        Err(AbilityError::Forbidden { .. })
    ));
}

#[test]
fn test_student_sees_active_enrollments_only() {
    let rules = resolve(&subject(4, &[Role::Student])).unwrap();

    assert!(rules.can_on(actions::GET, resources::COURSE, &catalog()[0]));
    assert!(!rules.can_on(actions::GET, resources::COURSE, &catalog()[1]));
    assert!(!rules.can(actions::UPDATE, resources::COURSE));
    assert_eq!(visible_ids(&rules), vec![1]);
}

#[test]
fn test_unenrolled_student_sees_nothing() {
    let rules = resolve(&subject(5, &[Role::Student])).unwrap();

    assert!(visible_ids(&rules).is_empty());
    assert!(rules.can(actions::GET, resources::COURSE));
}

#[test]
fn test_multiple_roles_union() {
    let rules = resolve(&subject(4, &[Role::Teacher, Role::Student])).unwrap();

    // No course is taught by user 4; course 1 is reachable as a student.
    assert_eq!(visible_ids(&rules), vec![1]);
    assert!(rules.can(actions::UPDATE, resources::COURSE));
}

#[test]
fn test_subject_without_roles_has_no_rules() {
    let rules = resolve(&subject(6, &[])).unwrap();

    assert!(rules.is_empty());
    assert!(!rules.can(actions::GET, resources::COURSE));
    assert_eq!(
        to_filter(&rules, actions::GET, resources::COURSE),
        Some(FilterTree::nothing())
    );
}

#[test]
fn test_unknown_role_tag_is_an_error() {
    assert!(matches!(
        Role::parse_all(["Teacher", "Principal"]),
        Err(AbilityError::UnknownRole { .. })
    ));
}

// =============================================================================
// Precedence
// =============================================================================

#[test]
fn test_later_prohibition_overrides_grant() {
    let rules = RuleSet::try_new(vec![
        Grant::new(actions::GET, resources::COURSE),
        Grant::new(actions::GET, resources::COURSE).when("id", 2).inverted(),
    ])
    .unwrap();

    assert!(rules.can_on(actions::GET, resources::COURSE, &catalog()[0]));
    assert!(!rules.can_on(actions::GET, resources::COURSE, &catalog()[1]));
    assert_eq!(visible_ids(&rules), vec![1, 3]);
}

#[test]
fn test_field_prohibition_keeps_rows_visible() {
    let rules = RuleSet::try_new(vec![
        Grant::new(actions::GET, resources::COURSE),
        Grant::new(actions::GET, resources::COURSE).fields(["description"]).inverted(),
    ])
    .unwrap();

    assert_eq!(visible_ids(&rules), vec![1, 2, 3]);
    let fields = rules.permitted_fields(actions::GET, resources::COURSE, Some(&catalog()[0]));
    assert!(fields.contains("name"));
    assert!(!fields.contains("description"));
}

// =============================================================================
// SQL Compilation
// =============================================================================

#[test]
fn test_teacher_filter_compiles_with_joins() {
    let rules = resolve(&subject(2, &[Role::Teacher])).unwrap();
    let filter = to_filter(&rules, actions::GET, resources::COURSE);

    let compiled = SqlFilter::new("course").compile(filter.as_ref()).unwrap();
    assert_eq!(compiled.joins.len(), 2);
    assert_eq!(compiled.where_clause, "course_2.id = $1");
    assert_eq!(compiled.params, vec![json!(2)]);
    assert!(compiled.to_sql().starts_with("LEFT JOIN course.teacher course_1\nLEFT JOIN course_1.user course_2"));
}

#[test]
fn test_student_filter_binds_every_literal() {
    let rules = resolve(&subject(4, &[Role::Student])).unwrap();
    let filter = to_filter(&rules, actions::GET, resources::COURSE);

    let compiled = SqlFilter::new("course").compile(filter.as_ref()).unwrap();
    assert!(compiled.params.contains(&json!(4)));
    assert!(compiled.params.contains(&json!("ACTIVE")));
    assert!(compiled.where_clause.contains(".status = $"));
    assert!(!compiled.where_clause.contains("ACTIVE"));
}

#[test]
fn test_unrestricted_and_empty_filters() {
    let admin = resolve(&subject(1, &[Role::Admin])).unwrap();
    let nobody = resolve(&subject(6, &[])).unwrap();
    let sql = SqlFilter::new("course");

    let all = sql
        .compile(to_filter(&admin, actions::GET, resources::COURSE).as_ref())
        .unwrap();
    assert!(all.joins.is_empty());
    assert!(!all.is_nothing());

    let none = sql
        .compile(to_filter(&nobody, actions::GET, resources::COURSE).as_ref())
        .unwrap();
    assert!(none.is_nothing());
    assert!(none.params.is_empty());
}

#[test]
fn test_rule_set_survives_serialization() {
    let rules = resolve(&subject(2, &[Role::Teacher])).unwrap();
    let restored: RuleSet = serde_json::from_value(serde_json::to_value(&rules).unwrap()).unwrap();

    assert_eq!(visible_ids(&restored), vec![1, 3]);
}
