// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! In-memory course catalog.
//!
//! Courses are kept in the shape the rule conditions address
//! (`teacher.user.id`, `enrollments.student.user.id`, `enrollments.status`),
//! so a course converts directly into the instance the rule engine checks.

use std::collections::BTreeMap;

use campus_core::filter::FilterTree;
use campus_core::UserId;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{ApiError, ApiResult, ValidationErrors};

// =============================================================================
// Course
// =============================================================================

/// Reference to a user record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRef {
    /// User ID.
    pub id: UserId,
}

/// Teacher of a course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Teacher {
    /// Teacher record ID.
    pub id: i64,
    /// Linked user.
    pub user: UserRef,
}

/// Student side of an enrollment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    /// Student record ID.
    pub id: i64,
    /// Linked user.
    pub user: UserRef,
}

/// Enrollment status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EnrollmentStatus {
    /// Attending.
    Active,
    /// Left the course.
    Dropped,
    /// Finished the course.
    Completed,
}

/// A student enrolled in a course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enrollment {
    /// Enrollment status.
    pub status: EnrollmentStatus,
    /// Enrolled student.
    pub student: Student,
}

/// A course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    /// Course ID.
    pub id: i64,
    /// Title.
    pub name: String,
    /// Free-text description.
    pub description: String,
    /// Teacher.
    pub teacher: Teacher,
    /// Enrollments.
    #[serde(default)]
    pub enrollments: Vec<Enrollment>,
}

impl Course {
    /// Returns the course as the JSON instance rules are evaluated on.
    pub fn to_instance(&self) -> ApiResult<Value> {
        serde_json::to_value(self).map_err(|e| ApiError::internal(format!("course {}: {}", self.id, e)))
    }
}

// =============================================================================
// CourseUpdate
// =============================================================================

/// Fields a PATCH may change.
pub const UPDATABLE_FIELDS: [&str; 2] = ["name", "description"];

/// A validated partial update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CourseUpdate {
    /// New title.
    pub name: Option<String>,
    /// New description.
    pub description: Option<String>,
}

impl CourseUpdate {
    /// Validates a JSON object against the updatable fields.
    ///
    /// Unknown fields, non-string values and an empty patch are rejected.
    pub fn from_patch(patch: &Map<String, Value>) -> ApiResult<Self> {
        let mut errors = ValidationErrors::new();
        let mut update = Self::default();

        if patch.is_empty() {
            errors.add("body", "at least one field is required");
        }

        for (field, value) in patch {
            let Some(text) = value.as_str() else {
                if UPDATABLE_FIELDS.contains(&field.as_str()) {
                    errors.add(field.as_str(), "must be a string");
                } else {
                    errors.add(field.as_str(), "unknown or read-only field");
                }
                continue;
            };
            match field.as_str() {
                "name" if text.trim().is_empty() => errors.add("name", "must not be empty"),
                "name" => update.name = Some(text.to_string()),
                "description" => update.description = Some(text.to_string()),
                other => errors.add(other, "unknown or read-only field"),
            }
        }

        errors.into_result(update)
    }

    /// Names of the fields this update touches.
    pub fn fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.name.is_some() {
            fields.push("name");
        }
        if self.description.is_some() {
            fields.push("description");
        }
        fields
    }

    fn apply(self, course: &mut Course) {
        if let Some(name) = self.name {
            course.name = name;
        }
        if let Some(description) = self.description {
            course.description = description;
        }
    }
}

// =============================================================================
// CourseCatalog
// =============================================================================

/// Thread-safe course storage.
#[derive(Debug, Default)]
pub struct CourseCatalog {
    courses: RwLock<BTreeMap<i64, Course>>,
}

impl CourseCatalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a catalog from courses.
    pub fn with_courses(courses: impl IntoIterator<Item = Course>) -> Self {
        Self {
            courses: RwLock::new(courses.into_iter().map(|c| (c.id, c)).collect()),
        }
    }

    /// Courses matching the demo identities.
    ///
    /// | id | teacher | enrollments |
    /// |----|---------|-------------|
    /// | 1 | user 2 | user 4 active |
    /// | 2 | user 3 | user 4 dropped |
    /// | 3 | user 2 | none |
    pub fn seed_demo() -> Self {
        let teacher = |id, user| Teacher {
            id,
            user: UserRef { id: UserId::new(user) },
        };
        let student1 = Student {
            id: 1,
            user: UserRef { id: UserId::new(4) },
        };

        Self::with_courses([
            Course {
                id: 1,
                name: "Algorithms".to_string(),
                description: "Sorting, searching and graphs".to_string(),
                teacher: teacher(1, 2),
                enrollments: vec![Enrollment {
                    status: EnrollmentStatus::Active,
                    student: student1.clone(),
                }],
            },
            Course {
                id: 2,
                name: "Databases".to_string(),
                description: "Relational modelling and SQL".to_string(),
                teacher: teacher(2, 3),
                enrollments: vec![Enrollment {
                    status: EnrollmentStatus::Dropped,
                    student: student1,
                }],
            },
            Course {
                id: 3,
                name: "Compilers".to_string(),
                description: "Parsing and code generation".to_string(),
                teacher: teacher(1, 2),
                enrollments: Vec::new(),
            },
        ])
    }

    /// Returns a course.
    pub fn get(&self, id: i64) -> Option<Course> {
        self.courses.read().get(&id).cloned()
    }

    /// Returns the courses a row filter admits, in id order.
    ///
    /// `None` admits every course.
    pub fn list(&self, filter: Option<&FilterTree>) -> ApiResult<Vec<Course>> {
        let courses = self.courses.read();
        let mut visible = Vec::new();
        for course in courses.values() {
            let admitted = match filter {
                None => true,
                Some(tree) => tree.matches(&course.to_instance()?),
            };
            if admitted {
                visible.push(course.clone());
            }
        }
        Ok(visible)
    }

    /// Applies an update, returning the new course.
    pub fn update(&self, id: i64, update: CourseUpdate) -> Option<Course> {
        let mut courses = self.courses.write();
        let course = courses.get_mut(&id)?;
        update.apply(course);
        Some(course.clone())
    }

    /// Number of courses.
    pub fn len(&self) -> usize {
        self.courses.read().len()
    }

    /// Returns `true` if the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.courses.read().is_empty()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_instance_shape() {
        let catalog = CourseCatalog::seed_demo();
        let instance = catalog.get(1).unwrap().to_instance().unwrap();

        assert_eq!(instance["teacher"]["user"]["id"], json!(2));
        assert_eq!(instance["enrollments"][0]["status"], json!("ACTIVE"));
        assert_eq!(instance["enrollments"][0]["student"]["user"]["id"], json!(4));
    }

    #[test]
    fn test_list_with_filter() {
        let catalog = CourseCatalog::seed_demo();
        assert_eq!(catalog.list(None).unwrap().len(), 3);

        let taught_by_2 = FilterTree::eq("teacher.user.id", json!(2));
        let ids: Vec<i64> = catalog
            .list(Some(&taught_by_2))
            .unwrap()
            .iter()
            .map(|c| c.id)
            .collect();
        assert_eq!(ids, vec![1, 3]);

        assert!(catalog.list(Some(&FilterTree::nothing())).unwrap().is_empty());
    }

    #[test]
    fn test_update_validation() {
        let patch = json!({ "description": "New" });
        let update = CourseUpdate::from_patch(patch.as_object().unwrap()).unwrap();
        assert_eq!(update.fields(), vec!["description"]);

        for bad in [json!({}), json!({ "id": 5 }), json!({ "name": "" }), json!({ "name": 1 })] {
            let err = CourseUpdate::from_patch(bad.as_object().unwrap()).unwrap_err();
            assert_eq!(err.error_code(), "VALIDATION_ERROR");
        }
    }

    #[test]
    fn test_update_applies() {
        let catalog = CourseCatalog::seed_demo();
        let update = CourseUpdate {
            description: Some("Revised".to_string()),
            ..Default::default()
        };

        let course = catalog.update(3, update.clone()).unwrap();
        assert_eq!(course.description, "Revised");
        assert_eq!(course.name, "Compilers");
        assert!(catalog.update(99, update).is_none());
    }
}
