// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Course handlers.

use axum::{extract::State, Json};
use campus_core::ability::{actions, resources};
use campus_core::{AbilityError, SqlFilter};
use serde_json::{Map, Value};

use crate::catalog::{Course, CourseUpdate};
use crate::error::{ApiError, ApiResult};
use crate::extractors::{Auth, CourseId, ValidatedJson};
use crate::state::AppState;

/// Alias of the course table in compiled row filters.
const COURSE_ALIAS: &str = "course";

// =============================================================================
// List
// =============================================================================

/// GET /courses
///
/// Lists the courses the caller's rules admit.
pub async fn list_courses(
    State(state): State<AppState>,
    Auth(ctx): Auth,
) -> ApiResult<Json<Vec<Course>>> {
    let filter = ctx.row_filter(actions::GET, resources::COURSE);

    // A filter that does not compile to SQL is refused here too.
    let compiled = SqlFilter::new(COURSE_ALIAS).compile(filter.as_ref())?;
    tracing::debug!(
        user_id = %ctx.user_id,
        sql = %compiled.to_sql(),
        params = ?compiled.params,
        "Course row filter"
    );

    let courses = state.courses.list(filter.as_ref())?;
    Ok(Json(courses))
}

// =============================================================================
// Get
// =============================================================================

/// GET /courses/{id}
pub async fn get_course(
    State(state): State<AppState>,
    Auth(ctx): Auth,
    CourseId(id): CourseId,
) -> ApiResult<Json<Course>> {
    let course = state
        .courses
        .get(id)
        .ok_or_else(|| ApiError::not_found(resources::COURSE, id))?;

    if !ctx.can_on(actions::GET, resources::COURSE, &course.to_instance()?) {
        tracing::warn!(user_id = %ctx.user_id, course_id = id, "Course read denied");
        return Err(AbilityError::forbidden(actions::GET, resources::COURSE).into());
    }

    Ok(Json(course))
}

// =============================================================================
// Update
// =============================================================================

/// PATCH /courses/{id}
///
/// Every field in the patch must be permitted on this course, otherwise
/// nothing is changed.
pub async fn update_course(
    State(state): State<AppState>,
    Auth(ctx): Auth,
    CourseId(id): CourseId,
    ValidatedJson(patch): ValidatedJson<Map<String, Value>>,
) -> ApiResult<Json<Course>> {
    let course = state
        .courses
        .get(id)
        .ok_or_else(|| ApiError::not_found(resources::COURSE, id))?;

    let update = CourseUpdate::from_patch(&patch)?;
    ctx.authorize_fields(
        actions::UPDATE,
        resources::COURSE,
        &course.to_instance()?,
        update.fields(),
    )
    .inspect_err(|e| tracing::warn!(user_id = %ctx.user_id, course_id = id, error = %e, "Course update denied"))?;

    let updated = state
        .courses
        .update(id, update)
        .ok_or_else(|| ApiError::not_found(resources::COURSE, id))?;

    tracing::info!(user_id = %ctx.user_id, course_id = id, "Course updated");
    Ok(Json(updated))
}
