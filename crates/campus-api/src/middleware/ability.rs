// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Route guard on the caller's rule set.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::{
    body::Body,
    http::Request,
    response::{IntoResponse, Response},
};
use campus_core::AbilityError;
use tower::{Layer, Service};

use crate::auth::{AuthContext, AuthError};
use crate::error::ApiError;

// =============================================================================
// AbilityLayer
// =============================================================================

/// Layer rejecting callers whose rules do not allow an action on a resource
/// type.
///
/// The check is type-level; handlers still check instances.
#[derive(Debug, Clone)]
pub struct AbilityLayer {
    action: Arc<str>,
    resource: Arc<str>,
}

impl AbilityLayer {
    /// Requires `action` on `resource`.
    pub fn require(action: &str, resource: &str) -> Self {
        Self {
            action: Arc::from(action),
            resource: Arc::from(resource),
        }
    }
}

impl<S> Layer<S> for AbilityLayer {
    type Service = AbilityMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AbilityMiddleware {
            inner,
            action: self.action.clone(),
            resource: self.resource.clone(),
        }
    }
}

// =============================================================================
// AbilityMiddleware
// =============================================================================

/// Middleware enforcing an [`AbilityLayer`] requirement.
#[derive(Debug, Clone)]
pub struct AbilityMiddleware<S> {
    inner: S,
    action: Arc<str>,
    resource: Arc<str>,
}

impl<S> Service<Request<Body>> for AbilityMiddleware<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let action = self.action.clone();
        let resource = self.resource.clone();
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(async move {
            let allowed = match req.extensions().get::<AuthContext>() {
                Some(ctx) if ctx.can(&action, &resource) => true,
                Some(ctx) => {
                    tracing::warn!(
                        user_id = %ctx.user_id,
                        action = %action,
                        resource = %resource,
                        roles = ?ctx.roles,
                        "Permission denied"
                    );
                    false
                }
                None => {
                    tracing::warn!("No auth context found, denying access");
                    return Ok(ApiError::from(AuthError::TokenNotProvided).into_response());
                }
            };

            if allowed {
                inner.call(req).await
            } else {
                let err = AbilityError::forbidden(action.as_ref(), resource.as_ref());
                Ok(ApiError::from(err).into_response())
            }
        })
    }
}

// =============================================================================
// Tests
// =============================================================================
