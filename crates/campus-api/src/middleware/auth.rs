// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Request gatekeeper.
//!
//! Every non-public request must carry an access token, either as
//! `Authorization: Bearer` or in the access token cookie. The token is
//! verified, checked against the revocation cache and turned into an
//! [`AuthContext`] stored in the request extensions.

use std::collections::HashSet;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::{
    body::Body,
    http::Request,
    response::{IntoResponse, Response},
};
use tower::{Layer, Service};

use crate::auth::{AuthContext, AuthError, AuthService};
use crate::cookies::TokenCookies;
use crate::error::ApiError;
use crate::extractors::bearer_token;

/// Paths served without a token.
pub const DEFAULT_PUBLIC_PATHS: [&str; 4] = ["/health", "/login", "/refresh-token", "/logout"];

// =============================================================================
// AuthLayer
// =============================================================================

/// Layer installing the gatekeeper.
#[derive(Clone)]
pub struct AuthLayer {
    auth: AuthService,
    cookies: Arc<TokenCookies>,
    public_paths: Arc<HashSet<String>>,
}

impl AuthLayer {
    /// Creates a new auth layer with no public paths.
    pub fn new(auth: AuthService, cookies: Arc<TokenCookies>) -> Self {
        Self {
            auth,
            cookies,
            public_paths: Arc::new(HashSet::new()),
        }
    }

    /// Replaces the public paths. A trailing `*` matches by prefix.
    pub fn with_public_paths<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.public_paths = Arc::new(paths.into_iter().map(Into::into).collect());
        self
    }

    /// Uses [`DEFAULT_PUBLIC_PATHS`].
    pub fn with_default_public_paths(self) -> Self {
        self.with_public_paths(DEFAULT_PUBLIC_PATHS)
    }
}

impl<S> Layer<S> for AuthLayer {
    type Service = AuthMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AuthMiddleware {
            inner,
            auth: self.auth.clone(),
            cookies: self.cookies.clone(),
            public_paths: self.public_paths.clone(),
        }
    }
}

// =============================================================================
// AuthMiddleware
// =============================================================================

/// Gatekeeper service.
#[derive(Clone)]
pub struct AuthMiddleware<S> {
    inner: S,
    auth: AuthService,
    cookies: Arc<TokenCookies>,
    public_paths: Arc<HashSet<String>>,
}

impl<S> AuthMiddleware<S> {
    fn is_public_path(&self, path: &str) -> bool {
        if self.public_paths.contains(path) {
            return true;
        }

        self.public_paths.iter().any(|public| {
            public
                .strip_suffix('*')
                .is_some_and(|prefix| path.starts_with(prefix))
        })
    }
}

impl<S> Service<Request<Body>> for AuthMiddleware<S>
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

    fn call(&mut self, mut req: Request<Body>) -> Self::Future {
        let is_public = self.is_public_path(req.uri().path());
        let auth = self.auth.clone();
        let cookies = self.cookies.clone();
        // Swap in the clone so the service that was polled ready handles the call.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(async move {
            if is_public {
                return inner.call(req).await;
            }

            let token = bearer_token(req.headers())
                .map(str::to_string)
                .or_else(|| cookies.access_token(req.headers()));

            let Some(token) = token else {
                tracing::debug!(path = %req.uri().path(), "No access token provided");
                return Ok(ApiError::from(AuthError::TokenNotProvided).into_response());
            };

            let ctx = match auth.verify_access_token(&token).await {
                Ok(claims) => AuthContext::from_claims(&claims).map_err(AuthError::from_access_token),
                Err(e) => Err(e),
            };

            match ctx {
                Ok(ctx) => {
                    tracing::debug!(
                        user_id = %ctx.user_id,
                        request_id = %ctx.request_id,
                        "Request authenticated"
                    );
                    req.extensions_mut().insert(ctx);
                    inner.call(req).await
                }
                Err(e) => {
                    tracing::debug!(error = %e, "Access token rejected");
                    Ok(ApiError::from(e).into_response())
                }
            }
        })
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{JwtConfig, ManualClock, MemoryStore, RevocationCache, RevocationConfig, TokenService};
    use crate::config::CookieConfig;
    use axum::http::{header, StatusCode};
    use campus_core::identity::CredentialHasher;
    use campus_core::MemoryIdentityStore;
    use std::convert::Infallible;
    use tower::ServiceExt;

    const PRIVATE_PEM: &str = include_str!("../../testdata/jwt_private.pem");
    const PUBLIC_PEM: &str = include_str!("../../testdata/jwt_public.pem");

    fn auth_service() -> AuthService {
        let hasher = CredentialHasher::with_cost(8, 1, 1).unwrap();
        let identities = Arc::new(MemoryIdentityStore::seed_demo(&hasher).unwrap());
        let clock = Arc::new(ManualClock::starting_now());
        let store = Arc::new(MemoryStore::new(clock.clone()));
        let revocations = RevocationCache::new(store, clock, RevocationConfig::default());
        let tokens = TokenService::new(JwtConfig::new(PRIVATE_PEM, PUBLIC_PEM)).unwrap();
        AuthService::new(identities, Arc::new(tokens), Arc::new(revocations))
    }

    fn layer(auth: AuthService) -> AuthLayer {
        AuthLayer::new(auth, Arc::new(TokenCookies::new(CookieConfig::default())))
            .with_default_public_paths()
    }

    /// Echoes the authenticated user id, or "anonymous".
    fn echo() -> impl Service<Request<Body>, Response = Response, Error = Infallible, Future = impl Future<Output = Result<Response, Infallible>> + Send> + Clone + Send {
        tower::service_fn(|req: Request<Body>| async move {
            let who = req
                .extensions()
                .get::<AuthContext>()
                .map(|ctx| ctx.user_id.to_string())
                .unwrap_or_else(|| "anonymous".to_string());
            Ok::<_, Infallible>(Response::new(Body::from(who)))
        })
    }

    async fn body(response: Response) -> String {
        use http_body_util::BodyExt;
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[test]
    fn test_public_paths() {
        let middleware = layer(auth_service())
            .with_public_paths(["/health", "/docs/*"])
            .layer(echo());

        assert!(middleware.is_public_path("/health"));
        assert!(middleware.is_public_path("/docs/openapi.json"));
        assert!(!middleware.is_public_path("/courses"));
    }

    #[tokio::test]
    async fn test_public_path_passes_without_token() {
        let service = layer(auth_service()).layer(echo());
        let req = Request::builder().uri("/health").body(Body::empty()).unwrap();

        let response = service.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body(response).await, "anonymous");
    }

    #[tokio::test]
    async fn test_missing_token_is_401() {
        let service = layer(auth_service()).layer(echo());
        let req = Request::builder().uri("/me").body(Body::empty()).unwrap();

        let response = service.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(body(response).await.contains("TOKEN_NOT_PROVIDED"));
    }

    #[tokio::test]
    async fn test_bearer_and_cookie_accepted() {
        let auth = auth_service();
        let pair = auth.login("teacher1@user.com", "teacher1").await.unwrap();

        let req = Request::builder()
            .uri("/me")
            .header(header::AUTHORIZATION, format!("Bearer {}", pair.access_token))
            .body(Body::empty())
            .unwrap();
        let response = layer(auth.clone()).layer(echo()).oneshot(req).await.unwrap();
        assert_eq!(body(response).await, "2");

        let req = Request::builder()
            .uri("/me")
            .header(header::COOKIE, format!("accessToken={}", pair.access_token))
            .body(Body::empty())
            .unwrap();
        let response = layer(auth).layer(echo()).oneshot(req).await.unwrap();
        assert_eq!(body(response).await, "2");
    }

    #[tokio::test]
    async fn test_revoked_and_refresh_tokens_rejected() {
        let auth = auth_service();
        let pair = auth.login("admin@user.com", "admin").await.unwrap();

        let req = Request::builder()
            .uri("/me")
            .header(header::AUTHORIZATION, format!("Bearer {}", pair.refresh_token))
            .body(Body::empty())
            .unwrap();
        let response = layer(auth.clone()).layer(echo()).oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        auth.logout(Some(&pair.access_token), None).await;
        let req = Request::builder()
            .uri("/me")
            .header(header::AUTHORIZATION, format!("Bearer {}", pair.access_token))
            .body(Body::empty())
            .unwrap();
        let response = layer(auth).layer(echo()).oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(body(response).await.contains("INVALID_ACCESS_TOKEN"));
    }
}
