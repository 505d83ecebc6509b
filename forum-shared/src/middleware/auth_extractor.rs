use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

use crate::authority;
use crate::errors::{AppError, ErrorCode};
use crate::types::auth::{AuthUser, Claims, RoleLookup, TokenSecret, UserRole};

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: TokenSecret + RoleLookup + Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = extract_bearer_token(&parts.headers)?;
        let claims = validate_jwt(&token, state.jwt_secret())?;

        if claims.is_expired() {
            return Err(AppError::new(ErrorCode::TokenExpired, "token has expired"));
        }

        let role = state.current_role(claims.sub)?.ok_or_else(|| {
            AppError::new(ErrorCode::Unauthorized, "account does not exist or has no valid role")
        })?;
        if role != claims.role {
            tracing::debug!(user_id = claims.sub, token_role = %claims.role, %role, "role changed since token was issued");
        }

        Ok(AuthUser {
            role,
            ..AuthUser::from(claims)
        })
    }
}

fn extract_bearer_token(headers: &HeaderMap) -> Result<String, AppError> {
    let auth_header = headers
        .get("Authorization")
        .ok_or_else(|| AppError::new(ErrorCode::Unauthorized, "missing authorization header"))?
        .to_str()
        .map_err(|_| AppError::new(ErrorCode::Unauthorized, "invalid authorization header"))?;

    auth_header
        .strip_prefix("Bearer ")
        .map(str::to_string)
        .ok_or_else(|| AppError::new(ErrorCode::Unauthorized, "authorization header must use Bearer scheme"))
}

fn validate_jwt(token: &str, secret: &str) -> Result<Claims, AppError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
            AppError::new(ErrorCode::TokenExpired, "token has expired")
        }
        _ => AppError::new(ErrorCode::TokenInvalid, format!("invalid token: {e}")),
    })?;

    Ok(token_data.claims)
}

/// Mint an HS256 access token for `user_id`.
pub fn create_access_token(
    user_id: i64,
    role: UserRole,
    secret: &str,
    ttl_secs: i64,
) -> Result<String, AppError> {
    let claims = Claims::new(user_id, role, ttl_secs);
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::internal(format!("JWT encoding failed: {e}")))
}

/// Optional auth extractor
pub struct OptionalAuthUser(pub Option<AuthUser>);

#[axum::async_trait]
impl<S> FromRequestParts<S> for OptionalAuthUser
where
    S: TokenSecret + RoleLookup + Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match AuthUser::from_request_parts(parts, state).await {
            Ok(user) => Ok(Self(Some(user))),
            Err(_) => Ok(Self(None)),
        }
    }
}

/// Require Admin role
pub struct AdminUser(pub AuthUser);

#[axum::async_trait]
impl<S> FromRequestParts<S> for AdminUser
where
    S: TokenSecret + RoleLookup + Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        authority::require(user.role, UserRole::Admin)?;
        Ok(Self(user))
    }
}

/// Require Moderator or Admin role
pub struct ModeratorUser(pub AuthUser);

#[axum::async_trait]
impl<S> FromRequestParts<S> for ModeratorUser
where
    S: TokenSecret + RoleLookup + Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        authority::require(user.role, UserRole::Moderator)?;
        Ok(Self(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{AppResult, ErrorKind};
    use axum::http::Request;
    use std::collections::HashMap;

    const SECRET: &str = "test-secret";

    struct TestState {
        secret: String,
        roles: HashMap<i64, UserRole>,
    }

    impl TokenSecret for TestState {
        fn jwt_secret(&self) -> &str {
            &self.secret
        }
    }

    impl RoleLookup for TestState {
        fn current_role(&self, user_id: i64) -> AppResult<Option<UserRole>> {
            Ok(self.roles.get(&user_id).copied())
        }
    }

    fn state(secret: &str) -> TestState {
        TestState {
            secret: secret.to_string(),
            roles: HashMap::from([
                (3, UserRole::User),
                (4, UserRole::Moderator),
                (5, UserRole::Admin),
                (12, UserRole::Moderator),
            ]),
        }
    }

    fn parts_with(header: Option<String>) -> Parts {
        let mut builder = Request::builder().uri("/mod/pending");
        if let Some(value) = header {
            builder = builder.header("Authorization", value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    fn bearer(user_id: i64, role: UserRole) -> Option<String> {
        let token = create_access_token(user_id, role, SECRET, 300).unwrap();
        Some(format!("Bearer {token}"))
    }

    #[tokio::test]
    async fn valid_token_yields_user() {
        let mut parts = parts_with(bearer(12, UserRole::Moderator));
        let user = AuthUser::from_request_parts(&mut parts, &state(SECRET)).await.unwrap();
        assert_eq!(user.id, 12);
        assert_eq!(user.role, UserRole::Moderator);
    }

    #[tokio::test]
    async fn missing_header_is_unauthorized() {
        let mut parts = parts_with(None);
        let err = AuthUser::from_request_parts(&mut parts, &state(SECRET)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
    }

    #[tokio::test]
    async fn wrong_secret_is_rejected() {
        let mut parts = parts_with(bearer(5, UserRole::Admin));
        let err = AuthUser::from_request_parts(&mut parts, &state("other-secret")).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::TokenInvalid);
    }

    #[tokio::test]
    async fn stored_role_overrides_the_token() {
        let state = state(SECRET);

        // token minted while user 3 was an admin, since demoted
        let mut parts = parts_with(bearer(3, UserRole::Admin));
        let user = AuthUser::from_request_parts(&mut parts, &state).await.unwrap();
        assert_eq!(user.role, UserRole::User);

        let mut parts = parts_with(bearer(3, UserRole::Admin));
        let err = AdminUser::from_request_parts(&mut parts, &state).await.err().unwrap();
        assert_eq!(err.kind(), ErrorKind::Forbidden);

        // promoted after the token was issued
        let mut parts = parts_with(bearer(5, UserRole::User));
        assert!(AdminUser::from_request_parts(&mut parts, &state).await.is_ok());
    }

    #[tokio::test]
    async fn deleted_account_is_unauthorized() {
        let mut parts = parts_with(bearer(99, UserRole::Admin));
        let err = AuthUser::from_request_parts(&mut parts, &state(SECRET)).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::Unauthorized);
    }

    #[tokio::test]
    async fn optional_user_tolerates_anonymous() {
        let mut parts = parts_with(None);
        let OptionalAuthUser(user) =
            OptionalAuthUser::from_request_parts(&mut parts, &state(SECRET)).await.unwrap();
        assert!(user.is_none());
    }

    #[tokio::test]
    async fn role_gates_follow_the_authority() {
        let state = state(SECRET);

        let mut parts = parts_with(bearer(3, UserRole::User));
        let err = ModeratorUser::from_request_parts(&mut parts, &state).await.err().unwrap();
        assert_eq!(err.kind(), ErrorKind::Forbidden);

        let mut parts = parts_with(bearer(4, UserRole::Moderator));
        assert!(ModeratorUser::from_request_parts(&mut parts, &state).await.is_ok());

        let mut parts = parts_with(bearer(4, UserRole::Moderator));
        assert!(AdminUser::from_request_parts(&mut parts, &state).await.is_err());

        let mut parts = parts_with(bearer(5, UserRole::Admin));
        assert!(ModeratorUser::from_request_parts(&mut parts, &state).await.is_ok());
    }
}
