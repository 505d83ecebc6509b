use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppResult;

/// Forum roles, totally ordered: `User < Moderator < Admin`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    User,
    Moderator,
    Admin,
}

impl UserRole {
    pub const ALL: [UserRole; 3] = [UserRole::User, UserRole::Moderator, UserRole::Admin];

    /// Permission level used for every authorization comparison.
    pub fn rank(&self) -> u8 {
        match self {
            UserRole::User => 1,
            UserRole::Moderator => 2,
            UserRole::Admin => 3,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::User => "user",
            UserRole::Moderator => "moderator",
            UserRole::Admin => "admin",
        }
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(UserRole::User),
            "moderator" => Ok(UserRole::Moderator),
            "admin" => Ok(UserRole::Admin),
            _ => Err(format!("unknown role: {s}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i64,
    pub role: UserRole,
    pub iat: i64,
    pub exp: i64,
    pub jti: Uuid,
}

impl Claims {
    pub fn new(user_id: i64, role: UserRole, duration_secs: i64) -> Self {
        let now = Utc::now().timestamp();
        Self {
            sub: user_id,
            role,
            iat: now,
            exp: now + duration_secs,
            jti: Uuid::now_v7(),
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() > self.exp
    }
}

/// The acting user: id from the token, role from storage.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: i64,
    pub role: UserRole,
    pub token_id: Uuid,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.sub,
            role: claims.role,
            token_id: claims.jti,
        }
    }
}

/// Application state that can verify bearer tokens.
pub trait TokenSecret {
    fn jwt_secret(&self) -> &str;
}

impl<T: TokenSecret + ?Sized> TokenSecret for Arc<T> {
    fn jwt_secret(&self) -> &str {
        (**self).jwt_secret()
    }
}

/// Current role of an account, read on every authenticated request so a role
/// change applies to tokens already issued. `None` when the account is gone.
pub trait RoleLookup {
    fn current_role(&self, user_id: i64) -> AppResult<Option<UserRole>>;
}

impl<T: RoleLookup + ?Sized> RoleLookup for Arc<T> {
    fn current_role(&self, user_id: i64) -> AppResult<Option<UserRole>> {
        (**self).current_role(user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roles_parse_only_canonical_names() {
        for role in UserRole::ALL {
            assert_eq!(role.as_str().parse::<UserRole>(), Ok(role));
        }
        assert!("Admin".parse::<UserRole>().is_err());
        assert!("superuser".parse::<UserRole>().is_err());
        assert!("".parse::<UserRole>().is_err());
    }

    #[test]
    fn ranks_follow_role_order() {
        assert!(UserRole::User.rank() < UserRole::Moderator.rank());
        assert!(UserRole::Moderator.rank() < UserRole::Admin.rank());
    }

    #[test]
    fn fresh_claims_are_not_expired() {
        let claims = Claims::new(7, UserRole::Moderator, 60);
        assert!(!claims.is_expired());
        assert_eq!(AuthUser::from(claims).id, 7);
    }
}
