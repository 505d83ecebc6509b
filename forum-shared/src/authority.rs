//! Role authority: the single place that decides whether an actor's role
//! satisfies a required role. Stateless; every gated operation calls it.

use crate::errors::{AppError, AppResult, ErrorCode};
use crate::types::auth::UserRole;

/// True iff `actor` ranks at or above `required`.
pub fn authorize(actor: UserRole, required: UserRole) -> bool {
    actor.rank() >= required.rank()
}

/// `authorize` as a guard: `Forbidden` when the role is insufficient.
pub fn require(actor: UserRole, required: UserRole) -> AppResult<()> {
    if authorize(actor, required) {
        Ok(())
    } else {
        Err(AppError::new(
            ErrorCode::Forbidden,
            format!("{required} access required"),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;

    #[test]
    fn truth_table() {
        assert!(!authorize(UserRole::User, UserRole::Moderator));
        assert!(authorize(UserRole::Moderator, UserRole::Moderator));
        assert!(!authorize(UserRole::Moderator, UserRole::Admin));
        assert!(authorize(UserRole::Admin, UserRole::Admin));
        assert!(authorize(UserRole::Admin, UserRole::User));
    }

    #[test]
    fn require_reports_forbidden() {
        let err = require(UserRole::User, UserRole::Admin).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);
        assert!(require(UserRole::Admin, UserRole::Admin).is_ok());
    }
}
