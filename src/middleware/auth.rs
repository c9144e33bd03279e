use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use sha2::{Digest, Sha256};

use crate::AppState;
use crate::api::error::AppError;
use crate::models::ModeratorClaims;

/// Gates moderation routes on the operator bearer token and inserts the
/// moderate capability claim. Authentication proper is the host's job;
/// this only delegates the capability decision.
pub async fn moderator_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth_header = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok());

    if let Some(auth_header) = auth_header {
        if let Some(token) = auth_header.strip_prefix("Bearer ") {
            if tokens_match(token, &state.config.moderator_token) {
                req.extensions_mut()
                    .insert(ModeratorClaims { can_moderate: true });
                return Ok(next.run(req).await);
            }
        }
    }

    Err(AppError::Unauthorized(
        "Moderator token required".to_string(),
    ))
}

/// Compares digests rather than the raw strings to avoid timing leaks.
fn tokens_match(candidate: &str, expected: &str) -> bool {
    Sha256::digest(candidate.as_bytes()) == Sha256::digest(expected.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens_match() {
        assert!(tokens_match("secret", "secret"));
        assert!(!tokens_match("secret", "other"));
        assert!(!tokens_match("", "secret"));
    }
}
