use sha2::{Digest, Sha256};

/// Nonce window length in seconds. A token stays valid for the current
/// window and the one before it, so between 12 and 24 hours.
const WINDOW_SECS: u64 = 43_200;

fn digest(secret: &str, review_id: &str, window: u64) -> String {
    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());
    hasher.update(b"|");
    hasher.update(review_id.as_bytes());
    hasher.update(b"|");
    hasher.update(window.to_be_bytes());
    let out = hex::encode(hasher.finalize());
    out[..20].to_string()
}

/// Issues a nonce bound to one review id at the given unix time.
pub fn issue(secret: &str, review_id: &str, now_unix: u64) -> String {
    let window = now_unix / WINDOW_SECS;
    format!("{}-{}", window, digest(secret, review_id, window))
}

/// Verifies a nonce against the current and previous window.
pub fn verify(secret: &str, review_id: &str, token: &str, now_unix: u64) -> bool {
    let Some((window_part, digest_part)) = token.split_once('-') else {
        return false;
    };
    let Ok(window) = window_part.parse::<u64>() else {
        return false;
    };

    // The window value comes from the client; checked arithmetic keeps a
    // forged huge value from overflowing. Valid windows are the current one
    // and the one before it.
    let current = now_unix / WINDOW_SECS;
    if !current.checked_sub(window).is_some_and(|age| age <= 1) {
        return false;
    }

    // Constant-time-ish comparison: compare digests of the digests.
    let expected = digest(secret, review_id, window);
    Sha256::digest(expected.as_bytes()) == Sha256::digest(digest_part.as_bytes())
}

pub fn now_unix() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";

    #[test]
    fn test_nonce_round_trip() {
        let now = 1_700_000_000;
        let token = issue(SECRET, "review-1", now);
        assert!(verify(SECRET, "review-1", &token, now));
        // Still valid later inside the grace window
        assert!(verify(SECRET, "review-1", &token, now + WINDOW_SECS));
    }

    #[test]
    fn test_nonce_bound_to_review() {
        let now = 1_700_000_000;
        let token = issue(SECRET, "review-1", now);
        assert!(!verify(SECRET, "review-2", &token, now));
        assert!(!verify("other-secret", "review-1", &token, now));
    }

    #[test]
    fn test_nonce_expires() {
        let now = 1_700_000_000;
        let token = issue(SECRET, "review-1", now);
        assert!(!verify(SECRET, "review-1", &token, now + 2 * WINDOW_SECS));
    }

    #[test]
    fn test_nonce_rejects_future_and_overflowing_windows() {
        let now = 1_700_000_000;

        // A forged window of u64::MAX must be rejected, not overflow.
        let forged = format!("{}-{}", u64::MAX, digest(SECRET, "review-1", u64::MAX));
        assert!(!verify(SECRET, "review-1", &forged, now));

        // A window ahead of the clock is not valid either.
        let future = issue(SECRET, "review-1", now + 2 * WINDOW_SECS);
        assert!(!verify(SECRET, "review-1", &future, now));
    }

    #[test]
    fn test_nonce_rejects_garbage() {
        assert!(!verify(SECRET, "review-1", "", 1_700_000_000));
        assert!(!verify(SECRET, "review-1", "not-a-nonce", 1_700_000_000));
        assert!(!verify(SECRET, "review-1", "12345", 1_700_000_000));
    }
}
