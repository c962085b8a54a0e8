//! Rate limiter and authority gate
//!
//! Token buckets are keyed per (caller, tool) with independent refill.
//! Exhausting a bucket yields an immediate REJECT upstream; callers are
//! never queued.

use std::collections::HashMap;
use std::time::Instant;
use tokio::sync::Mutex;

use crate::types::AuthorityTier;

/// Recognized authority-token prefix (anything else is GUEST)
const AUTHORIZED_PREFIX: &str = "arb0_";

struct Bucket {
    tokens: f64,
    last_refill: Instant,
}

/// Per-caller, per-tool token buckets
pub struct RateLimiter {
    buckets: Mutex<HashMap<(String, String), Bucket>>,
    capacity: f64,
    refill_per_sec: f64,
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("capacity", &self.capacity)
            .finish()
    }
}

impl RateLimiter {
    /// Bucket size and refill are both `per_minute`
    pub fn new(per_minute: u32) -> Self {
        Self {
            buckets: Mutex::new(HashMap::new()),
            capacity: per_minute as f64,
            refill_per_sec: per_minute as f64 / 60.0,
        }
    }

    /// Take one token; false means rate-limited
    pub async fn try_acquire(&self, caller: &str, tool: &str) -> bool {
        let mut buckets = self.buckets.lock().await;
        let now = Instant::now();
        let bucket = buckets
            .entry((caller.to_string(), tool.to_string()))
            .or_insert(Bucket {
                tokens: self.capacity,
                last_refill: now,
            });

        let elapsed = now.duration_since(bucket.last_refill).as_secs_f64();
        bucket.tokens = (bucket.tokens + elapsed * self.refill_per_sec).min(self.capacity);
        bucket.last_refill = now;

        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

/// Classify a caller's authority token.
///
/// - no token: GUEST (may open sessions, cannot write/propose)
/// - configured root token: SOVEREIGN (may propose, never auto-applied)
/// - recognized prefix: AUTHORIZED
/// - anything else: GUEST
pub fn classify_authority(token: Option<&str>, sovereign_token: Option<&str>) -> AuthorityTier {
    let token = match token {
        Some(t) if !t.is_empty() => t,
        _ => return AuthorityTier::Guest,
    };
    if let Some(root) = sovereign_token {
        if !root.is_empty() && token == root {
            return AuthorityTier::Sovereign;
        }
    }
    if token.len() > 8 && token.starts_with(AUTHORIZED_PREFIX) {
        AuthorityTier::Authorized
    } else {
        AuthorityTier::Guest
    }
}

// =============================================================================
// TESTS
// =============================================================================
