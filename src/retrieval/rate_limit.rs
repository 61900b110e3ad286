//! Token-bucket rate limiting for the retrieval surface.
//!
//! Two checks per request: an IP-wide bucket shared by all traffic from one
//! client address, and a tier bucket keyed by the caller's API token (or the
//! IP for anonymous callers). Buckets refill continuously at `rps` up to
//! `burst` capacity; a request spends `cost` tokens and is rejected with a
//! retry hint when the bucket runs dry.
//!
//! Buckets are process-local. Multi-replica deployments either accept
//! per-replica limits or front the service with a limiting proxy.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Instant;

use crate::error::{DaError, DaResult};

/// Access tier attached to an authenticated caller.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum Tier {
    #[default]
    Public,
    Test,
    Provider,
    Admin,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Public => "public",
            Tier::Test => "test",
            Tier::Provider => "provider",
            Tier::Admin => "admin",
        }
    }
}

/// Refill rate and capacity of one bucket class.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rate {
    /// Tokens per second.
    pub rps: f64,
    /// Maximum bucket capacity.
    pub burst: f64,
}

impl Rate {
    pub const fn new(rps: f64, burst: f64) -> Self {
        Self { rps, burst }
    }
}

#[derive(Debug)]
struct TokenBucket {
    tokens: f64,
    updated: Instant,
}

impl TokenBucket {
    fn new(rate: Rate, now: Instant) -> Self {
        Self {
            tokens: rate.burst,
            updated: now,
        }
    }

    /// Try to spend `cost` tokens; on failure return the wait in seconds.
    fn consume(&mut self, rate: Rate, cost: f64, now: Instant) -> Result<(), f64> {
        let dt = now.duration_since(self.updated).as_secs_f64();
        self.tokens = (self.tokens + rate.rps * dt).min(rate.burst);
        self.updated = now;
        if self.tokens >= cost {
            self.tokens -= cost;
            Ok(())
        } else {
            let deficit = cost - self.tokens;
            let retry = if rate.rps > 0.0 { deficit / rate.rps } else { 1.0 };
            Err(retry.max(0.01))
        }
    }
}

/// IP- and tier-scoped token buckets.
pub struct RateLimiter {
    ip_rate: Rate,
    tier_rates: HashMap<Tier, Rate>,
    buckets: Mutex<HashMap<String, TokenBucket>>,
}

impl Default for RateLimiter {
    fn default() -> Self {
        let mut tier_rates = HashMap::new();
        tier_rates.insert(Tier::Public, Rate::new(3.0, 10.0));
        tier_rates.insert(Tier::Test, Rate::new(5.0, 20.0));
        tier_rates.insert(Tier::Provider, Rate::new(20.0, 80.0));
        tier_rates.insert(Tier::Admin, Rate::new(50.0, 200.0));
        Self {
            ip_rate: Rate::new(5.0, 20.0),
            tier_rates,
            buckets: Mutex::new(HashMap::new()),
        }
    }
}

impl RateLimiter {
    pub fn new(ip_rate: Rate, tier_rates: HashMap<Tier, Rate>) -> Self {
        Self {
            ip_rate,
            tier_rates,
            buckets: Mutex::new(HashMap::new()),
        }
    }

    fn tier_rate(&self, tier: Tier) -> Rate {
        self.tier_rates
            .get(&tier)
            .or_else(|| self.tier_rates.get(&Tier::Public))
            .copied()
            .unwrap_or(Rate::new(3.0, 10.0))
    }

    fn consume(&self, key: String, rate: Rate, cost: f64, now: Instant) -> Result<(), f64> {
        let mut buckets = self.buckets.lock().expect("rate limiter lock");
        buckets
            .entry(key)
            .or_insert_with(|| TokenBucket::new(rate, now))
            .consume(rate, cost, now)
    }

    /// Check both the IP bucket and the tier bucket for one request.
    ///
    /// `token` keys the tier bucket when present; anonymous callers share
    /// the tier bucket keyed by their IP.
    pub fn check(&self, ip: &str, tier: Tier, token: Option<&str>, cost: f64) -> DaResult<()> {
        self.check_at(ip, tier, token, cost, Instant::now())
    }

    /// Deterministic variant used by tests.
    pub fn check_at(
        &self,
        ip: &str,
        tier: Tier,
        token: Option<&str>,
        cost: f64,
        now: Instant,
    ) -> DaResult<()> {
        if let Err(retry) = self.consume(format!("ip:{ip}"), self.ip_rate, cost, now) {
            return Err(DaError::Resource(format!(
                "ip rate limit exceeded; retry after {:.2}s",
                retry
            )));
        }
        let tier_key = match token {
            Some(t) => format!("{}:{t}", tier.as_str()),
            None => format!("{}:{ip}", tier.as_str()),
        };
        if let Err(retry) = self.consume(tier_key, self.tier_rate(tier), cost, now) {
            return Err(DaError::Resource(format!(
                "{} tier rate limit exceeded; retry after {:.2}s",
                tier.as_str(),
                retry
            )));
        }
        Ok(())
    }
}

/* --------------------------------- Tests ----------------------------------- */

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn limiter(ip_rps: f64, ip_burst: f64) -> RateLimiter {
        let mut tiers = HashMap::new();
        tiers.insert(Tier::Public, Rate::new(100.0, 100.0));
        RateLimiter::new(Rate::new(ip_rps, ip_burst), tiers)
    }

    #[test]
    fn burst_then_reject() {
        let rl = limiter(1.0, 3.0);
        let t0 = Instant::now();
        for _ in 0..3 {
            rl.check_at("1.2.3.4", Tier::Public, None, 1.0, t0).unwrap();
        }
        let err = rl.check_at("1.2.3.4", Tier::Public, None, 1.0, t0).unwrap_err();
        assert!(matches!(err, DaError::Resource(_)));
    }

    #[test]
    fn refill_over_time() {
        let rl = limiter(2.0, 2.0);
        let t0 = Instant::now();
        rl.check_at("a", Tier::Public, None, 2.0, t0).unwrap();
        assert!(rl.check_at("a", Tier::Public, None, 1.0, t0).is_err());
        // One second at 2 rps refills enough for cost 1.
        let t1 = t0 + Duration::from_secs(1);
        rl.check_at("a", Tier::Public, None, 1.0, t1).unwrap();
    }

    #[test]
    fn ips_are_isolated() {
        let rl = limiter(1.0, 1.0);
        let t0 = Instant::now();
        rl.check_at("a", Tier::Public, None, 1.0, t0).unwrap();
        rl.check_at("b", Tier::Public, None, 1.0, t0).unwrap();
        assert!(rl.check_at("a", Tier::Public, None, 1.0, t0).is_err());
    }

    #[test]
    fn tier_bucket_keys_on_token() {
        let mut tiers = HashMap::new();
        tiers.insert(Tier::Provider, Rate::new(1.0, 1.0));
        let rl = RateLimiter::new(Rate::new(100.0, 100.0), tiers);
        let t0 = Instant::now();
        rl.check_at("a", Tier::Provider, Some("tok1"), 1.0, t0).unwrap();
        // Same token is throttled, a different token is not.
        assert!(rl.check_at("a", Tier::Provider, Some("tok1"), 1.0, t0).is_err());
        rl.check_at("a", Tier::Provider, Some("tok2"), 1.0, t0).unwrap();
    }

    #[test]
    fn default_tiers_cover_all() {
        let rl = RateLimiter::default();
        let t0 = Instant::now();
        for tier in [Tier::Public, Tier::Test, Tier::Provider, Tier::Admin] {
            rl.check_at("z", tier, Some("tok"), 1.0, t0).unwrap();
        }
    }
}
