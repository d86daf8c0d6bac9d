use std::env;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitRule {
    pub per_second: u64,
    pub burst_size: u32,
}

impl RateLimitRule {
    const fn new(per_second: u64, burst_size: u32) -> Self {
        Self {
            per_second,
            burst_size,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RateLimitConfig {
    pub enabled: bool,
    pub auth: RateLimitRule,
    pub public_read: RateLimitRule,
    pub protected: RateLimitRule,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            auth: RateLimitRule::new(5, 10),
            public_read: RateLimitRule::new(30, 60),
            protected: RateLimitRule::new(10, 20),
        }
    }
}

impl RateLimitConfig {
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        cfg.enabled = env::var("RATE_LIMIT_ENABLED")
            .ok()
            .and_then(|v| match v.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "y" | "on" => Some(true),
                "0" | "false" | "no" | "n" | "off" => Some(false),
                _ => None,
            })
            .unwrap_or(cfg.enabled);

        if let Some(rule) = rule_from_env("RATE_LIMIT_AUTH") {
            cfg.auth = rule;
        }
        if let Some(rule) = rule_from_env("RATE_LIMIT_PUBLIC") {
            cfg.public_read = rule;
        }
        if let Some(rule) = rule_from_env("RATE_LIMIT_PROTECTED") {
            cfg.protected = rule;
        }

        cfg
    }
}

/// Parse "per_second:burst" from the named env var.
fn rule_from_env(var_name: &str) -> Option<RateLimitRule> {
    let raw = env::var(var_name).ok()?;
    match parse_rule(&raw) {
        Ok(rule) => Some(rule),
        Err(err) => {
            tracing::warn!("Invalid {} '{}': {}", var_name, raw, err);
            None
        }
    }
}

fn parse_rule(raw: &str) -> Result<RateLimitRule, String> {
    let (per_second_raw, burst_raw) = raw
        .trim()
        .split_once(':')
        .ok_or_else(|| format!("invalid rule '{}', expected per:burst", raw.trim()))?;

    let per_second: u64 = per_second_raw
        .trim()
        .parse()
        .map_err(|_| format!("invalid per_second '{}'", per_second_raw.trim()))?;
    let burst_size: u32 = burst_raw
        .trim()
        .parse()
        .map_err(|_| format!("invalid burst_size '{}'", burst_raw.trim()))?;

    if per_second == 0 || burst_size == 0 {
        return Err("per_second and burst_size must be > 0".to_string());
    }

    Ok(RateLimitRule::new(per_second, burst_size))
}
