use std::env;
use std::time::Duration;

pub const LOCK_TIMEOUT_ENV: &str = "KINDER_LOCK_TIMEOUT_MS";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegistryConfig {
    /// How long an operation waits for its classifier's lock before failing.
    /// `None` waits indefinitely.
    pub lock_timeout: Option<Duration>,
}

impl RegistryConfig {
    /// Reads the configuration from the environment, falling back to the
    /// defaults for anything missing or unparsable.
    pub fn from_env() -> Self {
        let lock_timeout = match env::var(LOCK_TIMEOUT_ENV) {
            Ok(raw) => parse_timeout_ms(&raw).or_else(|| {
                log::warn!("Ignoring invalid {}={:?}, waiting indefinitely", LOCK_TIMEOUT_ENV, raw);
                None
            }),
            Err(_) => None,
        };
        Self { lock_timeout }
    }

    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = Some(timeout);
        self
    }
}

fn parse_timeout_ms(raw: &str) -> Option<Duration> {
    raw.trim()
        .parse::<u64>()
        .ok()
        .filter(|ms| *ms > 0)
        .map(Duration::from_millis)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_waits_forever() {
        assert_eq!(RegistryConfig::default().lock_timeout, None);
    }

    #[test]
    fn test_parse_timeout_ms() {
        assert_eq!(parse_timeout_ms("250"), Some(Duration::from_millis(250)));
        assert_eq!(parse_timeout_ms(" 10 "), Some(Duration::from_millis(10)));
        assert_eq!(parse_timeout_ms("0"), None);
        assert_eq!(parse_timeout_ms("soon"), None);
    }

    #[test]
    fn test_from_env() {
        env::set_var(LOCK_TIMEOUT_ENV, "1500");
        assert_eq!(
            RegistryConfig::from_env().lock_timeout,
            Some(Duration::from_millis(1500))
        );

        env::set_var(LOCK_TIMEOUT_ENV, "not-a-number");
        assert_eq!(RegistryConfig::from_env().lock_timeout, None);

        env::remove_var(LOCK_TIMEOUT_ENV);
        assert_eq!(RegistryConfig::from_env(), RegistryConfig::default());
    }
}
