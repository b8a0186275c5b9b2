use std::fmt;
use std::time::Duration;

use crate::error::ScrapeError;

pub const DEFAULT_WORKER_COUNT: usize = 5;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_RETRY_COUNT: u32 = 3;

/// Tunables for one scraping run. Immutable once the pool is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScraperConfig {
    /// Number of concurrent workers.
    pub worker_count: usize,
    /// Deadline for a single fetch attempt.
    pub timeout: Duration,
    /// Total attempts per URL while the server answers 503.
    pub retry_count: u32,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            worker_count: DEFAULT_WORKER_COUNT,
            timeout: DEFAULT_TIMEOUT,
            retry_count: DEFAULT_RETRY_COUNT,
        }
    }
}

impl ScraperConfig {
    pub fn with_worker_count(mut self, count: usize) -> Self {
        self.worker_count = count;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retry_count(mut self, count: u32) -> Self {
        self.retry_count = count;
        self
    }

    pub fn validate(&self) -> Result<(), ScrapeError> {
        if self.worker_count == 0 {
            return Err(ScrapeError::Config(
                "worker count must be at least 1".into(),
            ));
        }
        if self.retry_count == 0 {
            return Err(ScrapeError::Config("retry count must be at least 1".into()));
        }
        if self.timeout.is_zero() {
            return Err(ScrapeError::Config("timeout must be positive".into()));
        }
        Ok(())
    }
}

impl fmt::Display for ScraperConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{worker_count:{} timeout:{:?} retry_count:{}}}",
            self.worker_count, self.timeout, self.retry_count
        )
    }
}

/// Parse a Go-style duration such as `500ms`, `1.5s` or `1h2m30s`.
///
/// Units are `ns`, `us` (or `µs`), `ms`, `s`, `m` and `h`; each component
/// may carry a fraction. A bare integer is taken as seconds.
pub fn parse_duration(raw: &str) -> Result<Duration, ScrapeError> {
    let raw = raw.trim();
    let invalid = || ScrapeError::Config(format!("Invalid duration '{raw}'"));
    let overflow = || ScrapeError::Config(format!("Duration '{raw}' is out of range"));

    if raw.is_empty() {
        return Err(invalid());
    }
    if raw.bytes().all(|b| b.is_ascii_digit()) {
        let secs: u64 = raw.parse().map_err(|_| overflow())?;
        return Ok(Duration::from_secs(secs));
    }

    let mut rest = raw;
    let mut total: u128 = 0;
    while !rest.is_empty() {
        let number_len = rest
            .find(|c: char| !c.is_ascii_digit() && c != '.')
            .unwrap_or(rest.len());
        let (number, after) = rest.split_at(number_len);
        if number.is_empty() || number == "." || number.matches('.').count() > 1 {
            return Err(invalid());
        }

        let unit_len = after
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(after.len());
        let (unit, after) = after.split_at(unit_len);
        let scale = unit_nanos(unit).ok_or_else(|| {
            ScrapeError::Config(format!(
                "Invalid duration unit '{unit}' in '{raw}' (expected ns, us, ms, s, m or h)"
            ))
        })?;

        total = component_nanos(number, scale)
            .and_then(|nanos| total.checked_add(nanos))
            .ok_or_else(overflow)?;
        rest = after;
    }

    let nanos = u64::try_from(total).map_err(|_| overflow())?;
    Ok(Duration::from_nanos(nanos))
}

fn unit_nanos(unit: &str) -> Option<u128> {
    match unit {
        "ns" => Some(1),
        "us" | "\u{b5}s" | "\u{3bc}s" => Some(1_000),
        "ms" => Some(1_000_000),
        "s" => Some(1_000_000_000),
        "m" => Some(60 * 1_000_000_000),
        "h" => Some(3_600 * 1_000_000_000),
        _ => None,
    }
}

/// `number` is digits with at most one `.`; fraction digits below a
/// nanosecond are dropped.
fn component_nanos(number: &str, scale: u128) -> Option<u128> {
    let (whole, fraction) = number.split_once('.').unwrap_or((number, ""));
    let whole: u128 = if whole.is_empty() { 0 } else { whole.parse().ok()? };

    let mut nanos = whole.checked_mul(scale)?;
    let mut place = scale;
    for digit in fraction.bytes() {
        place /= 10;
        if place == 0 {
            break;
        }
        nanos = nanos.checked_add(u128::from(digit - b'0') * place)?;
    }
    Some(nanos)
}
