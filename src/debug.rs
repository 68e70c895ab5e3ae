//! Dev helpers: tracing setup, anonymized ids for logs, and in-memory run
//! stats served on `/debug/stats` when `DEBUG_ROUTES=1`.

use std::{
    collections::VecDeque,
    sync::{Mutex, MutexGuard, PoisonError},
};

use axum::{routing::get, Json, Router};
use once_cell::sync::Lazy;
use serde::Serialize;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const LAT_CAP: usize = 200;
const DEFAULT_FILTER: &str = "potential_matrix=info,warn";

#[derive(Default, Clone, Serialize)]
pub struct Stats {
    pub total_runs: u64,
    pub schema_errors: u64,
    pub rolling_avg_ms: Option<f64>,
    pub last_respondent: Option<String>,
}

static STATS: Lazy<Mutex<Stats>> = Lazy::new(|| Mutex::new(Stats::default()));
static LAT_MS: Lazy<Mutex<VecDeque<f64>>> =
    Lazy::new(|| Mutex::new(VecDeque::with_capacity(LAT_CAP)));

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Install the global subscriber. `RUST_LOG` filters; `LOG_FORMAT=json`
/// switches to JSON lines. Logs go to stderr so stdout stays clean for
/// reports. Safe to call more than once.
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    let _ = if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
    } else {
        registry
            .with(fmt::layer().compact().with_writer(std::io::stderr))
            .try_init()
    };
}

/// Short, stable digest of an id; raw respondent ids never reach the logs.
pub fn anon_hash(text: &str) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let digest = hasher.finalize();
    let mut out = String::with_capacity(12);
    for b in digest.iter().take(6) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

pub fn record_run(respondent: Option<&str>, lat_ms: f64) {
    let avg = {
        let mut q = lock(&LAT_MS);
        if q.len() >= LAT_CAP {
            q.pop_front();
        }
        q.push_back(lat_ms);
        q.iter().sum::<f64>() / q.len() as f64
    };

    let mut s = lock(&STATS);
    s.total_runs += 1;
    s.rolling_avg_ms = Some(avg);
    s.last_respondent = respondent.map(anon_hash);
}

pub fn record_schema_error() {
    lock(&STATS).schema_errors += 1;
}

pub fn snapshot() -> Stats {
    lock(&STATS).clone()
}

pub fn router() -> Router {
    Router::new().route("/debug/stats", get(stats))
}

async fn stats() -> Json<Stats> {
    Json(snapshot())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anon_hash_is_short_and_stable() {
        let a = anon_hash("resp-42");
        assert_eq!(a.len(), 12);
        assert_eq!(a, anon_hash("resp-42"));
        assert_ne!(a, anon_hash("resp-43"));
    }

    #[test]
    fn record_run_updates_stats() {
        let before = snapshot().total_runs;
        record_run(Some("someone"), 4.0);
        let after = snapshot();
        assert!(after.total_runs > before);
        assert!(after.rolling_avg_ms.is_some());
    }
}
