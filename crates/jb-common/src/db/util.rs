use std::sync::OnceLock;
use std::time::Instant;

use mysql_async::prelude::{FromValue, Queryable};
use mysql_async::{Conn, Params, Row, Value};
use tracing::warn;

/// Wrap positional parameter values; an empty list must be `Params::Empty`
/// or the driver rejects the statement.
pub fn positional(values: Vec<Value>) -> Params {
    if values.is_empty() {
        Params::Empty
    } else {
        Params::Positional(values)
    }
}

fn slow_query_threshold_ms() -> Option<u64> {
    static CACHE: OnceLock<Option<u64>> = OnceLock::new();

    *CACHE.get_or_init(|| {
        std::env::var("JB_DB_LOG_MIN_DURATION_MS")
            .ok()
            .and_then(|raw| raw.parse::<i64>().ok())
            .map(|v| v.max(0) as u64)
            .filter(|v| *v > 0)
    })
}

fn maybe_log_slow_query(label: &str, started_at: Instant) {
    if let Some(threshold_ms) = slow_query_threshold_ms() {
        let elapsed_ms = started_at.elapsed().as_millis() as u64;
        if elapsed_ms >= threshold_ms {
            warn!(query = label, elapsed_ms, "slow_query_detected");
        }
    }
}

pub async fn timed_query(
    conn: &mut Conn,
    sql: &str,
    params: Params,
    label: &str,
) -> Result<Vec<Row>, mysql_async::Error> {
    let started = Instant::now();
    let result = conn.exec(sql, params).await;
    maybe_log_slow_query(label, started);
    result
}

pub async fn timed_query_first(
    conn: &mut Conn,
    sql: &str,
    params: Params,
    label: &str,
) -> Result<Option<Row>, mysql_async::Error> {
    let started = Instant::now();
    let result = conn.exec_first(sql, params).await;
    maybe_log_slow_query(label, started);
    result
}

/// Read a named column off a row, reporting missing columns and failed
/// conversions as a message the caller maps into its own error type.
pub fn column<T>(row: &Row, name: &str) -> Result<T, String>
where
    T: FromValue,
{
    row.get_opt::<T, _>(name)
        .ok_or_else(|| format!("missing column: {name}"))?
        .map_err(|err| format!("failed to decode column {name}: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_parameter_lists_become_params_empty() {
        assert!(matches!(positional(Vec::new()), Params::Empty));
        assert!(matches!(
            positional(vec![Value::from(1_i64)]),
            Params::Positional(_)
        ));
    }
}
