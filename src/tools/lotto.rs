//! A rolling lottery number picker.

use crate::error::{Error, Result};
use rand::Rng;
use std::future::Future;
use std::io::Write;
use std::ops::Range;
use std::time::Duration;
use tracing::warn;

/// Interval used when a negative one is requested.
pub const DEFAULT_INTERVAL_MS: u64 = 100;

/// Number of decimal digits of `n`; zero and negatives count as one.
#[must_use]
pub fn number_width(n: i64) -> usize {
    if n <= 0 {
        return 1;
    }
    let mut width = 0;
    let mut n = n;
    while n > 0 {
        width += 1;
        n /= 10;
    }
    width
}

/// Validates the draw range and interval.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] unless `0 <= start < end`.
pub fn draw_settings(start: i64, end: i64, interval_ms: i64) -> Result<(Range<i64>, Duration)> {
    if start >= end || start < 0 {
        return Err(Error::input(format!(
            "start number must be less than end number and must be greater or equal than zero, \
             but start = {start}, end = {end}"
        )));
    }
    let interval = match u64::try_from(interval_ms) {
        Ok(ms) => ms,
        Err(_) => {
            warn!(interval_ms, "Negative interval, using {DEFAULT_INTERVAL_MS}ms");
            DEFAULT_INTERVAL_MS
        }
    };
    Ok((start..end, Duration::from_millis(interval)))
}

/// Shows a new number from `range` every `interval` until `stop` resolves,
/// then reports and returns the last one.
///
/// # Errors
///
/// Returns an I/O error if `out` cannot be written.
pub async fn draw<W, R, F>(
    range: Range<i64>,
    interval: Duration,
    out: &mut W,
    rng: &mut R,
    stop: F,
) -> Result<i64>
where
    W: Write,
    R: Rng + ?Sized,
    F: Future,
{
    roll(range, interval, out, rng, stop)
        .await
        .map_err(Error::io("failed to write", "<stdout>"))
}

async fn roll<W, R, F>(
    range: Range<i64>,
    interval: Duration,
    out: &mut W,
    rng: &mut R,
    stop: F,
) -> std::io::Result<i64>
where
    W: Write,
    R: Rng + ?Sized,
    F: Future,
{
    tokio::pin!(stop);
    writeln!(out, "Press Enter to break.")?;

    loop {
        let n = rng.gen_range(range.clone());
        write!(out, "{n}")?;
        out.flush()?;

        tokio::select! {
            _ = &mut stop => {
                writeln!(out, "\nYou have chosen {n}")?;
                return Ok(n);
            }
            () = tokio::time::sleep(interval) => {
                write!(out, "\r{}\r", " ".repeat(number_width(n) + 1))?;
            }
        }
    }
}
