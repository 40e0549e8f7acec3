// Frame-time repair utilities
//
// Video timestamps arrive from a player that may report the same frame time
// for several consecutive captures (e.g. when capture outpaces video
// decoding). Downstream differentiation needs strictly increasing times, so
// duplicate runs are either spread by interpolation or collapsed.

use crate::error::TrackError;

/// Spread runs of duplicated times by linear interpolation toward the next
/// distinct value.
///
/// A run of k equal values followed by a larger value `next` becomes k
/// evenly spaced steps from the run's value toward `next`. A trailing run
/// has nothing to interpolate toward and is returned unchanged.
pub fn adjust_time_array(times: &[f64]) -> Vec<f64> {
    let mut adjusted = times.to_vec();
    let mut run_start = 0;
    for i in 1..=times.len() {
        if i < times.len() && times[i] == times[run_start] {
            continue;
        }
        if i < times.len() {
            let run_len = (i - run_start) as f64;
            let step = (times[i] - times[run_start]) / run_len;
            for (k, slot) in adjusted[run_start..i].iter_mut().enumerate() {
                *slot = times[run_start] + step * k as f64;
            }
        }
        run_start = i;
    }
    adjusted
}

/// Collapse runs of duplicated times, keeping the first item of each run.
///
/// Returns the surviving items and their now-unique times.
pub fn remove_duplicate_frame_times<T: Clone>(
    items: &[T],
    times: &[f64],
) -> Result<(Vec<T>, Vec<f64>), TrackError> {
    if items.len() != times.len() {
        return Err(TrackError::MismatchedLengths {
            expected: times.len(),
            actual: items.len(),
        });
    }

    let mut kept_items = Vec::with_capacity(items.len());
    let mut kept_times = Vec::with_capacity(times.len());
    for (i, (item, time)) in items.iter().zip(times.iter()).enumerate() {
        if i == 0 || *time != times[i - 1] {
            kept_items.push(item.clone());
            kept_times.push(*time);
        }
    }
    Ok((kept_items, kept_times))
}
