//! Bourdet pressure derivative and smoothing.
//!
//! The well-test derivative is `dP/d(ln t)`. Differentiating noisy or
//! tightly spaced samples point-to-point amplifies noise, so each point is
//! differenced against the nearest neighbours at least `L` away in `ln t`
//! (the "L-spacing") and the left/right slopes are blended with weights
//! proportional to the opposite span.

/// L-spacing applied to model curves in dimensionless time.
pub const MODEL_DERIVATIVE_SPACING: f64 = 0.1;

/// L-spacing applied to observed data in hours.
pub const OBSERVED_DERIVATIVE_SPACING: f64 = 0.15;

/// Times at or below this carry no derivative.
const MIN_DERIVATIVE_TIME: f64 = 1e-12;

/// Bourdet derivative of `pressure` with respect to `ln(time)`.
///
/// Times are expected in ascending order. The output has
/// `min(time.len(), pressure.len())` entries; with fewer than three points
/// all of them are 0. Points at times `≤ 1e-12` and non-finite results are
/// reported as 0.
///
/// # Arguments
///
/// * `time` - Sample times, ascending
/// * `pressure` - Pressure (or pressure difference) at each time
/// * `spacing` - Minimum distance in `ln t` to the neighbours used
///
/// # Examples
///
/// ```
/// use shale_welltest::inversion::bourdet_derivative;
///
/// // P = 2 ln t + 1 has a flat derivative of 2
/// let t: Vec<f64> = (0..20).map(|i| 10f64.powf(-1.0 + 0.2 * i as f64)).collect();
/// let p: Vec<f64> = t.iter().map(|t| 2.0 * t.ln() + 1.0).collect();
/// let d = bourdet_derivative(&t, &p, 0.1);
/// assert!(d.iter().all(|v| (v - 2.0).abs() < 1e-10));
/// ```
pub fn bourdet_derivative(time: &[f64], pressure: &[f64], spacing: f64) -> Vec<f64> {
    let n = time.len().min(pressure.len());
    let mut derivative = vec![0.0; n];
    if n < 3 {
        return derivative;
    }

    let log_time: Vec<Option<f64>> = time[..n]
        .iter()
        .map(|&t| (t > MIN_DERIVATIVE_TIME).then(|| t.ln()))
        .collect();

    for i in 0..n {
        let Some(xi) = log_time[i] else {
            continue;
        };

        let left = neighbour(&log_time, (0..i).rev(), xi, spacing);
        let right = neighbour(&log_time, i + 1..n, xi, spacing);

        let value = match (left, right) {
            (Some(j), Some(k)) => {
                let dx1 = xi - log_time_at(&log_time, j);
                let dx2 = log_time_at(&log_time, k) - xi;
                let slope1 = (pressure[i] - pressure[j]) / dx1;
                let slope2 = (pressure[k] - pressure[i]) / dx2;
                (slope1 * dx2 + slope2 * dx1) / (dx1 + dx2)
            }
            (None, Some(k)) => (pressure[k] - pressure[i]) / (log_time_at(&log_time, k) - xi),
            (Some(j), None) => (pressure[i] - pressure[j]) / (xi - log_time_at(&log_time, j)),
            (None, None) => 0.0,
        };

        derivative[i] = if value.is_finite() { value } else { 0.0 };
    }

    derivative
}

/// First index in `candidates` whose log-time is at least `spacing` from
/// `xi`, falling back to the last valid index visited.
fn neighbour<I>(log_time: &[Option<f64>], candidates: I, xi: f64, spacing: f64) -> Option<usize>
where
    I: Iterator<Item = usize>,
{
    let mut fallback = None;
    for idx in candidates {
        if let Some(x) = log_time[idx] {
            fallback = Some(idx);
            if (x - xi).abs() >= spacing {
                return Some(idx);
            }
        }
    }
    fallback
}

fn log_time_at(log_time: &[Option<f64>], idx: usize) -> f64 {
    log_time[idx].unwrap_or(f64::NAN)
}

/// Centred moving average with a window of `span` points.
///
/// The window is truncated at both ends of the series. A span of 0 or 1
/// returns the input unchanged.
///
/// # Examples
///
/// ```
/// use shale_welltest::inversion::smooth;
///
/// assert_eq!(smooth(&[1.0, 4.0, 1.0], 3), vec![2.5, 2.0, 2.5]);
/// ```
pub fn smooth(data: &[f64], span: usize) -> Vec<f64> {
    if span <= 1 || data.len() < 2 {
        return data.to_vec();
    }

    let half = span / 2;
    (0..data.len())
        .map(|i| {
            let lo = i.saturating_sub(half);
            let hi = (i + half).min(data.len() - 1);
            let window = &data[lo..=hi];
            window.iter().sum::<f64>() / window.len() as f64
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn log_grid(count: usize) -> Vec<f64> {
        (0..count)
            .map(|i| 10f64.powf(-2.0 + 0.1 * i as f64))
            .collect()
    }

    #[test]
    fn test_semilog_straight_line() {
        let t = log_grid(40);
        let p: Vec<f64> = t.iter().map(|t| 0.5 * t.ln() + 3.0).collect();
        for value in bourdet_derivative(&t, &p, OBSERVED_DERIVATIVE_SPACING) {
            assert_relative_eq!(value, 0.5, epsilon = 1e-10);
        }
    }

    #[test]
    fn test_unit_slope() {
        // P = t on a log grid: dP/dln t = t, Bourdet slightly overestimates
        let t = log_grid(40);
        let d = bourdet_derivative(&t, &t, MODEL_DERIVATIVE_SPACING);
        for (ti, di) in t.iter().zip(d.iter()).skip(1).take(38) {
            assert_relative_eq!(*di, *ti, max_relative = 0.1);
        }
    }

    #[test]
    fn test_short_series_is_zero() {
        assert!(bourdet_derivative(&[], &[], 0.1).is_empty());
        assert_eq!(
            bourdet_derivative(&[1.0, 2.0], &[1.0, 2.0], 0.1),
            vec![0.0, 0.0]
        );
    }

    #[test]
    fn test_tiny_times_and_length_mismatch() {
        let t = [0.0, 1e-13, 0.1, 1.0, 10.0, 100.0];
        let p = [0.0, 0.0, 1.0, 2.0, 3.0];
        let d = bourdet_derivative(&t, &p, 0.1);
        assert_eq!(d.len(), 5);
        assert_eq!(d[0], 0.0);
        assert_eq!(d[1], 0.0);
        let slope = 1.0 / 10f64.ln();
        for value in &d[2..] {
            assert_relative_eq!(*value, slope, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_duplicate_times_do_not_produce_nan() {
        let t = [1.0, 1.0, 1.0];
        let p = [1.0, 2.0, 3.0];
        assert!(bourdet_derivative(&t, &p, 0.1)
            .iter()
            .all(|v| v.is_finite()));
    }

    #[test]
    fn test_smoothing() {
        let data = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(smooth(&data, 1), data.to_vec());
        assert_eq!(smooth(&data, 3), vec![1.5, 2.0, 3.0, 4.0, 4.5]);

        // a constant survives any window
        let flat = vec![7.0; 9];
        assert_eq!(smooth(&flat, 5), flat);
    }
}
