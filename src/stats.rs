//! Small statistics helpers shared by the windowed aggregators

pub(crate) fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n - 1 denominator); zero below two samples
pub(crate) fn sample_std(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let variance =
        values.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}

/// Least-squares slope of `values` against `times`; zero when the time
/// spread is degenerate
pub(crate) fn linear_slope(times: &[f64], values: &[f64]) -> f64 {
    if times.len() < 2 {
        return 0.0;
    }
    let t_mean = mean(times);
    let v_mean = mean(values);

    let mut numerator = 0.0;
    let mut denominator = 0.0;
    for (t, v) in times.iter().zip(values.iter()) {
        numerator += (t - t_mean) * (v - v_mean);
        denominator += (t - t_mean) * (t - t_mean);
    }

    if denominator.abs() < f64::EPSILON {
        return 0.0;
    }
    numerator / denominator
}
