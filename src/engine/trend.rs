use serde::Serialize;

pub const DEFAULT_TREND_WINDOW: usize = 5;
pub const DEFAULT_TREND_SENSITIVITY: f64 = 0.03;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Rising,
    Falling,
    Stable,
}

impl Trend {
    pub fn as_str(self) -> &'static str {
        match self {
            Trend::Rising => "rising",
            Trend::Falling => "falling",
            Trend::Stable => "stable",
        }
    }
}

/// Least-squares slope of `values` against their index.
pub fn slope(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }

    let n = values.len() as f64;
    let x_mean = (n - 1.0) / 2.0;
    let y_mean = values.iter().sum::<f64>() / n;

    let mut ss_xy = 0.0;
    let mut ss_xx = 0.0;
    for (i, &y) in values.iter().enumerate() {
        let dx = i as f64 - x_mean;
        ss_xy += dx * (y - y_mean);
        ss_xx += dx * dx;
    }

    if ss_xx < 1e-10 {
        return None;
    }
    Some(ss_xy / ss_xx)
}

/// Direction of the trailing `window` values. Fewer than two points is stable.
pub fn classify(values: &[f64], window: usize, sensitivity: f64) -> Trend {
    let window = window.max(2);
    let start = values.len().saturating_sub(window);
    match slope(&values[start..]) {
        Some(s) if s > sensitivity => Trend::Rising,
        Some(s) if s < -sensitivity => Trend::Falling,
        _ => Trend::Stable,
    }
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}
