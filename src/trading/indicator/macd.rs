use crate::trading::indicator::ema::ema_series;

#[derive(Debug, Clone, Copy)]
pub struct MacdOutput {
    pub line: f64,
    pub signal: f64,
    pub histogram: f64,
}

/// MACD(12,26,9): line = EMA12 - EMA26, signal = line序列的9点EMA, histogram = line - signal
pub fn macd(closes: &[f64]) -> MacdOutput {
    macd_with(closes, 12, 26, 9)
}

pub fn macd_with(
    closes: &[f64],
    fast_period: usize,
    slow_period: usize,
    signal_period: usize,
) -> MacdOutput {
    let fast = ema_series(closes, fast_period);
    let slow = ema_series(closes, slow_period);
    let line_series: Vec<f64> = fast.iter().zip(slow.iter()).map(|(f, s)| f - s).collect();

    let line = line_series.last().copied().unwrap_or(0.0);
    let signal = ema_series(&line_series, signal_period)
        .last()
        .copied()
        .unwrap_or(0.0);

    MacdOutput {
        line,
        signal,
        histogram: line - signal,
    }
}
