/// 指数移动平均。用前period根的SMA初始化，之后 EMA_t = c*k + EMA_{t-1}*(1-k)，k = 2/(period+1)
pub fn ema(closes: &[f64], period: usize) -> f64 {
    match ema_series(closes, period).last() {
        Some(v) => *v,
        None => 0.0,
    }
}

/// EMA序列。不足period的前段用累计平均填充（MACD信号线需要整个序列）
pub fn ema_series(closes: &[f64], period: usize) -> Vec<f64> {
    let period = period.max(1);
    let mut out = Vec::with_capacity(closes.len());
    if closes.is_empty() {
        return out;
    }
    let k = 2.0 / (period as f64 + 1.0);
    let mut running_sum = 0.0;
    let mut prev = 0.0;
    for (i, c) in closes.iter().enumerate() {
        let value = if i < period {
            // SMA初始化区间
            running_sum += c;
            running_sum / (i + 1) as f64
        } else {
            c * k + prev * (1.0 - k)
        };
        out.push(value);
        prev = value;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ema_seeded_with_sma() {
        let closes = vec![1.0, 2.0, 3.0];
        // period=3: 前3根为SMA
        assert_eq!(ema(&closes, 3), 2.0);
    }

    #[test]
    fn test_ema_recursion() {
        let closes = vec![1.0, 2.0, 3.0, 4.0];
        // k = 2/4 = 0.5, seed = 2.0, ema = 4*0.5 + 2*0.5 = 3.0
        assert_eq!(ema(&closes, 3), 3.0);
    }

    #[test]
    fn test_ema_short_series() {
        let closes = vec![10.0, 20.0];
        assert_eq!(ema(&closes, 12), 15.0);
    }
}
