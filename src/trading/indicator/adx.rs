use crate::DailyBar;

#[derive(Debug, Clone, Copy, Default)]
pub struct AdxOutput {
    pub adx: f64,
    pub di_plus: f64,
    pub di_minus: f64,
}

/// ADX(period) + DI±，完整的Wilder平滑。
///
/// 需要至少 2*period+1 根K线（前period根做初始平滑，再period个DX做ADX种子）。
/// 不足时返回全0（RANGE判定的中性值）。方向和为0时DX=0。
pub fn adx(bars: &[DailyBar], period: usize) -> AdxOutput {
    let period = period.max(1);
    if bars.len() < 2 * period + 1 {
        return AdxOutput::default();
    }
    let period_f = period as f64;

    let n = bars.len();
    let bar_count = n - 1;
    let mut plus_dm = Vec::with_capacity(bar_count);
    let mut minus_dm = Vec::with_capacity(bar_count);
    let mut tr_vals = Vec::with_capacity(bar_count);

    for i in 1..n {
        let high = bars[i].h();
        let low = bars[i].l();
        let prev_high = bars[i - 1].h();
        let prev_low = bars[i - 1].l();
        let prev_close = bars[i - 1].c();

        let tr = (high - low)
            .max((high - prev_close).abs())
            .max((low - prev_close).abs());

        let up_move = high - prev_high;
        let down_move = prev_low - low;
        let pdm = if up_move > down_move && up_move > 0.0 {
            up_move
        } else {
            0.0
        };
        let mdm = if down_move > up_move && down_move > 0.0 {
            down_move
        } else {
            0.0
        };

        plus_dm.push(pdm);
        minus_dm.push(mdm);
        tr_vals.push(tr);
    }

    // Wilder平滑：先累加前period个
    let mut smooth_plus: f64 = plus_dm[..period].iter().sum();
    let mut smooth_minus: f64 = minus_dm[..period].iter().sum();
    let mut smooth_tr: f64 = tr_vals[..period].iter().sum();

    let mut dx_values = Vec::with_capacity(bar_count - period + 1);
    let (mut di_plus, mut di_minus);
    {
        let (dp, dm, dx) = di_dx(smooth_plus, smooth_minus, smooth_tr);
        di_plus = dp;
        di_minus = dm;
        dx_values.push(dx);
    }

    for i in period..bar_count {
        smooth_plus = smooth_plus - smooth_plus / period_f + plus_dm[i];
        smooth_minus = smooth_minus - smooth_minus / period_f + minus_dm[i];
        smooth_tr = smooth_tr - smooth_tr / period_f + tr_vals[i];
        let (dp, dm, dx) = di_dx(smooth_plus, smooth_minus, smooth_tr);
        di_plus = dp;
        di_minus = dm;
        dx_values.push(dx);
    }

    // ADX: DX的Wilder平滑，前period个的SMA做种子
    let mut adx_val = dx_values[..period].iter().sum::<f64>() / period_f;
    for &dx in &dx_values[period..] {
        adx_val = (adx_val * (period_f - 1.0) + dx) / period_f;
    }

    AdxOutput {
        adx: adx_val,
        di_plus,
        di_minus,
    }
}

fn di_dx(smooth_plus: f64, smooth_minus: f64, smooth_tr: f64) -> (f64, f64, f64) {
    if smooth_tr == 0.0 {
        return (0.0, 0.0, 0.0);
    }
    let di_plus = smooth_plus / smooth_tr * 100.0;
    let di_minus = smooth_minus / smooth_tr * 100.0;
    let di_sum = di_plus + di_minus;
    // 方向和为0时DX=0
    let dx = if di_sum == 0.0 {
        0.0
    } else {
        (di_plus - di_minus).abs() / di_sum * 100.0
    };
    (di_plus, di_minus, dx)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(i: usize, o: f64, h: f64, l: f64, c: f64) -> DailyBar {
        DailyBar::builder()
            .date(&format!("2026-01-{:02}", (i % 28) + 1))
            .o(o)
            .h(h)
            .l(l)
            .c(c)
            .v(1000.0)
            .build()
            .unwrap()
    }

    #[test]
    fn test_adx_insufficient_bars() {
        let bars: Vec<DailyBar> = (0..10).map(|i| bar(i, 100.0, 101.0, 99.0, 100.0)).collect();
        let out = adx(&bars, 14);
        assert_eq!(out.adx, 0.0);
    }

    #[test]
    fn test_adx_strong_uptrend() {
        let bars: Vec<DailyBar> = (0..60)
            .map(|i| {
                let base = 100.0 + i as f64 * 2.0;
                bar(i, base, base + 1.5, base - 0.5, base + 1.0)
            })
            .collect();
        let out = adx(&bars, 14);
        assert!(out.adx > 25.0, "adx={}", out.adx);
        assert!(out.di_plus > out.di_minus);
    }

    #[test]
    fn test_adx_flat_market_zero() {
        let bars: Vec<DailyBar> = (0..60).map(|i| bar(i, 100.0, 101.0, 99.0, 100.0)).collect();
        let out = adx(&bars, 14);
        assert!(out.adx < 1.0, "adx={}", out.adx);
    }

    #[test]
    fn test_adx_bounded() {
        let bars: Vec<DailyBar> = (0..100)
            .map(|i| {
                let base = 50.0 + (i as f64 * 0.3).sin() * 10.0;
                bar(i, base, base + 1.0, base - 1.0, base + 0.5)
            })
            .collect();
        let out = adx(&bars, 14);
        assert!((0.0..=100.0).contains(&out.adx));
    }
}
