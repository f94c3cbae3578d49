use crate::trading::indicator::IndicatorBundle;
use crate::trading::signal::{volatility_target_pct, FactorScores, ReachSignal, LOOKBACK_52W};
use crate::DailyBar;

/// L2: 在N个交易日内到达 -X% 的概率。L1的对称构造：
/// RSI超买为强、跌破均线为弱、接近52周低点替代突破、阴线放量替代量能确认。
pub fn downside_reach(bars: &[DailyBar], ind: &IndicatorBundle, horizon_days: u32) -> ReachSignal {
    let last = bars.last();
    let last_close = last.map(|b| b.c()).unwrap_or(0.0);
    let target_pct = volatility_target_pct(ind.atr20, last_close);

    let down_day = last.map(|b| b.c() < b.o()).unwrap_or(false);
    let factors = FactorScores {
        momentum: momentum_factor(ind.rsi14),
        trend: trend_factor(last_close, ind.sma20, ind.sma60),
        breakout: low_proximity_factor(bars, last_close),
        volume: volume_factor(ind.volume_ratio20, down_day),
    };
    let score = factors.momentum * 0.25
        + factors.trend * 0.30
        + factors.breakout * 0.20
        + factors.volume * 0.25;

    let probability = match base_rate(bars, target_pct, horizon_days as usize) {
        Some(rate) => score * 0.6 + rate * 0.4,
        None => score,
    };

    ReachSignal {
        probability: probability.clamp(0.1, 0.9),
        target_pct,
        horizon_days,
        factors,
    }
}

/// 超买越深下行风险越大
fn momentum_factor(rsi: f64) -> f64 {
    if rsi > 70.0 {
        0.75
    } else if rsi > 50.0 {
        0.6
    } else if rsi > 30.0 {
        0.45
    } else {
        0.3
    }
}

/// 均线位置（看跌方向）。SMA20在SMA60下方时+0.1，上限0.8
fn trend_factor(price: f64, sma20: f64, sma60: f64) -> f64 {
    let base: f64 = if price < sma20 && price < sma60 {
        0.7
    } else if price < sma60 {
        0.6
    } else if price < sma20 {
        0.5
    } else {
        0.35
    };
    if sma20 < sma60 {
        (base + 0.1).min(0.8)
    } else {
        base
    }
}

/// 距52周低点越近下行信号越强
fn low_proximity_factor(bars: &[DailyBar], price: f64) -> f64 {
    let n = bars.len().min(LOOKBACK_52W);
    let low_52w = bars[bars.len() - n..]
        .iter()
        .map(|b| b.l())
        .fold(f64::MAX, f64::min);
    if low_52w <= 0.0 || price <= 0.0 {
        return 0.35;
    }
    let dist_pct = (price - low_52w) / low_52w * 100.0;
    if dist_pct < 5.0 {
        0.7
    } else if dist_pct < 15.0 {
        0.55
    } else if dist_pct < 30.0 {
        0.45
    } else {
        0.35
    }
}

/// 阴线放量才算下行确认
fn volume_factor(ratio: f64, down_day: bool) -> f64 {
    if down_day && ratio > 1.5 {
        0.7
    } else if down_day && ratio > 1.0 {
        0.55
    } else {
        0.4
    }
}

/// 历史基准率：N日内最低价到达 -X% 的窗口比例
fn base_rate(bars: &[DailyBar], target_pct: f64, horizon: usize) -> Option<f64> {
    if bars.len() <= horizon + 1 {
        return None;
    }
    let last_start = bars.len() - horizon - 1;
    let first_start = last_start.saturating_sub(119);
    let mut hits = 0usize;
    let mut total = 0usize;
    for start in first_start..=last_start {
        let entry = bars[start].c();
        if entry <= 0.0 {
            continue;
        }
        let target = entry * (1.0 - target_pct / 100.0);
        let window = &bars[start + 1..start + 1 + horizon];
        total += 1;
        if window.iter().any(|b| b.l() <= target) {
            hits += 1;
        }
    }
    if total == 0 {
        return None;
    }
    Some(hits as f64 / total as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trading::indicator::compute_indicators;

    fn downtrend_series(n: usize) -> Vec<DailyBar> {
        (0..n)
            .map(|i| {
                let base = 300.0 - i as f64 * 0.8;
                DailyBar::builder()
                    .date(&format!("2025-{:02}-{:02}", i / 28 + 1, i % 28 + 1))
                    .o(base + 0.5)
                    .h(base + 1.5)
                    .l(base - 1.5)
                    .c(base - 1.0)
                    .v(2000.0)
                    .build()
                    .unwrap()
            })
            .collect()
    }

    #[test]
    fn test_downside_probability_clamped() {
        let bars = downtrend_series(200);
        let ind = compute_indicators("TEST", &bars).unwrap();
        for n in [60, 120] {
            let sig = downside_reach(&bars, &ind, n);
            assert!(
                (0.1..=0.9).contains(&sig.probability),
                "prob={}",
                sig.probability
            );
        }
    }

    #[test]
    fn test_downtrend_elevates_downside() {
        let bars = downtrend_series(200);
        let ind = compute_indicators("TEST", &bars).unwrap();
        let sig = downside_reach(&bars, &ind, 60);
        // 持续下跌 + 阴线: 概率应明显高于中性
        assert!(sig.probability > 0.55, "prob={}", sig.probability);
    }

    #[test]
    fn test_momentum_factor_mirrors_l1() {
        assert_eq!(momentum_factor(75.0), 0.75);
        assert_eq!(momentum_factor(60.0), 0.6);
        assert_eq!(momentum_factor(40.0), 0.45);
        assert_eq!(momentum_factor(25.0), 0.3);
    }
}
