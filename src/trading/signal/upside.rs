use crate::trading::indicator::IndicatorBundle;
use crate::trading::signal::{volatility_target_pct, FactorScores, ReachSignal, LOOKBACK_52W};
use crate::DailyBar;

/// L1: 在N个交易日内收盘到达 +X% 的概率。
///
/// 四因子加权得分(权重 动量0.25/趋势0.30/突破0.20/量能0.25)与历史基准率按 0.6/0.4 混合，
/// 最终概率截断到[0.1, 0.9]。该混合比例经回测校准，不可调整。
pub fn upside_reach(bars: &[DailyBar], ind: &IndicatorBundle, horizon_days: u32) -> ReachSignal {
    let last_close = bars.last().map(|b| b.c()).unwrap_or(0.0);
    let target_pct = volatility_target_pct(ind.atr20, last_close);

    let factors = FactorScores {
        momentum: momentum_factor(ind.rsi14),
        trend: trend_factor(last_close, ind.sma20, ind.sma60),
        breakout: breakout_factor(bars, last_close),
        volume: volume_factor(ind.volume_ratio20),
    };
    let score = factors.momentum * 0.25
        + factors.trend * 0.30
        + factors.breakout * 0.20
        + factors.volume * 0.25;

    let probability = match base_rate(bars, target_pct, horizon_days as usize) {
        Some(rate) => score * 0.6 + rate * 0.4,
        // 没有完整回看窗口时只用因子得分
        None => score,
    };

    ReachSignal {
        probability: probability.clamp(0.1, 0.9),
        target_pct,
        horizon_days,
        factors,
    }
}

/// 动量因子（RSI反转逻辑）: 超卖越深上行空间越大
fn momentum_factor(rsi: f64) -> f64 {
    if rsi < 30.0 {
        0.75
    } else if rsi < 50.0 {
        0.6
    } else if rsi < 70.0 {
        0.45
    } else {
        0.3
    }
}

/// 均线位置因子。SMA20在SMA60上方时+0.1，上限0.8
fn trend_factor(price: f64, sma20: f64, sma60: f64) -> f64 {
    let base: f64 = if price > sma20 && price > sma60 {
        0.7
    } else if price > sma60 {
        0.6
    } else if price > sma20 {
        0.5
    } else {
        0.35
    };
    if sma20 > sma60 {
        (base + 0.1).min(0.8)
    } else {
        base
    }
}

/// 突破因子：距52周高点越近越强
fn breakout_factor(bars: &[DailyBar], price: f64) -> f64 {
    let n = bars.len().min(LOOKBACK_52W);
    let high_52w = bars[bars.len() - n..]
        .iter()
        .map(|b| b.h())
        .fold(f64::MIN, f64::max);
    if high_52w <= 0.0 || price <= 0.0 {
        return 0.35;
    }
    let dist_pct = (high_52w - price) / high_52w * 100.0;
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

fn volume_factor(ratio: f64) -> f64 {
    if ratio > 1.5 {
        0.7
    } else if ratio > 1.0 {
        0.55
    } else {
        0.4
    }
}

/// 历史基准率：最近 min(120, 可用) 个重叠窗口中，N日内最高价实际到达 +X% 的比例。
/// 一个完整回看窗口都没有时返回None
fn base_rate(bars: &[DailyBar], target_pct: f64, horizon: usize) -> Option<f64> {
    if bars.len() <= horizon + 1 {
        return None;
    }
    // 只统计具有完整N日前瞻的起点
    let last_start = bars.len() - horizon - 1;
    let first_start = last_start.saturating_sub(119);
    let mut hits = 0usize;
    let mut total = 0usize;
    for start in first_start..=last_start {
        let entry = bars[start].c();
        if entry <= 0.0 {
            continue;
        }
        let target = entry * (1.0 + target_pct / 100.0);
        let window = &bars[start + 1..start + 1 + horizon];
        total += 1;
        if window.iter().any(|b| b.h() >= target) {
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

    fn uptrend_series(n: usize) -> Vec<DailyBar> {
        (0..n)
            .map(|i| {
                let base = 100.0 + i as f64 * 0.8;
                DailyBar::builder()
                    .date(&format!("2025-{:02}-{:02}", i / 28 + 1, i % 28 + 1))
                    .o(base)
                    .h(base + 1.5)
                    .l(base - 0.5)
                    .c(base + 1.0)
                    .v(2000.0)
                    .build()
                    .unwrap()
            })
            .collect()
    }

    #[test]
    fn test_upside_probability_clamped() {
        let bars = uptrend_series(200);
        let ind = compute_indicators("TEST", &bars).unwrap();
        for n in [60, 120] {
            let sig = upside_reach(&bars, &ind, n);
            assert!(
                (0.1..=0.9).contains(&sig.probability),
                "prob={}",
                sig.probability
            );
            assert!((5.0..=30.0).contains(&sig.target_pct));
        }
    }

    #[test]
    fn test_momentum_factor_tiers() {
        assert_eq!(momentum_factor(25.0), 0.75);
        assert_eq!(momentum_factor(45.0), 0.6);
        assert_eq!(momentum_factor(65.0), 0.45);
        assert_eq!(momentum_factor(80.0), 0.3);
    }

    #[test]
    fn test_trend_factor_bonus_capped() {
        // 价格在两条均线上方且金叉状态: 0.7+0.1=0.8
        assert_eq!(trend_factor(110.0, 105.0, 100.0), 0.8);
        // 价格在两条均线下方但SMA20>SMA60: 0.35+0.1
        assert!((trend_factor(90.0, 105.0, 100.0) - 0.45).abs() < 1e-9);
    }

    #[test]
    fn test_base_rate_none_when_no_window() {
        let bars = uptrend_series(61);
        // horizon=120 超过序列长度
        assert!(base_rate(&bars, 10.0, 120).is_none());
    }

    #[test]
    fn test_base_rate_uptrend_hits() {
        let bars = uptrend_series(200);
        // 持续上涨的序列，5%目标几乎每个窗口都能到达
        let rate = base_rate(&bars, 5.0, 60).unwrap();
        assert!(rate > 0.9, "rate={}", rate);
    }
}
