use crate::trading::indicator::{sma::sma, IndicatorBundle};
use crate::trading::signal::{TrendOutlook, TrendSignalKind, TrendState};
use crate::DailyBar;

/// L4: 趋势状态与趋势信号。
///
/// 状态由ADX14决定（<20为RANGE，否则按DI±方向），
/// 信号由 状态 x (金叉死叉 / RSI极值 / MACD柱方向) 的决策表给出，
/// 置信度在基准值上按ADX强度±0.1，截断到[0.3, 0.85]。
pub fn trend_outlook(bars: &[DailyBar], ind: &IndicatorBundle) -> TrendOutlook {
    let state = if ind.adx14 < 20.0 {
        TrendState::Range
    } else if ind.di_plus > ind.di_minus {
        TrendState::Uptrend
    } else {
        TrendState::Downtrend
    };

    let (golden_cross, death_cross) = detect_cross(bars, ind);
    let macd_up = ind.macd_histogram > 0.0;
    let macd_down = ind.macd_histogram < 0.0;
    let rsi = ind.rsi14;

    let (signal, base_confidence) = match state {
        TrendState::Range => {
            if rsi < 30.0 && macd_up {
                (TrendSignalKind::ReversalUp, 0.55)
            } else if rsi > 70.0 && macd_down {
                (TrendSignalKind::ReversalDown, 0.55)
            } else {
                (TrendSignalKind::Continue, 0.5)
            }
        }
        TrendState::Uptrend => {
            if death_cross || (rsi > 70.0 && macd_down) {
                (TrendSignalKind::ReversalDown, 0.6)
            } else if ind.adx14 > 25.0 && ind.macd_histogram > 0.0 {
                (TrendSignalKind::Continue, 0.7)
            } else {
                (TrendSignalKind::Continue, 0.55)
            }
        }
        TrendState::Downtrend => {
            if golden_cross || (rsi < 30.0 && macd_up) {
                (TrendSignalKind::ReversalUp, 0.6)
            } else if ind.adx14 > 25.0 && ind.macd_histogram < 0.0 {
                (TrendSignalKind::Continue, 0.7)
            } else {
                (TrendSignalKind::Continue, 0.55)
            }
        }
    };

    // ADX强度修正
    let adjusted: f64 = if ind.adx14 >= 30.0 {
        base_confidence + 0.1
    } else if ind.adx14 < 15.0 {
        base_confidence - 0.1
    } else {
        base_confidence
    };

    TrendOutlook {
        state,
        signal,
        adx: ind.adx14,
        confidence: adjusted.clamp(0.3, 0.85),
    }
}

/// 金叉/死叉: SMA20与SMA60的相对位置与前一根K线比较
fn detect_cross(bars: &[DailyBar], ind: &IndicatorBundle) -> (bool, bool) {
    if bars.len() < 2 {
        return (false, false);
    }
    let prev_closes: Vec<f64> = bars[..bars.len() - 1].iter().map(|b| b.c()).collect();
    let prev_sma20 = sma(&prev_closes, 20);
    let prev_sma60 = sma(&prev_closes, 60);
    let golden = ind.sma20 > ind.sma60 && prev_sma20 <= prev_sma60;
    let death = ind.sma20 < ind.sma60 && prev_sma20 >= prev_sma60;
    (golden, death)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trading::indicator::compute_indicators;

    fn bar(i: usize, base: f64, range: f64, close_off: f64) -> DailyBar {
        DailyBar::builder()
            .date(&format!("2025-{:02}-{:02}", i / 28 + 1, i % 28 + 1))
            .o(base)
            .h(base + range)
            .l(base - range)
            .c(base + close_off)
            .v(1000.0)
            .build()
            .unwrap()
    }

    #[test]
    fn test_uptrend_continue_with_strong_adx() {
        let bars: Vec<DailyBar> = (0..120)
            .map(|i| bar(i, 100.0 + i as f64 * 1.5, 1.0, 0.5))
            .collect();
        let ind = compute_indicators("TEST", &bars).unwrap();
        let outlook = trend_outlook(&bars, &ind);
        assert_eq!(outlook.state, TrendState::Uptrend);
        assert_eq!(outlook.signal, TrendSignalKind::Continue);
        assert!(outlook.confidence >= 0.7, "conf={}", outlook.confidence);
    }

    #[test]
    fn test_downtrend_state() {
        let bars: Vec<DailyBar> = (0..120)
            .map(|i| bar(i, 400.0 - i as f64 * 1.5, 1.0, -0.5))
            .collect();
        let ind = compute_indicators("TEST", &bars).unwrap();
        let outlook = trend_outlook(&bars, &ind);
        assert_eq!(outlook.state, TrendState::Downtrend);
    }

    #[test]
    fn test_range_state_low_adx() {
        // 窄幅横盘: ADX接近0
        let bars: Vec<DailyBar> = (0..120).map(|i| bar(i, 100.0, 1.0, 0.0)).collect();
        let ind = compute_indicators("TEST", &bars).unwrap();
        let outlook = trend_outlook(&bars, &ind);
        assert_eq!(outlook.state, TrendState::Range);
        assert_eq!(outlook.signal, TrendSignalKind::Continue);
    }

    #[test]
    fn test_confidence_bounds() {
        let bars: Vec<DailyBar> = (0..120)
            .map(|i| bar(i, 100.0 + (i as f64 * 0.4).sin() * 6.0, 1.5, 0.3))
            .collect();
        let ind = compute_indicators("TEST", &bars).unwrap();
        let outlook = trend_outlook(&bars, &ind);
        assert!((0.3..=0.85).contains(&outlook.confidence));
    }
}
