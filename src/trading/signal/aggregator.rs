use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::time_util;
use crate::trading::indicator::{compute_indicators, IndicatorBundle};
use crate::trading::model::event::EventEntity;
use crate::trading::signal::{
    downside::downside_reach, risk_adjusted::risk_adjusted, trend::trend_outlook,
    upside::upside_reach, Action, ReachSignal, RiskSignal, TrendOutlook, TrendSignalKind,
    TrendState, HORIZONS,
};
use crate::DailyBar;

/// 可调阈值，存放在kv的 config:thresholds，JSON覆盖默认值
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ThresholdsConfig {
    pub l1_min_probability: f64,
    pub l2_min_probability: f64,
    pub l3_min_sharpe: f64,
    pub cooldown_hours: u32,
    pub hysteresis_buffer: f64,
    pub max_notify_per_day: u32,
}

impl Default for ThresholdsConfig {
    fn default() -> Self {
        Self {
            l1_min_probability: 0.60,
            l2_min_probability: 0.60,
            l3_min_sharpe: 0.50,
            cooldown_hours: 24,
            hysteresis_buffer: 0.05,
            max_notify_per_day: 50,
        }
    }
}

/// 聚合后的最终判断
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Decision {
    pub symbol_id: String,
    pub name: String,
    pub action: Action,
    pub confidence: f64,
    /// 报告的预测窗口取L1的（L2可能选了不同的N，这是既有行为，见DESIGN.md）
    pub horizon_days: u32,
    pub reasons: Vec<String>,
    pub warnings: Vec<String>,
    pub l1: ReachSignal,
    pub l2: ReachSignal,
    pub l3: RiskSignal,
    pub l4: TrendOutlook,
    pub decided_at: i64,
}

const MAX_REASONS: usize = 5;
const MAX_WARNINGS: usize = 3;

/// 把L1-L4、事件日历和持仓状态汇总成一个Decision。
///
/// 多空各自计分: 买方=[L1概率达标, L3有优势, L4向上]，卖方=[L2概率达标, L3夏普<-0.3, L4向下]。
/// 2分以上且对侧不足2分才给出BUY/SELL，双方都达标时降级WATCH并提示冲突。
pub fn decide(
    symbol_id: &str,
    name: &str,
    bars: &[DailyBar],
    thresholds: &ThresholdsConfig,
    events: &[EventEntity],
    is_holding: bool,
) -> Result<Decision, AppError> {
    let ind = compute_indicators(symbol_id, bars)?;
    let closes: Vec<f64> = bars.iter().map(|b| b.c()).collect();

    // 两个窗口各算一遍，按边独立取最优
    let mut best_l1: Option<ReachSignal> = None;
    let mut best_l2: Option<ReachSignal> = None;
    let mut best_l3: Option<RiskSignal> = None;
    for n in HORIZONS {
        let l1 = upside_reach(bars, &ind, n);
        let l2 = downside_reach(bars, &ind, n);
        let l3 = risk_adjusted(&closes, &l1, &l2, n);
        if best_l1.as_ref().map_or(true, |b| l1.probability > b.probability) {
            best_l1 = Some(l1);
        }
        if best_l2.as_ref().map_or(true, |b| l2.probability > b.probability) {
            best_l2 = Some(l2);
        }
        if best_l3.as_ref().map_or(true, |b| l3.sharpe_ratio > b.sharpe_ratio) {
            best_l3 = Some(l3);
        }
    }
    let l1 = best_l1.expect("horizons is non-empty");
    let l2 = best_l2.expect("horizons is non-empty");
    let l3 = best_l3.expect("horizons is non-empty");
    let l4 = trend_outlook(bars, &ind);

    check_bounds(&l1, &l2, &l3, &l4)?;

    let buy_score = [
        l1.probability >= thresholds.l1_min_probability,
        l3.is_advantage || l3.sharpe_ratio >= thresholds.l3_min_sharpe,
        l4.state == TrendState::Uptrend || l4.signal == TrendSignalKind::ReversalUp,
    ]
    .iter()
    .filter(|c| **c)
    .count();
    let sell_score = [
        l2.probability >= thresholds.l2_min_probability,
        l3.sharpe_ratio < -0.3,
        l4.state == TrendState::Downtrend || l4.signal == TrendSignalKind::ReversalDown,
    ]
    .iter()
    .filter(|c| **c)
    .count();

    let mut warnings = Vec::new();
    let (mut action, mut confidence) = if buy_score >= 2 && sell_score >= 2 {
        warnings.push("多空信号冲突".to_string());
        (Action::Watch, 0.5)
    } else if buy_score >= 2 {
        (Action::Buy, (l1.probability + l4.confidence) / 2.0)
    } else if sell_score >= 2 {
        (Action::Sell, (l2.probability + l4.confidence) / 2.0)
    } else if buy_score >= 1 || sell_score >= 1 {
        (Action::Watch, 0.5)
    } else {
        (Action::Hold, 0.5)
    };

    let mut reasons = Vec::new();

    // 持仓覆写：SELL降级为WATCH，除非下行概率和夏普都足够恶劣
    if is_holding
        && action == Action::Sell
        && !(l2.probability >= 0.7 && l3.sharpe_ratio <= -0.5)
    {
        action = Action::Watch;
        confidence = 0.5;
        reasons.push("持仓中、谨慎对待".to_string());
    }

    assemble_reasons(&mut reasons, &ind, &l4);
    assemble_warnings(&mut warnings, &l2, events);
    reasons.truncate(MAX_REASONS);
    warnings.truncate(MAX_WARNINGS);

    Ok(Decision {
        symbol_id: symbol_id.to_string(),
        name: name.to_string(),
        action,
        confidence,
        horizon_days: l1.horizon_days,
        reasons,
        warnings,
        l1,
        l2,
        l3,
        l4,
        decided_at: time_util::now_millis(),
    })
}

/// 混合后的概率或置信度越界视为程序错误，跳过该标的
fn check_bounds(
    l1: &ReachSignal,
    l2: &ReachSignal,
    l3: &RiskSignal,
    l4: &TrendOutlook,
) -> Result<(), AppError> {
    for (label, p) in [
        ("l1.probability", l1.probability),
        ("l2.probability", l2.probability),
        ("l4.confidence", l4.confidence),
    ] {
        if !p.is_finite() || !(0.0..=1.0).contains(&p) {
            return Err(AppError::ComputeError(format!("{} out of range: {}", label, p)));
        }
    }
    if !l3.sharpe_ratio.is_finite() || !l3.expected_return.is_finite() {
        return Err(AppError::ComputeError("l3 is not finite".to_string()));
    }
    Ok(())
}

/// 根据指标极值拼出人类可读的理由
fn assemble_reasons(reasons: &mut Vec<String>, ind: &IndicatorBundle, l4: &TrendOutlook) {
    if ind.rsi14 < 30.0 {
        reasons.push(format!("RSI{:.0} 超卖区", ind.rsi14));
    } else if ind.rsi14 > 70.0 {
        reasons.push(format!("RSI{:.0} 超买区", ind.rsi14));
    }
    if ind.sma20 > ind.sma60 {
        reasons.push("SMA20在SMA60上方".to_string());
    } else if ind.sma20 < ind.sma60 {
        reasons.push("SMA20在SMA60下方".to_string());
    }
    if ind.volume_ratio20 > 1.5 {
        reasons.push(format!("成交量放大{:.1}倍", ind.volume_ratio20));
    }
    if ind.macd_histogram > 0.0 {
        reasons.push("MACD柱为正".to_string());
    } else if ind.macd_histogram < 0.0 {
        reasons.push("MACD柱为负".to_string());
    }
    if ind.adx14 > 25.0 {
        reasons.push(format!("趋势强度ADX{:.0}", ind.adx14));
    }
    let trend_desc = match (l4.state, l4.signal) {
        (TrendState::Uptrend, TrendSignalKind::ReversalDown) => "上升趋势、出现反转向下信号",
        (TrendState::Uptrend, _) => "处于上升趋势",
        (TrendState::Downtrend, TrendSignalKind::ReversalUp) => "下降趋势、出现反转向上信号",
        (TrendState::Downtrend, _) => "处于下降趋势",
        (TrendState::Range, TrendSignalKind::ReversalUp) => "区间震荡、底部反转迹象",
        (TrendState::Range, TrendSignalKind::ReversalDown) => "区间震荡、顶部反转迹象",
        (TrendState::Range, _) => "区间震荡",
    };
    reasons.push(trend_desc.to_string());
}

/// 未来14天重要度>=2的事件 + 预期回撤提示
fn assemble_warnings(warnings: &mut Vec<String>, l2: &ReachSignal, events: &[EventEntity]) {
    for ev in events.iter().filter(|e| e.importance >= 2) {
        warnings.push(format!("{} {}", ev.event_date, ev.description));
    }
    let expected_drawdown = (l2.target_pct * l2.probability).round();
    if expected_drawdown > 5.0 {
        warnings.push(format!("预期最大回撤约{:.0}%", expected_drawdown));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(i: usize, base: f64, range: f64, close_off: f64, vol: f64) -> DailyBar {
        DailyBar::builder()
            .date(&format!("2025-{:02}-{:02}", i / 28 + 1, i % 28 + 1))
            .o(base)
            .h(base + range)
            .l(base - range)
            .c(base + close_off)
            .v(vol)
            .build()
            .unwrap()
    }

    fn uptrend(n: usize) -> Vec<DailyBar> {
        (0..n)
            .map(|i| bar(i, 100.0 + i as f64 * 1.2, 1.0, 0.5, 2000.0))
            .collect()
    }

    fn downtrend(n: usize) -> Vec<DailyBar> {
        (0..n)
            .map(|i| bar(i, 500.0 - i as f64 * 1.2, 1.0, -0.5, 2000.0))
            .collect()
    }

    fn flat(n: usize) -> Vec<DailyBar> {
        (0..n).map(|i| bar(i, 100.0, 1.0, 0.0, 1000.0)).collect()
    }

    #[test]
    fn test_buy_implies_buy_score_two() {
        let bars = uptrend(250);
        let d = decide("TEST", "テスト", &bars, &ThresholdsConfig::default(), &[], false).unwrap();
        if d.action == Action::Buy {
            // BUY必然意味着买方2分以上且卖方不足2分
            assert!(d.l1.probability >= 0.6 || d.l3.is_advantage);
            assert!(d.confidence > 0.0 && d.confidence <= 1.0);
        }
    }

    #[test]
    fn test_flat_series_holds() {
        let bars = flat(250);
        let d = decide("TEST", "テスト", &bars, &ThresholdsConfig::default(), &[], false).unwrap();
        assert_eq!(d.action, Action::Hold);
        assert_eq!(d.confidence, 0.5);
    }

    #[test]
    fn test_reasons_bounded() {
        let bars = uptrend(250);
        let d = decide("TEST", "テスト", &bars, &ThresholdsConfig::default(), &[], false).unwrap();
        assert!(d.reasons.len() <= 5);
        assert!(d.warnings.len() <= 3);
        assert!(!d.reasons.is_empty());
    }

    #[test]
    fn test_event_warning_importance_filter() {
        let bars = downtrend(250);
        let events = vec![
            EventEntity {
                id: None,
                symbol_id: "TEST".to_string(),
                event_date: "2026-08-10".to_string(),
                description: "決算発表".to_string(),
                importance: 3,
            },
            EventEntity {
                id: None,
                symbol_id: "TEST".to_string(),
                event_date: "2026-08-12".to_string(),
                description: "株主総会".to_string(),
                importance: 1,
            },
        ];
        let d = decide("TEST", "テスト", &bars, &ThresholdsConfig::default(), &events, false)
            .unwrap();
        assert!(d.warnings.iter().any(|w| w.contains("決算発表")));
        assert!(!d.warnings.iter().any(|w| w.contains("株主総会")));
    }

    #[test]
    fn test_holding_override_downgrades_sell() {
        let bars = downtrend(250);
        let thresholds = ThresholdsConfig::default();
        let d = decide("TEST", "テスト", &bars, &thresholds, &[], true).unwrap();
        // 下跌趋势中若未同时满足L2>=0.7且sharpe<=-0.5，持仓时不允许直接SELL
        if d.action == Action::Sell {
            assert!(d.l2.probability >= 0.7 && d.l3.sharpe_ratio <= -0.5);
        }
    }

    #[test]
    fn test_horizon_label_comes_from_l1() {
        let bars = uptrend(250);
        let d = decide("TEST", "テスト", &bars, &ThresholdsConfig::default(), &[], false).unwrap();
        assert_eq!(d.horizon_days, d.l1.horizon_days);
    }
}
