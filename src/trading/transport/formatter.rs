use crate::time_util;
use crate::trading::signal::aggregator::Decision;
use crate::trading::signal::Action;

/// 单个Decision的推送正文（纯文本、多行）
pub fn format_decision(decision: &Decision) -> String {
    let mut lines = Vec::new();
    lines.push(format!(
        "【{}】{} {}",
        decision.action.as_str(),
        decision.symbol_id,
        decision.name
    ));
    if let Ok(ts) = time_util::mill_time_to_datetime(decision.decided_at) {
        lines.push(format!("{} UTC", ts));
    }
    lines.push(format!(
        "信心度 {:.0}% / 窗口 {}日",
        decision.confidence * 100.0,
        decision.horizon_days
    ));
    lines.push(format!(
        "上行 {:.0}% (+{:.0}%) / 下行 {:.0}% (-{:.0}%)",
        decision.l1.probability * 100.0,
        decision.l1.target_pct,
        decision.l2.probability * 100.0,
        decision.l2.target_pct
    ));
    lines.push(format!(
        "夏普 {:.2} / 趋势 {}({})",
        decision.l3.sharpe_ratio,
        decision.l4.state.as_str(),
        decision.l4.signal.as_str()
    ));
    if !decision.reasons.is_empty() {
        lines.push("――理由――".to_string());
        for r in &decision.reasons {
            lines.push(format!("・{}", r));
        }
    }
    if !decision.warnings.is_empty() {
        lines.push("――注意――".to_string());
        for w in &decision.warnings {
            lines.push(format!("⚠ {}", w));
        }
    }
    lines.join("\n")
}

/// 市场日报的一行摘要
pub struct SummaryLine {
    pub symbol_id: String,
    pub name: String,
    pub action: Action,
    pub confidence: f64,
    pub close: f64,
}

/// 投资组合部分
pub struct PortfolioSummary {
    pub total_value: f64,
    pub daily_pnl: f64,
    pub weekly_pnl: f64,
    pub monthly_pnl: f64,
}

/// 每市场一条的日报
pub fn format_daily_summary(
    market: &str,
    lines: &[SummaryLine],
    portfolio: Option<&PortfolioSummary>,
) -> String {
    let mut out = Vec::new();
    out.push(format!("📊 {}市场 日报", market));
    if lines.is_empty() {
        out.push("（无有效标的）".to_string());
    }
    for line in lines {
        out.push(format!(
            "{} {} {} {:.0}% (收盘 {:.2})",
            action_icon(line.action),
            line.symbol_id,
            line.name,
            line.confidence * 100.0,
            line.close
        ));
    }
    if let Some(p) = portfolio {
        out.push("――资产――".to_string());
        out.push(format!("总市值 {:.0}", p.total_value));
        out.push(format!(
            "日 {:+.0} / 周 {:+.0} / 月 {:+.0}",
            p.daily_pnl, p.weekly_pnl, p.monthly_pnl
        ));
    }
    out.join("\n")
}

/// 周报
pub fn format_weekly_summary(signal_count: i64, portfolio: Option<&PortfolioSummary>) -> String {
    let mut out = Vec::new();
    out.push("🗓 周报".to_string());
    out.push(format!("本周信号数: {}", signal_count));
    if let Some(p) = portfolio {
        out.push(format!("总市值 {:.0}", p.total_value));
        out.push(format!("周 {:+.0} / 月 {:+.0}", p.weekly_pnl, p.monthly_pnl));
    }
    out.join("\n")
}

/// 触达日次上限时的唯一一条告警
pub fn format_limit_alert(max_per_day: u32) -> String {
    format!(
        "🚨 通知数已达日次上限({})，启动紧急停止。恢复请执行 admin reset-stop",
        max_per_day
    )
}

fn action_icon(action: Action) -> &'static str {
    match action {
        Action::Buy => "🟢",
        Action::Sell => "🔴",
        Action::Watch => "🟡",
        Action::Hold => "⚪",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trading::signal::{
        FactorScores, ReachSignal, RiskSignal, TrendOutlook, TrendSignalKind, TrendState,
    };

    fn sample_decision() -> Decision {
        let factors = FactorScores {
            momentum: 0.6,
            trend: 0.7,
            breakout: 0.55,
            volume: 0.55,
        };
        Decision {
            symbol_id: "7203.T".to_string(),
            name: "トヨタ自動車".to_string(),
            action: Action::Buy,
            confidence: 0.72,
            horizon_days: 60,
            reasons: vec!["处于上升趋势".to_string()],
            warnings: vec!["2026-08-05 決算発表".to_string()],
            l1: ReachSignal {
                probability: 0.65,
                target_pct: 8.0,
                horizon_days: 60,
                factors,
            },
            l2: ReachSignal {
                probability: 0.32,
                target_pct: 8.0,
                horizon_days: 120,
                factors,
            },
            l3: RiskSignal {
                expected_return: 0.026,
                sharpe_ratio: 0.82,
                is_advantage: true,
                horizon_days: 60,
            },
            l4: TrendOutlook {
                state: TrendState::Uptrend,
                signal: TrendSignalKind::Continue,
                adx: 28.0,
                confidence: 0.7,
            },
            decided_at: 1_700_000_000_000,
        }
    }

    #[test]
    fn test_format_decision_contains_key_fields() {
        let text = format_decision(&sample_decision());
        assert!(text.contains("【BUY】7203.T"));
        // decided_at = 1_700_000_000_000
        assert!(text.contains("2023-11-14 22:13:20 UTC"));
        assert!(text.contains("窗口 60日"));
        assert!(text.contains("理由"));
        assert!(text.contains("決算発表"));
    }

    #[test]
    fn test_format_daily_summary() {
        let lines = vec![SummaryLine {
            symbol_id: "NVDA".to_string(),
            name: "NVIDIA".to_string(),
            action: Action::Watch,
            confidence: 0.5,
            close: 181.25,
        }];
        let p = PortfolioSummary {
            total_value: 1_000_000.0,
            daily_pnl: 1500.0,
            weekly_pnl: -2000.0,
            monthly_pnl: 30000.0,
        };
        let text = format_daily_summary("US", &lines, Some(&p));
        assert!(text.contains("US市场"));
        assert!(text.contains("NVDA"));
        assert!(text.contains("总市值 1000000"));
        assert!(text.contains("-2000"));
    }
}
