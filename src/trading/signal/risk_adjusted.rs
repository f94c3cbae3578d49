use crate::trading::signal::{ReachSignal, RiskSignal};

/// 无风险收益（期间0.5%）
const RISK_FREE: f64 = 0.005;

/// L3: 风险调整期望。
///
/// expectedReturn = P(up)*X - P(down)*Y（换算为小数），
/// adjVol = 日收益率标准差 * sqrt(N)（年化波动折算到N日窗口），
/// sharpe = (expectedReturn - 0.005) / adjVol。sharpe > 0.5 视为有优势。
pub fn risk_adjusted(closes: &[f64], l1: &ReachSignal, l2: &ReachSignal, horizon_days: u32) -> RiskSignal {
    let expected_return =
        l1.probability * l1.target_pct / 100.0 - l2.probability * l2.target_pct / 100.0;

    let adj_vol = daily_return_std(closes) * (horizon_days as f64).sqrt();
    let sharpe_ratio = if adj_vol > f64::EPSILON {
        (expected_return - RISK_FREE) / adj_vol
    } else {
        0.0
    };

    RiskSignal {
        expected_return,
        sharpe_ratio,
        is_advantage: sharpe_ratio > 0.5,
        horizon_days,
    }
}

/// 日收益率的样本标准差
fn daily_return_std(closes: &[f64]) -> f64 {
    if closes.len() < 3 {
        return 0.0;
    }
    let returns: Vec<f64> = closes
        .windows(2)
        .filter(|w| w[0] > 0.0)
        .map(|w| w[1] / w[0] - 1.0)
        .collect();
    if returns.len() < 2 {
        return 0.0;
    }
    let mean = returns.iter().sum::<f64>() / returns.len() as f64;
    let var = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (returns.len() - 1) as f64;
    var.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trading::signal::FactorScores;

    fn reach(prob: f64, target: f64, horizon: u32) -> ReachSignal {
        ReachSignal {
            probability: prob,
            target_pct: target,
            horizon_days: horizon,
            factors: FactorScores {
                momentum: 0.5,
                trend: 0.5,
                breakout: 0.5,
                volume: 0.5,
            },
        }
    }

    #[test]
    fn test_expected_return_fraction() {
        let closes: Vec<f64> = (0..100)
            .map(|i| 100.0 + (i as f64 * 0.5).sin())
            .collect();
        let l1 = reach(0.7, 10.0, 60);
        let l2 = reach(0.3, 10.0, 60);
        let sig = risk_adjusted(&closes, &l1, &l2, 60);
        // 0.7*0.10 - 0.3*0.10 = 0.04
        assert!((sig.expected_return - 0.04).abs() < 1e-9);
    }

    #[test]
    fn test_advantage_threshold() {
        // 低波动 + 正期望 -> 高sharpe
        let closes: Vec<f64> = (0..100).map(|i| 100.0 + (i % 2) as f64 * 0.01).collect();
        let l1 = reach(0.8, 20.0, 60);
        let l2 = reach(0.2, 10.0, 60);
        let sig = risk_adjusted(&closes, &l1, &l2, 60);
        assert!(sig.sharpe_ratio > 0.5);
        assert!(sig.is_advantage);
    }

    #[test]
    fn test_zero_volatility_guard() {
        let closes = vec![100.0; 100];
        let l1 = reach(0.7, 10.0, 60);
        let l2 = reach(0.3, 10.0, 60);
        let sig = risk_adjusted(&closes, &l1, &l2, 60);
        assert_eq!(sig.sharpe_ratio, 0.0);
        assert!(!sig.is_advantage);
    }

    #[test]
    fn test_negative_expectation_negative_sharpe() {
        let closes: Vec<f64> = (0..100)
            .map(|i| 100.0 + (i as f64 * 0.5).sin() * 2.0)
            .collect();
        let l1 = reach(0.2, 10.0, 60);
        let l2 = reach(0.8, 10.0, 60);
        let sig = risk_adjusted(&closes, &l1, &l2, 60);
        assert!(sig.sharpe_ratio < 0.0);
        assert!(!sig.is_advantage);
    }
}
