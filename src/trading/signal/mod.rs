pub mod aggregator;
pub mod downside;
pub mod risk_adjusted;
pub mod trend;
pub mod upside;

use serde::{Deserialize, Serialize};

/// 推荐动作
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    Buy,
    Sell,
    Hold,
    Watch,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Buy => "BUY",
            Action::Sell => "SELL",
            Action::Hold => "HOLD",
            Action::Watch => "WATCH",
        }
    }

    pub fn from_str(s: &str) -> Option<Action> {
        match s {
            "BUY" => Some(Action::Buy),
            "SELL" => Some(Action::Sell),
            "HOLD" => Some(Action::Hold),
            "WATCH" => Some(Action::Watch),
            _ => None,
        }
    }

    /// BUY与SELL互为反向
    pub fn is_opposite(&self, other: Action) -> bool {
        matches!(
            (self, other),
            (Action::Buy, Action::Sell) | (Action::Sell, Action::Buy)
        )
    }
}

/// 趋势状态 (L4)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrendState {
    Uptrend,
    Downtrend,
    Range,
}

impl TrendState {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrendState::Uptrend => "UPTREND",
            TrendState::Downtrend => "DOWNTREND",
            TrendState::Range => "RANGE",
        }
    }
}

/// 趋势信号 (L4)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrendSignalKind {
    Continue,
    ReversalUp,
    ReversalDown,
}

impl TrendSignalKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrendSignalKind::Continue => "CONTINUE",
            TrendSignalKind::ReversalUp => "REVERSAL_UP",
            TrendSignalKind::ReversalDown => "REVERSAL_DOWN",
        }
    }
}

/// L1/L2的四因子得分，均在[0,1]
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FactorScores {
    pub momentum: f64,
    pub trend: f64,
    pub breakout: f64,
    pub volume: f64,
}

/// 到达概率信号（L1上行 / L2下行共用结构）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReachSignal {
    /// 在horizon_days内到达target_pct的概率，[0.1, 0.9]
    pub probability: f64,
    /// 目标幅度（百分比，5-30）
    pub target_pct: f64,
    pub horizon_days: u32,
    pub factors: FactorScores,
}

/// 风险调整信号 (L3)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskSignal {
    /// 期望收益（小数，非百分比）
    pub expected_return: f64,
    pub sharpe_ratio: f64,
    pub is_advantage: bool,
    pub horizon_days: u32,
}

/// 趋势展望 (L4)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendOutlook {
    pub state: TrendState,
    pub signal: TrendSignalKind,
    pub adx: f64,
    pub confidence: f64,
}

/// 到达概率的预测窗口（交易日）
pub const HORIZONS: [u32; 2] = [60, 120];

/// 52周 ≈ 252个交易日
pub const LOOKBACK_52W: usize = 252;

/// 波动率目标: X = clamp(ATR% * 2, 5, 30)
pub fn volatility_target_pct(atr20: f64, last_close: f64) -> f64 {
    if last_close <= 0.0 {
        return 5.0;
    }
    let atr_pct = atr20 / last_close * 100.0;
    (atr_pct * 2.0).clamp(5.0, 30.0)
}
