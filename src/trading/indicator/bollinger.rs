use crate::trading::indicator::sma::sma;

#[derive(Debug, Clone, Copy)]
pub struct BollingerOutput {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
}

/// 布林带: SMA(period) ± multiplier * 总体标准差（最近period根）
pub fn bollinger(closes: &[f64], period: usize, multiplier: f64) -> BollingerOutput {
    let middle = sma(closes, period);
    let n = closes.len().min(period.max(1));
    if n == 0 {
        return BollingerOutput {
            upper: 0.0,
            middle: 0.0,
            lower: 0.0,
        };
    }
    let tail = &closes[closes.len() - n..];
    let variance = tail.iter().map(|c| (c - middle).powi(2)).sum::<f64>() / n as f64;
    let stdev = variance.sqrt();
    BollingerOutput {
        upper: middle + multiplier * stdev,
        middle,
        lower: middle - multiplier * stdev,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bollinger_flat() {
        let closes = vec![100.0; 30];
        let b = bollinger(&closes, 20, 2.0);
        assert_eq!(b.upper, 100.0);
        assert_eq!(b.middle, 100.0);
        assert_eq!(b.lower, 100.0);
    }

    #[test]
    fn test_bollinger_symmetric() {
        let closes: Vec<f64> = (0..40).map(|i| 100.0 + (i % 2) as f64 * 2.0).collect();
        let b = bollinger(&closes, 20, 2.0);
        assert!((b.upper - b.middle - (b.middle - b.lower)).abs() < 1e-9);
        assert!(b.upper > b.middle);
    }
}
