use crate::DailyBar;

/// ATR: 最近period个TrueRange的算术平均。
/// TR = max(high-low, |high-prevClose|, |low-prevClose|)，首根K线取high-low
pub fn atr(bars: &[DailyBar], period: usize) -> f64 {
    if bars.is_empty() {
        return 0.0;
    }
    let mut trs = Vec::with_capacity(bars.len());
    let mut prev_close: Option<f64> = None;
    for bar in bars {
        let tr = true_range(bar.h(), bar.l(), prev_close);
        trs.push(tr);
        prev_close = Some(bar.c());
    }
    let n = trs.len().min(period.max(1));
    trs[trs.len() - n..].iter().sum::<f64>() / n as f64
}

fn true_range(high: f64, low: f64, prev_close: Option<f64>) -> f64 {
    match prev_close {
        None => high - low,
        Some(pc) => {
            let tr1 = high - low;
            let tr2 = (high - pc).abs();
            let tr3 = (low - pc).abs();
            tr1.max(tr2).max(tr3)
        }
    }
}
