/// 成交量比率: 当前成交量 / 之前period根的平均成交量（不含当前）。
/// 没有历史数据时返回1.0（中性）
pub fn volume_ratio(volumes: &[f64], period: usize) -> f64 {
    if volumes.len() < 2 {
        return 1.0;
    }
    let current = volumes[volumes.len() - 1];
    let prev = &volumes[..volumes.len() - 1];
    let n = prev.len().min(period.max(1));
    let avg = prev[prev.len() - n..].iter().sum::<f64>() / n as f64;
    if avg <= 0.0 {
        return 1.0;
    }
    current / avg
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_volume_ratio_excludes_current() {
        let volumes = vec![100.0, 200.0, 300.0, 400.0];
        // 前3根平均200，当前400
        assert_eq!(volume_ratio(&volumes, 3), 2.0);
    }

    #[test]
    fn test_volume_ratio_no_history() {
        assert_eq!(volume_ratio(&[500.0], 20), 1.0);
        assert_eq!(volume_ratio(&[], 20), 1.0);
    }

    #[test]
    fn test_volume_ratio_zero_average() {
        let volumes = vec![0.0, 0.0, 100.0];
        assert_eq!(volume_ratio(&volumes, 20), 1.0);
    }
}
