use thiserror::Error;

/// 应用错误
///
/// 按故障域划分：外部数据源（可重试）、数据不足（跳过该标的）、
/// 计算越界（程序错误，跳过且不通知）、推送失败（不设冷却）、存储失败（中断本轮）。
#[derive(Error, Debug)]
pub enum AppError {
    /// K线数据不足，无法计算指标
    #[error("数据不足: {symbol} 需要{need}根K线, 实际{have}根")]
    InsufficientData {
        symbol: String,
        need: usize,
        have: usize,
    },

    /// 外部行情源错误（超时/4xx/5xx），重试后仍失败
    #[error("行情获取失败: {0}")]
    FetchError(String),

    /// 计算越界：概率超出[0,1]或指标非有限值
    #[error("计算越界: {0}")]
    ComputeError(String),

    /// 推送失败
    #[error("通知送信失败: {0}")]
    TransportError(String),

    /// 数据库错误
    #[error("数据库错误: {0}")]
    DbError(String),

    /// Redis错误
    #[error("KV存储错误: {0}")]
    KvError(String),

    /// 业务错误
    #[error("业务错误: {0}")]
    BizError(String),
}

impl AppError {
    /// 该错误是否只跳过当前标的（不中断整轮tick）
    pub fn is_per_instrument(&self) -> bool {
        matches!(
            self,
            AppError::InsufficientData { .. }
                | AppError::FetchError(_)
                | AppError::ComputeError(_)
                | AppError::TransportError(_)
        )
    }
}
