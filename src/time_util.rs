use chrono::{DateTime, Datelike, FixedOffset, TimeZone, Timelike, Utc, Weekday};

/// JST = UTC+9
pub fn to_jst(now: DateTime<Utc>) -> DateTime<FixedOffset> {
    let offset = FixedOffset::east_opt(9 * 3600).unwrap();
    now.with_timezone(&offset)
}

/// EST = UTC-5（简化判定，不考虑夏令时）
pub fn to_est(now: DateTime<Utc>) -> DateTime<FixedOffset> {
    let offset = FixedOffset::west_opt(5 * 3600).unwrap();
    now.with_timezone(&offset)
}

fn is_weekday(w: Weekday) -> bool {
    !matches!(w, Weekday::Sat | Weekday::Sun)
}

/// 东京市场: 周一-周五 09:00-15:00 JST
pub fn is_jp_market_open(now: DateTime<Utc>) -> bool {
    let jst = to_jst(now);
    if !is_weekday(jst.weekday()) {
        return false;
    }
    let minutes = jst.hour() * 60 + jst.minute();
    minutes >= 9 * 60 && minutes < 15 * 60
}

/// 美国市场: 周一-周五 09:30-16:00 EST
pub fn is_us_market_open(now: DateTime<Utc>) -> bool {
    let est = to_est(now);
    if !is_weekday(est.weekday()) {
        return false;
    }
    let minutes = est.hour() * 60 + est.minute();
    minutes >= 9 * 60 + 30 && minutes < 16 * 60
}

/// UTC日期键 YYYY-MM-DD（日次通知计数的分桶）
pub fn utc_day_key(now: DateTime<Utc>) -> String {
    now.format("%Y-%m-%d").to_string()
}

/// 市场当地的自然日（盘中临时行的date列用）
pub fn market_local_date(market: &str, now: DateTime<Utc>) -> String {
    let local = match market {
        "JP" => to_jst(now),
        _ => to_est(now),
    };
    local.format("%Y-%m-%d").to_string()
}

pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// 毫秒时间戳转显示用的UTC时刻（通知正文用）
pub fn mill_time_to_datetime(timestamp_ms: i64) -> anyhow::Result<String> {
    match Utc.timestamp_millis_opt(timestamp_ms) {
        chrono::LocalResult::Single(datetime) => {
            Ok(datetime.format("%Y-%m-%d %H:%M:%S").to_string())
        }
        _ => Err(anyhow::anyhow!("invalid timestamp: {}", timestamp_ms)),
    }
}
