use anyhow::Result;
use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::time_util;
use crate::trading::gate::state_store::{GateStateStore, PreviousSignal};
use crate::trading::signal::aggregator::{Decision, ThresholdsConfig};
use crate::trading::signal::Action;
use crate::trading::transport::formatter;
use crate::trading::transport::push::MessageTransport;

/// 抑制原因（审计与测试断言用）
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SuppressReason {
    EmergencyStop,
    DailyLimit,
    Hold,
    Cooldown,
    WatchDuplicate,
    HysteresisBlocked,
    LowConfidence,
}

/// 门控结果。送信尝试（成功/失败）都带消息正文，由调用方落审计日志
#[derive(Debug, Clone)]
pub enum GateOutcome {
    Notified { message: String },
    SendFailed { message: String, error: String },
    Suppressed { reason: SuppressReason },
}

/// 通知门控状态机: 紧急停止 -> 日次上限 -> HOLD -> 冷却 -> WATCH去重 -> 滞后翻转
///
/// 送信成功才设置冷却并累加日次计数；失败时两者都不动，下一轮按正常流程重试。
pub struct NotificationGate<'a> {
    store: &'a dyn GateStateStore,
    transport: &'a dyn MessageTransport,
    thresholds: ThresholdsConfig,
}

impl<'a> NotificationGate<'a> {
    pub fn new(
        store: &'a dyn GateStateStore,
        transport: &'a dyn MessageTransport,
        thresholds: ThresholdsConfig,
    ) -> Self {
        Self {
            store,
            transport,
            thresholds,
        }
    }

    /// previous是本轮tick开头读到的快照（编排器随后才覆写），
    /// 这样写时序不会让门控把"新判断"误当成"前回判断"。
    pub async fn evaluate(
        &self,
        decision: &Decision,
        previous: Option<&PreviousSignal>,
        now: DateTime<Utc>,
    ) -> Result<GateOutcome> {
        // 1. 紧急停止中全部抑制
        if self.store.is_emergency_stop().await? {
            return Ok(GateOutcome::Suppressed {
                reason: SuppressReason::EmergencyStop,
            });
        }

        // 2. 日次上限：到达时置紧急停止、只发一条上限告警
        let day_key = time_util::utc_day_key(now);
        let count = self.store.get_daily_notify_count(&day_key).await?;
        if count >= self.thresholds.max_notify_per_day {
            warn!(
                "daily notify limit reached: {}/{}",
                count, self.thresholds.max_notify_per_day
            );
            self.store.set_emergency_stop(true).await?;
            let alert = formatter::format_limit_alert(self.thresholds.max_notify_per_day);
            if let Err(e) = self.transport.send_push(&alert).await {
                warn!("limit alert send failed: {}", e);
            }
            return Ok(GateOutcome::Suppressed {
                reason: SuppressReason::DailyLimit,
            });
        }

        // 3. HOLD不通知
        if decision.action == Action::Hold {
            return Ok(GateOutcome::Suppressed {
                reason: SuppressReason::Hold,
            });
        }

        // 4. 冷却窗口内抑制
        if self.store.is_in_cooldown(&decision.symbol_id).await? {
            return Ok(GateOutcome::Suppressed {
                reason: SuppressReason::Cooldown,
            });
        }

        // 5. WATCH只在前回不是WATCH时通知
        if decision.action == Action::Watch {
            if previous.map(|p| p.action) == Some(Action::Watch) {
                return Ok(GateOutcome::Suppressed {
                    reason: SuppressReason::WatchDuplicate,
                });
            }
        }

        // 6. BUY/SELL的信心度关卡。反向翻转要求额外的滞后余量
        if matches!(decision.action, Action::Buy | Action::Sell) {
            let flipping = previous
                .map(|p| p.action.is_opposite(decision.action))
                .unwrap_or(false);
            if flipping {
                if decision.confidence <= 0.5 + self.thresholds.hysteresis_buffer {
                    return Ok(GateOutcome::Suppressed {
                        reason: SuppressReason::HysteresisBlocked,
                    });
                }
            } else if decision.confidence < 0.5 {
                return Ok(GateOutcome::Suppressed {
                    reason: SuppressReason::LowConfidence,
                });
            }
        }

        // 7. 送信。成功时设置冷却+计数
        let message = formatter::format_decision(decision);
        match self.transport.send_push(&message).await {
            Ok(_) => {
                self.store
                    .set_cooldown(&decision.symbol_id, self.thresholds.cooldown_hours)
                    .await?;
                let new_count = self.store.increment_daily_notify_count(&day_key).await?;
                info!(
                    "notified {} {} (today {}/{})",
                    decision.symbol_id,
                    decision.action.as_str(),
                    new_count,
                    self.thresholds.max_notify_per_day
                );
                Ok(GateOutcome::Notified { message })
            }
            Err(e) => Ok(GateOutcome::SendFailed {
                message,
                error: e.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trading::gate::state_store::MemoryGateStore;
    use crate::trading::signal::{
        FactorScores, ReachSignal, RiskSignal, TrendOutlook, TrendSignalKind, TrendState,
    };
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    /// 记录送信次数的测试通道
    #[derive(Default)]
    struct MockTransport {
        sent: AtomicUsize,
        fail: AtomicBool,
    }

    #[async_trait]
    impl MessageTransport for MockTransport {
        async fn send_push(&self, _text: &str) -> Result<()> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(anyhow::anyhow!("transport down"));
            }
            self.sent.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn decision(symbol: &str, action: Action, confidence: f64) -> Decision {
        let factors = FactorScores {
            momentum: 0.5,
            trend: 0.5,
            breakout: 0.5,
            volume: 0.5,
        };
        Decision {
            symbol_id: symbol.to_string(),
            name: symbol.to_string(),
            action,
            confidence,
            horizon_days: 60,
            reasons: vec![],
            warnings: vec![],
            l1: ReachSignal {
                probability: 0.6,
                target_pct: 8.0,
                horizon_days: 60,
                factors,
            },
            l2: ReachSignal {
                probability: 0.3,
                target_pct: 8.0,
                horizon_days: 60,
                factors,
            },
            l3: RiskSignal {
                expected_return: 0.02,
                sharpe_ratio: 0.6,
                is_advantage: true,
                horizon_days: 60,
            },
            l4: TrendOutlook {
                state: TrendState::Uptrend,
                signal: TrendSignalKind::Continue,
                adx: 26.0,
                confidence: 0.7,
            },
            decided_at: time_util::now_millis(),
        }
    }

    fn prev(action: Action, confidence: f64) -> PreviousSignal {
        PreviousSignal {
            action,
            confidence,
            decided_at: 0,
        }
    }

    #[tokio::test]
    async fn test_hold_suppressed() {
        let store = MemoryGateStore::new();
        let transport = MockTransport::default();
        let gate = NotificationGate::new(&store, &transport, ThresholdsConfig::default());
        let out = gate
            .evaluate(&decision("A", Action::Hold, 0.5), None, Utc::now())
            .await
            .unwrap();
        assert!(matches!(
            out,
            GateOutcome::Suppressed {
                reason: SuppressReason::Hold
            }
        ));
        assert_eq!(transport.sent.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_cooldown_suppresses_second_notify() {
        let store = MemoryGateStore::new();
        let transport = MockTransport::default();
        let gate = NotificationGate::new(&store, &transport, ThresholdsConfig::default());
        let d = decision("A", Action::Buy, 0.7);

        let out = gate.evaluate(&d, None, Utc::now()).await.unwrap();
        assert!(matches!(out, GateOutcome::Notified { .. }));

        // 1小时后（冷却24h内）的同一信号被抑制
        let out = gate.evaluate(&d, None, Utc::now()).await.unwrap();
        assert!(matches!(
            out,
            GateOutcome::Suppressed {
                reason: SuppressReason::Cooldown
            }
        ));
        assert_eq!(transport.sent.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_hysteresis_flip() {
        let store = MemoryGateStore::new();
        let transport = MockTransport::default();
        let gate = NotificationGate::new(&store, &transport, ThresholdsConfig::default());

        // 前回SELL、今回BUY 信心0.53 <= 0.55 → 抑制
        let out = gate
            .evaluate(
                &decision("A", Action::Buy, 0.53),
                Some(&prev(Action::Sell, 0.6)),
                Utc::now(),
            )
            .await
            .unwrap();
        assert!(matches!(
            out,
            GateOutcome::Suppressed {
                reason: SuppressReason::HysteresisBlocked
            }
        ));

        // 信心0.56 > 0.55 → 通知
        let out = gate
            .evaluate(
                &decision("A", Action::Buy, 0.56),
                Some(&prev(Action::Sell, 0.6)),
                Utc::now(),
            )
            .await
            .unwrap();
        assert!(matches!(out, GateOutcome::Notified { .. }));
    }

    #[tokio::test]
    async fn test_watch_dedup() {
        let store = MemoryGateStore::new();
        let transport = MockTransport::default();
        let gate = NotificationGate::new(&store, &transport, ThresholdsConfig::default());

        // 前回WATCH → 抑制
        let out = gate
            .evaluate(
                &decision("A", Action::Watch, 0.5),
                Some(&prev(Action::Watch, 0.5)),
                Utc::now(),
            )
            .await
            .unwrap();
        assert!(matches!(
            out,
            GateOutcome::Suppressed {
                reason: SuppressReason::WatchDuplicate
            }
        ));

        // 前回HOLD → 通知
        let out = gate
            .evaluate(
                &decision("B", Action::Watch, 0.5),
                Some(&prev(Action::Hold, 0.5)),
                Utc::now(),
            )
            .await
            .unwrap();
        assert!(matches!(out, GateOutcome::Notified { .. }));
    }

    #[tokio::test]
    async fn test_daily_cap_sets_emergency_stop() {
        let store = MemoryGateStore::new();
        let transport = MockTransport::default();
        let mut thresholds = ThresholdsConfig::default();
        thresholds.max_notify_per_day = 3;
        let gate = NotificationGate::new(&store, &transport, thresholds);
        let now = Utc::now();

        // 3件は通る（別銘柄なのでクールダウン非干渉）
        for i in 0..3 {
            let d = decision(&format!("SYM{}", i), Action::Buy, 0.7);
            let out = gate.evaluate(&d, None, now).await.unwrap();
            assert!(matches!(out, GateOutcome::Notified { .. }), "i={}", i);
        }
        assert_eq!(transport.sent.load(Ordering::SeqCst), 3);

        // 4件目: 上限告警1条 + 紧急停止
        let d = decision("SYM3", Action::Buy, 0.7);
        let out = gate.evaluate(&d, None, now).await.unwrap();
        assert!(matches!(
            out,
            GateOutcome::Suppressed {
                reason: SuppressReason::DailyLimit
            }
        ));
        // 上限告警本身发了一条
        assert_eq!(transport.sent.load(Ordering::SeqCst), 4);
        assert!(store.is_emergency_stop().await.unwrap());

        // 5件目: 紧急停止直接抑制，不再发任何东西
        let d = decision("SYM4", Action::Buy, 0.7);
        let out = gate.evaluate(&d, None, now).await.unwrap();
        assert!(matches!(
            out,
            GateOutcome::Suppressed {
                reason: SuppressReason::EmergencyStop
            }
        ));
        assert_eq!(transport.sent.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_transport_failure_no_cooldown_no_count() {
        let store = MemoryGateStore::new();
        let transport = MockTransport::default();
        transport.fail.store(true, Ordering::SeqCst);
        let gate = NotificationGate::new(&store, &transport, ThresholdsConfig::default());
        let now = Utc::now();

        let d = decision("A", Action::Buy, 0.7);
        let out = gate.evaluate(&d, None, now).await.unwrap();
        assert!(matches!(out, GateOutcome::SendFailed { .. }));
        // 失败不设冷却、不计数
        assert!(!store.is_in_cooldown("A").await.unwrap());
        assert_eq!(
            store
                .get_daily_notify_count(&time_util::utc_day_key(now))
                .await
                .unwrap(),
            0
        );

        // 恢复后下一轮正常通知
        transport.fail.store(false, Ordering::SeqCst);
        let out = gate.evaluate(&d, None, now).await.unwrap();
        assert!(matches!(out, GateOutcome::Notified { .. }));
    }

    #[tokio::test]
    async fn test_low_confidence_buy_suppressed() {
        let store = MemoryGateStore::new();
        let transport = MockTransport::default();
        let gate = NotificationGate::new(&store, &transport, ThresholdsConfig::default());
        let out = gate
            .evaluate(&decision("A", Action::Buy, 0.45), None, Utc::now())
            .await
            .unwrap();
        assert!(matches!(
            out,
            GateOutcome::Suppressed {
                reason: SuppressReason::LowConfidence
            }
        ));
    }
}
