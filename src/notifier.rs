//! 通知总线
//!
//! 多订阅者扇出主题：生产者 `notify` 永不阻塞（无界通道），断开的
//! 订阅者在下一次 `notify` 时被清理。订阅者丢弃接收端即取消订阅，
//! 已投递的通知不受影响。

use crossbeam_channel::{Receiver, Sender, unbounded};
use parking_lot::Mutex;
use tracing::trace;

/// 通知负载
///
/// 大多数主题只需要一个"有事发生"信号（`None`），少数主题附带
/// 简短的文本负载。
pub type NotifyPayload = Option<String>;

/// 一个扇出主题
pub struct Notifier {
    name: &'static str,
    listeners: Mutex<Vec<Sender<NotifyPayload>>>,
}

impl Notifier {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            listeners: Mutex::new(Vec::new()),
        }
    }

    /// 主题名（日志用）
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// 注册一个订阅者，返回投递通道的接收端
    pub fn listen(&self) -> Receiver<NotifyPayload> {
        let (tx, rx) = unbounded();
        self.listeners.lock().push(tx);
        rx
    }

    /// 向所有订阅者广播
    ///
    /// 无界通道保证生产者不被慢订阅者反压；发送失败说明订阅者已
    /// 断开，就地清理。
    pub fn notify(&self, payload: NotifyPayload) {
        let mut listeners = self.listeners.lock();
        listeners.retain(|tx| tx.send(payload.clone()).is_ok());
        trace!(topic = self.name, listeners = listeners.len(), "notify");
    }

    /// 当前存活的订阅者数量（上一次 notify 之后的快照）
    pub fn listener_count(&self) -> usize {
        self.listeners.lock().len()
    }
}

/// 场地核心使用的全部通知主题
///
/// 核心只生产；消费方是外部界面（操作台、裁判台、工位显示屏）。
pub struct ArenaNotifiers {
    pub match_load_teams: Notifier,
    pub realtime_score: Notifier,
    pub alliance_station_display: Notifier,
    pub scoring_status: Notifier,
    pub reload_displays: Notifier,
}

impl Default for ArenaNotifiers {
    fn default() -> Self {
        Self {
            match_load_teams: Notifier::new("match_load_teams"),
            realtime_score: Notifier::new("realtime_score"),
            alliance_station_display: Notifier::new("alliance_station_display"),
            scoring_status: Notifier::new("scoring_status"),
            reload_displays: Notifier::new("reload_displays"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fanout_to_all_listeners() {
        let notifier = Notifier::new("test");
        let rx1 = notifier.listen();
        let rx2 = notifier.listen();

        notifier.notify(Some("hello".to_string()));

        assert_eq!(rx1.try_recv().unwrap(), Some("hello".to_string()));
        assert_eq!(rx2.try_recv().unwrap(), Some("hello".to_string()));
    }

    #[test]
    fn test_notify_without_listeners_does_not_block() {
        let notifier = Notifier::new("test");
        notifier.notify(None);
        notifier.notify(Some("x".to_string()));
    }

    #[test]
    fn test_dropped_listener_pruned() {
        let notifier = Notifier::new("test");
        let rx1 = notifier.listen();
        let rx2 = notifier.listen();
        drop(rx2);

        notifier.notify(None);
        assert_eq!(notifier.listener_count(), 1);
        assert_eq!(rx1.try_recv().unwrap(), None);
    }

    #[test]
    fn test_delivered_notifications_survive_listener_drop() {
        let notifier = Notifier::new("test");
        let rx = notifier.listen();
        notifier.notify(Some("first".to_string()));
        notifier.notify(Some("second".to_string()));

        // 已投递的通知留在通道里，按序读取
        assert_eq!(rx.try_recv().unwrap(), Some("first".to_string()));
        assert_eq!(rx.try_recv().unwrap(), Some("second".to_string()));
        assert!(rx.try_recv().is_err());
    }
}
