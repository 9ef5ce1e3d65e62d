use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::ClipboardSource;
use crate::error::AppError;
use crate::identifier::{Classifier, IdentifierClassification};
use crate::scan::{ClassifiedScan, RawScan, ScanSource};
use crate::settings::{CLIPBOARD_POLL_INTERVAL_DEFAULT_MS, ScanSettings};

/// 剪贴板变化检测
///
/// 只记住上一次处理过的文本（去除首尾空白后，精确比较），
/// 同一段文本重复复制不会被识别第二次。
#[derive(Debug)]
pub struct ClipboardPoller {
    classifier: Classifier,
    last_seen: String,
}

impl ClipboardPoller {
    pub fn new(classifier: Classifier) -> Self {
        Self {
            classifier,
            last_seen: String::new(),
        }
    }

    pub fn last_seen(&self) -> &str {
        &self.last_seen
    }

    /// 处理一次采样到的剪贴板文本
    ///
    /// 标记在识别之前同步更新，之后的异步后端调用不会导致重复处理。
    /// 非条码文本会被记住但不转发。
    pub fn observe(&mut self, raw: &str) -> Option<ClassifiedScan> {
        let scan = RawScan::new(ScanSource::Clipboard, raw);
        if scan.is_empty() || scan.trimmed == self.last_seen {
            return None;
        }
        self.last_seen.clone_from(&scan.trimmed);

        let classified = scan.classify(&self.classifier);
        if classified.classification == IdentifierClassification::NotABarcode {
            log::trace!("📋 剪贴板新内容不是条码，忽略");
            return None;
        }
        log::debug!(
            "📋 剪贴板新内容: {} -> {}",
            classified.text,
            classified.classification.kind()
        );
        Some(classified)
    }

    /// 读取一次剪贴板并处理
    ///
    /// 读取失败只记录日志，返回 `None`。
    pub fn tick<S: ClipboardSource + ?Sized>(&mut self, source: &mut S) -> Option<ClassifiedScan> {
        self.accept_read(source.read_text())
    }

    /// 处理一次读取结果
    pub fn accept_read(&mut self, read: Result<String, AppError>) -> Option<ClassifiedScan> {
        match read {
            Ok(text) => self.observe(&text),
            Err(err) => {
                log::warn!("📋 读取剪贴板失败，跳过本次轮询: {}", err);
                None
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollerConfig {
    pub interval: Duration,
    /// 窗口失焦时暂停（需要同时提供焦点信号）
    pub only_when_focused: bool,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(CLIPBOARD_POLL_INTERVAL_DEFAULT_MS),
            only_when_focused: true,
        }
    }
}

impl From<&ScanSettings> for PollerConfig {
    fn from(settings: &ScanSettings) -> Self {
        Self {
            interval: settings.poll_interval(),
            only_when_focused: settings.poll_only_when_focused,
        }
    }
}

/// 轮询任务句柄
///
/// 释放时中止轮询任务；已经交给分发层的扫描不受影响。
#[derive(Debug)]
pub struct PollerHandle {
    task: JoinHandle<()>,
}

impl PollerHandle {
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// 在 tokio 任务中启动剪贴板轮询
///
/// # 参数
/// * `poller` - 变化检测状态
/// * `source` - 剪贴板来源
/// * `config` - 轮询间隔与焦点策略
/// * `focus` - 窗口焦点信号（`true` 为获得焦点）；为 `None` 时持续轮询
/// * `tx` - 识别结果发送端，接收端关闭后轮询自动结束
pub fn spawn_poller<S: ClipboardSource>(
    mut poller: ClipboardPoller,
    mut source: S,
    config: PollerConfig,
    focus: Option<watch::Receiver<bool>>,
    tx: mpsc::UnboundedSender<ClassifiedScan>,
) -> PollerHandle {
    let mut focus = if config.only_when_focused { focus } else { None };

    let task = tokio::spawn(async move {
        let mut timer = tokio::time::interval(config.interval);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        log::info!("📋 剪贴板轮询已启动，间隔 {:?}", config.interval);

        loop {
            if let Some(rx) = focus.as_mut() {
                let focused = *rx.borrow_and_update();
                if !focused {
                    log::debug!("📋 窗口失焦，暂停剪贴板轮询");
                    let resumed = rx.wait_for(|f| *f).await.is_ok();
                    if resumed {
                        log::debug!("📋 窗口获得焦点，恢复剪贴板轮询");
                        timer.reset();
                    } else {
                        log::debug!("📋 焦点信号已关闭，改为持续轮询");
                        focus = None;
                    }
                }
            }

            timer.tick().await;

            // 系统剪贴板读取是阻塞调用，放到阻塞线程池，读完交还 source
            let read = tokio::task::spawn_blocking(move || {
                let read = source.read_text();
                (source, read)
            })
            .await;
            let read = match read {
                Ok((returned, read)) => {
                    source = returned;
                    read
                }
                Err(err) => {
                    log::error!("📋 剪贴板读取任务异常退出，停止轮询: {}", err);
                    break;
                }
            };

            if let Some(scan) = poller.accept_read(read) {
                if tx.send(scan).is_err() {
                    log::debug!("📋 扫描接收端已关闭，停止剪贴板轮询");
                    break;
                }
            }
        }
    });

    PollerHandle { task }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identifier::IdentifierKind;

    struct FailingClipboard;

    impl ClipboardSource for FailingClipboard {
        fn read_text(&mut self) -> Result<String, AppError> {
            Err(AppError::Clipboard("locked".into()))
        }
    }

    #[test]
    fn observe_forwards_new_identifier_once() {
        let mut poller = ClipboardPoller::new(Classifier::default());
        let first = poller.observe(" 978-0-306-40615-7 ").expect("new value forwarded");
        assert_eq!(first.text, "978-0-306-40615-7");
        assert_eq!(first.classification.kind(), IdentifierKind::Isbn13);

        assert!(poller.observe("978-0-306-40615-7").is_none());
        assert!(poller.observe("978-0-306-40615-7\n").is_none());
        assert_eq!(poller.last_seen(), "978-0-306-40615-7");
    }

    #[test]
    fn observe_ignores_empty_clipboard() {
        let mut poller = ClipboardPoller::new(Classifier::default());
        assert!(poller.observe("").is_none());
        assert!(poller.observe("   ").is_none());
        assert_eq!(poller.last_seen(), "");
    }

    #[test]
    fn observe_remembers_plain_text_without_forwarding() {
        let mut poller = ClipboardPoller::new(Classifier::default());
        assert!(poller.observe("hello world").is_none());
        assert_eq!(poller.last_seen(), "hello world");
    }

    #[test]
    fn observe_reclassifies_after_different_value() {
        let mut poller = ClipboardPoller::new(Classifier::default());
        assert!(poller.observe("0306406152").is_some());
        assert!(poller.observe("hello").is_none());
        assert!(poller.observe("0306406152").is_some());
    }

    #[test]
    fn tick_skips_read_errors() {
        let mut poller = ClipboardPoller::new(Classifier::default());
        assert!(poller.tick(&mut FailingClipboard).is_none());
        assert_eq!(poller.last_seen(), "");
    }

    #[test]
    fn accept_read_skips_errors_and_keeps_marker() {
        let mut poller = ClipboardPoller::new(Classifier::default());
        assert!(poller.accept_read(Ok("0306406152".into())).is_some());
        assert!(poller.accept_read(Err(AppError::Clipboard("busy".into()))).is_none());
        assert_eq!(poller.last_seen(), "0306406152");
        assert!(poller.accept_read(Ok("0306406152".into())).is_none());
    }

    #[test]
    fn config_follows_settings() {
        let mut settings = ScanSettings::default();
        settings.clipboard_poll_interval_ms = 750;
        settings.poll_only_when_focused = false;
        let config = PollerConfig::from(&settings);
        assert_eq!(config.interval, Duration::from_millis(750));
        assert!(!config.only_when_focused);
    }
}
