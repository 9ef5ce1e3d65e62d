//! 扫描会话
//!
//! # 设计思路
//!
//! 把两条输入通道与分发循环组装成一个有明确生命周期的对象：
//! 界面挂载时创建，卸载时释放。
//!
//! # 实现思路
//!
//! - 剪贴板轮询与键盘聚合都把识别结果发送到同一个 channel，
//!   分发循环按到达顺序逐个处理，后端调用不会阻塞输入采样。
//! - 释放会话时：轮询任务立即中止；分发循环在处理完手头的扫描后自然退出，
//!   结果仍会送达回调，调用方若已不在意可直接忽略，不做主动取消。

use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::clipboard::{ClipboardPoller, ClipboardSource, PollerConfig, PollerHandle, spawn_poller};
use crate::dispatch::{Dispatcher, run_dispatch_loop};
use crate::input::{KeyInput, KeystrokeAggregator};
use crate::scan::{ClassifiedScan, ScanSource};
use crate::settings::ScanSettings;

pub struct ScanSession {
    settings: ScanSettings,
    tx: mpsc::UnboundedSender<ClassifiedScan>,
    keyboard: KeystrokeAggregator,
    poller: Option<PollerHandle>,
    dispatch_task: JoinHandle<()>,
}

impl ScanSession {
    /// 启动分发循环；键盘通道随即可用，剪贴板通道需另行开启
    ///
    /// 必须在 tokio 运行时内调用。
    pub fn start(settings: ScanSettings, dispatcher: Dispatcher) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let dispatch_task = tokio::spawn(run_dispatch_loop(dispatcher, rx));
        log::info!("🧭 扫描会话已启动");

        Self {
            keyboard: KeystrokeAggregator::from_settings(&settings),
            settings,
            tx,
            poller: None,
            dispatch_task,
        }
    }

    pub fn settings(&self) -> &ScanSettings {
        &self.settings
    }

    /// 开启剪贴板轮询，重复调用会替换之前的轮询任务
    pub fn watch_clipboard<S: ClipboardSource>(&mut self, source: S, focus: Option<watch::Receiver<bool>>) {
        let poller = ClipboardPoller::new(self.settings.classifier_for(ScanSource::Clipboard));
        let handle = spawn_poller(
            poller,
            source,
            PollerConfig::from(&self.settings),
            focus,
            self.tx.clone(),
        );
        self.poller = Some(handle);
    }

    /// 停止剪贴板轮询，键盘通道不受影响
    pub fn stop_clipboard(&mut self) {
        if self.poller.take().is_some() {
            log::info!("📋 剪贴板轮询已停止");
        }
    }

    pub fn is_watching_clipboard(&self) -> bool {
        self.poller.as_ref().is_some_and(|p| !p.is_finished())
    }

    /// 以带时间戳的方式转发一次按键，完成一次扫描时返回 `true`
    pub fn on_key_at(&mut self, key: KeyInput, at: Duration) -> bool {
        let scan = self.keyboard.on_key(key, at);
        self.forward(scan)
    }

    /// 以当前时间转发一次按键
    pub fn on_key(&mut self, key: KeyInput) -> bool {
        let scan = self.keyboard.on_key_now(key);
        self.forward(scan)
    }

    /// 直接提交一次已识别的扫描（例如手动粘贴）
    pub fn submit(&self, scan: ClassifiedScan) {
        self.forward(Some(scan));
    }

    fn forward(&self, scan: Option<ClassifiedScan>) -> bool {
        let Some(scan) = scan else {
            return false;
        };
        if self.tx.send(scan).is_err() {
            log::warn!("🧭 分发循环已退出，丢弃扫描");
            return false;
        }
        true
    }

    /// 停止输入并等待已提交的扫描全部处理完
    pub async fn shutdown(self) {
        let Self {
            poller,
            tx,
            dispatch_task,
            ..
        } = self;
        drop(poller);
        drop(tx);
        if let Err(err) = dispatch_task.await {
            log::error!("🧭 分发循环异常退出: {}", err);
        }
        log::info!("🧭 扫描会话已结束");
    }
}
