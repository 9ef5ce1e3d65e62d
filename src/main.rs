//! # 扫码录入 — 剪贴板监视器
//!
//! 不连接后端，只监视剪贴板并打印识别结果与将要执行的动作，
//! 用于调试扫码枪的“写入剪贴板”模式。
//!
//! 用法：`scan-catalog [设置文件路径]`，默认读取当前目录下的 `.settings.json`。

use std::path::PathBuf;

use scan_catalog::clipboard::{ArboardClipboard, ClipboardPoller, PollerConfig, spawn_poller};
use scan_catalog::dispatch::plan;
use scan_catalog::scan::ScanSource;
use scan_catalog::settings::ScanSettings;

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let settings_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(".settings.json"));
    let settings = match ScanSettings::load_from_path(&settings_path) {
        Ok(settings) => settings,
        Err(err) => {
            log::warn!("读取设置失败，使用默认设置: {err}");
            ScanSettings::default()
        }
    };

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let poller = ClipboardPoller::new(settings.classifier_for(ScanSource::Clipboard));
    // 命令行下没有窗口焦点，始终轮询
    let config = PollerConfig {
        only_when_focused: false,
        ..PollerConfig::from(&settings)
    };
    let _poller = spawn_poller(poller, ArboardClipboard::new(), config, None, tx);

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            Some(scan) = rx.recv() => {
                log::info!("{} [{}] -> {:?}", scan.text, scan.classification.kind(), plan(&scan));
            }
            _ = &mut shutdown => {
                log::info!("收到退出信号，停止监视");
                break;
            }
        }
    }
}
