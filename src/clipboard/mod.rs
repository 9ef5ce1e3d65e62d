//! 剪贴板管理模块
//!
//! # 设计思路
//!
//! 剪贴板是两条扫码输入通道之一：用户从网页复制 ISBN，或扫码枪工作在
//! “写入剪贴板”模式时，新的文本都会出现在这里。
//! - **读取**：通过 `ClipboardSource` 抽象读取系统剪贴板文本，默认实现基于 `arboard`
//! - **轮询**：固定间隔采样，与上一次处理过的值比较，只处理真正的新内容
//!
//! # 实现思路
//!
//! - 轮询状态（上一次的值）归 `ClipboardPoller` 实例所有，不使用全局变量。
//! - 轮询任务运行在 tokio 任务中，识别结果通过 channel 交给分发层，
//!   后端调用再慢也不会阻塞下一次采样。
//! - `PollerHandle` 采用 RAII 模式：句柄释放时自动停止轮询。
//! - 系统剪贴板读取会阻塞，每次采样经 `spawn_blocking` 在阻塞线程池中完成，不占用运行时线程。
//! - 读取失败只记录日志并跳过本次采样，轮询永不因错误退出。

pub mod poller;

use crate::error::AppError;

pub use poller::{ClipboardPoller, PollerConfig, PollerHandle, spawn_poller};

/// 剪贴板文本来源
///
/// 读取失败返回 `Err`；剪贴板中没有文本时返回空字符串。
pub trait ClipboardSource: Send + 'static {
    fn read_text(&mut self) -> Result<String, AppError>;
}

/// 基于 `arboard` 的系统剪贴板
///
/// 每次读取时打开剪贴板，避免长期持有平台句柄。
#[derive(Debug, Default)]
pub struct ArboardClipboard;

impl ArboardClipboard {
    pub fn new() -> Self {
        Self
    }
}

impl ClipboardSource for ArboardClipboard {
    fn read_text(&mut self) -> Result<String, AppError> {
        let mut clipboard = arboard::Clipboard::new()
            .map_err(|e| AppError::Clipboard(format!("打开剪贴板失败: {}", e)))?;
        match clipboard.get_text() {
            Ok(text) => Ok(text),
            Err(arboard::Error::ContentNotAvailable) => Ok(String::new()),
            Err(e) => Err(AppError::Clipboard(format!("读取剪贴板文本失败: {}", e))),
        }
    }
}
