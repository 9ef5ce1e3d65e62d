//! Tauri 桥接（`tauri-bridge` feature）
//!
//! # 设计思路
//!
//! 本 crate 的核心不依赖 Tauri；在桌面应用中，事件推送、剪贴板读取、
//! 窗口焦点与键盘事件都经由 Tauri 完成，这里提供对应的适配实现。
//!
//! # 实现思路
//!
//! - `TauriEventSink` / `TauriScanCallbacks`：通过 `Emitter::emit` 推送给前端。
//! - `TauriClipboard`：经 `tauri-plugin-clipboard-manager` 读取剪贴板。
//! - `focus_signal`：把窗口 `Focused` 事件转成 `watch` 信号，供轮询暂停 / 恢复。
//! - `scan_keydown`：前端在捕获阶段监听 `keydown` 后调用，交给键盘聚合器。

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use serde::Serialize;
use tauri::{AppHandle, Emitter, Runtime, State, WebviewWindow, WindowEvent};
use tauri_plugin_clipboard_manager::ClipboardExt;
use tokio::sync::watch;

use crate::clipboard::ClipboardSource;
use crate::dispatch::{CatalogBackend, CatalogEvent, Dispatcher, EventSink, ScanCallbacks, ScanResolution};
use crate::error::AppError;
use crate::identifier::IdentifierKind;
use crate::input::KeyInput;
use crate::session::ScanSession;
use crate::settings::ScanSettings;

pub const SCAN_RESOLVED_EVENT: &str = "scan-resolved";
pub const SCAN_UNKNOWN_FORMAT_EVENT: &str = "scan-unknown-format";
pub const SCAN_LOOKUP_FAILED_EVENT: &str = "scan-lookup-failed";

/// 目录事件推送到前端
pub struct TauriEventSink<R: Runtime> {
    app: AppHandle<R>,
}

impl<R: Runtime> TauriEventSink<R> {
    pub fn new(app: AppHandle<R>) -> Self {
        Self { app }
    }
}

impl<R: Runtime> EventSink for TauriEventSink<R> {
    fn emit(&self, event: CatalogEvent) {
        if let Err(err) = self.app.emit(event.name(), event.payload()) {
            log::warn!("发送目录事件 {} 失败: {}", event.name(), err);
        }
    }
}

#[derive(Serialize, Clone)]
struct ResolvedPayload {
    kind: IdentifierKind,
    resolution: ScanResolution,
}

#[derive(Serialize, Clone)]
#[serde(rename_all = "camelCase")]
struct LookupFailedPayload {
    identifier: String,
    message: String,
}

/// 扫描结果推送到前端
pub struct TauriScanCallbacks<R: Runtime> {
    app: AppHandle<R>,
}

impl<R: Runtime> TauriScanCallbacks<R> {
    pub fn new(app: AppHandle<R>) -> Self {
        Self { app }
    }

    fn send<S: Serialize + Clone>(&self, event: &str, payload: S) {
        if let Err(err) = self.app.emit(event, payload) {
            log::warn!("发送扫描事件 {} 失败: {}", event, err);
        }
    }
}

impl<R: Runtime> ScanCallbacks for TauriScanCallbacks<R> {
    fn on_resolved(&self, kind: IdentifierKind, resolution: ScanResolution) {
        self.send(SCAN_RESOLVED_EVENT, ResolvedPayload { kind, resolution });
    }

    fn on_unknown_format(&self, raw: &str) {
        self.send(SCAN_UNKNOWN_FORMAT_EVENT, raw.to_string());
    }

    fn on_lookup_failed(&self, identifier: &str, message: &str) {
        self.send(
            SCAN_LOOKUP_FAILED_EVENT,
            LookupFailedPayload {
                identifier: identifier.to_string(),
                message: message.to_string(),
            },
        );
    }
}

/// 经剪贴板插件读取文本
pub struct TauriClipboard<R: Runtime> {
    app: AppHandle<R>,
}

impl<R: Runtime> TauriClipboard<R> {
    pub fn new(app: AppHandle<R>) -> Self {
        Self { app }
    }
}

impl<R: Runtime> ClipboardSource for TauriClipboard<R> {
    fn read_text(&mut self) -> Result<String, AppError> {
        self.app
            .clipboard()
            .read_text()
            .map_err(|e| AppError::Clipboard(format!("读取剪贴板文本失败: {}", e)))
    }
}

/// 把窗口焦点变化转为 `watch` 信号
pub fn focus_signal<R: Runtime>(window: &WebviewWindow<R>) -> watch::Receiver<bool> {
    let initial = window.is_focused().unwrap_or(true);
    let (tx, rx) = watch::channel(initial);
    window.on_window_event(move |event| {
        if let WindowEvent::Focused(focused) = event {
            let _ = tx.send(*focused);
        }
    });
    rx
}

/// 托管状态：扫描会话 + 分发器
pub struct ScanBridgeState {
    session: Mutex<ScanSession>,
    dispatcher: Dispatcher,
}

impl ScanBridgeState {
    fn session(&self) -> MutexGuard<'_, ScanSession> {
        match self.session.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                log::warn!("扫描会话锁中毒，继续使用恢复数据");
                poisoned.into_inner()
            }
        }
    }
}

/// 创建扫描会话；`window` 存在时开启剪贴板轮询并跟随其焦点
///
/// 返回值需由宿主通过 `app.manage(...)` 注册为托管状态。
pub fn start_scanning<R: Runtime>(
    app: &AppHandle<R>,
    window: Option<&WebviewWindow<R>>,
    backend: Arc<dyn CatalogBackend>,
    settings: ScanSettings,
) -> ScanBridgeState {
    let dispatcher = Dispatcher::new(
        backend,
        Arc::new(TauriEventSink::new(app.clone())),
        Arc::new(TauriScanCallbacks::new(app.clone())),
    );

    let session = tauri::async_runtime::block_on(async {
        let mut session = ScanSession::start(settings, dispatcher.clone());
        if let Some(window) = window {
            session.watch_clipboard(TauriClipboard::new(app.clone()), Some(focus_signal(window)));
        }
        session
    });

    ScanBridgeState {
        session: Mutex::new(session),
        dispatcher,
    }
}

/// 前端转发的 `keydown`
///
/// `timestamp_ms` 为前端 `performance.now()`；同一会话内应始终提供或始终省略。
#[tauri::command]
pub fn scan_keydown(state: State<'_, ScanBridgeState>, key: String, timestamp_ms: Option<f64>) -> bool {
    let key = KeyInput::from_key_name(&key);
    let mut session = state.session();
    match timestamp_ms.and_then(|ms| Duration::try_from_secs_f64(ms / 1000.0).ok()) {
        Some(at) => session.on_key_at(key, at),
        None => session.on_key(key),
    }
}

/// 为编号流程复制条目
#[tauri::command]
pub async fn clone_for_numbering(state: State<'_, ScanBridgeState>, volume_id: String) -> Result<String, AppError> {
    state.dispatcher.clone_for_numbering(&volume_id).await
}

/// 编号设置完成后通知刷新
#[tauri::command]
pub fn mark_entry_updated(state: State<'_, ScanBridgeState>, volume_id: String) {
    state.dispatcher.mark_updated(&volume_id);
}
