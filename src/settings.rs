//! 扫描设置模块
//!
//! # 设计思路
//!
//! 轮询间隔、突发输入阈值、ISSN 策略等“可调策略”集中到 `ScanSettings`，
//! 输入通道只读取这一份配置，保证行为可观测、可调整、可测试。
//!
//! # 实现思路
//!
//! - 设置文件沿用应用的 `{"settings": {...}}` 结构，只读写本模块关心的键，
//!   其余键（如 API Key、提示音开关）原样保留。
//! - 数值键读取后统一 clamp 到安全区间；缺失或非法的键回退到默认值。
//! - 设置文件不存在时返回默认设置，不视为错误。

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::AppError;
use crate::identifier::{Classifier, IssnPolicy, ScanContext};
use crate::scan::ScanSource;

const SETTINGS_KEY: &str = "settings";

pub const CLIPBOARD_POLL_INTERVAL_DEFAULT_MS: u64 = 500;
const CLIPBOARD_POLL_INTERVAL_MIN_MS: u64 = 100;
const CLIPBOARD_POLL_INTERVAL_MAX_MS: u64 = 10_000;

pub const SCANNER_MAX_GAP_DEFAULT_MS: u64 = 50;
const SCANNER_MAX_GAP_MIN_MS: u64 = 5;
const SCANNER_MAX_GAP_MAX_MS: u64 = 1_000;

pub const SCANNER_MAX_LENGTH_DEFAULT: usize = 32;
const SCANNER_MAX_LENGTH_MIN: usize = 8;
const SCANNER_MAX_LENGTH_MAX: usize = 256;

/// 扫描相关设置
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanSettings {
    /// 剪贴板轮询间隔（毫秒）
    pub clipboard_poll_interval_ms: u64,
    /// 窗口失焦时暂停剪贴板轮询
    pub poll_only_when_focused: bool,
    /// 扫码枪相邻按键的最大间隔（毫秒），超过即视为新一次输入
    pub scanner_max_gap_ms: u64,
    /// 单次扫描缓冲区上限（字符数）
    pub scanner_max_length: usize,
    pub issn_policy: IssnPolicy,
    /// 剪贴板通道对 13 位码的解读方式
    pub clipboard_context: ScanContext,
    /// 键盘通道对 13 位码的解读方式
    pub keyboard_context: ScanContext,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            clipboard_poll_interval_ms: CLIPBOARD_POLL_INTERVAL_DEFAULT_MS,
            poll_only_when_focused: true,
            scanner_max_gap_ms: SCANNER_MAX_GAP_DEFAULT_MS,
            scanner_max_length: SCANNER_MAX_LENGTH_DEFAULT,
            issn_policy: IssnPolicy::Strict,
            clipboard_context: ScanContext::Isbn,
            keyboard_context: ScanContext::Ean,
        }
    }
}

fn read_enum<T: DeserializeOwned>(settings: &serde_json::Value, key: &str, fallback: T) -> T {
    match settings.get(key) {
        None => fallback,
        Some(v) => serde_json::from_value(v.clone()).unwrap_or_else(|e| {
            log::warn!("⚙️ 设置项 {} 非法，使用默认值: {}", key, e);
            fallback
        }),
    }
}

impl ScanSettings {
    /// 从设置对象读取扫描设置
    ///
    /// 既接受 `{"settings": {...}}` 包裹形式，也接受直接的设置对象。
    pub fn from_value(value: &serde_json::Value) -> Self {
        let settings = value.get(SETTINGS_KEY).unwrap_or(value);
        let defaults = Self::default();

        let poll_ms = settings
            .get("clipboardPollIntervalMs")
            .and_then(|v| v.as_u64())
            .unwrap_or(defaults.clipboard_poll_interval_ms);
        let gap_ms = settings
            .get("scannerMaxGapMs")
            .and_then(|v| v.as_u64())
            .unwrap_or(defaults.scanner_max_gap_ms);
        let max_len = settings
            .get("scannerMaxLength")
            .and_then(|v| v.as_u64())
            .map(|v| usize::try_from(v).unwrap_or(usize::MAX))
            .unwrap_or(defaults.scanner_max_length);

        Self {
            clipboard_poll_interval_ms: poll_ms
                .clamp(CLIPBOARD_POLL_INTERVAL_MIN_MS, CLIPBOARD_POLL_INTERVAL_MAX_MS),
            poll_only_when_focused: settings
                .get("pollOnlyWhenFocused")
                .and_then(|v| v.as_bool())
                .unwrap_or(defaults.poll_only_when_focused),
            scanner_max_gap_ms: gap_ms.clamp(SCANNER_MAX_GAP_MIN_MS, SCANNER_MAX_GAP_MAX_MS),
            scanner_max_length: max_len.clamp(SCANNER_MAX_LENGTH_MIN, SCANNER_MAX_LENGTH_MAX),
            issn_policy: read_enum(settings, "issnPolicy", defaults.issn_policy),
            clipboard_context: read_enum(settings, "clipboardContext", defaults.clipboard_context),
            keyboard_context: read_enum(settings, "keyboardContext", defaults.keyboard_context),
        }
    }

    /// 读取设置文件；文件不存在时返回默认设置
    pub fn load_from_path(path: &Path) -> Result<Self, AppError> {
        if !path.exists() {
            log::debug!("⚙️ 设置文件不存在，使用默认扫描设置: {}", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let parsed = serde_json::from_str::<serde_json::Value>(&content)
            .map_err(|e| AppError::Settings(format!("解析设置文件失败: {}", e)))?;
        Ok(Self::from_value(&parsed))
    }

    /// 将扫描设置写回文件，保留文件中的其他设置项
    pub fn save_to_path(&self, path: &Path) -> Result<(), AppError> {
        let mut root = if path.exists() {
            let content = fs::read_to_string(path)?;
            serde_json::from_str::<serde_json::Value>(&content)
                .map_err(|e| AppError::Settings(format!("解析设置文件失败: {}", e)))?
        } else {
            serde_json::json!({})
        };

        let ours = serde_json::to_value(self)
            .map_err(|e| AppError::Settings(format!("序列化设置失败: {}", e)))?;
        let Some(root_obj) = root.as_object_mut() else {
            return Err(AppError::Settings("设置文件根节点不是对象".to_string()));
        };
        let entry = root_obj
            .entry(SETTINGS_KEY)
            .or_insert_with(|| serde_json::json!({}));
        let Some(settings_obj) = entry.as_object_mut() else {
            return Err(AppError::Settings("settings 节点不是对象".to_string()));
        };
        if let serde_json::Value::Object(fields) = ours {
            settings_obj.extend(fields);
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(&root)
            .map_err(|e| AppError::Settings(format!("序列化设置失败: {}", e)))?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.clipboard_poll_interval_ms)
    }

    pub fn scanner_max_gap(&self) -> Duration {
        Duration::from_millis(self.scanner_max_gap_ms)
    }

    /// 指定输入通道使用的识别器
    pub fn classifier_for(&self, source: ScanSource) -> Classifier {
        let context = match source {
            ScanSource::Clipboard => self.clipboard_context,
            ScanSource::Keyboard => self.keyboard_context,
        };
        Classifier::new(context, self.issn_policy)
    }
}
