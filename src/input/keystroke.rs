//! 扫码枪突发输入聚合
//!
//! # 设计思路
//!
//! 键盘式扫码枪把条码当作一串极快的按键发送（相邻按键通常 <10ms），
//! 人手输入则一般 >100ms。以按键间隔作为分段信号，
//! 把一次突发输入还原为一次完整扫描，回车作为结束符。
//!
//! # 实现思路
//!
//! - 状态：`Idle`（空缓冲）→ `Accumulating`（有内容）→ 回车 / 超时 / 溢出后回到 `Idle`。
//! - 间隔超过阈值时先清空缓冲，再处理当前按键。
//! - 只接受数字、`x`/`X` 与连字符；其他按键直接忽略，不清空缓冲，也不刷新计时基准。
//! - 缓冲超过上限时整体丢弃并进入 `Discarding`，本次突发余下的字符也一并丢弃，
//!   避免把半截垃圾输入交给识别器。
//! - 时间戳由调用方传入（任意单调起点的 `Duration`），便于测试与跨进程转发。

use std::time::{Duration, Instant};

use crate::identifier::Classifier;
use crate::scan::{ClassifiedScan, RawScan, ScanSource};
use crate::settings::{SCANNER_MAX_GAP_DEFAULT_MS, SCANNER_MAX_LENGTH_DEFAULT, ScanSettings};

/// 一次按键
///
/// 与 DOM `KeyboardEvent.key` 的取值保持一致，方便前端直接转发。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyInput {
    Char(char),
    Enter,
    /// 修饰键、功能键等
    Other,
}

impl KeyInput {
    /// 按 `KeyboardEvent.key` 名称解析
    pub fn from_key_name(key: &str) -> Self {
        if key == "Enter" {
            return KeyInput::Enter;
        }
        let mut chars = key.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => KeyInput::Char(c),
            _ => KeyInput::Other,
        }
    }
}

fn is_scan_char(c: char) -> bool {
    c.is_ascii_digit() || c == 'x' || c == 'X' || c == '-'
}

/// 聚合器状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    Idle,
    Accumulating,
    /// 缓冲溢出，丢弃本次突发余下的输入
    Discarding,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeystrokeConfig {
    /// 相邻按键最大间隔
    pub max_gap: Duration,
    /// 缓冲区字符上限
    pub max_len: usize,
}

impl Default for KeystrokeConfig {
    fn default() -> Self {
        Self {
            max_gap: Duration::from_millis(SCANNER_MAX_GAP_DEFAULT_MS),
            max_len: SCANNER_MAX_LENGTH_DEFAULT,
        }
    }
}

impl From<&ScanSettings> for KeystrokeConfig {
    fn from(settings: &ScanSettings) -> Self {
        Self {
            max_gap: settings.scanner_max_gap(),
            max_len: settings.scanner_max_length,
        }
    }
}

/// 按键聚合状态机
///
/// 每个实例独占自己的缓冲区，可以并存多个互不干扰的实例。
///
/// # 示例
/// ```rust
/// use std::time::Duration;
/// use scan_catalog::identifier::{Classifier, IdentifierKind};
/// use scan_catalog::input::{KeyInput, KeystrokeAggregator, KeystrokeConfig};
///
/// let mut agg = KeystrokeAggregator::new(KeystrokeConfig::default(), Classifier::default());
/// let mut at = Duration::ZERO;
/// for c in "0306406152".chars() {
///     assert!(agg.on_key(KeyInput::Char(c), at).is_none());
///     at += Duration::from_millis(5);
/// }
/// let scan = agg.on_key(KeyInput::Enter, at).unwrap();
/// assert_eq!(scan.classification.kind(), IdentifierKind::Isbn10);
/// ```
#[derive(Debug)]
pub struct KeystrokeAggregator {
    config: KeystrokeConfig,
    classifier: Classifier,
    buffer: String,
    last_key_at: Option<Duration>,
    discarding: bool,
    origin: Instant,
}

impl KeystrokeAggregator {
    pub fn new(config: KeystrokeConfig, classifier: Classifier) -> Self {
        Self {
            config,
            classifier,
            buffer: String::with_capacity(config.max_len),
            last_key_at: None,
            discarding: false,
            origin: Instant::now(),
        }
    }

    pub fn from_settings(settings: &ScanSettings) -> Self {
        Self::new(
            KeystrokeConfig::from(settings),
            settings.classifier_for(ScanSource::Keyboard),
        )
    }

    pub fn state(&self) -> ScanState {
        if self.discarding {
            ScanState::Discarding
        } else if self.buffer.is_empty() {
            ScanState::Idle
        } else {
            ScanState::Accumulating
        }
    }

    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    pub fn reset(&mut self) {
        self.buffer.clear();
        self.discarding = false;
        self.last_key_at = None;
    }

    /// 以实例创建时刻为起点，用当前时间处理按键
    pub fn on_key_now(&mut self, key: KeyInput) -> Option<ClassifiedScan> {
        let at = self.origin.elapsed();
        self.on_key(key, at)
    }

    /// 处理一次按键
    ///
    /// 仅在回车结束一次有效扫描时返回识别结果。
    pub fn on_key(&mut self, key: KeyInput, at: Duration) -> Option<ClassifiedScan> {
        let accepted = match key {
            KeyInput::Enter => None,
            KeyInput::Char(c) if is_scan_char(c) => Some(c),
            _ => return None,
        };

        let gap_exceeded = self
            .last_key_at
            .map(|prev| at.saturating_sub(prev) > self.config.max_gap)
            .unwrap_or(true);
        if gap_exceeded && (!self.buffer.is_empty() || self.discarding) {
            log::debug!("⌨️ 按键间隔超过 {:?}，丢弃未完成的输入: {:?}", self.config.max_gap, self.buffer);
        }
        if gap_exceeded {
            self.buffer.clear();
            self.discarding = false;
        }
        self.last_key_at = Some(at);

        let Some(c) = accepted else {
            return self.finish();
        };

        if self.discarding {
            return None;
        }
        if self.buffer.len() < self.config.max_len {
            self.buffer.push(c);
        } else {
            log::warn!("⌨️ 扫描输入超过 {} 个字符，整体丢弃", self.config.max_len);
            self.buffer.clear();
            self.discarding = true;
        }
        None
    }

    fn finish(&mut self) -> Option<ClassifiedScan> {
        let text = self.buffer.trim().to_string();
        self.buffer.clear();
        self.discarding = false;

        if text.is_empty() {
            return None;
        }
        let scan = RawScan::new(ScanSource::Keyboard, text).classify(&self.classifier);
        log::debug!("⌨️ 扫码完成: {} -> {}", scan.text, scan.classification.kind());
        Some(scan)
    }
}
