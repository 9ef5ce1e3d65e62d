//! 扫描记录
//!
//! 一次剪贴板变化或一次键盘突发输入都会产生一条 `RawScan`，
//! 识别后成为 `ClassifiedScan` 交给分发层，处理完即丢弃。

use serde::Serialize;

use crate::identifier::{Classifier, IdentifierClassification};

/// 扫描来源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanSource {
    Clipboard,
    Keyboard,
}

/// 原始扫描文本
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawScan {
    pub source: ScanSource,
    pub raw: String,
    pub trimmed: String,
}

impl RawScan {
    pub fn new(source: ScanSource, raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let trimmed = raw.trim().to_string();
        Self {
            source,
            raw,
            trimmed,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.trimmed.is_empty()
    }

    /// 使用给定识别器识别去除空白后的文本
    pub fn classify(self, classifier: &Classifier) -> ClassifiedScan {
        let classification = classifier.classify(&self.trimmed);
        ClassifiedScan {
            source: self.source,
            text: self.trimmed,
            classification,
        }
    }
}

/// 已识别的扫描结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassifiedScan {
    pub source: ScanSource,
    /// 去除首尾空白后的原文
    pub text: String,
    pub classification: IdentifierClassification,
}
