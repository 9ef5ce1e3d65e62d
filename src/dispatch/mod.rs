//! 扫描分发模块
//!
//! # 设计思路
//!
//! 识别结果到后端调用之间只有一张很小的决策表：
//!
//! | 识别结果 | 动作 |
//! |----------|------|
//! | ISBN-10 / ISBN-13 / ISSN | 先查是否已收录，未收录再查询入库 |
//! | EAN-13 | 按条码查找已有条目，找到走编号流程，找不到提示手动录入 |
//! | 未知数字、校验失败的 ISSN | 低优先级提示“未知条码格式”，不调用后端 |
//! | 非条码 | 静默忽略 |
//!
//! “该做什么”由纯函数 [`plan`] 决定，“怎么做”由 [`Dispatcher`] 执行，
//! 两者分开便于在不接后端的情况下穷尽测试决策表。
//!
//! # 实现思路
//!
//! - 后端、事件、回调都以 trait 对象注入，宿主应用决定具体实现。
//! - 后端失败只影响当前这一次扫描：记录日志、回调通知，不向输入通道传播。

mod backend;
mod dispatcher;
mod events;

pub use backend::{BackendError, CatalogBackend, CatalogEntry, CatalogResult};
pub use dispatcher::{DispatchOutcome, Dispatcher, run_dispatch_loop};
pub use events::{
    BOOK_ADDED_EVENT, BOOK_UPDATED_EVENT, CatalogEvent, EventSink, LogEventSink,
    POSSIBLE_COMIC_FOUND_EVENT, ScanCallbacks, ScanResolution,
};

use crate::identifier::{IdentifierClassification, IdentifierKind};
use crate::scan::ClassifiedScan;

/// 对一次扫描应采取的动作
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchPlan {
    /// 先确认是否已收录，未收录再查询入库（ISBN、ISSN）
    CheckThenCatalog {
        kind: IdentifierKind,
        identifier: String,
    },
    /// 按条码查找已有条目（EAN-13）
    LookupByCode { code: String },
    /// 提示未知条码格式
    NotifyUnknownFormat { raw: String },
    Ignore,
}

/// 根据识别结果决定下一步动作
///
/// 后端收到的是规范化后的数字串，提示信息使用原文。
/// 8 位日期、编号等大多过不了 ISSN 校验，校验失败的候选按未知格式处理。
pub fn plan(scan: &ClassifiedScan) -> DispatchPlan {
    match &scan.classification {
        IdentifierClassification::Issn {
            checksum_valid: Some(false),
            ..
        } => DispatchPlan::NotifyUnknownFormat {
            raw: scan.text.clone(),
        },
        IdentifierClassification::Isbn10 { digits }
        | IdentifierClassification::Isbn13 { digits }
        | IdentifierClassification::Issn { digits, .. } => DispatchPlan::CheckThenCatalog {
            kind: scan.classification.kind(),
            identifier: digits.clone(),
        },
        IdentifierClassification::Ean13 { digits } => DispatchPlan::LookupByCode {
            code: digits.clone(),
        },
        IdentifierClassification::NumericUnrecognized { .. } => DispatchPlan::NotifyUnknownFormat {
            raw: scan.text.clone(),
        },
        IdentifierClassification::NotABarcode => DispatchPlan::Ignore,
    }
}
