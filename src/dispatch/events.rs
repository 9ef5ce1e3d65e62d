//! 分发结果的对外通知
//!
//! - `EventSink`：目录变化事件，发出即忘，供其他界面刷新
//! - `ScanCallbacks`：本次扫描的处理结果，交给发起扫描的调用方

use serde::Serialize;

use super::backend::CatalogEntry;
use crate::identifier::IdentifierKind;

pub const BOOK_ADDED_EVENT: &str = "book-added";
pub const BOOK_UPDATED_EVENT: &str = "book-updated";
pub const POSSIBLE_COMIC_FOUND_EVENT: &str = "possible-comic-found";

/// 目录变化事件
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogEvent {
    ItemAdded { entry_id: String },
    ItemUpdated { entry_id: String },
    /// 找到可能属于已有系列的新条目，但缺少编号，需要用户补充
    PossibleNewItemWithoutNumber { entry: CatalogEntry },
}

impl CatalogEvent {
    /// 事件名，与前端监听的名称一致
    pub fn name(&self) -> &'static str {
        match self {
            CatalogEvent::ItemAdded { .. } => BOOK_ADDED_EVENT,
            CatalogEvent::ItemUpdated { .. } => BOOK_UPDATED_EVENT,
            CatalogEvent::PossibleNewItemWithoutNumber { .. } => POSSIBLE_COMIC_FOUND_EVENT,
        }
    }

    /// 事件负载：新增/更新为条目 ID，缺编号时为完整条目
    pub fn payload(&self) -> serde_json::Value {
        match self {
            CatalogEvent::ItemAdded { entry_id } | CatalogEvent::ItemUpdated { entry_id } => {
                serde_json::Value::String(entry_id.clone())
            }
            CatalogEvent::PossibleNewItemWithoutNumber { entry } => {
                serde_json::to_value(entry).unwrap_or(serde_json::Value::Null)
            }
        }
    }
}

/// 目录事件接收方
///
/// 发送失败由实现方自行记录，不影响分发流程。
pub trait EventSink: Send + Sync {
    fn emit(&self, event: CatalogEvent);
}

/// 一次扫描的最终处理结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum ScanResolution {
    /// 已在目录中，未做任何操作
    AlreadyCataloged { identifier: String },
    /// 查询并入库成功
    Cataloged {
        identifier: String,
        entry: CatalogEntry,
    },
    /// EAN 对应已有条目，交给调用方走编号 / 变体流程
    ExistingEntry { code: String, entry: CatalogEntry },
    /// EAN 未收录，需要手动录入
    NewCode { code: String },
}

/// 发起扫描的调用方（通常是界面层）
pub trait ScanCallbacks: Send + Sync {
    fn on_resolved(&self, kind: IdentifierKind, resolution: ScanResolution);

    /// 纯数字但格式未知，低优先级提示
    fn on_unknown_format(&self, raw: &str);

    /// 查询失败，携带原始标识符以便调用方提供“仍然添加”
    fn on_lookup_failed(&self, identifier: &str, message: &str);
}

/// 只写日志的事件接收方，用于无界面运行
#[derive(Debug, Default, Clone, Copy)]
pub struct LogEventSink;

impl EventSink for LogEventSink {
    fn emit(&self, event: CatalogEvent) {
        log::info!("📚 目录事件 {}: {}", event.name(), event.payload());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry() -> CatalogEntry {
        CatalogEntry {
            id: "vol-1".into(),
            title: "Dylan Dog".into(),
            number: None,
            identifiers: vec!["9771121580009".into()],
        }
    }

    #[test]
    fn event_names_match_frontend_listeners() {
        assert_eq!(
            CatalogEvent::ItemAdded { entry_id: "a".into() }.name(),
            "book-added"
        );
        assert_eq!(
            CatalogEvent::ItemUpdated { entry_id: "a".into() }.name(),
            "book-updated"
        );
        assert_eq!(
            CatalogEvent::PossibleNewItemWithoutNumber { entry: entry() }.name(),
            "possible-comic-found"
        );
    }

    #[test]
    fn payloads_carry_id_or_entry() {
        assert_eq!(
            CatalogEvent::ItemAdded { entry_id: "vol-9".into() }.payload(),
            serde_json::json!("vol-9")
        );
        let payload = CatalogEvent::PossibleNewItemWithoutNumber { entry: entry() }.payload();
        assert_eq!(payload["title"], "Dylan Dog");
        assert!(payload["number"].is_null());
    }

    #[test]
    fn resolution_serializes_with_status_tag() {
        let json = serde_json::to_value(ScanResolution::NewCode {
            code: "4006381333931".into(),
        })
        .unwrap();
        assert_eq!(json["status"], "newCode");
        assert_eq!(json["code"], "4006381333931");
    }
}
