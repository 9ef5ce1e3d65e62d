use std::sync::Arc;

use tokio::sync::mpsc;

use super::backend::{BackendError, CatalogBackend};
use super::events::{CatalogEvent, EventSink, ScanCallbacks, ScanResolution};
use super::{DispatchPlan, plan};
use crate::error::AppError;
use crate::identifier::IdentifierKind;
use crate::scan::ClassifiedScan;

/// 一次分发的结果，供日志与测试使用
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    Ignored,
    UnknownFormat,
    AlreadyCataloged,
    Cataloged { entry_id: String, needs_number: bool },
    ExistingEntry { entry_id: String },
    NewCode,
    LookupFailed { message: String },
}

/// 执行分发决策
///
/// 持有注入的后端、事件接收方与回调，可 `Clone` 后在多个任务间共享。
#[derive(Clone)]
pub struct Dispatcher {
    backend: Arc<dyn CatalogBackend>,
    events: Arc<dyn EventSink>,
    callbacks: Arc<dyn ScanCallbacks>,
}

impl Dispatcher {
    pub fn new(
        backend: Arc<dyn CatalogBackend>,
        events: Arc<dyn EventSink>,
        callbacks: Arc<dyn ScanCallbacks>,
    ) -> Self {
        Self {
            backend,
            events,
            callbacks,
        }
    }

    /// 处理一次扫描
    ///
    /// 永不返回错误：后端失败会通过 `on_lookup_failed` 通知调用方。
    pub async fn dispatch(&self, scan: &ClassifiedScan) -> DispatchOutcome {
        match plan(scan) {
            DispatchPlan::Ignore => DispatchOutcome::Ignored,
            DispatchPlan::NotifyUnknownFormat { raw } => {
                log::info!("🔎 未知条码格式: {}", raw);
                self.callbacks.on_unknown_format(&raw);
                DispatchOutcome::UnknownFormat
            }
            DispatchPlan::CheckThenCatalog { kind, identifier } => {
                self.check_then_catalog(kind, &identifier, &scan.text).await
            }
            DispatchPlan::LookupByCode { code } => self.lookup_by_code(&code, &scan.text).await,
        }
    }

    async fn check_then_catalog(
        &self,
        kind: IdentifierKind,
        identifier: &str,
        original: &str,
    ) -> DispatchOutcome {
        let exists = match self.backend.check_exists(identifier).await {
            Ok(exists) => exists,
            Err(err) => return self.report_failure(original, err),
        };
        if exists {
            log::info!("📚 {} {} 已在目录中，跳过", kind, identifier);
            self.callbacks.on_resolved(
                kind,
                ScanResolution::AlreadyCataloged {
                    identifier: identifier.to_string(),
                },
            );
            return DispatchOutcome::AlreadyCataloged;
        }

        let result = match self.backend.fetch_and_catalog(identifier).await {
            Ok(result) => result,
            Err(err) => return self.report_failure(original, err),
        };

        let needs_number = result.needs_number();
        let entry_id = result.entry.id.clone();
        if needs_number {
            log::info!("📚 {} 入库成功，疑似系列条目，等待补充编号: {}", identifier, entry_id);
            self.events.emit(CatalogEvent::PossibleNewItemWithoutNumber {
                entry: result.entry.clone(),
            });
        } else {
            log::info!("📚 {} 入库成功: {}", identifier, entry_id);
            self.events.emit(CatalogEvent::ItemAdded {
                entry_id: entry_id.clone(),
            });
        }
        self.callbacks.on_resolved(
            kind,
            ScanResolution::Cataloged {
                identifier: identifier.to_string(),
                entry: result.entry,
            },
        );
        DispatchOutcome::Cataloged {
            entry_id,
            needs_number,
        }
    }

    async fn lookup_by_code(&self, code: &str, original: &str) -> DispatchOutcome {
        match self.backend.find_by_code(code).await {
            Ok(Some(entry)) => {
                log::info!("📚 EAN {} 对应已有条目 {}", code, entry.id);
                let entry_id = entry.id.clone();
                self.events.emit(CatalogEvent::PossibleNewItemWithoutNumber {
                    entry: entry.clone(),
                });
                self.callbacks.on_resolved(
                    IdentifierKind::Ean13,
                    ScanResolution::ExistingEntry {
                        code: code.to_string(),
                        entry,
                    },
                );
                DispatchOutcome::ExistingEntry { entry_id }
            }
            Ok(None) => {
                log::info!("📚 EAN {} 未收录，需要手动录入", code);
                self.callbacks.on_resolved(
                    IdentifierKind::Ean13,
                    ScanResolution::NewCode {
                        code: code.to_string(),
                    },
                );
                DispatchOutcome::NewCode
            }
            Err(err) => self.report_failure(original, err),
        }
    }

    fn report_failure(&self, original: &str, err: BackendError) -> DispatchOutcome {
        match &err {
            BackendError::Transport(_) => log::warn!("🔎 处理 {} 时后端不可用: {}", original, err),
            BackendError::Lookup(_) => log::info!("🔎 {} 查询失败: {}", original, err),
        }
        let message = err.to_string();
        self.callbacks.on_lookup_failed(original, &message);
        DispatchOutcome::LookupFailed { message }
    }

    /// 为编号流程复制条目，返回新条目 ID
    pub async fn clone_for_numbering(&self, entry_id: &str) -> Result<String, AppError> {
        let new_id = self.backend.clone_entry(entry_id).await?;
        log::info!("📚 已复制条目 {} -> {}", entry_id, new_id);
        self.events.emit(CatalogEvent::ItemAdded {
            entry_id: new_id.clone(),
        });
        Ok(new_id)
    }

    /// 调用方完成编号等修改后通知其他界面刷新
    pub fn mark_updated(&self, entry_id: &str) {
        self.events.emit(CatalogEvent::ItemUpdated {
            entry_id: entry_id.to_string(),
        });
    }
}

/// 按到达顺序逐个分发扫描，所有发送端关闭后退出
pub async fn run_dispatch_loop(dispatcher: Dispatcher, mut rx: mpsc::UnboundedReceiver<ClassifiedScan>) {
    while let Some(scan) = rx.recv().await {
        let outcome = dispatcher.dispatch(&scan).await;
        log::debug!("🔎 {:?} 扫描 {} 处理完成: {:?}", scan.source, scan.text, outcome);
    }
    log::debug!("🔎 扫描通道已关闭，分发循环退出");
}
