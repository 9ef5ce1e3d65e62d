//! 后端命令端口
//!
//! 后端（数据库、Google Books 查询等）不在本 crate 内，
//! 这里只定义分发层需要的最小命令集合，由宿主应用注入实现。

use serde::{Deserialize, Serialize};

/// 后端命令错误
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    /// 通信失败（IPC、数据库连接不可用等）
    #[error("后端通信失败: {0}")]
    Transport(String),

    /// 后端无法解析该标识符（无查询结果、导入失败等），消息直接展示给用户
    #[error("{0}")]
    Lookup(String),
}

/// 目录条目（仅分发层需要的字段）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: String,
    pub title: String,
    /// 系列中的编号（漫画期数等），未设置时为 `None`
    #[serde(default)]
    pub number: Option<i64>,
    #[serde(default)]
    pub identifiers: Vec<String>,
}

/// 查询并入库的结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogResult {
    pub entry: CatalogEntry,
    /// 目录中与新条目同名的其他条目数量
    #[serde(default)]
    pub same_title_entries: usize,
}

impl CatalogResult {
    /// 存在同名条目时，大概率是共用 ISBN 的漫画系列，需要用户手动补编号
    pub fn needs_number(&self) -> bool {
        self.same_title_entries > 0
    }
}

/// 分发层使用的后端命令
#[async_trait::async_trait]
pub trait CatalogBackend: Send + Sync {
    /// 标识符是否已在目录中
    async fn check_exists(&self, identifier: &str) -> Result<bool, BackendError>;

    /// 联网查询标识符并写入目录
    async fn fetch_and_catalog(&self, identifier: &str) -> Result<CatalogResult, BackendError>;

    /// 按 EAN 查找已有条目
    async fn find_by_code(&self, code: &str) -> Result<Option<CatalogEntry>, BackendError>;

    /// 复制一个条目，返回新条目 ID
    async fn clone_entry(&self, entry_id: &str) -> Result<String, BackendError>;
}
