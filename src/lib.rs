//! # 扫码录入 — 库入口
//!
//! ## 架构总览
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                  输入通道                                 │
//! │                                                          │
//! │  clipboard ── 定时轮询 + 变化检测                         │
//! │  input ────── 扫码枪突发按键聚合（回车结束）              │
//! │       │                                                  │
//! │       ↓  RawScan                                         │
//! │  identifier ─ ISBN-10 / ISBN-13 / ISSN / EAN-13 识别      │
//! │       │                                                  │
//! │       ↓  ClassifiedScan (mpsc)                           │
//! │  dispatch ─── 决策表 + 后端端口 + 事件 / 回调             │
//! └───────┼──────────────────────────────────────────────────┘
//!         ↕ CatalogBackend（由宿主注入）
//! ┌───────┼──────────────────────────────────────────────────┐
//! │  后端：查询、入库、按 EAN 查找、复制条目                  │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## 模块职责
//!
//! | 模块 | 职责 |
//! |------|------|
//! | [`error`] | 统一错误类型 `AppError` |
//! | [`identifier`] | 纯函数识别与校验位计算 |
//! | [`scan`] | 扫描记录 `RawScan` / `ClassifiedScan` |
//! | [`clipboard`] | 剪贴板读取抽象与轮询任务 |
//! | [`input`] | 扫码枪按键聚合状态机 |
//! | [`dispatch`] | 分发决策、后端端口、目录事件与调用方回调 |
//! | [`session`] | 组装输入通道与分发循环，管理生命周期 |
//! | [`settings`] | 扫描相关设置的读取、校正与保存 |
//! | `bridge` | Tauri 适配（`tauri-bridge` feature） |

pub mod clipboard;
pub mod dispatch;
pub mod error;
pub mod identifier;
pub mod input;
pub mod scan;
pub mod session;
pub mod settings;

#[cfg(feature = "tauri-bridge")]
pub mod bridge;
