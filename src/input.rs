//! 键盘输入模块（分层门面）
//!
//! - `keystroke`：扫码枪突发输入聚合状态机
//!
//! 监听本身由宿主负责：前端在捕获阶段注册 `keydown`，
//! 即使焦点位于对话框输入框内也能收到扫码输入，再把按键名与时间戳转发到这里。

#[path = "input/keystroke.rs"]
mod keystroke;

pub use keystroke::{KeyInput, KeystrokeAggregator, KeystrokeConfig, ScanState};
