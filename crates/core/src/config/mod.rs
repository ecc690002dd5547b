//! 配置管理
//!
//! 配置加载顺序：
//! 1. 内置默认值
//! 2. TOML 配置文件
//! 3. 环境变量覆盖（前缀 `EXTRACTION_`，分隔符 `__`）
//!
//! 加载后统一调用 `validate()`，任何非法值都会以 `anyhow` 错误返回。

pub mod models;

pub use models::*;
