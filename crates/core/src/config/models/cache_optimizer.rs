use serde::{Deserialize, Serialize};

/// 缓存配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CacheConfig {
    /// LRU缓存的字节预算
    pub max_size_bytes: u64,
    /// 结果缓存的存活时间（秒）
    pub result_ttl_seconds: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_size_bytes: 100 * 1024 * 1024,
            result_ttl_seconds: 3600,
        }
    }
}

impl CacheConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.max_size_bytes == 0 {
            return Err(anyhow::anyhow!("缓存字节预算必须大于0"));
        }

        if self.result_ttl_seconds == 0 {
            return Err(anyhow::anyhow!("结果缓存存活时间必须大于0"));
        }

        Ok(())
    }
}

/// 优化层配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OptimizerConfig {
    /// 每种文件类型保留的历史样本数
    pub history_cap: usize,
    /// 强制开启或关闭GPU加速；为空时自动探测
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gpu_enabled: Option<bool>,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            history_cap: 1000,
            gpu_enabled: None,
        }
    }
}

impl OptimizerConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.history_cap == 0 {
            return Err(anyhow::anyhow!("历史样本上限必须大于0"));
        }

        Ok(())
    }
}
