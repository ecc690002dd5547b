use std::time::Duration;

use extraction_core::RetryConfig;

/// 失败任务的重试退避
///
/// 默认配置下 `delay_for` 恒为0，失败任务立即回到其优先级队尾。
#[derive(Debug, Clone, Default)]
pub struct RetryPolicy {
    config: RetryConfig,
}

impl RetryPolicy {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    pub fn is_enabled(&self) -> bool {
        self.config.is_enabled()
    }

    /// 第 `retries` 次重试前的等待时间（`retries` 从1开始）
    pub fn delay_for(&self, retries: u32) -> Duration {
        if !self.is_enabled() {
            return Duration::ZERO;
        }

        let base = self.config.base_delay_ms as f64;
        let max = self.config.max_delay_ms as f64;
        let exponent = retries.saturating_sub(1).min(i32::MAX as u32) as i32;

        // 指数退避，限制最大间隔
        let capped = (base * self.config.backoff_multiplier.powi(exponent)).min(max);

        // 随机抖动，避免同时失败的任务一起重试
        let jitter = capped * self.config.jitter_factor * (rand::random::<f64>() - 0.5) * 2.0;
        let delay_ms = (capped + jitter).max(base).min(max.max(base));

        Duration::from_millis(delay_ms as u64)
    }
}
