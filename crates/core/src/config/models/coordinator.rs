use serde::{Deserialize, Serialize};

/// 协调器配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CoordinatorConfig {
    /// 从任务队列取任务时的最长等待时间（毫秒）
    pub queue_wait_ms: u64,
    /// 没有健康Worker时重新入队后的等待时间（毫秒）
    pub no_worker_backoff_ms: u64,
    /// Worker心跳超时（秒）
    pub heartbeat_timeout_seconds: i64,
    /// 批量提交任务时的默认最大重试次数
    pub default_max_retries: u32,
    /// Worker选择策略
    pub dispatch_strategy: DispatchStrategyKind,
    /// 本地Worker的起始端口
    pub base_port: u16,
    /// 本地Worker的主机名
    pub worker_hostname: String,
    /// 是否把终态结果发布到消息队列的 `results` 目的地，
    /// 需要有消费者读取，否则队列会积满
    pub publish_results: bool,
    /// 失败重试的退避配置
    pub retry: RetryConfig,
}

/// Worker选择策略类型
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DispatchStrategyKind {
    /// 选择利用率最低的健康Worker
    LeastUtilized,
    /// 按历史耗时估算完成时间最短的Worker
    Adaptive,
}

/// 重试退避配置
///
/// 默认 `base_delay_ms = 0`，即失败任务立即回到其优先级队尾，不做退避。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RetryConfig {
    /// 基础重试间隔（毫秒），0表示不退避
    pub base_delay_ms: u64,
    /// 最大重试间隔（毫秒）
    pub max_delay_ms: u64,
    /// 指数退避倍数
    pub backoff_multiplier: f64,
    /// 重试间隔的随机抖动范围（0.0-1.0）
    pub jitter_factor: f64,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            queue_wait_ms: 1000,
            no_worker_backoff_ms: 1000,
            heartbeat_timeout_seconds: 60,
            default_max_retries: 3,
            dispatch_strategy: DispatchStrategyKind::LeastUtilized,
            base_port: 5000,
            worker_hostname: "localhost".to_string(),
            publish_results: false,
            retry: RetryConfig::default(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            base_delay_ms: 0,
            max_delay_ms: 30_000,
            backoff_multiplier: 2.0,
            jitter_factor: 0.0,
        }
    }
}

impl CoordinatorConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.queue_wait_ms == 0 {
            return Err(anyhow::anyhow!("队列等待时间必须大于0"));
        }

        if self.heartbeat_timeout_seconds <= 0 {
            return Err(anyhow::anyhow!("Worker心跳超时时间必须大于0"));
        }

        if self.worker_hostname.is_empty() {
            return Err(anyhow::anyhow!("Worker主机名不能为空"));
        }

        self.retry.validate()?;

        Ok(())
    }
}

impl RetryConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.backoff_multiplier < 1.0 {
            return Err(anyhow::anyhow!(
                "退避倍数必须不小于1.0: {}",
                self.backoff_multiplier
            ));
        }

        if !(0.0..=1.0).contains(&self.jitter_factor) {
            return Err(anyhow::anyhow!(
                "抖动系数必须在0.0到1.0之间: {}",
                self.jitter_factor
            ));
        }

        if self.base_delay_ms > 0 && self.max_delay_ms < self.base_delay_ms {
            return Err(anyhow::anyhow!("最大重试间隔不能小于基础重试间隔"));
        }

        Ok(())
    }

    /// 是否启用了退避
    pub fn is_enabled(&self) -> bool {
        self.base_delay_ms > 0
    }
}
