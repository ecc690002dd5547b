use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use extraction_core::{
    generate_task_id, AppConfig, DistributedMetrics, DistributedResult, Metadata,
    MetadataExtractor,
};
use extraction_dispatcher::{register_local_workers, DistributedCoordinator};
use extraction_infrastructure::{
    CacheStats, FileStatExtractor, InMemoryMessageQueue, MetricsCollector, ResultCache,
    SmartCacheManager,
};
use extraction_optimizer::OptimizationEngine;
use serde::Serialize;
use tokio::signal;
use tracing::{debug, info, warn};

/// 命中元数据缓存时结果中记录的Worker
pub const CACHE_WORKER_ID: &str = "cache";

/// 一次 `run` 的输出
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// 本次调度产生的结果，加上命中缓存的文件
    pub results: Vec<DistributedResult>,
    /// 直接取自缓存的文件数
    pub cached: usize,
    pub metrics: DistributedMetrics,
    /// 元数据缓存的统计
    pub cache: CacheStats,
}

/// 主应用程序
///
/// 持有配置、优化层和两级缓存。优化层在多次运行之间共享，
/// 预测器会随着运行积累历史耗时。
///
/// 缓存查找顺序：结果缓存（按TTL过期），然后是按字节预算淘汰的
/// 元数据缓存。两者都以文件路径加修改时间为键，文件变化后自然失效。
pub struct Application {
    config: AppConfig,
    optimizer: OptimizationEngine,
    result_cache: ResultCache,
    metadata_cache: SmartCacheManager<Metadata>,
    metrics: MetricsCollector,
}

impl Application {
    pub fn new(config: AppConfig) -> Self {
        info!(
            "初始化应用程序，调度策略: {:?}",
            config.coordinator.dispatch_strategy
        );

        let optimizer = OptimizationEngine::from_config(&config.optimizer);
        let result_cache =
            ResultCache::new(Duration::from_secs(config.cache.result_ttl_seconds));
        let metadata_cache = SmartCacheManager::new(config.cache.max_size_bytes);

        Self {
            config,
            optimizer,
            result_cache,
            metadata_cache,
            metrics: MetricsCollector::new(),
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn result_cache(&self) -> &ResultCache {
        &self.result_cache
    }

    pub fn metadata_cache(&self) -> &SmartCacheManager<Metadata> {
        &self.metadata_cache
    }

    /// 按配置创建协调器，使用内存消息队列并启用优化层
    pub fn build_coordinator(&self) -> DistributedCoordinator {
        DistributedCoordinator::with_config(
            self.config.coordinator.clone(),
            Arc::new(InMemoryMessageQueue::new()),
        )
        .with_optimizer(self.optimizer.clone())
    }

    /// 排序批次并分配给Worker，不执行提取
    pub fn plan<S: AsRef<str>>(
        &self,
        file_paths: &[S],
        num_workers: usize,
    ) -> BTreeMap<usize, Vec<String>> {
        self.optimizer.optimize_batch(file_paths, num_workers)
    }

    /// 运行一批提取
    ///
    /// 缓存中仍然有效的文件不会重新提取；成功的结果写回两级缓存。
    pub async fn run<S: AsRef<str>>(
        &self,
        coordinator: &DistributedCoordinator,
        file_paths: &[S],
        extractor: &dyn MetadataExtractor,
        num_workers: usize,
    ) -> RunReport {
        let mut cached_results = Vec::new();
        let mut pending = Vec::new();
        for path in file_paths {
            let path = path.as_ref();
            match self.lookup_cached(path) {
                Some(result) => cached_results.push(result),
                None => pending.push(path.to_string()),
            }
        }

        if !cached_results.is_empty() {
            info!("{} 个文件命中缓存", cached_results.len());
        }

        let num_workers = register_local_workers(coordinator, num_workers).await;
        let task_ids = coordinator.add_tasks_batch(&pending).await;
        info!(
            "开始分布式提取: {} 个文件, {} 个Worker",
            pending.len(),
            num_workers
        );
        let (results, metrics) = coordinator.process_tasks(extractor).await;

        let paths: HashMap<&str, &str> = task_ids
            .iter()
            .map(String::as_str)
            .zip(pending.iter().map(String::as_str))
            .collect();
        for result in results.iter().filter(|r| r.success) {
            if let Some(path) = paths.get(result.task_id.as_str()) {
                self.store(path, result);
            }
        }

        let cached = cached_results.len();
        let mut all_results = cached_results;
        all_results.extend(results);

        RunReport {
            results: all_results,
            cached,
            metrics,
            cache: self.metadata_cache.get_stats(),
        }
    }

    fn lookup_cached(&self, file_path: &str) -> Option<DistributedResult> {
        if let Some(result) = self.result_cache.get(file_path) {
            self.metrics.record_cache_lookup(true);
            return Some(result);
        }

        let key = ResultCache::get_key(file_path);
        let hit = self.metadata_cache.get(&key).map(|metadata| {
            debug!("元数据缓存命中: {}", file_path);
            DistributedResult::success(generate_task_id(), CACHE_WORKER_ID, metadata, 0.0)
        });
        self.metrics.record_cache_lookup(hit.is_some());
        hit
    }

    fn store(&self, file_path: &str, result: &DistributedResult) {
        self.result_cache.set(file_path, result.clone());

        match serde_json::to_vec(&result.metadata) {
            Ok(bytes) => self.metadata_cache.put(
                &ResultCache::get_key(file_path),
                result.metadata.clone(),
                bytes.len() as u64,
            ),
            Err(e) => warn!("元数据无法序列化，跳过缓存: {} ({})", file_path, e),
        }
    }

    /// 用文件属性提取器运行一批文件，Ctrl+C 时停止分配新任务
    pub async fn run_files<S: AsRef<str>>(
        &self,
        file_paths: &[S],
        num_workers: usize,
    ) -> Result<RunReport> {
        let coordinator = Arc::new(self.build_coordinator());

        let signal_handle = {
            let coordinator = Arc::clone(&coordinator);
            tokio::spawn(async move {
                match signal::ctrl_c().await {
                    Ok(()) => {
                        info!("收到Ctrl+C信号，停止分配新任务");
                        coordinator.shutdown();
                    }
                    Err(e) => warn!("安装Ctrl+C信号处理器失败: {e}"),
                }
            })
        };

        let report = self
            .run(&coordinator, file_paths, &FileStatExtractor::new(), num_workers)
            .await;
        signal_handle.abort();

        let remaining = coordinator.queue_len().await;
        if remaining > 0 {
            warn!("调度已停止，{} 个任务未处理", remaining);
        }

        Ok(report)
    }
}
