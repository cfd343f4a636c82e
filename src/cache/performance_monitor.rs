use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

/// 索引缓存性能监控器
#[derive(Clone, Default)]
pub struct IndexCachePerformanceMonitor {
    metrics: Arc<IndexCacheMetrics>,
}

/// 索引缓存指标
#[derive(Default)]
pub struct IndexCacheMetrics {
    /// 缓存命中次数（索引已存在且可加载）
    pub cache_hits: AtomicUsize,
    /// 缓存未命中次数
    pub cache_misses: AtomicUsize,
    /// 索引构建次数
    pub builds: AtomicUsize,
    /// 索引失效（删除）次数
    pub invalidations: AtomicUsize,
    /// 加载失败次数
    pub load_failures: AtomicUsize,
    /// 嵌入的文档总数
    pub documents_embedded: AtomicUsize,
    /// 构建总耗时（毫秒）
    pub total_build_time_ms: AtomicU64,
    /// 按索引key的统计
    pub key_metrics: std::sync::RwLock<HashMap<String, KeyMetrics>>,
}

#[derive(Default)]
pub struct KeyMetrics {
    pub hits: AtomicU64,
    pub misses: AtomicU64,
    pub builds: AtomicU64,
    pub invalidations: AtomicU64,
    pub load_failures: AtomicU64,
}

/// 索引缓存性能报告
#[derive(Debug, Serialize, Deserialize)]
pub struct IndexCacheReport {
    pub hit_rate: f64,
    pub total_lookups: usize,
    pub cache_hits: usize,
    pub cache_misses: usize,
    pub builds: usize,
    pub invalidations: usize,
    pub load_failures: usize,
    pub documents_embedded: usize,
    /// 构建耗时（秒）
    pub build_time: f64,
    pub key_stats: BTreeMap<String, KeyCacheStats>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct KeyCacheStats {
    pub hits: u64,
    pub misses: u64,
    pub builds: u64,
    pub invalidations: u64,
    pub load_failures: u64,
}

impl IndexCachePerformanceMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_key(&self, key: &str, update: impl FnOnce(&KeyMetrics)) {
        if let Ok(mut key_map) = self.metrics.key_metrics.write() {
            update(key_map.entry(key.to_string()).or_default());
        }
    }

    /// 记录缓存命中
    pub fn record_cache_hit(&self, key: &str, document_count: usize) {
        self.metrics.cache_hits.fetch_add(1, Ordering::Relaxed);
        self.with_key(key, |m| {
            m.hits.fetch_add(1, Ordering::Relaxed);
        });
        tracing::info!(
            "   💰 索引缓存命中 [{}] - 复用{}条文档的嵌入",
            key,
            document_count
        );
    }

    /// 记录缓存未命中
    pub fn record_cache_miss(&self, key: &str) {
        self.metrics.cache_misses.fetch_add(1, Ordering::Relaxed);
        self.with_key(key, |m| {
            m.misses.fetch_add(1, Ordering::Relaxed);
        });
        tracing::info!("   ⌛ 索引缓存未命中 [{}] - 需要重新嵌入", key);
    }

    /// 记录索引构建
    pub fn record_build(&self, key: &str, document_count: usize, elapsed: Duration) {
        self.metrics.builds.fetch_add(1, Ordering::Relaxed);
        self.metrics
            .documents_embedded
            .fetch_add(document_count, Ordering::Relaxed);
        self.metrics
            .total_build_time_ms
            .fetch_add(elapsed.as_millis() as u64, Ordering::Relaxed);
        self.with_key(key, |m| {
            m.builds.fetch_add(1, Ordering::Relaxed);
        });
        tracing::info!(
            "   💾 索引写入 [{}] - {}条文档, 耗时{:.2}秒",
            key,
            document_count,
            elapsed.as_secs_f64()
        );
    }

    pub fn record_invalidation(&self, key: &str) {
        self.metrics.invalidations.fetch_add(1, Ordering::Relaxed);
        self.with_key(key, |m| {
            m.invalidations.fetch_add(1, Ordering::Relaxed);
        });
        tracing::info!("   🗑️ 索引已失效 [{}]", key);
    }

    pub fn record_load_failure(&self, key: &str, error: &str) {
        self.metrics.load_failures.fetch_add(1, Ordering::Relaxed);
        self.with_key(key, |m| {
            m.load_failures.fetch_add(1, Ordering::Relaxed);
        });
        tracing::warn!("   ❌ 索引加载失败 [{}]: {}", key, error);
    }

    /// 生成性能报告
    pub fn generate_report(&self) -> IndexCacheReport {
        let hits = self.metrics.cache_hits.load(Ordering::Relaxed);
        let misses = self.metrics.cache_misses.load(Ordering::Relaxed);
        let total_lookups = hits + misses;

        let hit_rate = if total_lookups > 0 {
            hits as f64 / total_lookups as f64
        } else {
            0.0
        };

        let key_stats = if let Ok(key_map) = self.metrics.key_metrics.read() {
            key_map
                .iter()
                .map(|(key, m)| {
                    (
                        key.clone(),
                        KeyCacheStats {
                            hits: m.hits.load(Ordering::Relaxed),
                            misses: m.misses.load(Ordering::Relaxed),
                            builds: m.builds.load(Ordering::Relaxed),
                            invalidations: m.invalidations.load(Ordering::Relaxed),
                            load_failures: m.load_failures.load(Ordering::Relaxed),
                        },
                    )
                })
                .collect()
        } else {
            BTreeMap::new()
        };

        IndexCacheReport {
            hit_rate,
            total_lookups,
            cache_hits: hits,
            cache_misses: misses,
            builds: self.metrics.builds.load(Ordering::Relaxed),
            invalidations: self.metrics.invalidations.load(Ordering::Relaxed),
            load_failures: self.metrics.load_failures.load(Ordering::Relaxed),
            documents_embedded: self.metrics.documents_embedded.load(Ordering::Relaxed),
            build_time: self.metrics.total_build_time_ms.load(Ordering::Relaxed) as f64 / 1000.0,
            key_stats,
        }
    }
}
