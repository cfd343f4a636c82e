use super::context::GeneratorContext;
use crate::index::{IndexHandle, LoadError, VectorIndex};

/// 加载索引；失败且本次运行开启恢复时，删除、重新拉取并构建，再重试一次
pub async fn load_with_recovery(
    context: &GeneratorContext,
    handle: &IndexHandle,
) -> Result<VectorIndex, LoadError> {
    let key = &handle.key;
    let error = match context.indices.open(key).await {
        Ok(index) => return Ok(index),
        Err(e) => e,
    };

    if !context.config.recovery_enabled() {
        tracing::warn!("⚠️ 索引 [{}] 加载失败，未开启恢复: {}", key, error);
        return Err(error);
    }

    tracing::warn!("🔄 索引 [{}] 加载失败，删除并重建: {}", key, error);
    if let Err(e) = context.indices.invalidate(key).await {
        tracing::error!("❌ 删除索引 [{}] 失败: {}", key, e);
        return Err(error);
    }

    match context.indices.ensure_index(handle).await {
        Ok(status) => {
            tracing::info!("✅ 索引 [{}] 已重建 ({}条文档)", key, status.document_count);
        }
        Err(e) => {
            tracing::error!("❌ 重建索引 [{}] 失败: {}", key, e);
            return Err(error);
        }
    }

    context.indices.open(key).await.inspect_err(|e| {
        tracing::error!("❌ 重建后仍无法加载索引 [{}]: {}", key, e);
    })
}
