//! 临时存储 - 基础设施层
//!
//! OCR 服务只能处理已存储的对象，所以每个文档处理前先写入临时存储，
//! 处理后删除。键由调用方保证唯一（批次 ID + 文档序号）。

use crate::error::StorageError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::RwLock;
use tracing::debug;

/// 已存储对象的引用，交给 OCR 服务使用
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageRef {
    pub key: String,
    /// OCR 服务可以访问的位置
    pub uri: String,
}

/// 临时存储
#[async_trait]
pub trait ScratchStore: Send + Sync {
    async fn put(&self, key: &str, bytes: Vec<u8>) -> Result<StorageRef, StorageError>;

    async fn get(&self, key: &str) -> Result<Vec<u8>, StorageError>;

    async fn delete(&self, key: &str) -> Result<(), StorageError>;

    async fn exists(&self, key: &str) -> Result<bool, StorageError>;

    /// 批次结束后释放批次级资源（所有文档都已清理）
    async fn release_run(&self, _run_id: &str) -> Result<(), StorageError> {
        Ok(())
    }
}

/// 内存存储
#[derive(Debug, Default)]
pub struct MemoryStore {
    objects: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 当前对象数量
    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }
}

#[async_trait]
impl ScratchStore for MemoryStore {
    async fn put(&self, key: &str, bytes: Vec<u8>) -> Result<StorageRef, StorageError> {
        self.objects.write().await.insert(key.to_string(), bytes);
        Ok(StorageRef {
            key: key.to_string(),
            uri: format!("memory://{}", key),
        })
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        self.objects
            .read()
            .await
            .get(key)
            .cloned()
            .ok_or_else(|| StorageError::NotFound {
                key: key.to_string(),
            })
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        match self.objects.write().await.remove(key) {
            Some(_) => Ok(()),
            None => Err(StorageError::NotFound {
                key: key.to_string(),
            }),
        }
    }

    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        Ok(self.objects.read().await.contains_key(key))
    }
}

/// 本地目录存储
///
/// 键中的 `/` 对应子目录，每个批次一个子目录
#[derive(Debug, Clone)]
pub struct LocalDirStore {
    root: PathBuf,
}

impl LocalDirStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> PathBuf {
        key.split('/')
            .filter(|part| !part.is_empty() && *part != "..")
            .fold(self.root.clone(), |path, part| path.join(part))
    }
}

#[async_trait]
impl ScratchStore for LocalDirStore {
    async fn put(&self, key: &str, bytes: Vec<u8>) -> Result<StorageRef, StorageError> {
        let path = self.path_for(key);
        let put_failed = |e: std::io::Error| StorageError::PutFailed {
            key: key.to_string(),
            message: e.to_string(),
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.map_err(put_failed)?;
        }
        fs::write(&path, bytes).await.map_err(put_failed)?;

        let absolute = fs::canonicalize(&path).await.unwrap_or(path);
        debug!("写入临时文件: {}", absolute.display());

        Ok(StorageRef {
            key: key.to_string(),
            uri: format!("file://{}", absolute.display()),
        })
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        fs::read(self.path_for(key)).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StorageError::NotFound {
                    key: key.to_string(),
                }
            } else {
                StorageError::GetFailed {
                    key: key.to_string(),
                    message: e.to_string(),
                }
            }
        })
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key);
        fs::remove_file(&path)
            .await
            .map_err(|e| StorageError::DeleteFailed {
                key: key.to_string(),
                message: e.to_string(),
            })
    }

    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        fs::try_exists(self.path_for(key))
            .await
            .map_err(|e| StorageError::GetFailed {
                key: key.to_string(),
                message: e.to_string(),
            })
    }

    /// 删除空的批次目录
    ///
    /// 同一批次的文档共用这个目录，只能在所有文档都结束后删除
    async fn release_run(&self, run_id: &str) -> Result<(), StorageError> {
        let dir = self.path_for(run_id);
        if dir == self.root {
            return Ok(());
        }
        match fs::remove_dir(&dir).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::DeleteFailed {
                key: run_id.to_string(),
                message: e.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok};

    #[tokio::test]
    async fn test_memory_store_lifecycle() {
        let store = MemoryStore::new();
        let storage_ref = store.put("run/0001_rg.png", vec![1, 2, 3]).await.unwrap();
        assert_eq!(storage_ref.uri, "memory://run/0001_rg.png");
        assert_eq!(store.len().await, 1);
        assert!(store.exists("run/0001_rg.png").await.unwrap());
        assert_eq!(store.get("run/0001_rg.png").await.unwrap(), vec![1, 2, 3]);

        assert_ok!(store.delete("run/0001_rg.png").await);
        assert!(store.is_empty().await);
        assert_err!(store.delete("run/0001_rg.png").await);
    }

    #[tokio::test]
    async fn test_local_dir_store_lifecycle() {
        let root = std::env::temp_dir().join(format!("age-verify-test-{}", uuid::Uuid::new_v4()));
        let store = LocalDirStore::new(&root);
        assert_eq!(store.root(), root.as_path());

        let storage_ref = store.put("run-a/0000_cnh.pdf", b"%PDF".to_vec()).await.unwrap();
        assert!(storage_ref.uri.starts_with("file://"));
        assert!(store.exists("run-a/0000_cnh.pdf").await.unwrap());
        assert_eq!(store.get("run-a/0000_cnh.pdf").await.unwrap(), b"%PDF".to_vec());

        assert_ok!(store.delete("run-a/0000_cnh.pdf").await);
        assert!(!store.exists("run-a/0000_cnh.pdf").await.unwrap());
        // 删除单个文档不动批次目录
        assert!(root.join("run-a").is_dir());
        assert_ok!(store.release_run("run-a").await);
        assert!(!root.join("run-a").exists());
        assert_ok!(store.release_run("run-a").await);
        assert!(matches!(
            store.get("run-a/0000_cnh.pdf").await,
            Err(StorageError::NotFound { .. })
        ));

        let _ = std::fs::remove_dir_all(&root);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_local_dir_store_concurrent_put_delete_in_one_run() {
        let root = std::env::temp_dir().join(format!("age-verify-test-{}", uuid::Uuid::new_v4()));
        let store = std::sync::Arc::new(LocalDirStore::new(&root));

        for round in 0..20 {
            let run = format!("run-{}", round);
            let mut tasks = tokio::task::JoinSet::new();
            for i in 0..40 {
                let store = store.clone();
                let key = format!("{}/{:04}_doc{}.png", run, i, i);
                tasks.spawn(async move {
                    store.put(&key, vec![1, 2, 3]).await?;
                    tokio::task::yield_now().await;
                    store.delete(&key).await
                });
            }
            while let Some(joined) = tasks.join_next().await {
                assert_ok!(joined.unwrap());
            }
            assert_ok!(store.release_run(&run).await);
            assert!(!root.join(&run).exists());
        }

        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn test_local_dir_store_ignores_parent_components() {
        let store = LocalDirStore::new("/tmp/scratch");
        assert_eq!(
            store.path_for("../run/x.png"),
            PathBuf::from("/tmp/scratch/run/x.png")
        );
    }
}
