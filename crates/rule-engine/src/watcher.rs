//! 规则热更新
//!
//! `FileRuleWatcher` 监听规则配置目录，`*.yaml` / `*.yml` 文件变更后经 debounce
//! 窗口去抖，再重新加载并整体替换 `RuleStore` 中的规则集。重载失败时保留当前规则集。

use crate::error::Result;
use crate::loader::RuleLoader;
use crate::store::RuleStore;
use async_trait::async_trait;
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use parking_lot::Mutex;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tracing::{error, info, warn};

/// 监听循环任务，由调用方决定在哪个运行时上执行
pub type WatchTask = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// 规则监听器抽象
#[async_trait]
pub trait RuleWatcher: Send + Sync {
    /// 启动监听，规则变更时自动重载
    async fn start(&self) -> Result<()>;

    /// 停止监听并释放资源
    async fn stop(&self) -> Result<()>;
}

/// 一次 start 对应的监听状态
struct ActiveWatch {
    /// 持有底层 watcher，drop 即停止监听
    _watcher: RecommendedWatcher,
    shutdown: oneshot::Sender<()>,
}

/// 基于文件系统事件的规则监听器
pub struct FileRuleWatcher {
    loader: RuleLoader,
    store: RuleStore,
    /// debounce 窗口，避免编辑器连续写入触发多次重载
    debounce: Duration,
    active: Mutex<Option<ActiveWatch>>,
}

impl FileRuleWatcher {
    pub fn new(loader: RuleLoader, store: RuleStore, debounce: Duration) -> Self {
        Self {
            loader,
            store,
            debounce,
            active: Mutex::new(None),
        }
    }

    pub fn is_running(&self) -> bool {
        self.active.lock().is_some()
    }

    /// 立即重载一次规则
    pub fn reload_now(&self) -> Result<usize> {
        self.store.reload(&self.loader)
    }

    /// 注册文件监听并返回监听循环；已在运行时返回 `None`
    ///
    /// 每次启动使用独立的关闭通道，stop 之后可以再次启动。
    pub fn watch_task(&self) -> Result<Option<WatchTask>> {
        let mut active = self.active.lock();
        if active.is_some() {
            warn!("规则监听已在运行");
            return Ok(None);
        }

        // notify 回调运行在其自身线程，通过 channel 转发到 tokio 任务
        let (event_tx, mut event_rx) = mpsc::channel::<()>(16);

        let mut watcher =
            notify::recommended_watcher(move |res: notify::Result<notify::Event>| match res {
                Ok(event) if Self::is_relevant(&event) => {
                    let _ = event_tx.try_send(());
                }
                Ok(_) => {}
                Err(e) => warn!(error = %e, "文件监听器事件错误"),
            })?;

        watcher.watch(self.loader.config_dir(), RecursiveMode::NonRecursive)?;

        let (shutdown, mut shutdown_rx) = oneshot::channel();
        *active = Some(ActiveWatch {
            _watcher: watcher,
            shutdown,
        });

        info!(path = %self.loader.config_dir().display(), "规则文件监听已启动");

        let loader = self.loader.clone();
        let store = self.store.clone();
        let debounce = self.debounce;

        Ok(Some(Box::pin(async move {
            loop {
                tokio::select! {
                    Some(()) = event_rx.recv() => {
                        tokio::time::sleep(debounce).await;
                        // 丢弃窗口内积压的重复事件
                        while event_rx.try_recv().is_ok() {}

                        match store.reload(&loader) {
                            Ok(count) => info!(rules = count, "规则文件变更，已重新加载"),
                            Err(e) => error!(error = %e, "规则重新加载失败，保留当前规则集"),
                        }
                    }
                    // 收到关闭信号或监听器被 drop
                    _ = &mut shutdown_rx => {
                        info!("规则文件监听已停止");
                        break;
                    }
                    else => break,
                }
            }
        })))
    }

    fn is_relevant(event: &notify::Event) -> bool {
        matches!(
            event.kind,
            EventKind::Modify(_) | EventKind::Create(_) | EventKind::Remove(_)
        ) && event.paths.iter().any(|p| RuleLoader::is_rule_file(p))
    }
}

#[async_trait]
impl RuleWatcher for FileRuleWatcher {
    async fn start(&self) -> Result<()> {
        if let Some(task) = self.watch_task()? {
            tokio::spawn(task);
        }
        Ok(())
    }

    async fn stop(&self) -> Result<()> {
        if let Some(active) = self.active.lock().take() {
            let _ = active.shutdown.send(());
        }
        Ok(())
    }
}
