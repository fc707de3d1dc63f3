//! Single-slot cache for the one model the service serves.

use std::{
    sync::{Arc, RwLock},
    time::Instant,
};

use chrono::Utc;
use tokio::sync::Mutex as TokioMutex;
use tracing::{info, warn};

use crate::error::{TtsError, TtsResult};
use crate::model::{ModelLoader, SpeechModel};
use crate::speakers::default_speaker_ids;

/// A successfully loaded model and what was learned while loading it.
#[derive(Clone)]
pub struct LoadedModel {
    pub model: Arc<dyn SpeechModel>,
    pub speakers: Vec<String>,
    pub device: String,
    pub model_id: String,
    /// Unix time in seconds.
    pub loaded_at: f64,
}

impl std::fmt::Debug for LoadedModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedModel")
            .field("model", &"<SpeechModel>")
            .field("speakers", &self.speakers)
            .field("device", &self.device)
            .field("model_id", &self.model_id)
            .field("loaded_at", &self.loaded_at)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheState {
    Unloaded,
    Loading,
    Loaded,
}

enum Slot {
    Unloaded,
    Loading,
    Loaded(LoadedModel),
}

/// Point-in-time view of the cache for status reporting.
#[derive(Debug, Clone)]
pub struct CacheStatus {
    pub state: CacheState,
    pub model_id: Option<String>,
    pub device: Option<String>,
    pub speakers: Vec<String>,
    pub loaded_at: Option<f64>,
}

/// Lazily loads the configured model once and hands out the shared handle.
///
/// Loads are serialized by `load_lock`; concurrent cold requests wait for the
/// first load instead of starting their own. A failed load leaves the slot
/// empty so the next request tries again. The load runs on its own task, so
/// its result lands in the slot even if every waiting caller goes away.
pub struct ModelCache {
    loader: Arc<dyn ModelLoader>,
    model_id: String,
    slot: Arc<RwLock<Slot>>,
    load_lock: Arc<TokioMutex<()>>,
}

fn cached(slot: &RwLock<Slot>) -> Option<LoadedModel> {
    match &*slot.read().unwrap_or_else(|e| e.into_inner()) {
        Slot::Loaded(loaded) => Some(loaded.clone()),
        _ => None,
    }
}

fn set_slot(slot: &RwLock<Slot>, value: Slot) {
    *slot.write().unwrap_or_else(|e| e.into_inner()) = value;
}

impl ModelCache {
    pub fn new(loader: Arc<dyn ModelLoader>, model_id: impl Into<String>) -> Self {
        Self {
            loader,
            model_id: model_id.into(),
            slot: Arc::new(RwLock::new(Slot::Unloaded)),
            load_lock: Arc::new(TokioMutex::new(())),
        }
    }

    /// The identifier this cache loads.
    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    pub fn state(&self) -> CacheState {
        match &*self.slot.read().unwrap_or_else(|e| e.into_inner()) {
            Slot::Unloaded => CacheState::Unloaded,
            Slot::Loading => CacheState::Loading,
            Slot::Loaded(_) => CacheState::Loaded,
        }
    }

    pub fn status(&self) -> CacheStatus {
        match &*self.slot.read().unwrap_or_else(|e| e.into_inner()) {
            Slot::Loaded(m) => CacheStatus {
                state: CacheState::Loaded,
                model_id: Some(m.model_id.clone()),
                device: Some(m.device.clone()),
                speakers: m.speakers.clone(),
                loaded_at: Some(m.loaded_at),
            },
            other => CacheStatus {
                state: if matches!(other, Slot::Loading) {
                    CacheState::Loading
                } else {
                    CacheState::Unloaded
                },
                model_id: None,
                device: None,
                speakers: default_speaker_ids(),
                loaded_at: None,
            },
        }
    }

    /// Return the loaded model, loading it first if needed.
    pub async fn get_or_load(&self) -> TtsResult<LoadedModel> {
        if let Some(loaded) = cached(&self.slot) {
            return Ok(loaded);
        }

        let task = tokio::spawn(load_into_slot(
            Arc::clone(&self.loader),
            self.model_id.clone(),
            Arc::clone(&self.slot),
            Arc::clone(&self.load_lock),
        ));
        task.await
            .map_err(|e| TtsError::model_unavailable(format!("load task failed: {e}")))?
    }
}

async fn load_into_slot(
    loader: Arc<dyn ModelLoader>,
    model_id: String,
    slot: Arc<RwLock<Slot>>,
    load_lock: Arc<TokioMutex<()>>,
) -> TtsResult<LoadedModel> {
    let _guard = load_lock.lock().await;
    // another request may have finished loading while we waited
    if let Some(loaded) = cached(&slot) {
        return Ok(loaded);
    }

    set_slot(&slot, Slot::Loading);
    info!(model_id = %model_id, "Loading model");
    let started = Instant::now();

    let load_id = model_id.clone();
    let result = tokio::task::spawn_blocking(move || loader.load(&load_id))
        .await
        .map_err(|e| anyhow::anyhow!("Task join error: {e}"))
        .and_then(|r| r);

    match result {
        Ok(model) => {
            let loaded = LoadedModel {
                speakers: model.supported_speakers().unwrap_or_else(default_speaker_ids),
                device: model.device(),
                model_id,
                loaded_at: Utc::now().timestamp_millis() as f64 / 1000.0,
                model,
            };
            info!(
                model_id = %loaded.model_id,
                device = %loaded.device,
                speakers = ?loaded.speakers,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Model loaded successfully"
            );
            set_slot(&slot, Slot::Loaded(loaded.clone()));
            Ok(loaded)
        }
        Err(e) => {
            warn!(model_id = %model_id, error = %e, "Model load failed");
            set_slot(&slot, Slot::Unloaded);
            Err(TtsError::model_unavailable(e))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ModelOutput, SynthesisInput};
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Duration;

    struct Silent;

    impl SpeechModel for Silent {
        fn supported_speakers(&self) -> Option<Vec<String>> {
            Some(vec!["ono_anna".into()])
        }

        fn device(&self) -> String {
            "cpu".into()
        }

        fn generate_custom_voice(&self, input: &SynthesisInput) -> anyhow::Result<ModelOutput> {
            Ok(ModelOutput {
                wavs: input.text.broadcast(Vec::new()),
                sample_rate: 16_000,
            })
        }
    }

    #[derive(Default)]
    struct CountingLoader {
        loads: AtomicUsize,
        fail: AtomicBool,
        slow: AtomicBool,
    }

    impl ModelLoader for CountingLoader {
        fn load(&self, _model_id: &str) -> anyhow::Result<Arc<dyn SpeechModel>> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            let delay = if self.slow.load(Ordering::SeqCst) { 200 } else { 20 };
            std::thread::sleep(Duration::from_millis(delay));
            if self.fail.load(Ordering::SeqCst) {
                anyhow::bail!("weights missing");
            }
            Ok(Arc::new(Silent))
        }
    }

    #[tokio::test]
    async fn starts_unloaded_with_catalog_speakers() {
        let cache = ModelCache::new(Arc::new(CountingLoader::default()), "m");
        let status = cache.status();
        assert_eq!(status.state, CacheState::Unloaded);
        assert_eq!(status.model_id, None);
        assert_eq!(status.speakers.len(), 9);
    }

    #[tokio::test]
    async fn loads_once_and_reuses_handle() {
        let loader = Arc::new(CountingLoader::default());
        let cache = ModelCache::new(loader.clone(), "m");

        let first = cache.get_or_load().await.unwrap();
        let second = cache.get_or_load().await.unwrap();

        assert_eq!(loader.loads.load(Ordering::SeqCst), 1);
        assert!(Arc::ptr_eq(&first.model, &second.model));
        assert_eq!(first.speakers, vec!["ono_anna".to_string()]);
        assert_eq!(cache.state(), CacheState::Loaded);
        assert_eq!(cache.status().model_id.as_deref(), Some("m"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_cold_requests_load_once() {
        let loader = Arc::new(CountingLoader::default());
        let cache = Arc::new(ModelCache::new(loader.clone(), "m"));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                tokio::spawn(async move { cache.get_or_load().await.map(|_| ()) })
            })
            .collect();
        for h in handles {
            h.await.unwrap().unwrap();
        }

        assert_eq!(loader.loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_load_leaves_cache_empty_and_retries() {
        let loader = Arc::new(CountingLoader::default());
        loader.fail.store(true, Ordering::SeqCst);
        let cache = ModelCache::new(loader.clone(), "m");

        let err = cache.get_or_load().await.unwrap_err();
        assert!(matches!(err, TtsError::ModelUnavailable(ref msg) if msg.contains("weights missing")));
        assert_eq!(cache.state(), CacheState::Unloaded);

        loader.fail.store(false, Ordering::SeqCst);
        cache.get_or_load().await.unwrap();
        assert_eq!(loader.loads.load(Ordering::SeqCst), 2);
        assert_eq!(cache.state(), CacheState::Loaded);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn abandoned_load_still_fills_the_slot() {
        let loader = Arc::new(CountingLoader::default());
        loader.slow.store(true, Ordering::SeqCst);
        let cache = Arc::new(ModelCache::new(loader.clone(), "m"));

        let first = {
            let cache = Arc::clone(&cache);
            tokio::spawn(async move { cache.get_or_load().await.map(|_| ()) })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        first.abort();
        tokio::time::sleep(Duration::from_millis(400)).await;

        assert_eq!(cache.state(), CacheState::Loaded);
        cache.get_or_load().await.unwrap();
        assert_eq!(loader.loads.load(Ordering::SeqCst), 1);
    }
}
