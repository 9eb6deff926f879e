//! # Asset Loading
//!
//! Textures, skybox faces and models are decoded on a small background
//! thread pool. Workers never touch the scene: each load reports through an
//! unbounded channel and the event thread applies the results when it drains
//! the channel, so the scene store needs no locking.
//!
//! Every load emits `Started`, zero or more `Progress` events and exactly one
//! `Finished` or `Failed`. Loads complete in no defined order.

pub mod gltf_model;
pub mod obj_model;
pub mod texture;

use std::any::Any;
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;

use futures::channel::mpsc;
use futures::executor::ThreadPool;
use futures::FutureExt;

use crate::error::{AssetError, AssetResult};
use crate::gfx::resources::{CubeTexture, TextureImage};
use crate::gfx::scene::Object;

/// The external assets the scene requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetKind {
    Skybox,
    BrickTexture,
    CrateModel,
    BirdModel,
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AssetKind::Skybox => "skybox",
            AssetKind::BrickTexture => "brick texture",
            AssetKind::CrateModel => "crate model",
            AssetKind::BirdModel => "bird model",
        };
        f.write_str(name)
    }
}

/// Decoded result of a successful load
pub enum LoadedAsset {
    Skybox(CubeTexture),
    Texture(TextureImage),
    Model(Object),
}

pub enum LoadEvent {
    Started(AssetKind),
    Progress {
        kind: AssetKind,
        loaded: usize,
        total: Option<usize>,
    },
    Finished(AssetKind, LoadedAsset),
    Failed(AssetKind, AssetError),
}

impl LoadEvent {
    pub fn kind(&self) -> AssetKind {
        match self {
            LoadEvent::Started(kind)
            | LoadEvent::Progress { kind, .. }
            | LoadEvent::Finished(kind, _)
            | LoadEvent::Failed(kind, _) => *kind,
        }
    }

    /// True for the final event of a load
    pub fn is_terminal(&self) -> bool {
        matches!(self, LoadEvent::Finished(..) | LoadEvent::Failed(..))
    }
}

/// Handle a running load uses to report intermediate progress
#[derive(Clone)]
pub struct Progress {
    kind: AssetKind,
    sender: mpsc::UnboundedSender<LoadEvent>,
}

impl Progress {
    pub fn report(&self, loaded: usize, total: Option<usize>) {
        self.send(LoadEvent::Progress {
            kind: self.kind,
            loaded,
            total,
        });
    }

    fn send(&self, event: LoadEvent) {
        // The receiver only goes away with the loader itself
        let _ = self.sender.unbounded_send(event);
    }
}

/// Runs asset loads off the event thread and collects their events
pub struct AssetLoader {
    pool: ThreadPool,
    sender: mpsc::UnboundedSender<LoadEvent>,
    receiver: mpsc::UnboundedReceiver<LoadEvent>,
    pending: usize,
}

impl AssetLoader {
    pub fn new() -> std::io::Result<Self> {
        let pool = ThreadPool::builder()
            .pool_size(2)
            .name_prefix("asset-loader-")
            .create()?;
        let (sender, receiver) = mpsc::unbounded();

        Ok(Self {
            pool,
            sender,
            receiver,
            pending: 0,
        })
    }

    /// Starts a load on the pool
    ///
    /// `job` receives the progress handle for its kind and returns the future
    /// doing the actual work; its result becomes the terminal event.
    pub fn spawn<F, Fut>(&mut self, kind: AssetKind, job: F)
    where
        F: FnOnce(Progress) -> Fut,
        Fut: Future<Output = AssetResult<LoadedAsset>> + Send + 'static,
    {
        let progress = Progress {
            kind,
            sender: self.sender.clone(),
        };
        let work = job(progress.clone());

        self.pending += 1;
        log::debug!("Loading {kind}");

        self.pool.spawn_ok(async move {
            progress.send(LoadEvent::Started(kind));
            // A panicking job must still end with a terminal event
            let event = match AssertUnwindSafe(work).catch_unwind().await {
                Ok(Ok(asset)) => LoadEvent::Finished(kind, asset),
                Ok(Err(err)) => LoadEvent::Failed(kind, err),
                Err(payload) => {
                    LoadEvent::Failed(kind, AssetError::Panicked(panic_message(&*payload)))
                }
            };
            progress.send(event);
        });
    }

    /// Takes every event that has arrived so far without blocking
    pub fn poll_events(&mut self) -> Vec<LoadEvent> {
        let mut events = Vec::new();
        while let Ok(Some(event)) = self.receiver.try_next() {
            match &event {
                LoadEvent::Progress {
                    kind,
                    loaded,
                    total: Some(total),
                } => log::debug!("{kind}: {loaded}/{total}"),
                LoadEvent::Progress { kind, loaded, .. } => log::debug!("{kind}: {loaded}"),
                _ => {}
            }

            if event.is_terminal() {
                self.pending = self.pending.saturating_sub(1);
            }
            events.push(event);
        }
        events
    }

    /// Loads that have not delivered their terminal event yet
    pub fn pending(&self) -> usize {
        self.pending
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    fn wait_for_terminal(loader: &mut AssetLoader, count: usize) -> Vec<LoadEvent> {
        let deadline = Instant::now() + Duration::from_secs(5);
        let mut events = Vec::new();
        while events.iter().filter(|e: &&LoadEvent| e.is_terminal()).count() < count {
            assert!(Instant::now() < deadline, "loads did not finish in time");
            events.extend(loader.poll_events());
            std::thread::sleep(Duration::from_millis(5));
        }
        events
    }

    #[test]
    fn test_load_reports_started_progress_and_finished() {
        let mut loader = AssetLoader::new().unwrap();
        loader.spawn(AssetKind::BrickTexture, |progress| async move {
            progress.report(1, Some(1));
            Ok(LoadedAsset::Texture(TextureImage::solid([1, 2, 3, 255])))
        });
        assert_eq!(loader.pending(), 1);

        let events = wait_for_terminal(&mut loader, 1);
        assert_eq!(loader.pending(), 0);
        assert!(matches!(events[0], LoadEvent::Started(AssetKind::BrickTexture)));
        assert!(matches!(
            events[1],
            LoadEvent::Progress {
                loaded: 1,
                total: Some(1),
                ..
            }
        ));
        match &events[2] {
            LoadEvent::Finished(AssetKind::BrickTexture, LoadedAsset::Texture(image)) => {
                assert_eq!(image.rgba, vec![1, 2, 3, 255]);
            }
            _ => panic!("expected a finished texture"),
        }
    }

    #[test]
    fn test_failure_is_delivered_as_event() {
        let mut loader = AssetLoader::new().unwrap();
        loader.spawn(AssetKind::CrateModel, |_| async move {
            Err(AssetError::EmptyModel("missing.glb".into()))
        });

        let events = wait_for_terminal(&mut loader, 1);
        let last = events.last().unwrap();
        assert_eq!(last.kind(), AssetKind::CrateModel);
        assert!(matches!(last, LoadEvent::Failed(_, AssetError::EmptyModel(_))));
    }

    fn corrupt_model() -> AssetResult<LoadedAsset> {
        panic!("corrupt model")
    }

    #[test]
    fn test_panicking_job_fails_once() {
        let mut loader = AssetLoader::new().unwrap();
        loader.spawn(AssetKind::CrateModel, |_| async move { corrupt_model() });

        let events = wait_for_terminal(&mut loader, 1);
        assert_eq!(loader.pending(), 0);

        let terminal: Vec<_> = events.iter().filter(|e| e.is_terminal()).collect();
        assert_eq!(terminal.len(), 1);
        match terminal[0] {
            LoadEvent::Failed(AssetKind::CrateModel, AssetError::Panicked(message)) => {
                assert_eq!(message, "corrupt model");
            }
            _ => panic!("expected a failed crate model"),
        }
    }

    #[test]
    fn test_pool_survives_panicking_jobs() {
        let mut loader = AssetLoader::new().unwrap();
        for kind in [AssetKind::CrateModel, AssetKind::BirdModel] {
            loader.spawn(kind, |_| async move { corrupt_model() });
        }
        wait_for_terminal(&mut loader, 2);

        loader.spawn(AssetKind::BrickTexture, |_| async move {
            Ok(LoadedAsset::Texture(TextureImage::solid([0, 0, 0, 255])))
        });
        let events = wait_for_terminal(&mut loader, 1);
        assert!(matches!(
            events.last(),
            Some(LoadEvent::Finished(AssetKind::BrickTexture, _))
        ));
        assert_eq!(loader.pending(), 0);
    }

    #[test]
    fn test_independent_loads_all_terminate() {
        let mut loader = AssetLoader::new().unwrap();
        for kind in [AssetKind::Skybox, AssetKind::BirdModel, AssetKind::CrateModel] {
            loader.spawn(kind, |_| async move {
                Err(AssetError::UnsupportedFormat("test".to_string()))
            });
        }

        let events = wait_for_terminal(&mut loader, 3);
        let mut finished: Vec<_> = events
            .iter()
            .filter(|e| e.is_terminal())
            .map(|e| e.kind().to_string())
            .collect();
        finished.sort();
        assert_eq!(finished, vec!["bird model", "crate model", "skybox"]);
    }
}
