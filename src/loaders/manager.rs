//! Loading manager
//!
//! Load requests run as jobs on a [`Spawner`] and report back through an `mpsc`
//! channel. The channel is drained on the owning thread only, so scene state is never
//! touched by a worker.
//!
//! Every request carries a [`Generation`]. The manager itself does not interpret it;
//! the viewer compares it against the latest generation it issued and drops stale
//! results.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::mpsc::{channel, Receiver, Sender, TryRecvError};
use std::sync::Arc;

use crate::error::LoadError;
use crate::gfx::scene::{EnvironmentTexture, Node};

use super::{ModelLoader, TextureLoader};

pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Runs load jobs somewhere other than the caller's stack frame.
pub trait Spawner {
    /// Hands `job` off. An error means the job was dropped without running.
    fn spawn(&self, job: Job) -> std::io::Result<()>;
}

/// One worker thread per job.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSpawner;

impl Spawner for ThreadSpawner {
    fn spawn(&self, job: Job) -> std::io::Result<()> {
        std::thread::Builder::new()
            .name("meshview-loader".to_string())
            .spawn(job)
            .map(|_| ())
    }
}

/// Queues jobs until the host runs them.
///
/// Useful where threads are unavailable, and for deterministic ordering. Clones share
/// the same queue.
#[derive(Default, Clone)]
pub struct ManualSpawner {
    jobs: Rc<RefCell<VecDeque<Job>>>,
}

impl ManualSpawner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self) -> usize {
        self.jobs.borrow().len()
    }

    /// Runs the oldest queued job. Returns false if the queue was empty.
    pub fn run_next(&self) -> bool {
        let job = self.jobs.borrow_mut().pop_front();
        match job {
            Some(job) => {
                job();
                true
            }
            None => false,
        }
    }

    /// Runs the newest queued job, completing requests out of order.
    pub fn run_last(&self) -> bool {
        let job = self.jobs.borrow_mut().pop_back();
        match job {
            Some(job) => {
                job();
                true
            }
            None => false,
        }
    }

    pub fn run_all(&self) -> usize {
        let mut n = 0;
        while self.run_next() {
            n += 1;
        }
        n
    }
}

impl Spawner for ManualSpawner {
    fn spawn(&self, job: Job) -> std::io::Result<()> {
        self.jobs.borrow_mut().push_back(job);
        Ok(())
    }
}

/// Monotonic request stamp
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Generation(u64);

impl Generation {
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    Model,
    Environment,
}

#[derive(Debug)]
pub enum LoadOutcome {
    Model(Result<Node, LoadError>),
    Environment(Result<EnvironmentTexture, LoadError>),
}

impl LoadOutcome {
    pub fn kind(&self) -> AssetKind {
        match self {
            LoadOutcome::Model(_) => AssetKind::Model,
            LoadOutcome::Environment(_) => AssetKind::Environment,
        }
    }
}

/// Result of one load job
#[derive(Debug)]
pub struct LoadMessage {
    pub generation: Generation,
    pub path: String,
    pub outcome: LoadOutcome,
}

/// Items finished versus items requested in the current batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoadingProgress {
    pub items_loaded: usize,
    pub items_total: usize,
}

impl LoadingProgress {
    /// Rounded percentage; an empty batch counts as complete.
    pub fn percent(&self) -> u32 {
        if self.items_total == 0 {
            return 100;
        }
        ((self.items_loaded as f64 / self.items_total as f64) * 100.0).round() as u32
    }

    pub fn is_complete(&self) -> bool {
        self.items_loaded >= self.items_total
    }
}

pub struct LoadingManager {
    spawner: Box<dyn Spawner>,
    sender: Sender<LoadMessage>,
    receiver: Receiver<LoadMessage>,
    progress: LoadingProgress,
}

impl LoadingManager {
    pub fn new(spawner: Box<dyn Spawner>) -> Self {
        let (sender, receiver) = channel();
        Self {
            spawner,
            sender,
            receiver,
            progress: LoadingProgress::default(),
        }
    }

    pub fn with_threads() -> Self {
        Self::new(Box::new(ThreadSpawner))
    }

    pub fn progress(&self) -> LoadingProgress {
        self.progress
    }

    /// Requests still outstanding in the current batch.
    pub fn in_flight(&self) -> usize {
        self.progress.items_total - self.progress.items_loaded
    }

    pub fn load_model(&mut self, loader: Arc<dyn ModelLoader>, path: &str, generation: Generation) {
        let file = PathBuf::from(path);
        self.dispatch(path, generation, AssetKind::Model, move || {
            LoadOutcome::Model(loader.load(&file))
        });
    }

    pub fn load_texture(
        &mut self,
        loader: Arc<dyn TextureLoader>,
        path: &str,
        generation: Generation,
    ) {
        let file = PathBuf::from(path);
        self.dispatch(path, generation, AssetKind::Environment, move || {
            LoadOutcome::Environment(loader.load(&file))
        });
    }

    /// Spawns `load`; a job that cannot be spawned is reported as a failed load so
    /// the batch still completes.
    fn dispatch<F>(&mut self, path: &str, generation: Generation, kind: AssetKind, load: F)
    where
        F: FnOnce() -> LoadOutcome + Send + 'static,
    {
        self.progress.items_total += 1;
        log::debug!("Loading {} ({:?})", path, generation);

        let sender = self.sender.clone();
        let job_path = path.to_string();
        let spawned = self.spawner.spawn(Box::new(move || {
            let outcome = load();
            let message = LoadMessage {
                generation,
                path: job_path,
                outcome,
            };
            if sender.send(message).is_err() {
                log::debug!("Loading manager dropped before a load finished");
            }
        }));

        if let Err(err) = spawned {
            log::error!("Failed to start loading {}: {}", path, err);
            let error = LoadError::Io(err);
            let outcome = match kind {
                AssetKind::Model => LoadOutcome::Model(Err(error)),
                AssetKind::Environment => LoadOutcome::Environment(Err(error)),
            };
            // the receiver lives in self, so this cannot fail
            let _ = self.sender.send(LoadMessage {
                generation,
                path: path.to_string(),
                outcome,
            });
        }
    }

    /// Takes one finished load, if any, with the progress after counting it.
    ///
    /// Counters reset once every requested item has finished, so the returned
    /// snapshot of the last item in a batch reads 100%.
    pub fn try_recv(&mut self) -> Option<(LoadMessage, LoadingProgress)> {
        match self.receiver.try_recv() {
            Ok(message) => {
                self.progress.items_loaded += 1;
                let snapshot = self.progress;
                if self.progress.is_complete() {
                    self.progress = LoadingProgress::default();
                }
                Some((message, snapshot))
            }
            Err(TryRecvError::Empty) => None,
            // unreachable while the manager holds a sender
            Err(TryRecvError::Disconnected) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::geometry::cube;
    use crate::gfx::scene::{Drawable, Material, MaterialSlot};
    use std::path::Path;

    struct CubeLoader;

    impl ModelLoader for CubeLoader {
        fn load(&self, path: &Path) -> Result<Node, LoadError> {
            if path.to_str() == Some("missing.obj") {
                return Err(LoadError::EmptyModel(path.display().to_string()));
            }
            Ok(Node::mesh(
                "cube",
                Drawable::new(cube(1.0), MaterialSlot::Single(Material::default())),
            ))
        }
    }

    fn manual_manager() -> (LoadingManager, ManualSpawner) {
        let spawner = ManualSpawner::new();
        (LoadingManager::new(Box::new(spawner.clone())), spawner)
    }

    #[test]
    fn test_nothing_received_until_job_runs() {
        let (mut manager, spawner) = manual_manager();
        manager.load_model(Arc::new(CubeLoader), "a.obj", Generation::default().next());
        assert!(manager.try_recv().is_none());
        assert_eq!(spawner.pending(), 1);
        assert_eq!(manager.in_flight(), 1);

        spawner.run_all();
        let (message, progress) = manager.try_recv().unwrap();
        assert_eq!(message.path, "a.obj");
        assert_eq!(message.outcome.kind(), AssetKind::Model);
        assert!(matches!(message.outcome, LoadOutcome::Model(Ok(_))));
        assert_eq!(progress.percent(), 100);
        assert_eq!(manager.in_flight(), 0);
    }

    #[test]
    fn test_progress_counts_up_then_resets() {
        let (mut manager, spawner) = manual_manager();
        let loader: Arc<dyn ModelLoader> = Arc::new(CubeLoader);
        for path in ["a.obj", "b.obj", "missing.obj"] {
            manager.load_model(loader.clone(), path, Generation::default());
        }
        spawner.run_all();

        let percents: Vec<u32> = std::iter::from_fn(|| manager.try_recv())
            .map(|(_, p)| p.percent())
            .collect();
        assert_eq!(percents, vec![33, 67, 100]);
        assert_eq!(manager.progress(), LoadingProgress::default());
    }

    #[test]
    fn test_failures_are_reported_as_messages() {
        let (mut manager, spawner) = manual_manager();
        manager.load_model(Arc::new(CubeLoader), "missing.obj", Generation::default());
        spawner.run_all();
        let (message, _) = manager.try_recv().unwrap();
        assert!(matches!(message.outcome, LoadOutcome::Model(Err(LoadError::EmptyModel(_)))));
    }

    #[test]
    fn test_run_last_completes_out_of_order() {
        let (mut manager, spawner) = manual_manager();
        let loader: Arc<dyn ModelLoader> = Arc::new(CubeLoader);
        let first = Generation::default().next();
        let second = first.next();
        manager.load_model(loader.clone(), "first.obj", first);
        manager.load_model(loader, "second.obj", second);

        spawner.run_last();
        let (message, progress) = manager.try_recv().unwrap();
        assert_eq!(message.generation, second);
        assert_eq!(progress, LoadingProgress { items_loaded: 1, items_total: 2 });
        assert!(first < second);
    }

    struct RefusingSpawner;

    impl Spawner for RefusingSpawner {
        fn spawn(&self, _job: Job) -> std::io::Result<()> {
            Err(std::io::Error::other("no threads left"))
        }
    }

    #[test]
    fn test_spawn_failure_completes_batch_with_error() {
        let mut manager = LoadingManager::new(Box::new(RefusingSpawner));
        manager.load_model(Arc::new(CubeLoader), "a.obj", Generation::default().next());

        let (message, progress) = manager.try_recv().unwrap();
        assert_eq!(message.path, "a.obj");
        assert!(matches!(message.outcome, LoadOutcome::Model(Err(LoadError::Io(_)))));
        assert_eq!(progress.percent(), 100);
        assert_eq!(manager.in_flight(), 0);
    }

    #[test]
    fn test_thread_spawner_delivers() {
        let mut manager = LoadingManager::with_threads();
        manager.load_model(Arc::new(CubeLoader), "a.obj", Generation::default());
        let deadline = std::time::Instant::now() + std::time::Duration::from_secs(5);
        loop {
            if let Some((message, _)) = manager.try_recv() {
                assert_eq!(message.path, "a.obj");
                break;
            }
            assert!(std::time::Instant::now() < deadline, "loader thread timed out");
            std::thread::sleep(std::time::Duration::from_millis(5));
        }
    }
}
