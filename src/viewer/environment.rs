use crate::error::{DisposalError, LoadError};
use crate::gfx::resources::{ResourceKind, ResourceRegistry};
use crate::gfx::scene::{EnvironmentTexture, TextureMapping};
use crate::loaders::Generation;

/// What happened to a finished environment load
#[derive(Debug)]
pub enum EnvironmentOutcome {
    Installed,
    /// A newer load was started, or the manager was disposed, since this one began
    Stale,
    Failed(LoadError),
}

/// Owns at most one environment texture.
#[derive(Debug, Default)]
pub struct EnvironmentManager {
    current: Option<EnvironmentTexture>,
    generation: Generation,
}

impl EnvironmentManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<&EnvironmentTexture> {
        self.current.as_ref()
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Drops the held texture and issues the generation for a new request.
    pub fn begin_load(&mut self, registry: &mut ResourceRegistry) -> Result<Generation, DisposalError> {
        let released = self.release(registry);
        self.generation = self.generation.next();
        released.map(|_| self.generation)
    }

    pub fn finish_load(
        &mut self,
        generation: Generation,
        result: Result<EnvironmentTexture, LoadError>,
        registry: &mut ResourceRegistry,
    ) -> EnvironmentOutcome {
        if generation != self.generation {
            return EnvironmentOutcome::Stale;
        }
        match result {
            Ok(mut texture) => {
                if let Err(err) = self.release(registry) {
                    log::error!("Environment texture: {}", err);
                }
                texture.mapping = TextureMapping::EquirectangularReflection;
                texture.gpu.acquire(registry, ResourceKind::Texture);
                self.current = Some(texture);
                EnvironmentOutcome::Installed
            }
            Err(err) => EnvironmentOutcome::Failed(err),
        }
    }

    /// Releases the held texture and invalidates loads in flight. Idempotent.
    pub fn dispose(&mut self, registry: &mut ResourceRegistry) -> Result<(), DisposalError> {
        self.generation = self.generation.next();
        self.release(registry)
    }

    fn release(&mut self, registry: &mut ResourceRegistry) -> Result<(), DisposalError> {
        match self.current.take() {
            Some(mut texture) => texture.gpu.release(registry).map(|_| ()),
            None => Ok(()),
        }
    }
}
