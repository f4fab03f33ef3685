// SPDX-License-Identifier: MIT OR Apache-2.0
//! Resolving sources into projects.

use crate::error::LoadError;
use futures::future::{self, BoxFuture, FutureExt};
use indexmap::IndexMap;
use ordoplay_flow::{AnimationProject, PlaybackConfig, Project, Routine, Size};

/// Produces projects for source strings
pub trait SourceLoader: Send + Sync {
    /// Start loading `src`. The future may be dropped at any await point
    /// when a newer source supersedes it.
    fn load(&self, src: &str) -> BoxFuture<'static, Result<Box<dyn Project>, LoadError>>;
}

/// In-process loader backed by registered routines
#[derive(Debug, Default)]
pub struct SceneLibrary {
    scenes: IndexMap<String, Routine>,
    playback: PlaybackConfig,
    size: Option<Size>,
}

impl SceneLibrary {
    /// Create an empty library
    pub fn new(playback: PlaybackConfig) -> Self {
        Self {
            scenes: IndexMap::new(),
            playback,
            size: None,
        }
    }

    /// Size given to every project built by this library
    pub fn with_size(mut self, width: f64, height: f64) -> Self {
        self.size = Some(Size::new(width, height));
        self
    }

    /// Register `routine` under its own name
    pub fn register(&mut self, routine: Routine) -> &mut Self {
        let name = routine.name().to_string();
        if self.scenes.insert(name.clone(), routine).is_some() {
            tracing::warn!(scene = %name, "Scene registered twice, replacing");
        }
        self
    }

    /// Whether a scene is registered under `src`
    pub fn contains(&self, src: &str) -> bool {
        self.scenes.contains_key(src)
    }

    /// Registered scene names, in registration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.scenes.keys().map(String::as_str)
    }

    /// Build a fresh project for `src`
    pub fn build(&self, src: &str) -> Result<AnimationProject, LoadError> {
        let routine = self
            .scenes
            .get(src)
            .ok_or_else(|| LoadError::NotFound(src.to_string()))?;
        let mut project = AnimationProject::with_config(
            src,
            routine.clone(),
            ordoplay_flow::DEFAULT_FRAMERATE,
            self.playback.clone(),
        )?;
        if let Some(size) = self.size {
            project = project.with_size(size.width, size.height);
        }
        Ok(project)
    }
}

impl SourceLoader for SceneLibrary {
    fn load(&self, src: &str) -> BoxFuture<'static, Result<Box<dyn Project>, LoadError>> {
        let project = self
            .build(src)
            .map(|project| Box::new(project) as Box<dyn Project>);
        future::ready(project).boxed()
    }
}
