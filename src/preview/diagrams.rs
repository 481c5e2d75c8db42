//! The diagram pass.
//!
//! A pass walks every placeholder on the surface in document order and
//! injects the rendered SVG, or [`ERROR_MARKER`] when a diagram fails.
//! Passes are cooperative: each [`DiagramPass::step`] does one unit of work
//! (loading the engine, or rendering one diagram) so the caller can keep
//! handling input between diagrams. Starting a new pass through the
//! [`DiagramScheduler`] abandons the one in flight.

use std::fmt;
use std::sync::PoisonError;

use super::PreviewSurface;
use crate::mermaid::{self, EngineConfig, EngineHandle};

/// Markup injected in place of a diagram that failed to render.
pub const ERROR_MARKER: &str = "<pre class=\"mermaid-error\" style=\"color:#ef4444;font-size:13px;\">Failed to render mermaid diagram</pre>";

/// Loads the diagram engine on first use and keeps the handle afterwards.
pub struct LazyEngine {
    loader: Box<dyn Fn() -> EngineHandle>,
    handle: Option<EngineHandle>,
    loads: usize,
}

impl LazyEngine {
    pub fn new(loader: impl Fn() -> EngineHandle + 'static) -> Self {
        Self {
            loader: Box::new(loader),
            handle: None,
            loads: 0,
        }
    }

    /// The process-wide mermaid engine.
    pub fn mermaid() -> Self {
        Self::new(mermaid::shared_engine)
    }

    pub fn get(&mut self) -> EngineHandle {
        if let Some(handle) = &self.handle {
            return handle.clone();
        }
        self.loads += 1;
        let handle = (self.loader)();
        self.handle = Some(handle.clone());
        handle
    }

    pub const fn is_loaded(&self) -> bool {
        self.handle.is_some()
    }

    /// How many times the loader has run.
    pub const fn load_count(&self) -> usize {
        self.loads
    }
}

impl Default for LazyEngine {
    fn default() -> Self {
        Self::mermaid()
    }
}

impl fmt::Debug for LazyEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyEngine")
            .field("loaded", &self.is_loaded())
            .field("loads", &self.loads)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassStatus {
    Pending,
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    LoadEngine,
    Render { next: usize },
    Done,
}

/// One walk over the surface's diagram placeholders.
pub struct DiagramPass {
    config: EngineConfig,
    generation: u64,
    stage: Stage,
    engine: Option<EngineHandle>,
    rendered: usize,
    failed: usize,
}

impl DiagramPass {
    /// Begin a pass. Every placeholder is emptied right away so stale
    /// diagrams never linger while the pass runs.
    ///
    /// Returns `None` when the surface holds no placeholders; the engine is
    /// then never loaded.
    pub fn start(surface: &mut PreviewSurface, config: EngineConfig) -> Option<Self> {
        if surface.slot_count() == 0 {
            return None;
        }
        surface.clear_diagrams();
        Some(Self {
            config,
            generation: surface.generation(),
            stage: Stage::LoadEngine,
            engine: None,
            rendered: 0,
            failed: 0,
        })
    }

    pub const fn config(&self) -> EngineConfig {
        self.config
    }

    pub const fn is_done(&self) -> bool {
        matches!(self.stage, Stage::Done)
    }

    /// Diagrams rendered successfully so far.
    pub const fn rendered(&self) -> usize {
        self.rendered
    }

    /// Diagrams replaced with the error marker so far.
    pub const fn failed(&self) -> usize {
        self.failed
    }

    /// Advance the pass by one unit of work.
    pub fn step(&mut self, surface: &mut PreviewSurface, engine: &mut LazyEngine) -> PassStatus {
        match self.stage {
            Stage::Done => PassStatus::Done,
            Stage::LoadEngine => {
                let handle = engine.get();
                handle
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .initialize(self.config);
                self.engine = Some(handle);
                self.stage = Stage::Render { next: 0 };
                PassStatus::Pending
            }
            Stage::Render { next } => {
                if surface.generation() != self.generation {
                    tracing::debug!("preview replaced, abandoning diagram pass");
                    return self.finish();
                }
                let Some(index) = next_renderable(surface, next) else {
                    return self.finish();
                };
                self.render_slot(surface, index);
                if next_renderable(surface, index + 1).is_some() {
                    self.stage = Stage::Render { next: index + 1 };
                    PassStatus::Pending
                } else {
                    self.finish()
                }
            }
        }
    }

    /// Drive the pass to completion.
    pub fn run(&mut self, surface: &mut PreviewSurface, engine: &mut LazyEngine) {
        while self.step(surface, engine) == PassStatus::Pending {}
    }

    fn render_slot(&mut self, surface: &mut PreviewSurface, index: usize) {
        let Some(engine) = self.engine.clone() else {
            return;
        };
        let Some(slot) = surface.slot_mut(index) else {
            return;
        };
        let source = slot.source();
        let id = mermaid::next_render_id();
        let _scope = crate::perf::scope("diagram.render");
        let result = engine
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .render(&id, &source);
        match result {
            Ok(svg) => {
                self.rendered += 1;
                crate::perf::log_event("diagram.render", format!("{id} ok bytes={}", svg.len()));
                slot.set_inner_html(svg);
            }
            Err(err) => {
                self.failed += 1;
                tracing::warn!(%id, %err, "diagram render failed");
                crate::perf::log_event("diagram.render", format!("{id} failed: {err}"));
                slot.set_inner_html(ERROR_MARKER);
            }
        }
    }

    fn finish(&mut self) -> PassStatus {
        self.stage = Stage::Done;
        self.engine = None;
        PassStatus::Done
    }
}

impl fmt::Debug for DiagramPass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiagramPass")
            .field("config", &self.config)
            .field("generation", &self.generation)
            .field("stage", &self.stage)
            .field("rendered", &self.rendered)
            .field("failed", &self.failed)
            .finish_non_exhaustive()
    }
}

/// Index of the first slot at or after `from` with a non-empty source.
/// Whitespace-only sources still go to the engine.
fn next_renderable(surface: &PreviewSurface, from: usize) -> Option<usize> {
    surface
        .slots()
        .enumerate()
        .skip(from)
        .find(|(_, slot)| !slot.escaped_source().is_empty())
        .map(|(index, _)| index)
}

/// Owns the engine and at most one pass in flight.
#[derive(Debug, Default)]
pub struct DiagramScheduler {
    engine: LazyEngine,
    pending: Option<DiagramPass>,
    started: u64,
    cancelled: u64,
}

impl DiagramScheduler {
    pub fn new(engine: LazyEngine) -> Self {
        Self {
            engine,
            pending: None,
            started: 0,
            cancelled: 0,
        }
    }

    /// Start a fresh pass, abandoning any pass still running.
    pub fn trigger(&mut self, surface: &mut PreviewSurface, config: EngineConfig) {
        if self.pending.take().is_some() {
            self.cancelled += 1;
            tracing::debug!("diagram pass superseded");
        }
        self.pending = DiagramPass::start(surface, config);
        if self.pending.is_some() {
            self.started += 1;
            crate::perf::log_event(
                "diagram.pass",
                format!("start slots={} dark={}", surface.slot_count(), config.dark),
            );
        }
    }

    /// Do one unit of work on the pending pass.
    pub fn pump(&mut self, surface: &mut PreviewSurface) -> PassStatus {
        let Some(pass) = self.pending.as_mut() else {
            return PassStatus::Done;
        };
        let status = pass.step(surface, &mut self.engine);
        if status == PassStatus::Done {
            if let Some(pass) = self.pending.take() {
                tracing::debug!(rendered = pass.rendered(), failed = pass.failed(), "diagram pass done");
            }
        }
        status
    }

    /// Run the pending pass to completion.
    pub fn settle(&mut self, surface: &mut PreviewSurface) {
        while self.pump(surface) == PassStatus::Pending {}
    }

    pub const fn is_busy(&self) -> bool {
        self.pending.is_some()
    }

    pub const fn engine(&self) -> &LazyEngine {
        &self.engine
    }

    pub const fn passes_started(&self) -> u64 {
        self.started
    }

    pub const fn passes_cancelled(&self) -> u64 {
        self.cancelled
    }
}
