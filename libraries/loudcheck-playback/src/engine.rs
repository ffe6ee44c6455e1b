//! Rendering engine seam
//!
//! The transport never talks to an audio API directly. A [`RenderEngine`]
//! builds one [`RenderGraph`] per loaded track; the graph owns the rendering
//! clock and pulls samples from its [`SharedRenderer`].
//!
//! [`ManualEngine`] is a headless engine whose clock is driven by the caller.

use crate::error::{PlaybackError, Result};
use crate::renderer::{lock_renderer, Renderer, SharedRenderer};
use loudcheck_core::AudioTrack;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::debug;

/// Per-graph settings chosen by the transport
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderSettings {
    /// Time constant of the gain stage
    pub gain_smoothing: Duration,
}

/// Builds rendering graphs
pub trait RenderEngine {
    /// Graph type produced by this engine
    type Graph: RenderGraph;

    /// Build a graph for a track, paused at frame 0 and at unity gain
    fn build(&mut self, track: &AudioTrack, settings: RenderSettings) -> Result<Self::Graph>;
}

/// One live rendering session
pub trait RenderGraph {
    /// Renderer pulled by this graph's clock
    fn renderer(&self) -> &SharedRenderer;

    /// Whether the clock is suspended and must be resumed before starting
    fn is_suspended(&self) -> bool;

    /// Resume a suspended clock
    fn resume(&mut self) -> Result<()>;

    /// Start pulling samples
    fn start(&mut self) -> Result<()>;

    /// Stop pulling samples; the graph stays alive
    fn halt(&mut self);

    /// Release the graph; later calls are no-ops
    fn close(&mut self);
}

#[derive(Debug)]
struct ManualState {
    output_channels: u16,
    suspended: bool,
    refuse_resume: bool,
    fail_builds: bool,
    running: bool,
    current: Option<SharedRenderer>,
    live_graphs: usize,
    max_live_graphs: usize,
    graphs_built: usize,
}

/// Headless engine driven by [`ManualEngine::pull`]
///
/// Clones share state, so a test can keep a handle while the transport owns
/// the engine.
///
/// # Example
///
/// ```rust
/// use loudcheck_core::AudioTrack;
/// use loudcheck_playback::{ManualEngine, PlaybackTransport, TransportConfig};
///
/// let engine = ManualEngine::new(2);
/// let mut transport = PlaybackTransport::new(engine.clone(), TransportConfig::default());
///
/// let track = AudioTrack::new(44_100, vec![vec![0.5; 44_100]]).unwrap();
/// transport.load(track).unwrap();
/// transport.play().unwrap();
///
/// let mut buffer = vec![0.0_f32; 512];
/// assert_eq!(engine.pull(&mut buffer), 256);
/// assert_eq!(buffer[0], 0.5);
/// ```
#[derive(Debug, Clone)]
pub struct ManualEngine {
    inner: Arc<Mutex<ManualState>>,
}

impl Default for ManualEngine {
    fn default() -> Self {
        Self::new(2)
    }
}

impl ManualEngine {
    /// Create an engine with the given output channel count
    pub fn new(output_channels: u16) -> Self {
        Self {
            inner: Arc::new(Mutex::new(ManualState {
                output_channels: output_channels.max(1),
                suspended: false,
                refuse_resume: false,
                fail_builds: false,
                running: false,
                current: None,
                live_graphs: 0,
                max_live_graphs: 0,
                graphs_built: 0,
            })),
        }
    }

    fn state(&self) -> MutexGuard<'_, ManualState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Suspend or release the clock (a suspended clock must be resumed)
    pub fn set_suspended(&self, suspended: bool) {
        self.state().suspended = suspended;
    }

    /// Make [`RenderGraph::resume`] fail
    pub fn set_refuse_resume(&self, refuse: bool) {
        self.state().refuse_resume = refuse;
    }

    /// Make [`RenderEngine::build`] fail
    pub fn set_fail_builds(&self, fail: bool) {
        self.state().fail_builds = fail;
    }

    /// Output channel count
    pub fn output_channels(&self) -> u16 {
        self.state().output_channels
    }

    /// Whether the clock is suspended
    pub fn is_suspended(&self) -> bool {
        self.state().suspended
    }

    /// Whether the live graph is started
    pub fn is_running(&self) -> bool {
        self.state().running
    }

    /// Graphs built and not yet closed
    pub fn live_graphs(&self) -> usize {
        self.state().live_graphs
    }

    /// Highest number of graphs ever alive at once
    pub fn max_live_graphs(&self) -> usize {
        self.state().max_live_graphs
    }

    /// Graphs built so far
    pub fn graphs_built(&self) -> usize {
        self.state().graphs_built
    }

    /// Render one interleaved buffer from the live graph
    ///
    /// Writes silence when no graph is started. Returns the number of track
    /// frames consumed.
    pub fn pull(&self, output: &mut [f32]) -> usize {
        let state = self.state();
        match (&state.current, state.running) {
            (Some(renderer), true) => lock_renderer(renderer).render(output),
            _ => {
                output.fill(0.0);
                0
            }
        }
    }
}

impl RenderEngine for ManualEngine {
    type Graph = ManualGraph;

    fn build(&mut self, track: &AudioTrack, settings: RenderSettings) -> Result<ManualGraph> {
        let mut state = self.state();
        if state.fail_builds {
            return Err(PlaybackError::GraphBuild("build refused".to_string()));
        }

        let renderer =
            Renderer::new(track.clone(), state.output_channels, settings.gain_smoothing)
                .into_shared();

        state.current = Some(Arc::clone(&renderer));
        state.running = false;
        state.live_graphs += 1;
        state.max_live_graphs = state.max_live_graphs.max(state.live_graphs);
        state.graphs_built += 1;
        debug!("Manual graph #{} built", state.graphs_built);

        Ok(ManualGraph {
            renderer,
            engine: Arc::clone(&self.inner),
            closed: false,
        })
    }
}

/// Graph produced by [`ManualEngine`]
#[derive(Debug)]
pub struct ManualGraph {
    renderer: SharedRenderer,
    engine: Arc<Mutex<ManualState>>,
    closed: bool,
}

impl ManualGraph {
    fn state(&self) -> MutexGuard<'_, ManualState> {
        self.engine.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_current(&self, state: &ManualState) -> bool {
        state
            .current
            .as_ref()
            .is_some_and(|current| Arc::ptr_eq(current, &self.renderer))
    }
}

impl RenderGraph for ManualGraph {
    fn renderer(&self) -> &SharedRenderer {
        &self.renderer
    }

    fn is_suspended(&self) -> bool {
        self.state().suspended
    }

    fn resume(&mut self) -> Result<()> {
        let mut state = self.state();
        if state.refuse_resume {
            return Err(PlaybackError::RenderingUnavailable(
                "clock resume refused".to_string(),
            ));
        }
        state.suspended = false;
        Ok(())
    }

    fn start(&mut self) -> Result<()> {
        if self.closed {
            return Err(PlaybackError::InvalidOperation("graph closed".to_string()));
        }
        let mut state = self.state();
        if state.suspended {
            return Err(PlaybackError::RenderingUnavailable(
                "clock suspended".to_string(),
            ));
        }
        if self.is_current(&state) {
            state.running = true;
        }
        Ok(())
    }

    fn halt(&mut self) {
        let mut state = self.state();
        if self.is_current(&state) {
            state.running = false;
        }
    }

    fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;

        let mut state = self.state();
        if self.is_current(&state) {
            state.current = None;
            state.running = false;
        }
        state.live_graphs = state.live_graphs.saturating_sub(1);
    }
}

impl Drop for ManualGraph {
    fn drop(&mut self) {
        self.close();
    }
}
