use futures::future::BoxFuture;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// Exit code requested when a start callback fails
pub const EXIT_START_FAILED: i32 = 10;
/// Exit code requested when a shutdown callback fails
pub const EXIT_SHUTDOWN_FAILED: i32 = 11;
/// Exit code requested by [`crate::Lifecycle::abort`]
pub const EXIT_ABORT: i32 = 12;
/// Exit code used when a signal-driven shutdown has to be cut short
pub const EXIT_SIGNAL_FORCED: i32 = 1;

/// Application lifecycle phases, in the order they are entered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum Phase {
    /// Registration of components and hooks happens here
    Initing = 0,
    /// Component start callbacks are running in dependency order
    Starting = 1,
    /// All components started
    Running = 2,
    /// Component shutdown callbacks are running in reverse order
    Shutingdown = 3,
    /// Shutdown completed (or was skipped); terminal
    Halt = 4,
}

impl Phase {
    pub(crate) fn from_u8(value: u8) -> Self {
        match value {
            0 => Phase::Initing,
            1 => Phase::Starting,
            2 => Phase::Running,
            3 => Phase::Shutingdown,
            _ => Phase::Halt,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Initing => "Initing",
            Phase::Starting => "Starting",
            Phase::Running => "Running",
            Phase::Shutingdown => "Shutingdown",
            Phase::Halt => "Halt",
        };
        f.write_str(name)
    }
}

/// Transition points at which hooks fire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookEvent {
    /// Before entering `Starting`
    BeforeStarting,
    /// After every component started, before entering `Running`
    BeforeRunning,
    /// Right after entering `Shutingdown`, before any component stops
    BeforeShutingdown,
    /// On abnormal termination. These run in any phase, even before the
    /// hooking package finished its own start, so they must not assume
    /// that anything they touch is open.
    OnAbort,
}

impl HookEvent {
    pub const ALL: [HookEvent; 4] = [
        HookEvent::BeforeStarting,
        HookEvent::BeforeRunning,
        HookEvent::BeforeShutingdown,
        HookEvent::OnAbort,
    ];

    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for HookEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HookEvent::BeforeStarting => "BeforeStarting",
            HookEvent::BeforeRunning => "BeforeRunning",
            HookEvent::BeforeShutingdown => "BeforeShutingdown",
            HookEvent::OnAbort => "OnAbort",
        };
        f.write_str(name)
    }
}

/// Callback invoked by the orchestrator for components and hooks
pub type Callback = Arc<dyn Fn() -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync>;

/// Box an async closure into a [`Callback`]
pub fn callback<F, Fut>(f: F) -> Callback
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    Arc::new(move || -> BoxFuture<'static, anyhow::Result<()>> { Box::pin(f()) })
}
