use tracing::warn;

/// Process termination facility used by the abort path and the signal monitor.
///
/// Callers never assume the process is gone once `exit` returns; test doubles simply record
/// the requested code.
pub trait Terminator: Send + Sync {
    fn exit(&self, code: i32);
}

/// Terminates the real process
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessTerminator;

impl Terminator for ProcessTerminator {
    fn exit(&self, code: i32) {
        warn!("Exiting process with code {}", code);
        std::process::exit(code);
    }
}
