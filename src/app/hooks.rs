use super::fault::{invoke, Fault};
use super::types::{Callback, HookEvent, Phase};
use crate::error::LifeError;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{error, info, warn};

/// Callback bound to a lifecycle event. `name` is only used for logging.
pub(crate) struct Hook {
    name: String,
    order: i32,
    callback: Callback,
}

/// Hooks partitioned by event, each group kept in registration order
#[derive(Default)]
pub(crate) struct HookRegistry {
    groups: Mutex<[Vec<Arc<Hook>>; 4]>,
}

impl HookRegistry {
    pub(crate) fn insert(&self, name: String, order: i32, event: HookEvent, callback: Callback) {
        self.groups.lock()[event.index()].push(Arc::new(Hook {
            name,
            order,
            callback,
        }));
    }

    /// Hooks of `event`, ascending by order
    fn sorted(&self, event: HookEvent) -> Vec<Arc<Hook>> {
        let mut hooks = self.groups.lock()[event.index()].clone();
        hooks.sort_by_key(|hook| hook.order);
        hooks
    }

    pub(crate) fn count(&self, event: HookEvent) -> usize {
        self.groups.lock()[event.index()].len()
    }

    /// Run every hook of `event` in order on a separate task.
    ///
    /// Returns once the group finished or `bound` elapsed, whichever comes first. A group that
    /// overruns keeps running in the background; it is never cancelled.
    pub(super) async fn run(
        &self,
        event: HookEvent,
        phase: Phase,
        bound: Duration,
    ) -> Result<(), Fault> {
        let hooks = self.sorted(event);
        if hooks.is_empty() {
            return Ok(());
        }

        let handle = tokio::spawn(async move {
            for hook in hooks {
                info!("Execute {} hook: {}", event, hook.name);
                let name = hook.name.clone();
                let result = invoke(&hook.callback, phase, move |source| LifeError::Hook {
                    hook: name,
                    event,
                    source,
                })
                .await;
                // The caller may have stopped waiting on this task, so report here
                if let Err(fault) = result {
                    error!("Stop {} hooks after {}: {}", event, hook.name, fault.describe());
                    return Err(fault);
                }
                info!("Done {}", hook.name);
            }
            Ok::<(), Fault>(())
        });

        match timeout(bound, handle).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_error)) if join_error.is_panic() => {
                Err(Fault::Panicked(join_error.into_panic()))
            }
            Ok(Err(join_error)) => {
                warn!("{} hooks did not complete: {}", event, join_error);
                Ok(())
            }
            Err(_) => {
                warn!("{} hook timeout", event);
                Ok(())
            }
        }
    }

    /// Run the `OnAbort` group, logging a failure instead of returning it
    pub(super) async fn run_abort(&self, phase: Phase, bound: Duration) {
        if let Err(fault) = self.run(HookEvent::OnAbort, phase, bound).await {
            error!("OnAbort hook failed: {}", fault.describe());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::tests::LogCapture;
    use crate::app::types::callback;
    use std::time::Instant;

    type Log = Arc<Mutex<Vec<String>>>;

    fn log_hook(log: &Log, msg: &'static str) -> Callback {
        let log = Arc::clone(log);
        callback(move || {
            let log = Arc::clone(&log);
            async move {
                log.lock().push(msg.to_string());
                Ok(())
            }
        })
    }

    #[tokio::test]
    async fn test_hooks_run_in_ascending_order() {
        let log: Log = Arc::default();
        let registry = HookRegistry::default();
        registry.insert("foo".into(), 10, HookEvent::BeforeStarting, log_hook(&log, "foo"));
        registry.insert("bar".into(), 9, HookEvent::BeforeStarting, log_hook(&log, "bar"));
        registry.insert("foobar".into(), 11, HookEvent::BeforeStarting, log_hook(&log, "foobar"));
        registry.insert("other".into(), 0, HookEvent::BeforeRunning, log_hook(&log, "other"));

        assert!(registry
            .run(HookEvent::BeforeStarting, Phase::Initing, Duration::from_secs(1))
            .await
            .is_ok());
        assert_eq!(*log.lock(), ["bar", "foo", "foobar"]);
        assert_eq!(registry.count(HookEvent::BeforeStarting), 3);
        assert_eq!(registry.count(HookEvent::OnAbort), 0);
    }

    #[tokio::test]
    async fn test_error_stops_group() {
        let log: Log = Arc::default();
        let registry = HookRegistry::default();
        registry.insert(
            "broken".into(),
            0,
            HookEvent::BeforeRunning,
            callback(|| async { Err(anyhow::anyhow!("boom")) }),
        );
        registry.insert("after".into(), 1, HookEvent::BeforeRunning, log_hook(&log, "after"));

        let result = registry
            .run(HookEvent::BeforeRunning, Phase::Starting, Duration::from_secs(1))
            .await;
        match result {
            Err(Fault::Failed(LifeError::Hook { hook, event, .. })) => {
                assert_eq!(hook, "broken");
                assert_eq!(event, HookEvent::BeforeRunning);
            }
            _ => panic!("expected hook failure"),
        }
        assert!(log.lock().is_empty());
    }

    async fn explode() -> anyhow::Result<()> {
        panic!("hook exploded")
    }

    #[tokio::test]
    async fn test_panic_is_reported_as_fault() {
        let registry = HookRegistry::default();
        registry.insert(
            "panics".into(),
            0,
            HookEvent::BeforeShutingdown,
            callback(explode),
        );

        let result = registry
            .run(HookEvent::BeforeShutingdown, Phase::Shutingdown, Duration::from_secs(1))
            .await;
        match result {
            Err(fault @ Fault::Panicked(_)) => {
                assert_eq!(fault.describe(), "panic: hook exploded")
            }
            _ => panic!("expected panic fault"),
        }
    }

    #[tokio::test]
    async fn test_stuck_group_returns_within_bound() {
        let (release, hold) = tokio::sync::oneshot::channel::<()>();
        let hold = Arc::new(tokio::sync::Mutex::new(Some(hold)));
        let log: Log = Arc::default();
        let registry = HookRegistry::default();
        registry.insert(
            "stuck".into(),
            0,
            HookEvent::OnAbort,
            callback(move || {
                let hold = Arc::clone(&hold);
                async move {
                    if let Some(rx) = hold.lock().await.take() {
                        let _ = rx.await;
                    }
                    Ok(())
                }
            }),
        );
        registry.insert("late".into(), 1, HookEvent::OnAbort, log_hook(&log, "late"));

        let started = Instant::now();
        registry.run_abort(Phase::Running, Duration::from_millis(20)).await;
        assert!(started.elapsed() < Duration::from_secs(1));
        assert!(log.lock().is_empty());

        // The group was not cancelled and finishes once released
        release.send(()).unwrap();
        for _ in 0..100 {
            if !log.lock().is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(*log.lock(), ["late"]);
    }

    #[tokio::test]
    async fn test_failure_after_bound_is_logged() {
        let capture = LogCapture::default();
        let _guard = capture.install();
        let registry = HookRegistry::default();
        registry.insert(
            "late".into(),
            0,
            HookEvent::BeforeStarting,
            callback(|| async {
                tokio::time::sleep(Duration::from_millis(30)).await;
                Err(anyhow::anyhow!("late failure"))
            }),
        );

        assert!(registry
            .run(HookEvent::BeforeStarting, Phase::Initing, Duration::from_millis(5))
            .await
            .is_ok());
        assert!(capture.contents().contains("BeforeStarting hook timeout"));

        tokio::time::sleep(Duration::from_millis(100)).await;
        let output = capture.contents();
        assert!(
            output.contains("Stop BeforeStarting hooks after late")
                && output.contains("late failure"),
            "late failure not logged:\n{}",
            output
        );
    }

    #[tokio::test]
    async fn test_empty_group() {
        let registry = HookRegistry::default();
        assert!(registry
            .run(HookEvent::OnAbort, Phase::Halt, Duration::from_millis(1))
            .await
            .is_ok());
    }
}
