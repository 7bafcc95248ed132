//! Top-level error boundary.
//!
//! Expected failures are handled where they happen and shown as state.
//! Anything that still escapes (a panic inside a screen's task) is caught
//! here and turned into a [`Fault`] offering "retry" and "go home".

use std::future::Future;

use mall_auth::Destination;
use serde::Serialize;
use tokio::task::JoinError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecoveryAction {
    /// Run the failed task again.
    Retry,
    /// Navigate to the home page.
    GoHome,
}

impl RecoveryAction {
    pub fn label(&self) -> &'static str {
        match self {
            RecoveryAction::Retry => "Try again",
            RecoveryAction::GoHome => "Go to home page",
        }
    }

    /// Where the action navigates, if anywhere.
    pub fn destination(&self) -> Option<Destination> {
        match self {
            RecoveryAction::Retry => None,
            RecoveryAction::GoHome => Some(Destination::Home),
        }
    }
}

/// An unexpected failure caught by the boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Fault {
    pub task: &'static str,
    /// Diagnostic detail for logs; not shown to users.
    #[serde(skip)]
    pub detail: String,
    pub actions: [RecoveryAction; 2],
}

impl Fault {
    fn new(task: &'static str, detail: String) -> Self {
        Self {
            task,
            detail,
            actions: [RecoveryAction::Retry, RecoveryAction::GoHome],
        }
    }

    fn from_join(task: &'static str, e: JoinError) -> Self {
        if e.is_cancelled() {
            return Self::new(task, "task was cancelled".to_string());
        }

        let payload = e.into_panic();
        let detail = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "unknown panic".to_string()
        };
        Self::new(task, detail)
    }

    pub fn user_message(&self) -> &'static str {
        "Something went wrong. You can try again or go back to the home page."
    }
}

/// Run `future` on the runtime, converting a panic into a [`Fault`].
pub async fn run<F, T>(task: &'static str, future: F) -> Result<T, Fault>
where
    F: Future<Output = T> + Send + 'static,
    T: Send + 'static,
{
    match tokio::spawn(future).await {
        Ok(value) => Ok(value),
        Err(e) => {
            let fault = Fault::from_join(task, e);
            tracing::error!(task, detail = %fault.detail, "unexpected failure caught by error boundary");
            Err(fault)
        }
    }
}

/// Like [`run`], re-running the task from `make` each time the user picks
/// [`RecoveryAction::Retry`]. `choose` sees every fault; returning
/// [`RecoveryAction::GoHome`] gives up with that fault.
pub async fn run_with_recovery<M, F, T, C>(task: &'static str, mut make: M, mut choose: C) -> Result<T, Fault>
where
    M: FnMut() -> F,
    F: Future<Output = T> + Send + 'static,
    T: Send + 'static,
    C: FnMut(&Fault) -> RecoveryAction,
{
    loop {
        match run(task, make()).await {
            Ok(value) => return Ok(value),
            Err(fault) => match choose(&fault) {
                RecoveryAction::Retry => {
                    tracing::info!(task, "retrying after fault");
                }
                RecoveryAction::GoHome => return Err(fault),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn passes_values_through() {
        assert_eq!(run("ok", async { 42 }).await, Ok(42));
    }

    #[tokio::test]
    async fn panics_become_faults() {
        let result: Result<(), Fault> = run("explodes", async { panic!("index out of bounds") }).await;
        let fault = result.unwrap_err();

        assert_eq!(fault.task, "explodes");
        assert_eq!(fault.detail, "index out of bounds");
        assert_eq!(fault.actions, [RecoveryAction::Retry, RecoveryAction::GoHome]);
        assert_eq!(RecoveryAction::GoHome.destination(), Some(Destination::Home));
    }

    #[tokio::test]
    async fn retry_reruns_until_success() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = attempts.clone();

        let value = run_with_recovery(
            "flaky",
            move || {
                let counter = counter.clone();
                async move {
                    if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                        panic!("transient");
                    }
                    "loaded"
                }
            },
            |_| RecoveryAction::Retry,
        )
        .await;

        assert_eq!(value, Ok("loaded"));
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn go_home_gives_up() {
        let result: Result<(), Fault> =
            run_with_recovery("broken", || async { panic!("always") }, |_| RecoveryAction::GoHome).await;
        assert_eq!(result.unwrap_err().detail, "always");
    }
}
