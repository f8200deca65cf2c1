use cadre_agents::AgentManager;
use cadre_core::{DispatchResult, Invocation};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// How a polling loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// The condition matched and the action ran.
    Matched {
        /// Total dispatches performed by this assignment.
        polls: u64,
    },
    /// [`Assignment::stop`] was called before the condition matched.
    Cancelled {
        /// Total dispatches performed by this assignment.
        polls: u64,
    },
    /// The assignment had already stopped; nothing was dispatched.
    AlreadyStopped,
}

/// A standing check that polls one capability until a condition holds,
/// then fires a one-shot action.
///
/// Starts running; stops exactly once, either when its condition first
/// matches or when [`Assignment::stop`] is called. A stopped assignment never
/// dispatches again; create a new one instead.
pub struct Assignment {
    name: String,
    description: String,
    manager: Arc<AgentManager>,
    agent_name: String,
    capability_name: String,
    call: Invocation,
    expected_input_type: String,
    running: AtomicBool,
    polls: AtomicU64,
    cancel: CancellationToken,
}

impl Assignment {
    /// Create an assignment targeting `agent_name.capability_name`.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        manager: Arc<AgentManager>,
        agent_name: impl Into<String>,
        capability_name: impl Into<String>,
    ) -> Self {
        let expected_input_type = manager.expected_input_type().to_string();
        Self {
            name: name.into(),
            description: description.into(),
            manager,
            agent_name: agent_name.into(),
            capability_name: capability_name.into(),
            call: Invocation::default(),
            expected_input_type,
            running: AtomicBool::new(true),
            polls: AtomicU64::new(0),
            cancel: CancellationToken::new(),
        }
    }

    /// Fixed arguments sent with every poll.
    pub fn with_invocation(mut self, call: Invocation) -> Self {
        self.call = call;
        self
    }

    /// Override the expected-input tag shown by [`Assignment::describe`].
    pub fn with_expected_input_type(mut self, input_type: impl Into<String>) -> Self {
        self.expected_input_type = input_type.into();
        self
    }

    /// Assignment name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the assignment is still active.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Number of dispatches performed so far.
    pub fn poll_count(&self) -> u64 {
        self.polls.load(Ordering::SeqCst)
    }

    /// Stop from outside the loop. Observed before the next dispatch or
    /// immediately at the wait point. The action does not run.
    pub fn stop(&self) {
        if self.running.swap(false, Ordering::SeqCst) {
            info!(assignment = %self.name, "Assignment stopped externally");
        }
        self.cancel.cancel();
    }

    /// Poll every `interval` until `condition` holds, then run `action` once.
    ///
    /// Every dispatch result, errors included, goes to `condition`; there is
    /// no retry or backoff. Calling this on a stopped assignment returns
    /// [`PollOutcome::AlreadyStopped`] without dispatching.
    pub async fn poll_loop<C, A>(&self, interval: Duration, condition: C, action: A) -> PollOutcome
    where
        C: Fn(&DispatchResult) -> bool,
        A: FnOnce(),
    {
        if !self.is_running() {
            return PollOutcome::AlreadyStopped;
        }

        info!(
            assignment = %self.name,
            agent = %self.agent_name,
            capability = %self.capability_name,
            interval_ms = interval.as_millis() as u64,
            "Assignment polling started"
        );

        loop {
            if !self.is_running() {
                return PollOutcome::Cancelled {
                    polls: self.poll_count(),
                };
            }

            let result = self
                .manager
                .dispatch(&self.agent_name, &self.capability_name, self.call.clone())
                .await;
            let polls = self.polls.fetch_add(1, Ordering::SeqCst) + 1;

            if condition(&result) {
                // Only the caller that flips the flag may fire the action.
                if self
                    .running
                    .compare_exchange(true, false, Ordering::SeqCst, Ordering::SeqCst)
                    .is_err()
                {
                    return PollOutcome::Cancelled { polls };
                }
                info!(assignment = %self.name, polls, "Assignment condition met");
                action();
                return PollOutcome::Matched { polls };
            }

            debug!(assignment = %self.name, polls, "Condition not met, waiting");
            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                _ = self.cancel.cancelled() => {
                    return PollOutcome::Cancelled { polls };
                }
            }
        }
    }

    /// Run [`Assignment::poll_loop`] as an independent tokio task.
    pub fn spawn<C, A>(
        self: &Arc<Self>,
        interval: Duration,
        condition: C,
        action: A,
    ) -> JoinHandle<PollOutcome>
    where
        C: Fn(&DispatchResult) -> bool + Send + 'static,
        A: FnOnce() + Send + 'static,
    {
        let assignment = Arc::clone(self);
        tokio::spawn(async move { assignment.poll_loop(interval, condition, action).await })
    }

    /// Render this assignment for inclusion in an LLM prompt.
    pub fn describe(&self) -> String {
        format!(
            "You also have access to these special agents {} that can complete the assignment '{}' available:\n\
             1. Name: {}   Description: {}   Function: {} (Expected Input: {})\n\
             What would you like to do?",
            self.agent_name,
            self.name,
            self.name,
            self.description,
            self.capability_name,
            self.expected_input_type
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use cadre_agents::DynamicAgent;
    use cadre_core::DispatchErrorKind;
    use serde_json::json;
    use std::sync::atomic::AtomicUsize;

    fn security_manager() -> Arc<AgentManager> {
        let manager = AgentManager::new();
        manager.register(
            DynamicAgent::builder("SecurityAgent", "Monitors room entrance")
                .capability_fn("check_if_x_entered", |_| Ok(json!({"result": "x_entered"})))
                .build()
                .unwrap(),
        );
        Arc::new(manager)
    }

    #[tokio::test]
    async fn test_immediate_match_runs_action_once() {
        let assignment = Assignment::new(
            "MonitorEntrance",
            "Monitor the room entrance for person X",
            security_manager(),
            "SecurityAgent",
            "check_if_x_entered",
        );
        let fired = AtomicUsize::new(0);

        let outcome = assignment
            .poll_loop(
                Duration::from_millis(5),
                |r| r.field("result") == Some(&json!("x_entered")),
                || {
                    fired.fetch_add(1, Ordering::SeqCst);
                },
            )
            .await;

        assert_eq!(outcome, PollOutcome::Matched { polls: 1 });
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert!(!assignment.is_running());
    }

    #[tokio::test]
    async fn test_stopped_assignment_never_dispatches_again() {
        let assignment = Assignment::new("a", "b", security_manager(), "SecurityAgent", "check_if_x_entered");
        assignment
            .poll_loop(Duration::from_millis(1), |_| true, || {})
            .await;
        assert_eq!(assignment.poll_count(), 1);

        let again = assignment
            .poll_loop(Duration::from_millis(1), |_| true, || panic!("must not fire"))
            .await;
        assert_eq!(again, PollOutcome::AlreadyStopped);
        assert_eq!(assignment.poll_count(), 1);
    }

    #[tokio::test]
    async fn test_errors_are_passed_to_condition() {
        let assignment = Assignment::new("a", "b", security_manager(), "Nobody", "nothing");
        let outcome = assignment
            .poll_loop(
                Duration::from_millis(1),
                |r| r.error_kind() == Some(DispatchErrorKind::AgentNotFound),
                || {},
            )
            .await;
        assert_eq!(outcome, PollOutcome::Matched { polls: 1 });
    }

    #[tokio::test]
    async fn test_stop_interrupts_wait() {
        let assignment = Arc::new(Assignment::new(
            "never",
            "condition never holds",
            security_manager(),
            "SecurityAgent",
            "check_if_x_entered",
        ));
        let handle = assignment.spawn(Duration::from_secs(60), |_| false, || panic!("must not fire"));

        while assignment.poll_count() == 0 {
            tokio::task::yield_now().await;
        }
        assignment.stop();

        let outcome = tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(outcome, PollOutcome::Cancelled { polls: 1 });
        assert!(!assignment.is_running());
    }

    #[tokio::test]
    async fn test_stop_before_start() {
        let assignment = Assignment::new("a", "b", security_manager(), "SecurityAgent", "check_if_x_entered");
        assignment.stop();
        let outcome = assignment
            .poll_loop(Duration::from_millis(1), |_| true, || {})
            .await;
        assert_eq!(outcome, PollOutcome::AlreadyStopped);
        assert_eq!(assignment.poll_count(), 0);
    }

    #[test]
    fn test_describe_exact_format() {
        let assignment = Assignment::new(
            "MonitorEntrance",
            "Monitor the room entrance for person X",
            security_manager(),
            "SecurityAgent",
            "check_if_x_entered",
        );
        assert_eq!(
            assignment.describe(),
            "You also have access to these special agents SecurityAgent that can complete the assignment 'MonitorEntrance' available:\n\
             1. Name: MonitorEntrance   Description: Monitor the room entrance for person X   \
             Function: check_if_x_entered (Expected Input: JSON)\n\
             What would you like to do?"
        );
    }
}
