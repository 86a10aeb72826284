use async_trait::async_trait;

/// The side-effecting job the scheduler fires once per cycle.
///
/// Implementations must be `Send + Sync`: the loop and any number of manual
/// triggers may call [`Task::run`] at the same time, so a task must not rely
/// on exclusive access to shared state.
#[async_trait]
pub trait Task: Send + Sync {
    /// Stable label used in logs.
    fn name(&self) -> &str;

    /// Perform one delivery. `Ok` carries a one-line summary for logs and
    /// the manual-trigger response.
    ///
    /// Errors are reported, never retried immediately: the loop backs off and
    /// recomputes the next daily target.
    async fn run(&self) -> afterglow_core::Result<String>;
}
