//! Job orchestrator: accepts submissions and runs each transformation as a
//! fire-and-forget Tokio task.

use std::sync::Arc;
use std::time::Instant;

use tracing::{Instrument, debug, error, info, info_span, warn};

use ageforge_ai::{PromptCatalog, TransformationGateway, TransformationRequest};
use ageforge_core::{JobId, Submission};

use super::store::{JobStore, JobStoreError, UpdateOutcome};
use super::types::JobOutcome;

const ABORTED_REASON: &str = "transformation task ended before reporting a result";

/// Accepts transformation submissions and drives each one to a terminal state.
///
/// The orchestrator itself holds no job data; everything goes through the store.
pub struct JobOrchestrator<S> {
    store: S,
    gateway: Arc<dyn TransformationGateway>,
    prompts: PromptCatalog,
}

impl<S> Clone for JobOrchestrator<S>
where
    S: Clone,
{
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            gateway: Arc::clone(&self.gateway),
            prompts: self.prompts,
        }
    }
}

impl<S> JobOrchestrator<S>
where
    S: JobStore + Clone + 'static,
{
    pub fn new(store: S, gateway: Arc<dyn TransformationGateway>) -> Self {
        Self {
            store,
            gateway,
            prompts: PromptCatalog::new(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Register a new job and launch its transformation in the background.
    ///
    /// Returns as soon as the job exists in the store; the gateway call runs on
    /// its own task. Must be called from within a Tokio runtime.
    pub fn submit(&self, submission: Submission) -> Result<JobId, JobStoreError> {
        let job_id = JobId::new();
        self.store.create(job_id)?;

        info!(
            job_id = %job_id,
            profession = %submission.profession(),
            target_age = submission.target_age(),
            image_bytes = submission.image().len(),
            "job submitted"
        );

        let span = info_span!("transformation_job", job_id = %job_id);
        tokio::spawn(
            run_unit_of_work(
                job_id,
                self.store.clone(),
                Arc::clone(&self.gateway),
                self.prompts,
                submission,
            )
            .instrument(span),
        );

        Ok(job_id)
    }
}

/// Body of the background task: build the prompt, call the gateway once, record
/// the outcome. Nothing escapes; a panic or a dropped task is recorded as a failure
/// by [`TerminalGuard`].
async fn run_unit_of_work<S: JobStore>(
    job_id: JobId,
    store: S,
    gateway: Arc<dyn TransformationGateway>,
    prompts: PromptCatalog,
    submission: Submission,
) {
    let guard = TerminalGuard::new(&store, job_id);

    let (image, profession, target_age) = submission.into_parts();
    let prompt = prompts.prompt_for(&profession, target_age);
    debug!(prompt = %prompt, "calling transformation gateway");

    let started = Instant::now();
    let outcome = match gateway
        .transform(TransformationRequest::new(image, prompt))
        .await
    {
        Ok(result_url) => {
            info!(
                elapsed_ms = started.elapsed().as_millis() as u64,
                "transformation completed"
            );
            JobOutcome::completed(result_url)
        }
        Err(e) => {
            warn!(
                error = %e,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "transformation failed"
            );
            JobOutcome::failed(e.to_string())
        }
    };

    guard.finish(outcome);
}

/// Records `Failed` on drop unless [`TerminalGuard::finish`] ran first.
struct TerminalGuard<'a, S: JobStore> {
    store: &'a S,
    job_id: JobId,
    finished: bool,
}

impl<'a, S: JobStore> TerminalGuard<'a, S> {
    fn new(store: &'a S, job_id: JobId) -> Self {
        Self {
            store,
            job_id,
            finished: false,
        }
    }

    fn finish(mut self, outcome: JobOutcome) {
        self.finished = true;
        record_outcome(self.store, self.job_id, outcome);
    }
}

impl<S: JobStore> Drop for TerminalGuard<'_, S> {
    fn drop(&mut self) {
        if !self.finished {
            error!(job_id = %self.job_id, "transformation task aborted");
            record_outcome(self.store, self.job_id, JobOutcome::failed(ABORTED_REASON));
        }
    }
}

fn record_outcome<S: JobStore>(store: &S, job_id: JobId, outcome: JobOutcome) {
    let status = outcome.status();
    match store.update(job_id, outcome) {
        Ok(UpdateOutcome::Applied) => {
            debug!(job_id = %job_id, status = %status, "job status transition");
        }
        Ok(UpdateOutcome::Missing) => {
            debug!(job_id = %job_id, status = %status, "late update for evicted job ignored");
        }
        Ok(UpdateOutcome::AlreadyTerminal(current)) => {
            warn!(job_id = %job_id, status = %status, current = %current, "job already terminal");
        }
        Err(e) => {
            error!(job_id = %job_id, error = %e, "failed to record job outcome");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;

    use ageforge_ai::GatewayError;

    use super::*;
    use crate::jobs::store::InMemoryJobStore;
    use crate::jobs::types::{Job, JobStatus};

    /// Gateway stub: optional delay, then a fixed answer. Records every prompt.
    struct StubGateway {
        delay: Duration,
        answer: Result<String, GatewayError>,
        prompts: Mutex<Vec<String>>,
    }

    impl StubGateway {
        fn ok(url: &str) -> Self {
            Self::new(Duration::ZERO, Ok(url.to_string()))
        }

        fn err(error: GatewayError) -> Self {
            Self::new(Duration::ZERO, Err(error))
        }

        fn new(delay: Duration, answer: Result<String, GatewayError>) -> Self {
            Self {
                delay,
                answer,
                prompts: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl TransformationGateway for StubGateway {
        async fn transform(&self, request: TransformationRequest) -> Result<String, GatewayError> {
            self.prompts.lock().unwrap().push(request.prompt);
            tokio::time::sleep(self.delay).await;
            self.answer.clone()
        }
    }

    /// Echoes the prompt back inside the URL so each job's locator is unique.
    struct EchoGateway;

    #[async_trait]
    impl TransformationGateway for EchoGateway {
        async fn transform(&self, request: TransformationRequest) -> Result<String, GatewayError> {
            tokio::time::sleep(Duration::from_millis(5)).await;
            match request.image.first() {
                Some(n) if n % 3 == 0 => Err(GatewayError::Timeout),
                Some(n) => Ok(format!("https://cdn.example/{n}.png")),
                None => Err(GatewayError::MalformedResponse("empty".into())),
            }
        }
    }

    struct PanickingGateway;

    #[async_trait]
    impl TransformationGateway for PanickingGateway {
        async fn transform(&self, _request: TransformationRequest) -> Result<String, GatewayError> {
            panic!("gateway exploded");
        }
    }

    fn orchestrator(
        gateway: Arc<dyn TransformationGateway>,
    ) -> JobOrchestrator<Arc<InMemoryJobStore>> {
        JobOrchestrator::new(InMemoryJobStore::arc(), gateway)
    }

    fn submission(profession: &str, age: u32) -> Submission {
        Submission::new(vec![0xFF, 0xD8, 0xFF], profession, age).unwrap()
    }

    async fn wait_terminal(store: &Arc<InMemoryJobStore>, job_id: JobId) -> Job {
        for _ in 0..200 {
            let job = store.get(job_id).unwrap().expect("job exists");
            if job.status.is_terminal() {
                return job;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("job {job_id} did not reach a terminal state");
    }

    #[tokio::test]
    async fn submit_returns_before_gateway_finishes() {
        let gateway = Arc::new(StubGateway::new(
            Duration::from_millis(300),
            Ok("https://cdn.example/slow.png".to_string()),
        ));
        let orch = orchestrator(gateway);

        let started = Instant::now();
        let job_id = orch.submit(submission("doctor", 40)).unwrap();
        assert!(started.elapsed() < Duration::from_millis(300));

        let job = orch.store().get(job_id).unwrap().unwrap();
        assert_eq!(job.status, JobStatus::Processing);
        assert!(job.result_url.is_none());

        let job = wait_terminal(orch.store(), job_id).await;
        assert_eq!(job.status, JobStatus::Completed);
    }

    #[tokio::test]
    async fn successful_gateway_completes_job() {
        let orch = orchestrator(Arc::new(StubGateway::ok("https://cdn.example/a.png")));

        let job_id = orch.submit(submission("pilot", 35)).unwrap();
        let job = wait_terminal(orch.store(), job_id).await;

        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.result_url.as_deref(), Some("https://cdn.example/a.png"));
        assert!(job.completed_at.is_some());
    }

    #[tokio::test]
    async fn gateway_errors_fail_job_without_locator() {
        let errors = [
            GatewayError::Transport("connection refused".into()),
            GatewayError::Timeout,
            GatewayError::Rejected {
                status: 500,
                body: "oops".into(),
            },
            GatewayError::MalformedResponse("missing urls.stream".into()),
        ];

        for error in errors {
            let orch = orchestrator(Arc::new(StubGateway::err(error.clone())));

            let job_id = orch.submit(submission("chef", 30)).unwrap();
            let job = wait_terminal(orch.store(), job_id).await;

            assert_eq!(job.status, JobStatus::Failed, "{error}");
            assert!(job.result_url.is_none());
            assert!(job.completed_at.is_some());
            assert_eq!(job.error, Some(error.to_string()));
        }
    }

    #[tokio::test]
    async fn panicking_gateway_still_fails_job() {
        let orch = orchestrator(Arc::new(PanickingGateway));

        let job_id = orch.submit(submission("artist", 28)).unwrap();
        let job = wait_terminal(orch.store(), job_id).await;

        assert_eq!(job.status, JobStatus::Failed);
        assert_eq!(job.error.as_deref(), Some(ABORTED_REASON));
    }

    #[tokio::test]
    async fn prompt_is_derived_from_profession_and_age() {
        let gateway = Arc::new(StubGateway::ok("u"));
        let orch = orchestrator(gateway.clone());

        let a = orch.submit(submission("Doctor", 40)).unwrap();
        let b = orch.submit(submission("unknown-role", 22)).unwrap();
        wait_terminal(orch.store(), a).await;
        wait_terminal(orch.store(), b).await;

        let prompts = gateway.prompts.lock().unwrap().clone();
        assert_eq!(prompts.len(), 2);
        assert!(prompts.iter().any(|p| {
            p.starts_with("professional doctor in white coat") && p.contains("age 40")
        }));
        assert!(prompts.iter().any(|p| {
            p.starts_with(ageforge_ai::GENERIC_PROMPT) && p.contains("age 22")
        }));
    }

    #[tokio::test]
    async fn late_completion_after_eviction_is_ignored() {
        let gateway = Arc::new(StubGateway::new(
            Duration::from_millis(100),
            Ok("https://cdn.example/late.png".to_string()),
        ));
        let orch = orchestrator(gateway);

        let job_id = orch.submit(submission("teacher", 50)).unwrap();
        let evicted = orch
            .store()
            .remove_older_than(chrono::Utc::now() + chrono::Duration::seconds(1))
            .unwrap();
        assert_eq!(evicted, 1);

        tokio::time::sleep(Duration::from_millis(250)).await;

        assert!(orch.store().get(job_id).unwrap().is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_submissions_stay_independent() {
        let orch = orchestrator(Arc::new(EchoGateway));

        let mut handles = Vec::new();
        for n in 1u8..=40 {
            let orch = orch.clone();
            handles.push(tokio::spawn(async move {
                let s = Submission::new(vec![n], "engineer", 30).unwrap();
                (n, orch.submit(s).unwrap())
            }));
        }

        let mut submitted = Vec::new();
        for h in handles {
            submitted.push(h.await.unwrap());
        }

        let ids: HashSet<JobId> = submitted.iter().map(|(_, id)| *id).collect();
        assert_eq!(ids.len(), 40);

        for (n, job_id) in submitted {
            let job = wait_terminal(orch.store(), job_id).await;
            if n % 3 == 0 {
                assert_eq!(job.status, JobStatus::Failed);
                assert!(job.result_url.is_none());
            } else {
                assert_eq!(job.status, JobStatus::Completed);
                assert_eq!(job.result_url, Some(format!("https://cdn.example/{n}.png")));
            }
        }
    }
}
