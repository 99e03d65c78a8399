//! End-to-end engine scenarios with scripted backends.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use conclave_core::{
    AuditSink, BackendError, BackendReply, Confidence, ConsensusMode, CouncilEngine, DebateRecord,
    DebateStatus, EngineConfig, EngineError, ModelBackend, Outcome, Proposal, VetoOverride,
};

/// Always answers the same way, after an optional delay.
struct Scripted {
    approved: bool,
    confidence: f64,
    delay: Duration,
}

impl Scripted {
    fn approve(confidence: f64) -> Arc<dyn ModelBackend> {
        Arc::new(Self {
            approved: true,
            confidence,
            delay: Duration::ZERO,
        })
    }

    fn reject(confidence: f64) -> Arc<dyn ModelBackend> {
        Arc::new(Self {
            approved: false,
            confidence,
            delay: Duration::ZERO,
        })
    }

    fn slow_approve(confidence: f64, delay: Duration) -> Arc<dyn ModelBackend> {
        Arc::new(Self {
            approved: true,
            confidence,
            delay,
        })
    }

    fn hung() -> Arc<dyn ModelBackend> {
        Arc::new(Self {
            approved: true,
            confidence: 0.5,
            delay: Duration::from_secs(120),
        })
    }
}

#[async_trait]
impl ModelBackend for Scripted {
    fn provider(&self) -> &str {
        "scripted"
    }

    async fn ask(&self, _proposal: &Proposal) -> Result<BackendReply, BackendError> {
        tokio::time::sleep(self.delay).await;
        Ok(BackendReply::new(
            self.approved,
            Confidence::new(self.confidence),
            "scripted",
        ))
    }
}

/// Collects every finished record.
#[derive(Default)]
struct CapturingSink {
    records: Mutex<Vec<DebateRecord>>,
}

impl AuditSink for CapturingSink {
    fn record(&self, record: &DebateRecord) {
        self.records.lock().unwrap().push(record.clone());
    }
}

fn quick_config() -> EngineConfig {
    EngineConfig::from_json(
        r#"{
            "retry": { "base_delay_ms": 1, "max_attempts": 1 },
            "debate": { "round_deadline_ms": 500, "round_grace_ms": 50 }
        }"#,
    )
    .unwrap()
}

fn proposal() -> Proposal {
    Proposal::new("introduce connection pooling")
        .with_file("src/server/pool.rs")
        .with_file("src/server/config.rs")
        .with_diff_size(400)
}

#[tokio::test]
async fn test_debate_lifecycle_to_approval() {
    let engine = CouncilEngine::new(quick_config()).unwrap();
    engine
        .register_backend("alpha", &["backend"], 1.0, Scripted::approve(0.8))
        .unwrap();
    engine
        .register_backend("beta", &["backend"], 1.0, Scripted::approve(0.7))
        .unwrap();
    engine
        .register_backend("gamma", &["frontend"], 1.0, Scripted::approve(0.6))
        .unwrap();

    let id = engine.start_debate(proposal()).unwrap();
    let record = engine.await_decision(id).await.unwrap();

    assert_eq!(record.id, id);
    assert_eq!(record.decision.outcome, Outcome::Approved);
    assert_eq!(engine.status(id).unwrap(), DebateStatus::Finished(Outcome::Approved));
    assert!(engine.record(id).unwrap().is_some());
}

#[tokio::test]
async fn test_unknown_debate_id() {
    let engine = CouncilEngine::new(quick_config()).unwrap();
    let id = uuid::Uuid::new_v4();
    assert!(matches!(
        engine.status(id),
        Err(EngineError::UnknownDebate(_))
    ));
}

#[tokio::test]
async fn test_start_requires_supervisors() {
    let engine = CouncilEngine::new(quick_config()).unwrap();
    assert!(matches!(
        engine.start_debate(proposal()),
        Err(EngineError::Configuration(_))
    ));
}

#[tokio::test]
async fn test_forget_releases_finished_debates() {
    let engine = CouncilEngine::new(quick_config()).unwrap();
    let delay = Duration::from_millis(200);
    engine
        .register_backend("alpha", &["backend"], 1.0, Scripted::slow_approve(0.8, delay))
        .unwrap();
    engine
        .register_backend("beta", &["backend"], 1.0, Scripted::slow_approve(0.7, delay))
        .unwrap();

    let id = engine.start_debate(proposal()).unwrap();
    // Still collecting verdicts; the record must stay addressable.
    assert!(matches!(
        engine.forget(id),
        Err(EngineError::DebateRunning(_))
    ));

    engine.await_decision(id).await.unwrap();
    engine.forget(id).unwrap();

    // Forgotten debates are indistinguishable from never-started ones.
    assert!(matches!(
        engine.status(id),
        Err(EngineError::UnknownDebate(_))
    ));
    assert!(matches!(
        engine.forget(id),
        Err(EngineError::UnknownDebate(_))
    ));
}

#[tokio::test]
async fn test_start_fails_fast_below_min_team_size() {
    // One registered supervisor cannot satisfy the default minimum of two;
    // the start call itself must reject, not hand back a doomed id.
    let engine = CouncilEngine::new(quick_config()).unwrap();
    engine
        .register_backend("solo", &["backend"], 1.0, Scripted::approve(0.8))
        .unwrap();
    assert!(matches!(
        engine.start_debate(proposal()),
        Err(EngineError::Configuration(_))
    ));
}

#[tokio::test]
async fn test_start_fails_fast_on_unknown_lead() {
    let engine = CouncilEngine::new(quick_config()).unwrap();
    engine
        .register_backend("alpha", &["backend"], 1.0, Scripted::approve(0.8))
        .unwrap();
    engine
        .register_backend("beta", &["backend"], 1.0, Scripted::approve(0.7))
        .unwrap();

    let mut options = quick_config().debate.to_options();
    options.lead = Some("nobody".into());
    assert!(matches!(
        engine.start_debate_with(proposal(), options),
        Err(EngineError::Configuration(_))
    ));
}

#[tokio::test]
async fn test_performance_updates_after_decision() {
    let engine = CouncilEngine::new(quick_config()).unwrap();
    engine
        .register_backend("agrees", &["backend"], 1.0, Scripted::approve(0.8))
        .unwrap();
    engine
        .register_backend("agrees-too", &["backend"], 1.0, Scripted::approve(0.7))
        .unwrap();
    engine
        .register_backend("dissents", &["backend"], 1.0, Scripted::reject(0.4))
        .unwrap();

    let id = engine.start_debate(proposal()).unwrap();
    let record = engine.await_decision(id).await.unwrap();
    assert_eq!(record.decision.outcome, Outcome::Approved);

    let agrees = engine.performance("agrees").unwrap();
    assert_eq!(agrees.debates, 1);
    assert_eq!(agrees.agreements, 1);

    let dissents = engine.performance("dissents").unwrap();
    assert_eq!(dissents.debates, 1);
    assert_eq!(dissents.agreements, 0);
    // Smoothed accuracy moves toward the record without reaching 0 or 1.
    assert!(agrees.smoothed_accuracy() > dissents.smoothed_accuracy());
    assert!(dissents.smoothed_accuracy() > 0.0);
}

#[tokio::test]
async fn test_audit_sink_receives_record() {
    let sink = Arc::new(CapturingSink::default());
    let engine = CouncilEngine::new(quick_config())
        .unwrap()
        .with_sink(sink.clone());
    engine
        .register_backend("alpha", &["backend"], 1.0, Scripted::approve(0.8))
        .unwrap();
    engine
        .register_backend("beta", &["backend"], 1.0, Scripted::approve(0.8))
        .unwrap();

    let id = engine.start_debate(proposal()).unwrap();
    engine.await_decision(id).await.unwrap();

    let records = sink.records.lock().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].id, id);
}

#[tokio::test]
async fn test_veto_flow_through_engine() {
    let config = EngineConfig::from_json(
        r#"{
            "retry": { "base_delay_ms": 1, "max_attempts": 1 },
            "debate": {
                "round_deadline_ms": 500,
                "round_grace_ms": 50,
                "human_veto_enabled": true,
                "human_veto_window_ms": 2000
            }
        }"#,
    )
    .unwrap();
    let engine = CouncilEngine::new(config).unwrap();
    engine
        .register_backend("alpha", &["backend"], 1.0, Scripted::approve(0.8))
        .unwrap();
    engine
        .register_backend("beta", &["backend"], 1.0, Scripted::approve(0.8))
        .unwrap();

    let id = engine.start_debate(proposal()).unwrap();
    engine
        .submit_veto(
            id,
            VetoOverride {
                approved: false,
                operator: "release-manager".into(),
                reason: "holding for the incident review".into(),
            },
        )
        .unwrap();

    let record = engine.await_decision(id).await.unwrap();
    assert_eq!(record.decision.outcome, Outcome::Rejected);
    assert!(record.human_override.is_some());

    // The window is single-use.
    let again = engine.submit_veto(
        id,
        VetoOverride {
            approved: true,
            operator: "someone-else".into(),
            reason: "changed my mind".into(),
        },
    );
    assert!(matches!(again, Err(EngineError::VetoClosed(_))));
}

#[tokio::test]
async fn test_veto_rejected_when_window_disabled() {
    let engine = CouncilEngine::new(quick_config()).unwrap();
    engine
        .register_backend("alpha", &["backend"], 1.0, Scripted::approve(0.8))
        .unwrap();
    engine
        .register_backend("beta", &["backend"], 1.0, Scripted::approve(0.8))
        .unwrap();

    let id = engine.start_debate(proposal()).unwrap();
    let result = engine.submit_veto(
        id,
        VetoOverride {
            approved: false,
            operator: "op".into(),
            reason: "n/a".into(),
        },
    );
    assert!(matches!(result, Err(EngineError::VetoClosed(_))));
    engine.await_decision(id).await.unwrap();
}

#[tokio::test]
async fn test_hung_supervisor_never_blocks_decision() {
    let config = EngineConfig::from_json(
        r#"{
            "retry": { "base_delay_ms": 1, "max_attempts": 1 },
            "debate": {
                "round_deadline_ms": 100,
                "round_grace_ms": 30,
                "max_team_size": 3
            }
        }"#,
    )
    .unwrap();
    let engine = CouncilEngine::new(config).unwrap();
    engine
        .register_backend("alpha", &["backend"], 1.0, Scripted::approve(0.8))
        .unwrap();
    engine
        .register_backend("beta", &["backend"], 1.0, Scripted::approve(0.8))
        .unwrap();
    engine
        .register_backend("tarpit", &["backend"], 1.0, Scripted::hung())
        .unwrap();

    let start = std::time::Instant::now();
    let id = engine.start_debate(proposal()).unwrap();
    let record = engine.await_decision(id).await.unwrap();

    assert!(start.elapsed() < Duration::from_secs(5));
    assert_eq!(record.decision.outcome, Outcome::Approved);
    assert_eq!(record.rounds[0].abstentions(), 1);
    // The abstainer is never scored.
    assert_eq!(engine.performance("tarpit").unwrap().debates, 0);
}

#[tokio::test]
async fn test_deadlocked_panel_fails_closed() {
    let config = EngineConfig::from_json(
        r#"{
            "retry": { "base_delay_ms": 1, "max_attempts": 1 },
            "debate": { "round_deadline_ms": 500, "round_grace_ms": 50, "max_rounds": 2 }
        }"#,
    )
    .unwrap();
    let engine = CouncilEngine::new(config).unwrap();
    engine
        .register_backend("yes", &["backend"], 1.0, Scripted::approve(0.6))
        .unwrap();
    engine
        .register_backend("no", &["backend"], 1.0, Scripted::reject(0.6))
        .unwrap();

    let id = engine.start_debate(proposal()).unwrap();
    let record = engine.await_decision(id).await.unwrap();

    assert_eq!(record.rounds.len(), 2);
    assert_eq!(record.decision.outcome, Outcome::Rejected);
    assert!(record.decision.fail_closed);
}

#[tokio::test]
async fn test_per_debate_mode_override() {
    let engine = CouncilEngine::new(quick_config()).unwrap();
    engine
        .register_backend("alpha", &["backend"], 1.0, Scripted::approve(0.9))
        .unwrap();
    engine
        .register_backend("beta", &["backend"], 1.0, Scripted::approve(0.9))
        .unwrap();
    engine
        .register_backend("gamma", &["backend"], 1.0, Scripted::reject(0.4))
        .unwrap();

    let mut options = engine.config().debate.to_options();
    options.mode = ConsensusMode::Unanimous;
    options.max_team_size = 3;
    let id = engine.start_debate_with(proposal(), options).unwrap();
    let record = engine.await_decision(id).await.unwrap();

    // Two confident approvals cannot carry unanimity past one rejection.
    assert_eq!(record.decision.outcome, Outcome::Rejected);
    assert_eq!(record.decision.mode, ConsensusMode::Unanimous);
}

#[tokio::test]
async fn test_registry_changes_do_not_touch_running_debates() {
    static CALLS: AtomicUsize = AtomicUsize::new(0);

    struct Counting;

    #[async_trait]
    impl ModelBackend for Counting {
        fn provider(&self) -> &str {
            "counting"
        }

        async fn ask(&self, _proposal: &Proposal) -> Result<BackendReply, BackendError> {
            CALLS.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(50)).await;
            Ok(BackendReply::new(true, Confidence::new(0.8), "counted"))
        }
    }

    let engine = CouncilEngine::new(quick_config()).unwrap();
    engine
        .register_backend("alpha", &["backend"], 1.0, Arc::new(Counting))
        .unwrap();
    engine
        .register_backend("beta", &["backend"], 1.0, Scripted::approve(0.8))
        .unwrap();

    let id = engine.start_debate(proposal()).unwrap();
    // Deregistering mid-debate does not change the debate's snapshot.
    engine.deregister("alpha").unwrap();

    let record = engine.await_decision(id).await.unwrap();
    assert_eq!(record.decision.outcome, Outcome::Approved);
    assert_eq!(CALLS.load(Ordering::SeqCst), 1);
    assert!(record.team.iter().any(|m| m.name == "alpha"));
    assert_eq!(engine.supervisor_count(), 1);
}
