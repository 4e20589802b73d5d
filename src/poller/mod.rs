//! Poll loop controller.
//!
//! Drives one fetch → validate → interpret → notify cycle at a time, then
//! advances the watermark and sleeps. Every failure ends the cycle, never the
//! loop.
//!
//! ```text
//!   Idle ──start(creds)──▶ Polling ──▶ cycle ──▶ advance watermark ──▶ sleep ─┐
//!    │                        ▲                                                │
//!    └─ missing credential    └────────────────────────────────────────────────┘
//! ```

pub mod clock;

use anyhow::Result;
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::config::WatchConfig;
use crate::credentials::{Credentials, verify_credentials};
use crate::errors::CycleError;
use crate::notify::Notifier;
use crate::status::{StatusSource, VerdictTable, parse_status, validate};

pub use clock::{Clock, SystemClock};

/// Controller state. The loop only runs in `Polling`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Idle,
    Polling,
}

/// What a single cycle did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The window had no records.
    NoUpdates,
    /// A verdict was produced and handed to the notifier.
    Notified { message: String, delivered: bool },
    /// The latest record could not be interpreted; nothing was sent.
    Skipped(String),
    /// Fetching or validating the payload failed.
    Failed(String),
}

impl CycleOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, CycleOutcome::Skipped(_) | CycleOutcome::Failed(_))
    }
}

/// Prefix of the message relayed when `notify_failures` is on.
pub const FAILURE_PREFIX: &str = "Bot failure: ";

pub struct PollLoop {
    source: Arc<dyn StatusSource>,
    notifier: Notifier,
    verdicts: VerdictTable,
    interval: Duration,
    notify_failures: bool,
    clock: Arc<dyn Clock>,
    state: LoopState,
    watermark: i64,
    /// Last failure text relayed, so a persistent fault is reported once.
    last_failure: Option<String>,
}

impl PollLoop {
    pub fn new(source: Arc<dyn StatusSource>, notifier: Notifier, config: &WatchConfig) -> Self {
        Self::with_clock(source, notifier, config, Arc::new(SystemClock))
    }

    pub fn with_clock(
        source: Arc<dyn StatusSource>,
        notifier: Notifier,
        config: &WatchConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let watermark = clock.now();
        Self {
            source,
            notifier,
            verdicts: config.verdicts.clone(),
            interval: config.interval,
            notify_failures: config.notify_failures,
            clock,
            state: LoopState::Idle,
            watermark,
            last_failure: None,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn watermark(&self) -> i64 {
        self.watermark
    }

    /// Credential gate. Moves to `Polling` only when every secret is present.
    pub fn start(&mut self, creds: &Credentials) -> bool {
        if self.state == LoopState::Polling {
            return true;
        }
        if !verify_credentials(creds) {
            return false;
        }
        self.state = LoopState::Polling;
        info!(
            watermark = self.watermark,
            interval_secs = self.interval.as_secs(),
            "Polling started"
        );
        true
    }

    /// Run cycles until `max_cycles` is reached, or forever when `None`.
    ///
    /// The fixed interval separates cycles; a bounded run returns right after
    /// its last cycle. Returns the number of cycles completed.
    pub async fn run(&mut self, max_cycles: Option<u64>) -> Result<u64> {
        if self.state != LoopState::Polling {
            anyhow::bail!("Poll loop has not passed the credential gate");
        }

        let mut completed = 0u64;
        loop {
            self.run_cycle().await;
            completed += 1;
            if max_cycles.is_some_and(|max| completed >= max) {
                return Ok(completed);
            }
            tokio::time::sleep(self.interval).await;
        }
    }

    /// One full cycle. Never fails: errors and panics are logged here.
    pub async fn run_cycle(&mut self) -> CycleOutcome {
        let window_start = self.watermark;
        let result = AssertUnwindSafe(self.process(window_start)).catch_unwind().await;

        let outcome = match result {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(e)) => self.classify(e),
            Err(panic) => self.classify(CycleError::Panicked(panic_message(panic.as_ref()))),
        };

        self.advance_watermark();

        match &outcome {
            CycleOutcome::NoUpdates => {
                info!(window_start, "No status changes");
                self.last_failure = None;
            }
            CycleOutcome::Notified { delivered, .. } => {
                info!(window_start, delivered, "Status change relayed");
                self.last_failure = None;
            }
            CycleOutcome::Skipped(reason) | CycleOutcome::Failed(reason) => {
                let reason = reason.clone();
                self.report_failure(&reason).await;
            }
        }

        outcome
    }

    async fn process(&self, window_start: i64) -> Result<CycleOutcome, CycleError> {
        let payload = self.source.fetch_status(Some(window_start)).await?;
        let records = validate(&payload)?;

        // Only the most recent record is reported per cycle.
        let Some(latest) = records.first() else {
            return Ok(CycleOutcome::NoUpdates);
        };
        if records.len() > 1 {
            warn!(
                ignored = records.len() - 1,
                "Several records changed; reporting the latest only"
            );
        }

        let message = parse_status(latest, &self.verdicts)?;
        let delivered = self.notifier.notify(&message).await;
        Ok(CycleOutcome::Notified { message, delivered })
    }

    fn classify(&self, err: CycleError) -> CycleOutcome {
        match err {
            CycleError::Parse(e) => {
                error!("Notification skipped: {}", e);
                CycleOutcome::Skipped(e.to_string())
            }
            e => {
                error!(error = ?e, "Poll cycle failed: {}", e);
                CycleOutcome::Failed(e.to_string())
            }
        }
    }

    fn advance_watermark(&mut self) {
        self.watermark = self.watermark.max(self.clock.now());
    }

    async fn report_failure(&mut self, reason: &str) {
        if !self.notify_failures {
            return;
        }
        let text = format!("{}{}", FAILURE_PREFIX, reason);
        if self.last_failure.as_deref() == Some(text.as_str()) {
            return;
        }
        let sent = AssertUnwindSafe(self.notifier.notify(&text)).catch_unwind().await;
        if let Err(panic) = sent {
            error!("Failure notice panicked: {}", panic_message(panic.as_ref()));
        }
        self.last_failure = Some(text);
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    panic
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::APPROVED_PHRASE;
    use crate::errors::{DeliveryError, FetchError};
    use crate::notify::MessageSink;
    use crate::notify::testing::RecordingSink;
    use async_trait::async_trait;
    use serde_json::{Value, json};
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicI64, Ordering};

    enum Reply {
        Payload(Value),
        Status(u16),
        Panic,
    }

    /// Replays scripted replies; an exhausted script yields an empty window.
    struct ScriptedSource {
        replies: Mutex<VecDeque<Reply>>,
        windows: Mutex<Vec<Option<i64>>>,
    }

    impl ScriptedSource {
        fn new(replies: Vec<Reply>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                windows: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl StatusSource for ScriptedSource {
        async fn fetch_status(&self, window_start: Option<i64>) -> Result<Value, FetchError> {
            self.windows.lock().unwrap().push(window_start);
            let reply = self.replies.lock().unwrap().pop_front();
            match reply {
                Some(Reply::Payload(v)) => Ok(v),
                Some(Reply::Status(code)) => Err(FetchError::BadStatus(code)),
                Some(Reply::Panic) => panic!("source exploded"),
                None => Ok(json!({"homeworks": []})),
            }
        }
    }

    struct ManualClock(AtomicI64);

    impl ManualClock {
        fn at(ts: i64) -> Arc<Self> {
            Arc::new(Self(AtomicI64::new(ts)))
        }

        fn set(&self, ts: i64) {
            self.0.store(ts, Ordering::SeqCst);
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> i64 {
            self.0.load(Ordering::SeqCst)
        }
    }

    struct Harness {
        poll: PollLoop,
        source: Arc<ScriptedSource>,
        sink: Arc<RecordingSink>,
        clock: Arc<ManualClock>,
    }

    fn harness(replies: Vec<Reply>, config: WatchConfig) -> Harness {
        let source = Arc::new(ScriptedSource::new(replies));
        let sink = Arc::new(RecordingSink::default());
        let clock = ManualClock::at(1_000);
        let notifier = Notifier::new(sink.clone(), "42");
        let poll = PollLoop::with_clock(source.clone(), notifier, &config, clock.clone());
        Harness {
            poll,
            source,
            sink,
            clock,
        }
    }

    fn full_credentials() -> Credentials {
        Credentials {
            practicum_token: Some("y0_practicum".into()),
            telegram_token: Some("123:abc".into()),
            telegram_chat_id: Some("42".into()),
        }
    }

    #[test]
    fn test_missing_credential_stays_idle() {
        let mut h = harness(vec![], WatchConfig::default());
        let mut creds = full_credentials();
        creds.telegram_token = None;

        assert!(!h.poll.start(&creds));
        assert_eq!(h.poll.state(), LoopState::Idle);
    }

    #[tokio::test]
    async fn test_run_refuses_when_idle() {
        let mut h = harness(vec![], WatchConfig::default());
        assert!(h.poll.run(Some(1)).await.is_err());
        assert!(h.source.windows.lock().unwrap().is_empty());
    }

    #[test]
    fn test_full_credentials_start_polling() {
        let mut h = harness(vec![], WatchConfig::default());
        assert!(h.poll.start(&full_credentials()));
        assert_eq!(h.poll.state(), LoopState::Polling);
    }

    #[tokio::test]
    async fn test_approved_record_notifies_once() {
        let payload = json!({"homeworks": [{"homework_name": "HW1", "status": "approved"}]});
        let mut h = harness(vec![Reply::Payload(payload)], WatchConfig::default());

        let outcome = h.poll.run_cycle().await;

        let expected = format!("Changed review status of \"HW1\": {}", APPROVED_PHRASE);
        assert_eq!(
            outcome,
            CycleOutcome::Notified {
                message: expected.clone(),
                delivered: true
            }
        );
        assert_eq!(h.sink.messages(), vec![expected]);
    }

    #[tokio::test]
    async fn test_only_first_record_is_reported() {
        let payload = json!({"homeworks": [
            {"homework_name": "HW2", "status": "reviewing"},
            {"homework_name": "HW1", "status": "approved"}
        ]});
        let mut h = harness(vec![Reply::Payload(payload)], WatchConfig::default());

        h.poll.run_cycle().await;

        let sent = h.sink.messages();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].contains("HW2"));
    }

    #[tokio::test]
    async fn test_empty_window_is_a_no_op_that_advances() {
        let mut h = harness(vec![Reply::Payload(json!({"homeworks": []}))], WatchConfig::default());
        h.clock.set(1_600);

        assert_eq!(h.poll.run_cycle().await, CycleOutcome::NoUpdates);
        assert!(h.sink.messages().is_empty());
        assert_eq!(h.poll.watermark(), 1_600);
    }

    #[tokio::test]
    async fn test_bad_status_fails_cycle_and_advances() {
        let mut h = harness(vec![Reply::Status(503)], WatchConfig::default());
        h.clock.set(1_600);

        let outcome = h.poll.run_cycle().await;

        assert_eq!(outcome, CycleOutcome::Failed("Status API returned HTTP 503".to_string()));
        assert!(h.sink.messages().is_empty());
        assert_eq!(h.poll.watermark(), 1_600);
    }

    #[tokio::test]
    async fn test_malformed_payload_fails_without_raising() {
        let mut h = harness(
            vec![Reply::Payload(json!([1, 2])), Reply::Payload(json!({"homeworks": "HW1"}))],
            WatchConfig::default(),
        );
        assert!(matches!(h.poll.run_cycle().await, CycleOutcome::Failed(_)));
        assert!(matches!(h.poll.run_cycle().await, CycleOutcome::Failed(_)));
        assert!(h.sink.messages().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_status_skips_notification() {
        let payload = json!({"homeworks": [{"homework_name": "HW1", "status": "lost"}]});
        let mut h = harness(vec![Reply::Payload(payload)], WatchConfig::default());

        let outcome = h.poll.run_cycle().await;

        assert_eq!(outcome, CycleOutcome::Skipped("Unknown review status 'lost'".to_string()));
        assert!(outcome.is_failure());
        assert!(h.sink.messages().is_empty());
    }

    #[tokio::test]
    async fn test_panic_is_contained_at_cycle_boundary() {
        let mut h = harness(vec![Reply::Panic], WatchConfig::default());
        h.clock.set(2_000);

        let outcome = h.poll.run_cycle().await;

        assert_eq!(outcome, CycleOutcome::Failed("Cycle panicked: source exploded".to_string()));
        assert_eq!(h.poll.watermark(), 2_000);
        // The loop is still usable.
        assert_eq!(h.poll.run_cycle().await, CycleOutcome::NoUpdates);
    }

    #[tokio::test]
    async fn test_watermark_never_moves_backwards() {
        let mut h = harness(vec![], WatchConfig::default());
        h.clock.set(5_000);
        h.poll.run_cycle().await;
        h.clock.set(4_000);
        h.poll.run_cycle().await;
        assert_eq!(h.poll.watermark(), 5_000);
    }

    #[tokio::test]
    async fn test_each_fetch_uses_previous_watermark() {
        let mut h = harness(vec![], WatchConfig::default());
        h.poll.run_cycle().await;
        h.clock.set(1_600);
        h.poll.run_cycle().await;
        h.clock.set(2_200);
        h.poll.run_cycle().await;

        let windows = h.source.windows.lock().unwrap().clone();
        assert_eq!(windows, vec![Some(1_000), Some(1_000), Some(1_600)]);
    }

    #[tokio::test]
    async fn test_failure_notices_are_deduplicated() {
        let config = WatchConfig {
            notify_failures: true,
            ..WatchConfig::default()
        };
        let mut h = harness(
            vec![
                Reply::Status(500),
                Reply::Status(500),
                Reply::Status(502),
                Reply::Payload(json!({"homeworks": []})),
                Reply::Status(502),
            ],
            config,
        );
        for _ in 0..5 {
            h.poll.run_cycle().await;
        }

        assert_eq!(
            h.sink.messages(),
            vec![
                "Bot failure: Status API returned HTTP 500",
                "Bot failure: Status API returned HTTP 502",
                "Bot failure: Status API returned HTTP 502",
            ]
        );
    }

    struct PanickingSink;

    #[async_trait]
    impl MessageSink for PanickingSink {
        async fn send_message(&self, _chat_id: &str, _text: &str) -> Result<(), DeliveryError> {
            panic!("sink exploded");
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_panicking_failure_notice_does_not_end_loop() {
        let config = WatchConfig {
            notify_failures: true,
            ..WatchConfig::default()
        };
        let source = Arc::new(ScriptedSource::new(vec![Reply::Status(500), Reply::Status(502)]));
        let notifier = Notifier::new(Arc::new(PanickingSink), "42");
        let clock = ManualClock::at(1_000);
        let mut poll = PollLoop::with_clock(source.clone(), notifier, &config, clock);
        assert!(poll.start(&full_credentials()));

        assert_eq!(poll.run(Some(3)).await.unwrap(), 3);
        assert_eq!(source.windows.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_failure_notices_off_by_default() {
        let mut h = harness(vec![Reply::Status(500)], WatchConfig::default());
        h.poll.run_cycle().await;
        assert!(h.sink.messages().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_sleeps_fixed_interval_between_cycles() {
        let config = WatchConfig {
            interval: Duration::from_secs(600),
            ..WatchConfig::default()
        };
        let mut h = harness(vec![Reply::Status(503)], config);
        assert!(h.poll.start(&full_credentials()));

        let started = tokio::time::Instant::now();
        let completed = h.poll.run(Some(3)).await.unwrap();

        assert_eq!(completed, 3);
        assert_eq!(started.elapsed(), Duration::from_secs(1_200));
        assert_eq!(h.source.windows.lock().unwrap().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_cycle_run_does_not_sleep() {
        let mut h = harness(vec![], WatchConfig::default());
        assert!(h.poll.start(&full_credentials()));

        let started = tokio::time::Instant::now();
        assert_eq!(h.poll.run(Some(1)).await.unwrap(), 1);
        assert_eq!(started.elapsed(), Duration::ZERO);
    }
}
