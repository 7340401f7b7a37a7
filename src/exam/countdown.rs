// src/exam/countdown.rs

//! Drives a session's clock in real time.
//!
//! The ticker only runs while the session is active: pausing aborts the
//! task, resuming spawns a fresh one, and dropping the runner stops it so no
//! orphaned timer keeps mutating a session nobody is looking at.

use std::{sync::Arc, time::Duration};

use tokio::{
    sync::{Mutex, mpsc},
    task::JoinHandle,
    time::{Instant, MissedTickBehavior},
};

use crate::{
    error::SessionError,
    exam::session::{ExamSession, SessionPhase, SnapshotRepository},
    models::exam_record::ExamResult,
};

const TICK: Duration = Duration::from_secs(1);

/// A running one-second ticker; aborted when dropped.
struct Countdown {
    handle: JoinHandle<()>,
}

impl Countdown {
    fn spawn<R>(
        session: Arc<Mutex<ExamSession<R>>>,
        finished: mpsc::UnboundedSender<ExamResult>,
    ) -> Self
    where
        R: SnapshotRepository + 'static,
    {
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(Instant::now() + TICK, TICK);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                interval.tick().await;
                // A tick persists the snapshot, which may block on disk I/O.
                let session = session.clone();
                let ticked = tokio::task::spawn_blocking(move || {
                    let mut session = session.blocking_lock();
                    (session.tick(), session.phase())
                })
                .await;

                let (result, phase) = match ticked {
                    Ok(ticked) => ticked,
                    Err(e) => {
                        tracing::error!("Countdown tick failed: {}", e);
                        break;
                    }
                };
                if let Some(result) = result {
                    let _ = finished.send(result);
                    break;
                }
                if phase != SessionPhase::Active {
                    break;
                }
            }
        });
        Self { handle }
    }
}

impl Drop for Countdown {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Owns a session together with the timer that may submit it.
///
/// Clock ticks reach the repository from tokio's blocking pool. Edits made
/// through [`ExamRunner::session`] persist inline on the calling task.
pub struct ExamRunner<R> {
    session: Arc<Mutex<ExamSession<R>>>,
    countdown: Option<Countdown>,
    finished_tx: mpsc::UnboundedSender<ExamResult>,
    finished_rx: mpsc::UnboundedReceiver<ExamResult>,
}

impl<R: SnapshotRepository + 'static> ExamRunner<R> {
    /// Starts ticking unless the restored session was left paused.
    pub async fn start(session: ExamSession<R>) -> Self {
        let (finished_tx, finished_rx) = mpsc::unbounded_channel();
        let mut runner = Self {
            session: Arc::new(Mutex::new(session)),
            countdown: None,
            finished_tx,
            finished_rx,
        };
        if runner.session.lock().await.phase() == SessionPhase::Active {
            runner.start_clock();
        }
        runner
    }

    /// Shared handle for answer editing and navigation.
    pub fn session(&self) -> Arc<Mutex<ExamSession<R>>> {
        self.session.clone()
    }

    pub fn is_ticking(&self) -> bool {
        self.countdown
            .as_ref()
            .is_some_and(|c| !c.handle.is_finished())
    }

    pub async fn pause(&mut self) -> Result<(), SessionError> {
        self.session.lock().await.pause()?;
        self.countdown = None;
        Ok(())
    }

    pub async fn resume(&mut self) -> Result<(), SessionError> {
        self.session.lock().await.resume()?;
        if !self.is_ticking() {
            self.start_clock();
        }
        Ok(())
    }

    /// Submits on the tester's request. Returns `None` if the clock got
    /// there first.
    pub async fn submit(&mut self) -> Option<ExamResult> {
        self.countdown = None;
        self.session.lock().await.submit()
    }

    /// Waits for the clock to run out and returns the auto-submitted result.
    pub async fn expired(&mut self) -> Option<ExamResult> {
        self.finished_rx.recv().await
    }

    fn start_clock(&mut self) {
        self.countdown = Some(Countdown::spawn(self.session.clone(), self.finished_tx.clone()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::question::{Exam, Question, SingleAnswerQuestion},
        storage::snapshot_store::{FileSnapshotRepository, MemorySnapshotRepository},
    };

    fn exam(minutes: u32) -> Arc<Exam> {
        Arc::new(Exam {
            id: "timed".into(),
            title: "Timed".into(),
            description: "One question".into(),
            duration: minutes,
            questions: vec![Question::Single(SingleAnswerQuestion {
                id: 1,
                question: "Q".into(),
                options: vec!["A".into(), "B".into(), "C".into(), "D".into()],
                correct_answer: 0,
                explanation: "E".into(),
                domain: "People".into(),
            })],
        })
    }

    async fn runner(minutes: u32) -> ExamRunner<MemorySnapshotRepository> {
        let session = ExamSession::start(exam(minutes), MemorySnapshotRepository::default());
        ExamRunner::start(session).await
    }

    #[tokio::test(start_paused = true)]
    async fn clock_counts_down_in_real_time() {
        let runner = runner(1).await;
        tokio::time::sleep(Duration::from_millis(10_500)).await;

        assert_eq!(runner.session().lock().await.time_remaining(), 50);
    }

    #[tokio::test(start_paused = true)]
    async fn running_out_of_time_submits_once() {
        let mut runner = runner(1).await;
        runner.session().lock().await.select_answer(0, 0).unwrap();

        let result = runner.expired().await.unwrap();
        assert!(result.passed);
        assert_eq!(runner.session().lock().await.phase(), SessionPhase::Submitted);
        assert!(runner.submit().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn pause_stops_the_clock() {
        let mut runner = runner(1).await;
        tokio::time::sleep(Duration::from_millis(5_500)).await;
        runner.pause().await.unwrap();
        assert!(!runner.is_ticking());

        tokio::time::sleep(Duration::from_secs(30)).await;
        runner.session().lock().await.select_answer(0, 1).unwrap();
        assert_eq!(runner.session().lock().await.time_remaining(), 55);

        runner.resume().await.unwrap();
        tokio::time::sleep(Duration::from_millis(2_500)).await;
        assert_eq!(runner.session().lock().await.time_remaining(), 53);
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_persist_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let session = ExamSession::start(exam(1), FileSnapshotRepository::new(dir.path()));
        let runner = ExamRunner::start(session).await;
        tokio::time::sleep(Duration::from_millis(3_500)).await;

        let stored = FileSnapshotRepository::new(dir.path()).load("timed").unwrap().unwrap();
        assert_eq!(stored.time_remaining, 57);
        assert!(runner.is_ticking());
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_runner_stops_the_clock() {
        let runner = runner(1).await;
        let session = runner.session();
        tokio::time::sleep(Duration::from_millis(3_500)).await;
        assert_eq!(session.lock().await.time_remaining(), 57);

        drop(runner);
        tokio::time::sleep(Duration::from_secs(30)).await;

        let session = session.lock().await;
        assert_eq!(session.time_remaining(), 57);
        assert_eq!(session.phase(), SessionPhase::Active);
    }

    #[tokio::test(start_paused = true)]
    async fn manual_submit_cancels_the_clock() {
        let mut runner = runner(1).await;
        assert!(runner.submit().await.is_some());
        assert!(!runner.is_ticking());

        tokio::time::sleep(Duration::from_secs(120)).await;
        assert!(runner.finished_rx.try_recv().is_err());
    }
}
