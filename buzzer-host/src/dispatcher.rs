//! Feedback dispatcher: the bridge between buzzer presses and the game.
//!
//! Presses only count while a question is open. The first press while open
//! claims the question, closes it, and is forwarded to the game's answer
//! sink; everything after that is a latecomer and is dropped. Once the game
//! scores the answer it reports a verdict back and the answering buzzer
//! flashes green or red.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use buzzer_proto::{ButtonState, BuzzerId, Rgb};
use log::{debug, info};

use crate::config::HostConfig;
use crate::error::LinkError;
use crate::manager::BuzzerManager;

/// An accepted buzz: which buzzer claimed the open question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Answer {
    pub buzzer: BuzzerId,
}

/// The game's scoring of an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Correct,
    Incorrect,
}

impl Verdict {
    fn feedback_color(self) -> Rgb {
        match self {
            Verdict::Correct => Rgb::GREEN,
            Verdict::Incorrect => Rgb::RED,
        }
    }
}

/// Receiver for accepted answers, implemented by the game loop.
#[async_trait]
pub trait AnswerSink: Send + Sync {
    async fn submit(&self, answer: Answer);
}

/// Gates presses on question state and drives feedback illumination.
pub struct FeedbackDispatcher {
    manager: BuzzerManager,
    question_open: Arc<AtomicBool>,
    flash_ms: u64,
}

impl FeedbackDispatcher {
    pub fn new(manager: BuzzerManager, config: &HostConfig) -> Self {
        Self {
            manager,
            question_open: Arc::new(AtomicBool::new(false)),
            flash_ms: config.feedback_flash_ms,
        }
    }

    /// Register the press observer that feeds the sink. Call once; must run
    /// inside a tokio runtime because accepted answers are submitted from a
    /// spawned task.
    pub fn attach(&self, sink: Arc<dyn AnswerSink>) {
        let question_open = self.question_open.clone();
        self.manager.on_button_press(move |event| {
            if event.state != ButtonState::Pressed {
                return;
            }
            // The swap both tests and closes the gate, so exactly one press
            // per question gets through even if both buzzers race.
            if !question_open.swap(false, Ordering::SeqCst) {
                debug!("press from {:?} outside an open question", event.buzzer);
                return;
            }
            info!("{:?} buzzed in", event.buzzer);
            let sink = sink.clone();
            let answer = Answer {
                buzzer: event.buzzer,
            };
            tokio::spawn(async move {
                sink.submit(answer).await;
            });
        });
    }

    /// Open the gate for the next question.
    pub fn open_question(&self) {
        self.question_open.store(true, Ordering::SeqCst);
    }

    /// Close the gate without an answer, for questions that time out.
    pub fn close_question(&self) {
        self.question_open.store(false, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_question_open(&self) -> bool {
        self.question_open.load(Ordering::SeqCst)
    }

    /// Flash the answering buzzer with the verdict color. The flash reverts
    /// to off on its own after the configured duration.
    pub async fn report_verdict(
        &self,
        answer: Answer,
        verdict: Verdict,
    ) -> Result<(), LinkError> {
        self.manager
            .set_illumination(answer.buzzer, verdict.feedback_color(), Some(self.flash_ms))
            .await
    }
}
