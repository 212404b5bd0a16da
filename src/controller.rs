//! The submit lifecycle: question in, streamed answer out.

use futures_util::StreamExt;

use crate::error::ChatError;
use crate::stream::{parse_line, LineBuffer, LineEvent, Utf8Decoder};
use crate::transcript::{ChatView, MessageKind};
use crate::transport::AskTransport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatStatus {
    Idle,
    Submitting,
    Streaming,
}

/// What a call to [`ChatController::submit`] ended up doing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Blank question or a request already in flight; nothing happened.
    Ignored,
    Answered { chunks: usize },
    Failed(ChatError),
}

pub struct ChatController<T, V> {
    transport: T,
    view: V,
    status: ChatStatus,
}

impl<T: AskTransport, V: ChatView> ChatController<T, V> {
    pub fn new(transport: T, view: V) -> Self {
        Self {
            transport,
            view,
            status: ChatStatus::Idle,
        }
    }

    pub async fn submit(&mut self, question: &str) -> SubmitOutcome {
        let question = question.trim();
        if question.is_empty() || self.status != ChatStatus::Idle {
            return SubmitOutcome::Ignored;
        }

        self.status = ChatStatus::Submitting;
        self.view.clear_input();
        self.view.push_message(MessageKind::Question, question);
        self.view.scroll_to_bottom();
        self.view.set_submit_enabled(false);
        self.view.open_placeholder();

        let outcome = match self.stream_answer(question).await {
            Ok(chunks) => {
                tracing::info!(chunks, "answer complete");
                self.view.seal_placeholder();
                SubmitOutcome::Answered { chunks }
            }
            Err(err) => {
                tracing::error!(error = %err, "request failed");
                self.view.discard_placeholder();
                self.view.push_message(MessageKind::AnswerError, &err.user_message());
                self.view.scroll_to_bottom();
                SubmitOutcome::Failed(err)
            }
        };

        self.status = ChatStatus::Idle;
        self.view.set_submit_enabled(true);
        self.view.focus_input();
        outcome
    }

    async fn stream_answer(&mut self, question: &str) -> Result<usize, ChatError> {
        let mut body = self.transport.ask(question).await?;
        self.status = ChatStatus::Streaming;

        let mut decoder = Utf8Decoder::new();
        let mut lines = LineBuffer::new();
        let mut chunks = 0;

        while let Some(bytes) = body.next().await {
            let text = decoder.decode(&bytes?);

            for line in lines.push(&text) {
                match parse_line(&line) {
                    LineEvent::Chunk(chunk) => {
                        self.view.append_to_placeholder(&chunk);
                        self.view.scroll_to_bottom();
                        chunks += 1;
                    }
                    LineEvent::Malformed(reason) => {
                        tracing::warn!(%reason, line = %line, "dropping malformed stream line");
                    }
                    LineEvent::Done => tracing::debug!("server signalled end of answer"),
                    LineEvent::Ignored | LineEvent::Empty => {}
                }
            }
        }

        let leftover = lines.into_remainder();
        if !leftover.is_empty() {
            tracing::debug!(fragment = %leftover, "discarding unterminated trailing fragment");
        }

        Ok(chunks)
    }
}
