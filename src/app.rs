use tokio::task::JoinHandle;

use crate::controller::ChatController;
use crate::transcript::{ChatView, MessageKind, Transcript, ViewUpdate};
use crate::transport::{AskTransport, HttpTransport};
use crate::tui::ViewSender;

type Controller<T> = ChatController<T, ViewSender>;

pub struct App<T = HttpTransport> {
    // Core state
    pub should_quit: bool,
    pub endpoint: String,

    // Chat state
    pub transcript: Transcript,
    transport: T,
    view: ViewSender,
    /// Idle controller; `None` while a request task owns it.
    controller: Option<Controller<T>>,
    request_task: Option<JoinHandle<Controller<T>>>,

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation

    // Chat area dimensions, updated during render
    pub chat_height: u16,
    pub chat_width: u16,
    pub max_scroll: u16,
}

impl<T> App<T>
where
    T: AskTransport + Clone + 'static,
{
    pub fn new(transport: T, view: ViewSender, endpoint: String) -> Self {
        let controller = ChatController::new(transport.clone(), view.clone());

        let mut transcript = Transcript::new();
        transcript.focus_input();

        Self {
            should_quit: false,
            endpoint,
            transcript,
            transport,
            view,
            controller: Some(controller),
            request_task: None,
            animation_frame: 0,
            chat_height: 0,
            chat_width: 0,
            max_scroll: 0,
        }
    }

    pub fn is_busy(&self) -> bool {
        self.request_task.is_some() || !self.transcript.submit_enabled
    }

    /// Hand the current draft to the controller on a background task.
    pub async fn submit(&mut self) {
        self.reap_request().await;

        if !self.transcript.submit_enabled {
            return;
        }
        if self.transcript.input.trim().is_empty() {
            return;
        }
        let Some(mut controller) = self.controller.take() else {
            return;
        };

        let question = self.transcript.input.clone();
        self.request_task = Some(tokio::spawn(async move {
            let outcome = controller.submit(&question).await;
            tracing::debug!(?outcome, "request finished");
            controller
        }));
    }

    /// Take the controller back once its request task has finished.
    pub async fn reap_request(&mut self) {
        let finished = self
            .request_task
            .as_ref()
            .map(|task| task.is_finished())
            .unwrap_or(false);
        if !finished {
            return;
        }

        let Some(task) = self.request_task.take() else {
            return;
        };

        match task.await {
            Ok(controller) => self.controller = Some(controller),
            Err(e) => {
                // The task died before it could restore the UI itself. Recover
                // through the view queue so its already-sent updates apply first.
                tracing::error!(error = %e, "request task failed");
                let mut view = self.view.clone();
                view.discard_placeholder();
                view.push_message(MessageKind::AnswerError, &format!("❌ Error: {}", e));
                view.scroll_to_bottom();
                view.set_submit_enabled(true);
                view.focus_input();
                self.controller = Some(ChatController::new(self.transport.clone(), view));
            }
        }
    }

    pub fn apply_update(&mut self, update: ViewUpdate) {
        update.apply(&mut self.transcript);
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.is_busy() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    pub fn page_size(&self) -> u16 {
        self.chat_height.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ChatError;
    use crate::transcript::Message;
    use crate::transport::ByteStream;
    use async_trait::async_trait;
    use futures_util::stream::{self, StreamExt};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::sync::{mpsc, Notify};

    /// Holds the response until released, so tests can act mid-request.
    #[derive(Clone)]
    struct GatedTransport {
        gate: Arc<Notify>,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl AskTransport for GatedTransport {
        async fn ask(&self, _question: &str) -> Result<ByteStream, ChatError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.gate.notified().await;
            Ok(stream::iter(vec![Ok(b"data: {\"chunk\":\"done\"}\n".to_vec())]).boxed())
        }
    }

    fn app() -> (App<GatedTransport>, mpsc::UnboundedReceiver<crate::tui::AppEvent>, GatedTransport) {
        let (tx, rx) = mpsc::unbounded_channel();
        let transport = GatedTransport {
            gate: Arc::new(Notify::new()),
            calls: Arc::new(AtomicUsize::new(0)),
        };
        let view = ViewSender::new(tx);
        (App::new(transport.clone(), view, "test".to_string()), rx, transport)
    }

    /// Panics instead of answering.
    #[derive(Clone)]
    struct PanickingTransport;

    #[async_trait]
    impl AskTransport for PanickingTransport {
        async fn ask(&self, _question: &str) -> Result<ByteStream, ChatError> {
            panic!("transport blew up")
        }
    }

    async fn drain<T>(app: &mut App<T>, rx: &mut mpsc::UnboundedReceiver<crate::tui::AppEvent>)
    where
        T: AskTransport + Clone + 'static,
    {
        while let Ok(crate::tui::AppEvent::View(update)) = rx.try_recv() {
            app.apply_update(update);
        }
    }

    async fn wait_for_task<T>(app: &mut App<T>)
    where
        T: AskTransport + Clone + 'static,
    {
        if let Some(task) = app.request_task.as_ref() {
            while !task.is_finished() {
                tokio::task::yield_now().await;
            }
        }
        app.reap_request().await;
    }

    #[tokio::test]
    async fn test_input_focused_on_start() {
        let (app, _rx, _) = app();
        assert!(app.transcript.input_focused);
        assert!(app.transcript.submit_enabled);
    }

    #[tokio::test]
    async fn test_second_submit_while_in_flight_is_noop() {
        let (mut app, mut rx, transport) = app();

        app.transcript.input = "first".to_string();
        app.submit().await;
        while transport.calls.load(Ordering::SeqCst) == 0 {
            tokio::task::yield_now().await;
        }
        drain(&mut app, &mut rx).await;
        assert!(!app.transcript.submit_enabled);

        // The question shows up before any response arrives
        assert_eq!(
            app.transcript.messages(),
            &[
                Message { kind: MessageKind::Question, text: "first".to_string() },
                Message { kind: MessageKind::Answer, text: String::new() },
            ]
        );
        assert!(app.transcript.is_streaming());

        app.transcript.input = "second".to_string();
        app.submit().await;
        assert_eq!(transport.calls.load(Ordering::SeqCst), 1);

        transport.gate.notify_one();
        wait_for_task(&mut app).await;
        drain(&mut app, &mut rx).await;

        let texts: Vec<&str> = app.transcript.messages().iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["first", "done"]);
        assert!(app.transcript.submit_enabled);
        assert!(!app.is_busy());
    }

    #[tokio::test]
    async fn test_blank_draft_does_not_start_request() {
        let (mut app, _rx, transport) = app();
        app.transcript.input = "   ".to_string();
        app.submit().await;
        assert!(app.request_task.is_none());
        assert_eq!(transport.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_panicked_request_restores_ui() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut app = App::new(PanickingTransport, ViewSender::new(tx), "test".to_string());

        app.transcript.input = "q".to_string();
        app.submit().await;
        wait_for_task(&mut app).await;
        drain(&mut app, &mut rx).await;

        let messages = app.transcript.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0], Message { kind: MessageKind::Question, text: "q".to_string() });
        assert_eq!(messages[1].kind, MessageKind::AnswerError);
        assert!(messages[1].text.starts_with("❌ Error: "));
        assert!(messages[1].text.contains("panicked"));
        assert!(!app.transcript.is_streaming());
        assert!(app.transcript.submit_enabled);
        assert!(app.transcript.input_focused);
        assert!(!app.is_busy());
        assert!(app.controller.is_some());
    }
}
