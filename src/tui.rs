use std::io::{self, Stderr};
use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyEvent, KeyEventKind, MouseEvent},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use futures_util::StreamExt;
use tokio::sync::mpsc;

use crate::transcript::{ChatView, MessageKind, ViewUpdate};

pub type Tui = Terminal<CrosstermBackend<Stderr>>;

#[derive(Debug)]
#[allow(dead_code)]
pub enum AppEvent {
    Key(KeyEvent),
    Mouse(MouseEvent),
    Resize(u16, u16),
    Tick,
    /// A transcript change coming from the request task.
    View(ViewUpdate),
}

pub struct EventHandler {
    rx: mpsc::UnboundedReceiver<AppEvent>,
    tx: mpsc::UnboundedSender<AppEvent>,
}

impl EventHandler {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();

        // Spawn event reader task
        let tx_events = tx.clone();
        tokio::spawn(async move {
            let mut reader = event::EventStream::new();
            while let Some(evt) = reader.next().await {
                let app_event = match evt {
                    // Only handle key press events, not release
                    Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => Some(AppEvent::Key(key)),
                    Ok(Event::Mouse(mouse)) => Some(AppEvent::Mouse(mouse)),
                    Ok(Event::Resize(w, h)) => Some(AppEvent::Resize(w, h)),
                    Ok(_) => None,
                    Err(e) => {
                        tracing::warn!(error = %e, "terminal event error");
                        None
                    }
                };

                if let Some(event) = app_event {
                    if tx_events.send(event).is_err() {
                        break;
                    }
                }
            }
        });

        // Spawn tick timer for the busy indicator (300ms interval)
        let tx_tick = tx.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(std::time::Duration::from_millis(300));
            loop {
                interval.tick().await;
                if tx_tick.send(AppEvent::Tick).is_err() {
                    break;
                }
            }
        });

        Self { rx, tx }
    }

    /// A [`ChatView`] that forwards into this event queue.
    pub fn view_sender(&self) -> ViewSender {
        ViewSender::new(self.tx.clone())
    }

    pub async fn next(&mut self) -> Option<AppEvent> {
        self.rx.recv().await
    }
}

/// Request-side half of the transcript: every call is queued as an
/// [`AppEvent::View`] and applied by the event loop.
#[derive(Clone)]
pub struct ViewSender {
    tx: mpsc::UnboundedSender<AppEvent>,
}

impl ViewSender {
    pub fn new(tx: mpsc::UnboundedSender<AppEvent>) -> Self {
        Self { tx }
    }

    fn send(&self, update: ViewUpdate) {
        // The receiver only goes away on shutdown
        let _ = self.tx.send(AppEvent::View(update));
    }
}

impl ChatView for ViewSender {
    fn clear_input(&mut self) {
        self.send(ViewUpdate::ClearInput);
    }

    fn push_message(&mut self, kind: MessageKind, text: &str) {
        self.send(ViewUpdate::PushMessage(kind, text.to_string()));
    }

    fn open_placeholder(&mut self) {
        self.send(ViewUpdate::OpenPlaceholder);
    }

    fn append_to_placeholder(&mut self, text: &str) {
        self.send(ViewUpdate::AppendToPlaceholder(text.to_string()));
    }

    fn seal_placeholder(&mut self) {
        self.send(ViewUpdate::SealPlaceholder);
    }

    fn discard_placeholder(&mut self) {
        self.send(ViewUpdate::DiscardPlaceholder);
    }

    fn scroll_to_bottom(&mut self) {
        self.send(ViewUpdate::ScrollToBottom);
    }

    fn set_submit_enabled(&mut self, enabled: bool) {
        self.send(ViewUpdate::SetSubmitEnabled(enabled));
    }

    fn focus_input(&mut self) {
        self.send(ViewUpdate::FocusInput);
    }
}

pub fn init() -> Result<Tui> {
    enable_raw_mode()?;
    execute!(io::stderr(), EnterAlternateScreen)?;

    // Enable mouse capture
    execute!(io::stderr(), crossterm::event::EnableMouseCapture)?;

    let backend = CrosstermBackend::new(io::stderr());
    let terminal = Terminal::new(backend)?;

    Ok(terminal)
}

pub fn restore() -> Result<()> {
    execute!(io::stderr(), crossterm::event::DisableMouseCapture)?;
    execute!(io::stderr(), LeaveAlternateScreen)?;
    disable_raw_mode()?;
    Ok(())
}

/// Install panic hook to restore terminal on panic
pub fn install_panic_hook() {
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = restore();
        original_hook(panic_info);
    }));
}
