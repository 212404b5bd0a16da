//! Chat transcript and input state
//!
//! `Transcript` is the in-memory stand-in for the hosting page: the message
//! list, the draft question, the submit gate and the scroll position. The
//! controller only ever talks to it through [`ChatView`].

/// Classification of a rendered message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Question,
    Answer,
    AnswerError,
}

/// A rendered unit in the transcript
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub kind: MessageKind,
    pub text: String,
}

/// Everything the chat controller is allowed to do to the screen.
pub trait ChatView {
    fn clear_input(&mut self);
    fn push_message(&mut self, kind: MessageKind, text: &str);
    /// Append an empty answer that receives streamed text.
    fn open_placeholder(&mut self);
    fn append_to_placeholder(&mut self, text: &str);
    /// Keep the placeholder as a finished answer; later appends are dropped.
    fn seal_placeholder(&mut self);
    /// Remove the placeholder from the transcript if it is still there.
    fn discard_placeholder(&mut self);
    fn scroll_to_bottom(&mut self);
    fn set_submit_enabled(&mut self, enabled: bool);
    fn focus_input(&mut self);
}

/// A [`ChatView`] call captured as data, so it can cross a channel and be
/// replayed on the UI side in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewUpdate {
    ClearInput,
    PushMessage(MessageKind, String),
    OpenPlaceholder,
    AppendToPlaceholder(String),
    SealPlaceholder,
    DiscardPlaceholder,
    ScrollToBottom,
    SetSubmitEnabled(bool),
    FocusInput,
}

impl ViewUpdate {
    pub fn apply<V: ChatView + ?Sized>(self, view: &mut V) {
        match self {
            ViewUpdate::ClearInput => view.clear_input(),
            ViewUpdate::PushMessage(kind, text) => view.push_message(kind, &text),
            ViewUpdate::OpenPlaceholder => view.open_placeholder(),
            ViewUpdate::AppendToPlaceholder(text) => view.append_to_placeholder(&text),
            ViewUpdate::SealPlaceholder => view.seal_placeholder(),
            ViewUpdate::DiscardPlaceholder => view.discard_placeholder(),
            ViewUpdate::ScrollToBottom => view.scroll_to_bottom(),
            ViewUpdate::SetSubmitEnabled(enabled) => view.set_submit_enabled(enabled),
            ViewUpdate::FocusInput => view.focus_input(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Transcript {
    messages: Vec<Message>,
    placeholder: Option<usize>,

    // Input state
    pub input: String,
    pub cursor: usize, // character index into `input`
    pub submit_enabled: bool,
    pub input_focused: bool,

    // Scroll state; `follow` pins the view to the newest content
    pub scroll: u16,
    pub follow: bool,
}

impl Default for Transcript {
    fn default() -> Self {
        Self::new()
    }
}

impl Transcript {
    pub fn new() -> Self {
        Self {
            messages: Vec::new(),
            placeholder: None,
            input: String::new(),
            cursor: 0,
            submit_enabled: true,
            input_focused: false,
            scroll: 0,
            follow: true,
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn is_streaming(&self) -> bool {
        self.placeholder.is_some()
    }

    /// Text received so far for the answer being streamed.
    pub fn placeholder_text(&self) -> Option<&str> {
        self.placeholder
            .and_then(|i| self.messages.get(i))
            .map(|m| m.text.as_str())
    }

    // Draft editing

    pub fn insert_char(&mut self, c: char) {
        let byte_pos = char_to_byte_index(&self.input, self.cursor);
        self.input.insert(byte_pos, c);
        self.cursor += 1;
    }

    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let byte_pos = char_to_byte_index(&self.input, self.cursor);
            self.input.remove(byte_pos);
        }
    }

    pub fn delete(&mut self) {
        if self.cursor < self.input.chars().count() {
            let byte_pos = char_to_byte_index(&self.input, self.cursor);
            self.input.remove(byte_pos);
        }
    }

    pub fn cursor_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn cursor_right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.input.chars().count());
    }

    pub fn cursor_home(&mut self) {
        self.cursor = 0;
    }

    pub fn cursor_end(&mut self) {
        self.cursor = self.input.chars().count();
    }

    // Scrolling

    pub fn scroll_up(&mut self, lines: u16) {
        self.follow = false;
        self.scroll = self.scroll.saturating_sub(lines);
    }

    /// Scroll down; reaching `max_scroll` re-attaches to the bottom.
    pub fn scroll_down(&mut self, lines: u16, max_scroll: u16) {
        self.scroll = self.scroll.saturating_add(lines).min(max_scroll);
        if self.scroll >= max_scroll {
            self.follow = true;
        }
    }
}

impl ChatView for Transcript {
    fn clear_input(&mut self) {
        self.input.clear();
        self.cursor = 0;
    }

    fn push_message(&mut self, kind: MessageKind, text: &str) {
        self.messages.push(Message {
            kind,
            text: text.to_string(),
        });
        self.follow = true;
    }

    fn open_placeholder(&mut self) {
        self.messages.push(Message {
            kind: MessageKind::Answer,
            text: String::new(),
        });
        self.placeholder = Some(self.messages.len() - 1);
        self.follow = true;
    }

    fn append_to_placeholder(&mut self, text: &str) {
        if let Some(message) = self.placeholder.and_then(|i| self.messages.get_mut(i)) {
            message.text.push_str(text);
        }
    }

    fn seal_placeholder(&mut self) {
        self.placeholder = None;
    }

    fn discard_placeholder(&mut self) {
        if let Some(index) = self.placeholder.take() {
            if index < self.messages.len() {
                self.messages.remove(index);
            }
        }
    }

    fn scroll_to_bottom(&mut self) {
        self.follow = true;
    }

    fn set_submit_enabled(&mut self, enabled: bool) {
        self.submit_enabled = enabled;
    }

    fn focus_input(&mut self) {
        self.input_focused = true;
    }
}

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}
