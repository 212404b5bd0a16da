use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Wrap},
};
use crate::app::App;
use crate::transcript::MessageKind;

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, chat, input, footer
    let [header_area, chat_area, input_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(3),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);
    render_chat(app, frame, chat_area);
    render_input(app, frame, input_area);
    render_footer(app, frame, footer_area);
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let title = Line::from(vec![
        Span::styled(" Ask ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(app.endpoint.clone(), Style::default().fg(Color::White)),
        Span::raw(" "),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_chat(app: &mut App, frame: &mut Frame, area: Rect) {
    // Store chat area dimensions for scroll calculations (inner size minus borders)
    app.chat_height = area.height.saturating_sub(2);
    app.chat_width = area.width.saturating_sub(2);

    let chat_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" Chat ");

    let chat_text = if app.transcript.messages().is_empty() {
        Text::from(Span::styled(
            "Ask a question...",
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        let streaming_index = if app.transcript.is_streaming() {
            app.transcript.messages().len().checked_sub(1)
        } else {
            None
        };

        let mut lines: Vec<Line> = Vec::new();
        for (i, msg) in app.transcript.messages().iter().enumerate() {
            let (label, label_style, text_style) = match msg.kind {
                MessageKind::Question => (
                    "You:",
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                    Style::default(),
                ),
                MessageKind::Answer => (
                    "Answer:",
                    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
                    Style::default(),
                ),
                MessageKind::AnswerError => (
                    "Answer:",
                    Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
                    Style::default().fg(Color::Red),
                ),
            };

            lines.push(Line::from(Span::styled(label, label_style)));

            if Some(i) == streaming_index && msg.text.is_empty() {
                // Animated ellipsis: cycles through ".", "..", "..."
                let dots = ".".repeat((app.animation_frame as usize) + 1);
                lines.push(Line::from(Span::styled(
                    format!("Thinking{}", dots),
                    Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
                )));
            } else {
                // Plain text, no markup
                for line in msg.text.split('\n') {
                    lines.push(Line::from(Span::styled(line.to_string(), text_style)));
                }
            }
            lines.push(Line::default());
        }

        Text::from(lines)
    };

    // Count rows with the same wrapping the chat paragraph renders with
    let total_lines = Paragraph::new(chat_text.clone())
        .wrap(Wrap { trim: false })
        .line_count(app.chat_width.max(1));
    let total_lines = u16::try_from(total_lines).unwrap_or(u16::MAX);

    app.max_scroll = total_lines.saturating_sub(app.chat_height);
    if app.transcript.follow {
        app.transcript.scroll = app.max_scroll;
    } else {
        app.transcript.scroll = app.transcript.scroll.min(app.max_scroll);
    }

    let chat = Paragraph::new(chat_text)
        .block(chat_block)
        .wrap(Wrap { trim: false })
        .scroll((app.transcript.scroll, 0));

    frame.render_widget(chat, area);
}

fn render_input(app: &App, frame: &mut Frame, area: Rect) {
    let input_border_color = if !app.transcript.submit_enabled {
        Color::DarkGray
    } else if app.transcript.input_focused {
        Color::Yellow
    } else {
        Color::White
    };

    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(input_border_color))
        .title(" Question ");

    // Calculate visible portion of input with horizontal scrolling
    // Inner width = total width - 2 (for borders)
    let inner_width = area.width.saturating_sub(2) as usize;
    let cursor_pos = app.transcript.cursor;

    // Calculate scroll offset to keep cursor visible
    let scroll_offset = if inner_width == 0 {
        0
    } else if cursor_pos >= inner_width {
        cursor_pos - inner_width + 1
    } else {
        0
    };

    let visible_text: String = app.transcript.input
        .chars()
        .skip(scroll_offset)
        .take(inner_width)
        .collect();

    let input = Paragraph::new(visible_text)
        .style(Style::default().fg(Color::Cyan))
        .block(input_block);

    frame.render_widget(input, area);

    if app.transcript.input_focused {
        let cursor_x = (cursor_pos - scroll_offset) as u16;
        frame.set_cursor_position((area.x + cursor_x + 1, area.y + 1));
    }
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let dots = ".".repeat((app.animation_frame as usize) + 1);
    let (status_text, status_style) = match app.transcript.placeholder_text() {
        Some(text) if !text.is_empty() => (
            format!(" Streaming{:<3} ", dots),
            Style::default().bg(Color::Green).fg(Color::Black),
        ),
        Some(_) => (
            format!(" Waiting{:<3} ", dots),
            Style::default().bg(Color::Yellow).fg(Color::Black),
        ),
        None if app.is_busy() => (
            format!(" Waiting{:<3} ", dots),
            Style::default().bg(Color::Yellow).fg(Color::Black),
        ),
        None => (
            " Ready ".to_string(),
            Style::default().bg(Color::Blue).fg(Color::White),
        ),
    };

    let mut spans = vec![Span::styled(status_text, status_style), Span::raw(" ")];
    if app.transcript.submit_enabled {
        spans.extend(vec![
            Span::styled(" Enter ", key_style),
            Span::styled(" ask ", label_style),
        ]);
    }
    spans.extend(vec![
        Span::styled(" PgUp/PgDn ", key_style),
        Span::styled(" scroll ", label_style),
        Span::styled(" Esc ", key_style),
        Span::styled(" quit ", label_style),
    ]);

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcript::ChatView;
    use crate::transport::HttpTransport;
    use crate::tui::ViewSender;
    use ratatui::{backend::TestBackend, Terminal};
    use tokio::sync::mpsc;

    fn test_app() -> App {
        let (tx, _rx) = mpsc::unbounded_channel();
        let transport = HttpTransport::new("http://localhost:8000", "/ask");
        App::new(transport, ViewSender::new(tx), "http://localhost:8000/ask".to_string())
    }

    fn draw(app: &mut App, width: u16, height: u16) -> Vec<String> {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        terminal.draw(|frame| render(app, frame)).unwrap();

        terminal
            .backend()
            .buffer()
            .content()
            .chunks(width as usize)
            .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
            .collect()
    }

    #[test]
    fn test_long_answer_keeps_last_word_visible() {
        let mut app = test_app();
        let mut answer: Vec<String> = (0..40).map(|i| format!("word{:03}", i)).collect();
        answer.push("LASTWORD".to_string());

        app.transcript.push_message(MessageKind::Question, "hello");
        app.transcript.open_placeholder();
        app.transcript.append_to_placeholder(&answer.join(" "));
        app.transcript.scroll_to_bottom();

        let rows = draw(&mut app, 22, 20);

        assert!(rows.iter().any(|row| row.contains("LASTWORD")), "{:#?}", rows);
        assert!(app.transcript.follow);
        assert_eq!(app.transcript.scroll, app.max_scroll);
    }

    #[test]
    fn test_scrolled_up_view_stays_put() {
        let mut app = test_app();
        let answer: Vec<String> = (0..40).map(|i| format!("word{:03}", i)).collect();
        app.transcript.push_message(MessageKind::Answer, &answer.join(" "));
        draw(&mut app, 22, 20);

        app.transcript.scroll_up(u16::MAX);
        let rows = draw(&mut app, 22, 20);

        assert_eq!(app.transcript.scroll, 0);
        assert!(rows.iter().any(|row| row.contains("word000")));
    }

    #[test]
    fn test_footer_status_follows_stream() {
        let mut app = test_app();
        let rows = draw(&mut app, 60, 10);
        assert!(rows[9].contains("Ready"));

        app.transcript.set_submit_enabled(false);
        app.transcript.open_placeholder();
        let rows = draw(&mut app, 60, 10);
        assert!(rows[9].contains("Waiting"));

        app.transcript.append_to_placeholder("Hi");
        let rows = draw(&mut app, 60, 10);
        assert!(rows[9].contains("Streaming"));
    }

    #[test]
    fn test_answer_text_is_literal() {
        let mut app = test_app();
        app.transcript.push_message(MessageKind::Answer, "**bold** <b>x</b>");
        let rows = draw(&mut app, 40, 12);
        assert!(rows.iter().any(|row| row.contains("**bold** <b>x</b>")));
    }
}
