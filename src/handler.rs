use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};
use crate::app::App;
use crate::tui::AppEvent;

pub async fn handle_event(app: &mut App, event: AppEvent) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key).await?,
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Resize(_, _) => {}
        AppEvent::View(update) => app.apply_update(update),
        AppEvent::Tick => {
            app.tick_animation();
        }
    }
    app.reap_request().await;
    Ok(())
}

async fn handle_key(app: &mut App, key: KeyEvent) -> Result<()> {
    // Global keys that work in any mode
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return Ok(());
    }

    match key.code {
        KeyCode::Esc => app.should_quit = true,

        // Submit is ignored while a request is in flight
        KeyCode::Enter => {
            if app.transcript.submit_enabled {
                app.submit().await;
            }
        }

        // Transcript scrolling
        KeyCode::PageUp => {
            let page = app.page_size();
            app.transcript.scroll_up(page);
        }
        KeyCode::PageDown => {
            let page = app.page_size();
            app.transcript.scroll_down(page, app.max_scroll);
        }
        KeyCode::Up => app.transcript.scroll_up(1),
        KeyCode::Down => app.transcript.scroll_down(1, app.max_scroll),

        // Draft editing
        KeyCode::Backspace => app.transcript.backspace(),
        KeyCode::Delete => app.transcript.delete(),
        KeyCode::Left => app.transcript.cursor_left(),
        KeyCode::Right => app.transcript.cursor_right(),
        KeyCode::Home => app.transcript.cursor_home(),
        KeyCode::End => app.transcript.cursor_end(),
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.transcript.insert_char(c);
        }
        _ => {}
    }
    Ok(())
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    match mouse.kind {
        MouseEventKind::ScrollUp => app.transcript.scroll_up(3),
        MouseEventKind::ScrollDown => app.transcript.scroll_down(3, app.max_scroll),
        _ => {}
    }
}
