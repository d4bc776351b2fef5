//! Key bindings.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use super::runtime::App;

/// What a key press asks the dashboard to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Leave the dashboard.
    Quit,
    /// Select the slider above, wrapping.
    PrevSlider,
    /// Select the slider below, wrapping.
    NextSlider,
    /// Step the selected slider up.
    Increase,
    /// Step the selected slider down.
    Decrease,
    /// Restore the starting sliders.
    Reset,
}

/// Releases and repeats are ignored; only presses map to an action.
pub fn action_for(key: KeyEvent) -> Option<Action> {
    if key.kind != KeyEventKind::Press {
        return None;
    }
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    Some(match key.code {
        KeyCode::Char('c') if ctrl => Action::Quit,
        KeyCode::Char('q') | KeyCode::Esc => Action::Quit,
        KeyCode::Up | KeyCode::Char('k') | KeyCode::BackTab => Action::PrevSlider,
        KeyCode::Down | KeyCode::Char('j') | KeyCode::Tab => Action::NextSlider,
        KeyCode::Right | KeyCode::Char('l' | '+' | '=') => Action::Increase,
        KeyCode::Left | KeyCode::Char('h' | '-') => Action::Decrease,
        KeyCode::Char('r') => Action::Reset,
        _ => return None,
    })
}

/// Applies one key press to `app`.
pub fn handle_key(app: &mut App, key: KeyEvent) {
    match action_for(key) {
        Some(Action::Quit) => app.quit = true,
        Some(Action::PrevSlider) => app.select_prev(),
        Some(Action::NextSlider) => app.select_next(),
        Some(Action::Increase) => app.adjust(1.0),
        Some(Action::Decrease) => app.adjust(-1.0),
        Some(Action::Reset) => app.reset(),
        None => {}
    }
}
