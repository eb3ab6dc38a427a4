use ratatui::Frame;

use aba_session::app::{App, AppState};

use crate::ui::{render_reward_prompt, summary_table::render_summary, SessionView};

/// A UI Screen boundary: one per app state
pub trait Screen {
    fn render(&self, app: &mut App, f: &mut Frame);
}

/// Session screen - renders the current try using the session view widget
pub struct SessionScreen;

impl Screen for SessionScreen {
    fn render(&self, app: &mut App, f: &mut Frame) {
        f.render_widget(SessionView(&*app), f.area());
    }
}

pub struct RewardPromptScreen;

impl Screen for RewardPromptScreen {
    fn render(&self, app: &mut App, f: &mut Frame) {
        render_reward_prompt(app, f);
    }
}

/// Summary screen - uses dedicated renderer
pub struct SummaryScreen;

impl Screen for SummaryScreen {
    fn render(&self, app: &mut App, f: &mut Frame) {
        render_summary(app, f);
    }
}

/// Helper to construct the appropriate screen for the current state
pub fn current_screen(state: &AppState) -> Box<dyn Screen> {
    match state {
        AppState::Session => Box::new(SessionScreen),
        AppState::RewardPrompt(_) => Box::new(RewardPromptScreen),
        AppState::Summary => Box::new(SummaryScreen),
    }
}
