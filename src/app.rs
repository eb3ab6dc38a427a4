//! Terminal-facing session state: which screen is up and how keys map onto
//! the walker. Rendering lives in the binary.

use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::config::Config;
use crate::plan::ResultKind;
use crate::recorder::RewardAnswer;
use crate::summary::SessionSummary;
use crate::walker::{SessionWalker, Transition, TryDraft};

#[derive(Debug, Clone, PartialEq)]
pub enum PromptStage {
    Asking,
    Describing(String),
}

/// Reward question shown after a `did` / `did_with_help` in intervention plans.
#[derive(Debug, Clone, PartialEq)]
pub struct RewardPrompt {
    pub draft: TryDraft,
    pub stage: PromptStage,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AppState {
    Session,
    RewardPrompt(RewardPrompt),
    Summary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Continue,
    Quit,
}

#[derive(Debug)]
pub struct App {
    pub walker: SessionWalker,
    pub state: AppState,
    pub config: Config,
    pub summary: Option<SessionSummary>,
    pub summary_scroll: usize,
}

impl App {
    pub fn new(walker: SessionWalker, config: Config) -> Self {
        let mut app = Self {
            walker,
            state: AppState::Session,
            config,
            summary: None,
            summary_scroll: 0,
        };
        if app.walker.is_completed() {
            app.show_summary();
        }
        app
    }

    fn show_summary(&mut self) {
        self.summary = Some(SessionSummary::new(
            self.walker.context().header(),
            self.walker.queue(),
        ));
        self.state = AppState::Summary;
    }

    fn after_transition(&mut self, transition: Transition) {
        match transition {
            Transition::Completed => self.show_summary(),
            Transition::Moved(_) if self.config.auto_start => {
                self.walker.begin();
            }
            _ => {}
        }
    }

    pub fn on_tick(&mut self, dt: Duration) {
        self.walker.on_tick(dt);
    }

    pub fn on_focus_gained(&mut self) {
        if self.state == AppState::Session {
            let transition = self.walker.on_focus_regained();
            self.after_transition(transition);
        }
    }

    /// Leave the session. An outcome already picked while the reward prompt
    /// is open is kept, without a reward.
    fn quit(&mut self) -> Control {
        if let AppState::RewardPrompt(prompt) = &self.state {
            let draft = prompt.draft.clone();
            if self.walker.commit_draft(draft, None) {
                tracing::warn!("reward prompt left unanswered, outcome kept without reward");
            }
        }
        self.walker.suspend();
        Control::Quit
    }

    fn on_outcome(&mut self, outcome: ResultKind) {
        if self.walker.reward_prompt_required(&outcome) {
            if let Some(draft) = self.walker.stage_result(outcome) {
                self.state = AppState::RewardPrompt(RewardPrompt {
                    draft,
                    stage: PromptStage::Asking,
                });
            }
        } else {
            let transition = self.walker.record_result(outcome, None);
            self.after_transition(transition);
        }
    }

    /// Leaving the prompt is a return to the session view: the staged try is
    /// committed and the walker picks it up on focus.
    fn finish_prompt(&mut self, answer: RewardAnswer) {
        let AppState::RewardPrompt(prompt) = std::mem::replace(&mut self.state, AppState::Session)
        else {
            return;
        };
        self.walker.commit_draft(prompt.draft, Some(answer));
        let transition = self.walker.on_focus_regained();
        self.after_transition(transition);
    }

    fn on_prompt_key(&mut self, key: KeyEvent) {
        let AppState::RewardPrompt(prompt) = &mut self.state else {
            return;
        };

        let mut answer = None;
        let mut next_stage = None;
        match &mut prompt.stage {
            PromptStage::Asking => match key.code {
                KeyCode::Char('n') | KeyCode::Char('N') => answer = Some(RewardAnswer::No),
                KeyCode::Char('s') | KeyCode::Char('S') | KeyCode::Char('y') | KeyCode::Char('Y') => {
                    next_stage = Some(PromptStage::Describing(String::new()))
                }
                _ => {}
            },
            PromptStage::Describing(text) => match key.code {
                KeyCode::Enter => answer = Some(RewardAnswer::Yes(std::mem::take(text))),
                KeyCode::Backspace => {
                    text.pop();
                }
                KeyCode::Esc => next_stage = Some(PromptStage::Asking),
                KeyCode::Char(c) => text.push(c),
                _ => {}
            },
        }

        if let Some(stage) = next_stage {
            prompt.stage = stage;
        }
        if let Some(answer) = answer {
            self.finish_prompt(answer);
        }
    }

    pub fn on_key(&mut self, key: KeyEvent) -> Control {
        if key.kind != KeyEventKind::Press {
            return Control::Continue;
        }
        // ctrl+c to quit
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return self.quit();
        }

        match self.state {
            AppState::Session => match key.code {
                KeyCode::Esc => return self.quit(),
                KeyCode::Enter | KeyCode::Char(' ') => {
                    self.walker.begin();
                }
                KeyCode::Char('1') => self.on_outcome(ResultKind::Did),
                KeyCode::Char('2') => self.on_outcome(ResultKind::DidWithHelp),
                KeyCode::Char('3') => self.on_outcome(ResultKind::DidNot),
                KeyCode::Char('s') => {
                    let transition = self.walker.skip_remaining_tries_in_activity();
                    self.after_transition(transition);
                }
                _ => {}
            },
            AppState::RewardPrompt(_) => self.on_prompt_key(key),
            AppState::Summary => match key.code {
                KeyCode::Esc | KeyCode::Char('q') => return Control::Quit,
                KeyCode::Up => {
                    self.summary_scroll = self.summary_scroll.saturating_sub(1);
                }
                KeyCode::Down => {
                    // clamped when rendering
                    self.summary_scroll += 1;
                }
                KeyCode::Home => self.summary_scroll = 0,
                _ => {}
            },
        }
        Control::Continue
    }
}
