//! Drives one plan session through its behaviors, activities and tries.
//!
//! The walker owns the [`BehaviorQueue`] for the whole session. Result events
//! are written onto the try under the cursor, and the cursor only ever moves
//! forward: next try, then next activity, then next behavior, then done.

use std::time::Duration;

use crate::plan::{Activity, Behavior, BehaviorQueue, Cursor, ResultKind, SessionContext, Try};
use crate::recorder::{self, FinalPayload, RewardAnswer};
use crate::timer::{TimerEvent, TimerMode, TryTimerService};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkerState {
    /// Try selected, waiting for the operator (or the sleep delay) to start it.
    AwaitingStart,
    /// Timer counting, waiting for a result.
    Running,
    /// Result captured, about to advance.
    Recording,
    Completed,
}

/// What a mutating call did to the cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Ignored,
    Stayed,
    Moved(Cursor),
    Completed,
}

/// A result captured while a reward prompt (or any sub-screen) is open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TryDraft {
    pub cursor: Cursor,
    pub outcome: ResultKind,
    pub elapsed_secs: u64,
}

#[derive(Debug)]
pub struct SessionWalker {
    context: SessionContext,
    queue: BehaviorQueue,
    cursor: Cursor,
    state: WalkerState,
    timer: TryTimerService,
    focus_armed: bool,
}

impl SessionWalker {
    pub fn new(context: SessionContext, queue: BehaviorQueue) -> Self {
        let (cursor, state) = match Cursor::first_from(&queue, 0, 0) {
            Some(cursor) => (cursor, WalkerState::AwaitingStart),
            None => {
                tracing::info!("plan has no tries, session completed on start");
                (Cursor::past_the_end(&queue), WalkerState::Completed)
            }
        };

        Self {
            context,
            queue,
            cursor,
            state,
            timer: TryTimerService::new(),
            focus_armed: true,
        }
    }

    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    pub fn state(&self) -> WalkerState {
        self.state
    }

    pub fn is_completed(&self) -> bool {
        self.state == WalkerState::Completed
    }

    /// `None` once the session is completed.
    pub fn cursor(&self) -> Option<Cursor> {
        (!self.is_completed()).then_some(self.cursor)
    }

    pub fn queue(&self) -> &[Behavior] {
        &self.queue
    }

    pub fn current_behavior(&self) -> Option<&Behavior> {
        self.cursor().and_then(|c| self.queue.get(c.behavior_index))
    }

    pub fn current_activity(&self) -> Option<&Activity> {
        let c = self.cursor()?;
        self.queue
            .get(c.behavior_index)?
            .activities
            .get(c.activity_index)
    }

    pub fn current_try(&self) -> Option<&Try> {
        let c = self.cursor()?;
        self.current_activity()?.tries.get(c.try_index)
    }

    fn current_try_mut(&mut self) -> Option<&mut Try> {
        let c = self.cursor()?;
        self.queue
            .get_mut(c.behavior_index)?
            .activities
            .get_mut(c.activity_index)?
            .tries
            .get_mut(c.try_index)
    }

    pub fn elapsed_secs(&self) -> u64 {
        self.timer.elapsed_secs()
    }

    /// Seconds left on the pre-try delay, if one is pending.
    pub fn delay_remaining(&self) -> Option<u64> {
        match self.timer.mode() {
            Some(TimerMode::SleepDelay { remaining_secs }) => Some(remaining_secs),
            _ => None,
        }
    }

    pub fn is_delaying(&self) -> bool {
        self.delay_remaining().is_some()
    }

    pub fn timer(&self) -> &TryTimerService {
        &self.timer
    }

    pub fn reward_prompt_required(&self, outcome: &ResultKind) -> bool {
        recorder::reward_prompt_required(self.context.plan_type(), outcome)
    }

    /// Start the current try: run its sleep delay, then count elapsed time.
    pub fn begin(&mut self) -> Transition {
        if self.state != WalkerState::AwaitingStart {
            tracing::debug!(state = ?self.state, "begin ignored");
            return Transition::Ignored;
        }
        if self.is_delaying() {
            tracing::debug!(cursor = %self.cursor, "begin ignored, delay already pending");
            return Transition::Ignored;
        }

        self.focus_armed = true;
        let delay = self.current_try().map(Try::sleep_secs).unwrap_or(0);
        if delay == 0 {
            self.enter_running();
        } else {
            tracing::debug!(cursor = %self.cursor, delay, "sleep delay started");
            self.timer.start_delay(delay);
        }
        Transition::Stayed
    }

    fn enter_running(&mut self) {
        self.timer.reset_elapsed();
        self.timer.start_elapsed();
        self.state = WalkerState::Running;
        tracing::debug!(cursor = %self.cursor, "try running");
    }

    /// Feed wall time to the timer; the pre-try delay ending moves the
    /// walker into `Running`.
    pub fn on_tick(&mut self, dt: Duration) -> Option<TimerEvent> {
        let event = self.timer.on_tick(dt);
        if event == Some(TimerEvent::DelayElapsed) && self.state == WalkerState::AwaitingStart {
            self.enter_running();
        }
        event
    }

    /// Stop the timer and capture the outcome without writing it yet.
    pub fn stage_result(&mut self, outcome: ResultKind) -> Option<TryDraft> {
        if self.state != WalkerState::Running {
            tracing::warn!(state = ?self.state, %outcome, "result ignored, try is not running");
            return None;
        }
        self.timer.stop();
        self.state = WalkerState::Recording;
        Some(TryDraft {
            cursor: self.cursor,
            outcome,
            elapsed_secs: self.timer.elapsed_secs(),
        })
    }

    /// Write a staged result onto its try. Advancing is left to
    /// [`SessionWalker::on_focus_regained`].
    pub fn commit_draft(&mut self, draft: TryDraft, answer: Option<RewardAnswer>) -> bool {
        if self.is_completed() || draft.cursor != self.cursor {
            tracing::warn!(draft = %draft.cursor, "stale draft ignored");
            return false;
        }
        let reward = recorder::resolve_reward(self.context.plan_type(), &draft.outcome, answer);
        let Some(attempt) = self.current_try_mut() else {
            return false;
        };
        recorder::commit(attempt, draft.outcome, draft.elapsed_secs, reward);
        self.focus_armed = true;
        true
    }

    pub fn record_result(
        &mut self,
        outcome: ResultKind,
        answer: Option<RewardAnswer>,
    ) -> Transition {
        match self.stage_result(outcome) {
            Some(draft) => {
                self.commit_draft(draft, answer);
                self.advance()
            }
            None => Transition::Ignored,
        }
    }

    pub fn advance(&mut self) -> Transition {
        if self.is_completed() {
            tracing::debug!("advance ignored, session completed");
            return Transition::Ignored;
        }

        let c = self.cursor;
        let tries_in_activity = self
            .current_activity()
            .map(|a| a.tries.len())
            .unwrap_or(0);

        let next = if c.try_index + 1 < tries_in_activity {
            Some(Cursor::new(c.behavior_index, c.activity_index, c.try_index + 1))
        } else {
            Cursor::first_from(&self.queue, c.behavior_index, c.activity_index + 1)
        };

        match next {
            Some(next) => self.move_to(next),
            None => self.complete(),
        }
    }

    fn move_to(&mut self, next: Cursor) -> Transition {
        debug_assert!(next > self.cursor, "cursor moved backward");
        self.timer.stop();
        self.timer.reset_elapsed();
        self.cursor = next;
        self.state = WalkerState::AwaitingStart;
        tracing::debug!(cursor = %next, "advanced");
        Transition::Moved(next)
    }

    fn complete(&mut self) -> Transition {
        self.timer.stop();
        self.cursor = Cursor::past_the_end(&self.queue);
        self.state = WalkerState::Completed;
        tracing::info!(
            patient = %self.context.header().patient_name,
            plan = %self.context.header().plan_name,
            "session completed"
        );
        Transition::Completed
    }

    /// Mark every try left in the current activity as skipped, then move on
    /// to the next activity.
    pub fn skip_remaining_tries_in_activity(&mut self) -> Transition {
        let Some(c) = self.cursor() else {
            tracing::debug!("skip ignored, session completed");
            return Transition::Ignored;
        };
        self.timer.stop();

        if let Some(activity) = self
            .queue
            .get_mut(c.behavior_index)
            .and_then(|b| b.activities.get_mut(c.activity_index))
        {
            for attempt in activity.tries.iter_mut().skip(c.try_index) {
                recorder::skip(attempt);
            }
            tracing::debug!(activity = %activity.activity_name, from = c.try_index, "tries skipped");
        }

        match Cursor::first_from(&self.queue, c.behavior_index, c.activity_index + 1) {
            Some(next) => self.move_to(next),
            None => self.complete(),
        }
    }

    /// The hosting screen is visible again. A try that was recorded while it
    /// was away counts as an applied result and the walker advances once.
    pub fn on_focus_regained(&mut self) -> Transition {
        if !self.focus_armed {
            return Transition::Ignored;
        }
        match self.current_try() {
            Some(attempt) if attempt.is_completed() => {
                self.focus_armed = false;
                self.timer.stop();
                self.state = WalkerState::Recording;
                self.advance()
            }
            _ => Transition::Stayed,
        }
    }

    /// Stop timing without touching recorded tries (navigating away).
    pub fn suspend(&mut self) {
        if self.timer.stop() {
            tracing::debug!(cursor = %self.cursor, "timer stopped on suspend");
        }
    }

    pub fn final_payload(&self) -> FinalPayload<'_> {
        recorder::build_final_payload(&self.context, &self.queue)
    }
}

impl Drop for SessionWalker {
    fn drop(&mut self) {
        self.timer.stop();
    }
}
