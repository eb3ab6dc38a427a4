use serde::{Deserialize, Serialize};

use crate::plan::{Behavior, PlanType, ResultKind, SessionContext, SessionHeader, Try};

/// Operator's answer to the reward prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RewardAnswer {
    No,
    Yes(String),
}

impl RewardAnswer {
    pub fn into_reward(self) -> String {
        match self {
            RewardAnswer::No => "No".to_string(),
            RewardAnswer::Yes(text) if text.trim().is_empty() => "Yes".to_string(),
            RewardAnswer::Yes(text) => text.trim().to_string(),
        }
    }
}

/// Rewards only mean something for intervention plans when the patient
/// did the activity, with or without help.
pub fn reward_prompt_required(plan_type: PlanType, outcome: &ResultKind) -> bool {
    plan_type == PlanType::Intervention
        && matches!(outcome, ResultKind::Did | ResultKind::DidWithHelp)
}

/// Apply the reward policy to an optional answer.
pub fn resolve_reward(
    plan_type: PlanType,
    outcome: &ResultKind,
    answer: Option<RewardAnswer>,
) -> Option<String> {
    if reward_prompt_required(plan_type, outcome) {
        answer.map(RewardAnswer::into_reward)
    } else {
        None
    }
}

pub fn commit(attempt: &mut Try, outcome: ResultKind, elapsed_secs: u64, reward: Option<String>) {
    attempt.result = Some(outcome);
    attempt.time = Some(format!("{}s", elapsed_secs));
    attempt.reward = reward;
}

pub fn skip(attempt: &mut Try) {
    attempt.result = Some(ResultKind::Skipped);
    attempt.time = None;
    attempt.reward = None;
}

/// Borrowed view of a finished session, ready for submission.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct FinalPayload<'a> {
    #[serde(flatten)]
    pub header: &'a SessionHeader,
    pub behaviors: &'a [Behavior],
}

pub fn build_final_payload<'a>(
    context: &'a SessionContext,
    queue: &'a [Behavior],
) -> FinalPayload<'a> {
    FinalPayload {
        header: context.header(),
        behaviors: queue,
    }
}

/// Owned counterpart of [`FinalPayload`], read back from a submitted file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmittedSession {
    #[serde(flatten)]
    pub header: SessionHeader,
    pub behaviors: Vec<Behavior>,
}

impl From<FinalPayload<'_>> for SubmittedSession {
    fn from(payload: FinalPayload<'_>) -> Self {
        Self {
            header: payload.header.clone(),
            behaviors: payload.behaviors.to_vec(),
        }
    }
}
