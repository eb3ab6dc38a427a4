use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Result, SessionError};

/// Outcome of a single try.
///
/// Kinds the server defines beyond the four known ones are carried through
/// untouched as `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ResultKind {
    Did,
    DidWithHelp,
    DidNot,
    Skipped,
    Other(String),
}

impl ResultKind {
    pub fn as_str(&self) -> &str {
        match self {
            ResultKind::Did => "did",
            ResultKind::DidWithHelp => "did_with_help",
            ResultKind::DidNot => "did_not",
            ResultKind::Skipped => "skipped",
            ResultKind::Other(kind) => kind,
        }
    }
}

impl From<String> for ResultKind {
    fn from(s: String) -> Self {
        match s.as_str() {
            "did" => ResultKind::Did,
            "did_with_help" => ResultKind::DidWithHelp,
            "did_not" => ResultKind::DidNot,
            "skipped" => ResultKind::Skipped,
            _ => ResultKind::Other(s),
        }
    }
}

impl From<&str> for ResultKind {
    fn from(s: &str) -> Self {
        ResultKind::from(s.to_string())
    }
}

impl From<ResultKind> for String {
    fn from(kind: ResultKind) -> Self {
        match kind {
            ResultKind::Other(kind) => kind,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for ResultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    clap::ValueEnum,
    strum_macros::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PlanType {
    Intervention,
    Evaluation,
    #[default]
    #[value(skip)]
    Unknown,
}

impl PlanType {
    /// Infer the plan type from where the plan was picked (a catalog or
    /// listing name such as `intervention` or `evaluation_plans`).
    pub fn from_origin(origin: &str) -> Self {
        let origin = origin.to_lowercase();
        if origin.contains("intervention") {
            PlanType::Intervention
        } else if origin.contains("evaluation") {
            PlanType::Evaluation
        } else {
            PlanType::Unknown
        }
    }

    /// Explicit parameter wins over the inferred origin.
    pub fn resolve(explicit: Option<PlanType>, origin: Option<&str>) -> Self {
        match (explicit, origin) {
            (Some(plan_type), _) => plan_type,
            (None, Some(origin)) => PlanType::from_origin(origin),
            (None, None) => PlanType::Unknown,
        }
    }
}

/// One timed attempt at an activity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Try {
    pub sleep_time: String,
    pub result: Option<ResultKind>,
    pub time: Option<String>,
    pub reward: Option<String>,
}

impl Try {
    pub fn pending(sleep_time: impl Into<String>) -> Self {
        Self {
            sleep_time: sleep_time.into(),
            result: None,
            time: None,
            reward: None,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.result.is_some()
    }

    pub fn sleep_secs(&self) -> u64 {
        parse_sleep_time(&self.sleep_time)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    pub activity_name: String,
    pub tries: Vec<Try>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Behavior {
    pub behavior_name: String,
    pub activities: Vec<Activity>,
}

pub type BehaviorQueue = Vec<Behavior>;

pub fn total_tries(queue: &[Behavior]) -> usize {
    queue
        .iter()
        .flat_map(|b| b.activities.iter())
        .map(|a| a.tries.len())
        .sum()
}

/// `<N>s` is seconds, `<N>m` is minutes; anything else means no delay.
pub fn parse_sleep_time(raw: &str) -> u64 {
    let raw = raw.trim();
    let (digits, multiplier) = if let Some(n) = raw.strip_suffix('s') {
        (n, 1)
    } else if let Some(n) = raw.strip_suffix('m') {
        (n, 60)
    } else {
        return 0;
    };

    digits
        .trim()
        .parse::<u64>()
        .map(|n| n.saturating_mul(multiplier))
        .unwrap_or(0)
}

/// Position of the walker inside the queue. Ordering is lexicographic over
/// (behavior, activity, try).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Cursor {
    pub behavior_index: usize,
    pub activity_index: usize,
    pub try_index: usize,
}

impl Cursor {
    pub fn new(behavior_index: usize, activity_index: usize, try_index: usize) -> Self {
        Self {
            behavior_index,
            activity_index,
            try_index,
        }
    }

    /// First position that holds a try, starting at `behavior_index` /
    /// `activity_index`. Empty activities and behaviors are passed over.
    pub fn first_from(
        queue: &[Behavior],
        behavior_index: usize,
        activity_index: usize,
    ) -> Option<Cursor> {
        let mut start_activity = activity_index;
        for (b, behavior) in queue.iter().enumerate().skip(behavior_index) {
            for (a, activity) in behavior.activities.iter().enumerate().skip(start_activity) {
                if !activity.tries.is_empty() {
                    return Some(Cursor::new(b, a, 0));
                }
            }
            start_activity = 0;
        }
        None
    }

    pub fn past_the_end(queue: &[Behavior]) -> Cursor {
        Cursor::new(queue.len(), 0, 0)
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}",
            self.behavior_index, self.activity_index, self.try_index
        )
    }
}

/// Identifying data that travels with the results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionHeader {
    pub patient_name: String,
    pub plan_name: String,
    #[serde(rename = "aplication_date")]
    pub application_date: String,
    #[serde(rename = "aplicator_name")]
    pub applicator_name: String,
}

/// Immutable metadata for one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    header: SessionHeader,
    plan_type: PlanType,
}

impl SessionContext {
    pub fn new(header: SessionHeader, plan_type: PlanType) -> Result<Self> {
        if header.patient_name.trim().is_empty() {
            return Err(SessionError::MissingField("patient_name"));
        }
        if header.plan_name.trim().is_empty() {
            return Err(SessionError::MissingField("plan_name"));
        }
        if header.applicator_name.trim().is_empty() {
            return Err(SessionError::MissingField("applicator_name"));
        }
        Ok(Self { header, plan_type })
    }

    pub fn header(&self) -> &SessionHeader {
        &self.header
    }

    pub fn plan_type(&self) -> PlanType {
        self.plan_type
    }
}
