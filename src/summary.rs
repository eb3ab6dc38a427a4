use itertools::Itertools;
use serde::Serialize;
use std::io::Write;
use unicode_width::UnicodeWidthStr;

use crate::error::Result;
use crate::plan::{Behavior, ResultKind, SessionHeader};

/// Label shown to the operator for a try outcome.
pub fn result_label(result: Option<&ResultKind>) -> &str {
    match result {
        Some(ResultKind::Did) => "Fez",
        Some(ResultKind::DidWithHelp) => "Fez com ajuda",
        Some(ResultKind::DidNot) => "Não fez",
        Some(ResultKind::Skipped) => "Pulado",
        Some(ResultKind::Other(kind)) => kind,
        None => "Não realizado",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RewardFlag {
    Given,
    NotGiven,
    Unknown,
}

impl RewardFlag {
    pub fn from_reward(reward: Option<&str>) -> Self {
        match reward {
            Some("Yes") => RewardFlag::Given,
            Some("No") => RewardFlag::NotGiven,
            _ => RewardFlag::Unknown,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RewardFlag::Given => "Sim",
            RewardFlag::NotGiven => "Não",
            RewardFlag::Unknown => "-",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryRow {
    pub behavior: String,
    pub activity: String,
    pub try_number: usize,
    pub result: String,
    pub time: String,
    pub reward: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivityTally {
    pub behavior: String,
    pub activity: String,
    pub did: usize,
    pub did_with_help: usize,
    pub did_not: usize,
    pub skipped: usize,
    pub not_performed: usize,
    pub other: usize,
    pub rewarded: usize,
}

impl ActivityTally {
    pub fn total(&self) -> usize {
        self.did + self.did_with_help + self.did_not + self.skipped + self.not_performed + self.other
    }
}

/// What the finalize screen shows for one session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSummary {
    pub header: SessionHeader,
    pub rows: Vec<SummaryRow>,
    pub tallies: Vec<ActivityTally>,
}

impl SessionSummary {
    pub fn new(header: &SessionHeader, behaviors: &[Behavior]) -> Self {
        let mut rows = Vec::new();
        let mut tallies = Vec::new();

        for behavior in behaviors {
            for activity in &behavior.activities {
                for (i, attempt) in activity.tries.iter().enumerate() {
                    rows.push(SummaryRow {
                        behavior: behavior.behavior_name.clone(),
                        activity: activity.activity_name.clone(),
                        try_number: i + 1,
                        result: result_label(attempt.result.as_ref()).to_string(),
                        time: attempt.time.clone().unwrap_or_else(|| "-".to_string()),
                        reward: RewardFlag::from_reward(attempt.reward.as_deref())
                            .label()
                            .to_string(),
                    });
                }

                let counts = activity
                    .tries
                    .iter()
                    .map(|t| t.result.as_ref().map(ResultKind::as_str))
                    .counts();
                let count = |kind: Option<&str>| counts.get(&kind).copied().unwrap_or(0);
                let known = count(Some("did"))
                    + count(Some("did_with_help"))
                    + count(Some("did_not"))
                    + count(Some("skipped"))
                    + count(None);

                tallies.push(ActivityTally {
                    behavior: behavior.behavior_name.clone(),
                    activity: activity.activity_name.clone(),
                    did: count(Some("did")),
                    did_with_help: count(Some("did_with_help")),
                    did_not: count(Some("did_not")),
                    skipped: count(Some("skipped")),
                    not_performed: count(None),
                    other: activity.tries.len() - known,
                    rewarded: activity
                        .tries
                        .iter()
                        .filter(|t| {
                            RewardFlag::from_reward(t.reward.as_deref()) == RewardFlag::Given
                        })
                        .count(),
                });
            }
        }

        Self {
            header: header.clone(),
            rows,
            tallies,
        }
    }

    pub fn total_tries(&self) -> usize {
        self.rows.len()
    }

    /// Aligned plain-text rendering for terminals and logs.
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("Paciente: {}\n", self.header.patient_name));
        out.push_str(&format!("Plano: {}\n", self.header.plan_name));
        out.push_str(&format!("Aplicador: {}\n", self.header.applicator_name));
        out.push_str(&format!("Data: {}\n\n", self.header.application_date));

        let header = [
            "Comportamento",
            "Atividade",
            "Tentativa",
            "Resultado",
            "Tempo",
            "Reforço",
        ];
        let cells: Vec<[String; 6]> = self
            .rows
            .iter()
            .map(|r| {
                [
                    r.behavior.clone(),
                    r.activity.clone(),
                    r.try_number.to_string(),
                    r.result.clone(),
                    r.time.clone(),
                    r.reward.clone(),
                ]
            })
            .collect();

        let widths: Vec<usize> = (0..header.len())
            .map(|col| {
                cells
                    .iter()
                    .map(|row| row[col].width())
                    .chain(std::iter::once(header[col].width()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let line = |values: Vec<&str>| {
            values
                .iter()
                .zip(&widths)
                .map(|(v, w)| format!("{}{}", v, " ".repeat(w.saturating_sub(v.width()))))
                .join("  ")
                .trim_end()
                .to_string()
        };

        out.push_str(&line(header.to_vec()));
        out.push('\n');
        for row in &cells {
            out.push_str(&line(row.iter().map(String::as_str).collect()));
            out.push('\n');
        }
        out
    }

    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut wtr = csv::Writer::from_writer(writer);
        for row in &self.rows {
            wtr.serialize(row)?;
        }
        wtr.flush()?;
        Ok(())
    }
}
