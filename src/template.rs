use include_dir::{include_dir, Dir};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{Result, SessionError};
use crate::plan::{Activity, Behavior, BehaviorQueue, PlanType, Try};

static PLAN_DIR: Dir = include_dir!("src/plans");

fn default_sleep_time() -> String {
    "0s".to_string()
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct ActivityTemplate {
    pub name: String,
    pub tries: usize,
    #[serde(default = "default_sleep_time")]
    pub sleep_time: String,
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct BehaviorTemplate {
    pub name: String,
    pub activities: Vec<ActivityTemplate>,
}

/// A plan as configured before a session: behaviors, activities and how many
/// tries each activity gets.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct PlanTemplate {
    pub name: String,
    #[serde(default)]
    pub plan_type: Option<PlanType>,
    pub behaviors: Vec<BehaviorTemplate>,
}

/// A template together with the listing it was picked from.
#[derive(Clone, Debug, PartialEq)]
pub struct CatalogEntry {
    pub origin: String,
    pub key: String,
    pub template: PlanTemplate,
}

impl CatalogEntry {
    /// A flag passed on the command line beats the template's own type,
    /// which beats the listing it came from.
    pub fn plan_type(&self, explicit: Option<PlanType>) -> PlanType {
        PlanType::resolve(explicit.or(self.template.plan_type), Some(&self.origin))
    }
}

fn parse_template(raw: &str) -> Result<PlanTemplate> {
    Ok(serde_json::from_str(raw)?)
}

/// Every plan bundled with the binary, ordered by origin then key.
pub fn catalog() -> Result<Vec<CatalogEntry>> {
    let mut entries = Vec::new();
    for dir in PLAN_DIR.dirs() {
        let origin = dir.path().to_string_lossy().to_string();
        for file in dir.files() {
            let Some(key) = file.path().file_stem() else {
                continue;
            };
            let Some(raw) = file.contents_utf8() else {
                tracing::warn!(path = %file.path().display(), "bundled plan is not utf-8");
                continue;
            };
            entries.push(CatalogEntry {
                origin: origin.clone(),
                key: key.to_string_lossy().to_string(),
                template: parse_template(raw)?,
            });
        }
    }
    entries.sort_by(|a, b| (&a.origin, &a.key).cmp(&(&b.origin, &b.key)));
    Ok(entries)
}

/// Look up a bundled plan by `key` or `origin/key`.
pub fn find_bundled(name: &str) -> Result<CatalogEntry> {
    let (origin, key) = match name.split_once('/') {
        Some((origin, key)) => (Some(origin), key),
        None => (None, name),
    };
    catalog()?
        .into_iter()
        .find(|e| e.key == key && origin.map_or(true, |o| o == e.origin))
        .ok_or_else(|| SessionError::TemplateNotFound(name.to_string()))
}

/// Read a template from disk. The parent directory name serves as origin.
pub fn load_file<P: AsRef<Path>>(path: P) -> Result<CatalogEntry> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path)?;
    let origin = path
        .parent()
        .and_then(|p| p.file_name())
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let key = path
        .file_stem()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    Ok(CatalogEntry {
        origin,
        key,
        template: parse_template(&raw)?,
    })
}

/// A path on disk wins over a bundled plan of the same name.
pub fn load(name_or_path: &str) -> Result<CatalogEntry> {
    let path = Path::new(name_or_path);
    if path.is_file() {
        load_file(path)
    } else {
        find_bundled(name_or_path)
    }
}

/// Build the session queue from a template. An empty selection keeps every
/// behavior; otherwise behaviors are kept in plan order.
pub fn build_queue(template: &PlanTemplate, selection: &[String]) -> Result<BehaviorQueue> {
    if let Some(unknown) = selection
        .iter()
        .find(|name| !template.behaviors.iter().any(|b| &b.name == *name))
    {
        return Err(SessionError::UnknownBehavior(unknown.clone()));
    }

    let queue = template
        .behaviors
        .iter()
        .filter(|b| selection.is_empty() || selection.contains(&b.name))
        .map(|b| Behavior {
            behavior_name: b.name.clone(),
            activities: b
                .activities
                .iter()
                .map(|a| Activity {
                    activity_name: a.name.clone(),
                    tries: (0..a.tries).map(|_| Try::pending(a.sleep_time.clone())).collect(),
                })
                .collect(),
        })
        .collect();

    Ok(queue)
}
