//! In-memory Wwise project answering the WAAPI calls the audit makes

#![allow(dead_code)]

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Local, TimeZone};
use rf_bank_audit::{AuditReporter, ReportRow};
use rf_waapi::{uri, WaapiCall, WaapiError, WaapiResult, WaapiSession};
use serde_json::{json, Map, Value};

#[derive(Debug, Clone)]
struct FakeObject {
    id: String,
    name: String,
    path: String,
    object_type: String,
    parent: Option<String>,
}

/// Shared view of what a `FakeProject` saw, usable after the project is consumed
#[derive(Debug, Clone, Default)]
pub struct CallLog {
    calls: Arc<Mutex<Vec<(String, Value)>>>,
    closed: Arc<AtomicBool>,
}

impl CallLog {
    /// `(uri, args)` of every call so far
    pub fn calls(&self) -> Vec<(String, Value)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

/// Project tree, banks and failure switches
pub struct FakeProject {
    project_file: PathBuf,
    objects: Vec<FakeObject>,
    banks: Vec<(String, Vec<String>)>,
    malformed_bank_list: bool,
    log: CallLog,
}

impl FakeProject {
    pub fn new(project_file: impl Into<PathBuf>) -> Self {
        Self {
            project_file: project_file.into(),
            objects: Vec::new(),
            banks: Vec::new(),
            malformed_bank_list: false,
            log: CallLog::default(),
        }
    }

    fn add(mut self, id: &str, name: &str, object_type: &str, parent: Option<&str>) -> Self {
        let path = match parent {
            Some(parent_id) => {
                let parent = self
                    .objects
                    .iter()
                    .find(|object| object.id == parent_id)
                    .unwrap_or_else(|| panic!("Unknown parent {}", parent_id));
                format!("{}/{}", parent.path, name)
            }
            None => format!("/{}", name),
        };
        self.objects.push(FakeObject {
            id: id.to_string(),
            name: name.to_string(),
            path,
            object_type: object_type.to_string(),
            parent: parent.map(str::to_string),
        });
        self
    }

    /// Container (work unit, folder, actor-mixer)
    pub fn folder(self, id: &str, name: &str, parent: Option<&str>) -> Self {
        self.add(id, name, "Folder", parent)
    }

    pub fn event(self, id: &str, name: &str, parent: Option<&str>) -> Self {
        self.add(id, name, "Event", parent)
    }

    /// Non-event object, e.g. a Sound
    pub fn sound(self, id: &str, name: &str, parent: Option<&str>) -> Self {
        self.add(id, name, "Sound", parent)
    }

    /// SoundBank directly including the objects with `ids`
    pub fn bank(mut self, name: &str, ids: &[&str]) -> Self {
        self.banks
            .push((name.to_string(), ids.iter().map(|id| id.to_string()).collect()));
        self
    }

    /// Answer the SoundBank listing with a non-list
    pub fn malformed_bank_list(mut self) -> Self {
        self.malformed_bank_list = true;
        self
    }

    /// Handle on the calls this project answers
    pub fn call_log(&self) -> CallLog {
        self.log.clone()
    }

    fn descendants(&self, roots: &[&FakeObject]) -> Vec<&FakeObject> {
        let mut found = Vec::new();
        let mut frontier: Vec<String> = roots.iter().map(|object| object.id.clone()).collect();
        let mut seen: HashSet<String> = HashSet::new();
        while let Some(id) = frontier.pop() {
            for child in self
                .objects
                .iter()
                .filter(|object| object.parent.as_deref() == Some(id.as_str()))
            {
                if seen.insert(child.id.clone()) {
                    found.push(child);
                    frontier.push(child.id.clone());
                }
            }
        }
        found
    }

    fn record(&self, object: &FakeObject, fields: &[String]) -> Value {
        let mut record = Map::new();
        for field in fields {
            let value = match field.as_str() {
                "id" => json!(object.id),
                "name" => json!(object.name),
                "path" => json!(object.path),
                "type" => json!(object.object_type),
                _ => Value::Null,
            };
            record.insert(field.clone(), value);
        }
        Value::Object(record)
    }

    fn object_get(&self, args: &Value, options: &Value) -> WaapiResult<Value> {
        let fields: Vec<String> = options["return"]
            .as_array()
            .map(|fields| fields.iter().filter_map(|f| f.as_str().map(str::to_string)).collect())
            .unwrap_or_default();

        if let Some(types) = args["from"]["ofType"].as_array() {
            let types: Vec<&str> = types.iter().filter_map(Value::as_str).collect();
            if types == ["Project"] {
                let name = self
                    .project_file
                    .file_stem()
                    .map(|stem| stem.to_string_lossy().to_string())
                    .unwrap_or_default();
                return Ok(json!({ "return": [
                    { "name": name, "filePath": self.project_file.display().to_string() }
                ] }));
            }
            if types == ["SoundBank"] && self.malformed_bank_list {
                return Ok(json!({ "return": "BK1" }));
            }
            if types == ["SoundBank"] {
                let banks: Vec<Value> =
                    self.banks.iter().map(|(name, _)| json!({ "name": name })).collect();
                return Ok(json!({ "return": banks }));
            }
            let objects: Vec<Value> = self
                .objects
                .iter()
                .filter(|object| types.contains(&object.object_type.as_str()))
                .map(|object| self.record(object, &fields))
                .collect();
            return Ok(json!({ "return": objects }));
        }

        let ids: Vec<&str> = args["from"]["id"]
            .as_array()
            .map(|ids| ids.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default();
        let mut current: Vec<&FakeObject> = self
            .objects
            .iter()
            .filter(|object| ids.contains(&object.id.as_str()))
            .collect();

        for step in args["transform"].as_array().into_iter().flatten() {
            if step["select"] == json!(["descendants"]) {
                current = self.descendants(&current);
            } else if step["where"][0] == "type:isIn" {
                let allowed: Vec<&str> = step["where"][1]
                    .as_array()
                    .map(|types| types.iter().filter_map(Value::as_str).collect())
                    .unwrap_or_default();
                current.retain(|object| allowed.contains(&object.object_type.as_str()));
            } else {
                return Err(WaapiError::RequestFailed {
                    uri: uri::OBJECT_GET.to_string(),
                    error: "ak.wwise.query.invalid_transform".to_string(),
                    message: Some(step.to_string()),
                });
            }
        }

        let objects: Vec<Value> = current
            .into_iter()
            .map(|object| self.record(object, &fields))
            .collect();
        Ok(json!({ "return": objects }))
    }

    fn inclusions(&self, args: &Value) -> WaapiResult<Value> {
        let bank = args["soundbank"]
            .as_str()
            .and_then(|bank| bank.strip_prefix("SoundBank:"))
            .unwrap_or_default();
        match self.banks.iter().find(|(name, _)| name == bank) {
            Some((_, ids)) => {
                let inclusions: Vec<Value> = ids
                    .iter()
                    .map(|id| json!({ "object": id, "filter": ["events", "structures", "media"] }))
                    .collect();
                Ok(json!({ "inclusions": inclusions }))
            }
            None => Err(WaapiError::RequestFailed {
                uri: uri::SOUNDBANK_GET_INCLUSIONS.to_string(),
                error: "ak.wwise.invalid_arguments".to_string(),
                message: Some(format!("SoundBank '{}' not found", bank)),
            }),
        }
    }
}

impl WaapiCall for FakeProject {
    async fn call(&self, procedure: &str, args: Value, options: Value) -> WaapiResult<Value> {
        self.log
            .calls
            .lock()
            .unwrap()
            .push((procedure.to_string(), args.clone()));

        if self.log.is_closed() {
            return Err(WaapiError::NotConnected);
        }
        match procedure {
            uri::OBJECT_GET => self.object_get(&args, &options),
            uri::SOUNDBANK_GET_INCLUSIONS => self.inclusions(&args),
            other => Err(WaapiError::RequestFailed {
                uri: other.to_string(),
                error: "wamp.error.no_such_procedure".to_string(),
                message: None,
            }),
        }
    }
}

impl WaapiSession for FakeProject {
    async fn close(self) -> WaapiResult<()> {
        self.log.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// The two-folder project used by most scenarios:
///
/// ```text
/// /A/Play_Foo   {PLAY-FOO}  under {FOLDER-A}
/// /B/Play_Bar   {PLAY-BAR}  under {FOLDER-B}
/// ```
pub fn two_folder_project(project_file: &Path) -> FakeProject {
    FakeProject::new(project_file)
        .folder("{FOLDER-A}", "A", None)
        .event("{PLAY-FOO}", "Play_Foo", Some("{FOLDER-A}"))
        .folder("{FOLDER-B}", "B", None)
        .event("{PLAY-BAR}", "Play_Bar", Some("{FOLDER-B}"))
}

/// Fixed run start, so report names are predictable
pub fn started_at(second: u32) -> DateTime<Local> {
    Local
        .with_ymd_and_hms(2024, 3, 7, 9, 5, second)
        .single()
        .unwrap()
}

/// Reporter that keeps what it was told
#[derive(Debug, Default)]
pub struct CapturingReporter {
    pub steps: Mutex<Vec<String>>,
    pub rows: Mutex<Vec<ReportRow>>,
    pub written: Mutex<Option<PathBuf>>,
}

impl AuditReporter for CapturingReporter {
    fn step(&self, step: &str) {
        self.steps.lock().unwrap().push(step.to_string());
    }

    fn unincluded(&self, rows: &[ReportRow]) {
        self.rows.lock().unwrap().extend_from_slice(rows);
    }

    fn report_written(&self, path: &Path) {
        *self.written.lock().unwrap() = Some(path.to_path_buf());
    }
}
