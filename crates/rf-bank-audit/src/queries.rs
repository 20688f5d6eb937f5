//! Project queries — typed WAAPI reads with one response shape per method
//!
//! Every query decodes its raw keyword result into a dedicated `serde` type. A
//! response that does not fit the type fails the whole call; nothing is dropped
//! silently.

use std::collections::{BTreeSet, HashSet};
use std::path::PathBuf;

use rf_waapi::{object_type, soundbank_inclusions_args, uri, ObjectQuery, WaapiCall};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::{AuditError, AuditResult, QueryCall, QueryFailure};
use crate::model::{EventCatalog, InclusionEntry, ObjectRef};

/// `ak.wwise.core.object.get` result
#[derive(Debug, Deserialize)]
struct ObjectGetResponse<T> {
    #[serde(rename = "return")]
    objects: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct ProjectRecord {
    #[allow(dead_code)]
    name: String,
    #[serde(rename = "filePath")]
    file_path: String,
}

#[derive(Debug, Deserialize)]
struct EventRecord {
    name: String,
    path: String,
}

#[derive(Debug, Deserialize)]
struct NamedRecord {
    name: String,
}

/// `ak.wwise.core.soundbank.getInclusions` result
#[derive(Debug, Deserialize)]
struct InclusionsResponse {
    inclusions: Vec<InclusionEntry>,
}

/// `ak.wwise.core.getInfo` result, reduced to what the installer needs
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WwiseInfo {
    pub version: WwiseVersion,
    pub directories: WwiseDirectories,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WwiseVersion {
    #[serde(rename = "displayName")]
    pub display_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WwiseDirectories {
    /// Authoring tool install directory
    pub authoring: PathBuf,
}

fn decode<T: DeserializeOwned>(call: &QueryCall, value: Value) -> AuditResult<T> {
    serde_json::from_value(value)
        .map_err(|e| AuditError::query(call.clone(), QueryFailure::Malformed(e.to_string())))
}

/// Typed read access to the open project
pub struct ProjectQueries<'a, C> {
    client: &'a C,
}

impl<C> Clone for ProjectQueries<'_, C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C> Copy for ProjectQueries<'_, C> {}

impl<'a, C: WaapiCall> ProjectQueries<'a, C> {
    pub fn new(client: &'a C) -> Self {
        Self { client }
    }

    async fn call(
        &self,
        call: &QueryCall,
        uri: &str,
        args: Value,
        options: Value,
    ) -> AuditResult<Value> {
        self.client
            .call(uri, args, options)
            .await
            .map_err(|e| AuditError::from_waapi(call.clone(), e))
    }

    async fn object_get<T: DeserializeOwned>(
        &self,
        call: &QueryCall,
        query: &ObjectQuery,
    ) -> AuditResult<Vec<T>> {
        let value = self.call(call, uri::OBJECT_GET, query.args(), query.options()).await?;
        let response: ObjectGetResponse<T> = decode(call, value)?;
        Ok(response.objects)
    }

    /// File path of the single open project
    pub async fn project_path(&self) -> AuditResult<PathBuf> {
        let call = QueryCall::ProjectPath;
        let query = ObjectQuery::of_type(&[object_type::PROJECT]).returning(&["name", "filePath"]);

        let mut projects: Vec<ProjectRecord> = self.object_get(&call, &query).await?;
        if projects.len() != 1 {
            return Err(AuditError::query(call, QueryFailure::ProjectCount(projects.len())));
        }
        let project = projects.remove(0);
        Ok(PathBuf::from(project.file_path))
    }

    /// All events, name → path, in WAAPI order
    pub async fn event_catalog(&self) -> AuditResult<EventCatalog> {
        let call = QueryCall::EventCatalog;
        let query = ObjectQuery::of_type(&[object_type::EVENT]).returning(&["name", "path"]);

        let events: Vec<EventRecord> = self.object_get(&call, &query).await?;
        let mut catalog = EventCatalog::new();
        for event in events {
            catalog
                .insert(event.name, event.path)
                .map_err(|failure| AuditError::query(call.clone(), failure))?;
        }
        Ok(catalog)
    }

    /// Names of all SoundBanks
    pub async fn bank_names(&self) -> AuditResult<BTreeSet<String>> {
        let call = QueryCall::BankNames;
        let query = ObjectQuery::of_type(&[object_type::SOUND_BANK]).returning(&["name"]);

        let banks: Vec<NamedRecord> = self.object_get(&call, &query).await?;
        Ok(banks.into_iter().map(|bank| bank.name).collect())
    }

    /// Objects directly included by one SoundBank, filters dropped
    pub async fn bank_inclusions(&self, bank_name: &str) -> AuditResult<Vec<ObjectRef>> {
        let call = QueryCall::BankInclusions(bank_name.to_string());
        let value = self
            .call(
                &call,
                uri::SOUNDBANK_GET_INCLUSIONS,
                soundbank_inclusions_args(bank_name),
                json!({}),
            )
            .await?;

        let response: InclusionsResponse = decode(&call, value)?;
        Ok(response.inclusions.into_iter().map(|entry| entry.object).collect())
    }

    /// Names of the objects an arbitrary query returns
    pub async fn names(&self, call: QueryCall, query: &ObjectQuery) -> AuditResult<HashSet<String>> {
        let objects: Vec<NamedRecord> = self.object_get(&call, query).await?;
        Ok(objects.into_iter().map(|object| object.name).collect())
    }

    /// Authoring tool version and directories
    pub async fn wwise_info(&self) -> AuditResult<WwiseInfo> {
        let call = QueryCall::WwiseInfo;
        let value = self.call(&call, uri::GET_INFO, json!({}), json!({})).await?;
        decode(&call, value)
    }
}
