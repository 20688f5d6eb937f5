//! WAAPI calls — procedure URIs, the object query builder and the call seams

use std::future::Future;

use serde_json::{json, Map, Value};

use crate::error::WaapiResult;

/// WAAPI procedure URIs
pub mod uri {
    /// Object query with `from` / `transform` and `options.return`
    pub const OBJECT_GET: &str = "ak.wwise.core.object.get";

    /// Direct inclusion list of one SoundBank
    pub const SOUNDBANK_GET_INCLUSIONS: &str = "ak.wwise.core.soundbank.getInclusions";

    /// Authoring tool version and install directories
    pub const GET_INFO: &str = "ak.wwise.core.getInfo";
}

/// Wwise object type names used in queries
pub mod object_type {
    pub const PROJECT: &str = "Project";
    pub const EVENT: &str = "Event";
    pub const SOUND_BANK: &str = "SoundBank";
}

/// Anything that can issue a WAAPI request and hand back the keyword-argument result
pub trait WaapiCall {
    /// Call `uri` with `args` (a JSON object) and WAAPI `options` (a JSON object)
    fn call(
        &self,
        uri: &str,
        args: Value,
        options: Value,
    ) -> impl Future<Output = WaapiResult<Value>> + Send;
}

/// An open WAAPI session that must be released once the caller is done with it
pub trait WaapiSession: WaapiCall {
    /// Leave the session and close the underlying connection
    fn close(self) -> impl Future<Output = WaapiResult<()>> + Send;
}

/// Where an object query starts
#[derive(Debug, Clone, PartialEq)]
enum QuerySource {
    /// Every object of the given types
    OfType(Vec<String>),
    /// The objects with the given ids (GUIDs) or paths
    Id(Vec<String>),
}

/// One step of an object query's transform pipeline
#[derive(Debug, Clone, PartialEq)]
enum QueryTransform {
    /// Replace the current set by all descendants (the objects themselves excluded)
    SelectDescendants,
    /// Keep only objects whose type is in the list
    WhereTypeIsIn(Vec<String>),
}

impl QueryTransform {
    fn to_value(&self) -> Value {
        match self {
            Self::SelectDescendants => json!({ "select": ["descendants"] }),
            Self::WhereTypeIsIn(types) => json!({ "where": ["type:isIn", types] }),
        }
    }
}

/// Builder for `ak.wwise.core.object.get`
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectQuery {
    source: QuerySource,
    transform: Vec<QueryTransform>,
    returns: Vec<String>,
}

impl ObjectQuery {
    /// Query every object of the given types
    pub fn of_type(types: &[&str]) -> Self {
        Self::new(QuerySource::OfType(types.iter().map(|t| t.to_string()).collect()))
    }

    /// Query starting from explicit object ids
    pub fn from_ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(QuerySource::Id(ids.into_iter().map(Into::into).collect()))
    }

    fn new(source: QuerySource) -> Self {
        Self {
            source,
            transform: Vec::new(),
            returns: vec!["name".to_string()],
        }
    }

    /// Append a descendants selection
    pub fn select_descendants(mut self) -> Self {
        self.transform.push(QueryTransform::SelectDescendants);
        self
    }

    /// Append a type filter
    pub fn where_type_is_in(mut self, types: &[&str]) -> Self {
        self.transform
            .push(QueryTransform::WhereTypeIsIn(types.iter().map(|t| t.to_string()).collect()));
        self
    }

    /// Set the returned fields (defaults to `name`)
    pub fn returning(mut self, fields: &[&str]) -> Self {
        self.returns = fields.iter().map(|f| f.to_string()).collect();
        self
    }

    /// WAAPI arguments object
    pub fn args(&self) -> Value {
        let from = match &self.source {
            QuerySource::OfType(types) => json!({ "ofType": types }),
            QuerySource::Id(ids) => json!({ "id": ids }),
        };

        let mut args = Map::new();
        args.insert("from".to_string(), from);
        if !self.transform.is_empty() {
            let steps = self.transform.iter().map(QueryTransform::to_value).collect();
            args.insert("transform".to_string(), Value::Array(steps));
        }
        Value::Object(args)
    }

    /// WAAPI options object
    pub fn options(&self) -> Value {
        json!({ "return": self.returns })
    }
}

/// Arguments for `ak.wwise.core.soundbank.getInclusions`
pub fn soundbank_inclusions_args(bank_name: &str) -> Value {
    json!({ "soundbank": format!("SoundBank:{}", bank_name) })
}
