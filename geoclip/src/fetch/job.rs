//! Acquisition jobs and their Overpass tag filters.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::assemble::{Assembler, GeometryFamily};

/// Value side of one tag filter entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TagValue {
    /// `true` requires the key; `false` adds no clause.
    Present(bool),
    /// One `[key="v"]` clause per element, all required.
    All(Vec<String>),
    Text(String),
    Number(serde_json::Number),
}

/// Ordered tag filter, e.g. `{"highway": ["primary"], "name": true}`.
pub type TagFilter = IndexMap<String, TagValue>;

/// One acquisition unit: a tag filter and the layer it feeds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub tag_filter: TagFilter,
    pub layer_name: String,
    pub domain_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geometry_family: Option<GeometryFamily>,
}

impl Job {
    pub fn new(
        tag_filter: TagFilter,
        layer_name: impl Into<String>,
        domain_name: impl Into<String>,
    ) -> Self {
        Self {
            tag_filter,
            layer_name: layer_name.into(),
            domain_name: domain_name.into(),
            geometry_family: None,
        }
    }

    pub fn with_family(mut self, family: GeometryFamily) -> Self {
        self.geometry_family = Some(family);
        self
    }

    /// Declared family, or the one inferred from the filter keys.
    pub fn family(&self) -> GeometryFamily {
        self.geometry_family.unwrap_or_else(|| {
            GeometryFamily::infer_from_keys(self.tag_filter.keys().map(String::as_str))
        })
    }

    /// Overpass filter clauses, concatenated.
    pub fn clauses(&self) -> String {
        let mut out = String::new();
        for (key, value) in &self.tag_filter {
            match value {
                TagValue::Present(true) => out.push_str(&format!("[{}]", key)),
                TagValue::Present(false) => {}
                TagValue::All(values) => {
                    for v in values {
                        out.push_str(&format!("[{}=\"{}\"]", key, escape(v)));
                    }
                }
                TagValue::Text(v) => out.push_str(&format!("[{}=\"{}\"]", key, escape(v))),
                TagValue::Number(n) => out.push_str(&format!("[{}=\"{}\"]", key, n)),
            }
        }
        out
    }

    /// Assembler for this job's elements.
    pub fn assembler(&self) -> Assembler {
        Assembler::new(self.family(), &self.layer_name, &self.domain_name)
    }
}

/// Escapes backslashes and double quotes for an Overpass string literal.
fn escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
