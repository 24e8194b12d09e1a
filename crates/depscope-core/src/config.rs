use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::scope::{default_scope_mapping, Scope, ScopeMapping};

/// Settings handed to the metadata resolver along with each request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolutionParameters {
    /// Mapping applied to module dependencies declared with plain scopes.
    pub default_mapping: Option<ScopeMapping>,
    /// Ask the metadata resolver to bypass whatever it cached.
    pub refreshed: bool,
}

impl ResolutionParameters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parameters using [`default_scope_mapping`].
    pub fn standard() -> Self {
        Self::new().with_default_mapping(default_scope_mapping())
    }

    pub fn with_default_mapping(mut self, mapping: ScopeMapping) -> Self {
        self.default_mapping = Some(mapping);
        self
    }

    pub fn with_refreshed(mut self, refreshed: bool) -> Self {
        self.refreshed = refreshed;
        self
    }
}

/// `[parameters]` section of a declaration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParametersConfig {
    #[serde(default)]
    pub refreshed: bool,

    #[serde(default, rename = "default-mapping")]
    pub default_mapping: Option<MappingConfig>,
}

/// A scope mapping written either as a preset name or as a table of
/// `scope = ["configuration", ...]` entries.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MappingConfig {
    Preset(String),
    Table(BTreeMap<String, Vec<String>>),
}

impl MappingConfig {
    /// Build the mapping, looking scope names up with `scope_of`.
    pub fn to_mapping<F>(&self, scope_of: F) -> miette::Result<ScopeMapping>
    where
        F: Fn(&str) -> miette::Result<Scope>,
    {
        match self {
            MappingConfig::Preset(name) if name == "standard" => Ok(default_scope_mapping()),
            MappingConfig::Preset(name) => Err(depscope_util::errors::DepscopeError::Declaration {
                message: format!("Unknown scope mapping preset '{name}' (expected 'standard')"),
            }
            .into()),
            MappingConfig::Table(entries) => {
                let mut mapping = ScopeMapping::empty();
                for (source, targets) in entries {
                    let scope = scope_of(source)?;
                    let targets: Vec<&str> = targets.iter().map(String::as_str).collect();
                    let items = ScopeMapping::of_many(&[&scope], &targets);
                    mapping = mapping.and_mapping(&items);
                }
                Ok(mapping)
            }
        }
    }
}

impl ParametersConfig {
    pub fn to_parameters<F>(&self, scope_of: F) -> miette::Result<ResolutionParameters>
    where
        F: Fn(&str) -> miette::Result<Scope>,
    {
        let default_mapping = match self.default_mapping {
            Some(ref config) => Some(config.to_mapping(scope_of)?),
            None => None,
        };
        Ok(ResolutionParameters {
            default_mapping,
            refreshed: self.refreshed,
        })
    }
}
