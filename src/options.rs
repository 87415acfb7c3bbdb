//! Typed generator options for microgenerator targets.
//!
//! The generator itself takes a flat bag of `ruby-cloud-*` string options.
//! Synth files declare them as a record instead, which is validated and
//! resolved (defaults filled in) before the generator runs.

use cruet::Inflector;
use indexmap::IndexMap;
use regex::Regex;
use serde::Deserialize;
use std::sync::LazyLock;
use url::Url;

use crate::error::{Error, Result, ValidationIssue};

static GEM_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9][a-z0-9_-]*$").expect("valid gem name regex"));
static ENV_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z][A-Z0-9_]*$").expect("valid env prefix regex"));
static WRAPPED_VERSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^v\d+\w*:\d+(\.\d+)*$").expect("valid wrapped version regex")
});
static DOTTED_VERSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+(\.\d+)*$").expect("valid version regex"));

/// Generator options as declared in a synth file.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct GeneratorOptions {
    /// Defaults to `google-cloud-<service>`
    #[serde(default)]
    pub gem_name: Option<String>,
    pub title: String,
    pub description: String,
    /// Defaults to the service name in SCREAMING_SNAKE_CASE
    #[serde(default)]
    pub env_prefix: Option<String>,
    /// Wrapped versions, e.g. `v1:0.0;v1beta1:0.0`
    #[serde(default)]
    pub wrapper_of: Option<String>,
    #[serde(default)]
    pub product_url: Option<String>,
    #[serde(default)]
    pub api_id: Option<String>,
    #[serde(default)]
    pub migration_version: Option<String>,
    /// Passed through verbatim as `--<key>=<value>`
    #[serde(default)]
    pub extra: IndexMap<String, String>,
}

/// Options after defaults are applied and every field checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedOptions {
    pub gem_name: String,
    pub title: String,
    pub description: String,
    pub env_prefix: String,
    pub wrapper_of: Option<String>,
    pub product_url: Option<Url>,
    pub api_id: Option<String>,
    pub migration_version: Option<String>,
    pub extra: IndexMap<String, String>,
}

impl GeneratorOptions {
    /// Collects every problem with these options without stopping at the first.
    pub fn issues(&self, service: &str) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();
        let mut invalid = |option: &'static str, message: String| {
            issues.push(ValidationIssue::InvalidOption { option, message })
        };

        let gem_name = self.gem_name_or_default(service);
        if !GEM_NAME.is_match(&gem_name) {
            invalid("gem_name", format!("'{gem_name}' is not a valid gem name"));
        }
        if self.title.trim().is_empty() {
            invalid("title", "must not be empty".to_string());
        }
        if self.description.trim().is_empty() {
            invalid("description", "must not be empty".to_string());
        }
        let env_prefix = self.env_prefix_or_default(service);
        if !ENV_PREFIX.is_match(&env_prefix) {
            invalid(
                "env_prefix",
                format!("'{env_prefix}' must be upper case letters, digits and underscores"),
            );
        }
        if let Some(wrapper_of) = &self.wrapper_of {
            for entry in wrapper_of.split(';') {
                if !WRAPPED_VERSION.is_match(entry) {
                    invalid(
                        "wrapper_of",
                        format!("'{entry}' is not of the form <version>:<gem version>"),
                    );
                }
            }
        }
        if let Some(product_url) = &self.product_url {
            match Url::parse(product_url) {
                Ok(url) if url.scheme() == "https" || url.scheme() == "http" => {}
                Ok(url) => invalid(
                    "product_url",
                    format!("unsupported scheme '{}'", url.scheme()),
                ),
                Err(e) => invalid("product_url", e.to_string()),
            }
        }
        if let Some(api_id) = &self.api_id {
            if api_id.trim().is_empty() || api_id.contains(char::is_whitespace) {
                invalid("api_id", format!("'{api_id}' must be a single word"));
            }
        }
        if let Some(migration_version) = &self.migration_version {
            if !DOTTED_VERSION.is_match(migration_version) {
                invalid(
                    "migration_version",
                    format!("'{migration_version}' is not a dotted version"),
                );
            }
        }
        issues
    }

    /// Validates the options and fills in defaults derived from `service`.
    pub fn resolve(&self, service: &str) -> Result<ResolvedOptions> {
        let issues = self.issues(service);
        if !issues.is_empty() {
            return Err(Error::ValidationError { issues });
        }

        Ok(ResolvedOptions {
            gem_name: self.gem_name_or_default(service),
            title: self.title.clone(),
            description: self.description.clone(),
            env_prefix: self.env_prefix_or_default(service),
            wrapper_of: self.wrapper_of.clone(),
            // Already parsed successfully in `issues`.
            product_url: self.product_url.as_deref().and_then(|u| Url::parse(u).ok()),
            api_id: self.api_id.clone(),
            migration_version: self.migration_version.clone(),
            extra: self.extra.clone(),
        })
    }

    fn gem_name_or_default(&self, service: &str) -> String {
        self.gem_name
            .clone()
            .unwrap_or_else(|| format!("google-cloud-{}", service.to_kebab_case()))
    }

    fn env_prefix_or_default(&self, service: &str) -> String {
        self.env_prefix.clone().unwrap_or_else(|| service.to_screaming_snake_case())
    }
}

impl ResolvedOptions {
    /// Flattens the record into the generator's `ruby-cloud-*` option bag.
    pub fn to_generator_args(&self) -> Vec<(String, String)> {
        let mut args = vec![
            ("ruby-cloud-gem-name".to_string(), self.gem_name.clone()),
            ("ruby-cloud-title".to_string(), self.title.clone()),
            ("ruby-cloud-description".to_string(), self.description.clone()),
            ("ruby-cloud-env-prefix".to_string(), self.env_prefix.clone()),
        ];
        if let Some(wrapper_of) = &self.wrapper_of {
            args.push(("ruby-cloud-wrapper-of".to_string(), wrapper_of.clone()));
        }
        if let Some(product_url) = &self.product_url {
            args.push(("ruby-cloud-product-url".to_string(), product_url.to_string()));
        }
        if let Some(api_id) = &self.api_id {
            args.push(("ruby-cloud-api-id".to_string(), api_id.clone()));
        }
        if let Some(migration_version) = &self.migration_version {
            args.push(("ruby-cloud-migration-version".to_string(), migration_version.clone()));
        }
        args.extend(self.extra.iter().map(|(k, v)| (k.clone(), v.clone())));
        args
    }
}
