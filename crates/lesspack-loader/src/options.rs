/*
 * options.rs
 * Copyright (c) 2025 Lesspack Contributors
 *
 * Loader configuration. The data-shaped parts deserialize from the
 * host's config format with a fixed schema (unknown keys are rejected);
 * the programmatic parts (implementation instances, computed option
 * bags, additional-data processors) can only be set from code.
 */

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::{self, Deserializer, Unexpected, Visitor};
use serde::Deserialize;

use lesspack_less::{LessImplementation, RenderOptions, SourceMapOptions};

use crate::context::{BuildContext, HostError};

/// Compiler selection: a concrete instance, or a name looked up in the
/// process-wide implementation registry.
#[derive(Clone)]
pub enum ImplementationSpec {
    Instance(Arc<dyn LessImplementation>),
    Name(String),
}

impl fmt::Debug for ImplementationSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Instance(implementation) => {
                f.debug_tuple("Instance").field(&implementation.name()).finish()
            }
            Self::Name(name) => f.debug_tuple("Name").field(name).finish(),
        }
    }
}

impl<'de> Deserialize<'de> for ImplementationSpec {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Self::Name(String::deserialize(deserializer)?))
    }
}

/// The pass-through compiler option bag, fixed or computed per compile
/// from the build context.
#[derive(Clone)]
pub enum LessOptionsSource {
    Bag(RenderOptions),
    Computed(Arc<dyn Fn(&dyn BuildContext) -> RenderOptions + Send + Sync>),
}

impl LessOptionsSource {
    pub fn materialize(&self, ctx: &dyn BuildContext) -> RenderOptions {
        match self {
            Self::Bag(options) => options.clone(),
            Self::Computed(compute) => compute(ctx),
        }
    }
}

impl Default for LessOptionsSource {
    fn default() -> Self {
        Self::Bag(RenderOptions::default())
    }
}

impl fmt::Debug for LessOptionsSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bag(options) => f.debug_tuple("Bag").field(options).finish(),
            Self::Computed(_) => f.write_str("Computed(<fn>)"),
        }
    }
}

impl<'de> Deserialize<'de> for LessOptionsSource {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Self::Bag(RenderOptions::deserialize(deserializer)?))
    }
}

/// Source-map request: plain switch or full options. `Flag(false)`
/// leaves whatever the option bag already says untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum SourceMapSetting {
    Flag(bool),
    Options(SourceMapOptions),
}

/// Rewrites the stylesheet content before compilation.
#[async_trait]
pub trait AdditionalDataProcessor: Send + Sync {
    /// Receives the original content; the returned string replaces it.
    async fn process(&self, content: String, ctx: &dyn BuildContext)
        -> Result<String, HostError>;
}

/// Content injected ahead of compilation: a literal prefix, or a
/// processor whose output replaces the content entirely.
#[derive(Clone)]
pub enum AdditionalData {
    Literal(String),
    Processor(Arc<dyn AdditionalDataProcessor>),
}

impl fmt::Debug for AdditionalData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(data) => f.debug_tuple("Literal").field(data).finish(),
            Self::Processor(_) => f.write_str("Processor(<fn>)"),
        }
    }
}

impl<'de> Deserialize<'de> for AdditionalData {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Self::Literal(String::deserialize(deserializer)?))
    }
}

/// Whether the bundler resolver participates in import resolution.
///
/// `Only` disables the native filesystem fallback entirely; `Disabled`
/// leaves resolution to the compiler's native manager alone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BundlerImporter {
    #[default]
    Enabled,
    Disabled,
    Only,
}

impl<'de> Deserialize<'de> for BundlerImporter {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct ImporterVisitor;

        impl Visitor<'_> for ImporterVisitor {
            type Value = BundlerImporter;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("true, false, or the string \"only\"")
            }

            fn visit_bool<E>(self, value: bool) -> Result<Self::Value, E> {
                Ok(if value {
                    BundlerImporter::Enabled
                } else {
                    BundlerImporter::Disabled
                })
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                if value == "only" {
                    Ok(BundlerImporter::Only)
                } else {
                    Err(E::invalid_value(Unexpected::Str(value), &self))
                }
            }
        }

        deserializer.deserialize_any(ImporterVisitor)
    }
}

/// Everything the loader accepts for one compilation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct LoaderOptions {
    /// Compiler override; the bundled implementation when unset.
    pub implementation: Option<ImplementationSpec>,

    /// Option bag forwarded to the compiler.
    pub less_options: LessOptionsSource,

    /// Source-map request; falls back to the host's setting when unset.
    pub source_map: Option<SourceMapSetting>,

    /// Content prepended to (or replacing) the stylesheet text.
    pub additional_data: Option<AdditionalData>,

    /// Bundler resolver participation.
    pub bundler_importer: BundlerImporter,
}
