//! Field dispatch and recursive materialization
//!
//! Object fields and array items fan out concurrently; assembly preserves
//! definition order for objects and input order for arrays. Field-level
//! failures collapse to `Null` so the output shape stays well-formed.

use futures::future::{BoxFuture, join_all};
use tracing::warn;

use super::Engine;
use crate::config::{ArrayConfig, BaseField, FieldConfig, GeneratedConfig, ModelConfig, ObjectConfig};
use crate::expression;
use crate::parse::Document;
use crate::value::Jsonable;

pub(crate) fn model<'a>(
    engine: &'a Engine,
    document: &'a Document,
    config: &'a ModelConfig,
    index: Option<u32>,
    depth: usize,
) -> BoxFuture<'a, Jsonable> {
    Box::pin(async move {
        match config {
            ModelConfig::Object(object_config) => {
                object(engine, document, object_config, index, depth).await
            }
            ModelConfig::Array(array_config) => {
                array(engine, document, array_config, depth).await
            }
        }
    })
}

async fn object(
    engine: &Engine,
    document: &Document,
    config: &ObjectConfig,
    index: Option<u32>,
    depth: usize,
) -> Jsonable {
    let scope = document.scoped(&config.path);

    // Singleton field: the object is emitted as a bare value.
    if let Some(base) = &config.field {
        return base_field(engine, &scope, base, index, depth).await;
    }

    let scope = &scope;
    let resolved = join_all(config.fields.iter().map(|(name, field_config)| async move {
        (
            name.clone(),
            field(engine, scope, field_config, index, depth).await,
        )
    }))
    .await;
    Jsonable::Object(resolved.into_iter().collect())
}

async fn array(engine: &Engine, document: &Document, config: &ArrayConfig, depth: usize) -> Jsonable {
    let scopes = document.items(&config.root_path);
    let items = join_all(scopes.iter().enumerate().map(|(position, scope)| {
        let item_index = u32::try_from(position).unwrap_or(u32::MAX);
        object(engine, scope, &config.item, Some(item_index), depth)
    }))
    .await;
    Jsonable::Array(items)
}

fn field<'a>(
    engine: &'a Engine,
    document: &'a Document,
    config: &'a FieldConfig,
    index: Option<u32>,
    depth: usize,
) -> BoxFuture<'a, Jsonable> {
    Box::pin(async move {
        match config {
            FieldConfig::Base(base) => base_field(engine, document, base, index, depth).await,
            FieldConfig::Object(object_config) => {
                object(engine, document, object_config, index, depth).await
            }
            FieldConfig::Array(array_config) => {
                array(engine, document, array_config, depth).await
            }
            FieldConfig::FirstOf(alternatives) => {
                for alternative in alternatives {
                    let value = field(engine, document, alternative, index, depth).await;
                    if !value.is_empty() {
                        return value;
                    }
                }
                Jsonable::Null
            }
        }
    })
}

async fn base_field(
    engine: &Engine,
    document: &Document,
    config: &BaseField,
    index: Option<u32>,
    depth: usize,
) -> Jsonable {
    if let Some(generated_config) = &config.generated {
        // The path result does not become the output; it only feeds the
        // computation as its parent value.
        let current = document.scalar(&config.path).map(Jsonable::String);
        return generated(engine, current.as_ref(), generated_config, index, depth).await;
    }

    match document.scalar(&config.path) {
        Some(text) => Jsonable::coerce(&text, config.field_type),
        None => Jsonable::Null,
    }
}

async fn generated(
    engine: &Engine,
    parent: Option<&Jsonable>,
    config: &GeneratedConfig,
    index: Option<u32>,
    depth: usize,
) -> Jsonable {
    match config {
        GeneratedConfig::Static { field_type, value } => Jsonable::coerce(value, *field_type),
        GeneratedConfig::Formatted { template } => {
            Jsonable::String(expression::format(template, parent, index, None))
        }
        GeneratedConfig::Model { connector, model } => {
            match engine
                .get_at(connector.as_ref(), model.as_ref(), parent, index, depth + 1)
                .await
            {
                Ok(value) => value,
                Err(e) => {
                    warn!(error = %e, "sub-model extraction failed");
                    Jsonable::Null
                }
            }
        }
        GeneratedConfig::Calculated { expression: source } => {
            match expression::evaluate(source, parent, index, None) {
                Ok(value) => value,
                Err(e) => {
                    warn!(error = %e, "calculated field failed");
                    Jsonable::Null
                }
            }
        }
        GeneratedConfig::Plugin {
            name,
            config: plugin_config,
        } => match engine.runtime().plugins.formatter(name) {
            Some(plugin) => plugin.format(parent, plugin_config, index),
            None => {
                warn!(name = %name, "formatter plugin not registered");
                Jsonable::Null
            }
        },
    }
}
