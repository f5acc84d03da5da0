//! Translation of notification entity types into queryable schema ids.
//!
//! Update notifications carry lower-case, aliased type names: every typed
//! context (tasks, milestones, shots, ...) arrives as `task` and is told
//! apart only by its `objectTypeId`. The schema list maps these back.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SyncError};

/// One entry of the PM system's schema list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySchema {
    pub id: String,
    #[serde(default)]
    pub alias_for: Option<AliasFor>,
}

/// What a schema is an alias of.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AliasFor {
    Classified {
        id: String,
        #[serde(default)]
        classifiers: Classifiers,
    },
    Named(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Classifiers {
    #[serde(default)]
    pub object_typeid: Option<String>,
}

impl EntitySchema {
    pub fn plain(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            alias_for: None,
        }
    }

    pub fn classified(
        id: impl Into<String>,
        alias_id: impl Into<String>,
        object_typeid: Option<&str>,
    ) -> Self {
        Self {
            id: id.into(),
            alias_for: Some(AliasFor::Classified {
                id: alias_id.into(),
                classifiers: Classifiers {
                    object_typeid: object_typeid.map(str::to_string),
                },
            }),
        }
    }

    pub fn named_alias(id: impl Into<String>, alias: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            alias_for: Some(AliasFor::Named(alias.into())),
        }
    }
}

/// Resolve a notification type to a schema id.
///
/// Passes, first hit wins: classified alias whose id and object type match,
/// plain-string alias, then the schema id itself. All name comparisons are
/// case-insensitive.
pub fn resolve_schema_id(
    schemas: &[EntitySchema],
    entity_type: &str,
    object_type_id: Option<&str>,
) -> Result<String> {
    let wanted = entity_type.to_lowercase();

    let classified = schemas.iter().find(|schema| match &schema.alias_for {
        Some(AliasFor::Classified { id, classifiers }) => {
            id.to_lowercase() == wanted && classifiers.object_typeid.as_deref() == object_type_id
        }
        _ => false,
    });
    if let Some(schema) = classified {
        return Ok(schema.id.clone());
    }

    let named = schemas.iter().find(|schema| match &schema.alias_for {
        Some(AliasFor::Named(alias)) => alias.to_lowercase() == wanted,
        _ => false,
    });
    if let Some(schema) = named {
        return Ok(schema.id.clone());
    }

    schemas
        .iter()
        .find(|schema| schema.id.to_lowercase() == wanted)
        .map(|schema| schema.id.clone())
        .ok_or_else(|| SyncError::UnresolvableType {
            entity_type: entity_type.to_string(),
        })
}
