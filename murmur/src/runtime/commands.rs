use serde::Serialize;
use serde_json::Value;

use crate::{
    errors::RepoError,
    keys::KeyContext,
    types::{EntityDescriptor, SetOperation, field_values},
};

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationCommand {
    InsertEntity(EntityInsert),
    MutateSet(SetMutation),
}

/// Insert command, executed in a single Lua script so unique claims, reference
/// checks and the sequence assignment cannot interleave with other writers.
#[derive(Debug, Serialize)]
pub struct EntityInsert {
    pub key: String,
    pub entity_id: String,
    pub payload_json: String,
    pub sequence_key: String,
    pub order_key: String,
    pub unique: Vec<UniqueClaim>,
    pub references: Vec<ReferenceCheck>,
    /// Reverse lookup sets the new id joins.
    pub reverse_keys: Vec<String>,
}

/// A unique value to claim for the inserted entity.
#[derive(Debug, Clone, Serialize)]
pub struct UniqueClaim {
    pub key: String,
    pub field: String,
    pub value: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReferenceCheck {
    pub key: String,
    pub field: String,
    pub entity_id: String,
}

/// Membership change on one array field of one document.
#[derive(Debug, Serialize)]
pub struct SetMutation {
    pub key: String,
    pub entity_id: String,
    pub field: String,
    pub operation: SetOperation,
    /// Prefix of the reverse lookup sets to keep in step, when the field is indexed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reverse_prefix: Option<String>,
}

pub fn build_entity_insert(
    keys: &KeyContext<'_>,
    descriptor: &EntityDescriptor,
    entity_id: &str,
    payload: &Value,
) -> Result<EntityInsert, RepoError> {
    let payload_json = serde_json::to_string(payload)
        .map_err(|err| RepoError::other(format!("failed to serialize payload: {err}")))?;

    let mut unique = Vec::with_capacity(descriptor.unique.len());
    for constraint in descriptor.unique {
        let value = payload
            .get(constraint.field)
            .and_then(Value::as_str)
            .ok_or_else(|| RepoError::InvalidRequest {
                message: format!("unique field '{}' must be a string", constraint.field),
            })?;
        let normalized = constraint.normalize(value);
        unique.push(UniqueClaim {
            key: keys.unique(descriptor.collection, constraint.field, &normalized),
            field: constraint.field.to_string(),
            value: value.to_string(),
        });
    }

    let mut references = Vec::with_capacity(descriptor.references.len());
    for reference in descriptor.references {
        for target_id in field_values(payload, reference.field) {
            references.push(ReferenceCheck {
                key: keys.entity(reference.target, &target_id),
                field: reference.field.to_string(),
                entity_id: target_id,
            });
        }
    }

    let reverse_keys = descriptor
        .indexed
        .iter()
        .flat_map(|field| {
            field_values(payload, field)
                .into_iter()
                .map(move |value| keys.reverse_relation(descriptor.collection, field, &value))
        })
        .collect();

    Ok(EntityInsert {
        key: keys.entity(descriptor.collection, entity_id),
        entity_id: entity_id.to_string(),
        payload_json,
        sequence_key: keys.sequence(descriptor.collection),
        order_key: keys.order(descriptor.collection),
        unique,
        references,
        reverse_keys,
    })
}

pub fn build_set_mutation(
    keys: &KeyContext<'_>,
    descriptor: &EntityDescriptor,
    entity_id: &str,
    field: &str,
    operation: SetOperation,
) -> Result<SetMutation, RepoError> {
    if !descriptor.is_set_field(field) {
        return Err(RepoError::InvalidRequest {
            message: format!("'{field}' is not a set field of {}", descriptor.collection),
        });
    }

    let reverse_prefix = descriptor
        .is_indexed(field)
        .then(|| keys.reverse_relation(descriptor.collection, field, ""));

    Ok(SetMutation {
        key: keys.entity(descriptor.collection, entity_id),
        entity_id: entity_id.to_string(),
        field: field.to_string(),
        operation,
        reverse_prefix,
    })
}
