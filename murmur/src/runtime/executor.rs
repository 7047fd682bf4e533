use redis::aio::ConnectionLike;
use serde_json::Value;

use crate::{
    errors::RepoError,
    runtime::{
        commands::MutationCommand,
        scripts::{ENTITY_INSERT_SCRIPT, SET_MUTATION_SCRIPT},
    },
};

/// Run one mutation script and return the document it reports.
///
/// `Ok(None)` means the script found no document to mutate.
pub async fn execute_command<C>(conn: &mut C, command: &MutationCommand) -> Result<Option<Value>, RepoError>
where
    C: ConnectionLike + Send,
{
    let (script, payload) = match command {
        MutationCommand::InsertEntity(insert) => (&*ENTITY_INSERT_SCRIPT, serde_json::to_string(insert)),
        MutationCommand::MutateSet(mutation) => (&*SET_MUTATION_SCRIPT, serde_json::to_string(mutation)),
    };
    let payload = payload.map_err(|err| RepoError::other(format!("failed to serialize command: {err}")))?;

    let mut invocation = script.prepare_invoke();
    invocation.arg(payload);
    let raw: String = invocation.invoke_async(conn).await.map_err(RepoError::from)?;

    let value: Value =
        serde_json::from_str(&raw).map_err(|err| RepoError::other(format!("failed to parse lua response: {err}")))?;

    if let Some(error) = value.get("error") {
        return match error.as_str() {
            Some("entity_not_found") => Ok(None),
            Some(code) => Err(script_error(code, &value)),
            None => Err(RepoError::other("lua_error")),
        };
    }

    // JSON.GET with a `$` path wraps the document in a one-element array.
    match value.get("document").and_then(|doc| doc.get(0)) {
        Some(document) => Ok(Some(document.clone())),
        None => Err(RepoError::other("lua response is missing the document")),
    }
}

fn string_field(value: &Value, field: &str) -> String {
    match value.get(field) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

fn script_error(code: &str, value: &Value) -> RepoError {
    match code {
        "unique_constraint_violation" => RepoError::UniqueConstraintViolation {
            field: string_field(value, "field"),
            value: string_field(value, "value"),
            existing_entity_id: string_field(value, "existing_entity_id"),
        },
        "reference_not_found" => RepoError::ReferenceNotFound {
            field: string_field(value, "field"),
            entity_id: string_field(value, "entity_id"),
        },
        "entity_exists" => RepoError::InvalidRequest {
            message: format!("entity '{}' already exists", string_field(value, "entity_id")),
        },
        other => RepoError::other(other.to_string()),
    }
}
