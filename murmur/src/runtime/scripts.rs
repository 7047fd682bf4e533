use redis::Script;
use std::sync::LazyLock;

pub const ENTITY_INSERT_SCRIPT_BODY: &str = include_str!("../../lua/entity_insert.lua");
pub const SET_MUTATION_SCRIPT_BODY: &str = include_str!("../../lua/set_mutation.lua");

pub static ENTITY_INSERT_SCRIPT: LazyLock<Script> = LazyLock::new(|| Script::new(ENTITY_INSERT_SCRIPT_BODY));
pub static SET_MUTATION_SCRIPT: LazyLock<Script> = LazyLock::new(|| Script::new(SET_MUTATION_SCRIPT_BODY));
