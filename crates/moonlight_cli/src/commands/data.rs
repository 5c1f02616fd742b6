//! Record commands. Each opens the collection, runs one engine call and
//! prints the result as JSON.

use super::{parse_json, parse_value, pretty, Context};
use crate::error::{CliError, CliResult};
use moonlight_core::{RecordId, Store, SYSTEM_AUTHOR};

fn open(ctx: &Context, db: &str) -> CliResult<Store> {
    ctx.open(db, SYSTEM_AUTHOR)
}

/// `push <db> <json>`: prints the new id.
pub fn push(ctx: &Context, db: &str, record: &str) -> CliResult<String> {
    let record = parse_json("record", record)?;
    Ok(open(ctx, db)?.push(record)?.to_string())
}

/// `all <db>`
pub fn all(ctx: &Context, db: &str) -> CliResult<String> {
    pretty(&open(ctx, db)?.all()?)
}

/// `get <db> <json>`
pub fn get(ctx: &Context, db: &str, query: &str) -> CliResult<String> {
    let query = parse_json("query", query)?;
    pretty(&open(ctx, db)?.get(&query)?)
}

/// `update <db> <json>`: prints the id.
pub fn update(ctx: &Context, db: &str, patch: &str) -> CliResult<String> {
    let patch = parse_json("patch", patch)?;
    Ok(open(ctx, db)?.update(patch)?.to_string())
}

/// `delete <db> <id>`: prints the removed record.
pub fn delete(ctx: &Context, db: &str, id: &str) -> CliResult<String> {
    let id: RecordId = id
        .parse()
        .map_err(|_| CliError::InvalidArgument(format!("`{id}` is not a record id")))?;
    pretty(&open(ctx, db)?.delete(id)?)
}

/// `drop <db>`
pub fn drop_collection(ctx: &Context, db: &str) -> CliResult<String> {
    let store = open(ctx, db)?;
    store.drop_collection()?;
    Ok(format!("collection `{}` dropped", store.name()))
}

/// `count <db> <key> <value>`
pub fn count(ctx: &Context, db: &str, key: &str, value: &str) -> CliResult<String> {
    Ok(open(ctx, db)?.count(key, parse_value(value))?.to_string())
}

/// `contains <db> <key> <value>`
pub fn contains(ctx: &Context, db: &str, key: &str, value: &str) -> CliResult<String> {
    Ok(open(ctx, db)?.contains(key, parse_value(value))?.to_string())
}

/// `length <db>`
pub fn length(ctx: &Context, db: &str) -> CliResult<String> {
    Ok(open(ctx, db)?.length()?.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use tempfile::tempdir;

    fn as_records(raw: &str) -> Vec<Value> {
        match serde_json::from_str(raw).unwrap() {
            Value::Array(items) => items,
            other => vec![other],
        }
    }

    #[test]
    fn record_commands() {
        let temp = tempdir().unwrap();
        let ctx = Context::new(temp.path());

        let id = push(&ctx, "users", r#"{"name": "Ann", "age": 30}"#).unwrap();
        push(&ctx, "users", r#"{"name": "Bob", "age": 30}"#).unwrap();
        assert_eq!(id.len(), 14);

        assert_eq!(length(&ctx, "users").unwrap(), "2");
        assert_eq!(count(&ctx, "users", "age", "30").unwrap(), "2");
        assert_eq!(contains(&ctx, "users", "name", "Ann").unwrap(), "true");
        assert_eq!(contains(&ctx, "users", "name", "Eve").unwrap(), "false");

        let found = as_records(&get(&ctx, "users", r#"{"name": "Ann"}"#).unwrap());
        assert_eq!(found, vec![json!({"id": id.parse::<i64>().unwrap(), "name": "Ann", "age": 30})]);

        let patch = format!(r#"{{"id": {id}, "age": 31}}"#);
        assert_eq!(update(&ctx, "users", &patch).unwrap(), id);

        let removed = as_records(&delete(&ctx, "users", &id).unwrap());
        assert_eq!(removed[0]["age"], 31);
        assert_eq!(as_records(&all(&ctx, "users").unwrap()).len(), 1);

        drop_collection(&ctx, "users").unwrap();
        assert_eq!(length(&ctx, "users").unwrap(), "0");
    }

    #[test]
    fn rejects_bad_arguments() {
        let temp = tempdir().unwrap();
        let ctx = Context::new(temp.path());

        assert!(matches!(
            push(&ctx, "users", "{oops"),
            Err(CliError::InvalidJson { what: "record", .. })
        ));
        assert!(matches!(
            delete(&ctx, "users", "abc"),
            Err(CliError::InvalidArgument(_))
        ));
        assert!(matches!(push(&ctx, "users", "{}"), Err(CliError::Core(_))));
    }
}
