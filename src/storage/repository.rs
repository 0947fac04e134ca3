use rusqlite::{params, params_from_iter, Connection, OptionalExtension};

// ── Documents ──────────────────────────────────────────────────────

pub fn insert_document(
    conn: &Connection,
    collection: &str,
    body: &str,
) -> Result<i64, rusqlite::Error> {
    conn.execute(
        "INSERT INTO documents (collection, body, created_at)
         VALUES (?1, ?2, datetime('now'))",
        params![collection, body],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Find the first document in `collection` whose fields equal every field of
/// `query` (a JSON object). `newest_first` flips the scan order.
///
/// Each query field must agree on both `json_type` and `json_extract`, so
/// `true` never matches `1` and `"1"` never matches `1`. Nested values
/// compare by their JSON text.
pub fn find_document(
    conn: &Connection,
    collection: &str,
    query: &serde_json::Map<String, serde_json::Value>,
    newest_first: bool,
) -> Result<Option<String>, rusqlite::Error> {
    let mut sql = String::from("SELECT body FROM documents WHERE collection = ?1");
    let mut args: Vec<String> = vec![collection.to_string()];
    // ?2 is only bound when some clause refers to it.
    if !query.is_empty() {
        args.push(serde_json::Value::Object(query.clone()).to_string());
    }
    for key in query.keys() {
        args.push(json_path(key));
        let n = args.len();
        sql.push_str(&format!(
            " AND json_type(body, ?{n}) IS json_type(?2, ?{n}) \
             AND json_extract(body, ?{n}) IS json_extract(?2, ?{n})"
        ));
    }
    sql.push_str(if newest_first {
        " ORDER BY id DESC LIMIT 1"
    } else {
        " ORDER BY id ASC LIMIT 1"
    });

    conn.query_row(&sql, params_from_iter(args.iter()), |row| row.get(0))
        .optional()
}

pub fn count_documents(conn: &Connection, collection: &str) -> Result<i64, rusqlite::Error> {
    conn.query_row(
        "SELECT COUNT(*) FROM documents WHERE collection = ?1",
        params![collection],
        |row| row.get(0),
    )
}

/// Quote a top-level key as a JSON path so dots and spaces in field names
/// are not treated as path separators.
fn json_path(key: &str) -> String {
    format!("$.\"{}\"", key.replace('\\', "\\\\").replace('"', "\\\""))
}

// ── App Config ─────────────────────────────────────────────────────

pub fn get_config(conn: &Connection, key: &str) -> Result<Option<String>, rusqlite::Error> {
    conn.query_row(
        "SELECT value FROM app_config WHERE key = ?1",
        params![key],
        |row| row.get(0),
    )
    .optional()
}

pub fn set_config(conn: &Connection, key: &str, value: &str) -> Result<(), rusqlite::Error> {
    conn.execute(
        "INSERT OR REPLACE INTO app_config (key, value, updated_at)
         VALUES (?1, ?2, datetime('now'))",
        params![key, value],
    )?;
    Ok(())
}

pub fn list_config(conn: &Connection) -> Result<Vec<(String, String)>, rusqlite::Error> {
    let mut stmt = conn.prepare("SELECT key, value FROM app_config ORDER BY key")?;
    let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
    rows.collect()
}
