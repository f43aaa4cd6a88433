use rusqlite::{params, Connection};

// ── Documents ──

pub fn insert_document(
    conn: &Connection,
    collection: &str,
    id: &str,
    data: &serde_json::Value,
) -> anyhow::Result<()> {
    let data_json = serde_json::to_string(data)?;
    conn.execute(
        "INSERT INTO documents (id, collection, data) VALUES (?1, ?2, ?3)",
        params![id, collection, data_json],
    )?;
    Ok(())
}

pub fn list_documents(conn: &Connection, collection: &str) -> anyhow::Result<Vec<serde_json::Value>> {
    let mut stmt = conn.prepare(
        "SELECT data FROM documents WHERE collection = ?1 ORDER BY created_at ASC, rowid ASC",
    )?;

    let rows = stmt.query_map(params![collection], |row| row.get::<_, String>(0))?;

    let mut documents = vec![];
    for row in rows {
        documents.push(serde_json::from_str(&row?)?);
    }
    Ok(documents)
}

pub fn count_documents(conn: &Connection, collection: &str) -> anyhow::Result<i64> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM documents WHERE collection = ?1",
        params![collection],
        |row| row.get(0),
    )?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use serde_json::json;

    #[test]
    fn test_insert_and_list_by_collection() {
        let conn = db::init_db(":memory:").unwrap();
        insert_document(&conn, "a/1", "d1", &json!({"n": 1})).unwrap();
        insert_document(&conn, "a/1", "d2", &json!({"n": 2})).unwrap();
        insert_document(&conn, "a/2", "d3", &json!({"n": 3})).unwrap();

        let docs = list_documents(&conn, "a/1").unwrap();
        assert_eq!(docs, vec![json!({"n": 1}), json!({"n": 2})]);
        assert_eq!(count_documents(&conn, "a/2").unwrap(), 1);
        assert_eq!(count_documents(&conn, "missing").unwrap(), 0);
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let conn = db::init_db(":memory:").unwrap();
        insert_document(&conn, "a", "same", &json!({})).unwrap();
        assert!(insert_document(&conn, "a", "same", &json!({})).is_err());
    }
}
