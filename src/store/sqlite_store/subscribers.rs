use super::*;
use crate::store::SubscriberStore;
use rusqlite::OptionalExtension;

struct SubscriberRow {
    id: i64,
    name: String,
    email: String,
    created_at: i64,
}

fn row_to_subscriber_row(row: &Row) -> rusqlite::Result<SubscriberRow> {
    Ok(SubscriberRow {
        id: row.get("id")?,
        name: row.get("name")?,
        email: row.get("email")?,
        created_at: row.get("created_at")?,
    })
}

fn load_subscriber(conn: &Connection, row: SubscriberRow) -> Result<Subscriber> {
    let mut stmt = conn.prepare_cached(
        "SELECT s.id, s.name FROM subscriber_skill ss JOIN skill s ON s.id = ss.skill_id
         WHERE ss.subscriber_id = ?1 ORDER BY s.name",
    )?;
    let skills = stmt
        .query_map(params![row.id], |r| {
            Ok(Skill {
                id: r.get(0)?,
                name: r.get(1)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(Subscriber {
        id: row.id,
        name: row.name,
        email: row.email,
        skills,
        created_at: row.created_at,
    })
}

fn link_subscriber_skills(conn: &Connection, subscriber_id: i64, skill_ids: &[i64]) -> Result<()> {
    let mut stmt = conn.prepare_cached(
        "INSERT OR IGNORE INTO subscriber_skill (subscriber_id, skill_id)
         SELECT ?1, id FROM skill WHERE id = ?2",
    )?;
    for skill_id in skill_ids {
        stmt.execute(params![subscriber_id, skill_id])?;
    }
    Ok(())
}

impl SqliteStore {
    fn find_subscriber(&self, clause: &str, value: Value) -> Result<Option<Subscriber>> {
        let conn = self.conn.lock().unwrap();
        let row = conn
            .query_row(
                &format!(
                    "SELECT id, name, email, created_at FROM subscriber WHERE {}",
                    clause
                ),
                params![value],
                row_to_subscriber_row,
            )
            .optional()?;
        row.map(|row| load_subscriber(&conn, row)).transpose()
    }
}

impl SubscriberStore for SqliteStore {
    fn create_subscriber(&self, name: &str, email: &str, skill_ids: &[i64]) -> Result<i64> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO subscriber (name, email) VALUES (?1, ?2)",
            params![name, email],
        )?;
        let id = tx.last_insert_rowid();
        link_subscriber_skills(&tx, id, skill_ids)?;
        tx.commit()?;
        Ok(id)
    }

    fn get_subscriber(&self, id: i64) -> Result<Option<Subscriber>> {
        self.find_subscriber("id = ?1", Value::Integer(id))
    }

    fn get_subscriber_by_email(&self, email: &str) -> Result<Option<Subscriber>> {
        self.find_subscriber("email = ?1", Value::Text(email.to_string()))
    }

    fn update_subscriber(&self, id: i64, name: &str, skill_ids: &[i64]) -> Result<bool> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        let changed = tx.execute(
            "UPDATE subscriber SET name = ?1 WHERE id = ?2",
            params![name, id],
        )?;
        if changed == 0 {
            return Ok(false);
        }
        tx.execute(
            "DELETE FROM subscriber_skill WHERE subscriber_id = ?1",
            params![id],
        )?;
        link_subscriber_skills(&tx, id, skill_ids)?;
        tx.commit()?;
        Ok(true)
    }

    fn delete_subscriber(&self, id: i64) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let changed = conn.execute("DELETE FROM subscriber WHERE id = ?1", params![id])?;
        Ok(changed > 0)
    }

    fn list_subscribers(&self) -> Result<Vec<Subscriber>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt =
            conn.prepare("SELECT id, name, email, created_at FROM subscriber ORDER BY id")?;
        let rows = stmt
            .query_map([], row_to_subscriber_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        rows.into_iter()
            .map(|row| load_subscriber(&conn, row))
            .collect()
    }
}
