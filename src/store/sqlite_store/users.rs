use super::companies::insert_company;
use super::*;
use crate::store::UserStore;
use rusqlite::OptionalExtension;

fn insert_user(conn: &Connection, user: &NewUser, company_id: Option<i64>) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO user (name, email, password_hash, age, gender, address, avatar, cv, role,
         company_id)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            user.name,
            user.email,
            user.password_hash,
            user.age,
            user.gender.map(Gender::as_str),
            user.address,
            user.avatar,
            user.cv,
            user.role.as_int(),
            company_id,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

impl UserStore for SqliteStore {
    fn create_user(&self, user: &NewUser) -> Result<i64> {
        let conn = self.conn.lock().unwrap();
        Ok(insert_user(&conn, user, user.company_id)?)
    }

    fn create_recruiter_with_company(
        &self,
        company: &CompanyDraft,
        recruiter: &NewUser,
    ) -> Result<(i64, i64)> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        let company_id = insert_company(&tx, company)?;
        let user_id = insert_user(&tx, recruiter, Some(company_id))?;
        tx.commit()?;
        Ok((company_id, user_id))
    }

    fn get_user(&self, id: i64) -> Result<Option<User>> {
        let conn = self.conn.lock().unwrap();
        Ok(conn
            .query_row(
                &format!("SELECT {} FROM {} WHERE u.id = ?1", USER_SELECT, USER_FROM),
                params![id],
                row_to_user,
            )
            .optional()?)
    }

    fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let conn = self.conn.lock().unwrap();
        Ok(conn
            .query_row(
                &format!("SELECT {} FROM {} WHERE u.email = ?1", USER_SELECT, USER_FROM),
                params![email],
                row_to_user,
            )
            .optional()?)
    }

    fn update_user(&self, id: i64, update: &UserUpdate) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let changed = conn.execute(
            "UPDATE user SET name = ?1, age = ?2, gender = ?3, address = ?4, avatar = ?5,
             cv = ?6, role = ?7, company_id = ?8, updated_at = ?9 WHERE id = ?10",
            params![
                update.name,
                update.age,
                update.gender.map(Gender::as_str),
                update.address,
                update.avatar,
                update.cv,
                update.role.as_int(),
                update.company_id,
                now(),
                id
            ],
        )?;
        Ok(changed > 0)
    }

    fn set_password_hash(&self, user_id: i64, password_hash: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "UPDATE user SET password_hash = ?1, updated_at = ?2 WHERE id = ?3",
            params![password_hash, now(), user_id],
        )?;
        Ok(())
    }

    fn set_refresh_token(&self, user_id: i64, token: Option<&str>) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "UPDATE user SET refresh_token = ?1 WHERE id = ?2",
            params![token, user_id],
        )?;
        Ok(())
    }

    fn get_user_by_refresh_token(&self, token: &str, email: &str) -> Result<Option<User>> {
        let conn = self.conn.lock().unwrap();
        Ok(conn
            .query_row(
                &format!(
                    "SELECT {} FROM {} WHERE u.refresh_token = ?1 AND u.email = ?2",
                    USER_SELECT, USER_FROM
                ),
                params![token, email],
                row_to_user,
            )
            .optional()?)
    }

    fn list_users(&self, filter: &UserFilter, page: PageRequest) -> Result<Paged<User>> {
        let conn = self.conn.lock().unwrap();
        let mut sql_filter = SqlFilter::default();
        if let Some(name) = filter.name.as_deref().filter(|s| !s.is_empty()) {
            sql_filter.push_like("u.name", name);
        }
        if let Some(email) = filter.email.as_deref().filter(|s| !s.is_empty()) {
            sql_filter.push_like("u.email", email);
        }
        query_page(
            &conn,
            USER_SELECT,
            USER_FROM,
            &sql_filter,
            "u.id DESC",
            page,
            row_to_user,
        )
    }
}
