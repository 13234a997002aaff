use super::*;
use crate::store::CompanyStore;
use rusqlite::OptionalExtension;

pub(super) fn insert_company(conn: &Connection, company: &CompanyDraft) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO company (name, description, address, logo) VALUES (?1, ?2, ?3, ?4)",
        params![
            company.name,
            company.description,
            company.address,
            company.logo
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

impl CompanyStore for SqliteStore {
    fn create_company(&self, company: &CompanyDraft) -> Result<i64> {
        let conn = self.conn.lock().unwrap();
        Ok(insert_company(&conn, company)?)
    }

    fn get_company(&self, id: i64) -> Result<Option<Company>> {
        let conn = self.conn.lock().unwrap();
        Ok(conn
            .query_row(
                &format!("SELECT {} FROM company WHERE id = ?1", COMPANY_COLUMNS),
                params![id],
                row_to_company,
            )
            .optional()?)
    }

    fn update_company(&self, id: i64, company: &CompanyDraft) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let changed = conn.execute(
            "UPDATE company SET name = ?1, description = ?2, address = ?3, logo = ?4,
             updated_at = ?5 WHERE id = ?6",
            params![
                company.name,
                company.description,
                company.address,
                company.logo,
                now(),
                id
            ],
        )?;
        Ok(changed > 0)
    }

    fn list_companies(
        &self,
        filter: &CompanyFilter,
        page: PageRequest,
    ) -> Result<Paged<Company>> {
        let conn = self.conn.lock().unwrap();
        let mut sql_filter = SqlFilter::default();
        if let Some(name) = filter.name.as_deref().filter(|s| !s.is_empty()) {
            sql_filter.push_like("name", name);
        }
        if let Some(active) = filter.active {
            sql_filter.push("active = ?", active);
        }
        query_page(
            &conn,
            COMPANY_COLUMNS,
            "company",
            &sql_filter,
            "id DESC",
            page,
            row_to_company,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;

    #[test]
    fn creates_updates_and_reads_company() {
        let (store, _dir) = create_tmp_store();
        let id = add_company(&store, "Acme");

        let company = store.get_company(id).unwrap().unwrap();
        assert_eq!(company.name, "Acme");
        assert!(company.active);
        assert!(company.updated_at.is_none());

        assert!(store
            .update_company(
                id,
                &CompanyDraft {
                    name: "Acme Corp".to_string(),
                    description: Some("Widgets".to_string()),
                    address: Some("Saigon".to_string()),
                    logo: Some("https://img/acme.png".to_string()),
                },
            )
            .unwrap());

        let company = store.get_company(id).unwrap().unwrap();
        assert_eq!(company.name, "Acme Corp");
        assert_eq!(company.address.as_deref(), Some("Saigon"));
        assert!(company.updated_at.is_some());

        assert!(store.get_company(404).unwrap().is_none());
        assert!(!store
            .update_company(404, &CompanyDraft::default())
            .unwrap());
    }

    #[test]
    fn lists_companies_by_name() {
        let (store, _dir) = create_tmp_store();
        add_company(&store, "Acme");
        add_company(&store, "Globex");
        add_company(&store, "Acme Labs");

        let page = store
            .list_companies(
                &CompanyFilter {
                    name: Some("acme".to_string()),
                    active: None,
                },
                PageRequest::default(),
            )
            .unwrap();
        assert_eq!(page.meta.total, 2);
        // newest first
        assert_eq!(page.result[0].name, "Acme Labs");
    }

    #[test]
    fn page_past_the_end_is_empty() {
        let (store, _dir) = create_tmp_store();
        add_company(&store, "Acme");

        let page = store
            .list_companies(&CompanyFilter::default(), PageRequest::new(usize::MAX, 10))
            .unwrap();
        assert_eq!(page.meta.total, 1);
        assert!(page.result.is_empty());
    }
}
