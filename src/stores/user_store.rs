use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::Arc;
use tracing::debug;

use crate::core::error::{StoreError, StoreResult};
use crate::db::pool::Database;
use crate::models::user::{NewUser, User, UserUpdate};
use crate::stores::UserStore;

/// `UserStore` over the SQLite `User` table.
///
/// Values are written exactly as given; this store knows nothing about
/// encryption.
#[derive(Clone)]
pub struct SqliteUserStore {
    db: Arc<Database>,
}

impl SqliteUserStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }
}

fn map_user(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        id_card_no: row.get(3)?,
    })
}

fn get_user(conn: &Connection, id: i64) -> StoreResult<Option<User>> {
    let mut stmt = conn.prepare_cached(r#"SELECT id, name, email, idCardNo FROM "User" WHERE id = ?1"#)?;
    Ok(stmt.query_row(params![id], map_user).optional()?)
}

impl UserStore for SqliteUserStore {
    fn create(&self, input: NewUser) -> StoreResult<User> {
        let conn = self.db.get()?;
        conn.execute(
            r#"INSERT INTO "User" (name, email, idCardNo) VALUES (?1, ?2, ?3)"#,
            params![input.name, input.email, input.id_card_no],
        )?;

        let id = conn.last_insert_rowid();
        debug!(user_id = id, "User row inserted");

        get_user(&conn, id)?
            .ok_or_else(|| StoreError::NotFound(format!("User {} not found after insert", id)))
    }

    fn find_many(&self) -> StoreResult<Vec<User>> {
        let conn = self.db.get()?;
        let mut stmt = conn.prepare_cached(r#"SELECT id, name, email, idCardNo FROM "User""#)?;
        let users = stmt
            .query_map([], map_user)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(users)
    }

    fn find_unique(&self, id: i64) -> StoreResult<Option<User>> {
        let conn = self.db.get()?;
        get_user(&conn, id)
    }

    fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let conn = self.db.get()?;
        let mut stmt =
            conn.prepare_cached(r#"SELECT id, name, email, idCardNo FROM "User" WHERE email = ?1"#)?;
        Ok(stmt.query_row(params![email], map_user).optional()?)
    }

    fn update(&self, id: i64, changes: UserUpdate) -> StoreResult<User> {
        let conn = self.db.get()?;

        if changes.is_empty() {
            return get_user(&conn, id)?.ok_or_else(|| StoreError::NotFound(format!("User {}", id)));
        }

        // COALESCE keeps the current value for every column left as NULL.
        let updated = conn.execute(
            r#"UPDATE "User"
               SET name = COALESCE(?2, name),
                   email = COALESCE(?3, email),
                   idCardNo = COALESCE(?4, idCardNo)
               WHERE id = ?1"#,
            params![id, changes.name, changes.email, changes.id_card_no],
        )?;

        if updated == 0 {
            return Err(StoreError::NotFound(format!("User {}", id)));
        }

        get_user(&conn, id)?.ok_or_else(|| StoreError::NotFound(format!("User {}", id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::DatabaseConfig;
    use tempfile::TempDir;

    fn create_test_store() -> (TempDir, SqliteUserStore) {
        let temp_dir = TempDir::new().unwrap();
        let config = DatabaseConfig {
            url: format!("file:{}", temp_dir.path().join("users.db").display()),
            ..DatabaseConfig::default()
        };
        let db = Arc::new(Database::open(&config).unwrap());
        (temp_dir, SqliteUserStore::new(db))
    }

    #[test]
    fn test_create_and_find() {
        let (_dir, store) = create_test_store();

        let created = store.create(NewUser::new("Alice", "alice@prisma.io", "raw")).unwrap();
        assert!(created.id > 0);
        assert_eq!(created.id_card_no.as_deref(), Some("raw"));

        let found = store.find_unique(created.id).unwrap().unwrap();
        assert_eq!(found, created);

        let by_email = store.find_by_email("alice@prisma.io").unwrap().unwrap();
        assert_eq!(by_email, created);

        assert!(store.find_unique(created.id + 100).unwrap().is_none());
        assert!(store.find_by_email("nobody@prisma.io").unwrap().is_none());
    }

    #[test]
    fn test_duplicate_email_is_unique_constraint() {
        let (_dir, store) = create_test_store();

        store.create(NewUser::new("Alice", "alice@prisma.io", "1")).unwrap();
        let err = store.create(NewUser::new("Alice 2", "alice@prisma.io", "2")).unwrap_err();

        match err {
            StoreError::UniqueConstraint { field } => assert_eq!(field, "email"),
            other => panic!("expected unique constraint error, got {other:?}"),
        }
        assert_eq!(store.find_many().unwrap().len(), 1);
    }

    #[test]
    fn test_id_card_no_is_not_unique() {
        let (_dir, store) = create_test_store();

        store.create(NewUser::new("Alice", "alice@prisma.io", "same")).unwrap();
        store.create(NewUser::new("Bob", "bob@prisma.io", "same")).unwrap();
        assert_eq!(store.find_many().unwrap().len(), 2);
    }

    #[test]
    fn test_null_id_card_no() {
        let (_dir, store) = create_test_store();

        let created = store
            .create(NewUser {
                name: "Nobody".to_string(),
                email: "nobody@prisma.io".to_string(),
                id_card_no: None,
            })
            .unwrap();
        assert!(created.id_card_no.is_none());
    }

    #[test]
    fn test_partial_update() {
        let (_dir, store) = create_test_store();
        let created = store.create(NewUser::new("Alice", "alice@prisma.io", "1")).unwrap();

        let updated = store
            .update(
                created.id,
                UserUpdate {
                    name: Some("Alicia".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(updated.name, "Alicia");
        assert_eq!(updated.email, "alice@prisma.io");
        assert_eq!(updated.id_card_no.as_deref(), Some("1"));
    }

    #[test]
    fn test_update_missing_user() {
        let (_dir, store) = create_test_store();
        let err = store.update(42, UserUpdate::default()).unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[test]
    fn test_empty_update_returns_current_row() {
        let (_dir, store) = create_test_store();
        let created = store.create(NewUser::new("Alice", "alice@prisma.io", "1")).unwrap();

        let unchanged = store.update(created.id, UserUpdate::default()).unwrap();
        assert_eq!(unchanged, created);
    }
}
