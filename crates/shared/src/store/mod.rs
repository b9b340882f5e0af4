// Store - SQLite persistence for accounts and characters
//
// Both services share one store. Username and character-name matching is
// case-insensitive (COLLATE NOCASE); concurrent creates of the same name
// are resolved by the unique indexes and surface as `AlreadyExists`.

mod models;

pub use models::{Account, Character, NewCharacter};

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};

use crate::auth::srp6::{SALT_SIZE, SESSION_KEY_SIZE, VERIFIER_SIZE};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,
    #[error("record already exists")]
    AlreadyExists,
    #[error("store backend failed: {0}")]
    Backend(sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => StoreError::NotFound,
            sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::AlreadyExists,
            _ => StoreError::Backend(err),
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

const CREATE_TABLES_SQL: &str = "
CREATE TABLE IF NOT EXISTS accounts (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT NOT NULL UNIQUE COLLATE NOCASE,
    salt BLOB NOT NULL,
    verifier BLOB NOT NULL,
    session_key BLOB
);

CREATE TABLE IF NOT EXISTS characters (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    account_id INTEGER NOT NULL,
    name TEXT NOT NULL UNIQUE COLLATE NOCASE,
    race INTEGER NOT NULL,
    class INTEGER NOT NULL,
    gender INTEGER NOT NULL,
    skin INTEGER DEFAULT 0,
    face INTEGER DEFAULT 0,
    hair_style INTEGER DEFAULT 0,
    hair_color INTEGER DEFAULT 0,
    facial_hair INTEGER DEFAULT 0,
    level INTEGER DEFAULT 1,
    map INTEGER DEFAULT 0,
    x REAL NOT NULL,
    y REAL NOT NULL,
    z REAL NOT NULL,
    orientation REAL DEFAULT 0,
    FOREIGN KEY (account_id) REFERENCES accounts(id)
);
";

/// Connection-pooled store handle, cheap to clone.
#[derive(Clone)]
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    /// Open (or create) the store at the given path.
    pub async fn open(path: &str) -> StoreResult<Self> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        let store = Store { pool };
        store.create_tables().await?;
        tracing::info!("Store opened at {}", path);
        Ok(store)
    }

    /// In-memory store, used by tests.
    pub async fn open_in_memory() -> StoreResult<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;

        let store = Store { pool };
        store.create_tables().await?;
        Ok(store)
    }

    async fn create_tables(&self) -> StoreResult<()> {
        sqlx::raw_sql(CREATE_TABLES_SQL).execute(&self.pool).await?;
        Ok(())
    }

    // ---- Account operations ----

    pub async fn get_account(&self, username: &str) -> StoreResult<Account> {
        let row = sqlx::query(
            "SELECT id, username, salt, verifier, session_key FROM accounts \
             WHERE username = ? COLLATE NOCASE",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound)?;

        let salt_blob: Vec<u8> = row.try_get("salt").map_err(StoreError::from)?;
        let verifier_blob: Vec<u8> = row.try_get("verifier").map_err(StoreError::from)?;
        let key_blob: Option<Vec<u8>> = row.try_get("session_key").map_err(StoreError::from)?;

        let mut salt = [0u8; SALT_SIZE];
        let mut verifier = [0u8; VERIFIER_SIZE];
        if salt_blob.len() != SALT_SIZE || verifier_blob.len() != VERIFIER_SIZE {
            return Err(StoreError::Backend(sqlx::Error::ColumnDecode {
                index: "salt".into(),
                source: "unexpected credential blob size".into(),
            }));
        }
        salt.copy_from_slice(&salt_blob);
        verifier.copy_from_slice(&verifier_blob);

        let session_key = key_blob.and_then(|blob| {
            if blob.len() == SESSION_KEY_SIZE {
                let mut key = [0u8; SESSION_KEY_SIZE];
                key.copy_from_slice(&blob);
                Some(key)
            } else {
                None
            }
        });

        Ok(Account {
            id: row.try_get("id").map_err(StoreError::from)?,
            username: row.try_get("username").map_err(StoreError::from)?,
            salt,
            verifier,
            session_key,
        })
    }

    pub async fn create_account(
        &self,
        username: &str,
        salt: &[u8; SALT_SIZE],
        verifier: &[u8; VERIFIER_SIZE],
    ) -> StoreResult<Account> {
        let result = sqlx::query("INSERT INTO accounts (username, salt, verifier) VALUES (?, ?, ?)")
            .bind(username)
            .bind(salt.as_slice())
            .bind(verifier.as_slice())
            .execute(&self.pool)
            .await?;

        Ok(Account {
            id: result.last_insert_rowid(),
            username: username.to_string(),
            salt: *salt,
            verifier: *verifier,
            session_key: None,
        })
    }

    pub async fn update_session_key(
        &self,
        account_id: i64,
        session_key: &[u8; SESSION_KEY_SIZE],
    ) -> StoreResult<()> {
        sqlx::query("UPDATE accounts SET session_key = ? WHERE id = ?")
            .bind(session_key.as_slice())
            .bind(account_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    // ---- Character operations ----

    pub async fn get_characters(&self, account_id: i64) -> StoreResult<Vec<Character>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM characters WHERE account_id = ? ORDER BY id",
            CHARACTER_COLUMNS
        ))
        .bind(account_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(character_from_row).collect()
    }

    pub async fn get_character(&self, character_id: i64) -> StoreResult<Character> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM characters WHERE id = ?",
            CHARACTER_COLUMNS
        ))
        .bind(character_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound)?;

        character_from_row(&row)
    }

    /// Insert a new character and return its id (its low GUID on the
    /// wire). A duplicate name loses the race here and gets
    /// `AlreadyExists`, whatever interleaving the two sessions had.
    pub async fn create_character(&self, character: &NewCharacter) -> StoreResult<i64> {
        let result = sqlx::query(
            "INSERT INTO characters (account_id, name, race, class, gender, skin, face, \
             hair_style, hair_color, facial_hair, level, map, x, y, z, orientation) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(character.account_id)
        .bind(&character.name)
        .bind(character.race as i64)
        .bind(character.class as i64)
        .bind(character.gender as i64)
        .bind(character.skin as i64)
        .bind(character.face as i64)
        .bind(character.hair_style as i64)
        .bind(character.hair_color as i64)
        .bind(character.facial_hair as i64)
        .bind(character.level as i64)
        .bind(character.map as i64)
        .bind(character.x as f64)
        .bind(character.y as f64)
        .bind(character.z as f64)
        .bind(character.orientation as f64)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    pub async fn update_character_position(
        &self,
        character_id: i64,
        map: i32,
        x: f32,
        y: f32,
        z: f32,
        orientation: f32,
    ) -> StoreResult<()> {
        sqlx::query("UPDATE characters SET map = ?, x = ?, y = ?, z = ?, orientation = ? WHERE id = ?")
            .bind(map as i64)
            .bind(x as f64)
            .bind(y as f64)
            .bind(z as f64)
            .bind(orientation as f64)
            .bind(character_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn delete_character(&self, character_id: i64) -> StoreResult<()> {
        sqlx::query("DELETE FROM characters WHERE id = ?")
            .bind(character_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

const CHARACTER_COLUMNS: &str = "id, account_id, name, race, class, gender, skin, face, \
     hair_style, hair_color, facial_hair, level, map, x, y, z, orientation";

fn character_from_row(row: &sqlx::sqlite::SqliteRow) -> StoreResult<Character> {
    let get_u8 = |name: &str| -> Result<u8, StoreError> {
        Ok(row.try_get::<i64, _>(name).map_err(StoreError::from)? as u8)
    };

    Ok(Character {
        id: row.try_get("id").map_err(StoreError::from)?,
        account_id: row.try_get("account_id").map_err(StoreError::from)?,
        name: row.try_get("name").map_err(StoreError::from)?,
        race: get_u8("race")?,
        class: get_u8("class")?,
        gender: get_u8("gender")?,
        skin: get_u8("skin")?,
        face: get_u8("face")?,
        hair_style: get_u8("hair_style")?,
        hair_color: get_u8("hair_color")?,
        facial_hair: get_u8("facial_hair")?,
        level: get_u8("level")?,
        map: row.try_get::<i64, _>("map").map_err(StoreError::from)? as i32,
        x: row.try_get::<f64, _>("x").map_err(StoreError::from)? as f32,
        y: row.try_get::<f64, _>("y").map_err(StoreError::from)? as f32,
        z: row.try_get::<f64, _>("z").map_err(StoreError::from)? as f32,
        orientation: row.try_get::<f64, _>("orientation").map_err(StoreError::from)? as f32,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_character(account_id: i64, name: &str) -> NewCharacter {
        NewCharacter {
            account_id,
            name: name.to_string(),
            race: 1,
            class: 1,
            gender: 0,
            skin: 2,
            face: 3,
            hair_style: 4,
            hair_color: 5,
            facial_hair: 6,
            level: 1,
            map: 0,
            x: -8949.95,
            y: -132.493,
            z: 83.5312,
            orientation: 0.0,
        }
    }

    #[tokio::test]
    async fn test_account_lifecycle() {
        let store = Store::open_in_memory().await.unwrap();

        assert!(matches!(
            store.get_account("ALICE").await,
            Err(StoreError::NotFound)
        ));

        let salt = [1u8; SALT_SIZE];
        let verifier = [2u8; VERIFIER_SIZE];
        let created = store.create_account("ALICE", &salt, &verifier).await.unwrap();
        assert!(created.session_key.is_none());

        // Case-insensitive lookup
        let fetched = store.get_account("alice").await.unwrap();
        assert_eq!(fetched.id, created.id);
        assert_eq!(fetched.salt, salt);
        assert_eq!(fetched.verifier, verifier);

        // Duplicate usernames collide regardless of case
        assert!(matches!(
            store.create_account("Alice", &salt, &verifier).await,
            Err(StoreError::AlreadyExists)
        ));

        // Session key is rewritten on every login
        let key_a = [3u8; SESSION_KEY_SIZE];
        let key_b = [4u8; SESSION_KEY_SIZE];
        store.update_session_key(created.id, &key_a).await.unwrap();
        assert_eq!(store.get_account("ALICE").await.unwrap().session_key, Some(key_a));
        store.update_session_key(created.id, &key_b).await.unwrap();
        assert_eq!(store.get_account("ALICE").await.unwrap().session_key, Some(key_b));
    }

    #[tokio::test]
    async fn test_character_lifecycle() {
        let store = Store::open_in_memory().await.unwrap();
        let account = store
            .create_account("BOB", &[0u8; SALT_SIZE], &[0u8; VERIFIER_SIZE])
            .await
            .unwrap();

        let id = store
            .create_character(&test_character(account.id, "Carol"))
            .await
            .unwrap();

        let list = store.get_characters(account.id).await.unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].id, id);
        assert_eq!(list[0].name, "Carol");
        assert_eq!(list[0].level, 1);

        // Name uniqueness is case-insensitive
        assert!(matches!(
            store.create_character(&test_character(account.id, "CAROL")).await,
            Err(StoreError::AlreadyExists)
        ));

        store
            .update_character_position(id, 1, 10.0, 20.0, 30.0, 1.5)
            .await
            .unwrap();
        let moved = store.get_character(id).await.unwrap();
        assert_eq!(moved.map, 1);
        assert_eq!(moved.x, 10.0);
        assert_eq!(moved.orientation, 1.5);

        store.delete_character(id).await.unwrap();
        assert!(store.get_characters(account.id).await.unwrap().is_empty());
        assert!(matches!(
            store.get_character(id).await,
            Err(StoreError::NotFound)
        ));
    }
}
