mod error;
pub mod models;

pub use error::{DbError, Result};
pub use models::{API_KEY_LEN, Key, Permission, Player, ValidationError};

use std::path::Path;
use tokio_rusqlite::Connection;
use tokio_rusqlite::rusqlite::{self, OptionalExtension, params};
use tracing::{debug, info};

/// Database wrapper for all statline storage operations.
#[derive(Clone)]
pub struct Database {
  conn: Connection,
}

fn row_to_player(row: &rusqlite::Row<'_>) -> rusqlite::Result<Player> {
  Player::new(
    row.get::<_, String>(1)?,
    row.get::<_, String>(2)?,
    row.get(0)?,
    row.get(3)?,
    row.get(4)?,
    row.get(5)?,
    row.get(6)?,
  )
  .map_err(|e| rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e)))
}

fn row_to_key(row: &rusqlite::Row<'_>) -> rusqlite::Result<Key> {
  Key::new(
    row.get::<_, String>(0)?,
    Permission::from_stored(row.get(1)?),
  )
  .map_err(|e| rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e)))
}

impl Database {
  /// Open or create a database at the given path.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = Connection::open(path).await?;
    let db = Self { conn };
    db.initialize().await?;
    Ok(db)
  }

  /// Create an in-memory database (useful for testing).
  pub async fn open_in_memory() -> Result<Self> {
    let conn = Connection::open_in_memory().await?;
    let db = Self { conn };
    db.initialize().await?;
    Ok(db)
  }

  /// Initialize the database schema.
  ///
  /// The name and location columns collate case-insensitively: the
  /// `(player_name, player_location)` pair is the player's identity key and
  /// lookups must not depend on the caller's casing.
  async fn initialize(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        // WAL keeps readers unblocked while a write is in flight
        conn.pragma_update(None, "journal_mode", "WAL")?;

        conn.execute_batch(
          r#"
          CREATE TABLE IF NOT EXISTS Players (
              player_id       INTEGER PRIMARY KEY AUTOINCREMENT,
              player_name     TEXT NOT NULL COLLATE NOCASE,
              player_location TEXT NOT NULL COLLATE NOCASE,
              player_wins     INTEGER NOT NULL,
              player_draws    INTEGER NOT NULL,
              player_losses   INTEGER NOT NULL,
              player_points   INTEGER NOT NULL
          );

          CREATE TABLE IF NOT EXISTS Keys (
              api_key     TEXT PRIMARY KEY,
              permissions INTEGER NOT NULL
          );

          CREATE INDEX IF NOT EXISTS idx_players_identity
              ON Players(player_name, player_location);
          "#,
        )?;
        Ok(())
      })
      .await?;

    info!("database initialized");
    Ok(())
  }

  // ========================================================================
  // Players
  // ========================================================================

  /// All players, optionally filtered by location. An empty string or the
  /// literal `ALL` (any casing) selects every row.
  pub async fn get_all_players(&self, country: String) -> Result<Vec<Player>> {
    let players = self
      .conn
      .call(move |conn| {
        let players = if country.is_empty() || country.eq_ignore_ascii_case("ALL") {
          let mut stmt = conn.prepare_cached(
            "SELECT player_id, player_name, player_location, player_wins, player_draws, player_losses, player_points FROM Players",
          )?;
          let players = stmt
            .query_map([], row_to_player)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
          players
        } else {
          let mut stmt = conn.prepare_cached(
            "SELECT player_id, player_name, player_location, player_wins, player_draws, player_losses, player_points FROM Players WHERE player_location = ?1",
          )?;
          let players = stmt
            .query_map(params![&country], row_to_player)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
          players
        };

        Ok(players)
      })
      .await?;

    Ok(players)
  }

  /// Players matching a name, optionally narrowed to one location. With no
  /// location (or `ALL`) several players can share a name across regions.
  pub async fn get_players_by_name(&self, country: String, name: String) -> Result<Vec<Player>> {
    let players = self
      .conn
      .call(move |conn| {
        let players = if country.is_empty() || country.eq_ignore_ascii_case("ALL") {
          let mut stmt = conn.prepare_cached(
            "SELECT player_id, player_name, player_location, player_wins, player_draws, player_losses, player_points FROM Players WHERE player_name = ?1",
          )?;
          let players = stmt
            .query_map(params![&name], row_to_player)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
          players
        } else {
          let mut stmt = conn.prepare_cached(
            "SELECT player_id, player_name, player_location, player_wins, player_draws, player_losses, player_points FROM Players WHERE player_name = ?1 AND player_location = ?2",
          )?;
          let players = stmt
            .query_map(params![&name, &country], row_to_player)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
          players
        };

        Ok(players)
      })
      .await?;

    Ok(players)
  }

  /// Insert a new player and return the generated row id.
  /// Returns an error if the `(name, location)` pair is already taken.
  pub async fn insert_player(&self, player: Player) -> Result<i64> {
    let name_log = player.name().to_string();

    let id = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let exists: bool = tx
          .prepare_cached(
            "SELECT EXISTS(SELECT 1 FROM Players WHERE player_name = ?1 AND player_location = ?2)",
          )?
          .query_row(params![player.name(), player.location()], |row| row.get(0))?;

        if exists {
          return Ok(Err(DbError::PlayerExists));
        }

        tx.prepare_cached(
          "INSERT INTO Players (player_name, player_location, player_wins, player_draws, player_losses, player_points) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )?
        .execute(params![
          player.name(),
          player.location(),
          player.wins(),
          player.draws(),
          player.losses(),
          player.points()
        ])?;

        let id = tx.last_insert_rowid();
        tx.commit()?;
        Ok(Ok(id))
      })
      .await??;

    debug!(player_name = %name_log, id, "inserted player");
    Ok(id)
  }

  /// Overwrite every field of the row with the given id in one statement,
  /// so there is no window where the player does not exist.
  pub async fn update_player(&self, player: Player, id: i64) -> Result<()> {
    let name_log = player.name().to_string();

    self
      .conn
      .call(move |conn| {
        let updated = conn
          .prepare_cached(
            "UPDATE Players SET player_name = ?1, player_location = ?2, player_wins = ?3, player_draws = ?4, player_losses = ?5, player_points = ?6 WHERE player_id = ?7",
          )?
          .execute(params![
            player.name(),
            player.location(),
            player.wins(),
            player.draws(),
            player.losses(),
            player.points(),
            id
          ])?;

        if updated == 0 {
          return Ok(Err(DbError::PlayerNotFound));
        }

        Ok(Ok(()))
      })
      .await??;

    debug!(player_name = %name_log, id, "updated player");
    Ok(())
  }

  /// Delete a player by its identity pair.
  pub async fn delete_player(&self, name: String, location: String) -> Result<()> {
    let name_log = name.clone();

    self
      .conn
      .call(move |conn| {
        let deleted = conn
          .prepare_cached(
            "DELETE FROM Players WHERE player_name = ?1 AND player_location = ?2",
          )?
          .execute(params![&name, &location])?;

        if deleted == 0 {
          return Ok(Err(DbError::PlayerNotFound));
        }

        Ok(Ok(()))
      })
      .await??;

    debug!(player_name = %name_log, "deleted player");
    Ok(())
  }

  // ========================================================================
  // Keys
  // ========================================================================

  /// Persist a freshly generated key with its permission level.
  pub async fn create_key(&self, key: String, permission: Permission) -> Result<Key> {
    let key = Key::new(key, permission)?;
    let row = key.clone();

    self
      .conn
      .call(move |conn| {
        conn
          .prepare_cached("INSERT INTO Keys (api_key, permissions) VALUES (?1, ?2)")?
          .execute(params![row.key(), row.permission().as_stored()])?;
        Ok(())
      })
      .await?;

    debug!(permission = %key.permission(), "created api key");
    Ok(key)
  }

  /// All keys in table order.
  pub async fn get_keys(&self) -> Result<Vec<Key>> {
    let keys = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare_cached("SELECT api_key, permissions FROM Keys")?;

        let keys = stmt
          .query_map([], row_to_key)?
          .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(keys)
      })
      .await?;

    Ok(keys)
  }

  /// Delete a key by exact match.
  pub async fn delete_key(&self, key: String) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        let deleted = conn
          .prepare_cached("DELETE FROM Keys WHERE api_key = ?1")?
          .execute(params![&key])?;

        if deleted == 0 {
          return Ok(Err(DbError::KeyNotFound));
        }

        Ok(Ok(()))
      })
      .await??;

    debug!("deleted api key");
    Ok(())
  }

  /// Rotate a key: the old row is deleted and the new key inherits its
  /// permission level, in one transaction.
  pub async fn replace_key(&self, old: String, new: String) -> Result<Key> {
    let key = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let stored: Option<i64> = tx
          .prepare_cached("SELECT permissions FROM Keys WHERE api_key = ?1")?
          .query_row(params![&old], |row| row.get(0))
          .optional()?;

        let stored = match stored {
          Some(s) => s,
          None => return Ok(Err(DbError::KeyNotFound)),
        };

        tx.prepare_cached("DELETE FROM Keys WHERE api_key = ?1")?
          .execute(params![&old])?;
        tx.prepare_cached("INSERT INTO Keys (api_key, permissions) VALUES (?1, ?2)")?
          .execute(params![&new, stored])?;

        tx.commit()?;

        match Key::new(new, Permission::from_stored(stored)) {
          Ok(key) => Ok(Ok(key)),
          Err(e) => Ok(Err(DbError::InvalidEntity(e))),
        }
      })
      .await??;

    debug!(permission = %key.permission(), "replaced api key");
    Ok(key)
  }

  /// Permission attached to a key. An unknown key reads as guest.
  pub async fn get_permission(&self, key: String) -> Result<Permission> {
    let stored: Option<i64> = self
      .conn
      .call(move |conn| {
        let stored = conn
          .prepare_cached("SELECT permissions FROM Keys WHERE api_key = ?1")?
          .query_row(params![&key], |row| row.get(0))
          .optional()?;

        Ok(stored)
      })
      .await?;

    Ok(stored.map(Permission::from_stored).unwrap_or(Permission::Guest))
  }
}
