//! [`SqliteStore`]: the SQLite implementation of [`Store`].

use std::path::Path;

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use redil_core::{Entity, EntityKind, Record, store::Store, user::User};

use crate::{
  Error, Result,
  encode::{RECORD_COLUMNS, RawRecord, decode_dt, encode_data, encode_dt, encode_uuid},
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Redil store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

/// What the update closure did on the database thread.
enum WriteOutcome {
  /// Written; carries the row's `created_at` column.
  Done(String),
  Missing,
  Conflict,
}

/// The column values every write binds.
struct Row {
  id:         String,
  kind:       String,
  parent_id:  Option<String>,
  unique_key: Option<String>,
  data_json:  String,
  at:         String,
}

impl Row {
  fn new<E: Entity>(id: Uuid, data: &E, at: chrono::DateTime<Utc>) -> Result<Self> {
    Ok(Self {
      id:         encode_uuid(id),
      kind:       E::KIND.to_string(),
      parent_id:  data.parent_id().map(encode_uuid),
      unique_key: data.unique_key().map(|(_, value)| value),
      data_json:  encode_data(data)?,
      at:         encode_dt(at),
    })
  }
}

/// Whether another row of `kind` already holds `unique_key`.
fn key_taken(
  conn: &rusqlite::Connection,
  kind: &str,
  unique_key: &str,
  id: &str,
) -> rusqlite::Result<bool> {
  Ok(
    conn
      .query_row(
        "SELECT 1 FROM records WHERE kind = ?1 AND unique_key = ?2 AND id != ?3",
        rusqlite::params![kind, unique_key, id],
        |_| Ok(true),
      )
      .optional()?
      .unwrap_or(false),
  )
}

fn duplicate<E: Entity>(data: &E) -> Error {
  let (field, value) = data.unique_key().unwrap_or(("id", String::new()));
  Error::Duplicate { kind: E::KIND, field, value }
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run a `SELECT {RECORD_COLUMNS}` query and decode every row as `E`.
  async fn query_records<E: Entity>(
    &self,
    sql: String,
    args: Vec<String>,
  ) -> Result<Vec<Record<E>>> {
    let raws: Vec<RawRecord> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(args.iter()), RawRecord::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawRecord::into_record::<E>).collect()
  }
}

// ─── Store impl ──────────────────────────────────────────────────────────────

impl Store for SqliteStore {
  type Error = Error;

  // ── Reads ─────────────────────────────────────────────────────────────────

  async fn list<E: Entity>(&self) -> Result<Vec<Record<E>>> {
    self
      .query_records(
        format!("SELECT {RECORD_COLUMNS} FROM records WHERE kind = ?1 ORDER BY rowid"),
        vec![E::KIND.to_string()],
      )
      .await
  }

  async fn list_by_parent<E: Entity>(&self, parent_id: Uuid) -> Result<Vec<Record<E>>> {
    self
      .query_records(
        format!(
          "SELECT {RECORD_COLUMNS} FROM records
           WHERE kind = ?1 AND parent_id = ?2
           ORDER BY rowid"
        ),
        vec![E::KIND.to_string(), encode_uuid(parent_id)],
      )
      .await
  }

  async fn get<E: Entity>(&self, id: Uuid) -> Result<Option<Record<E>>> {
    let mut found = self
      .query_records(
        format!("SELECT {RECORD_COLUMNS} FROM records WHERE kind = ?1 AND id = ?2"),
        vec![E::KIND.to_string(), encode_uuid(id)],
      )
      .await?;
    Ok(found.pop())
  }

  async fn count<E: Entity>(&self) -> Result<usize> {
    let kind = E::KIND.to_string();
    let n: i64 = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "SELECT COUNT(*) FROM records WHERE kind = ?1",
          rusqlite::params![kind],
          |r| r.get(0),
        )?)
      })
      .await?;
    Ok(usize::try_from(n).unwrap_or(0))
  }

  async fn find_user_by_username(&self, username: &str) -> Result<Option<Record<User>>> {
    let mut found = self
      .query_records(
        format!("SELECT {RECORD_COLUMNS} FROM records WHERE kind = ?1 AND unique_key = ?2"),
        vec![
          EntityKind::User.to_string(),
          username.trim().to_lowercase(),
        ],
      )
      .await?;
    Ok(found.pop())
  }

  // ── Writes ────────────────────────────────────────────────────────────────

  async fn create<E: Entity>(&self, mut data: E) -> Result<Record<E>> {
    data.prepare()?;
    data.validate()?;

    let now = Utc::now();
    let record = Record { id: Uuid::new_v4(), created_at: now, updated_at: now, data };
    let row = Row::new(record.id, &record.data, now)?;

    // `false` when the unique key is already held.
    let inserted = self
      .conn
      .call(move |conn| {
        if let Some(key) = &row.unique_key
          && key_taken(conn, &row.kind, key, &row.id)?
        {
          return Ok(false);
        }
        conn.execute(
          "INSERT INTO records (id, kind, parent_id, unique_key, data_json, created_at, updated_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
          rusqlite::params![row.id, row.kind, row.parent_id, row.unique_key, row.data_json, row.at],
        )?;
        Ok(true)
      })
      .await?;

    if !inserted {
      return Err(duplicate(&record.data));
    }
    tracing::debug!(kind = %E::KIND, id = %record.id, "created");
    Ok(record)
  }

  async fn update<E: Entity>(&self, id: Uuid, mut data: E) -> Result<Record<E>> {
    data.prepare()?;
    data.validate()?;

    let now = Utc::now();
    let row = Row::new(id, &data, now)?;

    let outcome = self
      .conn
      .call(move |conn| {
        let created: Option<String> = conn
          .query_row(
            "SELECT created_at FROM records WHERE id = ?1 AND kind = ?2",
            rusqlite::params![row.id, row.kind],
            |r| r.get(0),
          )
          .optional()?;
        let Some(created) = created else {
          return Ok(WriteOutcome::Missing);
        };
        if let Some(key) = &row.unique_key
          && key_taken(conn, &row.kind, key, &row.id)?
        {
          return Ok(WriteOutcome::Conflict);
        }
        conn.execute(
          "UPDATE records
           SET parent_id = ?3, unique_key = ?4, data_json = ?5, updated_at = ?6
           WHERE id = ?1 AND kind = ?2",
          rusqlite::params![row.id, row.kind, row.parent_id, row.unique_key, row.data_json, row.at],
        )?;
        Ok(WriteOutcome::Done(created))
      })
      .await?;

    match outcome {
      WriteOutcome::Done(created) => Ok(Record {
        id,
        created_at: decode_dt(&created)?,
        updated_at: now,
        data,
      }),
      WriteOutcome::Missing => Err(Error::NotFound { kind: E::KIND, id }),
      WriteOutcome::Conflict => Err(duplicate(&data)),
    }
  }

  async fn delete<E: Entity>(&self, id: Uuid) -> Result<()> {
    let id_str = encode_uuid(id);
    let kind = E::KIND.to_string();

    let removed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM records WHERE id = ?1 AND kind = ?2",
          rusqlite::params![id_str, kind],
        )?)
      })
      .await?;

    if removed == 0 {
      tracing::debug!(kind = %E::KIND, %id, "delete of missing record ignored");
    }
    Ok(())
  }
}
