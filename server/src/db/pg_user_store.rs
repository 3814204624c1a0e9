// server/src/db/pg_user_store.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lem_auth::{NewUser, Role, StoreError, User, UserFilter, UserId, UserStore, UserUpdate};
use sqlx::{FromRow, PgPool, Postgres};
use tracing::{event, instrument, Level};
use uuid::Uuid;

const USER_COLUMNS: &str = "id, email, password_hash, role, created_at, updated_at";

/// [`UserStore`] over the `users` table.
///
/// Both uniqueness rules live in the schema (a unique index on `email` and a
/// partial unique index on `role = 'super_admin'`), so concurrent writes are
/// settled by Postgres and reported as [`StoreError::Conflict`].
#[derive(Debug, Clone)]
pub struct PgUserStore {
  pool: PgPool,
}

impl PgUserStore {
  pub fn new(pool: PgPool) -> Self {
    Self { pool }
  }
}

#[derive(Debug, FromRow)]
struct UserRow {
  id: Uuid,
  email: String,
  password_hash: String,
  role: String,
  created_at: DateTime<Utc>,
  updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
  type Error = StoreError;

  fn try_from(row: UserRow) -> Result<Self, Self::Error> {
    let role = row.role.parse::<Role>().map_err(|e| StoreError::Backend { source: e.into() })?;
    Ok(User {
      id: UserId::from(row.id),
      email: row.email,
      password_hash: row.password_hash,
      role,
      created_at: row.created_at,
      updated_at: row.updated_at,
    })
  }
}

fn map_sqlx_error(err: sqlx::Error) -> StoreError {
  if let sqlx::Error::Database(db_err) = &err {
    if db_err.is_unique_violation() {
      return StoreError::Conflict {
        message: db_err.constraint().unwrap_or("unique constraint").to_string(),
      };
    }
  }
  StoreError::Backend { source: err.into() }
}

#[async_trait]
impl UserStore for PgUserStore {
  #[instrument(name = "pg_store::find_one", skip(self))]
  async fn find_one(&self, filter: &UserFilter) -> Result<Option<User>, StoreError> {
    let (column, sql_filter) = match filter {
      UserFilter::Id(_) => ("id", "id = $1"),
      UserFilter::Email(_) => ("email", "email = $1"),
      UserFilter::Role(_) => ("role", "role = $1"),
    };
    let sql = format!(
      "SELECT {} FROM users WHERE {} ORDER BY created_at ASC, id ASC LIMIT 1",
      USER_COLUMNS, sql_filter
    );
    let query = sqlx::query_as::<Postgres, UserRow>(&sql);
    let query = match filter {
      UserFilter::Id(id) => query.bind(id.as_uuid()),
      UserFilter::Email(email) => query.bind(email.as_str()),
      UserFilter::Role(role) => query.bind(role.as_str()),
    };

    let row = query.fetch_optional(&self.pool).await.map_err(|e| {
      event!(Level::ERROR, error = %e, column, "Database error while looking up user.");
      map_sqlx_error(e)
    })?;
    row.map(User::try_from).transpose()
  }

  #[instrument(name = "pg_store::insert_one", skip_all, fields(role = %user.role))]
  async fn insert_one(&self, user: NewUser) -> Result<User, StoreError> {
    let sql = format!(
      "INSERT INTO users ({cols}) VALUES ($1, $2, $3, $4, $5, $6) RETURNING {cols}",
      cols = USER_COLUMNS
    );
    let row = sqlx::query_as::<Postgres, UserRow>(&sql)
      .bind(Uuid::new_v4())
      .bind(&user.email)
      .bind(&user.password_hash)
      .bind(user.role.as_str())
      .bind(user.created_at)
      .bind(user.updated_at)
      .fetch_one(&self.pool)
      .await
      .map_err(map_sqlx_error)?;

    let created = User::try_from(row)?;
    event!(Level::DEBUG, user_id = %created.id, "Inserted user record.");
    Ok(created)
  }

  #[instrument(name = "pg_store::update_one", skip(self, update), fields(user_id = %id))]
  async fn update_one(&self, id: UserId, update: UserUpdate) -> Result<(), StoreError> {
    // COALESCE keeps the stored value for every field the update leaves unset.
    let result = sqlx::query::<Postgres>(
      "UPDATE users SET \
         password_hash = COALESCE($2, password_hash), \
         role = COALESCE($3, role), \
         updated_at = COALESCE($4, updated_at) \
       WHERE id = $1",
    )
    .bind(id.as_uuid())
    .bind(update.password_hash.as_deref())
    .bind(update.role.map(|r| r.as_str()))
    .bind(update.updated_at)
    .execute(&self.pool)
    .await
    .map_err(map_sqlx_error)?;

    if result.rows_affected() == 0 {
      return Err(StoreError::NotFound { id });
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn row(role: &str) -> UserRow {
    let now = Utc::now();
    UserRow {
      id: Uuid::new_v4(),
      email: "a@x.com".into(),
      password_hash: "$argon2id$stub".into(),
      role: role.into(),
      created_at: now,
      updated_at: now,
    }
  }

  #[test]
  fn rows_convert_to_users() {
    let source = row("super_admin");
    let id = source.id;
    let user = User::try_from(source).unwrap();
    assert_eq!(user.id.as_uuid(), id);
    assert_eq!(user.role, Role::SuperAdmin);
  }

  #[test]
  fn unknown_role_in_a_row_is_a_backend_error() {
    let err = User::try_from(row("owner")).unwrap_err();
    assert!(matches!(err, StoreError::Backend { .. }));
  }

  #[test]
  fn non_constraint_errors_are_backend_errors() {
    assert!(matches!(
      map_sqlx_error(sqlx::Error::PoolTimedOut),
      StoreError::Backend { .. }
    ));
  }

  // The tests below need a Postgres server: `DATABASE_URL=... cargo test -- --ignored`.
  // Each one gets a fresh database with the migrations applied.

  fn new_user(email: &str, role: Role) -> NewUser {
    NewUser::new(email, "$argon2id$stub", role, Utc::now())
  }

  #[sqlx::test(migrations = "./migrations")]
  #[ignore = "needs a Postgres server at DATABASE_URL"]
  async fn insert_find_and_update_round_trip(pool: PgPool) {
    let store = PgUserStore::new(pool);
    let user = store.insert_one(new_user("a@x.com", Role::User)).await.unwrap();

    for filter in [
      UserFilter::Id(user.id),
      UserFilter::Email("a@x.com".into()),
      UserFilter::Role(Role::User),
    ] {
      assert_eq!(store.find_one(&filter).await.unwrap().unwrap().id, user.id);
    }
    assert!(store.find_one(&UserFilter::Email("A@X.COM".into())).await.unwrap().is_none());

    let later = user.updated_at + chrono::Duration::minutes(5);
    store.update_one(user.id, UserUpdate::touch(later)).await.unwrap();
    let found = store.find_one(&UserFilter::Id(user.id)).await.unwrap().unwrap();
    assert_eq!(found.role, Role::User);
    assert_eq!(found.password_hash, user.password_hash);
    assert!(found.updated_at > user.updated_at);

    let missing = UserId::new();
    let err = store.update_one(missing, UserUpdate::touch(later)).await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound { id } if id == missing));
  }

  #[sqlx::test(migrations = "./migrations")]
  #[ignore = "needs a Postgres server at DATABASE_URL"]
  async fn duplicate_email_is_a_conflict(pool: PgPool) {
    let store = PgUserStore::new(pool);
    store.insert_one(new_user("a@x.com", Role::User)).await.unwrap();

    let err = store.insert_one(new_user("a@x.com", Role::Admin)).await.unwrap_err();
    match err {
      StoreError::Conflict { message } => assert_eq!(message, "users_email_key"),
      other => panic!("Expected Conflict, got {other:?}"),
    }
  }

  #[sqlx::test(migrations = "./migrations")]
  #[ignore = "needs a Postgres server at DATABASE_URL"]
  async fn second_super_admin_is_a_conflict(pool: PgPool) {
    let store = PgUserStore::new(pool);
    store.insert_one(new_user("root@x.com", Role::SuperAdmin)).await.unwrap();

    let err = store
      .insert_one(new_user("root2@x.com", Role::SuperAdmin))
      .await
      .unwrap_err();
    match err {
      StoreError::Conflict { message } => assert_eq!(message, "users_single_super_admin"),
      other => panic!("Expected Conflict, got {other:?}"),
    }
  }

  #[sqlx::test(migrations = "./migrations")]
  #[ignore = "needs a Postgres server at DATABASE_URL"]
  async fn promoting_a_second_super_admin_is_a_conflict(pool: PgPool) {
    let store = PgUserStore::new(pool);
    store.insert_one(new_user("root@x.com", Role::SuperAdmin)).await.unwrap();
    let user = store.insert_one(new_user("a@x.com", Role::User)).await.unwrap();

    let update = UserUpdate {
      role: Some(Role::SuperAdmin),
      ..Default::default()
    };
    let err = store.update_one(user.id, update).await.unwrap_err();
    assert!(matches!(err, StoreError::Conflict { .. }));

    let unchanged = store.find_one(&UserFilter::Id(user.id)).await.unwrap().unwrap();
    assert_eq!(unchanged.role, Role::User);
  }
}
