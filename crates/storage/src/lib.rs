use std::{str::FromStr, time::Duration};

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use sqlx::{
    migrate::MigrateError,
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous},
    SqlitePool,
};
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use vehicle_registry_core::{ChassisId, InsertOutcome, Vehicle, VehicleGateway, VehicleType};

const SQLITE_CONSTRAINT_UNIQUE: &str = "2067";

/// Top-level database handle that owns the SQLite connection pool.
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Establishes a new SQLite connection pool for the provided connection string.
    ///
    /// The database file is created when it does not exist yet.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, StorageError> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(StorageError::Connect)?
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(Duration::from_millis(5000));

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await
            .map_err(StorageError::Connect)?;

        Ok(Self { pool })
    }

    /// Applies migrations located under `migrations/`.
    pub async fn run_migrations(&self) -> Result<(), StorageError> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(StorageError::Migration)?;
        Ok(())
    }

    /// Round-trips a trivial query to confirm the database is reachable.
    pub async fn ping(&self) -> Result<(), StorageError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Returns a handle for reading and writing vehicles.
    pub fn vehicles(&self) -> VehicleRepository {
        VehicleRepository {
            pool: self.pool.clone(),
        }
    }

    /// Exposes the inner pool when lower level access is required.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

/// General storage level errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to connect to sqlite: {0}")]
    Connect(sqlx::Error),
    #[error("failed to run database migrations: {0}")]
    Migration(MigrateError),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Repository backing the `vehicles` table.
#[derive(Clone)]
pub struct VehicleRepository {
    pool: SqlitePool,
}

#[async_trait]
impl VehicleGateway for VehicleRepository {
    type Error = VehicleStoreError;

    async fn find_by_chassis_id(
        &self,
        chassis_id: &ChassisId,
    ) -> Result<Option<Vehicle>, VehicleStoreError> {
        let row = sqlx::query_as::<_, VehicleRow>(
            "SELECT id, chassis_series, chassis_number, vehicle_type, color, passengers_number \
             FROM vehicles WHERE chassis_series = ? AND chassis_number = ?",
        )
        .bind(&chassis_id.series)
        .bind(i64::from(chassis_id.number))
        .fetch_optional(&self.pool)
        .await?;

        row.map(VehicleRow::into_domain).transpose()
    }

    async fn insert(&self, vehicle: &Vehicle) -> Result<InsertOutcome, VehicleStoreError> {
        let id = Uuid::new_v4().to_string();
        let now = now_rfc3339();
        let result = sqlx::query(
            "INSERT INTO vehicles \
             (id, chassis_series, chassis_number, vehicle_type, color, passengers_number, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(&vehicle.chassis_id.series)
        .bind(i64::from(vehicle.chassis_id.number))
        .bind(vehicle.vehicle_type.as_str())
        .bind(&vehicle.color)
        .bind(i64::from(vehicle.passengers_number))
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => {
                debug!(stage = "storage", %id, chassis_id = %vehicle.chassis_id, "vehicle row inserted");
                Ok(InsertOutcome::Inserted)
            }
            Err(sqlx::Error::Database(db_err))
                if db_err.code().as_deref() == Some(SQLITE_CONSTRAINT_UNIQUE) =>
            {
                Ok(InsertOutcome::Duplicate)
            }
            Err(err) => Err(VehicleStoreError::Database(err)),
        }
    }

    async fn list_all(&self) -> Result<Vec<Vehicle>, VehicleStoreError> {
        let rows = sqlx::query_as::<_, VehicleRow>(
            "SELECT id, chassis_series, chassis_number, vehicle_type, color, passengers_number \
             FROM vehicles ORDER BY rowid",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(VehicleRow::into_domain).collect()
    }

    async fn update_color(
        &self,
        chassis_id: &ChassisId,
        color: &str,
    ) -> Result<bool, VehicleStoreError> {
        let result = sqlx::query(
            "UPDATE vehicles SET color = ?, updated_at = ? \
             WHERE chassis_series = ? AND chassis_number = ?",
        )
        .bind(color)
        .bind(now_rfc3339())
        .bind(&chassis_id.series)
        .bind(i64::from(chassis_id.number))
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

/// Raw `vehicles` row.
#[derive(Debug, sqlx::FromRow)]
struct VehicleRow {
    id: String,
    chassis_series: String,
    chassis_number: i64,
    vehicle_type: String,
    color: String,
    passengers_number: i64,
}

impl VehicleRow {
    /// Converts the database row into a domain vehicle.
    fn into_domain(self) -> Result<Vehicle, VehicleStoreError> {
        let number = u32::try_from(self.chassis_number).map_err(|_| VehicleStoreError::CorruptRow {
            id: self.id.clone(),
            column: "chassis_number",
        })?;
        let passengers_number =
            u32::try_from(self.passengers_number).map_err(|_| VehicleStoreError::CorruptRow {
                id: self.id.clone(),
                column: "passengers_number",
            })?;

        Ok(Vehicle {
            chassis_id: ChassisId::new(self.chassis_series, number),
            vehicle_type: VehicleType::from(self.vehicle_type.as_str()),
            color: self.color,
            passengers_number,
        })
    }
}

/// Errors that can occur while reading or writing vehicles.
#[derive(Debug, Error)]
pub enum VehicleStoreError {
    #[error("vehicle row {id} holds an out of range {column}")]
    CorruptRow { id: String, column: &'static str },
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use sqlx::Row;
    use tempfile::TempDir;
    use vehicle_registry_core::{AddVehicleOutcome, VehicleService};

    use super::*;

    async fn setup_db() -> (TempDir, Database) {
        let dir = tempfile::tempdir().expect("tempdir");
        let url = format!("sqlite://{}", dir.path().join("vehicles.db").display());
        let db = Database::connect(&url, 5).await.expect("connect");
        db.run_migrations().await.expect("migrations");
        (dir, db)
    }

    fn car(series: &str, number: u32) -> Vehicle {
        Vehicle {
            chassis_id: ChassisId::new(series, number),
            vehicle_type: VehicleType::Car,
            color: "Red".to_string(),
            passengers_number: 4,
        }
    }

    #[tokio::test]
    async fn migrations_apply() {
        let (_dir, db) = setup_db().await;

        let tables: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'vehicles'",
        )
        .fetch_one(db.pool())
        .await
        .expect("fetch tables");
        assert_eq!(tables.0, 1);
        db.ping().await.expect("ping");
    }

    #[tokio::test]
    async fn insert_then_lookup_round_trips() {
        let (_dir, db) = setup_db().await;
        let repo = db.vehicles();

        let outcome = repo.insert(&car("AB", 7)).await.expect("insert");
        assert_eq!(outcome, InsertOutcome::Inserted);

        let found = repo
            .find_by_chassis_id(&ChassisId::new("AB", 7))
            .await
            .expect("lookup")
            .expect("vehicle present");
        assert_eq!(found, car("AB", 7));

        let missing = repo
            .find_by_chassis_id(&ChassisId::new("AB", 8))
            .await
            .expect("lookup");
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn insert_returns_duplicate_on_conflict() {
        let (_dir, db) = setup_db().await;
        let repo = db.vehicles();

        repo.insert(&car("AB", 7)).await.expect("first insert");
        let outcome = repo.insert(&car("AB", 7)).await.expect("duplicate is ok");
        assert!(outcome.is_duplicate());

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM vehicles")
            .fetch_one(db.pool())
            .await
            .expect("count");
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn list_all_keeps_insertion_order() {
        let (_dir, db) = setup_db().await;
        let repo = db.vehicles();
        assert!(repo.list_all().await.expect("list").is_empty());

        repo.insert(&car("ZZ", 1)).await.expect("insert");
        repo.insert(&car("AA", 2)).await.expect("insert");

        let series: Vec<String> = repo
            .list_all()
            .await
            .expect("list")
            .into_iter()
            .map(|vehicle| vehicle.chassis_id.series)
            .collect();
        assert_eq!(series, vec!["ZZ".to_string(), "AA".to_string()]);
    }

    #[tokio::test]
    async fn update_color_reports_match() {
        let (_dir, db) = setup_db().await;
        let repo = db.vehicles();
        repo.insert(&car("AB", 7)).await.expect("insert");

        assert!(!repo
            .update_color(&ChassisId::new("AB", 8), "Blue")
            .await
            .expect("update missing"));
        assert!(repo
            .update_color(&ChassisId::new("AB", 7), "Blue")
            .await
            .expect("update existing"));

        let row = sqlx::query("SELECT color, passengers_number FROM vehicles")
            .fetch_one(db.pool())
            .await
            .expect("row");
        assert_eq!(row.get::<String, _>("color"), "Blue");
        assert_eq!(row.get::<i64, _>("passengers_number"), 4);
    }

    #[tokio::test]
    async fn unknown_vehicle_type_reads_back_as_other() {
        let (_dir, db) = setup_db().await;
        sqlx::query(
            "INSERT INTO vehicles (id, chassis_series, chassis_number, vehicle_type, color, passengers_number, created_at, updated_at) \
             VALUES ('v-1', 'XY', 3, 'Tractor', 'Green', 0, '2025-01-01T00:00:00Z', '2025-01-01T00:00:00Z')",
        )
        .execute(db.pool())
        .await
        .expect("insert raw");

        let found = db
            .vehicles()
            .find_by_chassis_id(&ChassisId::new("XY", 3))
            .await
            .expect("lookup")
            .expect("present");
        assert_eq!(found.vehicle_type, VehicleType::Other);
    }

    #[tokio::test]
    async fn out_of_range_chassis_number_is_a_corrupt_row() {
        let (_dir, db) = setup_db().await;
        sqlx::query(
            "INSERT INTO vehicles (id, chassis_series, chassis_number, vehicle_type, color, passengers_number, created_at, updated_at) \
             VALUES ('v-big', 'XY', 4294967296, 'Car', 'Green', 4, '2025-01-01T00:00:00Z', '2025-01-01T00:00:00Z')",
        )
        .execute(db.pool())
        .await
        .expect("insert raw");

        let err = db.vehicles().list_all().await.expect_err("row does not fit u32");
        assert!(
            matches!(
                &err,
                VehicleStoreError::CorruptRow { id, column: "chassis_number" } if id == "v-big"
            ),
            "unexpected error: {err:?}"
        );
    }

    #[tokio::test]
    async fn concurrent_registration_stores_one_row() {
        let (_dir, db) = setup_db().await;
        let service = VehicleService::new(Arc::new(db.vehicles()));

        let (left, right) = tokio::join!(
            service.add_vehicle(car("AB", 7)),
            service.add_vehicle(car("AB", 7)),
        );
        let outcomes = [left.expect("left"), right.expect("right")];

        assert_eq!(outcomes.iter().filter(|o| o.is_added()).count(), 1);
        assert!(outcomes.contains(&AddVehicleOutcome::DuplicateChassisId));

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM vehicles")
            .fetch_one(db.pool())
            .await
            .expect("count");
        assert_eq!(count, 1);
    }
}
