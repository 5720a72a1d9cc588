//! Database migrations
//!
//! This module manages SQLite schema migrations for vaptrack.
//! Migrations are versioned and applied automatically on database connection.

use sqlx::SqlitePool;

/// Current schema version
pub const CURRENT_VERSION: i32 = 2;

/// SQL for creating the migrations tracking table
const CREATE_MIGRATIONS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS _migrations (
        version INTEGER PRIMARY KEY NOT NULL,
        applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
    );
"#;

/// Migration 1: Initial schema
///
/// Uses the historical status vocabulary (`available`, `in_progress`,
/// `testing`, `implemented`) that predates the lifecycle rename.
const MIGRATION_V1: &str = r#"
    -- Per-feature lifecycle status
    CREATE TABLE IF NOT EXISTS feature_status (
        feature_key TEXT PRIMARY KEY NOT NULL,
        status TEXT NOT NULL DEFAULT 'available'
            CHECK (status IN ('available', 'in_progress', 'testing', 'implemented')),
        implemented_at TIMESTAMP
    );

    -- Auxiliary per-feature attributes (toggles, documentation inclusion)
    CREATE TABLE IF NOT EXISTS feature_meta (
        feature_key TEXT PRIMARY KEY NOT NULL,
        category TEXT NOT NULL DEFAULT '',
        test_method TEXT NOT NULL DEFAULT '',
        verification_steps TEXT NOT NULL DEFAULT '',
        include_test_method INTEGER NOT NULL DEFAULT 0,
        include_verification INTEGER NOT NULL DEFAULT 0
    );

    -- Append-only transition audit log
    CREATE TABLE IF NOT EXISTS feature_history (
        id TEXT PRIMARY KEY NOT NULL,
        feature_key TEXT NOT NULL,
        old_status TEXT NOT NULL,
        new_status TEXT NOT NULL,
        actor TEXT NOT NULL DEFAULT '',
        note TEXT NOT NULL DEFAULT '',
        created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
    );

    CREATE INDEX IF NOT EXISTS idx_feature_history_feature_key ON feature_history(feature_key);
    CREATE INDEX IF NOT EXISTS idx_feature_history_created_at ON feature_history(created_at);

    -- Target deployment domains
    CREATE TABLE IF NOT EXISTS domains (
        id TEXT PRIMARY KEY NOT NULL,
        domain TEXT NOT NULL UNIQUE,
        is_wildcard INTEGER NOT NULL DEFAULT 0,
        license_id TEXT NOT NULL DEFAULT ''
    );

    -- Per-domain enabled feature set
    CREATE TABLE IF NOT EXISTS domain_features (
        id TEXT PRIMARY KEY NOT NULL,
        domain_id TEXT NOT NULL REFERENCES domains(id) ON DELETE CASCADE,
        feature_key TEXT NOT NULL,
        enabled INTEGER NOT NULL DEFAULT 1,
        UNIQUE(domain_id, feature_key)
    );

    CREATE INDEX IF NOT EXISTS idx_domain_features_domain_id ON domain_features(domain_id);

    -- Append-only build attempt log
    CREATE TABLE IF NOT EXISTS domain_builds (
        id TEXT PRIMARY KEY NOT NULL,
        domain TEXT NOT NULL,
        version TEXT NOT NULL,
        features TEXT NOT NULL,
        created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
    );

    CREATE INDEX IF NOT EXISTS idx_domain_builds_domain ON domain_builds(domain);
    CREATE INDEX IF NOT EXISTS idx_domain_builds_created_at ON domain_builds(created_at);
"#;

/// Migration 2: Lifecycle vocabulary and extended metadata
///
/// Rebuilds `feature_status` around the canonical lifecycle names
/// (`Draft`, `Develop`, `Test`, `Release`), normalizing existing rows
/// through the legacy alias map, and adds the assignment column.
/// Extends `feature_meta` with the enforcement flag, wireframe URL and the
/// opaque generated-schema / implementation-data blobs, and `domains` with
/// the license type.
const MIGRATION_V2: &str = r#"
    -- SQLite cannot alter a CHECK constraint; rebuild the table and
    -- normalize legacy status values while copying.
    CREATE TABLE feature_status_new (
        feature_key TEXT PRIMARY KEY NOT NULL,
        status TEXT NOT NULL DEFAULT 'Draft'
            CHECK (status IN ('Draft', 'Develop', 'Test', 'Release')),
        implemented_at TIMESTAMP,
        assigned_to TEXT
    );

    INSERT INTO feature_status_new (feature_key, status, implemented_at, assigned_to)
    SELECT feature_key,
           CASE lower(status)
               WHEN 'available'   THEN 'Draft'
               WHEN 'in_progress' THEN 'Develop'
               WHEN 'testing'     THEN 'Test'
               WHEN 'implemented' THEN 'Release'
               ELSE 'Draft'
           END,
           implemented_at,
           NULL
    FROM feature_status;

    DROP TABLE feature_status;
    ALTER TABLE feature_status_new RENAME TO feature_status;

    ALTER TABLE feature_meta ADD COLUMN is_enforced INTEGER NOT NULL DEFAULT 0;
    ALTER TABLE feature_meta ADD COLUMN wireframe_url TEXT;
    ALTER TABLE feature_meta ADD COLUMN generated_schema TEXT;
    ALTER TABLE feature_meta ADD COLUMN implementation_data TEXT;

    ALTER TABLE domains ADD COLUMN license_type TEXT NOT NULL DEFAULT 'standard';
"#;

/// Get the current schema version from the database
async fn get_current_version(pool: &SqlitePool) -> anyhow::Result<i32> {
    // Ensure migrations table exists
    sqlx::raw_sql(CREATE_MIGRATIONS_TABLE).execute(pool).await?;

    // Get the latest version
    let row: Option<(i32,)> = sqlx::query_as("SELECT MAX(version) FROM _migrations")
        .fetch_optional(pool)
        .await?;

    Ok(row.map(|(v,)| v).unwrap_or(0))
}

/// Record that a migration has been applied
async fn record_migration(pool: &SqlitePool, version: i32) -> anyhow::Result<()> {
    sqlx::query("INSERT INTO _migrations (version) VALUES (?)")
        .bind(version)
        .execute(pool)
        .await?;
    Ok(())
}

/// Run all pending migrations
pub async fn run_migrations(pool: &SqlitePool) -> anyhow::Result<()> {
    let current_version = get_current_version(pool).await?;

    tracing::info!(
        current_version = current_version,
        target_version = CURRENT_VERSION,
        "Checking database migrations"
    );

    if current_version >= CURRENT_VERSION {
        tracing::debug!("Database is up to date");
        return Ok(());
    }

    if current_version < 1 {
        tracing::info!("Applying migration v1: Initial schema");
        sqlx::raw_sql(MIGRATION_V1).execute(pool).await?;
        record_migration(pool, 1).await?;
    }

    if current_version < 2 {
        tracing::info!("Applying migration v2: Lifecycle vocabulary and extended metadata");
        sqlx::raw_sql(MIGRATION_V2).execute(pool).await?;
        record_migration(pool, 2).await?;
    }

    tracing::info!("Database migrations completed");
    Ok(())
}

/// Check if the database needs migrations
pub async fn needs_migration(pool: &SqlitePool) -> anyhow::Result<bool> {
    let current_version = get_current_version(pool).await?;
    Ok(current_version < CURRENT_VERSION)
}

/// Get migration status information
pub async fn migration_status(pool: &SqlitePool) -> anyhow::Result<MigrationStatus> {
    let current_version = get_current_version(pool).await?;
    Ok(MigrationStatus {
        current_version,
        target_version: CURRENT_VERSION,
        needs_migration: current_version < CURRENT_VERSION,
    })
}

/// Migration status information
#[derive(Debug, Clone)]
pub struct MigrationStatus {
    /// Current schema version in the database
    pub current_version: i32,
    /// Target schema version (latest)
    pub target_version: i32,
    /// Whether migrations need to be run
    pub needs_migration: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn create_test_pool() -> SqlitePool {
        SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("Failed to create test pool")
    }

    #[tokio::test]
    async fn test_run_migrations() {
        let pool = create_test_pool().await;

        // Should start with no migrations
        let status = migration_status(&pool).await.unwrap();
        assert_eq!(status.current_version, 0);
        assert!(status.needs_migration);

        // Run migrations
        run_migrations(&pool).await.unwrap();

        // Should be at current version
        let status = migration_status(&pool).await.unwrap();
        assert_eq!(status.current_version, CURRENT_VERSION);
        assert!(!status.needs_migration);
    }

    #[tokio::test]
    async fn test_migrations_idempotent() {
        let pool = create_test_pool().await;

        // Run migrations twice
        run_migrations(&pool).await.unwrap();
        run_migrations(&pool).await.unwrap();

        let status = migration_status(&pool).await.unwrap();
        assert_eq!(status.current_version, CURRENT_VERSION);
    }

    #[tokio::test]
    async fn test_tables_created() {
        let pool = create_test_pool().await;
        run_migrations(&pool).await.unwrap();

        let tables = vec![
            "feature_status",
            "feature_meta",
            "feature_history",
            "domains",
            "domain_features",
            "domain_builds",
        ];

        for table in tables {
            let result: (i32,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM {}", table))
                .fetch_one(&pool)
                .await
                .unwrap_or_else(|_| panic!("Table {} should exist", table));
            assert_eq!(result.0, 0, "Table {} should be empty", table);
        }
    }

    #[tokio::test]
    async fn test_v2_normalizes_legacy_status_rows() {
        let pool = create_test_pool().await;

        // Apply only v1 and seed rows with the historical vocabulary
        sqlx::raw_sql(CREATE_MIGRATIONS_TABLE).execute(&pool).await.unwrap();
        sqlx::raw_sql(MIGRATION_V1).execute(&pool).await.unwrap();
        record_migration(&pool, 1).await.unwrap();

        for (key, status) in [
            ("xss-protection", "available"),
            ("sql-injection-guard", "in_progress"),
            ("csrf-guard", "testing"),
            ("rate-limiter", "implemented"),
        ] {
            sqlx::query("INSERT INTO feature_status (feature_key, status) VALUES (?, ?)")
                .bind(key)
                .bind(status)
                .execute(&pool)
                .await
                .unwrap();
        }

        run_migrations(&pool).await.unwrap();

        let expected = [
            ("xss-protection", "Draft"),
            ("sql-injection-guard", "Develop"),
            ("csrf-guard", "Test"),
            ("rate-limiter", "Release"),
        ];
        for (key, status) in expected {
            let (got,): (String,) =
                sqlx::query_as("SELECT status FROM feature_status WHERE feature_key = ?")
                    .bind(key)
                    .fetch_one(&pool)
                    .await
                    .unwrap();
            assert_eq!(got, status, "status for {} should be normalized", key);
        }
    }

    #[tokio::test]
    async fn test_v2_meta_columns_exist() {
        let pool = create_test_pool().await;
        run_migrations(&pool).await.unwrap();

        sqlx::query(
            "INSERT INTO feature_meta (feature_key, is_enforced, wireframe_url, generated_schema)
             VALUES (?, 1, ?, ?)",
        )
        .bind("xss-protection")
        .bind("https://example.com/wireframe.png")
        .bind(r#"{"controls":[]}"#)
        .execute(&pool)
        .await
        .expect("Extended meta columns should exist");
    }
}
