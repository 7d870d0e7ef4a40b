//! Schema provisioner: CREATE SCHEMA, per-schema migrations, seeding.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Instant;

use async_trait::async_trait;
use sea_orm::{
    ConnectionTrait, DatabaseConnection, DbBackend, Statement, TransactionTrait,
};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::{Provisioner, RlsManager, SchemaInfo};
use crate::domain::format_schema_name;
use crate::errors::{Error, Result};

/// A migration source file: `<version>.sql` applied in version order.
#[derive(Debug, Clone)]
struct Migration {
    version: String,
    sql: String,
}

pub struct SchemaProvisioner {
    db: DatabaseConnection,
    migrations_path: PathBuf,
    rls: RlsManager,
}

impl SchemaProvisioner {
    pub fn new(db: DatabaseConnection, migrations_path: impl Into<PathBuf>) -> Self {
        let rls = RlsManager::new(db.clone());
        Self {
            db,
            migrations_path: migrations_path.into(),
            rls,
        }
    }

    async fn create_schema(&self, schema: &str) -> Result<()> {
        // Schema names are derived from the tenant UUID (hex only), safe to
        // interpolate.
        self.db
            .execute_unprepared(&format!("CREATE SCHEMA IF NOT EXISTS {schema}"))
            .await?;
        debug!(schema, "Schema created");
        Ok(())
    }

    /// Apply pending migrations, tracking applied versions in
    /// `<schema>.schema_migrations`. Applying twice is a no-op.
    async fn run_migrations(&self, schema: &str) -> Result<()> {
        self.db
            .execute_unprepared(&format!(
                "CREATE TABLE IF NOT EXISTS {schema}.schema_migrations (\
                 version TEXT PRIMARY KEY, \
                 applied_at TIMESTAMPTZ NOT NULL DEFAULT now())"
            ))
            .await?;

        let applied = self.applied_versions(schema).await?;
        let migrations = load_migrations(&self.migrations_path)?;

        let mut ran = 0usize;
        for migration in migrations {
            if applied.contains(&migration.version) {
                continue;
            }

            // Each migration commits on its own; SET LOCAL keeps the
            // search_path from leaking past the transaction.
            let txn = self.db.begin().await?;
            txn.execute_unprepared(&format!("SET LOCAL search_path TO {schema}, public"))
                .await?;
            txn.execute_unprepared(&migration.sql).await?;
            txn.execute(Statement::from_sql_and_values(
                DbBackend::Postgres,
                "INSERT INTO schema_migrations (version) VALUES ($1)",
                [migration.version.clone().into()],
            ))
            .await?;
            txn.commit().await?;

            debug!(schema, version = %migration.version, "Migration applied");
            ran += 1;
        }

        if ran > 0 {
            info!(schema, count = ran, "Migrations completed");
        }
        Ok(())
    }

    async fn applied_versions(&self, schema: &str) -> Result<HashSet<String>> {
        let rows = self
            .db
            .query_all(Statement::from_string(
                DbBackend::Postgres,
                format!("SELECT version FROM {schema}.schema_migrations"),
            ))
            .await?;

        let mut versions = HashSet::with_capacity(rows.len());
        for row in rows {
            versions.insert(row.try_get_by_index::<String>(0)?);
        }
        Ok(versions)
    }

    /// Insert default lookup rows. Failure is logged, never fatal.
    async fn seed_initial_data(&self, schema: &str, tenant_id: Uuid) -> Result<()> {
        let txn = self.db.begin().await?;
        txn.execute_unprepared(&format!("SET LOCAL search_path TO {schema}, public"))
            .await?;
        txn.execute(Statement::from_sql_and_values(
            DbBackend::Postgres,
            "INSERT INTO app_settings (tenant_id, key, value) VALUES \
             ($1, 'default_locale', '\"en-US\"'::jsonb), \
             ($1, 'onboarding_complete', 'false'::jsonb) \
             ON CONFLICT (tenant_id, key) DO NOTHING",
            [tenant_id.into()],
        ))
        .await?;
        txn.commit().await?;

        debug!(schema, "Initial data seeded");
        Ok(())
    }
}

#[async_trait]
impl Provisioner for SchemaProvisioner {
    async fn provision(&self, tenant_id: Uuid) -> Result<()> {
        let schema = format_schema_name(tenant_id);
        let start = Instant::now();

        info!(%tenant_id, schema = %schema, "Starting tenant provisioning");

        self.create_schema(&schema)
            .await
            .map_err(|e| Error::ProvisioningFailed(format!("create schema: {e}")))?;

        self.run_migrations(&schema)
            .await
            .map_err(|e| Error::ProvisioningFailed(format!("migrations: {e}")))?;

        if let Err(e) = self.seed_initial_data(&schema, tenant_id).await {
            warn!(%tenant_id, schema = %schema, error = %e, "Failed to seed initial data");
        }

        self.rls
            .enable_for_schema(&schema)
            .await
            .map_err(|e| Error::ProvisioningFailed(format!("rls: {e}")))?;

        let elapsed = start.elapsed();
        crate::metrics::record_provisioning(elapsed.as_secs_f64());
        info!(
            %tenant_id,
            schema = %schema,
            elapsed_ms = elapsed.as_millis() as u64,
            "Tenant provisioning completed"
        );
        Ok(())
    }

    async fn deprovision(&self, tenant_id: Uuid) -> Result<()> {
        let schema = format_schema_name(tenant_id);

        warn!(%tenant_id, schema = %schema, "Deprovisioning tenant schema");
        self.db
            .execute_unprepared(&format!("DROP SCHEMA IF EXISTS {schema} CASCADE"))
            .await?;

        info!(%tenant_id, schema = %schema, "Tenant schema deprovisioned");
        Ok(())
    }

    async fn schema_exists(&self, tenant_id: Uuid) -> Result<bool> {
        let schema = format_schema_name(tenant_id);

        let row = self
            .db
            .query_one(Statement::from_sql_and_values(
                DbBackend::Postgres,
                "SELECT EXISTS(SELECT 1 FROM information_schema.schemata \
                 WHERE schema_name = $1)",
                [schema.into()],
            ))
            .await?
            .ok_or_else(|| Error::Internal("schema existence query returned no row".into()))?;

        Ok(row.try_get_by_index::<bool>(0)?)
    }

    async fn schema_info(&self, schema_name: &str) -> Result<SchemaInfo> {
        let row = self
            .db
            .query_one(Statement::from_sql_and_values(
                DbBackend::Postgres,
                "SELECT schemaname, \
                 pg_size_pretty(SUM(pg_total_relation_size(\
                 quote_ident(schemaname) || '.' || quote_ident(tablename)))) AS size \
                 FROM pg_tables WHERE schemaname = $1 GROUP BY schemaname",
                [schema_name.into()],
            ))
            .await?
            .ok_or(Error::TenantNotFound)?;

        Ok(SchemaInfo {
            schema_name: row.try_get_by_index::<String>(0)?,
            size: row.try_get_by_index::<String>(1)?,
        })
    }
}

/// Read `*.sql` files from the migrations directory, ordered by filename.
/// The file stem is the recorded version.
fn load_migrations(dir: &Path) -> Result<Vec<Migration>> {
    let entries = std::fs::read_dir(dir).map_err(|e| {
        Error::Configuration(format!("cannot read migrations path {}: {e}", dir.display()))
    })?;

    let mut migrations = Vec::new();
    for entry in entries {
        let path = entry
            .map_err(|e| Error::Configuration(format!("migrations dir entry: {e}")))?
            .path();
        if path.extension().and_then(|e| e.to_str()) != Some("sql") {
            continue;
        }
        let version = path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| {
                Error::Configuration(format!("bad migration filename: {}", path.display()))
            })?
            .to_string();
        let sql = std::fs::read_to_string(&path)
            .map_err(|e| Error::Configuration(format!("read {}: {e}", path.display())))?;
        migrations.push(Migration { version, sql });
    }

    migrations.sort_by(|a, b| a.version.cmp(&b.version));
    Ok(migrations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_migrations_sorted_by_version() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["0002_later.sql", "0001_first.sql", "notes.txt"] {
            let mut f = std::fs::File::create(dir.path().join(name)).unwrap();
            writeln!(f, "SELECT 1;").unwrap();
        }

        let migrations = load_migrations(dir.path()).unwrap();
        let versions: Vec<_> = migrations.iter().map(|m| m.version.as_str()).collect();
        assert_eq!(versions, vec!["0001_first", "0002_later"]);
    }

    #[test]
    fn test_load_migrations_missing_dir_is_config_error() {
        let err = load_migrations(Path::new("/nonexistent/migrations")).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }
}
