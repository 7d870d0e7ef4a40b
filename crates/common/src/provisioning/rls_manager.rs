//! Row-Level Security policy management
//!
//! Every base table in a tenant schema gets RLS enabled plus four
//! `tenant_isolation_*` policies gated on the `app.current_tenant`
//! session setting. Installing a policy that already exists is a no-op.

use sea_orm::{ConnectionTrait, DatabaseConnection, DbBackend, Statement};
use tracing::{debug, info};

use crate::errors::{Error, Result};

const POLICY_PREDICATE: &str = "tenant_id = current_setting('app.current_tenant', true)::uuid";

#[derive(Clone)]
pub struct RlsManager {
    db: DatabaseConnection,
}

impl RlsManager {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Enable RLS and install the isolation policies on every base table
    /// in the schema. Idempotent: duplicate policies are tolerated.
    pub async fn enable_for_schema(&self, schema: &str) -> Result<()> {
        let tables = self.tables_in_schema(schema).await?;

        info!(schema, tables = tables.len(), "Enabling RLS for schema");

        for table in &tables {
            self.enable_for_table(schema, table).await?;
        }

        info!(schema, "RLS enabled for all tables");
        Ok(())
    }

    async fn enable_for_table(&self, schema: &str, table: &str) -> Result<()> {
        let qualified = format!("{schema}.{table}");

        self.db
            .execute_unprepared(&format!(
                "ALTER TABLE {qualified} ENABLE ROW LEVEL SECURITY"
            ))
            .await?;

        for statement in policy_statements(&qualified) {
            if let Err(e) = self.db.execute_unprepared(&statement).await {
                if is_duplicate_object(&e) {
                    debug!(table = %qualified, "Policy already exists, skipping");
                    continue;
                }
                return Err(Error::Database(e));
            }
        }

        debug!(table = %qualified, "RLS enabled for table");
        Ok(())
    }

    /// Disable RLS on a single table. Maintenance escape hatch.
    pub async fn disable_rls(&self, schema: &str, table: &str) -> Result<()> {
        self.db
            .execute_unprepared(&format!(
                "ALTER TABLE {schema}.{table} DISABLE ROW LEVEL SECURITY"
            ))
            .await?;

        debug!(table = %format!("{schema}.{table}"), "RLS disabled for table");
        Ok(())
    }

    /// Check whether RLS is enabled on a table.
    pub async fn check_rls_enabled(&self, schema: &str, table: &str) -> Result<bool> {
        let row = self
            .db
            .query_one(Statement::from_sql_and_values(
                DbBackend::Postgres,
                "SELECT c.relrowsecurity FROM pg_class c \
                 JOIN pg_namespace n ON n.oid = c.relnamespace \
                 WHERE n.nspname = $1 AND c.relname = $2",
                [schema.into(), table.into()],
            ))
            .await?
            .ok_or(Error::TenantNotFound)?;

        Ok(row.try_get_by_index::<bool>(0)?)
    }

    async fn tables_in_schema(&self, schema: &str) -> Result<Vec<String>> {
        let rows = self
            .db
            .query_all(Statement::from_sql_and_values(
                DbBackend::Postgres,
                "SELECT table_name FROM information_schema.tables \
                 WHERE table_schema = $1 AND table_type = 'BASE TABLE' \
                 ORDER BY table_name",
                [schema.into()],
            ))
            .await?;

        rows.into_iter()
            .map(|row| row.try_get_by_index::<String>(0).map_err(Error::Database))
            .collect()
    }
}

/// The four isolation policies for one table, in install order.
fn policy_statements(qualified_table: &str) -> [String; 4] {
    [
        format!(
            "CREATE POLICY tenant_isolation_select ON {qualified_table} \
             FOR SELECT USING ({POLICY_PREDICATE})"
        ),
        format!(
            "CREATE POLICY tenant_isolation_insert ON {qualified_table} \
             FOR INSERT WITH CHECK ({POLICY_PREDICATE})"
        ),
        format!(
            "CREATE POLICY tenant_isolation_update ON {qualified_table} \
             FOR UPDATE USING ({POLICY_PREDICATE})"
        ),
        format!(
            "CREATE POLICY tenant_isolation_delete ON {qualified_table} \
             FOR DELETE USING ({POLICY_PREDICATE})"
        ),
    ]
}

/// Postgres reports an existing policy as duplicate_object (42710).
fn is_duplicate_object(err: &sea_orm::DbErr) -> bool {
    let text = err.to_string();
    text.contains("42710") || text.contains("already exists")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_statements_cover_all_verbs() {
        let statements = policy_statements("tenant_abc.users");

        assert!(statements[0].contains("tenant_isolation_select"));
        assert!(statements[0].contains("FOR SELECT USING"));
        assert!(statements[1].contains("tenant_isolation_insert"));
        assert!(statements[1].contains("FOR INSERT WITH CHECK"));
        assert!(statements[2].contains("tenant_isolation_update"));
        assert!(statements[3].contains("tenant_isolation_delete"));

        for s in &statements {
            assert!(s.contains("tenant_abc.users"));
            assert!(s.contains("current_setting('app.current_tenant', true)::uuid"));
        }
    }

    #[test]
    fn test_duplicate_object_detection() {
        let err = sea_orm::DbErr::Custom(
            "ERROR: policy \"tenant_isolation_select\" for table \"users\" already exists".into(),
        );
        assert!(is_duplicate_object(&err));

        let err = sea_orm::DbErr::Custom("ERROR: relation \"users\" does not exist".into());
        assert!(!is_duplicate_object(&err));
    }
}
