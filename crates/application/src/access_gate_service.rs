use std::sync::Arc;

use async_trait::async_trait;

use rolegate_core::AppResult;
use rolegate_domain::{Denial, QueryKind, Role, Table};

/// A query string plus the acting role, classified at execution time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryRequest {
    /// Role acting on the query.
    pub role: Role,
    /// Statement text to classify and execute.
    pub query: String,
}

/// Outcome of a gated query. Denials are values, not errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryVerdict {
    /// The permission policy refused the query before execution.
    Denied(Denial),
    /// A read query succeeded with a tabular result.
    Rows(Table),
    /// A write query was executed and committed.
    Written(u64),
}

/// Gateway port executing permitted queries against the gated database.
///
/// Implementations open their own connection per call; a failed write must
/// leave its transaction uncommitted.
#[async_trait]
pub trait QueryGateway: Send + Sync {
    /// Executes a read query and returns all rows with their column names.
    async fn run_read(&self, query: &str) -> AppResult<Table>;

    /// Executes a write query, commits, and returns the affected row count.
    async fn run_write(&self, query: &str) -> AppResult<u64>;
}

/// Application service gating query execution behind the role policy.
#[derive(Clone)]
pub struct AccessGateService {
    gateway: Arc<dyn QueryGateway>,
}

impl AccessGateService {
    /// Creates a new access gate from a gateway implementation.
    #[must_use]
    pub fn new(gateway: Arc<dyn QueryGateway>) -> Self {
        Self { gateway }
    }

    /// Evaluates the permission policy for the request and executes it if
    /// allowed.
    ///
    /// Policy order: an unauthorized role is refused before classification;
    /// the statement is then classified by its leading keyword; a write
    /// classification under a read-only role is refused; anything else runs
    /// through the gateway. Execution failures after permission is granted
    /// surface as typed errors, never as denials.
    pub async fn execute(&self, request: &QueryRequest) -> AppResult<QueryVerdict> {
        if !request.role.can_read() {
            return Ok(QueryVerdict::Denied(Denial::UnauthorizedRole));
        }

        match QueryKind::classify(request.query.as_str()) {
            QueryKind::Read => {
                let table = self.gateway.run_read(request.query.as_str()).await?;
                Ok(QueryVerdict::Rows(table))
            }
            QueryKind::Write if !request.role.can_write() => {
                Ok(QueryVerdict::Denied(Denial::ReadOnlyWrite))
            }
            QueryKind::Write => {
                let affected = self.gateway.run_write(request.query.as_str()).await?;
                Ok(QueryVerdict::Written(affected))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use rolegate_core::{AppError, AppResult};
    use rolegate_domain::{Denial, Role, Table};
    use tokio::sync::Mutex;

    use super::{AccessGateService, QueryGateway, QueryRequest, QueryVerdict};

    #[derive(Default)]
    struct FakeQueryGateway {
        reads: Mutex<Vec<String>>,
        writes: Mutex<Vec<String>>,
        fail_execution: bool,
    }

    #[async_trait]
    impl QueryGateway for FakeQueryGateway {
        async fn run_read(&self, query: &str) -> AppResult<Table> {
            if self.fail_execution {
                return Err(AppError::Execution("relation does not exist".to_owned()));
            }
            self.reads.lock().await.push(query.to_owned());
            Ok(Table {
                columns: vec!["id".to_owned()],
                rows: vec![vec!["1".to_owned()]],
            })
        }

        async fn run_write(&self, query: &str) -> AppResult<u64> {
            if self.fail_execution {
                return Err(AppError::Execution("constraint violation".to_owned()));
            }
            self.writes.lock().await.push(query.to_owned());
            Ok(1)
        }
    }

    fn request(role: Role, query: &str) -> QueryRequest {
        QueryRequest {
            role,
            query: query.to_owned(),
        }
    }

    #[tokio::test]
    async fn unauthorized_role_is_denied_before_classification() {
        let gateway = Arc::new(FakeQueryGateway::default());
        let service = AccessGateService::new(gateway.clone());

        let verdict = service
            .execute(&request(Role::Unauthorized, "SELECT * FROM classifier_data"))
            .await;
        assert!(matches!(
            verdict,
            Ok(QueryVerdict::Denied(Denial::UnauthorizedRole))
        ));
        assert!(gateway.reads.lock().await.is_empty());
    }

    #[tokio::test]
    async fn read_only_role_cannot_modify_data() {
        let gateway = Arc::new(FakeQueryGateway::default());
        let service = AccessGateService::new(gateway.clone());

        let verdict = service
            .execute(&request(Role::ReadAccess, "DELETE FROM classifier_data"))
            .await;
        assert!(matches!(
            verdict,
            Ok(QueryVerdict::Denied(Denial::ReadOnlyWrite))
        ));
        assert!(gateway.writes.lock().await.is_empty());
    }

    #[tokio::test]
    async fn read_only_role_may_run_selects() {
        let gateway = Arc::new(FakeQueryGateway::default());
        let service = AccessGateService::new(gateway.clone());

        let verdict = service
            .execute(&request(Role::ReadAccess, "  select id from classifier_data"))
            .await;
        match verdict {
            Ok(QueryVerdict::Rows(table)) => assert_eq!(table.row_count(), 1),
            other => panic!("expected rows, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn select_containing_write_keyword_in_literal_runs_as_read() {
        let gateway = Arc::new(FakeQueryGateway::default());
        let service = AccessGateService::new(gateway.clone());

        let verdict = service
            .execute(&request(
                Role::ReadAccess,
                "SELECT 'INSERT INTO t' AS label FROM classifier_data",
            ))
            .await;
        assert!(matches!(verdict, Ok(QueryVerdict::Rows(_))));
        assert!(gateway.writes.lock().await.is_empty());
    }

    #[tokio::test]
    async fn read_write_role_commits_writes() {
        let gateway = Arc::new(FakeQueryGateway::default());
        let service = AccessGateService::new(gateway.clone());

        let verdict = service
            .execute(&request(
                Role::ReadWriteAccess,
                "INSERT INTO classifier_data (x) VALUES (1)",
            ))
            .await;
        assert!(matches!(verdict, Ok(QueryVerdict::Written(1))));
        assert_eq!(gateway.writes.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn execution_failure_surfaces_as_error_not_denial() {
        let gateway = Arc::new(FakeQueryGateway {
            fail_execution: true,
            ..FakeQueryGateway::default()
        });
        let service = AccessGateService::new(gateway);

        let verdict = service
            .execute(&request(Role::Admin, "SELECT * FROM missing_table"))
            .await;
        assert!(matches!(verdict, Err(AppError::Execution(_))));
    }
}
