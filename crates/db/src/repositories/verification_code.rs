//! Verification code repository.

use std::sync::Arc;

use super::db_err;
use crate::entities::{VerificationCode, verification_code};
use chrono::{DateTime, Utc};
use platebook_common::AppResult;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    sea_query::Expr,
};

/// Verification code repository for database operations.
#[derive(Clone)]
pub struct VerificationCodeRepository {
    db: Arc<DatabaseConnection>,
}

impl VerificationCodeRepository {
    /// Create a new verification code repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Store a freshly issued code.
    pub async fn create(
        &self,
        model: verification_code::ActiveModel,
    ) -> AppResult<verification_code::Model> {
        model.insert(self.db.as_ref()).await.map_err(db_err)
    }

    /// Latest unconsumed, unexpired code matching `email` and `code`.
    pub async fn find_valid(
        &self,
        email: &str,
        code: &str,
        now: DateTime<Utc>,
    ) -> AppResult<Option<verification_code::Model>> {
        VerificationCode::find()
            .filter(verification_code::Column::Email.eq(email.to_lowercase()))
            .filter(verification_code::Column::Code.eq(code))
            .filter(verification_code::Column::Consumed.eq(false))
            .filter(verification_code::Column::ExpiresAt.gt(now))
            .order_by_desc(verification_code::Column::CreatedAt)
            .one(self.db.as_ref())
            .await
            .map_err(db_err)
    }

    /// Mark a code as used. Returns false if it was already consumed.
    pub async fn consume(&self, id: &str) -> AppResult<bool> {
        let result = VerificationCode::update_many()
            .col_expr(verification_code::Column::Consumed, Expr::value(true))
            .filter(verification_code::Column::Id.eq(id))
            .filter(verification_code::Column::Consumed.eq(false))
            .exec(self.db.as_ref())
            .await
            .map_err(db_err)?;
        Ok(result.rows_affected > 0)
    }

    /// Drop codes that expired before `now`.
    pub async fn delete_expired(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let result = VerificationCode::delete_many()
            .filter(verification_code::Column::ExpiresAt.lte(now))
            .exec(self.db.as_ref())
            .await
            .map_err(db_err)?;
        Ok(result.rows_affected)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    #[tokio::test]
    async fn test_find_valid_none() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<verification_code::Model>::new()])
                .into_connection(),
        );

        let repo = VerificationCodeRepository::new(db);
        let found = repo
            .find_valid("a@example.com", "123456", Utc::now())
            .await
            .unwrap();

        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_consume_twice() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([
                    MockExecResult {
                        last_insert_id: 0,
                        rows_affected: 1,
                    },
                    MockExecResult {
                        last_insert_id: 0,
                        rows_affected: 0,
                    },
                ])
                .into_connection(),
        );

        let repo = VerificationCodeRepository::new(db);
        assert!(repo.consume("c1").await.unwrap());
        assert!(!repo.consume("c1").await.unwrap());
    }
}
