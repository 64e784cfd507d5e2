//! Email verification codes.

use crate::services::email::EmailService;
use chrono::{Duration, Utc};
use platebook_common::{AppError, AppResult, IdGenerator};
use platebook_db::{entities::verification_code, repositories::VerificationCodeRepository};
use rand::Rng;
use sea_orm::Set;
use serde::Deserialize;
use validator::Validate;

/// Input for requesting a code.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SendCodeInput {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
}

/// Input for checking a code.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct VerifyCodeInput {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,

    #[validate(length(equal = 6, message = "Code must be 6 digits"))]
    pub code: String,
}

/// Issues and checks six-digit email codes.
#[derive(Clone)]
pub struct VerificationService {
    code_repo: VerificationCodeRepository,
    email: EmailService,
    ttl_minutes: i64,
    id_gen: IdGenerator,
}

/// Generate a zero-padded six-digit code.
fn generate_code() -> String {
    format!("{:06}", rand::thread_rng().gen_range(0..1_000_000))
}

impl VerificationService {
    /// Create a new verification service.
    #[must_use]
    pub fn new(code_repo: VerificationCodeRepository, email: EmailService, ttl_minutes: i64) -> Self {
        Self {
            code_repo,
            email,
            ttl_minutes,
            id_gen: IdGenerator::new(),
        }
    }

    /// Store a fresh code and mail it.
    pub async fn send_code(&self, input: SendCodeInput) -> AppResult<()> {
        input.validate()?;
        let email = input.email.trim().to_lowercase();
        let now = Utc::now();
        let code = generate_code();

        self.code_repo
            .create(verification_code::ActiveModel {
                id: Set(self.id_gen.generate()),
                email: Set(email.clone()),
                code: Set(code.clone()),
                expires_at: Set((now + Duration::minutes(self.ttl_minutes)).into()),
                consumed: Set(false),
                created_at: Set(now.into()),
            })
            .await?;

        self.email
            .send_verification_code(&email, &code, self.ttl_minutes)
            .await
    }

    /// Consume a matching, unexpired code.
    pub async fn verify_code(&self, input: VerifyCodeInput) -> AppResult<()> {
        input.validate()?;
        let email = input.email.trim().to_lowercase();

        let found = self
            .code_repo
            .find_valid(&email, input.code.trim(), Utc::now())
            .await?
            .ok_or_else(|| AppError::invalid_field("code", "Invalid or expired code"))?;

        if !self.code_repo.consume(&found.id).await? {
            return Err(AppError::invalid_field("code", "Invalid or expired code"));
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use platebook_common::config::EmailConfig;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use std::sync::Arc;

    fn stored_code() -> verification_code::Model {
        verification_code::Model {
            id: "c1".to_string(),
            email: "a@example.com".to_string(),
            code: "042042".to_string(),
            expires_at: (Utc::now() + Duration::minutes(5)).into(),
            consumed: false,
            created_at: Utc::now().into(),
        }
    }

    fn service(db: MockDatabase) -> VerificationService {
        VerificationService::new(
            VerificationCodeRepository::new(Arc::new(db.into_connection())),
            EmailService::new(&EmailConfig::default()).unwrap(),
            10,
        )
    }

    #[test]
    fn test_generate_code_is_six_digits() {
        for _ in 0..50 {
            let code = generate_code();
            assert_eq!(code.len(), 6);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[tokio::test]
    async fn test_send_code_stores_row() {
        let svc = service(
            MockDatabase::new(DatabaseBackend::Postgres).append_query_results([[stored_code()]]),
        );
        let result = svc
            .send_code(SendCodeInput {
                email: "A@Example.com".to_string(),
            })
            .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_send_code_rejects_bad_email() {
        let svc = service(MockDatabase::new(DatabaseBackend::Postgres));
        let result = svc
            .send_code(SendCodeInput {
                email: "nope".to_string(),
            })
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_verify_code_consumes() {
        let svc = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[stored_code()]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }]),
        );
        let result = svc
            .verify_code(VerifyCodeInput {
                email: "a@example.com".to_string(),
                code: "042042".to_string(),
            })
            .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_verify_wrong_code_fails() {
        let svc = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<verification_code::Model>::new()]),
        );
        let result = svc
            .verify_code(VerifyCodeInput {
                email: "a@example.com".to_string(),
                code: "999999".to_string(),
            })
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }
}
