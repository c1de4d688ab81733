use botcomod_shared::user::{ConfirmRegistration, FailRegistration, StartRegistration};
use validator::Validate;

use crate::generate_approve_codes;

#[derive(Validate)]
pub struct StartRegistrationInput {
    pub user_id: i64,
    pub update_id: i64,
    pub house_id: i64,
    #[validate(length(min = 1, max = 32, message = "house number must be 1 to 32 characters"))]
    pub house_number: String,
    #[validate(length(min = 1, max = 8, message = "apartment must be 1 to 8 characters"))]
    pub apartment: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApproveOutcome {
    NoPendingRegistration,
    Confirmed,
    Failed,
}

impl super::Command<'_> {
    /// Opens a registration and returns the approve code that must come back to confirm it.
    pub async fn start_registration(
        &mut self,
        input: StartRegistrationInput,
    ) -> botcomod_shared::Result<String> {
        let input = StartRegistrationInput {
            house_number: input.house_number.trim().to_owned(),
            apartment: input.apartment.trim().to_owned(),
            ..input
        };
        input.validate()?;

        let user = self.load(input.user_id).await?;
        if user.pending_registration().is_some() {
            botcomod_shared::user!("registration already started");
        }

        let (approve_code, invalid_codes) = generate_approve_codes();
        self.append(
            input.user_id,
            StartRegistration {
                update_id: input.update_id,
                house_number: input.house_number,
                house_id: input.house_id,
                apartment: input.apartment,
                approve_code: approve_code.clone(),
                invalid_codes,
            },
        )
        .await?;

        tracing::info!(user_id = input.user_id, "registration started");

        Ok(approve_code)
    }

    pub async fn confirm_registration(
        &mut self,
        user_id: i64,
        update_id: i64,
        with_code: impl Into<String>,
    ) -> botcomod_shared::Result<()> {
        self.append(
            user_id,
            ConfirmRegistration {
                update_id,
                with_code: with_code.into(),
            },
        )
        .await
    }

    pub async fn fail_registration(
        &mut self,
        user_id: i64,
        update_id: i64,
        with_code: impl Into<String>,
    ) -> botcomod_shared::Result<()> {
        self.append(
            user_id,
            FailRegistration {
                update_id,
                with_code: with_code.into(),
            },
        )
        .await
    }

    /// Confirms the pending registration when `code` matches, fails it otherwise.
    pub async fn check_approve_code(
        &mut self,
        user_id: i64,
        update_id: i64,
        code: &str,
    ) -> botcomod_shared::Result<ApproveOutcome> {
        let user = self.load(user_id).await?;
        let Some(registration) = user.pending_registration() else {
            return Ok(ApproveOutcome::NoPendingRegistration);
        };

        let code = code.trim().to_uppercase();
        if registration.approve_code == code {
            self.confirm_registration(user_id, update_id, code).await?;
            return Ok(ApproveOutcome::Confirmed);
        }

        tracing::warn!(user_id, "wrong approve code");
        self.fail_registration(user_id, update_id, code).await?;

        Ok(ApproveOutcome::Failed)
    }
}
