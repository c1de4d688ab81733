use botcomod_shared::user::{AddApartmentV2, AdminConfirmedAddApartmentV2, AdminDeclinedAddApartmentV2};
use validator::Validate;

use crate::{PropertyKey, generate_approve_codes};

#[derive(Validate)]
pub struct AddApartmentInput {
    pub user_id: i64,
    pub update_id: i64,
    pub house_id: i64,
    #[validate(length(min = 1, max = 8, message = "apartment must be 1 to 8 characters"))]
    pub apartment: String,
}

impl super::Command<'_> {
    pub async fn add_apartment(
        &mut self,
        input: AddApartmentInput,
    ) -> botcomod_shared::Result<String> {
        let input = AddApartmentInput {
            apartment: input.apartment.trim().to_owned(),
            ..input
        };
        input.validate()?;
        let apartment = input.apartment;

        let user = self.load(input.user_id).await?;
        if user
            .private_property
            .contains(&PropertyKey::new(input.house_id, apartment.clone()))
        {
            botcomod_shared::user!("apartment already added");
        }

        let (approve_code, invalid_codes) = generate_approve_codes();
        self.append(
            input.user_id,
            AddApartmentV2 {
                update_id: input.update_id,
                house_id: input.house_id,
                apartment,
                approve_code: approve_code.clone(),
                invalid_codes,
            },
        )
        .await?;

        Ok(approve_code)
    }

    pub async fn admin_confirm_apartment(
        &mut self,
        user_id: i64,
        admin_user_id: i64,
        house_id: i64,
        apartment: impl Into<String>,
    ) -> botcomod_shared::Result<()> {
        let apartment = apartment.into();
        tracing::info!(user_id, admin_user_id, house_id, apartment = %apartment, "apartment confirmed");

        self.append(
            user_id,
            AdminConfirmedAddApartmentV2 {
                admin_user_id,
                house_id,
                apartment,
            },
        )
        .await
    }

    pub async fn admin_decline_apartment(
        &mut self,
        user_id: i64,
        admin_user_id: i64,
        house_id: i64,
        apartment: impl Into<String>,
        reason: impl Into<String>,
    ) -> botcomod_shared::Result<()> {
        let apartment = apartment.into();
        tracing::info!(user_id, admin_user_id, house_id, apartment = %apartment, "apartment declined");

        self.append(
            user_id,
            AdminDeclinedAddApartmentV2 {
                admin_user_id,
                house_id,
                apartment,
                reason: reason.into(),
            },
        )
        .await
    }
}
