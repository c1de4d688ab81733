use botcomod_shared::user::RegisterCarLicensePlate;

use crate::plate;

impl super::Command<'_> {
    /// Normalizes and stores a plate. Registering the same plate twice is harmless.
    pub async fn register_car_license_plate(
        &mut self,
        user_id: i64,
        update_id: i64,
        license_plate: &str,
    ) -> botcomod_shared::Result<String> {
        let license_plate = plate::normalize(license_plate);
        if !plate::is_complete(&license_plate) {
            botcomod_shared::user!("incomplete license plate {}", license_plate);
        }

        self.append(
            user_id,
            RegisterCarLicensePlate {
                update_id,
                license_plate: license_plate.clone(),
            },
        )
        .await?;

        Ok(license_plate)
    }
}
