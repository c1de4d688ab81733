mod registry;

use serde::{Deserialize, Deserializer, Serialize};

pub use registry::{DecodeError, EventKind, REGISTRY};

/// Stable type tag stored next to every event row.
pub trait UserEvent: Serialize + for<'de> Deserialize<'de> + Default + Into<DomainEvent> {
    const TAG: &'static str;
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StartRegistration {
    #[serde(rename = "UpdateID", default)]
    pub update_id: i64,
    #[serde(default)]
    pub house_number: String,
    #[serde(rename = "HouseID", default)]
    pub house_id: i64,
    #[serde(rename = "Appartment", default)]
    pub apartment: String,
    #[serde(default)]
    pub approve_code: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub invalid_codes: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ConfirmRegistration {
    #[serde(rename = "UpdateID", default)]
    pub update_id: i64,
    #[serde(default)]
    pub with_code: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct FailRegistration {
    #[serde(rename = "UpdateID", default)]
    pub update_id: i64,
    #[serde(default)]
    pub with_code: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RegisterCarLicensePlate {
    #[serde(rename = "UpdateID", default)]
    pub update_id: i64,
    #[serde(default)]
    pub license_plate: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AddApartmentV2 {
    #[serde(rename = "UpdateID", default)]
    pub update_id: i64,
    #[serde(rename = "HouseID", default)]
    pub house_id: i64,
    #[serde(default)]
    pub apartment: String,
    #[serde(default)]
    pub approve_code: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub invalid_codes: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AdminConfirmedAddApartmentV2 {
    #[serde(rename = "AdminUserID", default)]
    pub admin_user_id: i64,
    #[serde(rename = "HouseID", default)]
    pub house_id: i64,
    #[serde(default)]
    pub apartment: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AdminDeclinedAddApartmentV2 {
    #[serde(rename = "AdminUserID", default)]
    pub admin_user_id: i64,
    #[serde(rename = "HouseID", default)]
    pub house_id: i64,
    #[serde(default)]
    pub apartment: String,
    #[serde(default)]
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainEvent {
    StartRegistration(StartRegistration),
    ConfirmRegistration(ConfirmRegistration),
    FailRegistration(FailRegistration),
    RegisterCarLicensePlate(RegisterCarLicensePlate),
    AddApartmentV2(AddApartmentV2),
    AdminConfirmedAddApartmentV2(AdminConfirmedAddApartmentV2),
    AdminDeclinedAddApartmentV2(AdminDeclinedAddApartmentV2),
}

macro_rules! user_events {
    ($($variant:ident => $tag:literal),+ $(,)?) => {
        $(
            impl UserEvent for $variant {
                const TAG: &'static str = $tag;
            }

            impl From<$variant> for DomainEvent {
                fn from(value: $variant) -> Self {
                    Self::$variant(value)
                }
            }
        )+

        impl DomainEvent {
            pub fn tag(&self) -> &'static str {
                match self {
                    $(Self::$variant(_) => $variant::TAG,)+
                }
            }

            pub fn to_json(&self) -> serde_json::Result<String> {
                match self {
                    $(Self::$variant(event) => serde_json::to_string(event),)+
                }
            }
        }
    };
}

user_events! {
    StartRegistration => "*bot.startRegistrationEvent",
    ConfirmRegistration => "*bot.confirmRegistrationEvent",
    FailRegistration => "*bot.failRegistrationEvent",
    RegisterCarLicensePlate => "*bot.registerCarLicensePlateEvent",
    AddApartmentV2 => "AddApartmentEventV2",
    AdminConfirmedAddApartmentV2 => "AdminConfirmedAddApartmentEventV2",
    AdminDeclinedAddApartmentV2 => "AdminDeclinedAddApartmentEventV2",
}

impl DomainEvent {
    /// Looks the tag up in [`REGISTRY`] and decodes the JSON payload into that variant.
    pub fn decode(tag: &str, payload: &str) -> Result<Self, DecodeError> {
        let kind = EventKind::lookup(tag)?;
        kind.decode(payload)
    }
}

/// Payload of the signed deep link that lets a user confirm their own registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApproveToken {
    #[serde(rename = "u")]
    pub user_id: i64,
    #[serde(rename = "c")]
    pub approve_code: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_start_payload_keeps_historical_field_names() {
        let event = StartRegistration {
            update_id: 17,
            house_number: "108Г".to_owned(),
            house_id: 4,
            apartment: "3".to_owned(),
            approve_code: "3A2CX".to_owned(),
            invalid_codes: vec!["AAAAA".to_owned()],
        };

        let json = DomainEvent::from(event.clone()).to_json().unwrap();
        assert!(json.contains("\"Appartment\":\"3\""));
        assert!(json.contains("\"HouseID\":4"));
        assert!(json.contains("\"UpdateID\":17"));

        let decoded = DomainEvent::decode("*bot.startRegistrationEvent", &json).unwrap();
        assert_eq!(decoded, DomainEvent::StartRegistration(event));
    }

    #[test]
    fn null_invalid_codes_decode_as_empty() {
        let json = r#"{"UpdateID":1,"HouseNumber":"1","HouseID":1,"Appartment":"5","ApproveCode":"X","InvalidCodes":null}"#;
        let DomainEvent::StartRegistration(event) =
            DomainEvent::decode("*bot.startRegistrationEvent", json).unwrap()
        else {
            panic!("wrong variant");
        };
        assert!(event.invalid_codes.is_empty());
    }

    #[test]
    fn missing_fields_fall_back_to_zero_values() {
        let event = DomainEvent::decode("*bot.confirmRegistrationEvent", "{}").unwrap();
        assert_eq!(
            event,
            DomainEvent::ConfirmRegistration(ConfirmRegistration::default())
        );
    }

    #[test]
    fn approve_token_uses_short_keys() {
        let json = serde_json::to_string(&ApproveToken {
            user_id: 42,
            approve_code: "3A2CX".to_owned(),
        })
        .unwrap();
        assert_eq!(json, r#"{"u":42,"c":"3A2CX"}"#);
    }
}
