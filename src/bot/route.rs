use botcomod_shared::callback::Callback;
use strum::{AsRefStr, Display, EnumString};

/// Handler identifiers carried as the `unique` part of button payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "kebab-case")]
pub enum Route {
    Menu,
    Registration,
    AdminApproveRegistration,
    AdminDisapproveRegistration,
    AdminFailRegistration,
    RegisterCar,
    Whois,
    FindResident,
    ContactAllow,
    ContactDeny,
    AddApartment,
    AdminConfirmApartment,
    AdminDeclineApartment,
}

impl Route {
    pub fn callback(self) -> Callback {
        Callback::new(self.as_ref())
    }
}
