use std::collections::BTreeMap;

use botcomod_shared::user::{
    AddApartmentV2, AdminConfirmedAddApartmentV2, AdminDeclinedAddApartmentV2,
    ConfirmRegistration, DomainEvent, FailRegistration, RegisterCarLicensePlate,
    StartRegistration,
};
use serde::{Serialize, Serializer};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Apartment {
    pub house_number: String,
    pub house_id: i64,
    pub apartment_number: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Car {
    pub license_plate: String,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PropertyKey {
    pub house_id: i64,
    pub apartment: String,
}

impl PropertyKey {
    pub fn new(house_id: i64, apartment: impl Into<String>) -> Self {
        Self {
            house_id,
            apartment: apartment.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Property {
    pub house_id: i64,
    pub apartment: String,
    pub approved: bool,
}

/// Apartments a user claims, keyed by `(house id, apartment)`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertySet(BTreeMap<PropertyKey, Property>);

impl PropertySet {
    /// Adds an unapproved entry unless the key is already present.
    pub fn add(&mut self, key: PropertyKey) {
        self.0.entry(key.clone()).or_insert(Property {
            house_id: key.house_id,
            apartment: key.apartment,
            approved: false,
        });
    }

    pub fn approve(&mut self, key: &PropertyKey) {
        if let Some(property) = self.0.get_mut(key) {
            property.approved = true;
        }
    }

    pub fn remove_if_not_approved(&mut self, key: &PropertyKey) {
        if self.0.get(key).is_some_and(|property| !property.approved) {
            self.0.remove(key);
        }
    }

    pub fn get(&self, key: &PropertyKey) -> Option<&Property> {
        self.0.get(key)
    }

    pub fn contains(&self, key: &PropertyKey) -> bool {
        self.0.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Property> {
        self.0.values()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn has_unapproved(&self) -> bool {
        self.0.values().any(|property| !property.approved)
    }
}

impl Serialize for PropertySet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.0.values())
    }
}

/// Everything known about a user, rebuilt from their event history on every read.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: i64,
    pub username: Option<String>,
    pub apartments: Vec<Apartment>,
    pub cars: Vec<Car>,
    pub is_approved_resident: bool,
    pub registration: Option<StartRegistration>,
    pub private_property: PropertySet,
}

impl User {
    pub fn new(id: i64) -> Self {
        Self {
            id,
            ..Default::default()
        }
    }

    pub fn replay<'a>(id: i64, events: impl IntoIterator<Item = &'a DomainEvent>) -> Self {
        let mut user = Self::new(id);
        for event in events {
            user.apply(event);
        }

        user
    }

    pub fn apply(&mut self, event: &DomainEvent) {
        match event {
            DomainEvent::StartRegistration(event) => event.apply(self),
            DomainEvent::ConfirmRegistration(event) => event.apply(self),
            DomainEvent::FailRegistration(event) => event.apply(self),
            DomainEvent::RegisterCarLicensePlate(event) => event.apply(self),
            DomainEvent::AddApartmentV2(event) => event.apply(self),
            DomainEvent::AdminConfirmedAddApartmentV2(event) => event.apply(self),
            DomainEvent::AdminDeclinedAddApartmentV2(event) => event.apply(self),
        }
    }

    pub fn pending_registration(&self) -> Option<&StartRegistration> {
        self.registration.as_ref()
    }

    pub fn is_resident(&self) -> bool {
        self.is_approved_resident || self.private_property.iter().any(|p| p.approved)
    }

    pub fn owns_plate(&self, plate: &str) -> bool {
        self.cars.iter().any(|car| car.license_plate == plate)
    }

    pub fn lives_in(&self, house_id: i64, house_number: &str, apartment: &str) -> bool {
        let in_legacy = self
            .apartments
            .iter()
            .any(|a| a.house_number == house_number && a.apartment_number == apartment);

        in_legacy
            || self
                .private_property
                .get(&PropertyKey::new(house_id, apartment))
                .is_some_and(|p| p.approved)
    }

    pub fn mention(&self) -> String {
        match &self.username {
            Some(username) => format!("@{username}"),
            None => format!("id{}", self.id),
        }
    }
}

pub trait Apply {
    fn apply(&self, user: &mut User);
}

impl Apply for StartRegistration {
    fn apply(&self, user: &mut User) {
        user.registration = Some(self.clone());
        user.private_property
            .add(PropertyKey::new(self.house_id, self.apartment.clone()));
    }
}

impl Apply for ConfirmRegistration {
    fn apply(&self, user: &mut User) {
        let Some(registration) = user.registration.take() else {
            return;
        };

        user.private_property.approve(&PropertyKey::new(
            registration.house_id,
            registration.apartment.clone(),
        ));
        user.apartments.push(Apartment {
            house_number: registration.house_number,
            house_id: registration.house_id,
            apartment_number: registration.apartment,
        });
        user.is_approved_resident = true;
    }
}

impl Apply for FailRegistration {
    fn apply(&self, user: &mut User) {
        let Some(registration) = user.registration.take() else {
            return;
        };

        user.private_property.remove_if_not_approved(&PropertyKey::new(
            registration.house_id,
            registration.apartment,
        ));
    }
}

impl Apply for RegisterCarLicensePlate {
    fn apply(&self, user: &mut User) {
        if user.owns_plate(&self.license_plate) {
            return;
        }

        user.cars.push(Car {
            license_plate: self.license_plate.clone(),
        });
    }
}

impl Apply for AddApartmentV2 {
    fn apply(&self, user: &mut User) {
        user.private_property
            .add(PropertyKey::new(self.house_id, self.apartment.clone()));
    }
}

impl Apply for AdminConfirmedAddApartmentV2 {
    fn apply(&self, user: &mut User) {
        user.private_property
            .approve(&PropertyKey::new(self.house_id, self.apartment.clone()));
    }
}

impl Apply for AdminDeclinedAddApartmentV2 {
    fn apply(&self, user: &mut User) {
        user.private_property
            .remove_if_not_approved(&PropertyKey::new(self.house_id, self.apartment.clone()));
    }
}
