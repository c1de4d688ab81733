use super::{
    AddApartmentV2, AdminConfirmedAddApartmentV2, AdminDeclinedAddApartmentV2,
    ConfirmRegistration, DomainEvent, FailRegistration, RegisterCarLicensePlate,
    StartRegistration, UserEvent,
};

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("unknown event type `{0}`")]
    UnknownTag(String),

    #[error("malformed `{tag}` payload: {source}")]
    Payload {
        tag: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// One row of the tag registry.
pub struct EventKind {
    pub tag: &'static str,
    zero: fn() -> DomainEvent,
    decode: fn(&str) -> serde_json::Result<DomainEvent>,
}

fn zero<E: UserEvent>() -> DomainEvent {
    E::default().into()
}

fn decode<E: UserEvent>(payload: &str) -> serde_json::Result<DomainEvent> {
    serde_json::from_str::<E>(payload).map(Into::into)
}

macro_rules! kind {
    ($event:ty) => {
        EventKind {
            tag: <$event as UserEvent>::TAG,
            zero: zero::<$event>,
            decode: decode::<$event>,
        }
    };
}

pub static REGISTRY: [EventKind; 7] = [
    kind!(StartRegistration),
    kind!(ConfirmRegistration),
    kind!(FailRegistration),
    kind!(RegisterCarLicensePlate),
    kind!(AddApartmentV2),
    kind!(AdminConfirmedAddApartmentV2),
    kind!(AdminDeclinedAddApartmentV2),
];

impl EventKind {
    pub fn lookup(tag: &str) -> Result<&'static EventKind, DecodeError> {
        REGISTRY
            .iter()
            .find(|kind| kind.tag == tag)
            .ok_or_else(|| DecodeError::UnknownTag(tag.to_owned()))
    }

    pub fn zero(&self) -> DomainEvent {
        (self.zero)()
    }

    pub fn decode(&self, payload: &str) -> Result<DomainEvent, DecodeError> {
        (self.decode)(payload).map_err(|source| DecodeError::Payload {
            tag: self.tag,
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn tags_are_unique() {
        let tags: HashSet<_> = REGISTRY.iter().map(|kind| kind.tag).collect();
        assert_eq!(tags.len(), REGISTRY.len());
    }

    #[test]
    fn zero_value_carries_its_own_tag() {
        for kind in REGISTRY.iter() {
            assert_eq!(kind.zero().tag(), kind.tag);
        }
    }

    #[test]
    fn unknown_tag_is_an_error() {
        let err = DomainEvent::decode("*bot.somethingElse", "{}").unwrap_err();
        assert!(matches!(err, DecodeError::UnknownTag(tag) if tag == "*bot.somethingElse"));
    }

    #[test]
    fn payload_of_wrong_shape_is_an_error() {
        let err = DomainEvent::decode("*bot.registerCarLicensePlateEvent", "[1,2]").unwrap_err();
        assert!(matches!(
            err,
            DecodeError::Payload {
                tag: "*bot.registerCarLicensePlateEvent",
                ..
            }
        ));
    }
}
