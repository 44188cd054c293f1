//! JSON persistence of deduplicator state.
//!
//! The state is embedded in the owning entity's durable record. Empty maps,
//! empty reorder buffers and absent timestamps are omitted, so an idle entity
//! costs `{}`. The owning entity id is not stored; it is supplied on load.

use alloc::string::String;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::{Deduplicator, EntityId, PersistError};

impl<P: Serialize> Deduplicator<P> {
    /// Encode the state as a JSON string.
    ///
    /// # Errors
    ///
    /// [`PersistError::Encode`] if a payload fails to serialize.
    pub fn to_json(&self) -> Result<String, PersistError> {
        serde_json::to_string(self).map_err(PersistError::Encode)
    }

    /// Encode the state as a JSON value, for embedding in a larger record.
    ///
    /// # Errors
    ///
    /// [`PersistError::Encode`] if a payload fails to serialize.
    pub fn to_json_value(&self) -> Result<serde_json::Value, PersistError> {
        serde_json::to_value(self).map_err(PersistError::Encode)
    }
}

impl<P: DeserializeOwned> Deduplicator<P> {
    /// Decode state previously written by [`to_json`](Self::to_json) and
    /// bind it to the entity `id`.
    ///
    /// # Errors
    ///
    /// [`PersistError::Decode`] if `json` is not valid state.
    pub fn from_json(id: impl Into<EntityId>, json: &str) -> Result<Self, PersistError> {
        let mut state: Self = serde_json::from_str(json).map_err(PersistError::Decode)?;
        state.rebind(id);
        Ok(state)
    }

    /// Decode state from a JSON value and bind it to the entity `id`.
    ///
    /// # Errors
    ///
    /// [`PersistError::Decode`] if `value` is not valid state.
    pub fn from_json_value(
        id: impl Into<EntityId>,
        value: serde_json::Value,
    ) -> Result<Self, PersistError> {
        let mut state: Self = serde_json::from_value(value).map_err(PersistError::Decode)?;
        state.rebind(id);
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Message, Timestamp};

    #[test]
    fn idle_state_is_empty_object() {
        let d = Deduplicator::<String>::new("me");
        assert_eq!(d.to_json().unwrap(), "{}");
    }

    #[test]
    fn reload_rebinds_id() {
        let mut d = Deduplicator::new("me");
        d.send(&"x".into(), String::from("op"), Timestamp::from_ticks(5));
        d.receive(Message::from_parts(
            "y",
            Timestamp::from_ticks(9),
            Some(Timestamp::from_ticks(8)),
            String::from("late"),
        ))
        .unwrap();

        let json = d.to_json().unwrap();
        let loaded = Deduplicator::<String>::from_json("me", &json).unwrap();
        assert_eq!(loaded, d);
    }

    #[test]
    fn garbage_is_a_decode_error() {
        let err = Deduplicator::<String>::from_json("me", "[1, 2").unwrap_err();
        assert!(matches!(err, PersistError::Decode(_)));
    }
}
