//! Two-state holder for sub-resources the server only sends on request

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A value that is either known locally or still on the server
///
/// The state is part of the type so an accessor that fetches on first use
/// has to take `&mut` on the owner. On the wire `NotFetched` is `null`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lazy<T> {
    NotFetched,
    Fetched(T),
}

impl<T> Default for Lazy<T> {
    fn default() -> Self {
        Self::NotFetched
    }
}

impl<T> Lazy<T> {
    pub const fn is_fetched(&self) -> bool {
        matches!(self, Self::Fetched(_))
    }

    pub const fn get(&self) -> Option<&T> {
        match self {
            Self::Fetched(value) => Some(value),
            Self::NotFetched => None,
        }
    }

    pub fn get_mut(&mut self) -> Option<&mut T> {
        match self {
            Self::Fetched(value) => Some(value),
            Self::NotFetched => None,
        }
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            Self::Fetched(value) => Some(value),
            Self::NotFetched => None,
        }
    }

    /// Store a fetched value, replacing any previous one
    pub fn set(&mut self, value: T) {
        *self = Self::Fetched(value);
    }
}

impl<T> From<Option<T>> for Lazy<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::NotFetched, Self::Fetched)
    }
}

impl<T: Serialize> Serialize for Lazy<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.get().serialize(serializer)
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Lazy<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Option::<T>::deserialize(deserializer).map(Self::from)
    }
}
