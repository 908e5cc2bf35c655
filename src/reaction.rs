//! Likes and bookmarks: `(user_id, pin_id)` rows linking a user to a pin.

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::{Pin, Result, Store};

pub trait PinLink: Sized {
    /// Store key holding the rows.
    const KEY: &'static str;

    fn link(user_id: Uuid, pin_id: Uuid) -> Self;
    fn user_id(&self) -> Uuid;
    fn pin_id(&self) -> Uuid;
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Like {
    pub user_id: Uuid,
    pub pin_id: Uuid,
}

impl PinLink for Like {
    const KEY: &'static str = "likes";

    fn link(user_id: Uuid, pin_id: Uuid) -> Self {
        Like { user_id, pin_id }
    }

    fn user_id(&self) -> Uuid {
        self.user_id
    }

    fn pin_id(&self) -> Uuid {
        self.pin_id
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bookmark {
    pub user_id: Uuid,
    pub pin_id: Uuid,
}

impl PinLink for Bookmark {
    const KEY: &'static str = "bookmarks";

    fn link(user_id: Uuid, pin_id: Uuid) -> Self {
        Bookmark { user_id, pin_id }
    }

    fn user_id(&self) -> Uuid {
        self.user_id
    }

    fn pin_id(&self) -> Uuid {
        self.pin_id
    }
}

pub fn contains<T: PinLink>(rows: &[T], user_id: Uuid, pin_id: Uuid) -> bool {
    rows.iter().any(|r| r.user_id() == user_id && r.pin_id() == pin_id)
}

/// Adds the row if missing, removes it otherwise. Returns whether it is now
/// present.
pub fn toggle<T: PinLink>(rows: &mut Vec<T>, user_id: Uuid, pin_id: Uuid) -> bool {
    if contains(rows, user_id, pin_id) {
        rows.retain(|r| !(r.user_id() == user_id && r.pin_id() == pin_id));
        debug!(key = T::KEY, %user_id, %pin_id, "row removed");
        false
    } else {
        rows.push(T::link(user_id, pin_id));
        debug!(key = T::KEY, %user_id, %pin_id, "row added");
        true
    }
}

pub fn count_for_pin<T: PinLink>(rows: &[T], pin_id: Uuid) -> usize {
    rows.iter().filter(|r| r.pin_id() == pin_id).count()
}

/// Drops every row pointing at a deleted pin.
pub fn forget_pin<T: PinLink>(rows: &mut Vec<T>, pin_id: Uuid) {
    rows.retain(|r| r.pin_id() != pin_id);
}

/// Pins bookmarked by `user_id`, in bookmark order. Bookmarks of pins that
/// no longer exist are skipped.
pub fn bookmarked_pins<'a>(bookmarks: &[Bookmark], pins: &'a [Pin], user_id: Uuid) -> Vec<&'a Pin> {
    bookmarks
        .iter()
        .filter(|b| b.user_id == user_id)
        .filter_map(|b| pins.iter().find(|p| p.id == b.pin_id))
        .collect()
}

pub fn load<T: PinLink + DeserializeOwned>(store: &Store) -> Result<Vec<T>> {
    Ok(store.read(T::KEY)?.unwrap_or_default())
}

pub fn save<T: PinLink + Serialize>(store: &Store, rows: &[T]) -> Result<()> {
    store.write(T::KEY, &rows)
}
