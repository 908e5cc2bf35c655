use std::{fmt, fs::File, io::BufReader, path::Path};

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::{Error, GeoPoint, Result};

/// A row of the `pins` table.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Pin {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub title: String,
    pub description: String,
    pub latitude: f64,
    pub longitude: f64,
    pub user_id: Uuid,
}

impl Pin {
    /// Completes an insert payload with the fields the database assigns.
    pub fn from_new(new: NewPin, id: Uuid, created_at: DateTime<Utc>) -> Pin {
        Pin {
            id,
            created_at,
            title: new.title,
            description: new.description,
            latitude: new.latitude,
            longitude: new.longitude,
            user_id: new.user_id,
        }
    }

    pub fn location(&self) -> GeoPoint {
        GeoPoint::new(self.latitude, self.longitude)
    }
}

/// Insert payload for a pin; `id` and `created_at` come from the database.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct NewPin {
    pub title: String,
    pub description: String,
    pub latitude: f64,
    pub longitude: f64,
    pub user_id: Uuid,
}

impl NewPin {
    pub fn at(
        location: GeoPoint,
        title: impl Into<String>,
        description: impl Into<String>,
        user_id: Uuid,
    ) -> NewPin {
        NewPin {
            title: title.into(),
            description: description.into(),
            latitude: location.latitude,
            longitude: location.longitude,
            user_id,
        }
    }
}

/// `HH:MM · DD Mon YY`
pub fn format_timestamp<Tz: TimeZone>(dt: &DateTime<Tz>) -> String
where
    Tz::Offset: fmt::Display,
{
    dt.format("%H:%M · %d %b %y").to_string()
}

/// `DD Mon YY`
pub fn format_day<Tz: TimeZone>(dt: &DateTime<Tz>) -> String
where
    Tz::Offset: fmt::Display,
{
    dt.format("%d %b %y").to_string()
}

/// Reads a JSON array of pin rows, as returned by a `select` on `pins`.
pub fn load_pins(path: &Path) -> Result<Vec<Pin>> {
    let file = File::open(path)?;
    let pins = serde_json::from_reader(BufReader::new(file))?;
    Ok(pins)
}

pub fn save_pins(path: &Path, pins: &[Pin]) -> Result<()> {
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, pins)?;
    Ok(())
}

pub fn find_pin(pins: &[Pin], id: Uuid) -> Result<&Pin> {
    pins.iter()
        .find(|p| p.id == id)
        .ok_or(Error::PinNotFound(id))
}

/// Pins authored by `user_id`, newest first, as listed on a profile.
pub fn pins_of_user(pins: &[Pin], user_id: Uuid) -> Vec<&Pin> {
    let mut mine: Vec<&Pin> = pins.iter().filter(|p| p.user_id == user_id).collect();
    mine.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    mine
}

/// Removes a pin on behalf of `user_id`; only its author may delete it.
pub fn delete_pin(pins: &mut Vec<Pin>, id: Uuid, user_id: Uuid) -> Result<Pin> {
    let index = pins
        .iter()
        .position(|p| p.id == id)
        .ok_or(Error::PinNotFound(id))?;
    if pins[index].user_id != user_id {
        return Err(Error::NotAuthor { pin: id });
    }
    let pin = pins.remove(index);
    info!(pin = %pin.id, "pin deleted");
    Ok(pin)
}
