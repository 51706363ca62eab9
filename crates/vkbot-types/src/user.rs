//! User profile object.

use serde::{Deserialize, Serialize};

/// A user profile as returned by `users.get`.
///
/// The platform returns photos under size-specific keys and places as
/// `{id, title}` objects; both are flattened on the way in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "UserRecord")]
pub struct User {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub screen_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sex: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bdate: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

#[derive(Deserialize)]
struct UserRecord {
    id: i64,
    #[serde(default)]
    first_name: String,
    #[serde(default)]
    last_name: String,
    photo_200: Option<String>,
    photo_100: Option<String>,
    // Accepted so a serialized `User` reads back unchanged.
    photo: Option<String>,
    screen_name: Option<String>,
    sex: Option<u8>,
    bdate: Option<String>,
    city: Option<Place>,
    country: Option<Place>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Place {
    Object { title: String },
    Title(String),
}

impl Place {
    fn into_title(self) -> String {
        match self {
            Place::Object { title } | Place::Title(title) => title,
        }
    }
}

impl From<UserRecord> for User {
    fn from(r: UserRecord) -> Self {
        Self {
            id: r.id,
            first_name: r.first_name,
            last_name: r.last_name,
            photo: r.photo_200.or(r.photo_100).or(r.photo),
            screen_name: r.screen_name,
            sex: r.sex,
            bdate: r.bdate,
            city: r.city.map(Place::into_title),
            country: r.country.map(Place::into_title),
        }
    }
}
