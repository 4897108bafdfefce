use serde::{Deserialize, Serialize};

use crate::stores::SensitiveFields;

/// Column name of the encrypted identity card number.
pub const ID_CARD_NO: &str = "idCardNo";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Storage-assigned identifier
    pub id: i64,
    pub name: String,
    /// Unique across all users
    pub email: String,
    /// Sensitive, sealed at rest
    pub id_card_no: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub id_card_no: Option<String>,
}

impl NewUser {
    pub fn new(name: impl Into<String>, email: impl Into<String>, id_card_no: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            id_card_no: Some(id_card_no.into()),
        }
    }
}

/// Partial update; `None` leaves the column unchanged.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub id_card_no: Option<String>,
}

impl UserUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none() && self.id_card_no.is_none()
    }
}

impl SensitiveFields for User {
    fn sensitive_fields_mut(&mut self) -> Vec<(&'static str, &mut Option<String>)> {
        vec![(ID_CARD_NO, &mut self.id_card_no)]
    }
}

impl SensitiveFields for NewUser {
    fn sensitive_fields_mut(&mut self) -> Vec<(&'static str, &mut Option<String>)> {
        vec![(ID_CARD_NO, &mut self.id_card_no)]
    }
}

impl SensitiveFields for UserUpdate {
    fn sensitive_fields_mut(&mut self) -> Vec<(&'static str, &mut Option<String>)> {
        vec![(ID_CARD_NO, &mut self.id_card_no)]
    }
}
