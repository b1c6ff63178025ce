use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug)]
pub struct Health {
    pub status: &'static str,
}

/// A post as served by the upstream JSON API.
///
/// Only `title` and `body` are required; identifiers are carried along when
/// present and any other field is ignored.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Post {
    #[serde(rename = "userId", default)]
    pub user_id: Option<u32>,
    #[serde(default)]
    pub id: Option<u32>,
    pub title: String,
    pub body: String,
}
