use serde::{Deserialize, Serialize};

/// Entity returned by the testing routes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestingEntity {
    pub id: u32,
    pub name: String,
    pub nickname: Option<String>,
    pub status: Status,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Active,
    Archived,
}
