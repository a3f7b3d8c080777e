use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "artist")]
pub struct Model {
    #[sea_orm(primary_key)]
    #[serde(skip_deserializing)]
    pub id: i32,
    pub mbid: Option<String>,
    pub prefix: Option<String>,
    pub name: String,
}

impl Model {
    /// Name including the sort prefix, e.g. "The Beatles".
    pub fn full_name(&self) -> String {
        match self.prefix.as_deref() {
            Some(prefix) if !prefix.is_empty() => format!("{prefix} {}", self.name),
            _ => self.name.clone(),
        }
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    fn artist(prefix: Option<&str>, name: &str) -> Model {
        Model {
            id: 1,
            mbid: None,
            prefix: prefix.map(str::to_string),
            name: name.to_string(),
        }
    }

    #[test]
    fn full_name_joins_prefix() {
        assert_eq!(artist(Some("The"), "Beatles").full_name(), "The Beatles");
        assert_eq!(artist(None, "Can").full_name(), "Can");
        assert_eq!(artist(Some(""), "Can").full_name(), "Can");
    }
}
