//! SeaORM Entity for the last observed price of each watched product

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Prices and ids are TEXT columns. SQLite has no decimal or uuid type, so a
/// numeric column would lose the exact scale ("36499.00" would come back as a
/// float). Conversion to `Decimal` and `Uuid` happens in `services::price_storage`.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "product_price_history")]
pub struct Model {
    /// UUID v4, hyphenated
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    #[sea_orm(unique)]
    pub product_url: String,
    /// Exact decimal text, e.g. "36499.00"
    pub last_price: String,
    /// UTC
    pub last_check_time: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
