use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "videos")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub title: String,

    /// Server generated name of the file inside the upload directory
    #[sea_orm(unique)]
    pub filename: String,

    pub is_public: bool,

    pub uploader_id: i32,

    pub created_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UploaderId",
        to = "super::users::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Uploader,

    #[sea_orm(has_many = "super::share_tokens::Entity")]
    ShareTokens,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Uploader.def()
    }
}

impl Related<super::share_tokens::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ShareTokens.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
