//! Migration: Create the role_user join table.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(RoleUser::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(RoleUser::RoleId).integer().not_null())
                    .col(ColumnDef::new(RoleUser::UserId).integer().not_null())
                    .primary_key(
                        Index::create()
                            .name("pk_role_user")
                            .col(RoleUser::RoleId)
                            .col(RoleUser::UserId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_role_user_role_id")
                            .from(RoleUser::Table, RoleUser::RoleId)
                            .to(Roles::Table, Roles::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_role_user_user_id")
                            .from(RoleUser::Table, RoleUser::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Lookups by user dominate; the primary key already covers role_id
        manager
            .create_index(
                Index::create()
                    .name("idx_role_user_user_id")
                    .table(RoleUser::Table)
                    .col(RoleUser::UserId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(RoleUser::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum RoleUser {
    Table,
    RoleId,
    UserId,
}

#[derive(Iden)]
enum Roles {
    Table,
    Id,
}

#[derive(Iden)]
enum Users {
    Table,
    Id,
}
