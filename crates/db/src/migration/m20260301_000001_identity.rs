//! Identity, role graph, approval and activity tables.
//!
//! Built with the schema builder so the same migration runs on PostgreSQL
//! and on the SQLite databases used by tests.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    #[allow(clippy::too_many_lines)]
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(pk(Users::Id))
                    .col(ColumnDef::new(Users::Username).string_len(100).not_null().unique_key())
                    .col(ColumnDef::new(Users::Name).string_len(255).not_null())
                    .col(ColumnDef::new(Users::Email).string_len(255).null())
                    .col(ColumnDef::new(Users::Password).string().not_null())
                    .col(ColumnDef::new(Users::OtpSecret).string().null())
                    .col(ColumnDef::new(Users::OtpUrl).text().null())
                    .col(ColumnDef::new(Users::RefreshToken).string_len(64).null())
                    .col(ColumnDef::new(Users::SessionId).string_len(64).null())
                    .col(ColumnDef::new(Users::IsActive).boolean().not_null().default(true))
                    .col(
                        ColumnDef::new(Users::IsTwoFactorEnabled)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Users::TwoFactorChallengeExpiresAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(Users::DepartmentId).integer().null())
                    .col(ColumnDef::new(Users::EmployeeId).integer().null())
                    .col(ColumnDef::new(Users::CreatedBy).integer().null())
                    .col(ColumnDef::new(Users::UpdatedBy).integer().null())
                    .col(created_at(Users::CreatedAt))
                    .col(created_at(Users::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(PasswordResets::Table)
                    .if_not_exists()
                    .col(pk(PasswordResets::Id))
                    .col(ColumnDef::new(PasswordResets::UserId).integer().not_null())
                    .col(
                        ColumnDef::new(PasswordResets::Token)
                            .string_len(64)
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(PasswordResets::IsUsed)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(PasswordResets::ExpiresAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(created_at(PasswordResets::CreatedAt))
                    .col(created_at(PasswordResets::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_password_resets_user")
                            .from(PasswordResets::Table, PasswordResets::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_password_resets_user")
                    .table(PasswordResets::Table)
                    .col(PasswordResets::UserId)
                    .col(PasswordResets::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Menus::Table)
                    .if_not_exists()
                    .col(pk(Menus::Id))
                    .col(ColumnDef::new(Menus::Label).string_len(255).not_null())
                    .col(ColumnDef::new(Menus::Path).string_len(255).not_null().unique_key())
                    .col(ColumnDef::new(Menus::ParentId).integer().not_null().default(0))
                    .col(ColumnDef::new(Menus::Sort).integer().not_null().default(0))
                    .col(ColumnDef::new(Menus::Icon).string_len(100).null())
                    .col(ColumnDef::new(Menus::IsDelete).boolean().not_null().default(false))
                    .col(created_at(Menus::CreatedAt))
                    .col(created_at(Menus::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Roles::Table)
                    .if_not_exists()
                    .col(pk(Roles::Id))
                    .col(ColumnDef::new(Roles::Name).string_len(100).not_null().unique_key())
                    .col(ColumnDef::new(Roles::Description).text().null())
                    .col(created_at(Roles::CreatedAt))
                    .col(created_at(Roles::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(RoleMenus::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(RoleMenus::RoleId).integer().not_null())
                    .col(ColumnDef::new(RoleMenus::MenuId).integer().not_null())
                    .primary_key(Index::create().col(RoleMenus::RoleId).col(RoleMenus::MenuId))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_role_menus_role")
                            .from(RoleMenus::Table, RoleMenus::RoleId)
                            .to(Roles::Table, Roles::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_role_menus_menu")
                            .from(RoleMenus::Table, RoleMenus::MenuId)
                            .to(Menus::Table, Menus::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(RolePermissions::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(RolePermissions::RoleId).integer().not_null())
                    .col(ColumnDef::new(RolePermissions::MenuId).integer().not_null())
                    .col(ColumnDef::new(RolePermissions::IsCreate).boolean().not_null().default(false))
                    .col(ColumnDef::new(RolePermissions::IsUpdate).boolean().not_null().default(false))
                    .col(ColumnDef::new(RolePermissions::IsDelete).boolean().not_null().default(false))
                    .primary_key(
                        Index::create()
                            .col(RolePermissions::RoleId)
                            .col(RolePermissions::MenuId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_role_permissions_role")
                            .from(RolePermissions::Table, RolePermissions::RoleId)
                            .to(Roles::Table, Roles::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(UserRoles::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(UserRoles::UserId).integer().not_null())
                    .col(ColumnDef::new(UserRoles::RoleId).integer().not_null())
                    .primary_key(Index::create().col(UserRoles::UserId).col(UserRoles::RoleId))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_user_roles_user")
                            .from(UserRoles::Table, UserRoles::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_user_roles_role")
                            .from(UserRoles::Table, UserRoles::RoleId)
                            .to(Roles::Table, Roles::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ApprovalDefinitions::Table)
                    .if_not_exists()
                    .col(pk(ApprovalDefinitions::Id))
                    .col(ColumnDef::new(ApprovalDefinitions::MenuId).integer().not_null())
                    .col(ColumnDef::new(ApprovalDefinitions::Action).string_len(50).not_null())
                    .col(ColumnDef::new(ApprovalDefinitions::Level).integer().not_null())
                    .col(ColumnDef::new(ApprovalDefinitions::Status).string_len(50).not_null())
                    .col(ColumnDef::new(ApprovalDefinitions::Count).integer().not_null().default(1))
                    .col(ColumnDef::new(ApprovalDefinitions::CreatedBy).integer().null())
                    .col(ColumnDef::new(ApprovalDefinitions::UpdatedBy).integer().null())
                    .col(created_at(ApprovalDefinitions::CreatedAt))
                    .col(created_at(ApprovalDefinitions::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_approval_definitions_menu")
                            .from(ApprovalDefinitions::Table, ApprovalDefinitions::MenuId)
                            .to(Menus::Table, Menus::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uq_approval_definitions_level")
                    .table(ApprovalDefinitions::Table)
                    .col(ApprovalDefinitions::MenuId)
                    .col(ApprovalDefinitions::Action)
                    .col(ApprovalDefinitions::Level)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ApprovalUsers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ApprovalUsers::ApprovalDefinitionId)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ApprovalUsers::UserId).integer().not_null())
                    .primary_key(
                        Index::create()
                            .col(ApprovalUsers::ApprovalDefinitionId)
                            .col(ApprovalUsers::UserId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_approval_users_definition")
                            .from(ApprovalUsers::Table, ApprovalUsers::ApprovalDefinitionId)
                            .to(ApprovalDefinitions::Table, ApprovalDefinitions::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_approval_users_user")
                            .from(ApprovalUsers::Table, ApprovalUsers::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // History outlives chain edits, so no FK to approval_definitions.
        manager
            .create_table(
                Table::create()
                    .table(ApprovalHistories::Table)
                    .if_not_exists()
                    .col(pk(ApprovalHistories::Id))
                    .col(
                        ColumnDef::new(ApprovalHistories::ApprovalDefinitionId)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ApprovalHistories::RefTable).string_len(100).not_null())
                    .col(ColumnDef::new(ApprovalHistories::RefId).integer().not_null())
                    .col(ColumnDef::new(ApprovalHistories::Key).string_len(50).not_null())
                    .col(ColumnDef::new(ApprovalHistories::Message).text().null())
                    .col(ColumnDef::new(ApprovalHistories::CreatedBy).integer().not_null())
                    .col(created_at(ApprovalHistories::CreatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_approval_histories_ref")
                    .table(ApprovalHistories::Table)
                    .col(ApprovalHistories::RefTable)
                    .col(ApprovalHistories::RefId)
                    .col(ApprovalHistories::Key)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ActivityLogs::Table)
                    .if_not_exists()
                    .col(pk(ActivityLogs::Id))
                    .col(ColumnDef::new(ActivityLogs::UserId).integer().null())
                    .col(ColumnDef::new(ActivityLogs::Ip).string_len(45).null())
                    .col(ColumnDef::new(ActivityLogs::Action).string_len(100).not_null())
                    .col(ColumnDef::new(ActivityLogs::IsSuccess).boolean().not_null())
                    .col(ColumnDef::new(ActivityLogs::Message).text().null())
                    .col(ColumnDef::new(ActivityLogs::UserAgent).text().null())
                    .col(ColumnDef::new(ActivityLogs::Os).string_len(50).null())
                    .col(created_at(ActivityLogs::CreatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_activity_logs_user")
                    .table(ActivityLogs::Table)
                    .col(ActivityLogs::UserId)
                    .col(ActivityLogs::CreatedAt)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        drop_table(manager, ActivityLogs::Table).await?;
        drop_table(manager, ApprovalHistories::Table).await?;
        drop_table(manager, ApprovalUsers::Table).await?;
        drop_table(manager, ApprovalDefinitions::Table).await?;
        drop_table(manager, UserRoles::Table).await?;
        drop_table(manager, RolePermissions::Table).await?;
        drop_table(manager, RoleMenus::Table).await?;
        drop_table(manager, Roles::Table).await?;
        drop_table(manager, Menus::Table).await?;
        drop_table(manager, PasswordResets::Table).await?;
        drop_table(manager, Users::Table).await?;
        Ok(())
    }
}

/// Drops a table if present.
pub(super) async fn drop_table<T: IntoTableRef>(
    manager: &SchemaManager<'_>,
    table: T,
) -> Result<(), DbErr> {
    manager
        .drop_table(Table::drop().table(table).if_exists().to_owned())
        .await
}

/// Auto-increment integer primary key.
pub(super) fn pk<T: IntoIden>(name: T) -> ColumnDef {
    ColumnDef::new(name)
        .integer()
        .not_null()
        .auto_increment()
        .primary_key()
        .to_owned()
}

/// Timestamp defaulting to the insert time.
pub(super) fn created_at<T: IntoIden>(name: T) -> ColumnDef {
    ColumnDef::new(name)
        .timestamp_with_time_zone()
        .not_null()
        .default(Expr::current_timestamp())
        .to_owned()
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
    Username,
    Name,
    Email,
    Password,
    OtpSecret,
    OtpUrl,
    RefreshToken,
    SessionId,
    IsActive,
    IsTwoFactorEnabled,
    TwoFactorChallengeExpiresAt,
    DepartmentId,
    EmployeeId,
    CreatedBy,
    UpdatedBy,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum PasswordResets {
    Table,
    Id,
    UserId,
    Token,
    IsUsed,
    ExpiresAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Menus {
    Table,
    Id,
    Label,
    Path,
    ParentId,
    Sort,
    Icon,
    IsDelete,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Roles {
    Table,
    Id,
    Name,
    Description,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum RoleMenus {
    Table,
    RoleId,
    MenuId,
}

#[derive(DeriveIden)]
enum RolePermissions {
    Table,
    RoleId,
    MenuId,
    IsCreate,
    IsUpdate,
    IsDelete,
}

#[derive(DeriveIden)]
enum UserRoles {
    Table,
    UserId,
    RoleId,
}

#[derive(DeriveIden)]
enum ApprovalDefinitions {
    Table,
    Id,
    MenuId,
    Action,
    Level,
    Status,
    Count,
    CreatedBy,
    UpdatedBy,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum ApprovalUsers {
    Table,
    ApprovalDefinitionId,
    UserId,
}

#[derive(DeriveIden)]
enum ApprovalHistories {
    Table,
    Id,
    ApprovalDefinitionId,
    RefTable,
    RefId,
    Key,
    Message,
    CreatedBy,
    CreatedAt,
}

#[derive(DeriveIden)]
enum ActivityLogs {
    Table,
    Id,
    UserId,
    Ip,
    Action,
    IsSuccess,
    Message,
    UserAgent,
    Os,
    CreatedAt,
}
