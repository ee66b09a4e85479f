use sea_orm_migration::prelude::*;

/// Creates the `file_uploads` table tracking files stored on disk.
#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum FileUploads {
    Table,
    Id,
    UserId,
    WorkspaceId,
    FileName,
    FilePath,
    FileType,
    FileSize,
    MimeType,
    Metadata,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Workspaces {
    Table,
    Id,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(FileUploads::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(FileUploads::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(FileUploads::UserId).uuid().not_null())
                    .col(ColumnDef::new(FileUploads::WorkspaceId).uuid().null())
                    .col(
                        ColumnDef::new(FileUploads::FileName)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(ColumnDef::new(FileUploads::FilePath).text().not_null())
                    .col(ColumnDef::new(FileUploads::FileType).string_len(100).null())
                    .col(ColumnDef::new(FileUploads::FileSize).big_integer().null())
                    .col(ColumnDef::new(FileUploads::MimeType).string_len(100).null())
                    .col(ColumnDef::new(FileUploads::Metadata).json_binary().null())
                    .col(
                        ColumnDef::new(FileUploads::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_file_uploads_user_id")
                            .from(FileUploads::Table, FileUploads::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_file_uploads_workspace_id")
                            .from(FileUploads::Table, FileUploads::WorkspaceId)
                            .to(Workspaces::Table, Workspaces::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(FileUploads::Table).to_owned())
            .await
    }
}
