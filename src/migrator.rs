use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_locations_and_users::Migration),
            Box::new(m20240101_000002_create_customers_table::Migration),
            Box::new(m20240101_000003_create_devices_tables::Migration),
            Box::new(m20240101_000004_create_inventory_tables::Migration),
            Box::new(m20240101_000005_create_sales_tables::Migration),
            Box::new(m20240101_000006_create_appointments_table::Migration),
            Box::new(m20240101_000007_create_finance_tables::Migration),
            Box::new(m20240101_000008_create_loan_tables::Migration),
            Box::new(m20240101_000009_create_notifications_table::Migration),
            Box::new(m20240101_000010_create_sms_tables::Migration),
            Box::new(m20240101_000011_create_settings_table::Migration),
        ]
    }
}

mod m20240101_000001_create_locations_and_users {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000001_create_locations_and_users"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Locations::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Locations::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Locations::Name).string_len(100).not_null())
                        .col(ColumnDef::new(Locations::Address).string().null())
                        .col(ColumnDef::new(Locations::Phone).string_len(20).null())
                        .col(
                            ColumnDef::new(Locations::IsActive)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(Locations::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Locations::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Users::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Users::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Users::FullName).string_len(100).not_null())
                        .col(
                            ColumnDef::new(Users::Email)
                                .string_len(255)
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Users::PasswordHash).string().not_null())
                        .col(ColumnDef::new(Users::Role).string_len(32).not_null())
                        .col(ColumnDef::new(Users::LocationId).uuid().null())
                        .col(ColumnDef::new(Users::Phone).string_len(20).null())
                        .col(
                            ColumnDef::new(Users::IsActive)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(Users::LastLoginAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(Users::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Users::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_users_location_id")
                                .from(Users::Table, Users::LocationId)
                                .to(Locations::Table, Locations::Id)
                                .on_delete(ForeignKeyAction::Restrict)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_users_role")
                        .table(Users::Table)
                        .col(Users::Role)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Users::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Locations::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub enum Locations {
        Table,
        Id,
        Name,
        Address,
        Phone,
        IsActive,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    pub enum Users {
        Table,
        Id,
        FullName,
        Email,
        PasswordHash,
        Role,
        LocationId,
        Phone,
        IsActive,
        LastLoginAt,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240101_000002_create_customers_table {
    use super::m20240101_000001_create_locations_and_users::Locations;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000002_create_customers_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Customers::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Customers::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Customers::FirstName).string_len(100).not_null())
                        .col(ColumnDef::new(Customers::LastName).string_len(100).not_null())
                        .col(
                            ColumnDef::new(Customers::Email)
                                .string_len(255)
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Customers::Phone).string_len(20).not_null())
                        .col(ColumnDef::new(Customers::Address).string().null())
                        .col(ColumnDef::new(Customers::Notes).text().null())
                        .col(ColumnDef::new(Customers::LocationId).uuid().null())
                        .col(
                            ColumnDef::new(Customers::SmsOptIn)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(Customers::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Customers::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_customers_location_id")
                                .from(Customers::Table, Customers::LocationId)
                                .to(Locations::Table, Locations::Id)
                                .on_delete(ForeignKeyAction::Restrict)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_customers_phone")
                        .table(Customers::Table)
                        .col(Customers::Phone)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Customers::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub enum Customers {
        Table,
        Id,
        FirstName,
        LastName,
        Email,
        Phone,
        Address,
        Notes,
        LocationId,
        SmsOptIn,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240101_000003_create_devices_tables {
    use super::m20240101_000001_create_locations_and_users::{Locations, Users};
    use super::m20240101_000002_create_customers_table::Customers;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000003_create_devices_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Devices::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Devices::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Devices::CustomerId).uuid().not_null())
                        .col(ColumnDef::new(Devices::LocationId).uuid().null())
                        .col(ColumnDef::new(Devices::AssignedTo).uuid().null())
                        .col(ColumnDef::new(Devices::DeviceType).string_len(50).not_null())
                        .col(ColumnDef::new(Devices::Brand).string_len(100).not_null())
                        .col(ColumnDef::new(Devices::Model).string_len(100).not_null())
                        .col(ColumnDef::new(Devices::SerialNumber).string_len(100).null())
                        .col(ColumnDef::new(Devices::Imei).string_len(32).null())
                        .col(ColumnDef::new(Devices::PasswordHint).string().null())
                        .col(ColumnDef::new(Devices::Accessories).string().null())
                        .col(ColumnDef::new(Devices::ProblemDescription).text().not_null())
                        .col(ColumnDef::new(Devices::Diagnosis).text().null())
                        .col(ColumnDef::new(Devices::Status).string_len(32).not_null())
                        .col(ColumnDef::new(Devices::Priority).string_len(32).not_null())
                        .col(
                            ColumnDef::new(Devices::TrackingCode)
                                .string_len(32)
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Devices::EstimatedCost).decimal_len(12, 2).null())
                        .col(ColumnDef::new(Devices::FinalCost).decimal_len(12, 2).null())
                        .col(
                            ColumnDef::new(Devices::Deposit)
                                .decimal_len(12, 2)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Devices::EstimatedCompletion)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(Devices::CompletedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(Devices::DeliveredAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(Devices::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Devices::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_devices_customer_id")
                                .from(Devices::Table, Devices::CustomerId)
                                .to(Customers::Table, Customers::Id)
                                .on_delete(ForeignKeyAction::Restrict)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_devices_location_id")
                                .from(Devices::Table, Devices::LocationId)
                                .to(Locations::Table, Locations::Id)
                                .on_delete(ForeignKeyAction::Restrict)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_devices_assigned_to")
                                .from(Devices::Table, Devices::AssignedTo)
                                .to(Users::Table, Users::Id)
                                .on_delete(ForeignKeyAction::SetNull)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_devices_customer_id")
                        .table(Devices::Table)
                        .col(Devices::CustomerId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_devices_status")
                        .table(Devices::Table)
                        .col(Devices::Status)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(DeviceStatusHistory::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(DeviceStatusHistory::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(DeviceStatusHistory::DeviceId).uuid().not_null())
                        .col(
                            ColumnDef::new(DeviceStatusHistory::FromStatus)
                                .string_len(32)
                                .null(),
                        )
                        .col(
                            ColumnDef::new(DeviceStatusHistory::ToStatus)
                                .string_len(32)
                                .not_null(),
                        )
                        .col(ColumnDef::new(DeviceStatusHistory::Note).text().null())
                        .col(ColumnDef::new(DeviceStatusHistory::ChangedBy).uuid().null())
                        .col(
                            ColumnDef::new(DeviceStatusHistory::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_device_status_history_device_id")
                                .from(DeviceStatusHistory::Table, DeviceStatusHistory::DeviceId)
                                .to(Devices::Table, Devices::Id)
                                .on_delete(ForeignKeyAction::Cascade)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_device_status_history_device_id")
                        .table(DeviceStatusHistory::Table)
                        .col(DeviceStatusHistory::DeviceId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(DeviceStatusHistory::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Devices::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub enum Devices {
        Table,
        Id,
        CustomerId,
        LocationId,
        AssignedTo,
        DeviceType,
        Brand,
        Model,
        SerialNumber,
        Imei,
        PasswordHint,
        Accessories,
        ProblemDescription,
        Diagnosis,
        Status,
        Priority,
        TrackingCode,
        EstimatedCost,
        FinalCost,
        Deposit,
        EstimatedCompletion,
        CompletedAt,
        DeliveredAt,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum DeviceStatusHistory {
        Table,
        Id,
        DeviceId,
        FromStatus,
        ToStatus,
        Note,
        ChangedBy,
        CreatedAt,
    }
}

mod m20240101_000004_create_inventory_tables {
    use super::m20240101_000001_create_locations_and_users::Locations;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000004_create_inventory_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(InventoryItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(InventoryItems::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(InventoryItems::Name).string_len(200).not_null())
                        .col(
                            ColumnDef::new(InventoryItems::Sku)
                                .string_len(64)
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(InventoryItems::Category).string_len(100).null())
                        .col(ColumnDef::new(InventoryItems::Description).text().null())
                        .col(
                            ColumnDef::new(InventoryItems::Quantity)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(InventoryItems::ReorderLevel)
                                .integer()
                                .not_null()
                                .default(5),
                        )
                        .col(
                            ColumnDef::new(InventoryItems::ReorderQuantity)
                                .integer()
                                .not_null()
                                .default(10),
                        )
                        .col(
                            ColumnDef::new(InventoryItems::LeadTimeDays)
                                .integer()
                                .not_null()
                                .default(7),
                        )
                        .col(
                            ColumnDef::new(InventoryItems::CostPrice)
                                .decimal_len(12, 2)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(InventoryItems::SellingPrice)
                                .decimal_len(12, 2)
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(InventoryItems::Supplier).string_len(200).null())
                        .col(ColumnDef::new(InventoryItems::LocationId).uuid().null())
                        .col(
                            ColumnDef::new(InventoryItems::IsActive)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(InventoryItems::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryItems::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_inventory_items_location_id")
                                .from(InventoryItems::Table, InventoryItems::LocationId)
                                .to(Locations::Table, Locations::Id)
                                .on_delete(ForeignKeyAction::SetNull)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(StockAdjustments::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(StockAdjustments::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(StockAdjustments::ItemId).uuid().not_null())
                        .col(ColumnDef::new(StockAdjustments::Delta).integer().not_null())
                        .col(
                            ColumnDef::new(StockAdjustments::QuantityAfter)
                                .integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(StockAdjustments::Reason).string().not_null())
                        .col(ColumnDef::new(StockAdjustments::AdjustedBy).uuid().null())
                        .col(
                            ColumnDef::new(StockAdjustments::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_stock_adjustments_item_id")
                                .from(StockAdjustments::Table, StockAdjustments::ItemId)
                                .to(InventoryItems::Table, InventoryItems::Id)
                                .on_delete(ForeignKeyAction::Cascade)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_stock_adjustments_item_id")
                        .table(StockAdjustments::Table)
                        .col(StockAdjustments::ItemId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(StockAdjustments::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(InventoryItems::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub enum InventoryItems {
        Table,
        Id,
        Name,
        Sku,
        Category,
        Description,
        Quantity,
        ReorderLevel,
        ReorderQuantity,
        LeadTimeDays,
        CostPrice,
        SellingPrice,
        Supplier,
        LocationId,
        IsActive,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum StockAdjustments {
        Table,
        Id,
        ItemId,
        Delta,
        QuantityAfter,
        Reason,
        AdjustedBy,
        CreatedAt,
    }
}

mod m20240101_000005_create_sales_tables {
    use super::m20240101_000004_create_inventory_tables::InventoryItems;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000005_create_sales_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Sales::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Sales::Id).uuid().primary_key().not_null())
                        .col(
                            ColumnDef::new(Sales::ReceiptNumber)
                                .string_len(32)
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Sales::CustomerId).uuid().null())
                        .col(ColumnDef::new(Sales::DeviceId).uuid().null())
                        .col(ColumnDef::new(Sales::SoldBy).uuid().null())
                        .col(ColumnDef::new(Sales::LocationId).uuid().null())
                        .col(ColumnDef::new(Sales::Subtotal).decimal_len(12, 2).not_null())
                        .col(
                            ColumnDef::new(Sales::Discount)
                                .decimal_len(12, 2)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Sales::Tax)
                                .decimal_len(12, 2)
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(Sales::Total).decimal_len(12, 2).not_null())
                        .col(ColumnDef::new(Sales::PaymentMethod).string_len(32).not_null())
                        .col(ColumnDef::new(Sales::Notes).text().null())
                        .col(
                            ColumnDef::new(Sales::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_sales_created_at")
                        .table(Sales::Table)
                        .col(Sales::CreatedAt)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(SaleItems::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(SaleItems::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(SaleItems::SaleId).uuid().not_null())
                        .col(ColumnDef::new(SaleItems::InventoryItemId).uuid().null())
                        .col(ColumnDef::new(SaleItems::Description).string().not_null())
                        .col(ColumnDef::new(SaleItems::Quantity).integer().not_null())
                        .col(ColumnDef::new(SaleItems::UnitPrice).decimal_len(12, 2).not_null())
                        .col(ColumnDef::new(SaleItems::Total).decimal_len(12, 2).not_null())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_sale_items_sale_id")
                                .from(SaleItems::Table, SaleItems::SaleId)
                                .to(Sales::Table, Sales::Id)
                                .on_delete(ForeignKeyAction::Cascade)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_sale_items_inventory_item_id")
                                .from(SaleItems::Table, SaleItems::InventoryItemId)
                                .to(InventoryItems::Table, InventoryItems::Id)
                                .on_delete(ForeignKeyAction::Restrict)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_sale_items_inventory_item_id")
                        .table(SaleItems::Table)
                        .col(SaleItems::InventoryItemId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(SaleItems::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Sales::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Sales {
        Table,
        Id,
        ReceiptNumber,
        CustomerId,
        DeviceId,
        SoldBy,
        LocationId,
        Subtotal,
        Discount,
        Tax,
        Total,
        PaymentMethod,
        Notes,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    enum SaleItems {
        Table,
        Id,
        SaleId,
        InventoryItemId,
        Description,
        Quantity,
        UnitPrice,
        Total,
    }
}

mod m20240101_000006_create_appointments_table {
    use super::m20240101_000002_create_customers_table::Customers;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000006_create_appointments_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Appointments::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Appointments::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Appointments::CustomerId).uuid().not_null())
                        .col(ColumnDef::new(Appointments::DeviceId).uuid().null())
                        .col(ColumnDef::new(Appointments::AssignedTo).uuid().null())
                        .col(ColumnDef::new(Appointments::Title).string_len(200).not_null())
                        .col(ColumnDef::new(Appointments::Notes).text().null())
                        .col(
                            ColumnDef::new(Appointments::StartsAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Appointments::EndsAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Appointments::Status).string_len(32).not_null())
                        .col(
                            ColumnDef::new(Appointments::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Appointments::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_appointments_customer_id")
                                .from(Appointments::Table, Appointments::CustomerId)
                                .to(Customers::Table, Customers::Id)
                                .on_delete(ForeignKeyAction::Restrict)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_appointments_starts_at")
                        .table(Appointments::Table)
                        .col(Appointments::StartsAt)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Appointments::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Appointments {
        Table,
        Id,
        CustomerId,
        DeviceId,
        AssignedTo,
        Title,
        Notes,
        StartsAt,
        EndsAt,
        Status,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240101_000007_create_finance_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000007_create_finance_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Expenses::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Expenses::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Expenses::Category).string_len(100).not_null())
                        .col(ColumnDef::new(Expenses::Amount).decimal_len(12, 2).not_null())
                        .col(ColumnDef::new(Expenses::Description).text().null())
                        .col(ColumnDef::new(Expenses::SpentOn).date().not_null())
                        .col(ColumnDef::new(Expenses::LocationId).uuid().null())
                        .col(ColumnDef::new(Expenses::CreatedBy).uuid().null())
                        .col(
                            ColumnDef::new(Expenses::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_expenses_category_spent_on")
                        .table(Expenses::Table)
                        .col(Expenses::Category)
                        .col(Expenses::SpentOn)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Budgets::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Budgets::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Budgets::Category).string_len(100).not_null())
                        .col(ColumnDef::new(Budgets::Amount).decimal_len(12, 2).not_null())
                        .col(ColumnDef::new(Budgets::PeriodStart).date().not_null())
                        .col(ColumnDef::new(Budgets::PeriodEnd).date().not_null())
                        .col(ColumnDef::new(Budgets::LocationId).uuid().null())
                        .col(
                            ColumnDef::new(Budgets::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Budgets::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Expenses::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Expenses {
        Table,
        Id,
        Category,
        Amount,
        Description,
        SpentOn,
        LocationId,
        CreatedBy,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    enum Budgets {
        Table,
        Id,
        Category,
        Amount,
        PeriodStart,
        PeriodEnd,
        LocationId,
        CreatedAt,
    }
}

mod m20240101_000008_create_loan_tables {
    use super::m20240101_000002_create_customers_table::Customers;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000008_create_loan_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(LoanInvoices::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(LoanInvoices::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(LoanInvoices::InvoiceNumber)
                                .string_len(32)
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(LoanInvoices::CustomerId).uuid().not_null())
                        .col(ColumnDef::new(LoanInvoices::DeviceId).uuid().null())
                        .col(ColumnDef::new(LoanInvoices::Amount).decimal_len(12, 2).not_null())
                        .col(
                            ColumnDef::new(LoanInvoices::PaidAmount)
                                .decimal_len(12, 2)
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(LoanInvoices::DueDate).date().not_null())
                        .col(ColumnDef::new(LoanInvoices::Status).string_len(32).not_null())
                        .col(ColumnDef::new(LoanInvoices::Notes).text().null())
                        .col(
                            ColumnDef::new(LoanInvoices::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(LoanInvoices::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_loan_invoices_customer_id")
                                .from(LoanInvoices::Table, LoanInvoices::CustomerId)
                                .to(Customers::Table, Customers::Id)
                                .on_delete(ForeignKeyAction::Restrict)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(LoanPayments::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(LoanPayments::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(LoanPayments::InvoiceId).uuid().not_null())
                        .col(ColumnDef::new(LoanPayments::Amount).decimal_len(12, 2).not_null())
                        .col(ColumnDef::new(LoanPayments::Method).string_len(32).not_null())
                        .col(ColumnDef::new(LoanPayments::Note).text().null())
                        .col(
                            ColumnDef::new(LoanPayments::PaidAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_loan_payments_invoice_id")
                                .from(LoanPayments::Table, LoanPayments::InvoiceId)
                                .to(LoanInvoices::Table, LoanInvoices::Id)
                                .on_delete(ForeignKeyAction::Cascade)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(LoanPayments::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(LoanInvoices::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum LoanInvoices {
        Table,
        Id,
        InvoiceNumber,
        CustomerId,
        DeviceId,
        Amount,
        PaidAmount,
        DueDate,
        Status,
        Notes,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum LoanPayments {
        Table,
        Id,
        InvoiceId,
        Amount,
        Method,
        Note,
        PaidAt,
    }
}

mod m20240101_000009_create_notifications_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000009_create_notifications_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Notifications::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Notifications::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Notifications::UserId).uuid().null())
                        .col(ColumnDef::new(Notifications::Title).string_len(200).not_null())
                        .col(ColumnDef::new(Notifications::Message).text().not_null())
                        .col(ColumnDef::new(Notifications::Kind).string_len(32).not_null())
                        .col(
                            ColumnDef::new(Notifications::IsRead)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(Notifications::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_notifications_user_id")
                        .table(Notifications::Table)
                        .col(Notifications::UserId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Notifications::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Notifications {
        Table,
        Id,
        UserId,
        Title,
        Message,
        Kind,
        IsRead,
        CreatedAt,
    }
}

mod m20240101_000010_create_sms_tables {
    use super::m20240101_000002_create_customers_table::Customers;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000010_create_sms_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(RecipientGroups::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(RecipientGroups::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(RecipientGroups::Name)
                                .string_len(100)
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(RecipientGroups::Description).text().null())
                        .col(
                            ColumnDef::new(RecipientGroups::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(RecipientGroups::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(RecipientGroupMembers::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(RecipientGroupMembers::GroupId).uuid().not_null())
                        .col(
                            ColumnDef::new(RecipientGroupMembers::CustomerId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(RecipientGroupMembers::AddedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .primary_key(
                            Index::create()
                                .col(RecipientGroupMembers::GroupId)
                                .col(RecipientGroupMembers::CustomerId),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_recipient_group_members_group_id")
                                .from(RecipientGroupMembers::Table, RecipientGroupMembers::GroupId)
                                .to(RecipientGroups::Table, RecipientGroups::Id)
                                .on_delete(ForeignKeyAction::Cascade)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_recipient_group_members_customer_id")
                                .from(
                                    RecipientGroupMembers::Table,
                                    RecipientGroupMembers::CustomerId,
                                )
                                .to(Customers::Table, Customers::Id)
                                .on_delete(ForeignKeyAction::Cascade)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(SmsCampaigns::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(SmsCampaigns::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(SmsCampaigns::Name).string_len(200).not_null())
                        .col(ColumnDef::new(SmsCampaigns::MessageTemplate).text().not_null())
                        .col(ColumnDef::new(SmsCampaigns::Status).string_len(32).not_null())
                        .col(ColumnDef::new(SmsCampaigns::RecipientGroupId).uuid().null())
                        .col(
                            ColumnDef::new(SmsCampaigns::TotalRecipients)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(SmsCampaigns::SentCount)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(SmsCampaigns::FailedCount)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(SmsCampaigns::CreatedBy).uuid().null())
                        .col(
                            ColumnDef::new(SmsCampaigns::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(SmsCampaigns::SentAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_sms_campaigns_recipient_group_id")
                                .from(SmsCampaigns::Table, SmsCampaigns::RecipientGroupId)
                                .to(RecipientGroups::Table, RecipientGroups::Id)
                                .on_delete(ForeignKeyAction::SetNull)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(SmsRecipients::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(SmsRecipients::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(SmsRecipients::CampaignId).uuid().null())
                        .col(ColumnDef::new(SmsRecipients::CustomerId).uuid().null())
                        .col(ColumnDef::new(SmsRecipients::Phone).string_len(20).not_null())
                        .col(ColumnDef::new(SmsRecipients::Message).text().not_null())
                        .col(ColumnDef::new(SmsRecipients::Status).string_len(32).not_null())
                        .col(ColumnDef::new(SmsRecipients::ProviderMessageId).string().null())
                        .col(ColumnDef::new(SmsRecipients::Error).text().null())
                        .col(
                            ColumnDef::new(SmsRecipients::SentAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_sms_recipients_campaign_id")
                                .from(SmsRecipients::Table, SmsRecipients::CampaignId)
                                .to(SmsCampaigns::Table, SmsCampaigns::Id)
                                .on_delete(ForeignKeyAction::Cascade)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_sms_recipients_customer_id")
                                .from(SmsRecipients::Table, SmsRecipients::CustomerId)
                                .to(Customers::Table, Customers::Id)
                                .on_delete(ForeignKeyAction::SetNull)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_sms_recipients_campaign_id")
                        .table(SmsRecipients::Table)
                        .col(SmsRecipients::CampaignId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(SmsRecipients::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(SmsCampaigns::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(RecipientGroupMembers::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(RecipientGroups::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum RecipientGroups {
        Table,
        Id,
        Name,
        Description,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum RecipientGroupMembers {
        Table,
        GroupId,
        CustomerId,
        AddedAt,
    }

    #[derive(DeriveIden)]
    enum SmsCampaigns {
        Table,
        Id,
        Name,
        MessageTemplate,
        Status,
        RecipientGroupId,
        TotalRecipients,
        SentCount,
        FailedCount,
        CreatedBy,
        CreatedAt,
        SentAt,
    }

    #[derive(DeriveIden)]
    enum SmsRecipients {
        Table,
        Id,
        CampaignId,
        CustomerId,
        Phone,
        Message,
        Status,
        ProviderMessageId,
        Error,
        SentAt,
    }
}

mod m20240101_000011_create_settings_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000011_create_settings_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Settings::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Settings::Key)
                                .string_len(64)
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Settings::Value).json().not_null())
                        .col(
                            ColumnDef::new(Settings::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Settings::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Settings {
        Table,
        Key,
        Value,
        UpdatedAt,
    }
}
