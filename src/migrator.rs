use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_customers_table::Migration),
            Box::new(m20240101_000002_create_employees_table::Migration),
            Box::new(m20240101_000003_create_deals_table::Migration),
            Box::new(m20240101_000004_create_payments_table::Migration),
            Box::new(m20240101_000005_create_service_contracts_table::Migration),
        ]
    }
}

// Migration implementations

mod m20240101_000001_create_customers_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000001_create_customers_table"
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
                        .col(
                            ColumnDef::new(Customers::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Customers::CompanyId).big_integer().not_null())
                        .col(ColumnDef::new(Customers::Name).string().not_null())
                        .col(ColumnDef::new(Customers::Email).string().null())
                        .col(ColumnDef::new(Customers::Phone).string().null())
                        .col(ColumnDef::new(Customers::Address).string().null())
                        .col(ColumnDef::new(Customers::CreatedAt).timestamp().not_null())
                        .col(ColumnDef::new(Customers::UpdatedAt).timestamp().null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_customers_company_id")
                        .table(Customers::Table)
                        .col(Customers::CompanyId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_customers_name")
                        .table(Customers::Table)
                        .col(Customers::Name)
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
    pub(super) enum Customers {
        Table,
        Id,
        CompanyId,
        Name,
        Email,
        Phone,
        Address,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240101_000002_create_employees_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000002_create_employees_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Employees::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Employees::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Employees::CompanyId).big_integer().not_null())
                        .col(ColumnDef::new(Employees::Name).string().not_null())
                        .col(ColumnDef::new(Employees::Email).string().not_null())
                        .col(ColumnDef::new(Employees::Role).string().null())
                        .col(ColumnDef::new(Employees::CreatedAt).timestamp().not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_employees_company_id")
                        .table(Employees::Table)
                        .col(Employees::CompanyId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Employees::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Employees {
        Table,
        Id,
        CompanyId,
        Name,
        Email,
        Role,
        CreatedAt,
    }
}

mod m20240101_000003_create_deals_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000003_create_deals_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Deals::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Deals::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Deals::DealNumber).string().not_null())
                        .col(ColumnDef::new(Deals::CustomerId).uuid().not_null())
                        .col(ColumnDef::new(Deals::CompanyId).big_integer().not_null())
                        .col(ColumnDef::new(Deals::Requirement).string().null())
                        .col(
                            ColumnDef::new(Deals::DealValue)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Deals::DealApprovalValue)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Deals::AdvancePayment)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Deals::BalanceAmount)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(Deals::CreatedAt).timestamp().not_null())
                        .col(ColumnDef::new(Deals::UpdatedAt).timestamp().null())
                        .to_owned(),
                )
                .await?;

            // Serializes number assignment per customer: concurrent creations
            // that compute the same sequence collide here and retry.
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("ux_deals_customer_id_deal_number")
                        .table(Deals::Table)
                        .col(Deals::CustomerId)
                        .col(Deals::DealNumber)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_deals_company_id")
                        .table(Deals::Table)
                        .col(Deals::CompanyId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_deals_customer_id")
                        .table(Deals::Table)
                        .col(Deals::CustomerId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Deals::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Deals {
        Table,
        Id,
        DealNumber,
        CustomerId,
        CompanyId,
        Requirement,
        DealValue,
        DealApprovalValue,
        AdvancePayment,
        BalanceAmount,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240101_000004_create_payments_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000004_create_payments_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Payments::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Payments::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Payments::DealId).uuid().not_null())
                        .col(ColumnDef::new(Payments::Amount).decimal().not_null())
                        .col(ColumnDef::new(Payments::PaymentDate).timestamp().not_null())
                        .col(ColumnDef::new(Payments::PaymentMethod).string().not_null())
                        .col(ColumnDef::new(Payments::Remarks).string().null())
                        .col(ColumnDef::new(Payments::CreatedById).uuid().null())
                        .col(ColumnDef::new(Payments::CreatedAt).timestamp().not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_payments_deal_id")
                        .table(Payments::Table)
                        .col(Payments::DealId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_payments_payment_date")
                        .table(Payments::Table)
                        .col(Payments::PaymentDate)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Payments::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Payments {
        Table,
        Id,
        DealId,
        Amount,
        PaymentDate,
        PaymentMethod,
        Remarks,
        CreatedById,
        CreatedAt,
    }
}

mod m20240101_000005_create_service_contracts_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000005_create_service_contracts_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(ServiceContracts::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ServiceContracts::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ServiceContracts::CompanyId)
                                .big_integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(ServiceContracts::CustomerId).uuid().not_null())
                        .col(ColumnDef::new(ServiceContracts::Product).string().not_null())
                        .col(ColumnDef::new(ServiceContracts::Amount).decimal().null())
                        .col(ColumnDef::new(ServiceContracts::StartDate).date().not_null())
                        .col(ColumnDef::new(ServiceContracts::EndDate).date().not_null())
                        .col(
                            ColumnDef::new(ServiceContracts::VisitsPlanned)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(ServiceContracts::Notes).string().null())
                        .col(
                            ColumnDef::new(ServiceContracts::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_service_contracts_customer_id")
                        .table(ServiceContracts::Table)
                        .col(ServiceContracts::CustomerId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(ServiceContracts::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum ServiceContracts {
        Table,
        Id,
        CompanyId,
        CustomerId,
        Product,
        Amount,
        StartDate,
        EndDate,
        VisitsPlanned,
        Notes,
        CreatedAt,
    }
}
