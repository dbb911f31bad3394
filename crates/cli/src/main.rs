//! PetBox CLI - Database migrations and catalog management.
//!
//! # Usage
//!
//! ```bash
//! # Run storefront database migrations (including the session table)
//! petbox-cli migrate
//!
//! # Seed products, plan links and coupons from YAML
//! petbox-cli seed crates/cli/seed/catalog.yaml
//!
//! # Manage products and the plan configuration
//! petbox-cli product create "Plano Mensal" --plan monthly --price 49.90
//! petbox-cli plan link --monthly <product-id>
//!
//! # Manage coupons
//! petbox-cli coupon create SAVE10 -t percentage -v 10 --max-uses 100
//! petbox-cli coupon deactivate SAVE10
//! ```
//!
//! # Environment Variables
//!
//! - `STOREFRONT_DATABASE_URL` (or `DATABASE_URL`) - `PostgreSQL` connection string

#![cfg_attr(not(test), forbid(unsafe_code))]

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use rust_decimal::Decimal;

use petbox_core::{DiscountType, Money, ProductId};
use petbox_storefront::models::PlanSelection;

mod commands;

#[derive(Parser)]
#[command(name = "petbox-cli")]
#[command(author, version, about = "PetBox CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Seed products, plan links and coupons from a YAML file
    Seed {
        /// Path to the catalog file
        file: String,
    },
    /// Manage coupons
    Coupon {
        #[command(subcommand)]
        action: CouponAction,
    },
    /// Manage products
    Product {
        #[command(subcommand)]
        action: ProductAction,
    },
    /// Manage the plan configuration
    Plan {
        #[command(subcommand)]
        action: PlanAction,
    },
}

#[derive(Subcommand)]
enum CouponAction {
    /// Create a coupon
    Create {
        /// Coupon code (stored uppercased)
        code: String,

        /// Discount type (`percentage` or `fixed`)
        #[arg(short = 't', long = "type")]
        discount_type: DiscountType,

        /// Percentage (0-100) or amount in reais
        #[arg(short = 'v', long = "value")]
        discount_value: Decimal,

        /// Maximum number of redemptions
        #[arg(long)]
        max_uses: Option<i32>,

        /// Expiry instant, RFC 3339 (e.g. 2026-12-31T23:59:59Z)
        #[arg(long)]
        valid_until: Option<DateTime<Utc>>,
    },
    /// List coupons
    List,
    /// Deactivate a coupon
    Deactivate {
        /// Coupon code
        code: String,
    },
}

/// Plan slot a product is sold under.
#[derive(Clone, Copy, ValueEnum)]
enum PlanArg {
    Monthly,
    Annual,
    OneTime,
}

impl From<PlanArg> for PlanSelection {
    fn from(plan: PlanArg) -> Self {
        match plan {
            PlanArg::Monthly => Self::Monthly,
            PlanArg::Annual => Self::Annual,
            PlanArg::OneTime => Self::OneTime,
        }
    }
}

#[derive(Subcommand)]
enum ProductAction {
    /// Create a product
    Create {
        /// Product display name
        name: String,

        /// Plan kind; decides the product type and billing cycle
        #[arg(short, long, value_enum)]
        plan: PlanArg,

        /// Price in reais (e.g. 49.90)
        #[arg(long)]
        price: Money,
    },
    /// List products
    List,
}

#[derive(Subcommand)]
enum PlanAction {
    /// Point plan slots at products
    Link {
        /// Product for the monthly subscription
        #[arg(long)]
        monthly: Option<ProductId>,

        /// Product for the annual subscription
        #[arg(long)]
        annual: Option<ProductId>,

        /// Product for the one-time box
        #[arg(long)]
        one_time: Option<ProductId>,
    },
    /// Show the resolved plan configuration
    Show,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CommandError> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Seed { file } => {
            commands::seed::catalog(&file).await?;
        }
        Commands::Coupon { action } => match action {
            CouponAction::Create {
                code,
                discount_type,
                discount_value,
                max_uses,
                valid_until,
            } => {
                commands::coupon::create(
                    &code,
                    discount_type,
                    discount_value,
                    max_uses,
                    valid_until,
                )
                .await?;
            }
            CouponAction::List => commands::coupon::list().await?,
            CouponAction::Deactivate { code } => commands::coupon::deactivate(&code).await?,
        },
        Commands::Product { action } => match action {
            ProductAction::Create { name, plan, price } => {
                commands::product::create(&name, plan.into(), price).await?;
            }
            ProductAction::List => commands::product::list().await?,
        },
        Commands::Plan { action } => match action {
            PlanAction::Link {
                monthly,
                annual,
                one_time,
            } => commands::plan::link(monthly, annual, one_time).await?,
            PlanAction::Show => commands::plan::show().await?,
        },
    }
    Ok(())
}
