//! Seed data script - populates the database with demo categories, users and stock
//!
//! Run with: cargo run --bin seed-data -- --database-url sqlite://stockroom.db?mode=rwc
//!
//! Existing records (matched by name or username) are left untouched, so the script can be
//! re-run safely.

use anyhow::Context;
use clap::Parser;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::info;

use stockroom_api::{
    db,
    entities::{ItemUnit, UserRole},
    events::EventSender,
    services::{
        categories::{CategoryService, CreateCategoryRequest},
        inventory::{CreateInventoryItemRequest, InventoryService},
        users::{CreateUserRequest, UserService},
    },
};

#[derive(Debug, Parser)]
#[command(name = "seed-data", about = "Populate the stockroom database with demo data")]
struct Args {
    /// Database to seed
    #[arg(long, env = "APP__DATABASE_URL", default_value = "sqlite://stockroom.db?mode=rwc")]
    database_url: String,

    /// Skip running migrations before seeding
    #[arg(long)]
    skip_migrations: bool,
}

const CATEGORIES: &[(&str, &str, &str)] = &[
    ("Tools", "Hand tools and power tools", "🔧"),
    ("Materials", "Raw materials and supplies", "📦"),
    ("Consumables", "Consumable items that need frequent restocking", "🔋"),
];

const USERS: &[(&str, &str, &str, UserRole)] = &[
    ("admin", "admin123", "Admin User", UserRole::Admin),
    ("staff", "staff123", "Staff User", UserRole::Staff),
];

struct SeedItem {
    name: &'static str,
    description: &'static str,
    category: &'static str,
    quantity: i32,
    unit: ItemUnit,
    reorder_threshold: i32,
}

const ITEMS: &[SeedItem] = &[
    SeedItem { name: "10mm Wrench", description: "Standard 10mm combination wrench", category: "Tools", quantity: 15, unit: ItemUnit::Pcs, reorder_threshold: 5 },
    SeedItem { name: "12mm Wrench", description: "Standard 12mm combination wrench", category: "Tools", quantity: 20, unit: ItemUnit::Pcs, reorder_threshold: 5 },
    SeedItem { name: "Screwdriver Set", description: "6-piece screwdriver set", category: "Tools", quantity: 8, unit: ItemUnit::Pcs, reorder_threshold: 3 },
    SeedItem { name: "Steel Pipe", description: "1 inch diameter steel pipe", category: "Materials", quantity: 50, unit: ItemUnit::Meters, reorder_threshold: 10 },
    SeedItem { name: "Wood Planks", description: "2x4 inch wood planks", category: "Materials", quantity: 100, unit: ItemUnit::Pcs, reorder_threshold: 20 },
    SeedItem { name: "Paint (White)", description: "White wall paint", category: "Consumables", quantity: 25, unit: ItemUnit::Liters, reorder_threshold: 10 },
    SeedItem { name: "Screws Box", description: "Assorted screws box", category: "Consumables", quantity: 30, unit: ItemUnit::Box, reorder_threshold: 5 },
    SeedItem { name: "Nails Box", description: "Assorted nails box", category: "Consumables", quantity: 4, unit: ItemUnit::Box, reorder_threshold: 5 },
    SeedItem { name: "Sandpaper", description: "Mixed grit sandpaper sheets", category: "Consumables", quantity: 50, unit: ItemUnit::Pcs, reorder_threshold: 20 },
    SeedItem { name: "Power Drill", description: "Cordless power drill with battery", category: "Tools", quantity: 5, unit: ItemUnit::Pcs, reorder_threshold: 2 },
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let args = Args::parse();
    info!("=== Stockroom Seed Data ===");

    let db = db::establish_connection(&args.database_url)
        .await
        .context("failed to connect to database")?;
    if !args.skip_migrations {
        db::run_migrations(&db).await.context("failed to run migrations")?;
    }
    let db = Arc::new(db);

    // Nobody listens for realtime events here; keep the receiver alive so sends succeed.
    let (events, _events_rx) = EventSender::channel(ITEMS.len() + 1);

    let categories = CategoryService::new(db.clone());
    for (name, description, icon) in CATEGORIES {
        if categories.find_by_name(name).await?.is_some() {
            info!("Category \"{}\" already exists, skipping", name);
            continue;
        }
        let created = categories
            .create(CreateCategoryRequest {
                name: name.to_string(),
                description: Some(description.to_string()),
                icon: Some(icon.to_string()),
                is_active: Some(true),
            })
            .await?;
        info!("Category created: {} {}", created.name, icon);
    }

    let users = UserService::new(db.clone());
    for (username, password, name, role) in USERS {
        if users.get_by_username(username).await?.is_some() {
            info!("User \"{}\" already exists, skipping", username);
            continue;
        }
        users
            .create(CreateUserRequest {
                name: name.to_string(),
                username: username.to_string(),
                password: Some(password.to_string()),
                role: Some(*role),
                is_active: Some(true),
            })
            .await?;
        info!("User created: {} ({})", username, role);
    }

    let inventory = InventoryService::new(db, events);
    let existing: HashSet<String> = inventory
        .find_all(None, None)
        .await?
        .into_iter()
        .map(|item| item.name)
        .collect();

    for item in ITEMS {
        if existing.contains(item.name) {
            info!("Item \"{}\" already exists, skipping", item.name);
            continue;
        }
        let created = inventory
            .create(CreateInventoryItemRequest {
                name: item.name.to_string(),
                description: Some(item.description.to_string()),
                category: item.category.to_string(),
                quantity: Some(item.quantity),
                unit: Some(item.unit),
                reorder_threshold: Some(item.reorder_threshold),
            })
            .await?;
        info!("Item created: {} ({} {})", created.name, created.quantity, created.unit);
    }

    info!("=== Seed Data Complete ===");
    info!("Login with admin/admin123 or staff/staff123");
    info!("Explore interactively at: http://localhost:8080/swagger-ui");

    Ok(())
}
