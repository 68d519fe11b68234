use anyhow::{anyhow, Context, Result};
use clap::Parser;
use rand::RngCore;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use progression_api::db::{self, entity::servers};

/// Out-of-band provisioning: registers a game server and mints its secret
/// token. The token is printed once and never recoverable afterwards.
#[derive(Debug, Parser)]
#[command(name = "add_server")]
#[command(about = "Provision an authorized game-server registration", long_about = None)]
struct Args {
    /// Server owner's name
    #[arg(long)]
    owner_name: String,

    /// Optional owner contact info
    #[arg(long)]
    owner_contact: Option<String>,

    /// Server GUID (32/36 chars, dashes tolerated)
    #[arg(long)]
    server_guid: String,

    /// SeaORM-compatible Postgres URL
    #[arg(long, env = "DATABASE_URL")]
    database_url: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args = Args::parse();
    let guid = Uuid::try_parse(&args.server_guid)
        .map(|id| id.as_simple().to_string())
        .map_err(|_| anyhow!("server GUID must be a 32/36 character GUID"))?;

    let conn = db::connect(&args.database_url, 1).await?;
    db::schema::init(&conn)
        .await
        .context("failed to initialize database schema")?;

    if let Some(existing) = servers::Entity::find()
        .filter(servers::Column::ServerGuid.eq(guid.as_str()))
        .one(&conn)
        .await?
    {
        println!(
            "server GUID already registered: id {} (owner: {})",
            existing.id, existing.owner_name
        );
        return Ok(());
    }

    let mut secret = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut secret);
    let token = hex::encode(secret);

    let inserted = servers::ActiveModel {
        owner_name: Set(args.owner_name),
        owner_contact: Set(args.owner_contact),
        server_guid: Set(guid),
        token: Set(token),
        authorized: Set(true),
        ..Default::default()
    }
    .insert(&conn)
    .await
    .context("failed to insert server registration")?;

    println!("new authorized server added:");
    println!("  id:          {}", inserted.id);
    println!("  owner:       {}", inserted.owner_name);
    println!("  server GUID: {}", inserted.server_guid);
    println!("  token:       {}", inserted.token);
    Ok(())
}
