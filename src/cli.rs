use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use clap::{Args, Parser, Subcommand};

use crate::auth::Actor;
use crate::config::Config;
use crate::db::Database;
use crate::services::{accounts, inactivity};

#[derive(Parser)]
#[command(name = "leadcrm")]
#[command(about = "Sales lead management backend")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP API
    Serve(ServeArgs),
    /// Create the default roles and an admin user
    Seed(SeedArgs),
    /// Raise reminders for leads with no recent activity
    ProcessInactive(ProcessInactiveArgs),
}

#[derive(Args)]
pub struct ServeArgs {
    /// Address to listen on (overrides LEADCRM_BIND)
    #[arg(short, long)]
    pub bind: Option<SocketAddr>,
    /// Database file (overrides LEADCRM_DB_PATH)
    #[arg(long)]
    pub db: Option<PathBuf>,
}

#[derive(Args)]
pub struct SeedArgs {
    #[arg(long)]
    pub admin_email: String,
    #[arg(long)]
    pub admin_password: String,
    #[arg(long, default_value = "Administrator")]
    pub admin_name: String,
    #[arg(long)]
    pub db: Option<PathBuf>,
}

#[derive(Args)]
pub struct ProcessInactiveArgs {
    /// Email of the user the reminders are raised on behalf of
    #[arg(long)]
    pub actor_email: String,
    #[arg(long)]
    pub db: Option<PathBuf>,
}

fn open_db(path: Option<PathBuf>) -> Result<Database> {
    match path {
        Some(path) => Database::open_at(path),
        None => Database::open(),
    }
}

pub async fn run_serve(mut config: Config, args: ServeArgs) -> Result<()> {
    if let Some(bind) = args.bind {
        config.bind = bind;
    }
    if args.db.is_some() {
        config.db_path = args.db;
    }
    crate::server::serve(config).await
}

pub fn run_seed(config: &Config, args: SeedArgs) -> Result<()> {
    let db = open_db(args.db.or_else(|| config.db_path.clone()))?;
    let report = accounts::seed(
        &db,
        &args.admin_name,
        &args.admin_email,
        &args.admin_password,
        Utc::now(),
    )?;

    if report.roles_created.is_empty() {
        println!("Default roles already present");
    } else {
        println!("Created roles: {}", report.roles_created.join(", "));
    }
    match report.admin_id {
        Some(id) => println!("Created admin {} ({})", args.admin_email, id),
        None => println!("Admin {} already exists", args.admin_email),
    }
    Ok(())
}

pub fn run_process_inactive(config: &Config, args: ProcessInactiveArgs) -> Result<()> {
    let db = open_db(args.db.or_else(|| config.db_path.clone()))?;
    let actor = actor_by_email(&db, &args.actor_email)?;
    let summary = inactivity::process_all(&db, &actor, Utc::now())?;
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn actor_by_email(db: &Database, email: &str) -> Result<Actor> {
    let user = db
        .get_user_by_email(email)?
        .ok_or_else(|| anyhow!("No user with email {}", email))?;
    let role = db
        .get_role(user.role_id)?
        .with_context(|| format!("User {} has no role", email))?;
    Ok(Actor::from_role(user, role))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_serve() {
        let cli = Cli::try_parse_from(["leadcrm", "serve", "--bind", "0.0.0.0:9000"]).unwrap();
        match cli.command {
            Commands::Serve(args) => {
                assert_eq!(args.bind.map(|b| b.port()), Some(9000));
                assert!(args.db.is_none());
            }
            _ => panic!("expected serve"),
        }
    }

    #[test]
    fn test_parse_seed_requires_credentials() {
        assert!(Cli::try_parse_from(["leadcrm", "seed"]).is_err());
        let cli = Cli::try_parse_from([
            "leadcrm",
            "seed",
            "--admin-email",
            "ada@example.test",
            "--admin-password",
            "secret1",
        ])
        .unwrap();
        match cli.command {
            Commands::Seed(args) => assert_eq!(args.admin_name, "Administrator"),
            _ => panic!("expected seed"),
        }
    }

    #[test]
    fn test_seed_then_process_inactive() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("crm.db");
        let config = Config::from_lookup(|_| None).unwrap();

        let seed = SeedArgs {
            admin_email: "ada@example.test".into(),
            admin_password: "secret1".into(),
            admin_name: "Ada".into(),
            db: Some(path.clone()),
        };
        run_seed(&config, seed).unwrap();

        let db = Database::open_at(path.clone()).unwrap();
        let actor = actor_by_email(&db, "ada@example.test").unwrap();
        assert!(actor.is_admin());
        assert!(actor_by_email(&db, "nobody@example.test").is_err());

        let args = ProcessInactiveArgs {
            actor_email: "ada@example.test".into(),
            db: Some(path),
        };
        run_process_inactive(&config, args).unwrap();
    }
}
