use std::path::Path;

use anyhow::Context;
use badge_gate::authz::{can_activate, parity, GuardDeclaration, IdentityClaim, Role};
use badge_gate::db::users;
use badge_gate::models::user::NewUser;
use badge_gate::routes::dashboard::TAB_ROUTES;
use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(author, version, about = "badge-gate authorization tool", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the canonical permission matrix as JSON
    Matrix,
    /// Run the parity harness against the engine and the route declarations
    Parity,
    /// Evaluate a guard declaration for a role and manager flag
    Check {
        #[arg(long)]
        role: String,
        /// Omit to simulate a token without the isManager claim
        #[arg(long)]
        manager: Option<bool>,
        /// Comma-separated role names; empty admits any role
        #[arg(long, value_delimiter = ',')]
        requires_role: Vec<String>,
        #[arg(long)]
        requires_manager: bool,
    },
    /// Create a user, optionally reporting to an existing manager
    CreateUser {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long, default_value = "EMPLOYEE")]
        role: String,
        #[arg(long)]
        manager_id: Option<Uuid>,
    },
    /// Apply pending migrations
    MigrateRun,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Try to load env from CWD, then fall back to the crate-local `.env`.
    if dotenv().is_err() {
        let crate_env = Path::new(env!("CARGO_MANIFEST_DIR")).join(".env");
        let _ = dotenvy::from_path(crate_env);
    }

    let cli = Cli::parse();

    match cli.command {
        Commands::Matrix => {
            println!("{}", serde_json::to_string_pretty(&parity::export_matrix())?);
        }
        Commands::Parity => run_parity()?,
        Commands::Check {
            role,
            manager,
            requires_role,
            requires_manager,
        } => {
            let role: Role = role.parse()?;
            let required: Vec<Role> = requires_role
                .iter()
                .filter(|r| !r.is_empty())
                .map(|r| r.parse::<Role>())
                .collect::<Result<_, _>>()?;

            // Declarations are 'static in the service; the CLI builds one at runtime.
            let declaration = GuardDeclaration {
                required_roles: Box::leak(required.into_boxed_slice()),
                requires_manager,
            };
            let claim = IdentityClaim {
                user_id: Uuid::nil(),
                role,
                is_manager: manager,
            };

            match can_activate(Some(&claim), &declaration) {
                Ok(()) => println!("ALLOW"),
                Err(denial) => {
                    println!("DENY: {}", denial);
                    std::process::exit(1);
                }
            }
        }
        Commands::CreateUser {
            email,
            password,
            role,
            manager_id,
        } => {
            let pool = get_pool().await?;
            let user = users::insert_user(
                &pool,
                NewUser {
                    email,
                    password,
                    role: role.parse()?,
                    manager_id,
                },
            )
            .await?;
            println!("Created user {} ({})", user.id, user.role);
        }
        Commands::MigrateRun => {
            let pool = get_pool().await?;
            sqlx::migrate!().run(&pool).await.context("failed to run migrations")?;
            println!("Migrations applied");
        }
    }

    Ok(())
}

fn run_parity() -> anyhow::Result<()> {
    let checks = [
        ("engine", parity::check_engine(badge_gate::compute_permissions)),
        ("tabs/groups", parity::check_tab_group_correspondence()),
        ("guard alignment", parity::check_guard_alignment(&TAB_ROUTES)),
    ];

    let mut failed = false;
    for (name, result) in checks {
        match result {
            Ok(()) => println!("{:<16} ok", name),
            Err(mismatches) => {
                failed = true;
                println!("{:<16} FAILED", name);
                for mismatch in mismatches {
                    println!("  {}", mismatch);
                }
            }
        }
    }

    if failed {
        anyhow::bail!("permission parity check failed");
    }
    Ok(())
}

async fn get_pool() -> anyhow::Result<SqlitePool> {
    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL not set")?;
    SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .context("failed to connect to database")
}
