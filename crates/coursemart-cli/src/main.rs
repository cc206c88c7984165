use anyhow::Context;
use clap::{Parser, Subcommand};
use dialoguer::{Input, Password};
use dotenvy::dotenv;

use coursemart_cli::{AdminOutcome, NewAdmin, create_admin, validate_new_admin};

#[derive(Parser)]
#[command(name = "coursemart-cli")]
#[command(about = "Coursemart CLI - Administrative tools for Coursemart", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an administrator account
    CreateAdmin {
        /// Email address
        #[arg(short = 'e', long)]
        email: Option<String>,

        /// Password (will be prompted securely if not provided)
        #[arg(short = 'p', long)]
        password: Option<String>,

        /// Display name
        #[arg(short = 'n', long)]
        full_name: Option<String>,
    },
    /// Apply pending database migrations
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let cli = Cli::parse();

    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
    let pool = coursemart_db::init_db_pool(&database_url)
        .await
        .context("Failed to connect to database")?;

    match cli.command {
        Commands::CreateAdmin {
            email,
            password,
            full_name,
        } => handle_create_admin(&pool, email, password, full_name).await,
        Commands::Migrate => {
            coursemart_db::run_migrations(&pool)
                .await
                .context("Failed to run migrations")?;
            println!("✅ Migrations applied");
            Ok(())
        }
    }
}

async fn handle_create_admin(
    pool: &sqlx::PgPool,
    email: Option<String>,
    password: Option<String>,
    full_name: Option<String>,
) -> anyhow::Result<()> {
    let email = match email {
        Some(email) => email,
        None => Input::new()
            .with_prompt("Email address")
            .interact_text()
            .context("Failed to read email")?,
    };

    let full_name = match full_name {
        Some(name) => Some(name),
        None => {
            let name: String = Input::new()
                .with_prompt("Full name (optional)")
                .allow_empty(true)
                .interact_text()
                .context("Failed to read full name")?;
            Some(name).filter(|n| !n.trim().is_empty())
        }
    };

    let password = match password {
        Some(password) => password,
        None => Password::new()
            .with_prompt("Password")
            .with_confirmation("Confirm password", "Passwords don't match")
            .interact()
            .context("Failed to read password")?,
    };

    let admin = NewAdmin {
        email,
        password,
        full_name,
    };
    validate_new_admin(&admin).map_err(anyhow::Error::msg)?;

    match create_admin(pool, &admin).await {
        Ok(AdminOutcome::Created(id)) => {
            println!("\n✅ Admin created successfully!");
            println!("   Email: {}", admin.email);
            println!("   ID: {}", id);
        }
        Ok(AdminOutcome::AlreadyExists) => {
            println!("\nℹ️  An account with email {} already exists.", admin.email);
        }
        Err(e) => {
            eprintln!("\n❌ Error creating admin: {}", e.error);
            std::process::exit(1);
        }
    }

    Ok(())
}
