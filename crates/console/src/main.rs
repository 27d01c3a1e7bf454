//! User Console - terminal frontend for the user service.

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use user_console_lib::{ApiClient, ListView, UserForm};

#[derive(Parser)]
#[command(name = "user-console")]
#[command(about = "Manage users and roles through the REST API")]
struct Cli {
    /// Base URL of the user service
    #[arg(long, env = "API_BASE_URL", default_value = "http://localhost:8000")]
    base_url: String,

    /// Log requests and responses
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// User management
    Users {
        #[command(subcommand)]
        action: UserCommands,
    },
    /// Role listing
    Roles {
        #[command(subcommand)]
        action: RoleCommands,
    },
}

#[derive(Subcommand)]
enum UserCommands {
    /// List users
    List {
        /// Group users under each role
        #[arg(long)]
        by_role: bool,
    },
    /// Show one user
    Show { id: i32 },
    /// Create a user
    Create(UserFields),
    /// Edit a user; omitted fields keep their value
    Edit {
        id: i32,
        #[command(flatten)]
        fields: UserFields,
    },
    /// Delete a user
    Delete { id: i32 },
}

#[derive(Subcommand)]
enum RoleCommands {
    /// List roles
    List,
}

#[derive(Args)]
struct UserFields {
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    email: Option<String>,
    #[arg(long)]
    password: Option<String>,
    /// Role name or id; repeat for several roles
    #[arg(long = "role")]
    roles: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Initialize tracing
    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_level.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let client = ApiClient::new(cli.base_url)?;

    match cli.command {
        Commands::Roles {
            action: RoleCommands::List,
        } => {
            for role in client.list_roles().await? {
                println!(
                    "{:>3}  {:<16} {}",
                    role.id,
                    role.name,
                    role.description.unwrap_or_default()
                );
            }
        }
        Commands::Users { action } => run_user_command(&client, action).await?,
    }

    Ok(())
}

async fn run_user_command(
    client: &ApiClient,
    action: UserCommands,
) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        UserCommands::List { by_role } => {
            let view = ListView::load(client, by_role).await?;
            print!("{}", view.render());
        }
        UserCommands::Show { id } => {
            let user = client.get_user(id).await?;
            let roles: Vec<&str> = user.roles.iter().map(|r| r.name.as_str()).collect();
            println!("#{} {} <{}>", user.id, user.full_name, user.email);
            println!("Roles:   {}", roles.join(", "));
            println!("Created: {}", user.created_at);
            println!("Updated: {}", user.updated_at);
        }
        UserCommands::Create(fields) => {
            let mut form = UserForm::create(client).await;
            apply_fields(&mut form, fields)?;
            submit(client, form).await?;
        }
        UserCommands::Edit { id, fields } => {
            let mut form = UserForm::edit(client, id).await?;
            apply_fields(&mut form, fields)?;
            submit(client, form).await?;
        }
        UserCommands::Delete { id } => {
            println!("{}", client.delete_user(id).await?);
        }
    }

    Ok(())
}

/// Copy CLI values into the form. Roles given replace the current selection.
fn apply_fields(form: &mut UserForm, fields: UserFields) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(name) = fields.name {
        form.full_name = name;
    }
    if let Some(email) = fields.email {
        form.email = email;
    }
    if let Some(password) = fields.password {
        form.password = password;
    }

    if !fields.roles.is_empty() {
        form.selected_roles.clear();

        let mut names = Vec::new();
        for role in &fields.roles {
            match role.parse::<i32>() {
                Ok(id) if !form.selected_roles.contains(&id) => form.toggle_role(id),
                Ok(_) => {}
                Err(_) => names.push(role.as_str()),
            }
        }

        let unknown = form.select_roles_by_name(&names);
        if !unknown.is_empty() {
            return Err(format!("unknown role(s): {}", unknown.join(", ")).into());
        }
    }

    Ok(())
}

async fn submit(client: &ApiClient, mut form: UserForm) -> Result<(), Box<dyn std::error::Error>> {
    match form.submit(client).await {
        Some(user) => {
            println!("Saved user #{} {} <{}>", user.id, user.full_name, user.email);
            Ok(())
        }
        None => {
            eprint!("{}", form.render());
            Err("user was not saved".into())
        }
    }
}
