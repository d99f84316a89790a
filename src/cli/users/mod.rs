//! User commands

use std::convert::Infallible;

use clap::Args;

use crate::domain::api_key::ApiKeyId;
use crate::domain::role::RoleRef;
use crate::domain::user::{User, UserId};
use crate::infrastructure::user::{CreateUserRequest, UpdateUserRequest};

/// Arguments for the create-user command
#[derive(Args, Clone)]
pub struct CreateUserArgs {
    #[arg(long)]
    pub email: String,

    #[arg(long)]
    pub password: String,

    #[arg(long)]
    pub first_name: Option<String>,

    #[arg(long)]
    pub last_name: Option<String>,

    /// Create the account already activated
    #[arg(long)]
    pub activated: bool,

    /// Role to assign, by name, slug or `#<id>` (repeatable)
    #[arg(long = "role", value_parser = parse_role_ref)]
    pub roles: Vec<RoleRef>,
}

/// Arguments for the update-user command
#[derive(Args, Clone)]
pub struct UpdateUserArgs {
    pub id: i64,

    #[arg(long)]
    pub email: Option<String>,

    #[arg(long)]
    pub password: Option<String>,

    /// New first name; an empty value clears it
    #[arg(long)]
    pub first_name: Option<String>,

    /// New last name; an empty value clears it
    #[arg(long)]
    pub last_name: Option<String>,

    #[arg(long, conflicts_with = "deactivate")]
    pub activate: bool,

    #[arg(long)]
    pub deactivate: bool,

    /// Replacement role set, by name, slug or `#<id>` (repeatable)
    #[arg(long = "role", value_parser = parse_role_ref)]
    pub roles: Vec<RoleRef>,

    /// Replace the role set even when no `--role` is given, removing all roles
    #[arg(long)]
    pub sync_roles: bool,
}

impl UpdateUserArgs {
    fn request(&self) -> UpdateUserRequest {
        let activated = match (self.activate, self.deactivate) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        };

        UpdateUserRequest {
            email: self.email.clone(),
            password: self.password.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            activated,
        }
    }
}

/// `#<id>` selects a role by id; anything else is a name or slug
fn parse_role_ref(value: &str) -> Result<RoleRef, Infallible> {
    value.parse()
}

/// A command addressing a single user
#[derive(Args, Clone)]
pub struct UserArgs {
    pub id: i64,
}

/// Arguments for the revoke-api-key command
#[derive(Args, Clone)]
pub struct RevokeApiKeyArgs {
    pub user_id: i64,
    pub key_id: i64,
}

/// Output options for list commands
#[derive(Args, Clone)]
pub struct ListArgs {
    /// Print JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

/// Create a user through the event-suppressing path
pub async fn create(args: CreateUserArgs) -> anyhow::Result<()> {
    let config = super::bootstrap()?;
    let module = super::user_module(&config).await?;

    let request = CreateUserRequest {
        email: args.email,
        password: args.password,
        first_name: args.first_name,
        last_name: args.last_name,
        activated: args.activated,
    };

    let user = module
        .users
        .create_with_roles_from_cli(request, args.roles)
        .await?;
    let roles = module.users.roles(user.id()).await?;

    println!("Created user #{} <{}>", user.id(), user.email());

    for role in roles {
        println!("  role: {} ({})", role.name(), role.slug());
    }

    Ok(())
}

/// Update a user, syncing roles when asked to
pub async fn update(args: UpdateUserArgs) -> anyhow::Result<()> {
    let config = super::bootstrap()?;
    let module = super::user_module(&config).await?;
    let id = UserId::new(args.id);
    let request = args.request();

    let user = if args.sync_roles || !args.roles.is_empty() {
        module
            .users
            .update_and_sync_roles(id, request, args.roles)
            .await?
    } else {
        let current = module.users.find(id).await?;
        module.users.update(&current, request).await?
    };

    println!("Updated user #{} <{}>", user.id(), user.email());
    Ok(())
}

pub async fn delete(args: UserArgs) -> anyhow::Result<()> {
    let config = super::bootstrap()?;
    let module = super::user_module(&config).await?;

    module.users.delete(UserId::new(args.id)).await?;

    println!("Deleted user #{}", args.id);
    Ok(())
}

pub async fn list(args: ListArgs) -> anyhow::Result<()> {
    let config = super::bootstrap()?;
    let module = super::user_module(&config).await?;
    let users = module.users.all().await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&users)?);
        return Ok(());
    }

    for user in &users {
        println!("{}", format_user(user));
    }

    Ok(())
}

/// Issue a key and print the plaintext once
pub async fn issue_api_key(args: UserArgs) -> anyhow::Result<()> {
    let config = super::bootstrap()?;
    let module = super::user_module(&config).await?;

    let issued = module.users.issue_api_key(UserId::new(args.id)).await?;

    println!("API key #{} for user #{}", issued.api_key.id(), args.id);
    println!("{}", issued.key);
    Ok(())
}

pub async fn revoke_api_key(args: RevokeApiKeyArgs) -> anyhow::Result<()> {
    let config = super::bootstrap()?;
    let module = super::user_module(&config).await?;

    module
        .users
        .revoke_api_key(UserId::new(args.user_id), ApiKeyId::new(args.key_id))
        .await?;

    println!("Revoked API key #{}", args.key_id);
    Ok(())
}

fn format_user(user: &User) -> String {
    format!(
        "#{:<6} {:<40} {:<30} {}",
        user.id().value(),
        user.email(),
        user.display_name(),
        if user.is_activated() { "active" } else { "inactive" }
    )
}
