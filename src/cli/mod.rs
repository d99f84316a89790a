//! CLI module for PMP Users
//!
//! Administrative subcommands for managing users, roles and the database
//! schema. Users created here never emit lifecycle events.

pub mod migrate;
pub mod roles;
pub mod users;

use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};

use crate::config::AppConfig;
use crate::infrastructure::event::BroadcastEventDispatcher;
use crate::infrastructure::logging;
use crate::UserModule;

/// PMP Users - user, role and API key administration
#[derive(Parser)]
#[command(name = "pmp-users")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create a user, optionally with roles
    CreateUser(users::CreateUserArgs),

    /// Update a user's fields and optionally replace its roles
    UpdateUser(users::UpdateUserArgs),

    /// Delete a user with its role links and API keys
    DeleteUser(users::UserArgs),

    /// List all users
    ListUsers(users::ListArgs),

    /// Issue an additional API key for a user
    IssueApiKey(users::UserArgs),

    /// Revoke one of a user's API keys
    RevokeApiKey(users::RevokeApiKeyArgs),

    /// Create a role
    CreateRole(roles::CreateRoleArgs),

    /// List all roles with their member counts
    ListRoles(users::ListArgs),

    /// Apply or revert database migrations
    Migrate(migrate::MigrateArgs),
}

/// Load `.env`, configuration and logging
pub(crate) fn bootstrap() -> anyhow::Result<AppConfig> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;
    logging::init_logging(&config.logging);

    Ok(config)
}

/// Build the services for the configured backend
pub(crate) async fn user_module(config: &AppConfig) -> anyhow::Result<UserModule> {
    let events = Arc::new(BroadcastEventDispatcher::new());
    Ok(crate::create_user_module(config, events).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::role::{RoleId, RoleRef};
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_create_user_with_roles() {
        let cli = Cli::try_parse_from([
            "pmp-users",
            "create-user",
            "--email",
            "admin@example.com",
            "--password",
            "demo1234",
            "--activated",
            "--role",
            "admin",
            "--role",
            "#2",
        ])
        .unwrap();

        let Command::CreateUser(args) = cli.command else {
            panic!("Expected create-user");
        };

        assert_eq!(args.email, "admin@example.com");
        assert!(args.activated);
        assert_eq!(
            args.roles,
            vec![RoleRef::Name("admin".into()), RoleRef::Id(RoleId::new(2))]
        );
    }

    #[test]
    fn test_parse_update_user_role_ids() {
        let cli = Cli::try_parse_from(["pmp-users", "update-user", "5", "--role", "#3", "--role", "editor"])
            .unwrap();

        let Command::UpdateUser(args) = cli.command else {
            panic!("Expected update-user");
        };

        assert_eq!(args.id, 5);
        assert_eq!(
            args.roles,
            vec![RoleRef::Id(RoleId::new(3)), RoleRef::Name("editor".into())]
        );
    }

    #[test]
    fn test_update_user_activation_flags_conflict() {
        let result = Cli::try_parse_from(["pmp-users", "update-user", "1", "--activate", "--deactivate"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_migrate() {
        let cli = Cli::try_parse_from(["pmp-users", "migrate", "--revert"]).unwrap();
        assert!(matches!(cli.command, Command::Migrate(args) if args.revert));
    }
}
