//! Role commands

use clap::Args;
use serde::Serialize;

use crate::infrastructure::role::CreateRoleRequest;

use super::users::ListArgs;

/// Arguments for the create-role command
#[derive(Args, Clone)]
pub struct CreateRoleArgs {
    pub name: String,

    /// Explicit slug; must equal the one derived from the name
    #[arg(long)]
    pub slug: Option<String>,
}

#[derive(Debug, Serialize)]
struct RoleSummary {
    id: i64,
    name: String,
    slug: String,
    users: usize,
}

pub async fn create(args: CreateRoleArgs) -> anyhow::Result<()> {
    let config = super::bootstrap()?;
    let module = super::user_module(&config).await?;

    let role = module
        .roles
        .create(CreateRoleRequest {
            name: args.name,
            slug: args.slug,
        })
        .await?;

    println!("Created role #{} {} ({})", role.id(), role.name(), role.slug());
    Ok(())
}

pub async fn list(args: ListArgs) -> anyhow::Result<()> {
    let config = super::bootstrap()?;
    let module = super::user_module(&config).await?;

    let mut summaries = Vec::new();

    for role in module.roles.all().await? {
        summaries.push(RoleSummary {
            id: role.id().value(),
            users: module.roles.users_with_role(role.id()).await?,
            name: role.name().to_string(),
            slug: role.slug().to_string(),
        });
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summaries)?);
        return Ok(());
    }

    for summary in &summaries {
        println!(
            "#{:<6} {:<30} {:<30} {} users",
            summary.id, summary.name, summary.slug, summary.users
        );
    }

    Ok(())
}
