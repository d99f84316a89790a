use clap::Parser;
use pmp_users::cli::{self, Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::CreateUser(args) => cli::users::create(args).await,
        Command::UpdateUser(args) => cli::users::update(args).await,
        Command::DeleteUser(args) => cli::users::delete(args).await,
        Command::ListUsers(args) => cli::users::list(args).await,
        Command::IssueApiKey(args) => cli::users::issue_api_key(args).await,
        Command::RevokeApiKey(args) => cli::users::revoke_api_key(args).await,
        Command::CreateRole(args) => cli::roles::create(args).await,
        Command::ListRoles(args) => cli::roles::list(args).await,
        Command::Migrate(args) => cli::migrate::run(args).await,
    }
}
