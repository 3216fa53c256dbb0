use clap::Subcommand;
use rollcall_core::DiscordPlatform;

use super::CmdResult;

#[derive(Subcommand)]
pub enum AuthAction {
    /// Store a Discord bot token in the OS keyring
    Login {
        /// Bot token
        #[arg(long)]
        token: String,
    },
    /// Remove the stored bot token
    Logout,
    /// Check whether a bot token is available
    Status,
}

pub fn run(action: AuthAction) -> CmdResult {
    match action {
        AuthAction::Login { token } => {
            if token.trim().is_empty() {
                return Err("--token must not be empty".into());
            }
            DiscordPlatform::set_credentials(token.trim())?;
            println!("Discord token stored");
        }
        AuthAction::Logout => {
            DiscordPlatform::disconnect()?;
            println!("Discord disconnected");
        }
        AuthAction::Status => {
            let token = DiscordPlatform::resolve_token()?;
            println!(
                "{}",
                if token.is_some() {
                    "authenticated"
                } else {
                    "not authenticated"
                }
            );
        }
    }
    Ok(())
}
