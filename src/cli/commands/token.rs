use clap::Subcommand;
use serde_json::json;

use crate::auth::{Identity, TokenKind, TokenService};
use crate::cli::OutputFormat;
use crate::config::config;
use crate::types::Permission;

#[derive(Subcommand)]
pub enum TokenCommands {
    #[command(about = "Issue an access/refresh token pair for a user id")]
    Issue {
        #[arg(long, help = "User id to put in the token")]
        id: String,
        #[arg(long, default_value_t = 0, help = "Permission level (10 and above is admin)")]
        permission: u8,
    },

    #[command(about = "Verify a token and print its claims")]
    Verify {
        #[arg(help = "Token to verify")]
        token: String,
        #[arg(long, help = "Verify as a refresh token")]
        refresh: bool,
    },
}

pub fn handle(cmd: TokenCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let tokens = TokenService::from_config(&config().security);

    match cmd {
        TokenCommands::Issue { id, permission } => {
            let identity = Identity {
                id,
                permission: Permission::from(permission),
            };
            let pair = tokens.get_tokens(&identity)?;
            match output_format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&pair)?),
                OutputFormat::Text => {
                    println!("accessToken:  {}", pair.access_token);
                    println!("refreshToken: {}", pair.refresh_token);
                }
            }
            Ok(())
        }
        TokenCommands::Verify { token, refresh } => {
            let kind = if refresh { TokenKind::Refresh } else { TokenKind::Access };
            let result = tokens.verify_token(&token, kind);
            match (output_format, &result) {
                (OutputFormat::Json, Ok(claims)) => {
                    println!("{}", serde_json::to_string_pretty(&json!({ "valid": true, "claims": claims }))?)
                }
                (OutputFormat::Json, Err(e)) => {
                    println!("{}", serde_json::to_string_pretty(&json!({ "valid": false, "error": e.to_string() }))?)
                }
                (OutputFormat::Text, Ok(claims)) => {
                    println!("valid {}", kind);
                    println!("  id:         {}", claims.data.id);
                    let role = if claims.data.permission.is_admin() { "admin" } else { "user" };
                    println!("  permission: {} ({})", claims.data.permission, role);
                    println!("  isRefresh:  {}", claims.is_refresh);
                    println!("  expires:    {}", claims.exp);
                }
                (OutputFormat::Text, Err(e)) => println!("{}", e),
            }
            result.map(|_| ()).map_err(Into::into)
        }
    }
}
