use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "dirconf",
    about = "Multi-tenant identity configuration over a directory snapshot",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Directory snapshot to read and write
    #[arg(long, global = true, default_value = "dirconf.json")]
    pub store: PathBuf,

    /// Store settings (TOML)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create an empty snapshot
    Init(InitArgs),
    /// Manage tenants
    Tenant(TenantArgs),
    /// Manage OIDC clients of a tenant
    Oidc(OidcArgs),
    /// Inspect identity providers of a tenant
    Provider(ProviderArgs),
    /// Print every entry of the snapshot
    Dump,
}

impl Command {
    /// Whether the command changes the snapshot.
    pub fn mutates(&self) -> bool {
        match self {
            Command::Init(_) => true,
            Command::Tenant(args) => matches!(
                args.action,
                TenantAction::Add { .. } | TenantAction::Delete { .. } | TenantAction::DefaultTenant { name: Some(_) }
            ),
            Command::Oidc(args) => matches!(args.action, OidcAction::Add { .. } | OidcAction::Delete { .. }),
            Command::Provider(_) | Command::Dump => false,
        }
    }
}

#[derive(Args)]
pub struct InitArgs {
    /// Overwrite an existing snapshot
    #[arg(long)]
    pub force: bool,
}

#[derive(Args)]
pub struct TenantArgs {
    #[command(subcommand)]
    pub action: TenantAction,
}

#[derive(Subcommand)]
pub enum TenantAction {
    /// Create a tenant with its system domain
    Add {
        name: String,
        #[arg(long)]
        long_name: Option<String>,
        #[arg(long)]
        issuer: Option<String>,
        #[arg(long, default_value = "Administrator")]
        admin_user: String,
        #[arg(long)]
        admin_password: String,
    },
    List,
    Show { name: String },
    Delete { name: String },
    /// Show or set the default tenant
    #[command(name = "default")]
    DefaultTenant { name: Option<String> },
}

#[derive(Args)]
pub struct OidcArgs {
    #[command(subcommand)]
    pub action: OidcAction,
}

#[derive(Subcommand)]
pub enum OidcAction {
    Add {
        tenant: String,
        client_id: String,
        #[arg(long = "redirect-uri")]
        redirect_uris: Vec<String>,
        #[arg(long = "scope")]
        scopes: Vec<String>,
    },
    List { tenant: String },
    Delete { tenant: String, client_id: String },
}

#[derive(Args)]
pub struct ProviderArgs {
    #[command(subcommand)]
    pub action: ProviderAction,
}

#[derive(Subcommand)]
pub enum ProviderAction {
    List { tenant: String },
}
