use std::path::Path;

use anyhow::{bail, Context};
use colored::Colorize;
use serde_json::json;
use tracing::debug;

use dirconf_entities::{credential, oidc, provider, tenant};
use dirconf_sdk::{ConfigStore, ConfigStoreSettings, DomainType, OidcClient, Tenant};
use dirconf_store::{Entry, InMemoryDirectory};

use crate::cli::*;

type Store = ConfigStore<InMemoryDirectory>;

/// Attributes whose values are never printed.
const REDACTED: &[&str] = &[
    provider::attr::PASSWORD,
    tenant::attr::TENANT_KEY,
    credential::attr::PRIVATE_KEY,
    oidc::attr::CLIENT_SECRET,
];

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let settings = match &cli.config {
        Some(path) => ConfigStoreSettings::load(path)
            .with_context(|| format!("reading settings from {}", path.display()))?,
        None => ConfigStoreSettings::default(),
    };

    let Cli { command, store: path, format, .. } = cli;
    let command = match command {
        Command::Init(args) => return cmd_init(&path, settings, &args),
        other => other,
    };

    let directory = open_directory(&path)?;
    let store = ConfigStore::new(directory.clone(), settings);
    let mutates = command.mutates();

    match command {
        Command::Tenant(args) => cmd_tenant(&store, args.action, format)?,
        Command::Oidc(args) => cmd_oidc(&store, args.action, format)?,
        Command::Provider(args) => cmd_provider(&store, args.action, format)?,
        Command::Dump => cmd_dump(&directory, format)?,
        Command::Init(_) => {}
    }

    if mutates {
        directory
            .save_to(&path)
            .with_context(|| format!("writing {}", path.display()))?;
        debug!(path = %path.display(), entries = directory.len(), "snapshot saved");
    }
    Ok(())
}

fn open_directory(path: &Path) -> anyhow::Result<InMemoryDirectory> {
    if !path.exists() {
        bail!("no snapshot at {}; run `dirconf init` first", path.display());
    }
    let directory = InMemoryDirectory::load_from(path)
        .with_context(|| format!("loading {}", path.display()))?;
    debug!(path = %path.display(), entries = directory.len(), "snapshot loaded");
    Ok(directory)
}

fn cmd_init(path: &Path, settings: ConfigStoreSettings, args: &InitArgs) -> anyhow::Result<()> {
    if path.exists() && !args.force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }
    let directory = InMemoryDirectory::with_suffix(settings.root_dn.clone());
    directory
        .save_to(path)
        .with_context(|| format!("writing {}", path.display()))?;
    println!("{} Initialized snapshot {}", "✓".green().bold(), path.display().to_string().bold());
    println!("  Root: {}", settings.root_dn.to_string().cyan());
    Ok(())
}

fn print_json(value: &impl serde::Serialize) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// ---------------------------------------------------------------------------
// Tenants
// ---------------------------------------------------------------------------

fn cmd_tenant(store: &Store, action: TenantAction, format: OutputFormat) -> anyhow::Result<()> {
    match action {
        TenantAction::Add { name, long_name, issuer, admin_user, admin_password } => {
            let mut tenant = Tenant::new(&name);
            tenant.long_name = long_name;
            tenant.issuer_name = issuer;
            store.add_tenant(&tenant, &admin_user, &admin_password)?;
            println!("{} Created tenant {}", "✓".green().bold(), name.yellow());
        }
        TenantAction::List => {
            let tenants = store.get_all_tenants()?;
            let default = store.get_default_tenant()?;
            match format {
                OutputFormat::Json => print_json(&tenants)?,
                OutputFormat::Text => {
                    if tenants.is_empty() {
                        println!("No tenants.");
                    }
                    for t in &tenants {
                        let marker = if default.as_deref().is_some_and(|d| d.eq_ignore_ascii_case(&t.name)) {
                            "*".green().bold()
                        } else {
                            " ".normal()
                        };
                        println!("{marker} {}  {}", t.name.yellow(), t.long_name.as_deref().unwrap_or("").dimmed());
                    }
                }
            }
        }
        TenantAction::Show { name } => {
            let Some(tenant) = store.get_tenant(&name)? else {
                bail!("no such tenant: {name}");
            };
            let providers = store.get_default_providers(&name)?;
            match format {
                OutputFormat::Json => print_json(&json!({
                    "tenant": tenant,
                    "default_providers": providers,
                }))?,
                OutputFormat::Text => {
                    println!("Tenant {}", tenant.name.yellow().bold());
                    if let Some(long_name) = &tenant.long_name {
                        println!("  Long name: {long_name}");
                    }
                    if let Some(guid) = &tenant.guid {
                        println!("  GUID: {}", guid.cyan());
                    }
                    if let Some(issuer) = &tenant.issuer_name {
                        println!("  Issuer: {issuer}");
                    }
                    println!("  Default provider: {}", providers.first().map_or("(none)", String::as_str));
                }
            }
        }
        TenantAction::Delete { name } => {
            store.delete_tenant(&name)?;
            println!("{} Deleted tenant {}", "✓".green().bold(), name.yellow());
        }
        TenantAction::DefaultTenant { name: Some(name) } => {
            store.set_default_tenant(&name)?;
            println!("{} Default tenant is now {}", "✓".green().bold(), name.yellow());
        }
        TenantAction::DefaultTenant { name: None } => {
            let default = store.get_default_tenant()?;
            match format {
                OutputFormat::Json => print_json(&json!({ "default_tenant": default }))?,
                OutputFormat::Text => println!("{}", default.as_deref().unwrap_or("(none)")),
            }
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// OIDC clients
// ---------------------------------------------------------------------------

fn cmd_oidc(store: &Store, action: OidcAction, format: OutputFormat) -> anyhow::Result<()> {
    match action {
        OidcAction::Add { tenant, client_id, redirect_uris, scopes } => {
            let builder = redirect_uris
                .into_iter()
                .fold(OidcClient::builder(&client_id), |b, uri| b.with_redirect_uri(uri));
            let client = scopes.into_iter().fold(builder, |b, scope| b.with_scope(scope)).build();
            store.add_oidc_client(&tenant, &client)?;
            println!("{} Registered client {} in {}", "✓".green().bold(), client_id.yellow(), tenant.bold());
        }
        OidcAction::List { tenant } => {
            let clients = store.get_oidc_clients(&tenant)?;
            match format {
                OutputFormat::Json => print_json(&clients)?,
                OutputFormat::Text => {
                    if clients.is_empty() {
                        println!("No OIDC clients.");
                    }
                    for c in &clients {
                        println!("{}", c.client_id.yellow());
                        for uri in &c.redirect_uris {
                            println!("  redirect: {}", uri.blue());
                        }
                        if !c.scopes.is_empty() {
                            println!("  scopes: {}", c.scopes.join(" "));
                        }
                    }
                }
            }
        }
        OidcAction::Delete { tenant, client_id } => {
            store.delete_oidc_client(&tenant, &client_id)?;
            println!("{} Deleted client {}", "✓".green().bold(), client_id.yellow());
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Identity providers
// ---------------------------------------------------------------------------

fn cmd_provider(store: &Store, action: ProviderAction, format: OutputFormat) -> anyhow::Result<()> {
    match action {
        ProviderAction::List { tenant } => {
            let providers = store.get_providers(&tenant, DomainType::ALL)?;
            match format {
                OutputFormat::Json => print_json(&providers)?,
                OutputFormat::Text => {
                    let defaults = store.get_default_providers(&tenant)?;
                    for p in &providers {
                        let marker = if defaults.iter().any(|d| d.eq_ignore_ascii_case(&p.name)) {
                            "*".green().bold()
                        } else {
                            " ".normal()
                        };
                        println!(
                            "{marker} {}  {}{}",
                            p.name.yellow(),
                            p.domain_type.to_string().cyan(),
                            p.alias.as_deref().map(|a| format!("  (alias {a})")).unwrap_or_default(),
                        );
                    }
                }
            }
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Dump
// ---------------------------------------------------------------------------

fn render_item(attribute: &str, item: &[u8]) -> String {
    if REDACTED.iter().any(|r| r.eq_ignore_ascii_case(attribute)) {
        return "<redacted>".to_string();
    }
    match std::str::from_utf8(item) {
        Ok(s) if !s.chars().any(char::is_control) => s.to_string(),
        _ => format!("<{} bytes>", item.len()),
    }
}

fn entry_json(entry: &Entry) -> serde_json::Value {
    let attributes: serde_json::Map<String, serde_json::Value> = entry
        .attributes
        .iter()
        .map(|a| {
            let values = a.value.items().iter().map(|i| render_item(&a.name, i)).collect::<Vec<_>>();
            (a.name.clone(), json!(values))
        })
        .collect();
    json!({ "dn": entry.dn.to_string(), "attributes": attributes })
}

fn cmd_dump(directory: &InMemoryDirectory, format: OutputFormat) -> anyhow::Result<()> {
    let entries = directory.entries();
    match format {
        OutputFormat::Json => print_json(&entries.iter().map(entry_json).collect::<Vec<_>>())?,
        OutputFormat::Text => {
            for entry in &entries {
                println!("{}", entry.dn.to_string().bold());
                for attribute in &entry.attributes {
                    for item in attribute.value.items() {
                        println!("  {}: {}", attribute.name.cyan(), render_item(&attribute.name, item));
                    }
                }
                println!();
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use dirconf_types::RawValue;
    use std::path::PathBuf;

    fn run(store: &Path, args: &[&str]) -> anyhow::Result<()> {
        let mut argv = vec!["dirconf", "--store", store.to_str().unwrap()];
        argv.extend_from_slice(args);
        run_command(Cli::try_parse_from(argv).unwrap())
    }

    fn reopen(path: &Path) -> Store {
        ConfigStore::new(InMemoryDirectory::load_from(path).unwrap(), ConfigStoreSettings::default())
    }

    fn initialized() -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dirconf.json");
        run(&path, &["init"]).unwrap();
        (dir, path)
    }

    // -----------------------------------------------------------------------
    // Init
    // -----------------------------------------------------------------------

    #[test]
    fn init_refuses_to_overwrite() {
        let (_dir, path) = initialized();
        assert!(run(&path, &["init"]).is_err());
        run(&path, &["init", "--force"]).unwrap();
    }

    #[test]
    fn commands_require_a_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.json");
        assert!(run(&path, &["tenant", "list"]).is_err());
        assert!(!path.exists());
    }

    // -----------------------------------------------------------------------
    // Tenants and clients
    // -----------------------------------------------------------------------

    #[test]
    fn tenant_lifecycle_persists() {
        let (_dir, path) = initialized();
        run(&path, &["tenant", "add", "acme", "--long-name", "Acme Corp", "--admin-password", "pw"]).unwrap();
        run(&path, &["tenant", "default", "acme"]).unwrap();
        run(&path, &["tenant", "list", "--format", "json"]).unwrap();
        run(&path, &["tenant", "show", "acme"]).unwrap();
        run(&path, &["provider", "list", "acme"]).unwrap();

        let store = reopen(&path);
        let tenant = store.get_tenant("acme").unwrap().unwrap();
        assert_eq!(tenant.long_name.as_deref(), Some("Acme Corp"));
        assert_eq!(store.get_default_tenant().unwrap().as_deref(), Some("acme"));

        run(&path, &["tenant", "delete", "acme"]).unwrap();
        assert!(reopen(&path).get_tenant("acme").unwrap().is_none());
    }

    #[test]
    fn failed_command_leaves_snapshot_untouched() {
        let (_dir, path) = initialized();
        run(&path, &["tenant", "add", "acme", "--admin-password", "pw"]).unwrap();
        let before = std::fs::read(&path).unwrap();
        assert!(run(&path, &["tenant", "add", "acme", "--admin-password", "pw"]).is_err());
        assert_eq!(std::fs::read(&path).unwrap(), before);
    }

    #[test]
    fn oidc_clients_roundtrip_through_snapshot() {
        let (_dir, path) = initialized();
        run(&path, &["tenant", "add", "acme", "--admin-password", "pw"]).unwrap();
        run(&path, &["oidc", "add", "acme", "app", "--redirect-uri", "https://app/cb", "--scope", "openid"]).unwrap();
        assert!(run(&path, &["oidc", "add", "acme", "other", "--redirect-uri", "https://app/cb"]).is_err());

        let clients = reopen(&path).get_oidc_clients("acme").unwrap();
        assert_eq!(clients.len(), 1);
        assert_eq!(clients[0].redirect_uris, vec!["https://app/cb"]);
        assert_eq!(clients[0].scopes, vec!["openid"]);

        run(&path, &["oidc", "delete", "acme", "app"]).unwrap();
        assert!(reopen(&path).get_oidc_clients("acme").unwrap().is_empty());
    }

    // -----------------------------------------------------------------------
    // Dump rendering
    // -----------------------------------------------------------------------

    #[test]
    fn secrets_are_redacted() {
        assert_eq!(render_item(provider::attr::PASSWORD, b"ciphertext"), "<redacted>");
        assert_eq!(render_item("vmwststenantkey", b"k"), "<redacted>");
        assert_eq!(render_item("cn", b"acme"), "acme");
        assert_eq!(render_item("userCertificate", &[0x30, 0x82, 0x00, 0x01]), "<4 bytes>");
    }

    #[test]
    fn entry_json_lists_every_value() {
        let mut entry = Entry::new(dirconf_types::Dn::parse("cn=x,dc=test").unwrap());
        entry.set("vmwOidcRedirectURIs", RawValue::from_strings(["a", "b"]));
        let value = entry_json(&entry);
        assert_eq!(value["dn"], "cn=x,dc=test");
        assert_eq!(value["attributes"]["vmwOidcRedirectURIs"], json!(["a", "b"]));
    }

    #[test]
    fn dump_runs_in_both_formats() {
        let (_dir, path) = initialized();
        run(&path, &["tenant", "add", "acme", "--admin-password", "pw"]).unwrap();
        run(&path, &["dump"]).unwrap();
        run(&path, &["dump", "--format", "json"]).unwrap();
    }
}
