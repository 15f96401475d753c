//! Whole-safe commands: info, passwd, policies.

use crate::app::AppContext;
use crate::errors::classify;
use crate::helpers::prompt_new_passphrase;
use crate::output::{print_info, print_policies, PolicySummary, SafeInfo};

fn format_version(version: u16) -> String {
    format!("PWS3 {}.{:02}", version >> 8, version & 0xFF)
}

pub fn handle_info(ctx: &AppContext) -> anyhow::Result<()> {
    let (document, path) = ctx.open_document()?;
    let info = SafeInfo {
        path: path.display().to_string(),
        version: format_version(document.version()),
        uuid: document.uuid().to_string(),
        name: document.name().map_err(classify)?,
        description: document.description().map_err(classify)?,
        iterations: document.iterations(),
        last_save_time: document.last_save_time().map_err(classify)?,
        last_save_application: document.last_save_application().map_err(classify)?,
        last_save_user: document.last_save_user().map_err(classify)?,
        last_save_host: document.last_save_host().map_err(classify)?,
        entries: document.entries().len(),
    };
    print_info(&info);
    Ok(())
}

pub fn handle_passwd(ctx: &AppContext) -> anyhow::Result<()> {
    let (mut document, path) = ctx.open_document()?;
    let passphrase = prompt_new_passphrase(ctx.interactive())?;
    document.change_passphrase(&passphrase).map_err(classify)?;
    ctx.save_document(&mut document, &path)?;
    if !ctx.quiet() {
        println!("Passphrase changed for {}", path.display());
    }
    Ok(())
}

pub fn handle_policies(ctx: &AppContext) -> anyhow::Result<()> {
    let (document, _) = ctx.open_document()?;
    let policies: Vec<PolicySummary> = document
        .named_password_policies()
        .iter()
        .map(|named| PolicySummary {
            name: named.name().to_string(),
            length: named.policy().total_password_length(),
            style: named.policy().style().to_string(),
            symbols: named.policy().special_symbol_set().iter().collect(),
        })
        .collect();
    print_policies(&policies, ctx.quiet());
    Ok(())
}
