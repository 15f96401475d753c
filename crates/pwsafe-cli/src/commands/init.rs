use pwsafe_core::Document;
use tracing::info;

use crate::app::AppContext;
use crate::cli::InitArgs;
use crate::errors::{classify, CliError};
use crate::helpers::prompt_init_passphrase;

pub fn handle_init(ctx: &AppContext, args: &InitArgs) -> anyhow::Result<()> {
    let path = match &args.path {
        Some(path) => path.clone(),
        None => ctx.safe_path()?,
    };
    if path.exists() {
        return Err(CliError::invalid_input(format!(
            "A file already exists at {}",
            path.display()
        ))
        .into());
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| {
            anyhow::anyhow!("Failed to create directory {}: {}", parent.display(), e)
        })?;
    }

    let passphrase = prompt_init_passphrase(ctx.interactive())?;
    let mut document = Document::with_passphrase(&passphrase);
    ctx.configure(&mut document)?;
    if let Some(iterations) = args.iterations {
        document.set_iterations(iterations).map_err(classify)?;
    }
    if let Some(name) = &args.name {
        document.set_name(name).map_err(classify)?;
    }
    if let Some(description) = &args.description {
        document.set_description(description).map_err(classify)?;
    }
    document.save_to_path(&path).map_err(classify)?;
    info!(iterations = document.iterations(), "safe created");

    if !ctx.quiet() {
        println!("Initialized new safe at {}", path.display());
    }
    Ok(())
}
