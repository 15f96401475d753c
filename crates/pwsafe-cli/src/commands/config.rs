use crate::app::AppContext;
use crate::config::{write_config, PwsafeConfig};
use crate::errors::CliError;

pub fn handle_config_init(ctx: &AppContext, force: bool) -> anyhow::Result<()> {
    let path = ctx.config_path();
    if path.exists() && !force {
        return Err(CliError::invalid_input(format!(
            "Config already exists at {} (use --force to overwrite)",
            path.display()
        ))
        .into());
    }
    let config = PwsafeConfig::with_safe_path(&ctx.safe_path()?);
    write_config(path, &config)?;
    if !ctx.quiet() {
        println!("Wrote config to {}", path.display());
    }
    Ok(())
}

pub fn handle_config_show(ctx: &AppContext) -> anyhow::Result<()> {
    let contents =
        toml::to_string_pretty(ctx.config()).map_err(|e| anyhow::anyhow!("TOML error: {}", e))?;
    if !ctx.quiet() {
        println!("# {}", ctx.config_path().display());
    }
    print!("{}", contents);
    Ok(())
}
