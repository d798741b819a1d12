use anyhow::Context;
use clap::Parser;
use page_manager::config::Command;
use page_manager::domain::model::User;
use page_manager::utils::logger;
use page_manager::{server, CliConfig, PageError, Site, SiteConfig};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    // 初始化日誌
    match &cli.command {
        Command::Serve {
            json_logs: true, ..
        } => logger::init_json_logger(cli.verbose),
        _ => logger::init_cli_logger(cli.verbose),
    }
    tracing::debug!("CLI config: {:?}", cli);

    tracing::info!("📁 Loading site from: {}", cli.config);
    let config = SiteConfig::from_file(&cli.config)
        .with_context(|| format!("Failed to load config file '{}'", cli.config))?;
    let bind = config.server.bind.clone();

    let site = match Site::from_config(config) {
        Ok(site) => site,
        Err(e) => {
            tracing::error!("❌ Site configuration is invalid: {}", e);
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(1);
        }
    };

    match cli.command {
        Command::Serve { bind: override_bind, .. } => {
            let bind = override_bind.unwrap_or(bind);
            server::serve(Arc::new(site), &bind)
                .await
                .with_context(|| format!("Server on {} stopped with an error", bind))?;
        }
        Command::Resolve { path, user } => {
            let user = match user {
                Some(name) => site
                    .user_by_name(&name)
                    .cloned()
                    .with_context(|| format!("No user named '{}' in the config", name))?,
                None => User::anonymous(),
            };

            match site.view(&path, &user).await {
                Ok(rendered) => println!("{}", serde_json::to_string_pretty(&rendered)?),
                Err(e @ PageError::NotFound { .. }) => {
                    eprintln!("❌ {}", e.user_friendly_message());
                    std::process::exit(1);
                }
                Err(e) => return Err(e.into()),
            }
        }
        Command::Check => {
            println!(
                "✅ Site '{}' is valid ({} layout(s): {})",
                site.name(),
                site.registry().len(),
                site.registry().kinds().collect::<Vec<_>>().join(", ")
            );
        }
    }

    Ok(())
}
