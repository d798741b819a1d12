use clap::{Parser, Subcommand};

#[derive(Debug, Clone, Parser)]
#[command(name = "page-manager")]
#[command(about = "Serve and inspect hierarchical pages paired with layout types")]
pub struct CliConfig {
    /// Path to the site TOML file
    #[arg(short, long, global = true, default_value = "site.toml")]
    pub config: String,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Run the HTTP server
    Serve {
        /// Override `server.bind` from the config file
        #[arg(long)]
        bind: Option<String>,

        /// Emit logs as JSON lines
        #[arg(long)]
        json_logs: bool,
    },
    /// Resolve a URL path and print the matching page as JSON
    Resolve {
        path: String,

        /// Resolve as this configured user instead of anonymously
        #[arg(long)]
        user: Option<String>,
    },
    /// Validate the config file and page tree, then exit
    Check,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_resolve() {
        let cli =
            CliConfig::try_parse_from(["page-manager", "resolve", "about/team", "-c", "demo.toml"])
                .unwrap();
        assert_eq!(cli.config, "demo.toml");
        match cli.command {
            Command::Resolve { path, user } => {
                assert_eq!(path, "about/team");
                assert!(user.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_serve_defaults() {
        let cli = CliConfig::try_parse_from(["page-manager", "serve"]).unwrap();
        assert_eq!(cli.config, "site.toml");
        assert!(!cli.verbose);
        assert!(matches!(
            cli.command,
            Command::Serve {
                bind: None,
                json_logs: false
            }
        ));
    }
}
