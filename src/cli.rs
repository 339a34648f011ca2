use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "usdc-transfers-monitor",
    version,
    about = "Cross-chain USDC transfer dashboard"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the dashboard HTTP server
    Serve {
        /// Override bind address, e.g. 0.0.0.0:8080
        #[arg(long)]
        addr: Option<String>,
    },
    /// List the datasets and the URLs they are fetched from
    Datasets,
    /// Fetch one dataset and print its rows as JSON
    Fetch {
        /// Dataset name, e.g. "Wallet Types"
        #[arg(long)]
        kind: String,
    },
    /// Print the composed view for a selection as JSON
    Render {
        /// Chain to include; repeat for several. All chains when omitted
        #[arg(long = "chain")]
        chains: Vec<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_fetch_with_spaced_kind() {
        let cli = Cli::parse_from(["usdc-transfers-monitor", "fetch", "--kind", "Wallet Types"]);
        assert!(matches!(cli.command, Commands::Fetch { kind } if kind == "Wallet Types"));
    }

    #[test]
    fn render_chains_are_optional() {
        let cli = Cli::parse_from(["usdc-transfers-monitor", "render"]);
        assert!(matches!(cli.command, Commands::Render { chains } if chains.is_empty()));
    }

    #[test]
    fn render_chain_repeats_and_keeps_commas() {
        let cli = Cli::parse_from([
            "usdc-transfers-monitor",
            "render",
            "--chain",
            "Polygon",
            "--chain",
            "BNB, Chain",
        ]);
        assert!(matches!(
            cli.command,
            Commands::Render { chains } if chains == ["Polygon", "BNB, Chain"]
        ));
    }
}
