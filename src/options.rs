use clap::Parser;

/// Session-scoped song preview service
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Path to the TOML configuration file (default: `prevue.toml`)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Address to listen on, overrides `system.bind_addr`
    #[arg(short, long)]
    pub address: Option<String>,

    /// Delete previews of expired sessions once and exit
    #[arg(long, default_value_t = false)]
    pub gc: bool,
}
