use std::path::PathBuf;

use clap::Parser;

#[derive(Parser)]
#[command(
    name = "echo",
    about = "Echo — peer-to-peer LAN notepad sync",
    version,
)]
pub struct Cli {
    /// Username announced to the subnet (prompted for when omitted)
    #[arg(short, long)]
    pub username: Option<String>,

    /// Role this peer plays (prompted for when omitted)
    #[arg(short, long, value_enum)]
    pub role: Option<RoleArg>,

    /// Discovery UDP port; falls back to ECHO_DISCOVERY_PORT, then 45000
    #[arg(long)]
    pub discovery_port: Option<u16>,

    /// TCP port readers listen on; falls back to ECHO_TCP_PORT, then a
    /// random port in 40000-49999
    #[arg(long)]
    pub tcp_port: Option<u16>,

    /// Directory synced files live under
    #[arg(long, default_value = ".")]
    pub root: PathBuf,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum RoleArg {
    Writer,
    Reader,
}
