use clap::{Parser, ValueEnum};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TransportArg {
    Tcp,
    Uds,
}

/// Tessera renderer: owns native widgets and serves the bridge protocol.
///
/// Prints one JSON handshake line on stdout, then serves requests until it
/// reads `shutdown` on stdin, stdin closes, or a `quit` request arrives.
#[derive(Parser, Debug)]
#[command(name = "tessera-renderer", version, about)]
pub struct Args {
    /// Transport override (defaults to the config's `bridge.transport`).
    #[arg(long, value_enum)]
    pub transport: Option<TransportArg>,

    /// Socket path for the `uds` transport.
    #[arg(long)]
    pub socket_path: Option<String>,

    /// Config file path override.
    #[arg(long)]
    pub config: Option<String>,

    /// Log filter directive override (e.g. `tessera=debug`).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Print the effective config as JSON and exit.
    #[arg(long)]
    pub print_config: bool,
}

pub fn parse() -> Args {
    Args::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_uds_arguments() {
        let args = Args::parse_from([
            "tessera-renderer",
            "--transport",
            "uds",
            "--socket-path",
            "/tmp/t.sock",
        ]);
        assert_eq!(args.transport, Some(TransportArg::Uds));
        assert_eq!(args.socket_path.as_deref(), Some("/tmp/t.sock"));
    }

    #[test]
    fn defaults_are_empty() {
        let args = Args::parse_from(["tessera-renderer"]);
        assert!(args.transport.is_none());
        assert!(args.log_level.is_none());
        assert!(!args.print_config);
    }

    #[test]
    fn print_config_flag() {
        let args = Args::parse_from(["tessera-renderer", "--print-config", "--config", "a.toml"]);
        assert!(args.print_config);
        assert_eq!(args.config.as_deref(), Some("a.toml"));
    }
}
