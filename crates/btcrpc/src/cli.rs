use clap::Parser;

/// btcrpc — issue a single Bitcoin Core JSON-RPC call and print the envelope.
#[derive(Parser)]
#[command(version, about)]
pub struct Cli {
    /// RPC username.
    #[arg(long, env = "BTCRPC_USER")]
    pub rpc_user: String,

    /// RPC password.
    #[arg(long, env = "BTCRPC_PASSWORD", hide_env_values = true)]
    pub rpc_password: String,

    /// Daemon host.
    #[arg(long, default_value = "127.0.0.1", env = "BTCRPC_HOST")]
    pub host: String,

    /// Daemon RPC port.
    #[arg(long, default_value = "8332", env = "BTCRPC_PORT")]
    pub port: u16,

    /// Whole-request timeout in seconds.
    #[arg(long, default_value = "30")]
    pub timeout_secs: u64,

    /// Refuse to start with an empty user or password.
    #[arg(long)]
    pub strict_credentials: bool,

    /// Print call counters to stderr after the call.
    #[arg(long)]
    pub stats: bool,

    /// RPC method name, e.g. `getblockcount`. `node-version` prints the
    /// daemon's version string instead.
    pub method: String,

    /// Positional params. Each is parsed as JSON, falling back to a string.
    pub params: Vec<String>,
}
