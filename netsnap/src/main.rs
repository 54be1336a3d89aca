//! netsnap command-line entry point.

use std::path::PathBuf;
use std::process;
use std::time::Duration;

use clap::{Parser, ValueEnum};

use netsnap::BatchConfig;
use netsnap::transport::HostKeyVerification;

/// Back up running configurations and collect facts from Cisco devices.
#[derive(Debug, Parser)]
#[command(name = "netsnap", version, about)]
struct Cli {
    /// CSV device list (hostname,ip,username,password,secret,device_type,ntp)
    #[arg(long, env = "NETSNAP_DEVICES", default_value = "devices.csv")]
    devices: PathBuf,

    /// Root directory for configuration backups
    #[arg(long, env = "NETSNAP_BACKUP_DIR", default_value = "backup")]
    backup_dir: PathBuf,

    /// Pause after each terminal setup command, in milliseconds
    #[arg(long, env = "NETSNAP_PRIME_DELAY_MS", default_value_t = 1000)]
    prime_delay_ms: u64,

    /// SSH connect and prompt timeout, in seconds
    #[arg(long, env = "NETSNAP_TIMEOUT_SECS", default_value_t = 30)]
    timeout_secs: u64,

    /// SSH port
    #[arg(long, env = "NETSNAP_PORT", default_value_t = 22)]
    port: u16,

    /// Host key checking mode
    #[arg(
        long,
        env = "NETSNAP_HOST_KEY_CHECKING",
        value_enum,
        default_value_t = HostKeyChecking::AcceptNew
    )]
    host_key_checking: HostKeyChecking,

    /// known_hosts file [default: ~/.ssh/known_hosts]
    #[arg(long, env = "NETSNAP_KNOWN_HOSTS")]
    known_hosts: Option<PathBuf>,

    /// Set every device clock to GMT+0 before checking NTP
    #[arg(long, env = "NETSNAP_SET_TIMEZONE")]
    set_timezone: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum HostKeyChecking {
    /// Reject unknown and changed keys
    Strict,
    /// Learn unknown keys, reject changed keys
    AcceptNew,
    /// Accept any key
    Off,
}

impl From<HostKeyChecking> for HostKeyVerification {
    fn from(mode: HostKeyChecking) -> Self {
        match mode {
            HostKeyChecking::Strict => HostKeyVerification::Strict,
            HostKeyChecking::AcceptNew => HostKeyVerification::AcceptNew,
            HostKeyChecking::Off => HostKeyVerification::Disabled,
        }
    }
}

impl From<Cli> for BatchConfig {
    fn from(cli: Cli) -> Self {
        Self {
            device_file: cli.devices,
            backup_root: cli.backup_dir,
            prime_delay: Duration::from_millis(cli.prime_delay_ms),
            timeout: Duration::from_secs(cli.timeout_secs),
            port: cli.port,
            host_key_verification: cli.host_key_checking.into(),
            known_hosts: cli.known_hosts,
            set_timezone: cli.set_timezone,
        }
    }
}

#[tokio::main]
async fn main() {
    // RUST_LOG=debug shows every state transition
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = BatchConfig::from(Cli::parse());

    match netsnap::run(&config, |report| println!("{}", report)).await {
        Ok(_) => {}
        Err(e) => {
            eprintln!("netsnap: {}", e);
            process::exit(1);
        }
    }
}
