//! tapctl - persistent tap interface management.
//!
//! Creates, deletes and bridges tap devices for virtual machines. Every
//! failure exits with a status specific to its kind so wrapper scripts can
//! branch on it.

mod output;

use std::path::PathBuf;
use std::process;

use clap::{ArgAction, Parser, Subcommand};
use tapctl::{Config, LinkState, TapManager};
use tracing_subscriber::EnvFilter;

use output::{OutputFormat, OutputOptions};

/// Exit status when writing results to stdout fails.
const OUTPUT_ERROR_EXIT_CODE: i32 = 10;

#[derive(Parser)]
#[command(name = "tapctl", version, about = "Persistent tap interface management")]
#[command(after_help = "Exit status: 0 ok, 1 usage, 2 control node, 3 ioctl, \
    4 user, 5 group, 6 bridge socket, 7 interface, 8 bridge attach, 9 sysfs, 10 output.")]
struct Cli {
    /// Tap control device node.
    #[arg(
        long,
        global = true,
        env = "TAPCTL_TUN_DEVICE",
        default_value = tapctl::TUN_DEVICE_PATH
    )]
    tun_device: PathBuf,

    /// Increase log verbosity (-v info, -vv debug).
    #[arg(short = 'v', long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create a persistent tap interface and bring it up.
    Create {
        /// Interface name.
        tap: String,
        /// Owner user (defaults to root).
        user: Option<String>,
        /// Owner group (defaults to root).
        group: Option<String>,
    },

    /// Bring a tap interface down and delete it.
    #[command(visible_alias = "del")]
    Delete {
        /// Interface name.
        tap: String,
    },

    /// Attach an interface to an existing bridge.
    Bridge {
        /// Interface name.
        tap: String,
        /// Bridge name.
        bridge: String,
    },

    /// Bring an interface administratively up.
    Up {
        /// Interface name.
        tap: String,
    },

    /// Bring an interface administratively down.
    Down {
        /// Interface name.
        tap: String,
    },

    /// Show a tun/tap interface.
    Show {
        /// Interface name.
        tap: String,
        #[command(flatten)]
        format: OutputArgs,
    },

    /// List tun/tap interfaces.
    #[command(visible_alias = "ls")]
    List {
        #[command(flatten)]
        format: OutputArgs,
    },
}

#[derive(clap::Args)]
struct OutputArgs {
    /// Output JSON.
    #[arg(short = 'j', long)]
    json: bool,

    /// Pretty print JSON.
    #[arg(short = 'p', long)]
    pretty: bool,
}

impl OutputArgs {
    fn format(&self) -> OutputFormat {
        if self.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }

    fn options(&self) -> OutputOptions {
        OutputOptions {
            pretty: self.pretty,
        }
    }
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        // --help and --version print to stdout and exit 0
        Err(e) if !e.use_stderr() => e.exit(),
        Err(e) => {
            let _ = e.print();
            process::exit(tapctl::ARGUMENT_ERROR_EXIT_CODE);
        }
    };

    init_tracing(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("tapctl: {}", e);
        process::exit(exit_code(&e));
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        _ => tracing::Level::DEBUG,
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::new().tun_device(cli.tun_device);
    let manager = TapManager::new(config);

    match cli.command {
        Command::Create { tap, user, group } => {
            let user = user.as_deref().unwrap_or(manager.config().default_user_name());
            let group = group
                .as_deref()
                .unwrap_or(manager.config().default_group_name());
            manager.create(&tap, user, group)?;
        }
        Command::Delete { tap } => manager.delete(&tap)?,
        Command::Bridge { tap, bridge } => manager.bridge(&tap, &bridge)?,
        Command::Up { tap } => manager.set_state(&tap, LinkState::Up)?,
        Command::Down { tap } => manager.set_state(&tap, LinkState::Down)?,
        Command::Show { tap, format } => {
            let info = manager.query(&tap)?;
            output::print_one(&info, format.format(), &format.options())?;
        }
        Command::List { format } => {
            let devices = manager.list()?;
            output::print_all(&devices, format.format(), &format.options())?;
        }
    }

    Ok(())
}

fn exit_code(err: &anyhow::Error) -> i32 {
    err.downcast_ref::<tapctl::Error>()
        .map_or(OUTPUT_ERROR_EXIT_CODE, tapctl::Error::exit_code)
}
