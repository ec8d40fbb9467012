use std::{
    error::Error,
    io::{self, Write},
    process,
    sync::Arc,
    time::Duration,
};

use clap::{Parser, ValueEnum};
use pundun::{CliError, Credentials, Mechanism, Session, SessionConfig, execute, prompt};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum MechanismArg {
    Sha1,
    Sha256,
}

impl From<MechanismArg> for Mechanism {
    fn from(arg: MechanismArg) -> Self {
        match arg {
            MechanismArg::Sha1 => Mechanism::Sha1,
            MechanismArg::Sha256 => Mechanism::Sha256,
        }
    }
}

#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Server address as host:port
    #[arg(default_value = "127.0.0.1:8887")]
    address: String,
    #[arg(short, long, env = "PUNDUN_USER", default_value = "admin")]
    user: String,
    #[arg(short, long, env = "PUNDUN_PASSWORD", hide_env_values = true)]
    password: String,
    /// Connect without TLS
    #[arg(long)]
    plain: bool,
    /// Seconds a call may wait for its response
    #[arg(long, default_value_t = 30)]
    timeout: u64,
    #[arg(long, value_enum, default_value_t = MechanismArg::Sha1)]
    mechanism: MechanismArg,
}

fn main() -> Result<(), Box<dyn Error>> {
    // Initialize env_logger; For logging to STDOUT/STDERR
    env_logger::init();

    let cli = Cli::parse();
    let credentials = Credentials::new(cli.user, cli.password);
    let config = SessionConfig::default()
        .with_call_timeout(Duration::from_secs(cli.timeout))
        .with_mechanism(cli.mechanism.into());

    let session = if cli.plain {
        Session::connect_plain(&cli.address, &credentials, config)?
    } else {
        Session::connect_with(&cli.address, &credentials, config)?
    };
    let session = Arc::new(session);

    let on_interrupt = Arc::clone(&session);
    ctrlc::set_handler(move || {
        on_interrupt.shutdown();
        process::exit(130);
    })?;

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    loop {
        let command = match prompt(stdin.lock(), stdout.lock()) {
            Ok(c) => c,
            Err(CliError::Io(e)) => return Err(e.into()),
            Err(e) => {
                eprintln!("error: {e}");
                continue;
            }
        };

        match execute(&session, command, &mut stdout) {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) if e.is_fatal() => {
                eprintln!("session lost: {e}");
                break;
            }
            Err(e) => eprintln!("query error: {e}"),
        }
        stdout.flush()?;
    }

    session.close();
    Ok(())
}
