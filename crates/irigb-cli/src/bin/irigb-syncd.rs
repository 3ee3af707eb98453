//! `irigb-syncd` — keep the host clock and the IRIG-B card's RTC aligned.
//!
//! Configures the sync source's input, then syncs every `--interval`
//! seconds until SIGINT, SIGTERM or SIGHUP. Runs in the foreground; leave
//! daemonizing to the service manager.
//!
//! ```text
//! irigb-syncd -t diff -s port1 -n 10          # host follows the card
//! irigb-syncd -t ttl -s fiber --direction host-to-rtc
//! ```

use std::path::PathBuf;
use std::thread;

use anyhow::{Context, Result};
use clap::Parser;
use irigb_cli::{init_tracing, open_device, DirectionArg, ParityArg, SignalTypeArg, SourceArg};
use irigb_driver::{
    BoardVariant, CancelToken, SignalType, SyncConfig, SyncController, SyncInterval, SyncSource,
    SystemClock, DEVICE_ENV,
};
use nix::sys::signal::{SigSet, Signal};
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "irigb-syncd", about = "IRIG-B card time sync daemon", version)]
struct Cli {
    /// Receiver type of the sync source's input.
    #[arg(short = 't', long, value_enum, default_value = "diff")]
    signal_type: SignalTypeArg,

    /// Invert the sync source's input.
    #[arg(short, long)]
    invert: bool,

    /// RTC sync source [default: fiber for TTL on DE2-IRIGB-4DIO, else port1].
    #[arg(short, long, value_enum)]
    source: Option<SourceArg>,

    /// Seconds between syncs.
    #[arg(
        short = 'n',
        long,
        default_value_t = 10,
        value_parser = clap::value_parser!(u64).range(1..=86_400)
    )]
    interval: u64,

    /// Parity check on the sync source's decoder.
    #[arg(short, long, value_enum, default_value = "even")]
    parity: ParityArg,

    /// Which clock each sync sets.
    #[arg(long, value_enum, default_value = "rtc-to-host")]
    direction: DirectionArg,

    /// Device node (default /dev/moxa_irigb).
    #[arg(short, long, env = DEVICE_ENV)]
    device: Option<PathBuf>,
}

/// The DE2 board only takes TTL on its fiber input.
fn default_source(variant: BoardVariant, signal_type: SignalType) -> SyncSource {
    if variant == BoardVariant::De2Irigb4Dio && signal_type == SignalType::Ttl {
        SyncSource::Fiber
    } else {
        SyncSource::Port1
    }
}

/// Block termination signals in this and every later thread, and cancel
/// `token` from a dedicated thread when one arrives.
fn spawn_signal_waiter(token: CancelToken) -> Result<()> {
    let mut mask = SigSet::empty();
    for sig in [Signal::SIGINT, Signal::SIGTERM, Signal::SIGHUP] {
        mask.add(sig);
    }
    mask.thread_block().context("Cannot block termination signals")?;

    thread::Builder::new()
        .name("signal-wait".into())
        .spawn(move || match mask.wait() {
            Ok(sig) => {
                info!("Received {}, stopping", sig.as_str());
                token.cancel();
            }
            Err(e) => {
                error!("Signal wait failed: {e}");
                token.cancel();
            }
        })
        .context("Cannot spawn signal thread")?;
    Ok(())
}

fn main() -> Result<()> {
    init_tracing("info");

    let cli = Cli::parse();
    let interval = SyncInterval::new(cli.interval)?;

    let token = CancelToken::new();
    spawn_signal_waiter(token.clone())?;

    let mut dev = open_device(cli.device.as_deref())?;
    let signal_type = SignalType::from(cli.signal_type);
    let config = SyncConfig {
        source: cli
            .source
            .map_or_else(|| default_source(dev.variant(), signal_type), SyncSource::from),
        signal_type,
        invert: cli.invert,
        parity: cli.parity.into(),
        interval,
        direction: cli.direction.into(),
    };

    let mut controller = SyncController::new(&mut dev, SystemClock, config, token);
    let report = controller
        .run()
        .context("Sync configuration rejected by the card")?;
    info!(
        "Exiting: {} syncs, {} failed",
        report.iterations, report.failures
    );
    Ok(())
}
