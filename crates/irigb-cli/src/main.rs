//! `irigb` — inspect and configure a Moxa IRIG-B timing card.
//!
//! ```text
//! USAGE:
//!   irigb info                               Board, firmware, source, RTC
//!   irigb time                               Read the RTC
//!   irigb set-time <now|YYYY-MM-DD HH:MM:SS> Set the RTC
//!   irigb sync-host                          Set the host clock from the RTC
//!   irigb source [SOURCE]                    Get/set the RTC sync source
//!   irigb status <SOURCE>                    Decoder signal status
//!   irigb input <PORT> [--type T] [--invert] Get/set an input route
//!   irigb output <PORT> [--type T --mode M]  Get/set an output route
//!   irigb input-parity <SOURCE> [MODE]       Get/set decoder parity
//!   irigb output-parity [MODE]               Get/set encoder parity
//!   irigb pps-width [MS]                     Get/set PPS pulse width
//!   irigb dout <LINE> [LEVEL]                Get/set a digital output
//!   irigb din <LINE>                         Read a digital input
//!   irigb dump                               Raw register dump
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use clap::{Parser, Subcommand};
use irigb_cli::{
    init_tracing, open_device, LevelArg, ModeArg, ParityArg, PortArg, SignalTypeArg, SourceArg,
};
use irigb_driver::{CalendarTime, IrigbDevice, SyncSource, SystemClock, DEVICE_ENV};

#[derive(Parser)]
#[command(name = "irigb", about = "Moxa IRIG-B timing card utility", version)]
struct Cli {
    /// Device node (default /dev/moxa_irigb).
    #[arg(short, long, global = true, env = DEVICE_ENV)]
    device: Option<PathBuf>,

    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Board variant, firmware date, sync source and RTC time.
    Info,
    /// Read the RTC.
    Time,
    /// Set the RTC to a local time, or to the host clock with "now".
    SetTime {
        /// "now" or "YYYY-MM-DD HH:MM:SS".
        time: String,
    },
    /// Set the host clock from the RTC (needs CAP_SYS_TIME).
    SyncHost,
    /// Show or select the RTC sync source.
    Source {
        /// New source.
        #[arg(value_enum)]
        source: Option<SourceArg>,
    },
    /// Decoder signal status.
    Status {
        /// Source whose decoder to report.
        #[arg(value_enum)]
        source: SourceArg,
    },
    /// Show or set an input route.
    Input {
        /// Input port.
        #[arg(value_enum)]
        port: PortArg,
        /// Receiver type; omit to show the current route.
        #[arg(short = 't', long = "type", value_enum)]
        signal_type: Option<SignalTypeArg>,
        /// Invert the input.
        #[arg(short, long, requires = "signal_type")]
        invert: bool,
    },
    /// Show or set an output route.
    Output {
        /// Output port.
        #[arg(value_enum)]
        port: PortArg,
        /// Driver type; omit with --mode to show the current route.
        #[arg(short = 't', long = "type", value_enum, requires = "mode")]
        signal_type: Option<SignalTypeArg>,
        /// Output source.
        #[arg(short, long, value_enum, requires = "signal_type")]
        mode: Option<ModeArg>,
        /// Invert the output.
        #[arg(short, long, requires = "signal_type")]
        invert: bool,
    },
    /// Show or set a decoder's parity check.
    InputParity {
        /// Source whose decoder to configure.
        #[arg(value_enum)]
        source: SourceArg,
        /// New mode.
        #[arg(value_enum)]
        mode: Option<ParityArg>,
    },
    /// Show or set the encoder parity.
    OutputParity {
        /// New mode (even or odd).
        #[arg(value_enum)]
        mode: Option<ParityArg>,
    },
    /// Show or set the PPS pulse width in milliseconds.
    PpsWidth {
        /// New width, 0..=999.
        millis: Option<u16>,
    },
    /// Show or drive a digital output.
    Dout {
        /// Line, 0..=3.
        line: usize,
        /// New level.
        #[arg(value_enum)]
        level: Option<LevelArg>,
    },
    /// Read a digital input.
    Din {
        /// Line, 0..=3.
        line: usize,
    },
    /// Dump every register.
    Dump,
}

fn main() -> Result<()> {
    init_tracing("warn");

    let cli = Cli::parse();
    let mut dev = open_device(cli.device.as_deref())?;

    match cli.command {
        Cmd::Info => cmd_info(&mut dev)?,
        Cmd::Time => println!("{}", dev.read_time()?),
        Cmd::SetTime { time } => cmd_set_time(&mut dev, &time)?,
        Cmd::SyncHost => {
            let t = dev.sync_host_from_rtc(&mut SystemClock)?;
            println!("Host clock set to {t}");
        }
        Cmd::Source { source: None } => println!("{}", dev.sync_source()?),
        Cmd::Source { source: Some(s) } => dev.set_sync_source(s.into())?,
        Cmd::Status { source } => println!("{}", dev.signal_status(source.into())?),
        Cmd::Input {
            port,
            signal_type,
            invert,
        } => match signal_type {
            Some(ty) => dev.set_input(port.into(), ty.into(), invert)?,
            None => match dev.input(port.into())? {
                Some(cfg) => println!("{} invert={}", cfg.signal_type, cfg.invert),
                None => println!("not routed"),
            },
        },
        Cmd::Output {
            port,
            signal_type,
            mode,
            invert,
        } => match (signal_type, mode) {
            (Some(ty), Some(mode)) => dev.set_output(port.into(), ty.into(), mode.into(), invert)?,
            _ => {
                let cfg = dev.output(port.into())?;
                let mode = cfg
                    .mode
                    .map_or_else(|| "other".to_string(), |m| m.to_string());
                println!("{} {mode} invert={}", cfg.signal_type, cfg.invert);
            }
        },
        Cmd::InputParity { source, mode: None } => {
            println!("{}", dev.input_parity(source.into())?);
        }
        Cmd::InputParity {
            source,
            mode: Some(m),
        } => dev.set_input_parity(source.into(), m.into())?,
        Cmd::OutputParity { mode: None } => println!("{}", dev.output_parity()?),
        Cmd::OutputParity { mode: Some(m) } => dev.set_output_parity(m.into())?,
        Cmd::PpsWidth { millis: None } => println!("{} ms", dev.pps_width()?),
        Cmd::PpsWidth { millis: Some(ms) } => dev.set_pps_width(ms)?,
        Cmd::Dout { line, level: None } => println!("{}", dev.digital_output(line)?),
        Cmd::Dout {
            line,
            level: Some(l),
        } => dev.set_digital_output(line, l.into())?,
        Cmd::Din { line } => println!("{}", dev.digital_input(line)?),
        Cmd::Dump => cmd_dump(&mut dev)?,
    }

    Ok(())
}

fn cmd_info(dev: &mut IrigbDevice) -> Result<()> {
    let variant = dev.variant();
    println!("Board        : {variant} (hw id {})", variant.hw_id());
    println!("Firmware     : {}", dev.firmware_date()?);
    let source = dev.sync_source()?;
    println!("Sync source  : {source}");
    if source != SyncSource::FreeRun {
        match dev.signal_status(source) {
            Ok(status) => println!("Signal       : {status}"),
            Err(e) => println!("Signal       : ({e})"),
        }
    }
    let t = dev.read_time()?;
    println!("RTC          : {t}");
    let q = t.quality;
    println!(
        "Quality      : TQ={} TZ={:+} min DST={} leap pending={}",
        q.quality,
        q.tz_offset_minutes(),
        q.dst_active,
        q.leap_pending
    );
    Ok(())
}

fn cmd_set_time(dev: &mut IrigbDevice, time: &str) -> Result<()> {
    if time.eq_ignore_ascii_case("now") {
        let t = dev.sync_rtc_from_host(&mut SystemClock)?;
        println!("RTC set to {t}");
        return Ok(());
    }
    let parsed = NaiveDateTime::parse_from_str(time, "%Y-%m-%d %H:%M:%S")
        .with_context(|| format!("Expected \"YYYY-MM-DD HH:MM:SS\", got {time:?}"))?;
    let t = CalendarTime::from_naive(&parsed)?;
    dev.write_time(&t)?;
    println!("RTC set to {t}");
    Ok(())
}

fn cmd_dump(dev: &mut IrigbDevice) -> Result<()> {
    for (addr, value) in dev.dump_registers()? {
        println!("{addr:2} {:<10} {value:#010x}", irigb_driver::register_name(addr));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn output_needs_type_and_mode_together() {
        assert!(Cli::try_parse_from(["irigb", "output", "port1", "-t", "ttl"]).is_err());
        let cli =
            Cli::try_parse_from(["irigb", "output", "port2", "-t", "diff", "-m", "pps", "-i"]).unwrap();
        assert!(matches!(
            cli.command,
            Cmd::Output {
                port: PortArg::Port2,
                signal_type: Some(SignalTypeArg::Diff),
                mode: Some(ModeArg::Pps),
                invert: true,
            }
        ));
    }

    #[test]
    fn input_invert_requires_type() {
        assert!(Cli::try_parse_from(["irigb", "input", "fiber", "-i"]).is_err());
        assert!(Cli::try_parse_from(["irigb", "input", "fiber", "-t", "ttl", "-i"]).is_ok());
    }
}
