//! IRIG-B device session
//!
//! [`IrigbDevice`] owns one [`RegisterPort`] and the board variant resolved
//! when it was opened. Every operation validates against the variant's
//! layout before the first register access, then runs its register
//! sequence to completion; `&mut self` keeps sequences from interleaving.
//!
//! Writes are either *required* (failure is returned) or *best-effort*
//! (LED updates: failure is logged and ignored).

use std::path::{Path, PathBuf};

use irigb_chip::pcie::DEVICE_NODE;
use irigb_chip::regs::{self, input_port, pps, rtc_config};
use tracing::{debug, info, warn};

use crate::backend::RegisterPort;
use crate::backends::KernelPort;
use crate::clock::HostClock;
use crate::error::{ApplyStep, IrigbError, Result};
use crate::routing::{
    self, BitEdit, DigitalLevel, InputConfig, OutputConfig, OutputMode, ParityMode, Port,
    SignalStatus, SignalType, SyncSource,
};
use crate::rtc::{self, CalendarTime, FirmwareDate};
use crate::variant::{BoardVariant, Port1Selector, SyncLed};

/// Environment variable overriding the device node.
pub const DEVICE_ENV: &str = "IRIGB_DEVICE";

/// Longest PPS pulse the encoder accepts, in milliseconds.
pub const MAX_PPS_WIDTH_MS: u16 = 999;

/// Device node for card `index`: `$IRIGB_DEVICE` if set, else
/// `/dev/moxa_irigb` for card 0 and `/dev/moxa_irigbN` after that.
#[must_use]
pub fn device_path(index: usize) -> PathBuf {
    if let Some(path) = std::env::var_os(DEVICE_ENV) {
        return PathBuf::from(path);
    }
    if index == 0 {
        PathBuf::from(DEVICE_NODE)
    } else {
        PathBuf::from(format!("{DEVICE_NODE}{index}"))
    }
}

/// Open session on one IRIG-B card.
#[derive(Debug)]
pub struct IrigbDevice {
    port: Box<dyn RegisterPort>,
    variant: BoardVariant,
}

impl IrigbDevice {
    /// Open card `index` through the kernel driver.
    ///
    /// # Errors
    ///
    /// Returns `DeviceNotFound` if the node is missing, `UnknownVariant` if
    /// the board strap is not recognised, or a transport error.
    pub fn open(index: usize) -> Result<Self> {
        Self::open_path(device_path(index))
    }

    /// Open the card behind a specific device node.
    ///
    /// # Errors
    ///
    /// As [`Self::open`].
    pub fn open_path(path: impl AsRef<Path>) -> Result<Self> {
        let port = KernelPort::open(path)?;
        Self::with_port(Box::new(port))
    }

    /// Start a session over any register transport.
    ///
    /// Reads the board strap, enables both IRIG-B decoders and programs the
    /// board's default LED assignments. If the strap cannot be read or
    /// resolved the port is dropped, closing it.
    ///
    /// # Errors
    ///
    /// Returns `UnknownVariant` for an unrecognised strap, or a transport
    /// error if the strap read or decoder enable fails.
    pub fn with_port(mut port: Box<dyn RegisterPort>) -> Result<Self> {
        let strap = port.read_register(regs::PORT_DATA)?;
        let variant = BoardVariant::from_port_data(strap)?;

        port.set_clear_bits(
            regs::INPUT_PORT_CONFIG,
            input_port::DECODER0_ENABLE | input_port::DECODER1_ENABLE,
            0,
        )?;

        let mut device = Self { port, variant };
        for led in variant.layout().open_leds {
            device.best_effort("LED init", led.edit());
        }

        info!("Opened {variant} (hw id {})", variant.hw_id());
        Ok(device)
    }

    /// Board variant resolved at open.
    #[must_use]
    pub const fn variant(&self) -> BoardVariant {
        self.variant
    }

    // ── Register helpers ─────────────────────────────────────────────────────

    fn apply(&mut self, edit: BitEdit) -> Result<()> {
        self.port.set_clear_bits(edit.addr, edit.set, edit.clear)
    }

    fn best_effort(&mut self, what: &str, edit: BitEdit) {
        if let Err(e) = self.apply(edit) {
            warn!("{what} write to {} failed, ignoring: {e}", regs::name(edit.addr));
        }
    }

    fn read_pair(&mut self, a: usize, b: usize) -> Result<(u32, u32)> {
        let mut values = [0u32; 2];
        self.port.read_registers(&[a, b], &mut values)?;
        Ok((values[0], values[1]))
    }

    /// Reject sources whose input port this board does not have.
    fn check_source(&self, source: SyncSource, what: &str) -> Result<()> {
        match source.port() {
            Some(port) if self.variant.layout().has_input(port) => Ok(()),
            Some(_) => Err(IrigbError::unsupported(format!("{what} on {source}"), self.variant)),
            None => Ok(()),
        }
    }

    /// Raw value of every register, in index order.
    ///
    /// # Errors
    ///
    /// Returns a transport error if any batch fails.
    pub fn dump_registers(&mut self) -> Result<Vec<(usize, u32)>> {
        let addrs: Vec<usize> = (0..regs::REGISTER_COUNT).collect();
        let mut out = Vec::with_capacity(addrs.len());
        for chunk in addrs.chunks(irigb_chip::pcie::MAX_PAIRS) {
            let mut values = [0u32; irigb_chip::pcie::MAX_PAIRS];
            let values = &mut values[..chunk.len()];
            self.port.read_registers(chunk, values)?;
            out.extend(chunk.iter().copied().zip(values.iter().copied()));
        }
        Ok(out)
    }

    // ── RTC ──────────────────────────────────────────────────────────────────

    /// Read the RTC in one batched snapshot.
    ///
    /// # Errors
    ///
    /// Returns a transport error, or `Validation` if the card reports an
    /// impossible time.
    pub fn read_time(&mut self) -> Result<CalendarTime> {
        let mut words = [0u32; 4];
        self.port.read_registers(&regs::RTC_SNAPSHOT, &mut words)?;
        debug!("RTC snapshot {words:#010x?}");
        rtc::decode(words)
    }

    /// Set the RTC.
    ///
    /// The sync source is forced to free-run around the write so a decoder
    /// cannot overwrite the value mid-write, then restored to its previous
    /// raw value whether or not the write succeeded.
    ///
    /// # Errors
    ///
    /// Returns `Validation` before any register access if `time` is out of
    /// range. Returns the write's transport error if the source was
    /// restored, or `PartialApply` (`RestoreSyncSource`) if the restore
    /// failed, leaving the card in free-run.
    pub fn write_time(&mut self, time: &CalendarTime) -> Result<()> {
        let [word0, word1] = rtc::encode(time)?;

        let saved = self.port.read_register(regs::RTC_CONFIG)? & rtc_config::SYNC_SOURCE_MASK;
        self.port.set_clear_bits(
            regs::RTC_CONFIG,
            rtc_config::SYNC_FREE_RUN,
            rtc_config::SYNC_SOURCE_MASK,
        )?;

        let written = self
            .port
            .write_registers(&[(regs::RTC_DATA0, word0), (regs::RTC_DATA1, word1)]);
        let restored = self
            .port
            .set_clear_bits(regs::RTC_CONFIG, saved, rtc_config::SYNC_SOURCE_MASK);

        match (written, restored) {
            (Ok(()), Ok(())) => {
                debug!("RTC set to {time}");
                Ok(())
            }
            (Err(e), Ok(())) => Err(e),
            (Ok(()), Err(e)) => Err(IrigbError::partial(ApplyStep::RestoreSyncSource, e)),
            (Err(write), Err(restore)) => {
                warn!("RTC write failed: {write}");
                Err(IrigbError::partial(ApplyStep::RestoreSyncSource, restore))
            }
        }
    }

    /// Firmware build date.
    ///
    /// # Errors
    ///
    /// Returns a transport error.
    pub fn firmware_date(&mut self) -> Result<FirmwareDate> {
        self.port.read_register(regs::DATE_CODE).map(FirmwareDate)
    }

    // ── Sync source ──────────────────────────────────────────────────────────

    /// Source currently disciplining the RTC.
    ///
    /// # Errors
    ///
    /// Returns a transport error, or `UnexpectedValue` for a source this
    /// driver does not model.
    pub fn sync_source(&mut self) -> Result<SyncSource> {
        SyncSource::from_rtc_config(self.port.read_register(regs::RTC_CONFIG)?)
    }

    /// Select the source disciplining the RTC.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedCombination` if the board lacks the source's
    /// input, or a transport error from the source write.
    pub fn set_sync_source(&mut self, source: SyncSource) -> Result<()> {
        self.check_source(source, "sync source")?;
        self.apply(BitEdit {
            addr: regs::RTC_CONFIG,
            set: source.bits(),
            clear: rtc_config::SYNC_SOURCE_MASK,
        })?;

        let layout = self.variant.layout();
        for led in layout.sync_leds(source) {
            match *led {
                SyncLed::Fixed(setting) => self.best_effort("sync LED", setting.edit()),
                SyncLed::Port1Rx => match self.input(Port::Port1) {
                    Ok(Some(cfg)) => {
                        if let Some(setting) = layout
                            .input_route(Port::Port1, cfg.signal_type)
                            .and_then(|r| r.led)
                        {
                            self.best_effort("RX LED", setting.edit());
                        }
                    }
                    Ok(None) => debug!("Port 1 input not routed, RX LED unchanged"),
                    Err(e) => warn!("Port 1 input read failed, RX LED unchanged: {e}"),
                },
            }
        }

        info!("Sync source set to {source}");
        Ok(())
    }

    /// Decoder status of `source`, from the status latched by the kernel driver.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedCombination` for free-run or a missing input,
    /// or a transport error.
    pub fn signal_status(&mut self, source: SyncSource) -> Result<SignalStatus> {
        if source == SyncSource::FreeRun {
            return Err(IrigbError::unsupported("signal status of free-run source", self.variant));
        }
        self.check_source(source, "signal status")?;
        let status = self.port.read_source_status()?;
        routing::decode_signal_status(self.variant, source, status)
    }

    // ── Parity ───────────────────────────────────────────────────────────────

    /// Parity check mode of the decoder behind `source`.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedCombination` for free-run or a missing input,
    /// or a transport error.
    pub fn input_parity(&mut self, source: SyncSource) -> Result<ParityMode> {
        routing::plan_input_parity(self.variant, source, ParityMode::Even)?;
        self.check_source(source, "input parity")?;
        let tmcon = self.port.read_register(regs::TIME_MODULE_CONFIG)?;
        routing::decode_input_parity(self.variant, source, tmcon)
    }

    /// Set the parity check mode of the decoder behind `source`.
    ///
    /// # Errors
    ///
    /// As [`Self::input_parity`].
    pub fn set_input_parity(&mut self, source: SyncSource, mode: ParityMode) -> Result<()> {
        let edit = routing::plan_input_parity(self.variant, source, mode)?;
        self.check_source(source, "input parity")?;
        self.apply(edit)?;
        debug!("{source} parity set to {mode}");
        Ok(())
    }

    /// Encoder parity.
    ///
    /// # Errors
    ///
    /// Returns a transport error.
    pub fn output_parity(&mut self) -> Result<ParityMode> {
        let tmcon = self.port.read_register(regs::TIME_MODULE_CONFIG)?;
        Ok(routing::decode_output_parity(tmcon))
    }

    /// Set the encoder parity.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for [`ParityMode::Disabled`], or a transport error.
    pub fn set_output_parity(&mut self, mode: ParityMode) -> Result<()> {
        let edit = routing::plan_output_parity(mode)?;
        self.apply(edit)
    }

    // ── PPS ──────────────────────────────────────────────────────────────────

    /// PPS output pulse width in milliseconds.
    ///
    /// # Errors
    ///
    /// Returns a transport error.
    #[allow(clippy::cast_possible_truncation)]
    pub fn pps_width(&mut self) -> Result<u16> {
        let value = self.port.read_register(regs::PPS_CONFIG)?;
        Ok(((value >> pps::PULSE_WIDTH_SHIFT) & pps::PULSE_WIDTH_MASK) as u16)
    }

    /// Set the PPS output pulse width, 0..=999 ms.
    ///
    /// # Errors
    ///
    /// Returns `Validation` above 999, or a transport error.
    pub fn set_pps_width(&mut self, millis: u16) -> Result<()> {
        if millis > MAX_PPS_WIDTH_MS {
            return Err(IrigbError::validation("PPS width", millis, "must be 0..=999 ms"));
        }
        self.apply(BitEdit {
            addr: regs::PPS_CONFIG,
            set: u32::from(millis) << pps::PULSE_WIDTH_SHIFT,
            clear: pps::PULSE_WIDTH_MASK << pps::PULSE_WIDTH_SHIFT,
        })
    }

    // ── Signal routing ───────────────────────────────────────────────────────

    /// Input route of `port`, or `None` if its decoder is not routed to a
    /// receiver this board wires to the port.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedCombination` if the port has no input, or a
    /// transport error.
    pub fn input(&mut self, port: Port) -> Result<Option<InputConfig>> {
        if !self.variant.layout().has_input(port) {
            return Err(IrigbError::unsupported(format!("input on {port}"), self.variant));
        }
        let value = self.port.read_register(regs::INPUT_PORT_CONFIG)?;
        routing::decode_input(self.variant, port, value)
    }

    /// Route an input.
    ///
    /// Writes the decoder route, then the receiver type strap, then the RX
    /// LED. After a port 1 change every output mirroring port 1 is
    /// re-applied so its electrical type follows the new input.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedCombination` before any write, a transport error
    /// if the route write fails, or `PartialApply` if a later step fails.
    pub fn set_input(&mut self, port: Port, signal_type: SignalType, invert: bool) -> Result<()> {
        let plan = routing::plan_input(self.variant, port, signal_type, invert)?;

        self.apply(plan.route)?;
        if let Some(edit) = plan.signal_type {
            self.apply(edit)
                .map_err(|e| IrigbError::partial(ApplyStep::SignalType, e))?;
        }
        if let Some(edit) = plan.led {
            self.best_effort("RX LED", edit);
        }
        debug!("{port} input set to {signal_type} (invert {invert})");

        if port == Port::Port1 {
            self.mirror_fixup(signal_type)
                .map_err(|e| IrigbError::partial(ApplyStep::MirrorFixup, e))?;
        }
        Ok(())
    }

    fn mirror_fixup(&mut self, port1_input: SignalType) -> Result<()> {
        for &port in self.variant.layout().mirror_ports {
            let (outcon, portdat) = self.read_pair(regs::OUTPUT_PORT_CONFIG, regs::PORT_DATA)?;
            let current = routing::decode_output(self.variant, port, outcon, portdat)?;
            if current.mode != Some(OutputMode::FromPort1In) {
                continue;
            }
            self.write_output(
                port,
                port1_input,
                OutputMode::FromPort1In,
                current.invert,
                Some(port1_input),
            )?;
            debug!("{port} output re-applied to follow {port1_input} port 1 input");
        }
        Ok(())
    }

    /// Output route of `port`.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedCombination` if the port is not an output, or a
    /// transport error.
    pub fn output(&mut self, port: Port) -> Result<OutputConfig> {
        if self.variant.layout().output_slot(port).is_none() {
            return Err(IrigbError::unsupported(format!("output on {port}"), self.variant));
        }
        let (outcon, portdat) = self.read_pair(regs::OUTPUT_PORT_CONFIG, regs::PORT_DATA)?;
        routing::decode_output(self.variant, port, outcon, portdat)
    }

    /// Route an output.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedCombination` before any write, a transport error
    /// if the route write fails, or `PartialApply` if the type strap fails.
    pub fn set_output(
        &mut self,
        port: Port,
        signal_type: SignalType,
        mode: OutputMode,
        invert: bool,
    ) -> Result<()> {
        routing::plan_output(self.variant, port, signal_type, mode, invert, None)?;

        let follows_input = matches!(
            self.variant.layout().output_selectors.from_port1,
            Port1Selector::FollowInput
        );
        let port1_input = if mode == OutputMode::FromPort1In && follows_input {
            self.input(Port::Port1)?.map(|c| c.signal_type)
        } else {
            None
        };

        self.write_output(port, signal_type, mode, invert, port1_input)?;
        debug!("{port} output set to {signal_type} {mode} (invert {invert})");
        Ok(())
    }

    fn write_output(
        &mut self,
        port: Port,
        signal_type: SignalType,
        mode: OutputMode,
        invert: bool,
        port1_input: Option<SignalType>,
    ) -> Result<()> {
        let plan = routing::plan_output(self.variant, port, signal_type, mode, invert, port1_input)?;
        self.apply(plan.route)?;
        self.apply(plan.signal_type)
            .map_err(|e| IrigbError::partial(ApplyStep::SignalType, e))
    }

    // ── Digital I/O ──────────────────────────────────────────────────────────

    /// Level driven on digital output `line`.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedCombination` without digital I/O, `Validation`
    /// for a line outside 0..=3, or a transport error.
    pub fn digital_output(&mut self, line: usize) -> Result<DigitalLevel> {
        routing::digital_lines(self.variant, line)?;
        let value = self.port.read_register(regs::PORT_DATA)?;
        routing::decode_digital_output(self.variant, line, value)
    }

    /// Drive digital output `line`.
    ///
    /// # Errors
    ///
    /// As [`Self::digital_output`].
    pub fn set_digital_output(&mut self, line: usize, level: DigitalLevel) -> Result<()> {
        let edit = routing::plan_digital_output(self.variant, line, level)?;
        self.apply(edit)
    }

    /// Level seen on digital input `line`.
    ///
    /// # Errors
    ///
    /// As [`Self::digital_output`].
    pub fn digital_input(&mut self, line: usize) -> Result<DigitalLevel> {
        routing::digital_lines(self.variant, line)?;
        let value = self.port.read_register(regs::PORT_DATA)?;
        routing::decode_digital_input(self.variant, line, value)
    }

    // ── One-shot sync ────────────────────────────────────────────────────────

    /// Set the host clock from the RTC. Returns the RTC reading.
    ///
    /// An inserted leap second (`:60`) is pushed to the host as `:59`.
    ///
    /// # Errors
    ///
    /// Returns RTC read errors, or `HostClock` if the host refuses the time.
    pub fn sync_host_from_rtc(&mut self, clock: &mut dyn HostClock) -> Result<CalendarTime> {
        let time = self.read_time()?;
        clock.set(time.to_naive()?)?;
        debug!("Host clock <- RTC {time}");
        Ok(time)
    }

    /// Set the RTC from the host clock at the next whole second. Returns
    /// the time written.
    ///
    /// # Errors
    ///
    /// Returns `HostClock` if the host time cannot be read, or the errors
    /// of [`Self::write_time`].
    pub fn sync_rtc_from_host(&mut self, clock: &mut dyn HostClock) -> Result<CalendarTime> {
        let now = clock.next_second()?;
        let time = CalendarTime::from_naive(&now)?;
        self.write_time(&time)?;
        debug!("RTC <- host clock {time}");
        Ok(time)
    }
}

impl Drop for IrigbDevice {
    fn drop(&mut self) {
        info!("Closing {}", self.variant);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::{Access, FaultOp, SimulatedCard};
    use irigb_chip::regs::{notify_led, port_data};

    fn open(variant: BoardVariant) -> (IrigbDevice, SimulatedCard) {
        let card = SimulatedCard::new(variant);
        let device = IrigbDevice::with_port(Box::new(card.clone())).unwrap();
        card.clear_log();
        (device, card)
    }

    #[test]
    fn device_path_numbering() {
        if std::env::var_os(DEVICE_ENV).is_none() {
            assert_eq!(device_path(0), PathBuf::from("/dev/moxa_irigb"));
            assert_eq!(device_path(2), PathBuf::from("/dev/moxa_irigb2"));
        }
    }

    #[test]
    fn open_enables_decoders_and_leds() {
        let card = SimulatedCard::new(BoardVariant::DaIrigbS);
        let device = IrigbDevice::with_port(Box::new(card.clone())).unwrap();
        assert_eq!(device.variant(), BoardVariant::DaIrigbS);

        let inpcon = card.register(regs::INPUT_PORT_CONFIG);
        assert_ne!(inpcon & input_port::DECODER0_ENABLE, 0);
        assert_ne!(inpcon & input_port::DECODER1_ENABLE, 0);
        let led = card.register(regs::NOTIFY_LED_CONFIG);
        assert_eq!(
            (led >> notify_led::slot_shift(2)) & notify_led::MODE_MASK,
            notify_led::mode_output(1)
        );
    }

    #[test]
    fn open_survives_led_failure() {
        let card = SimulatedCard::new(BoardVariant::De2Irigb4Dio);
        card.inject_fault(FaultOp::SetClear, regs::NOTIFY_LED_CONFIG);
        assert!(IrigbDevice::with_port(Box::new(card)).is_ok());
    }

    #[test]
    fn open_fails_on_unreadable_strap() {
        let card = SimulatedCard::new(BoardVariant::De2Irigb4Dio);
        card.inject_fault(FaultOp::Read, regs::PORT_DATA);
        let err = IrigbDevice::with_port(Box::new(card.clone())).unwrap_err();
        assert!(matches!(err, IrigbError::Transport { .. }));
        assert!(card.writes().is_empty());
    }

    #[test]
    fn read_time_after_power_on() {
        let (mut device, _card) = open(BoardVariant::DaIrigbS);
        assert_eq!(device.read_time().unwrap(), CalendarTime::new(2024, 1, 1, 0, 0, 0));
    }

    #[test]
    fn write_time_round_trips() {
        let (mut device, card) = open(BoardVariant::DaIrigbS);
        card.set_register(regs::RTC_CONFIG, rtc_config::SYNC_IRIG1);
        let t = CalendarTime::new(2031, 7, 15, 8, 9, 10);
        device.write_time(&t).unwrap();
        assert_eq!(device.read_time().unwrap(), t);
        assert_eq!(device.sync_source().unwrap(), SyncSource::Port1);
    }

    #[test]
    fn write_time_validates_first() {
        let (mut device, card) = open(BoardVariant::DaIrigbS);
        let err = device
            .write_time(&CalendarTime::new(2100, 2, 29, 0, 0, 0))
            .unwrap_err();
        assert!(err.is_rejection());
        assert!(card.writes().is_empty());
    }

    #[test]
    fn sync_source_leds_on_de2() {
        let (mut device, card) = open(BoardVariant::De2Irigb4Dio);
        device.set_sync_source(SyncSource::Fiber).unwrap();
        assert_eq!(device.sync_source().unwrap(), SyncSource::Fiber);
        let led = card.register(regs::NOTIFY_LED_CONFIG);
        assert_eq!(led & notify_led::MODE_MASK, notify_led::MODE_IRIG0_OK);
    }

    #[test]
    fn fiber_source_rejected_on_pci104() {
        let (mut device, card) = open(BoardVariant::DaIrigb4DioPci104);
        let err = device.set_sync_source(SyncSource::Fiber).unwrap_err();
        assert!(matches!(err, IrigbError::UnsupportedCombination { .. }));
        assert!(card.writes().is_empty());
    }

    #[test]
    fn source_write_survives_led_failure() {
        let (mut device, card) = open(BoardVariant::DaIrigbS);
        card.inject_fault(FaultOp::SetClear, regs::NOTIFY_LED_CONFIG);
        device.set_sync_source(SyncSource::Port1).unwrap();
        assert_eq!(device.sync_source().unwrap(), SyncSource::Port1);
    }

    #[test]
    fn free_run_status_rejected() {
        let (mut device, _card) = open(BoardVariant::DaIrigbS);
        assert!(device.signal_status(SyncSource::FreeRun).unwrap_err().is_rejection());
    }

    #[test]
    fn signal_status_from_latched_bits() {
        let (mut device, card) = open(BoardVariant::DaIrigbS);
        card.set_source_status(regs::int_status::DECODER1_DONE);
        assert_eq!(device.signal_status(SyncSource::Port1).unwrap(), SignalStatus::Normal);
        assert_eq!(device.signal_status(SyncSource::Fiber).unwrap(), SignalStatus::Unknown);
    }

    #[test]
    fn parity_round_trip() {
        let (mut device, _card) = open(BoardVariant::DaIrigbS);
        device.set_input_parity(SyncSource::Fiber, ParityMode::Odd).unwrap();
        device.set_input_parity(SyncSource::Port1, ParityMode::Disabled).unwrap();
        device.set_output_parity(ParityMode::Odd).unwrap();
        assert_eq!(device.input_parity(SyncSource::Fiber).unwrap(), ParityMode::Odd);
        assert_eq!(device.input_parity(SyncSource::Port1).unwrap(), ParityMode::Disabled);
        assert_eq!(device.output_parity().unwrap(), ParityMode::Odd);
        assert!(device.set_output_parity(ParityMode::Disabled).is_err());
    }

    #[test]
    fn pps_width_bounds() {
        let (mut device, card) = open(BoardVariant::DaIrigbS);
        card.set_register(regs::PPS_CONFIG, 0x0000_0100);
        device.set_pps_width(999).unwrap();
        assert_eq!(device.pps_width().unwrap(), 999);
        assert_eq!(card.register(regs::PPS_CONFIG) & 0xFFFF, 0x0100);
        assert!(device.set_pps_width(1000).unwrap_err().is_rejection());
    }

    #[test]
    fn input_round_trip() {
        let (mut device, _card) = open(BoardVariant::DaIrigbS);
        device.set_input(Port::Fiber, SignalType::Ttl, true).unwrap();
        device.set_input(Port::Port1, SignalType::Differential, false).unwrap();
        assert_eq!(
            device.input(Port::Fiber).unwrap(),
            Some(InputConfig { signal_type: SignalType::Ttl, invert: true })
        );
        assert_eq!(
            device.input(Port::Port1).unwrap(),
            Some(InputConfig { signal_type: SignalType::Differential, invert: false })
        );
        assert!(device.input(Port::Port2).unwrap_err().is_rejection());
    }

    #[test]
    fn input_type_strap_failure_is_partial() {
        let (mut device, card) = open(BoardVariant::DaIrigb4DioPci104);
        card.inject_fault(FaultOp::SetClear, regs::PORT_DATA);
        let err = device.set_input(Port::Port1, SignalType::Ttl, false).unwrap_err();
        assert!(matches!(
            err,
            IrigbError::PartialApply { step: ApplyStep::SignalType, .. }
        ));
        assert_eq!(card.writes().len(), 1);
        assert_eq!(card.writes()[0].addr(), regs::INPUT_PORT_CONFIG);
    }

    #[test]
    fn output_round_trip() {
        let (mut device, card) = open(BoardVariant::DaIrigbS);
        device
            .set_output(Port::Port3, SignalType::Differential, OutputMode::PpsEncode, true)
            .unwrap();
        assert_eq!(
            device.output(Port::Port3).unwrap(),
            OutputConfig {
                signal_type: SignalType::Differential,
                mode: Some(OutputMode::PpsEncode),
                invert: true,
            }
        );
        assert_ne!(card.register(regs::PORT_DATA) & port_data::output_bit(13), 0);
    }

    #[test]
    fn output_rejected_before_io() {
        let (mut device, card) = open(BoardVariant::De2Irigb4Dio);
        assert!(device
            .set_output(Port::Port2, SignalType::Ttl, OutputMode::IrigbEncode, false)
            .unwrap_err()
            .is_rejection());
        let (mut pci, pci_card) = open(BoardVariant::DaIrigb4DioPci104);
        assert!(pci
            .set_output(Port::Port1, SignalType::Ttl, OutputMode::FromFiberIn, false)
            .unwrap_err()
            .is_rejection());
        assert!(card.writes().is_empty());
        assert!(pci_card.writes().is_empty());
    }

    #[test]
    fn digital_io() {
        let (mut device, card) = open(BoardVariant::De2Irigb4Dio);
        device.set_digital_output(2, DigitalLevel::High).unwrap();
        assert_eq!(device.digital_output(2).unwrap(), DigitalLevel::High);
        assert_eq!(device.digital_output(1).unwrap(), DigitalLevel::Low);

        let strap = card.register(regs::PORT_DATA);
        card.set_register(regs::PORT_DATA, strap | port_data::input_bit(7));
        assert_eq!(device.digital_input(1).unwrap(), DigitalLevel::High);
        assert!(device.digital_input(4).unwrap_err().is_rejection());

        let (mut s, _) = open(BoardVariant::DaIrigbS);
        assert!(matches!(
            s.digital_output(0),
            Err(IrigbError::UnsupportedCombination { .. })
        ));
    }

    #[test]
    fn firmware_date_reads_date_code() {
        let (mut device, _card) = open(BoardVariant::DaIrigbS);
        assert_eq!(device.firmware_date().unwrap().to_string(), "2014-01-01");
    }

    #[test]
    fn dump_covers_every_register() {
        let (mut device, _card) = open(BoardVariant::DaIrigbS);
        let dump = device.dump_registers().unwrap();
        assert_eq!(dump.len(), regs::REGISTER_COUNT);
        assert_eq!(dump[regs::DATE_CODE], (regs::DATE_CODE, 0x2014_0101));
    }

    #[test]
    fn open_logs_only_masked_writes() {
        let card = SimulatedCard::new(BoardVariant::DaIrigb4DioPci104);
        let _device = IrigbDevice::with_port(Box::new(card.clone())).unwrap();
        assert!(card
            .writes()
            .iter()
            .all(|a| matches!(a, Access::SetClear { .. })));
    }
}
