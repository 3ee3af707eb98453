//! Signal routing model
//!
//! Pure functions from a board variant and a routing request to the masked
//! register writes that realise it, and back from register snapshots to the
//! routing they encode. Nothing here touches hardware: every plan is
//! validated against the board layout before the device session writes it.
//!
//! ```text
//! request ──plan_*──▶ BitEdit(s) ──set_clear_bits──▶ card
//! card ──read──▶ raw register(s) ──decode_*──▶ InputConfig / OutputConfig
//! ```

use std::fmt;

use irigb_chip::regs::{self, int_status, notify_led, output_port, port_data, time_module};

use crate::error::{IrigbError, Result};
use crate::variant::{BoardVariant, LedSetting, Port1Selector};

/// Logical signal ports on the front panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Port {
    /// Fiber receiver (input only).
    Fiber,
    /// Port 1 (input and output).
    Port1,
    /// Port 2 (output).
    Port2,
    /// Port 3 (output).
    Port3,
    /// Port 4 (output).
    Port4,
}

impl Port {
    /// All ports, in panel order.
    pub const ALL: [Self; 5] = [Self::Fiber, Self::Port1, Self::Port2, Self::Port3, Self::Port4];
}

impl fmt::Display for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Fiber => "fiber",
            Self::Port1 => "port1",
            Self::Port2 => "port2",
            Self::Port3 => "port3",
            Self::Port4 => "port4",
        })
    }
}

/// Electrical signal type of a port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignalType {
    /// Single-ended TTL.
    Ttl,
    /// Differential (RS-422/485).
    Differential,
}

impl fmt::Display for SignalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Ttl => "ttl",
            Self::Differential => "differential",
        })
    }
}

/// What an output port emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputMode {
    /// Pass through the fiber input.
    FromFiberIn,
    /// Pass through the port 1 input.
    FromPort1In,
    /// IRIG-B encoded from the onboard RTC.
    IrigbEncode,
    /// Pulse per second from the onboard RTC.
    PpsEncode,
}

impl fmt::Display for OutputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::FromFiberIn => "from fiber input",
            Self::FromPort1In => "from port1 input",
            Self::IrigbEncode => "IRIG-B encoder",
            Self::PpsEncode => "PPS encoder",
        })
    }
}

/// IRIG-B parity check mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParityMode {
    /// Even parity.
    Even,
    /// Odd parity.
    Odd,
    /// No parity check (decoders only).
    Disabled,
}

impl fmt::Display for ParityMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Even => "even",
            Self::Odd => "odd",
            Self::Disabled => "none",
        })
    }
}

/// State of an IRIG-B decoder, from the latched interrupt status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignalStatus {
    /// Frames are decoding.
    Normal,
    /// No signal.
    OffLine,
    /// Frame structure error.
    FrameError,
    /// Parity error.
    ParityError,
    /// No status bit latched.
    Unknown,
}

impl fmt::Display for SignalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Normal => "normal",
            Self::OffLine => "off-line",
            Self::FrameError => "frame error",
            Self::ParityError => "parity error",
            Self::Unknown => "unknown",
        })
    }
}

/// Level of a digital I/O line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DigitalLevel {
    /// Logic low.
    Low,
    /// Logic high.
    High,
}

impl From<bool> for DigitalLevel {
    fn from(high: bool) -> Self {
        if high {
            Self::High
        } else {
            Self::Low
        }
    }
}

impl fmt::Display for DigitalLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Low => "low",
            Self::High => "high",
        })
    }
}

/// What disciplines the onboard RTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyncSource {
    /// Internal oscillator only.
    FreeRun,
    /// IRIG-B decoder 0 on the fiber input.
    Fiber,
    /// IRIG-B decoder 1 on port 1.
    Port1,
}

impl SyncSource {
    /// `RTC_CONFIG` sync-source field value.
    #[must_use]
    pub const fn bits(self) -> u32 {
        match self {
            Self::FreeRun => regs::rtc_config::SYNC_FREE_RUN,
            Self::Fiber => regs::rtc_config::SYNC_IRIG0,
            Self::Port1 => regs::rtc_config::SYNC_IRIG1,
        }
    }

    /// Decode the sync-source field of `RTC_CONFIG`.
    ///
    /// # Errors
    ///
    /// Returns `UnexpectedValue` for field values this model has no source
    /// for (the PPS source, reserved codes).
    pub fn from_rtc_config(value: u32) -> Result<Self> {
        match value & regs::rtc_config::SYNC_SOURCE_MASK {
            regs::rtc_config::SYNC_FREE_RUN => Ok(Self::FreeRun),
            regs::rtc_config::SYNC_IRIG0 => Ok(Self::Fiber),
            regs::rtc_config::SYNC_IRIG1 => Ok(Self::Port1),
            _ => Err(IrigbError::UnexpectedValue {
                register: regs::name(regs::RTC_CONFIG),
                value,
            }),
        }
    }

    /// Input port feeding this source's decoder.
    #[must_use]
    pub const fn port(self) -> Option<Port> {
        match self {
            Self::FreeRun => None,
            Self::Fiber => Some(Port::Fiber),
            Self::Port1 => Some(Port::Port1),
        }
    }
}

impl fmt::Display for SyncSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::FreeRun => "free-run",
            Self::Fiber => "fiber",
            Self::Port1 => "port1",
        })
    }
}

/// Input routing of one port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputConfig {
    /// Electrical type.
    pub signal_type: SignalType,
    /// Whether the decoder sees the inverted signal.
    pub invert: bool,
}

/// Output routing of one port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputConfig {
    /// Electrical type.
    pub signal_type: SignalType,
    /// Source, or `None` when the selector holds a value this board does
    /// not assign a mode to (GPO, high-Z, another input).
    pub mode: Option<OutputMode>,
    /// Whether the output is inverted.
    pub invert: bool,
}

/// One masked register write: `value = (value & !clear) | set`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitEdit {
    /// Register index.
    pub addr: usize,
    /// Bits to set.
    pub set: u32,
    /// Bits to clear.
    pub clear: u32,
}

impl BitEdit {
    /// Result of applying this edit to `value`.
    #[must_use]
    pub const fn apply(self, value: u32) -> u32 {
        (value & !self.clear) | self.set
    }

    /// Edit that sets `mask` when `on`, clears it otherwise.
    #[must_use]
    pub const fn flag(addr: usize, mask: u32, on: bool) -> Self {
        if on {
            Self { addr, set: mask, clear: 0 }
        } else {
            Self { addr, set: 0, clear: mask }
        }
    }
}

impl LedSetting {
    /// Write that programs this LED slot.
    #[must_use]
    pub const fn edit(self) -> BitEdit {
        let shift = notify_led::slot_shift(self.slot);
        BitEdit {
            addr: regs::NOTIFY_LED_CONFIG,
            set: self.mode << shift,
            clear: notify_led::MODE_MASK << shift,
        }
    }
}

// ── Inputs ───────────────────────────────────────────────────────────────────

/// Writes realising an input route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputPlan {
    /// Decoder select + enable + inversion in `INPUT_PORT_CONFIG`.
    pub route: BitEdit,
    /// Receiver type strap in `PORT_DATA`, when the board has one.
    pub signal_type: Option<BitEdit>,
    /// RX LED update, best-effort.
    pub led: Option<BitEdit>,
}

/// Plan an input route.
///
/// # Errors
///
/// Returns `UnsupportedCombination` if the board has no receiver of that
/// type on that port.
pub fn plan_input(
    variant: BoardVariant,
    port: Port,
    signal_type: SignalType,
    invert: bool,
) -> Result<InputPlan> {
    let route = variant
        .layout()
        .input_route(port, signal_type)
        .ok_or_else(|| IrigbError::unsupported(format!("{signal_type} input on {port}"), variant))?;

    let decoder = route.decoder;
    let invert_mask = regs::input_port::invert_bit(route.select);
    let mut set = (route.select << decoder.shift) | decoder.enable;
    if invert != route.active_low {
        set |= invert_mask;
    }

    Ok(InputPlan {
        route: BitEdit {
            addr: regs::INPUT_PORT_CONFIG,
            set,
            clear: (regs::input_port::SELECT_MASK << decoder.shift) | decoder.enable | invert_mask,
        },
        signal_type: route
            .type_strap
            .map(|s| BitEdit::flag(regs::PORT_DATA, s.mask, s.set)),
        led: route.led.map(LedSetting::edit),
    })
}

/// Decode the input route of `port` from `INPUT_PORT_CONFIG`.
///
/// Returns `Ok(None)` when the port's decoder is disabled or selects a
/// receiver the board does not route to that port.
///
/// # Errors
///
/// Returns `UnsupportedCombination` if the port has no input on this board.
pub fn decode_input(variant: BoardVariant, port: Port, input_config: u32) -> Result<Option<InputConfig>> {
    let layout = variant.layout();
    let mut routes = layout.input_routes.iter().filter(|r| r.port == port).peekable();
    if routes.peek().is_none() {
        return Err(IrigbError::unsupported(format!("input on {port}"), variant));
    }

    Ok(routes
        .find(|r| {
            let field = regs::input_port::SELECT_MASK << r.decoder.shift;
            let want = (r.select << r.decoder.shift) | r.decoder.enable;
            input_config & (field | r.decoder.enable) == want
        })
        .map(|r| {
            let inv_bit = input_config & regs::input_port::invert_bit(r.select) != 0;
            InputConfig {
                signal_type: r.signal_type,
                invert: inv_bit != r.active_low,
            }
        }))
}

// ── Outputs ──────────────────────────────────────────────────────────────────

/// Writes realising an output route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputPlan {
    /// Source select + inversion in `OUTPUT_PORT_CONFIG`.
    pub route: BitEdit,
    /// Driver type strap in `PORT_DATA`.
    pub signal_type: BitEdit,
}

/// Plan an output route.
///
/// `port1_input` is the current port 1 receiver type; boards whose
/// from-port1 selector follows the receiver need it, and treat `None` as
/// differential.
///
/// # Errors
///
/// Returns `UnsupportedCombination` if the port is not an output on this
/// board or the mode has no source here.
pub fn plan_output(
    variant: BoardVariant,
    port: Port,
    signal_type: SignalType,
    mode: OutputMode,
    invert: bool,
    port1_input: Option<SignalType>,
) -> Result<OutputPlan> {
    let layout = variant.layout();
    let slot = layout
        .output_slot(port)
        .ok_or_else(|| IrigbError::unsupported(format!("output on {port}"), variant))?;
    let select = output_select(variant, mode, port1_input)?;

    let shift = output_port::slot_shift(slot.slot);
    let invert_mask = output_port::invert_bit(slot.slot);
    Ok(OutputPlan {
        route: BitEdit {
            addr: regs::OUTPUT_PORT_CONFIG,
            set: (select << shift) | if invert { invert_mask } else { 0 },
            clear: (output_port::SELECT_MASK << shift) | invert_mask,
        },
        signal_type: BitEdit::flag(
            regs::PORT_DATA,
            port_data::output_bit(slot.type_line),
            signal_type == SignalType::Differential,
        ),
    })
}

fn output_select(variant: BoardVariant, mode: OutputMode, port1_input: Option<SignalType>) -> Result<u32> {
    let selectors = &variant.layout().output_selectors;
    match mode {
        OutputMode::FromFiberIn => selectors
            .from_fiber
            .ok_or_else(|| IrigbError::unsupported("output from fiber input", variant)),
        OutputMode::FromPort1In => Ok(match selectors.from_port1 {
            Port1Selector::Fixed(sel) => sel,
            Port1Selector::FollowInput => match port1_input {
                Some(SignalType::Ttl) => output_port::SEL_INP2,
                Some(SignalType::Differential) | None => output_port::SEL_INP1,
            },
        }),
        OutputMode::IrigbEncode => Ok(output_port::SEL_IRIGB_ENCODER),
        OutputMode::PpsEncode => Ok(output_port::SEL_PPS_ENCODER),
    }
}

/// Decode the output route of `port` from `OUTPUT_PORT_CONFIG` and `PORT_DATA`.
///
/// # Errors
///
/// Returns `UnsupportedCombination` if the port is not an output on this board.
pub fn decode_output(
    variant: BoardVariant,
    port: Port,
    output_config: u32,
    port_data_value: u32,
) -> Result<OutputConfig> {
    let layout = variant.layout();
    let slot = layout
        .output_slot(port)
        .ok_or_else(|| IrigbError::unsupported(format!("output on {port}"), variant))?;

    let select = (output_config >> output_port::slot_shift(slot.slot)) & output_port::SELECT_MASK;
    let selectors = &layout.output_selectors;
    let mode = match select {
        output_port::SEL_IRIGB_ENCODER => Some(OutputMode::IrigbEncode),
        output_port::SEL_PPS_ENCODER => Some(OutputMode::PpsEncode),
        s if selectors.from_fiber == Some(s) => Some(OutputMode::FromFiberIn),
        s => match selectors.from_port1 {
            Port1Selector::Fixed(sel) if sel == s => Some(OutputMode::FromPort1In),
            Port1Selector::FollowInput if s == output_port::SEL_INP1 || s == output_port::SEL_INP2 => {
                Some(OutputMode::FromPort1In)
            }
            _ => None,
        },
    };

    let differential = port_data_value & port_data::output_bit(slot.type_line) != 0;
    Ok(OutputConfig {
        signal_type: if differential {
            SignalType::Differential
        } else {
            SignalType::Ttl
        },
        mode,
        invert: output_config & output_port::invert_bit(slot.slot) != 0,
    })
}

// ── Parity ───────────────────────────────────────────────────────────────────

fn decoder_parity_bits(variant: BoardVariant, source: SyncSource) -> Result<(u32, u32)> {
    match source {
        SyncSource::Fiber => Ok((
            time_module::DECODER0_PARITY_ODD,
            time_module::DECODER0_PARITY_DISABLE,
        )),
        SyncSource::Port1 => Ok((
            time_module::DECODER1_PARITY_ODD,
            time_module::DECODER1_PARITY_DISABLE,
        )),
        SyncSource::FreeRun => Err(IrigbError::unsupported("parity check on free-run source", variant)),
    }
}

/// Plan the parity check mode of the decoder behind `source`.
///
/// # Errors
///
/// Returns `UnsupportedCombination` for the free-run source.
pub fn plan_input_parity(variant: BoardVariant, source: SyncSource, mode: ParityMode) -> Result<BitEdit> {
    let (odd, disable) = decoder_parity_bits(variant, source)?;
    let (set, clear) = match mode {
        ParityMode::Even => (0, odd | disable),
        ParityMode::Odd => (odd, disable),
        ParityMode::Disabled => (disable, 0),
    };
    Ok(BitEdit {
        addr: regs::TIME_MODULE_CONFIG,
        set,
        clear,
    })
}

/// Decode the parity check mode of the decoder behind `source`.
///
/// # Errors
///
/// Returns `UnsupportedCombination` for the free-run source.
pub fn decode_input_parity(variant: BoardVariant, source: SyncSource, time_config: u32) -> Result<ParityMode> {
    let (odd, disable) = decoder_parity_bits(variant, source)?;
    Ok(if time_config & disable != 0 {
        ParityMode::Disabled
    } else if time_config & odd != 0 {
        ParityMode::Odd
    } else {
        ParityMode::Even
    })
}

/// Plan the IRIG-B encoder parity.
///
/// # Errors
///
/// Returns `Validation` for [`ParityMode::Disabled`]: the encoder always
/// emits a parity bit.
pub fn plan_output_parity(mode: ParityMode) -> Result<BitEdit> {
    let odd = match mode {
        ParityMode::Even => false,
        ParityMode::Odd => true,
        ParityMode::Disabled => {
            return Err(IrigbError::validation(
                "output parity",
                mode,
                "the encoder cannot disable parity",
            ))
        }
    };
    Ok(BitEdit::flag(regs::TIME_MODULE_CONFIG, time_module::ENCODER_PARITY_ODD, odd))
}

/// Decode the IRIG-B encoder parity.
#[must_use]
pub const fn decode_output_parity(time_config: u32) -> ParityMode {
    if time_config & time_module::ENCODER_PARITY_ODD != 0 {
        ParityMode::Odd
    } else {
        ParityMode::Even
    }
}

// ── Status ───────────────────────────────────────────────────────────────────

/// Decode the decoder status for `source` from the latched interrupt status.
///
/// Off-line wins over frame error, which wins over parity error.
///
/// # Errors
///
/// Returns `UnsupportedCombination` for the free-run source.
pub fn decode_signal_status(variant: BoardVariant, source: SyncSource, status: u32) -> Result<SignalStatus> {
    let (off, frame, parity, done) = match source {
        SyncSource::Fiber => (
            int_status::DECODER0_OFFLINE,
            int_status::DECODER0_FRAME_ERROR,
            int_status::DECODER0_PARITY_ERROR,
            int_status::DECODER0_DONE,
        ),
        SyncSource::Port1 => (
            int_status::DECODER1_OFFLINE,
            int_status::DECODER1_FRAME_ERROR,
            int_status::DECODER1_PARITY_ERROR,
            int_status::DECODER1_DONE,
        ),
        SyncSource::FreeRun => {
            return Err(IrigbError::unsupported("signal status of free-run source", variant))
        }
    };
    Ok(if status & off != 0 {
        SignalStatus::OffLine
    } else if status & frame != 0 {
        SignalStatus::FrameError
    } else if status & parity != 0 {
        SignalStatus::ParityError
    } else if status & done != 0 {
        SignalStatus::Normal
    } else {
        SignalStatus::Unknown
    })
}

// ── Digital I/O ──────────────────────────────────────────────────────────────

pub(crate) fn digital_lines(variant: BoardVariant, line: usize) -> Result<(u32, u32)> {
    let dio = variant
        .layout()
        .digital_io
        .as_ref()
        .ok_or_else(|| IrigbError::unsupported("digital I/O", variant))?;
    match (dio.outputs.get(line), dio.inputs.get(line)) {
        (Some(&out), Some(&inp)) => Ok((out, inp)),
        _ => Err(IrigbError::validation("digital I/O line", line, "must be 0..=3")),
    }
}

/// Plan driving digital output `line`.
///
/// # Errors
///
/// Returns `UnsupportedCombination` on boards without digital I/O, or
/// `Validation` for a line outside 0..=3.
pub fn plan_digital_output(variant: BoardVariant, line: usize, level: DigitalLevel) -> Result<BitEdit> {
    let (out, _) = digital_lines(variant, line)?;
    Ok(BitEdit::flag(
        regs::PORT_DATA,
        port_data::output_bit(out),
        level == DigitalLevel::High,
    ))
}

/// Decode digital output `line` from `PORT_DATA`.
///
/// # Errors
///
/// As [`plan_digital_output`].
pub fn decode_digital_output(variant: BoardVariant, line: usize, port_data_value: u32) -> Result<DigitalLevel> {
    let (out, _) = digital_lines(variant, line)?;
    Ok(DigitalLevel::from(port_data_value & port_data::output_bit(out) != 0))
}

/// Decode digital input `line` from `PORT_DATA`.
///
/// # Errors
///
/// As [`plan_digital_output`].
pub fn decode_digital_input(variant: BoardVariant, line: usize, port_data_value: u32) -> Result<DigitalLevel> {
    let (_, inp) = digital_lines(variant, line)?;
    Ok(DigitalLevel::from(port_data_value & port_data::input_bit(inp) != 0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use irigb_chip::regs::input_port;

    const ALL_VARIANTS: [BoardVariant; 3] = [
        BoardVariant::DaIrigb4DioPci104,
        BoardVariant::De2Irigb4Dio,
        BoardVariant::DaIrigbS,
    ];

    #[test]
    fn differential_fiber_rejected_everywhere() {
        for v in ALL_VARIANTS {
            let err = plan_input(v, Port::Fiber, SignalType::Differential, false).unwrap_err();
            assert!(matches!(err, IrigbError::UnsupportedCombination { .. }), "{v}");
        }
    }

    #[test]
    fn fiber_ttl_is_active_low_on_da_s() {
        let plan = plan_input(BoardVariant::DaIrigbS, Port::Fiber, SignalType::Ttl, false).unwrap();
        assert_eq!(plan.route.addr, regs::INPUT_PORT_CONFIG);
        assert_eq!(
            plan.route.set,
            input_port::INP0 | input_port::DECODER0_ENABLE | input_port::invert_bit(0)
        );
        assert!(plan.signal_type.is_none());
        assert_eq!(plan.led.map(|l| l.set), Some(notify_led::mode_input(0) << 20));

        let inverted = plan_input(BoardVariant::DaIrigbS, Port::Fiber, SignalType::Ttl, true).unwrap();
        assert_eq!(inverted.route.set & input_port::invert_bit(0), 0);
    }

    #[test]
    fn pci104_port1_ttl_flips_polarity_and_clears_strap() {
        let plan = plan_input(BoardVariant::DaIrigb4DioPci104, Port::Port1, SignalType::Ttl, false).unwrap();
        assert_ne!(plan.route.set & input_port::invert_bit(2), 0);
        let strap = plan.signal_type.unwrap();
        assert_eq!(strap.clear, port_data::output_bit(0));
        assert_eq!(strap.set, 0);
    }

    #[test]
    fn input_decode_inverts_plan() {
        for v in ALL_VARIANTS {
            for port in [Port::Fiber, Port::Port1] {
                for ty in [SignalType::Ttl, SignalType::Differential] {
                    for invert in [false, true] {
                        let Ok(plan) = plan_input(v, port, ty, invert) else { continue };
                        let reg = plan.route.apply(0);
                        let got = decode_input(v, port, reg).unwrap();
                        assert_eq!(got, Some(InputConfig { signal_type: ty, invert }), "{v} {port} {ty}");
                    }
                }
            }
        }
    }

    #[test]
    fn disabled_decoder_decodes_as_none() {
        let reg = input_port::INP1 << input_port::DECODER1_SHIFT;
        assert_eq!(decode_input(BoardVariant::DaIrigbS, Port::Port1, reg).unwrap(), None);
    }

    #[test]
    fn pci104_has_no_fiber_input() {
        let err = decode_input(BoardVariant::DaIrigb4DioPci104, Port::Fiber, 0).unwrap_err();
        assert!(matches!(err, IrigbError::UnsupportedCombination { .. }));
    }

    #[test]
    fn output_port2_uses_slot3() {
        let plan = plan_output(
            BoardVariant::DaIrigbS,
            Port::Port2,
            SignalType::Differential,
            OutputMode::PpsEncode,
            true,
            None,
        )
        .unwrap();
        assert_eq!(plan.route.set, (output_port::SEL_PPS_ENCODER << 15) | (1 << 19));
        assert_eq!(plan.signal_type.set, port_data::output_bit(14));
    }

    #[test]
    fn output_ports_beyond_port1_only_on_da_s() {
        for v in [BoardVariant::DaIrigb4DioPci104, BoardVariant::De2Irigb4Dio] {
            let err = plan_output(v, Port::Port3, SignalType::Ttl, OutputMode::IrigbEncode, false, None)
                .unwrap_err();
            assert!(matches!(err, IrigbError::UnsupportedCombination { .. }));
        }
    }

    #[test]
    fn from_port1_follows_receiver_type() {
        let sel = |ty| {
            let p = plan_output(
                BoardVariant::DaIrigb4DioPci104,
                Port::Port1,
                SignalType::Ttl,
                OutputMode::FromPort1In,
                false,
                ty,
            )
            .unwrap();
            (p.route.set >> 5) & output_port::SELECT_MASK
        };
        assert_eq!(sel(Some(SignalType::Ttl)), output_port::SEL_INP2);
        assert_eq!(sel(Some(SignalType::Differential)), output_port::SEL_INP1);
        assert_eq!(sel(None), output_port::SEL_INP1);
    }

    #[test]
    fn output_decode_unknown_selector() {
        let reg = output_port::SEL_HIGH_Z << 5;
        let cfg = decode_output(BoardVariant::DaIrigbS, Port::Port1, reg, 0).unwrap();
        assert_eq!(cfg.mode, None);
        assert_eq!(cfg.signal_type, SignalType::Ttl);
    }

    #[test]
    fn from_fiber_unsupported_on_pci104() {
        let err = plan_output(
            BoardVariant::DaIrigb4DioPci104,
            Port::Port1,
            SignalType::Ttl,
            OutputMode::FromFiberIn,
            false,
            None,
        )
        .unwrap_err();
        assert!(matches!(err, IrigbError::UnsupportedCombination { .. }));
    }

    #[test]
    fn parity_plans() {
        let v = BoardVariant::DaIrigbS;
        let even = plan_input_parity(v, SyncSource::Port1, ParityMode::Even).unwrap();
        assert_eq!(even.clear, time_module::DECODER1_PARITY_ODD | time_module::DECODER1_PARITY_DISABLE);
        let reg = plan_input_parity(v, SyncSource::Fiber, ParityMode::Disabled).unwrap().apply(0);
        assert_eq!(decode_input_parity(v, SyncSource::Fiber, reg).unwrap(), ParityMode::Disabled);
        assert!(plan_input_parity(v, SyncSource::FreeRun, ParityMode::Odd).is_err());
        assert!(matches!(
            plan_output_parity(ParityMode::Disabled),
            Err(IrigbError::Validation { .. })
        ));
        assert_eq!(
            decode_output_parity(plan_output_parity(ParityMode::Odd).unwrap().apply(0)),
            ParityMode::Odd
        );
    }

    #[test]
    fn status_priority() {
        let v = BoardVariant::DaIrigbS;
        let all0 = 0xF;
        assert_eq!(decode_signal_status(v, SyncSource::Fiber, all0).unwrap(), SignalStatus::OffLine);
        assert_eq!(
            decode_signal_status(v, SyncSource::Fiber, int_status::DECODER0_PARITY_ERROR | int_status::DECODER0_DONE)
                .unwrap(),
            SignalStatus::ParityError
        );
        assert_eq!(
            decode_signal_status(v, SyncSource::Port1, int_status::DECODER1_DONE).unwrap(),
            SignalStatus::Normal
        );
        assert_eq!(decode_signal_status(v, SyncSource::Port1, all0).unwrap(), SignalStatus::Unknown);
    }

    #[test]
    fn digital_io_lines() {
        let v = BoardVariant::De2Irigb4Dio;
        let edit = plan_digital_output(v, 2, DigitalLevel::High).unwrap();
        assert_eq!(edit.set, 1 << 26);
        assert_eq!(decode_digital_output(v, 2, edit.apply(0)).unwrap(), DigitalLevel::High);
        assert_eq!(decode_digital_input(v, 0, 1 << 10).unwrap(), DigitalLevel::High);
        assert_eq!(decode_digital_input(v, 3, 1 << 10).unwrap(), DigitalLevel::Low);
        assert!(matches!(plan_digital_output(v, 4, DigitalLevel::Low), Err(IrigbError::Validation { .. })));
        assert!(matches!(
            plan_digital_output(BoardVariant::DaIrigbS, 0, DigitalLevel::Low),
            Err(IrigbError::UnsupportedCombination { .. })
        ));
    }

    #[test]
    fn sync_source_bits() {
        for s in [SyncSource::FreeRun, SyncSource::Fiber, SyncSource::Port1] {
            assert_eq!(SyncSource::from_rtc_config(s.bits() | 0x20).unwrap(), s);
        }
        assert!(matches!(
            SyncSource::from_rtc_config(3),
            Err(IrigbError::UnexpectedValue { value: 3, .. })
        ));
    }
}
