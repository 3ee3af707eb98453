//! Board variants and their wiring
//!
//! The same FPGA ships on three boards that wire its generic inputs and
//! outputs to different connectors. Every per-board difference lives in one
//! static [`BoardLayout`] per variant; the routing code never branches on
//! the variant itself.
//!
//! | | PCI104 (1) | DE2 (2) | DA-IRIGB-S (7) |
//! |-|-|-|-|
//! | Fiber input | none | TTL via INP2 | TTL via INP0 |
//! | Port 1 input | TTL INP2, diff INP1 | diff INP1 | TTL INP2, diff INP1 |
//! | Outputs | port 1 | port 1 | ports 1-4 |
//! | Digital I/O | 4 DO / 4 DI | 4 DO / 4 DI | none |

use std::fmt;

use irigb_chip::board;
use irigb_chip::regs::{input_port, notify_led, output_port, port_data};

use crate::error::{IrigbError, Result};
use crate::routing::{Port, SignalType, SyncSource};

/// Board variant, identified by the strap bits on `PORT_DATA`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoardVariant {
    /// DA-IRIGB-4DIO-PCI104.
    DaIrigb4DioPci104,
    /// DE2-IRIGB-4DIO.
    De2Irigb4Dio,
    /// DA-IRIGB-S.
    DaIrigbS,
}

impl BoardVariant {
    /// Every known variant.
    pub const ALL: [Self; 3] = [Self::DaIrigb4DioPci104, Self::De2Irigb4Dio, Self::DaIrigbS];

    /// Resolve a hardware ID. There is no fallback board.
    ///
    /// # Errors
    ///
    /// Returns `UnknownVariant` for IDs no layout exists for.
    pub fn resolve(hw_id: u32) -> Result<Self> {
        match hw_id {
            board::DA_IRIGB_4DIO_PCI104 => Ok(Self::DaIrigb4DioPci104),
            board::DE2_IRIGB_4DIO => Ok(Self::De2Irigb4Dio),
            board::DA_IRIGB_S => Ok(Self::DaIrigbS),
            _ => Err(IrigbError::UnknownVariant { hw_id }),
        }
    }

    /// Resolve from a raw `PORT_DATA` value.
    ///
    /// # Errors
    ///
    /// Returns `UnknownVariant` if the strap bits match no board.
    pub fn from_port_data(value: u32) -> Result<Self> {
        Self::resolve(board::hw_id_from_port_data(value))
    }

    /// Hardware ID strapped on this board.
    #[must_use]
    pub const fn hw_id(self) -> u32 {
        match self {
            Self::DaIrigb4DioPci104 => board::DA_IRIGB_4DIO_PCI104,
            Self::De2Irigb4Dio => board::DE2_IRIGB_4DIO,
            Self::DaIrigbS => board::DA_IRIGB_S,
        }
    }

    /// Product name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::DaIrigb4DioPci104 => "DA-IRIGB-4DIO-PCI104",
            Self::De2Irigb4Dio => "DE2-IRIGB-4DIO",
            Self::DaIrigbS => "DA-IRIGB-S",
        }
    }

    /// Static wiring of this board.
    #[must_use]
    pub const fn layout(self) -> &'static BoardLayout {
        match self {
            Self::DaIrigb4DioPci104 => &PCI104,
            Self::De2Irigb4Dio => &DE2,
            Self::DaIrigbS => &DA_S,
        }
    }
}

impl fmt::Display for BoardVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// IRIG-B decoder selector field and enable bit in `INPUT_PORT_CONFIG`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decoder {
    /// Selector shift.
    pub shift: u32,
    /// Enable bit.
    pub enable: u32,
}

/// Decoder 0, fed by the fiber input.
pub const DECODER0: Decoder = Decoder {
    shift: input_port::DECODER0_SHIFT,
    enable: input_port::DECODER0_ENABLE,
};

/// Decoder 1, fed by port 1.
pub const DECODER1: Decoder = Decoder {
    shift: input_port::DECODER1_SHIFT,
    enable: input_port::DECODER1_ENABLE,
};

/// A `PORT_DATA` output bit that straps a receiver or driver type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeStrap {
    /// Register mask.
    pub mask: u32,
    /// Whether the route sets (true) or clears the bit.
    pub set: bool,
}

/// One notify-LED slot assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedSetting {
    /// LED slot, 0..=7.
    pub slot: u32,
    /// `NOTIFY_LED_CONFIG` mode value.
    pub mode: u32,
}

/// A supported (port, signal type) input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputRoute {
    /// Panel port.
    pub port: Port,
    /// Receiver type.
    pub signal_type: SignalType,
    /// Decoder the port feeds.
    pub decoder: Decoder,
    /// Physical input selected into the decoder.
    pub select: u32,
    /// The inversion bit is set when the signal is *not* inverted.
    pub active_low: bool,
    /// Receiver type strap, if the board has one for this port.
    pub type_strap: Option<TypeStrap>,
    /// RX LED that follows this route.
    pub led: Option<LedSetting>,
}

/// An output-capable port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputSlot {
    /// Panel port.
    pub port: Port,
    /// FPGA output slot (0..=5) driving it.
    pub slot: u32,
    /// GPO line whose `PORT_DATA` bit selects the driver type (set = differential).
    pub type_line: u32,
}

/// How the from-port1 output selector is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Port1Selector {
    /// Always this selector.
    Fixed(u32),
    /// INP2 when the port 1 receiver is TTL, INP1 otherwise.
    FollowInput,
}

/// Output source selectors that differ between boards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputSelectors {
    /// Selector for [`crate::OutputMode::FromFiberIn`], if the board has a fiber input.
    pub from_fiber: Option<u32>,
    /// Selector for [`crate::OutputMode::FromPort1In`].
    pub from_port1: Port1Selector,
}

/// Digital I/O lines, indexed by line number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DigitalIo {
    /// GPO line for each DO.
    pub outputs: [u32; 4],
    /// GPI line for each DI.
    pub inputs: [u32; 4],
}

/// LED written when a sync source is selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncLed {
    /// Fixed assignment.
    Fixed(LedSetting),
    /// Re-apply the RX LED of the current port 1 input route.
    Port1Rx,
}

/// Complete static wiring of one board.
#[derive(Debug)]
pub struct BoardLayout {
    /// Supported inputs.
    pub input_routes: &'static [InputRoute],
    /// Output-capable ports.
    pub output_slots: &'static [OutputSlot],
    /// Output source selectors.
    pub output_selectors: OutputSelectors,
    /// Outputs re-applied after a port 1 input change.
    pub mirror_ports: &'static [Port],
    /// Digital I/O, on 4DIO boards.
    pub digital_io: Option<DigitalIo>,
    /// LEDs programmed when a session opens.
    pub open_leds: &'static [LedSetting],
    /// LEDs programmed per sync source.
    pub sync_leds: &'static [(SyncSource, &'static [SyncLed])],
    /// Sources the sync daemon accepts on this board.
    pub daemon_sources: &'static [SyncSource],
}

impl BoardLayout {
    /// Input route for `(port, signal_type)`.
    #[must_use]
    pub fn input_route(&self, port: Port, signal_type: SignalType) -> Option<&'static InputRoute> {
        let routes: &'static [InputRoute] = self.input_routes;
        routes
            .iter()
            .find(|r| r.port == port && r.signal_type == signal_type)
    }

    /// Whether `port` has any input on this board.
    #[must_use]
    pub fn has_input(&self, port: Port) -> bool {
        self.input_routes.iter().any(|r| r.port == port)
    }

    /// Output slot wired to `port`.
    #[must_use]
    pub fn output_slot(&self, port: Port) -> Option<&'static OutputSlot> {
        let slots: &'static [OutputSlot] = self.output_slots;
        slots.iter().find(|s| s.port == port)
    }

    /// LEDs for `source`.
    #[must_use]
    pub fn sync_leds(&self, source: SyncSource) -> &'static [SyncLed] {
        let table: &'static [(SyncSource, &'static [SyncLed])] = self.sync_leds;
        table
            .iter()
            .find(|(s, _)| *s == source)
            .map_or(&[] as &[SyncLed], |&(_, leds)| leds)
    }
}

// ── Layout building blocks ───────────────────────────────────────────────────

const fn led(slot: u32, mode: u32) -> LedSetting {
    LedSetting { slot, mode }
}

const fn strap(line: u32, set: bool) -> Option<TypeStrap> {
    Some(TypeStrap {
        mask: port_data::output_bit(line),
        set,
    })
}

/// Port 1 output is slot 1 with its type on GPO12 on every board.
const PORT1_OUT: OutputSlot = OutputSlot {
    port: Port::Port1,
    slot: 1,
    type_line: 12,
};

const DIO_4: DigitalIo = DigitalIo {
    outputs: [8, 9, 10, 11],
    inputs: [10, 7, 6, 5],
};

const PORT1_DIFF: InputRoute = InputRoute {
    port: Port::Port1,
    signal_type: SignalType::Differential,
    decoder: DECODER1,
    select: input_port::INP1,
    active_low: false,
    type_strap: None,
    led: None,
};

// ── DA-IRIGB-4DIO-PCI104 ─────────────────────────────────────────────────────

static PCI104: BoardLayout = BoardLayout {
    input_routes: &[
        InputRoute {
            port: Port::Port1,
            signal_type: SignalType::Ttl,
            decoder: DECODER1,
            select: input_port::INP2,
            active_low: true,
            type_strap: strap(0, false),
            led: None,
        },
        InputRoute {
            type_strap: strap(0, true),
            ..PORT1_DIFF
        },
    ],
    output_slots: &[PORT1_OUT],
    output_selectors: OutputSelectors {
        from_fiber: None,
        from_port1: Port1Selector::FollowInput,
    },
    mirror_ports: &[Port::Port1],
    digital_io: Some(DIO_4),
    open_leds: &[
        led(3, notify_led::mode_output(1)),
        led(1, notify_led::mode_input(1)),
        led(2, notify_led::mode_input(2)),
    ],
    sync_leds: &[],
    daemon_sources: &[SyncSource::Port1],
};

// ── DE2-IRIGB-4DIO ───────────────────────────────────────────────────────────

static DE2: BoardLayout = BoardLayout {
    input_routes: &[
        InputRoute {
            port: Port::Fiber,
            signal_type: SignalType::Ttl,
            decoder: DECODER0,
            select: input_port::INP2,
            active_low: true,
            type_strap: None,
            led: None,
        },
        PORT1_DIFF,
    ],
    output_slots: &[PORT1_OUT],
    output_selectors: OutputSelectors {
        from_fiber: Some(output_port::SEL_INP2),
        from_port1: Port1Selector::Fixed(output_port::SEL_INP1),
    },
    mirror_ports: &[],
    digital_io: Some(DIO_4),
    open_leds: &[
        led(3, notify_led::mode_output(1)),
        led(1, notify_led::mode_input(1)),
        led(2, notify_led::mode_input(2)),
    ],
    sync_leds: &[
        (SyncSource::Fiber, &[SyncLed::Fixed(led(0, notify_led::MODE_IRIG0_OK))]),
        (SyncSource::Port1, &[SyncLed::Fixed(led(0, notify_led::MODE_IRIG1_OK))]),
    ],
    daemon_sources: &[SyncSource::FreeRun, SyncSource::Fiber, SyncSource::Port1],
};

// ── DA-IRIGB-S ───────────────────────────────────────────────────────────────

static DA_S: BoardLayout = BoardLayout {
    input_routes: &[
        InputRoute {
            port: Port::Fiber,
            signal_type: SignalType::Ttl,
            decoder: DECODER0,
            select: input_port::INP0,
            active_low: true,
            type_strap: None,
            led: Some(led(5, notify_led::mode_input(0))),
        },
        InputRoute {
            port: Port::Port1,
            signal_type: SignalType::Ttl,
            decoder: DECODER1,
            select: input_port::INP2,
            active_low: false,
            type_strap: None,
            led: Some(led(5, notify_led::mode_input(2))),
        },
        InputRoute {
            led: Some(led(5, notify_led::mode_input(1))),
            ..PORT1_DIFF
        },
    ],
    // Panel ports 2 and 3 are wired to FPGA slots 3 and 2.
    output_slots: &[
        PORT1_OUT,
        OutputSlot {
            port: Port::Port2,
            slot: 3,
            type_line: 14,
        },
        OutputSlot {
            port: Port::Port3,
            slot: 2,
            type_line: 13,
        },
        OutputSlot {
            port: Port::Port4,
            slot: 4,
            type_line: 15,
        },
    ],
    output_selectors: OutputSelectors {
        from_fiber: Some(output_port::SEL_INP0),
        from_port1: Port1Selector::FollowInput,
    },
    mirror_ports: &[Port::Port1, Port::Port2, Port::Port3, Port::Port4],
    digital_io: None,
    open_leds: &[
        led(2, notify_led::mode_output(1)),
        led(4, notify_led::mode_output(3)),
        led(1, notify_led::mode_output(2)),
        led(3, notify_led::mode_output(4)),
    ],
    sync_leds: &[
        (
            SyncSource::Fiber,
            &[
                SyncLed::Fixed(led(0, notify_led::MODE_IRIG0_OK)),
                SyncLed::Fixed(led(5, notify_led::mode_input(0))),
            ],
        ),
        (
            SyncSource::Port1,
            &[SyncLed::Fixed(led(0, notify_led::MODE_IRIG1_OK)), SyncLed::Port1Rx],
        ),
    ],
    daemon_sources: &[SyncSource::FreeRun, SyncSource::Fiber, SyncSource::Port1],
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_known_ids() {
        for v in BoardVariant::ALL {
            assert_eq!(BoardVariant::resolve(v.hw_id()).unwrap(), v);
        }
    }

    #[test]
    fn unknown_id_has_no_fallback() {
        for id in [0, 3, 4, 5, 6] {
            assert!(matches!(
                BoardVariant::resolve(id),
                Err(IrigbError::UnknownVariant { hw_id }) if hw_id == id
            ));
        }
    }

    #[test]
    fn resolve_from_port_data_strap() {
        assert_eq!(BoardVariant::from_port_data(0xE000).unwrap(), BoardVariant::DaIrigbS);
        assert_eq!(
            BoardVariant::from_port_data(0xABCD_2000).unwrap(),
            BoardVariant::DaIrigb4DioPci104
        );
    }

    #[test]
    fn no_board_routes_differential_fiber() {
        for v in BoardVariant::ALL {
            assert!(v.layout().input_route(Port::Fiber, SignalType::Differential).is_none());
        }
    }

    #[test]
    fn mirror_ports_are_outputs() {
        for v in BoardVariant::ALL {
            let layout = v.layout();
            for &port in layout.mirror_ports {
                assert!(layout.output_slot(port).is_some(), "{v} {port}");
            }
        }
    }

    #[test]
    fn output_slots_are_distinct() {
        let slots: Vec<u32> = DA_S.output_slots.iter().map(|s| s.slot).collect();
        assert_eq!(slots, [1, 3, 2, 4]);
    }

    #[test]
    fn daemon_sources_have_inputs() {
        for v in BoardVariant::ALL {
            let layout = v.layout();
            for s in layout.daemon_sources {
                if let Some(port) = s.port() {
                    assert!(layout.has_input(port), "{v} {s}");
                }
            }
        }
    }

    #[test]
    fn sync_leds_lookup() {
        assert_eq!(DA_S.sync_leds(SyncSource::Port1).len(), 2);
        assert!(DA_S.sync_leds(SyncSource::FreeRun).is_empty());
        assert!(PCI104.sync_leds(SyncSource::Port1).is_empty());
    }
}
