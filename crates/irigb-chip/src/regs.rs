//! FPGA register map.
//!
//! Addresses are indices into the FPGA register file; the kernel driver
//! scales them to BAR offsets. The order below is fixed by the firmware.
//!
//! ```text
//! idx  name                 purpose
//! ───  ───────────────────  ─────────────────────────────────────────────
//!   0  DEVICE_ID            device ID
//!   1  DATE_CODE            firmware build date, BCD yyyyMMdd
//!   4  INPUT_PORT_CONFIG    decoder input select + inversion
//!   5  OUTPUT_PORT_CONFIG   output source select + inversion
//!   6  PORT_DATA            GPI (bits 0-15) / GPO (bits 16-31)
//!  17  PPS_CONFIG           PPS decoder hold time / encoder pulse width
//!  18  TIME_MODULE_CONFIG   parity check modes
//!  19  INT_STATUS           decoder status, latched by the kernel driver
//!  22  RTC_CONFIG           RTC sync source
//! 23-26 RTC_DATA0..3        RTC snapshot / set registers
//!  31  NOTIFY_LED_CONFIG    eight 4-bit LED mode slots
//! ```

// ── Identity ─────────────────────────────────────────────────────────────────

/// Device ID register.
pub const DEVICE_ID: usize = 0;
/// FPGA firmware date code, BCD `yyyyMMdd` (e.g. `0x2014_0101`).
pub const DATE_CODE: usize = 1;
/// System configuration (reset, loop-back test).
pub const SYSTEM_CONFIG: usize = 2;
/// Loop-back test counter, 40 ns per unit.
pub const LOOPBACK_COUNTER: usize = 3;

// ── Port routing ─────────────────────────────────────────────────────────────

/// Input port configuration.
pub const INPUT_PORT_CONFIG: usize = 4;
/// Output port configuration.
pub const OUTPUT_PORT_CONFIG: usize = 5;
/// Input / output port data.
pub const PORT_DATA: usize = 6;

// ── IRIG-B decoders ──────────────────────────────────────────────────────────

/// IRIG-B decoder 0 data words (fed by the fiber input).
pub const IRIG_DECODER0_DATA: [usize; 4] = [7, 8, 9, 10];
/// IRIG-B decoder 0 frame counter.
pub const IRIG_DECODER0_COUNTER: usize = 11;
/// IRIG-B decoder 1 data words (fed by port 1).
pub const IRIG_DECODER1_DATA: [usize; 4] = [12, 13, 14, 15];
/// IRIG-B decoder 1 frame counter.
pub const IRIG_DECODER1_COUNTER: usize = 16;

// ── Time module ──────────────────────────────────────────────────────────────

/// Pulse-per-second configuration.
pub const PPS_CONFIG: usize = 17;
/// Time module configuration (parity modes).
pub const TIME_MODULE_CONFIG: usize = 18;
/// Interrupt status.
pub const INT_STATUS: usize = 19;
/// Interrupt mask.
pub const INT_MASK: usize = 20;
/// PPS decoder timeout.
pub const PPS_TIMEOUT: usize = 21;

// ── RTC ──────────────────────────────────────────────────────────────────────

/// RTC configuration (sync source).
pub const RTC_CONFIG: usize = 22;
/// RTC data word 0: sec/min/hour/day BCD.
pub const RTC_DATA0: usize = 23;
/// RTC data word 1: month BCD + 4-digit BCD year + commit flag.
pub const RTC_DATA1: usize = 24;
/// RTC data word 2: nanoseconds, binary.
pub const RTC_DATA2: usize = 25;
/// RTC data word 3: control function flags.
pub const RTC_DATA3: usize = 26;
/// The four RTC snapshot words, in decode order.
pub const RTC_SNAPSHOT: [usize; 4] = [RTC_DATA0, RTC_DATA1, RTC_DATA2, RTC_DATA3];
/// RTC leap second schedule.
pub const RTC_LEAP_SECOND: usize = 27;
/// RTC daylight saving schedule.
pub const RTC_DST: usize = 28;

// ── Misc ─────────────────────────────────────────────────────────────────────

/// Serial FIFO configuration.
pub const SERIAL_FIFO_CONFIG: usize = 29;
/// Serial FIFO data.
pub const SERIAL_FIFO_DATA: usize = 30;
/// Notify LED configuration.
pub const NOTIFY_LED_CONFIG: usize = 31;

/// Number of registers in the file.
pub const REGISTER_COUNT: usize = 32;

/// Human-readable register name, for logs.
#[must_use]
pub const fn name(addr: usize) -> &'static str {
    match addr {
        DEVICE_ID => "DEVICEID",
        DATE_CODE => "DATECODE",
        SYSTEM_CONFIG => "SYSCON",
        LOOPBACK_COUNTER => "LPBTCNT",
        INPUT_PORT_CONFIG => "INPORTCON",
        OUTPUT_PORT_CONFIG => "OUTPORTCON",
        PORT_DATA => "PORTDAT",
        7..=16 => "IRIGBDE",
        PPS_CONFIG => "PPSCON",
        TIME_MODULE_CONFIG => "TMCON",
        INT_STATUS => "INTSTS",
        INT_MASK => "INTMSK",
        PPS_TIMEOUT => "PPSDETIMEOUT",
        RTC_CONFIG => "RTCCON",
        RTC_DATA0 => "RTCDAT0",
        RTC_DATA1 => "RTCDAT1",
        RTC_DATA2 => "RTCDAT2",
        RTC_DATA3 => "RTCDAT3",
        RTC_LEAP_SECOND => "RTCLS",
        RTC_DST => "RTCDST",
        SERIAL_FIFO_CONFIG => "SFIFOCON",
        SERIAL_FIFO_DATA => "SFIFODAT",
        NOTIFY_LED_CONFIG => "NLEDCON",
        _ => "?",
    }
}

// ── INPUT_PORT_CONFIG ────────────────────────────────────────────────────────

pub mod input_port {
    //! Each decoder has a 3-bit input selector and an enable bit; each
    //! physical input has an inversion bit.

    /// Selector field width mask.
    pub const SELECT_MASK: u32 = 0x7;
    /// IRIG-B decoder 0 selector shift.
    pub const DECODER0_SHIFT: u32 = 0;
    /// IRIG-B decoder 1 selector shift.
    pub const DECODER1_SHIFT: u32 = 4;
    /// PPS decoder selector shift.
    pub const PPS_DECODER_SHIFT: u32 = 8;

    /// Decoder 0 enable. The firmware header calls this `IRIGDE0_DIS`, but
    /// the decoder only runs with it set.
    pub const DECODER0_ENABLE: u32 = 1 << 3;
    /// Decoder 1 enable (`IRIGDE1_DIS` in the firmware header).
    pub const DECODER1_ENABLE: u32 = 1 << 7;

    /// Physical input selector values.
    pub const INP0: u32 = 0;
    /// Physical input 1 (port 1, differential receiver).
    pub const INP1: u32 = 1;
    /// Physical input 2 (TTL receiver).
    pub const INP2: u32 = 2;

    /// Inversion bit for physical input `n`.
    #[must_use]
    pub const fn invert_bit(input: u32) -> u32 {
        1 << (16 + input)
    }
}

// ── OUTPUT_PORT_CONFIG ───────────────────────────────────────────────────────

pub mod output_port {
    //! Each output slot is five bits wide: a 4-bit source selector followed
    //! by its inversion bit.

    /// Selector field width mask.
    pub const SELECT_MASK: u32 = 0xF;

    /// Slot shift for output `n` (0..=5).
    #[must_use]
    pub const fn slot_shift(slot: u32) -> u32 {
        slot * 5
    }

    /// Inversion bit for output slot `n` (0..=5).
    #[must_use]
    pub const fn invert_bit(slot: u32) -> u32 {
        1 << (slot * 5 + 4)
    }

    /// General-purpose output.
    pub const SEL_GPO: u32 = 0x0;
    /// IRIG-B encoder (internal RTC).
    pub const SEL_IRIGB_ENCODER: u32 = 0x1;
    /// PPS encoder.
    pub const SEL_PPS_ENCODER: u32 = 0x3;
    /// High impedance.
    pub const SEL_HIGH_Z: u32 = 0x5;
    /// Physical input 0 passthrough.
    pub const SEL_INP0: u32 = 0x8;
    /// Physical input 1 passthrough.
    pub const SEL_INP1: u32 = 0x9;
    /// Physical input 2 passthrough.
    pub const SEL_INP2: u32 = 0xA;
}

// ── PORT_DATA ────────────────────────────────────────────────────────────────

pub mod port_data {
    /// Width mask of each half.
    pub const HALF_MASK: u32 = 0xFFFF;
    /// Shift of the GPI half.
    pub const INPUT_SHIFT: u32 = 0;
    /// Shift of the GPO half.
    pub const OUTPUT_SHIFT: u32 = 16;

    /// Register bit of general-purpose output `n`.
    #[must_use]
    pub const fn output_bit(n: u32) -> u32 {
        1 << (n + OUTPUT_SHIFT)
    }

    /// Register bit of general-purpose input `n`.
    #[must_use]
    pub const fn input_bit(n: u32) -> u32 {
        1 << (n + INPUT_SHIFT)
    }
}

// ── PPS_CONFIG ───────────────────────────────────────────────────────────────

pub mod pps {
    /// Decoder hold time field mask.
    pub const HOLD_TIME_MASK: u32 = 0xFFFF;
    /// Decoder hold time shift.
    pub const HOLD_TIME_SHIFT: u32 = 0;
    /// Encoder pulse width field mask (milliseconds).
    pub const PULSE_WIDTH_MASK: u32 = 0xFFFF;
    /// Encoder pulse width shift.
    pub const PULSE_WIDTH_SHIFT: u32 = 16;
}

// ── TIME_MODULE_CONFIG ───────────────────────────────────────────────────────

pub mod time_module {
    /// Decoder 0 checks odd parity (even when clear).
    pub const DECODER0_PARITY_ODD: u32 = 1 << 0;
    /// Decoder 1 checks odd parity.
    pub const DECODER1_PARITY_ODD: u32 = 1 << 1;
    /// Encoder emits odd parity.
    pub const ENCODER_PARITY_ODD: u32 = 1 << 2;
    /// Decoder 0 parity check disabled.
    pub const DECODER0_PARITY_DISABLE: u32 = 1 << 3;
    /// Decoder 1 parity check disabled.
    pub const DECODER1_PARITY_DISABLE: u32 = 1 << 4;
}

// ── INT_STATUS ───────────────────────────────────────────────────────────────

pub mod int_status {
    /// Decoder 0 lost its signal.
    pub const DECODER0_OFFLINE: u32 = 1 << 0;
    /// Decoder 0 frame error.
    pub const DECODER0_FRAME_ERROR: u32 = 1 << 1;
    /// Decoder 0 parity error.
    pub const DECODER0_PARITY_ERROR: u32 = 1 << 2;
    /// Decoder 0 decoded a frame.
    pub const DECODER0_DONE: u32 = 1 << 3;
    /// Decoder 1 lost its signal.
    pub const DECODER1_OFFLINE: u32 = 1 << 4;
    /// Decoder 1 frame error.
    pub const DECODER1_FRAME_ERROR: u32 = 1 << 5;
    /// Decoder 1 parity error.
    pub const DECODER1_PARITY_ERROR: u32 = 1 << 6;
    /// Decoder 1 decoded a frame.
    pub const DECODER1_DONE: u32 = 1 << 7;
    /// PPS decoder timed out.
    pub const PPS_DECODER_TIMEOUT: u32 = 1 << 8;
    /// PPS decoder pulse seen.
    pub const PPS_DECODER_DONE: u32 = 1 << 9;
    /// IRIG-B encoder frame sent.
    pub const IRIGB_ENCODER_DONE: u32 = 1 << 10;
    /// PPS encoder pulse sent.
    pub const PPS_ENCODER_DONE: u32 = 1 << 11;
}

// ── RTC_CONFIG ───────────────────────────────────────────────────────────────

pub mod rtc_config {
    /// Sync source field mask.
    pub const SYNC_SOURCE_MASK: u32 = 0x7;
    /// Free-running on the internal oscillator.
    pub const SYNC_FREE_RUN: u32 = 0x0;
    /// Disciplined by IRIG-B decoder 0 (fiber).
    pub const SYNC_IRIG0: u32 = 0x1;
    /// Disciplined by IRIG-B decoder 1 (port 1).
    pub const SYNC_IRIG1: u32 = 0x2;
    /// Disciplined by the PPS decoder.
    pub const SYNC_PPS: u32 = 0x3;
    /// Leap second type.
    pub const LEAP_SECOND_TYPE: u32 = 1 << 5;
}

// ── RTC_DATA0..3 ─────────────────────────────────────────────────────────────

pub mod rtc_data {
    /// `RTC_DATA0`: seconds BCD byte shift.
    pub const SECOND_SHIFT: u32 = 0;
    /// `RTC_DATA0`: minutes BCD byte shift.
    pub const MINUTE_SHIFT: u32 = 8;
    /// `RTC_DATA0`: hours BCD byte shift.
    pub const HOUR_SHIFT: u32 = 16;
    /// `RTC_DATA0`: day-of-month BCD byte shift.
    pub const DAY_SHIFT: u32 = 24;
    /// `RTC_DATA1`: month BCD byte shift.
    pub const MONTH_SHIFT: u32 = 0;
    /// `RTC_DATA1`: 4-digit BCD year shift.
    pub const YEAR_SHIFT: u32 = 8;
    /// `RTC_DATA1`: latch the written value into the RTC.
    pub const COMMIT_TIME: u32 = 1 << 31;

    /// `RTC_DATA3`: leap second pending at end of minute.
    pub const LEAP_PENDING: u32 = 1 << 0;
    /// `RTC_DATA3`: leap second type, set = delete (−1).
    pub const LEAP_DELETE: u32 = 1 << 1;
    /// `RTC_DATA3`: DST change pending at end of minute.
    pub const DST_PENDING: u32 = 1 << 2;
    /// `RTC_DATA3`: DST in effect.
    pub const DST_ACTIVE: u32 = 1 << 3;
    /// `RTC_DATA3`: time zone offset sign, set = negative.
    pub const TZ_NEGATIVE: u32 = 1 << 4;
    /// `RTC_DATA3`: additional half-hour offset.
    pub const TZ_HALF_HOUR: u32 = 1 << 5;
    /// `RTC_DATA3`: time zone offset field mask.
    pub const TZ_MASK: u32 = 0xF;
    /// `RTC_DATA3`: time zone offset shift.
    pub const TZ_SHIFT: u32 = 6;
    /// `RTC_DATA3`: time quality field mask.
    pub const QUALITY_MASK: u32 = 0xF;
    /// `RTC_DATA3`: time quality shift.
    pub const QUALITY_SHIFT: u32 = 10;
}

// ── NOTIFY_LED_CONFIG ────────────────────────────────────────────────────────

pub mod notify_led {
    //! Eight 4-bit slots, one per front-panel LED.

    /// Slot field mask.
    pub const MODE_MASK: u32 = 0xF;

    /// Shift of LED slot `n` (0..=7).
    #[must_use]
    pub const fn slot_shift(slot: u32) -> u32 {
        slot * 4
    }

    /// Mirror output `n` (0..=5).
    #[must_use]
    pub const fn mode_output(n: u32) -> u32 {
        n
    }

    /// Decoder 0 locked.
    pub const MODE_IRIG0_OK: u32 = 6;
    /// Decoder 1 locked.
    pub const MODE_IRIG1_OK: u32 = 7;

    /// Mirror physical input `n` (0..=7).
    #[must_use]
    pub const fn mode_input(n: u32) -> u32 {
        8 + n
    }
}
