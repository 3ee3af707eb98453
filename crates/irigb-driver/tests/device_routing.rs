//! Device session sequences against the simulated card

use irigb_chip::regs::{self, output_port, port_data, rtc_config};
use irigb_driver::backends::{Access, FaultOp, SimulatedCard};
use irigb_driver::{
    ApplyStep, BoardVariant, CalendarTime, IrigbDevice, IrigbError, OutputConfig, OutputMode,
    Port, SignalType,
};

fn open(variant: BoardVariant) -> (IrigbDevice, SimulatedCard) {
    let card = SimulatedCard::new(variant);
    let device = IrigbDevice::with_port(Box::new(card.clone())).expect("open simulated card");
    card.clear_log();
    (device, card)
}

fn port1_selector(card: &SimulatedCard) -> u32 {
    (card.register(regs::OUTPUT_PORT_CONFIG) >> output_port::slot_shift(1)) & output_port::SELECT_MASK
}

#[test]
fn unknown_strap_fails_open_without_writes() {
    let card = SimulatedCard::with_hw_id(5);
    let err = IrigbDevice::with_port(Box::new(card.clone())).unwrap_err();
    assert!(matches!(err, IrigbError::UnknownVariant { hw_id: 5 }));
    assert!(card.writes().is_empty());
}

#[test]
fn differential_fiber_never_writes() {
    for variant in BoardVariant::ALL {
        let (mut device, card) = open(variant);
        let err = device
            .set_input(Port::Fiber, SignalType::Differential, false)
            .unwrap_err();
        assert!(
            matches!(err, IrigbError::UnsupportedCombination { .. }),
            "{variant}: {err}"
        );
        assert!(card.writes().is_empty(), "{variant}");
    }
}

#[test]
fn mirrored_output_follows_port1_on_pci104() {
    let (mut device, card) = open(BoardVariant::DaIrigb4DioPci104);
    let type_bit = port_data::output_bit(12);

    device.set_input(Port::Port1, SignalType::Ttl, false).unwrap();
    device
        .set_output(Port::Port1, SignalType::Ttl, OutputMode::FromPort1In, false)
        .unwrap();
    assert_eq!(port1_selector(&card), output_port::SEL_INP2);
    assert_eq!(card.register(regs::PORT_DATA) & type_bit, 0);

    device.set_input(Port::Port1, SignalType::Differential, false).unwrap();
    assert_eq!(port1_selector(&card), output_port::SEL_INP1);
    assert_ne!(card.register(regs::PORT_DATA) & type_bit, 0);
    assert_eq!(
        device.output(Port::Port1).unwrap(),
        OutputConfig {
            signal_type: SignalType::Differential,
            mode: Some(OutputMode::FromPort1In),
            invert: false,
        }
    );

    device.set_input(Port::Port1, SignalType::Ttl, false).unwrap();
    assert_eq!(port1_selector(&card), output_port::SEL_INP2);
    assert_eq!(card.register(regs::PORT_DATA) & type_bit, 0);
}

#[test]
fn mirrored_outputs_follow_port1_on_da_s() {
    let (mut device, _card) = open(BoardVariant::DaIrigbS);

    device.set_input(Port::Port1, SignalType::Ttl, false).unwrap();
    device
        .set_output(Port::Port2, SignalType::Ttl, OutputMode::FromPort1In, true)
        .unwrap();
    device
        .set_output(Port::Port4, SignalType::Ttl, OutputMode::FromPort1In, false)
        .unwrap();
    device
        .set_output(Port::Port3, SignalType::Ttl, OutputMode::IrigbEncode, false)
        .unwrap();

    for (ty, expect) in [
        (SignalType::Differential, SignalType::Differential),
        (SignalType::Ttl, SignalType::Ttl),
    ] {
        device.set_input(Port::Port1, ty, false).unwrap();

        let p2 = device.output(Port::Port2).unwrap();
        assert_eq!(p2.signal_type, expect);
        assert_eq!(p2.mode, Some(OutputMode::FromPort1In));
        assert!(p2.invert, "inversion survives the fix-up");

        assert_eq!(device.output(Port::Port4).unwrap().signal_type, expect);

        let p3 = device.output(Port::Port3).unwrap();
        assert_eq!(p3.signal_type, SignalType::Ttl);
        assert_eq!(p3.mode, Some(OutputMode::IrigbEncode));
    }
}

#[test]
fn de2_has_no_mirror_fixup() {
    let (mut device, card) = open(BoardVariant::De2Irigb4Dio);
    device
        .set_output(Port::Port1, SignalType::Ttl, OutputMode::FromPort1In, false)
        .unwrap();
    card.clear_log();

    device.set_input(Port::Port1, SignalType::Differential, false).unwrap();
    assert!(card
        .writes()
        .iter()
        .all(|a| a.addr() != regs::OUTPUT_PORT_CONFIG));
    assert_eq!(device.output(Port::Port1).unwrap().signal_type, SignalType::Ttl);
}

#[test]
fn mirror_fixup_failure_is_partial() {
    let (mut device, card) = open(BoardVariant::DaIrigb4DioPci104);
    device
        .set_output(Port::Port1, SignalType::Differential, OutputMode::FromPort1In, false)
        .unwrap();
    card.inject_fault(FaultOp::SetClear, regs::OUTPUT_PORT_CONFIG);

    let err = device.set_input(Port::Port1, SignalType::Ttl, false).unwrap_err();
    assert!(matches!(
        err,
        IrigbError::PartialApply {
            step: ApplyStep::MirrorFixup,
            ..
        }
    ));
    // The input itself landed.
    card.clear_faults();
    assert_eq!(
        device.input(Port::Port1).unwrap().map(|c| c.signal_type),
        Some(SignalType::Ttl)
    );
}

#[test]
fn rtc_write_failure_restores_source() {
    let (mut device, card) = open(BoardVariant::DaIrigbS);
    card.set_register(regs::RTC_CONFIG, rtc_config::SYNC_IRIG0);
    card.inject_fault(FaultOp::Write, regs::RTC_DATA1);

    let err = device
        .write_time(&CalendarTime::new(2025, 5, 5, 5, 5, 5))
        .unwrap_err();
    assert!(matches!(err, IrigbError::Transport { .. }), "{err}");

    assert_eq!(
        card.register(regs::RTC_CONFIG) & rtc_config::SYNC_SOURCE_MASK,
        rtc_config::SYNC_IRIG0
    );
    assert_eq!(
        card.writes(),
        [
            Access::SetClear {
                addr: regs::RTC_CONFIG,
                set: rtc_config::SYNC_FREE_RUN,
                clear: rtc_config::SYNC_SOURCE_MASK,
            },
            Access::SetClear {
                addr: regs::RTC_CONFIG,
                set: rtc_config::SYNC_IRIG0,
                clear: rtc_config::SYNC_SOURCE_MASK,
            },
        ]
    );
    assert_eq!(device.read_time().unwrap(), CalendarTime::new(2024, 1, 1, 0, 0, 0));
}

#[test]
fn rtc_write_is_one_batch() {
    let (mut device, card) = open(BoardVariant::De2Irigb4Dio);
    device
        .write_time(&CalendarTime::new(2025, 12, 31, 23, 59, 59))
        .unwrap();
    let data_writes: Vec<_> = card
        .writes()
        .into_iter()
        .filter(|a| matches!(a, Access::Write { .. }))
        .collect();
    assert_eq!(data_writes.len(), 2);
    assert_eq!(data_writes[0].addr(), regs::RTC_DATA0);
    assert_eq!(data_writes[1].addr(), regs::RTC_DATA1);
}
