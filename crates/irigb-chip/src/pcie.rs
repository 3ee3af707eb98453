//! PCI identifiers and the kernel driver's device node.

/// Moxa vendor ID (PCI-SIG assigned).
pub const MOXA_VENDOR_ID: u16 = 0x1393;

/// IRIG-B timing card device ID (`lspci: 1393:a004`).
pub const IRIGB_DEVICE_ID: u16 = 0xA004;

/// Device node created by the `moxa_irigb` kernel module for the first card.
pub const DEVICE_NODE: &str = "/dev/moxa_irigb";

/// Minor/type number the kernel driver uses for its ioctl codes.
pub const IOCTL_TYPE: u8 = 111;

/// Maximum register pairs carried by one batched ioctl.
pub const MAX_PAIRS: usize = 4;

/// Format a `vendor:device` string for use with `lspci -d`.
#[must_use]
pub fn lspci_filter() -> String {
    format!("{MOXA_VENDOR_ID:04x}:{IRIGB_DEVICE_ID:04x}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lspci_filter_format() {
        assert_eq!(lspci_filter(), "1393:a004");
    }
}
