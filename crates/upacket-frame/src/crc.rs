//! CRC-16/XMODEM.
//!
//! Polynomial 0x1021, initial value 0, MSB first, no reflection and no final
//! XOR. Microcontroller peers compute the same checksum bit by bit, so the
//! table-free form is kept here too.

const POLY: u16 = 0x1021;

/// Compute the CRC-16/XMODEM checksum of `bytes`. Empty input yields 0.
pub fn crc16_xmodem(bytes: &[u8]) -> u16 {
    let mut crc: u16 = 0;
    for &b in bytes {
        crc ^= (b as u16) << 8;
        for _ in 0..8 {
            if (crc & 0x8000) != 0 {
                crc = (crc << 1) ^ POLY;
            } else {
                crc <<= 1;
            }
        }
    }
    crc
}
