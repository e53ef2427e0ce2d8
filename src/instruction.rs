//! The packed instruction word produced by the converter.

use crate::opcode::OpCode;

/// A single lowered instruction: `{ opcode: u16, arg: u16 }`, packed into a
/// `u32` so the lowered stream is a flat, cache-friendly array.
///
/// `arg` carries packed immediate bytes for `PUSHn` / immediate-bearing
/// super-instructions, a raw program-counter value for `PC`, or an internal
/// jump target (a lowered index) for `JUMP_TO`.
#[derive(Clone, Copy, PartialEq, Eq)]
#[repr(transparent)]
pub struct Instruction(u32);

impl Instruction {
    #[inline]
    pub const fn new(opcode: OpCode, arg: u16) -> Self {
        Self((opcode.to_u16() as u32) | ((arg as u32) << 16))
    }

    #[inline]
    pub const fn opcode(self) -> OpCode {
        OpCode((self.0 & 0xFFFF) as u16)
    }

    #[inline]
    pub const fn arg(self) -> u16 {
        (self.0 >> 16) as u16
    }

    #[inline]
    pub const fn data(arg: u16) -> Self {
        Self::new(OpCode::DATA, arg)
    }

    #[inline]
    pub const fn noop() -> Self {
        Self::new(OpCode::NOOP, 0)
    }

    #[inline]
    pub const fn jump_to(target: u16) -> Self {
        Self::new(OpCode::JUMP_TO, target)
    }
}

impl std::fmt::Debug for Instruction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Instruction")
            .field("opcode", &self.opcode())
            .field("arg", &self.arg())
            .finish()
    }
}

/// Right-pads `bytes` to an even length and packs it into big-endian `u16`
/// chunks: the first chunk is returned separately (destined for an
/// instruction's `arg` field), the rest are returned in order (destined for
/// sequential `DATA` auxiliary words).
///
/// This is the single packing routine shared by `PUSHn` lowering and every
/// immediate-bearing super-instruction.
pub fn pack_immediate(bytes: &[u8]) -> (u16, Vec<u16>) {
    let mut padded = bytes.to_vec();
    if padded.len() % 2 != 0 {
        padded.push(0);
    }
    let mut chunks = padded.chunks_exact(2).map(|c| u16::from_be_bytes([c[0], c[1]]));
    let arg = chunks.next().unwrap_or(0);
    (arg, chunks.collect())
}

/// Inverse of [`pack_immediate`]: reconstructs the first `n` immediate bytes
/// from an instruction's `arg` plus `ceil((n.max(2) - 2) / 2)` trailing `DATA`
/// words.
pub fn unpack_immediate(arg: u16, data: &[u16], n: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(n + 1);
    out.extend_from_slice(&arg.to_be_bytes());
    for &d in data {
        out.extend_from_slice(&d.to_be_bytes());
    }
    out.truncate(n);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_even() {
        let (arg, data) = pack_immediate(&[0x01, 0x02, 0x03, 0x04]);
        assert_eq!(unpack_immediate(arg, &data, 4), vec![0x01, 0x02, 0x03, 0x04]);
    }

    #[test]
    fn roundtrip_odd() {
        let (arg, data) = pack_immediate(&[0xaa, 0xbb, 0xcc]);
        assert_eq!(unpack_immediate(arg, &data, 3), vec![0xaa, 0xbb, 0xcc]);
    }

    #[test]
    fn roundtrip_single_byte() {
        let (arg, data) = pack_immediate(&[0x42]);
        assert!(data.is_empty());
        assert_eq!(unpack_immediate(arg, &data, 1), vec![0x42]);
    }

    #[test]
    fn instruction_packing() {
        let i = Instruction::new(OpCode::PUSH1, 0x1234);
        assert_eq!(i.opcode(), OpCode::PUSH1);
        assert_eq!(i.arg(), 0x1234);
    }
}
