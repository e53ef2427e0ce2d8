//! One-pass lowering of packed EVM bytecode into the wide instruction stream,
//! with an optional peephole fusion pass and a PC-map variant for tooling.

use crate::{
    instruction::{pack_immediate, Instruction},
    opcode::OpCode,
};

/// Maximum accepted raw code length (init-code size cap, EIP-3860).
pub const MAX_CODE_SIZE: usize = 49_152;

/// Maximum lowered stream length eligible for the conversion cache.
pub const MAX_CACHED_LOWERED_LEN: usize = 24_576;

/// Lower raw EVM bytecode into a sequence of instruction words.
///
/// Deterministic and referentially transparent: the same `raw` and
/// `with_super_instructions` always produce the same stream.
pub fn convert(raw: &[u8], with_super_instructions: bool) -> Vec<Instruction> {
    let mut out = Vec::with_capacity(raw.len());
    let mut i = 0usize;

    while i < raw.len() {
        if with_super_instructions {
            if let Some((op, arg, data, consumed)) = match_super_instruction(&raw[i..]) {
                out.push(Instruction::new(op, arg));
                out.extend(data.into_iter().map(Instruction::data));
                i += consumed;
                continue;
            }
        }

        let op = OpCode::from_byte(raw[i]);

        if op == OpCode::JUMPDEST {
            bridge_to(&mut out, i);
            out.push(Instruction::new(OpCode::JUMPDEST, 0));
            i += 1;
            continue;
        }

        if let Some(n) = op.push_width() {
            let n = n as usize;
            let end = (i + 1 + n).min(raw.len());
            let mut imm = raw[i + 1..end].to_vec();
            imm.resize(n, 0);
            let (arg, data) = pack_immediate(&imm);
            out.push(Instruction::new(op, arg));
            out.extend(data.into_iter().map(Instruction::data));
            i += 1 + n;
            continue;
        }

        if op == OpCode::PC {
            if i > u16::MAX as usize {
                out.push(Instruction::new(OpCode::INVALID, 0));
            } else {
                out.push(Instruction::new(OpCode::PC, i as u16));
            }
            i += 1;
            continue;
        }

        out.push(Instruction::new(op, 0));
        i += 1;
    }

    out
}

/// Bidirectional raw-offset <-> lowered-index map, for external tooling
/// (conformance testing). Super-instructions are unsupported in this mode.
#[derive(Clone, Debug)]
pub struct PcMap {
    pub raw_to_lowered: Vec<u32>,
    pub lowered_to_raw: Vec<u32>,
}

/// Lower `raw` while also recording, for every raw-offset-to-lowered-index
/// emission, both directions of the mapping, including the one-past-the-end offset.
pub fn convert_with_pc_map(raw: &[u8]) -> (Vec<Instruction>, PcMap) {
    let mut out = Vec::with_capacity(raw.len());
    let mut raw_to_lowered = vec![0u32; raw.len() + 1];
    let mut lowered_to_raw = Vec::with_capacity(raw.len() + 1);
    let mut i = 0usize;

    while i < raw.len() {
        let op = OpCode::from_byte(raw[i]);
        raw_to_lowered[i] = out.len() as u32;

        if op == OpCode::JUMPDEST {
            bridge_to(&mut out, i);
            // Backfill lowered_to_raw for the NOOP/JUMP_TO padding just inserted.
            while lowered_to_raw.len() < out.len() {
                lowered_to_raw.push(i as u32);
            }
            out.push(Instruction::new(OpCode::JUMPDEST, 0));
            lowered_to_raw.push(i as u32);
            i += 1;
            continue;
        }

        if let Some(n) = op.push_width() {
            let n = n as usize;
            let end = (i + 1 + n).min(raw.len());
            let mut imm = raw[i + 1..end].to_vec();
            imm.resize(n, 0);
            let (arg, data) = pack_immediate(&imm);
            out.push(Instruction::new(op, arg));
            lowered_to_raw.push(i as u32);
            for d in data {
                out.push(Instruction::data(d));
                lowered_to_raw.push(i as u32);
            }
            i += 1 + n;
            continue;
        }

        if op == OpCode::PC {
            if i > u16::MAX as usize {
                out.push(Instruction::new(OpCode::INVALID, 0));
            } else {
                out.push(Instruction::new(OpCode::PC, i as u16));
            }
            lowered_to_raw.push(i as u32);
            i += 1;
            continue;
        }

        out.push(Instruction::new(op, 0));
        lowered_to_raw.push(i as u32);
        i += 1;
    }

    raw_to_lowered[raw.len()] = out.len() as u32;
    lowered_to_raw.push(raw.len() as u32);

    (
        out,
        PcMap {
            raw_to_lowered,
            lowered_to_raw,
        },
    )
}

fn bridge_to(out: &mut Vec<Instruction>, target: usize) {
    if out.len() < target {
        let from = out.len();
        out.push(Instruction::jump_to(target as u16));
        for _ in (from + 1)..target {
            out.push(Instruction::noop());
        }
    }
}

type SuperMatch = (OpCode, u16, Vec<u16>, usize);

/// Try to match a peephole fusion pattern at the start of `s`. Patterns are
/// tried longest-first so that a pattern is never shadowed by a shorter
/// pattern matching its own prefix (e.g. `SWAP2_SWAP1` is a prefix of
/// `SWAP2_SWAP1_POP_JUMP`).
fn match_super_instruction(s: &[u8]) -> Option<SuperMatch> {
    match_len8(s)
        .or_else(|| match_len5(s))
        .or_else(|| match_len4(s))
        .or_else(|| match_len3(s))
        .or_else(|| match_len2(s))
}

fn imm(bytes: &[u8]) -> (u16, Vec<u16>) {
    pack_immediate(bytes)
}

fn match_len8(s: &[u8]) -> Option<SuperMatch> {
    if s.len() < 8 {
        return None;
    }
    if s[0] == 0x60 && s[2] == 0x63 && s[7] == 0x82 {
        let (arg, data) = imm(&[s[1], s[3], s[4], s[5], s[6]]);
        return Some((OpCode::PUSH1_PUSH4_DUP3, arg, data, 8));
    }
    if s[0] == 0x60 && s[2] == 0x60 && s[4] == 0x60 && s[6] == 0x1b && s[7] == 0x03 {
        let (arg, data) = imm(&[s[1], s[3], s[5]]);
        return Some((OpCode::PUSH1_PUSH1_PUSH1_SHL_SUB, arg, data, 8));
    }
    None
}

fn match_len5(s: &[u8]) -> Option<SuperMatch> {
    if s.len() < 5 {
        return None;
    }
    if s[0] == 0x15 && s[1] == 0x61 && s[4] == 0x57 {
        let (arg, data) = imm(&[s[2], s[3]]);
        return Some((OpCode::ISZERO_PUSH2_JUMPI, arg, data, 5));
    }
    if s[0..5] == [0x16, 0x90, 0x50, 0x91, 0x90] {
        return Some((OpCode::AND_SWAP1_POP_SWAP2_SWAP1, 0, vec![], 5));
    }
    None
}

fn match_len4(s: &[u8]) -> Option<SuperMatch> {
    if s.len() < 4 {
        return None;
    }
    if s[0] == 0x61 && s[3] == 0x56 {
        let (arg, data) = imm(&[s[1], s[2]]);
        return Some((OpCode::PUSH2_JUMP, arg, data, 4));
    }
    if s[0] == 0x61 && s[3] == 0x57 {
        let (arg, data) = imm(&[s[1], s[2]]);
        return Some((OpCode::PUSH2_JUMPI, arg, data, 4));
    }
    if s[0..4] == [0x91, 0x90, 0x50, 0x56] {
        return Some((OpCode::SWAP2_SWAP1_POP_JUMP, 0, vec![], 4));
    }
    if s[0..4] == [0x90, 0x50, 0x91, 0x90] {
        return Some((OpCode::SWAP1_POP_SWAP2_SWAP1, 0, vec![], 4));
    }
    if s[0..4] == [0x50, 0x91, 0x90, 0x50] {
        return Some((OpCode::POP_SWAP2_SWAP1_POP, 0, vec![], 4));
    }
    if s[0] == 0x60 && s[2] == 0x60 {
        let (arg, data) = imm(&[s[1], s[3]]);
        return Some((OpCode::PUSH1_PUSH1, arg, data, 4));
    }
    None
}

fn match_len3(s: &[u8]) -> Option<SuperMatch> {
    if s.len() < 3 {
        return None;
    }
    if s[0] == 0x60 && s[2] == 0x01 {
        let (arg, data) = imm(&[s[1]]);
        return Some((OpCode::PUSH1_ADD, arg, data, 3));
    }
    if s[0] == 0x60 && s[2] == 0x1b {
        let (arg, data) = imm(&[s[1]]);
        return Some((OpCode::PUSH1_SHL, arg, data, 3));
    }
    if s[0] == 0x60 && s[2] == 0x80 {
        let (arg, data) = imm(&[s[1]]);
        return Some((OpCode::PUSH1_DUP1, arg, data, 3));
    }
    None
}

fn match_len2(s: &[u8]) -> Option<SuperMatch> {
    if s.len() < 2 {
        return None;
    }
    match [s[0], s[1]] {
        [0x90, 0x50] => Some((OpCode::SWAP1_POP, 0, vec![], 2)),
        [0x50, 0x50] => Some((OpCode::POP_POP, 0, vec![], 2)),
        [0x81, 0x10] => Some((OpCode::DUP2_LT, 0, vec![], 2)),
        [0x81, 0x52] => Some((OpCode::DUP2_MSTORE, 0, vec![], 2)),
        [0x91, 0x90] => Some((OpCode::SWAP2_SWAP1, 0, vec![], 2)),
        [0x91, 0x50] => Some((OpCode::SWAP2_POP, 0, vec![], 2)),
        [0x50, 0x56] => Some((OpCode::POP_JUMP, 0, vec![], 2)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_code_converts_to_empty_stream() {
        assert!(convert(&[], false).is_empty());
    }

    #[test]
    fn length_never_exceeds_input() {
        let raw = hex_literal::hex!("600160026003015050");
        let lowered = convert(&raw, false);
        assert!(lowered.len() <= raw.len());
    }

    #[test]
    fn jumpdest_lands_at_same_numeric_index() {
        // PUSH1 0x02; JUMP; JUMPDEST
        let raw = hex_literal::hex!("6002565b");
        let lowered = convert(&raw, false);
        assert_eq!(lowered[2].opcode(), OpCode::JUMPDEST);
    }

    #[test]
    fn jump_to_bridges_over_shrunken_push() {
        // raw: 61 00 00 (PUSH2, 3 bytes, offsets 0-2) 00 (STOP, offset 3)
        // 00 (STOP, offset 4) 5b (JUMPDEST, offset 5).
        let raw = hex_literal::hex!("61000000005b");
        let lowered = convert(&raw, false);
        // PUSH2's 3 raw bytes collapse into 1 lowered word, so by the time the
        // scan reaches the JUMPDEST the lowered stream has fallen behind the
        // raw offset and needs a bridge to catch back up.
        let target = 5usize;
        assert_eq!(lowered[target].opcode(), OpCode::JUMPDEST);
        // Everything strictly between the bridge and the target is a NOOP,
        // except the single JUMP_TO word that starts the bridge.
        let bridge_start = lowered
            .iter()
            .position(|w| w.opcode() == OpCode::JUMP_TO)
            .expect("a bridge must have been inserted");
        assert_eq!(lowered[bridge_start].arg(), target as u16);
        for w in &lowered[bridge_start + 1..target] {
            assert_eq!(w.opcode(), OpCode::NOOP);
        }
    }

    #[test]
    fn push32_overrun_is_zero_padded() {
        let raw = [0x7f]; // PUSH32 with no immediate bytes at all
        let lowered = convert(&raw, false);
        assert_eq!(lowered[0].opcode(), OpCode::PUSH32);
        assert_eq!(lowered[0].arg(), 0);
    }

    #[test]
    fn pc_out_of_u16_range_becomes_invalid() {
        let mut raw = vec![0x5b; u16::MAX as usize + 2];
        raw.push(OpCode::PC.to_u16() as u8);
        let lowered = convert(&raw, false);
        assert_eq!(
            lowered[u16::MAX as usize + 2].opcode(),
            OpCode::INVALID
        );
    }

    #[test]
    fn no_super_instructions_means_only_base_opcodes() {
        let raw = hex_literal::hex!("6001600201");
        let lowered = convert(&raw, false);
        for w in lowered {
            assert!(w.opcode().is_base());
        }
    }

    #[test]
    fn super_instruction_fuses_push1_push1() {
        let raw = hex_literal::hex!("600160025050"); // PUSH1 1; PUSH1 2; POP; POP
        let lowered = convert(&raw, true);
        assert_eq!(lowered[0].opcode(), OpCode::PUSH1_PUSH1);
        assert_eq!(lowered[0].arg(), 0x0102);
        assert_eq!(lowered[1].opcode(), OpCode::POP_POP);
    }

    #[test]
    fn longer_pattern_wins_over_its_own_prefix() {
        // SWAP2 SWAP1 POP JUMP: a naive scan could instead match the
        // 2-byte SWAP2_SWAP1 prefix and stop there.
        let raw = hex_literal::hex!("91905056");
        let lowered = convert(&raw, true);
        assert_eq!(lowered[0].opcode(), OpCode::SWAP2_SWAP1_POP_JUMP);
        assert_eq!(lowered.len(), 1);
    }

    #[test]
    fn pc_map_roundtrips_instruction_starts() {
        let raw = hex_literal::hex!("60015b00");
        let (_lowered, map) = convert_with_pc_map(&raw);
        for p in [0usize, 2, 3, raw.len()] {
            let q = map.raw_to_lowered[p] as usize;
            assert_eq!(map.lowered_to_raw[q] as usize, p);
        }
    }
}
