use crate::{DecodeError, Program, ProgramError};

const MAX_SINGLE_BYTE: u8 = 0x7f;
const CONS_BOX_MARKER: u8 = 0xff;
const BACK_REFERENCE: u8 = 0xfe;
const NIL_MARKER: u8 = 0x80;

impl Program {
    /// Serializes the program in the canonical CLVM binary format.
    pub fn serialize(&self) -> Vec<u8> {
        let mut output = Vec::new();
        encode_node(self, &mut output);
        output
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.serialize())
    }

    /// Deserializes a program, rejecting truncated input, trailing bytes and
    /// back references.
    pub fn deserialize(bytes: &[u8]) -> Result<Self, ProgramError> {
        let mut cursor = Cursor { bytes, position: 0 };
        let program = decode_node(&mut cursor)?;

        let remaining = bytes.len() - cursor.position;
        if remaining > 0 {
            return Err(DecodeError::TrailingBytes(remaining).into());
        }

        Ok(program)
    }

    /// Deserializes a program from hex, with or without a `0x` prefix.
    pub fn from_hex(text: &str) -> Result<Self, ProgramError> {
        let text = text.trim();
        let text = text
            .strip_prefix("0x")
            .or_else(|| text.strip_prefix("0X"))
            .unwrap_or(text);
        let bytes = hex::decode(text).map_err(|_| DecodeError::InvalidHex)?;
        Self::deserialize(&bytes)
    }
}

impl From<&Program> for chia_protocol::Program {
    fn from(value: &Program) -> Self {
        Self::from(value.serialize())
    }
}

impl From<Program> for chia_protocol::Program {
    fn from(value: Program) -> Self {
        Self::from(&value)
    }
}

impl TryFrom<&chia_protocol::Program> for Program {
    type Error = ProgramError;

    fn try_from(value: &chia_protocol::Program) -> Result<Self, Self::Error> {
        Self::deserialize(value.as_ref())
    }
}

fn encode_node(program: &Program, output: &mut Vec<u8>) {
    let mut pending = vec![program];

    while let Some(node) = pending.pop() {
        match node {
            Program::Pair(first, rest) => {
                output.push(CONS_BOX_MARKER);
                pending.push(rest);
                pending.push(first);
            }
            Program::Atom(bytes) => encode_atom(bytes, output),
        }
    }
}

fn encode_atom(bytes: &[u8], output: &mut Vec<u8>) {
    let len = bytes.len() as u64;

    match bytes {
        [] => output.push(NIL_MARKER),
        [byte] if *byte <= MAX_SINGLE_BYTE => output.push(*byte),
        _ => {
            if len < 0x40 {
                output.push(0x80 | len as u8);
            } else if len < 0x2000 {
                output.extend([0xc0 | (len >> 8) as u8, len as u8]);
            } else if len < 0x10_0000 {
                output.extend([0xe0 | (len >> 16) as u8, (len >> 8) as u8, len as u8]);
            } else if len < 0x800_0000 {
                output.extend([
                    0xf0 | (len >> 24) as u8,
                    (len >> 16) as u8,
                    (len >> 8) as u8,
                    len as u8,
                ]);
            } else {
                output.extend([
                    0xf8 | (len >> 32) as u8,
                    (len >> 24) as u8,
                    (len >> 16) as u8,
                    (len >> 8) as u8,
                    len as u8,
                ]);
            }
            output.extend_from_slice(bytes);
        }
    }
}

struct Cursor<'a> {
    bytes: &'a [u8],
    position: usize,
}

impl Cursor<'_> {
    fn next_byte(&mut self) -> Result<u8, DecodeError> {
        let byte = *self
            .bytes
            .get(self.position)
            .ok_or(DecodeError::UnexpectedEnd)?;
        self.position += 1;
        Ok(byte)
    }

    fn take(&mut self, len: usize) -> Result<&[u8], DecodeError> {
        let end = self
            .position
            .checked_add(len)
            .filter(|end| *end <= self.bytes.len())
            .ok_or(DecodeError::UnexpectedEnd)?;
        let slice = &self.bytes[self.position..end];
        self.position = end;
        Ok(slice)
    }
}

enum DecodeOp {
    Read,
    Cons,
}

fn decode_node(cursor: &mut Cursor<'_>) -> Result<Program, DecodeError> {
    let mut ops = vec![DecodeOp::Read];
    let mut values = Vec::new();

    while let Some(op) = ops.pop() {
        match op {
            DecodeOp::Read => match cursor.next_byte()? {
                CONS_BOX_MARKER => ops.extend([DecodeOp::Cons, DecodeOp::Read, DecodeOp::Read]),
                BACK_REFERENCE => return Err(DecodeError::BackReference),
                byte => values.push(decode_atom(byte, cursor)?),
            },
            DecodeOp::Cons => {
                let (Some(rest), Some(first)) = (values.pop(), values.pop()) else {
                    unreachable!("every cons is preceded by two reads");
                };
                values.push(Program::pair(first, rest));
            }
        }
    }

    Ok(values
        .pop()
        .unwrap_or_else(|| unreachable!("the root is always read")))
}

fn decode_atom(prefix: u8, cursor: &mut Cursor<'_>) -> Result<Program, DecodeError> {
    if prefix == NIL_MARKER {
        return Ok(Program::nil());
    }

    if prefix <= MAX_SINGLE_BYTE {
        return Ok(Program::atom([prefix]));
    }

    let prefix_len = prefix.leading_ones() as usize;
    if prefix_len > 5 {
        return Err(DecodeError::InvalidLengthPrefix(prefix));
    }

    let mut len = u64::from(prefix & (0xff >> (prefix_len + 1)));
    for &byte in cursor.take(prefix_len - 1)? {
        len = (len << 8) | u64::from(byte);
    }

    let len = usize::try_from(len).map_err(|_| DecodeError::UnexpectedEnd)?;
    Ok(Program::atom(cursor.take(len)?))
}

#[cfg(test)]
mod tests {
    use chia_puzzles::P2_DELEGATED_CONDITIONS;
    use clvmr::{
        serde::{node_from_bytes, node_to_bytes},
        Allocator,
    };
    use hex_literal::hex;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(Program::nil(), "80")]
    #[case(Program::atom([0x00]), "00")]
    #[case(Program::atom([0x7f]), "7f")]
    #[case(Program::atom([0x80]), "8180")]
    #[case(Program::from_u64(1000), "8203e8")]
    #[case(Program::pair(Program::from_u64(1), Program::from_u64(2)), "ff0102")]
    #[case(Program::list([Program::from_u64(51), Program::nil()]), "ff33ff8080")]
    #[case(Program::atom(vec![0xab; 64]), &format!("c040{}", "ab".repeat(64)))]
    fn test_serialize(#[case] program: Program, #[case] expected: &str) {
        assert_eq!(program.to_hex(), expected);
        assert_eq!(Program::from_hex(expected).unwrap(), program);
    }

    #[test]
    fn test_matches_clvmr() -> anyhow::Result<()> {
        let program = Program::deserialize(&P2_DELEGATED_CONDITIONS)?;
        assert_eq!(program.serialize(), P2_DELEGATED_CONDITIONS.to_vec());

        let mut allocator = Allocator::new();
        let ptr = node_from_bytes(&mut allocator, &P2_DELEGATED_CONDITIONS)?;
        assert_eq!(node_to_bytes(&allocator, ptr)?, program.serialize());

        Ok(())
    }

    #[test]
    fn test_large_atom_prefixes() {
        for len in [0x3f, 0x40, 0x1fff, 0x2000, 0x10_0000] {
            let program = Program::atom(vec![0x42; len]);
            let bytes = program.serialize();
            assert_eq!(Program::deserialize(&bytes), Ok(program));
        }
    }

    #[test]
    fn test_long_list_round_trip() {
        let program = Program::list((0..1_000_000).map(Program::from_u64).collect::<Vec<_>>());
        let bytes = program.serialize();
        assert_eq!(bytes.len(), 4_966_977);
        assert_eq!(Program::deserialize(&bytes), Ok(program));
    }

    #[test]
    fn test_deeply_nested_round_trip() -> anyhow::Result<()> {
        let depth = 200_000;
        let mut bytes = vec![CONS_BOX_MARKER; depth];
        bytes.extend(vec![NIL_MARKER; depth + 1]);

        let program = Program::deserialize(&bytes)?;
        assert_eq!(program.serialize(), bytes);

        let mut allocator = Allocator::new();
        let ptr = node_from_bytes(&mut allocator, &bytes)?;
        assert_eq!(node_to_bytes(&allocator, ptr)?, program.serialize());

        Ok(())
    }

    #[rstest]
    #[case(&[], DecodeError::UnexpectedEnd)]
    #[case(&hex!("ff01"), DecodeError::UnexpectedEnd)]
    #[case(&hex!("8401"), DecodeError::UnexpectedEnd)]
    #[case(&hex!("c0"), DecodeError::UnexpectedEnd)]
    #[case(&hex!("ff01fe01"), DecodeError::BackReference)]
    #[case(&hex!("fc"), DecodeError::InvalidLengthPrefix(0xfc))]
    #[case(&hex!("0102"), DecodeError::TrailingBytes(1))]
    fn test_decode_errors(#[case] bytes: &[u8], #[case] expected: DecodeError) {
        assert_eq!(
            Program::deserialize(bytes),
            Err(ProgramError::Decode(expected))
        );
    }

    #[test]
    fn test_invalid_hex() {
        assert_eq!(
            Program::from_hex("0xzz"),
            Err(ProgramError::Decode(DecodeError::InvalidHex))
        );
    }

    #[test]
    fn test_protocol_program_conversion() -> anyhow::Result<()> {
        let program = Program::list([Program::from_u64(51), Program::atom([1; 32])]);
        let protocol: chia_protocol::Program = (&program).into();
        assert_eq!(Program::try_from(&protocol)?, program);
        Ok(())
    }
}
