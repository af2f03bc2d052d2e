use chia_protocol::Bytes32;
use clvm_utils::{tree_hash_atom, tree_hash_pair, TreeHash};

use crate::Program;

enum HashOp<'a> {
    Visit(&'a Program),
    Cons,
}

impl Program {
    /// The CLVM tree hash, which is also the puzzle hash when the program is a puzzle.
    pub fn tree_hash(&self) -> TreeHash {
        let mut hashes = Vec::new();
        let mut ops = vec![HashOp::Visit(self)];

        while let Some(op) = ops.pop() {
            match op {
                HashOp::Visit(Program::Atom(bytes)) => hashes.push(tree_hash_atom(bytes)),
                HashOp::Visit(Program::Pair(first, rest)) => {
                    ops.push(HashOp::Cons);
                    ops.push(HashOp::Visit(first));
                    ops.push(HashOp::Visit(rest));
                }
                HashOp::Cons => {
                    let (Some(first), Some(rest)) = (hashes.pop(), hashes.pop()) else {
                        unreachable!("every cons is preceded by two visits");
                    };
                    hashes.push(tree_hash_pair(first, rest));
                }
            }
        }

        hashes
            .pop()
            .unwrap_or_else(|| unreachable!("the root is always visited"))
    }

    pub fn hash(&self) -> Bytes32 {
        self.tree_hash().into()
    }
}

#[cfg(test)]
mod tests {
    use chia_puzzles::{P2_DELEGATED_CONDITIONS, P2_DELEGATED_CONDITIONS_HASH};
    use clvm_utils::tree_hash_from_bytes;
    use hex_literal::hex;

    use super::*;

    #[test]
    fn test_nil_hash() {
        assert_eq!(
            Program::nil().hash(),
            Bytes32::new(hex!(
                "4bf5122f344554c53bde2ebb8cd2b7e3d1600ad631c385a5d7cce23c7785459a"
            ))
        );
    }

    #[test]
    fn test_puzzle_hash() -> anyhow::Result<()> {
        let program = Program::deserialize(&P2_DELEGATED_CONDITIONS)?;
        assert_eq!(program.hash(), Bytes32::new(P2_DELEGATED_CONDITIONS_HASH));
        Ok(())
    }

    #[test]
    fn test_matches_serialized_hash() -> anyhow::Result<()> {
        let program = Program::list([
            Program::list([
                Program::from_u64(51),
                Program::atom([7; 32]),
                Program::from_u64(999_950_000),
            ]),
            Program::pair(Program::from_u64(1), Program::atom(b"memo".to_vec())),
        ]);
        let expected = tree_hash_from_bytes(&program.serialize())?;
        assert_eq!(program.tree_hash(), expected);
        Ok(())
    }

    #[test]
    fn test_long_list_hash() {
        let program = Program::list((0..5_000).map(Program::from_u64).collect::<Vec<_>>());
        assert_eq!(
            program.tree_hash(),
            tree_hash_from_bytes(&program.serialize()).unwrap()
        );
    }
}
