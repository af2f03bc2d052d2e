use chia_bls::PublicKey;
use chia_protocol::{Bytes32, Coin, CoinSpend};
use chia_puzzles::{P2_DELEGATED_CONDITIONS, P2_DELEGATED_PUZZLE_OR_HIDDEN_PUZZLE};
use chia_spend_program::Program;
use chia_spend_signer::RequiredSignature;
use once_cell::sync::Lazy;

static SIGNATURE_TEMPLATE: Lazy<Program> = Lazy::new(|| {
    Program::deserialize(&P2_DELEGATED_CONDITIONS).expect("embedded puzzle is valid clvm")
});

static STANDARD_TEMPLATE: Lazy<Program> = Lazy::new(|| {
    Program::deserialize(&P2_DELEGATED_PUZZLE_OR_HIDDEN_PUZZLE)
        .expect("embedded puzzle is valid clvm")
});

/// A template curried with a single public key, along with the resulting
/// puzzle hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedPuzzle {
    pub puzzle: Program,
    pub puzzle_hash: Bytes32,
}

pub fn derive_puzzle(template: &Program, public_key: PublicKey) -> DerivedPuzzle {
    let puzzle = template.curry([Program::from(public_key)]);
    let puzzle_hash = puzzle.hash();
    DerivedPuzzle {
        puzzle,
        puzzle_hash,
    }
}

/// A coin that can be spent by anyone holding the secret key, who signs the
/// conditions the spend outputs.
///
/// The solution is the list of conditions wrapped in a one element list, and
/// the puzzle asserts `AGG_SIG_ME` over the tree hash of those conditions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignaturePuzzle {
    public_key: PublicKey,
    derived: DerivedPuzzle,
}

impl SignaturePuzzle {
    pub fn new(public_key: PublicKey) -> Self {
        Self {
            public_key,
            derived: derive_puzzle(&SIGNATURE_TEMPLATE, public_key),
        }
    }

    pub fn template() -> &'static Program {
        &SIGNATURE_TEMPLATE
    }

    pub fn public_key(&self) -> PublicKey {
        self.public_key
    }

    pub fn puzzle(&self) -> &Program {
        &self.derived.puzzle
    }

    pub fn puzzle_hash(&self) -> Bytes32 {
        self.derived.puzzle_hash
    }

    pub fn solution(conditions: &Program) -> Program {
        Program::list([conditions.clone()])
    }

    pub fn spend(&self, coin: Coin, conditions: &Program) -> CoinSpend {
        CoinSpend::new(
            coin,
            self.puzzle().into(),
            Self::solution(conditions).into(),
        )
    }

    pub fn required_signature(
        &self,
        coin: &Coin,
        conditions: &Program,
        genesis_challenge: Bytes32,
    ) -> RequiredSignature {
        RequiredSignature::for_conditions(coin, self.public_key, conditions, genesis_challenge)
    }
}

/// The standard wallet puzzle, curried with a synthetic key.
///
/// Spent through its delegated puzzle path with `(q . conditions)`, so the
/// signed message commits to the hash of the quoted conditions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StandardPuzzle {
    synthetic_key: PublicKey,
    derived: DerivedPuzzle,
}

impl StandardPuzzle {
    pub fn new(synthetic_key: PublicKey) -> Self {
        Self {
            synthetic_key,
            derived: derive_puzzle(&STANDARD_TEMPLATE, synthetic_key),
        }
    }

    pub fn puzzle_hash_for(synthetic_key: PublicKey) -> Bytes32 {
        Self::new(synthetic_key).puzzle_hash()
    }

    pub fn synthetic_key(&self) -> PublicKey {
        self.synthetic_key
    }

    pub fn puzzle(&self) -> &Program {
        &self.derived.puzzle
    }

    pub fn puzzle_hash(&self) -> Bytes32 {
        self.derived.puzzle_hash
    }

    /// `(() (q . conditions) ())`
    pub fn solution(conditions: &Program) -> Program {
        Program::list([
            Program::nil(),
            Self::delegated_puzzle(conditions),
            Program::nil(),
        ])
    }

    pub fn spend(&self, coin: Coin, conditions: &Program) -> CoinSpend {
        CoinSpend::new(
            coin,
            self.puzzle().into(),
            Self::solution(conditions).into(),
        )
    }

    pub fn required_signature(
        &self,
        coin: &Coin,
        conditions: &Program,
        genesis_challenge: Bytes32,
    ) -> RequiredSignature {
        RequiredSignature::for_conditions(
            coin,
            self.synthetic_key,
            &Self::delegated_puzzle(conditions),
            genesis_challenge,
        )
    }

    fn delegated_puzzle(conditions: &Program) -> Program {
        Program::pair(Program::from_u64(1), conditions.clone())
    }
}
