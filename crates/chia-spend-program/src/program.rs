use std::{
    fmt,
    hash::{Hash, Hasher},
    mem,
    sync::Arc,
};

use chia_bls::PublicKey;
use chia_protocol::{Bytes, Bytes32};
use num_bigint::BigInt;
use once_cell::sync::Lazy;

/// Stands in for children that are being unlinked while a tree is dropped.
static DETACHED: Lazy<Arc<Program>> = Lazy::new(|| Arc::new(Program::nil()));

/// An immutable CLVM value: either an atom of bytes or a pair of two values.
///
/// Child nodes are reference counted, so cloning a [`Program`] or embedding it
/// inside a larger tree (for example when currying) shares the existing nodes
/// rather than copying them.
///
/// Comparison, hashing, serialization, formatting and dropping all walk the
/// tree with an explicit stack, so arbitrarily deep or long values are safe.
#[derive(Clone)]
pub enum Program {
    Atom(Arc<[u8]>),
    Pair(Arc<Program>, Arc<Program>),
}

impl Default for Program {
    fn default() -> Self {
        Self::nil()
    }
}

impl Program {
    /// The empty atom, which doubles as the list terminator and as `0`.
    pub fn nil() -> Self {
        Self::Atom(Arc::from(Vec::new()))
    }

    pub fn atom(bytes: impl Into<Vec<u8>>) -> Self {
        Self::Atom(Arc::from(bytes.into()))
    }

    pub fn pair(first: Program, rest: Program) -> Self {
        Self::Pair(Arc::new(first), Arc::new(rest))
    }

    /// Builds a proper list terminated by nil.
    pub fn list<I>(items: I) -> Self
    where
        I: IntoIterator<Item = Program>,
        I::IntoIter: DoubleEndedIterator,
    {
        items
            .into_iter()
            .rev()
            .fold(Self::nil(), |rest, item| Self::pair(item, rest))
    }

    /// Encodes an unsigned integer as a minimal two's complement atom.
    pub fn from_u64(value: u64) -> Self {
        Self::atom(u64_to_bytes(value))
    }

    /// Encodes an arbitrary signed integer as a minimal two's complement atom.
    pub fn from_int(value: &BigInt) -> Self {
        Self::atom(bigint_to_bytes(value))
    }

    pub fn is_atom(&self) -> bool {
        matches!(self, Self::Atom(_))
    }

    pub fn is_pair(&self) -> bool {
        matches!(self, Self::Pair(..))
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Self::Atom(bytes) if bytes.is_empty())
    }

    pub fn as_atom(&self) -> Option<&[u8]> {
        match self {
            Self::Atom(bytes) => Some(bytes),
            Self::Pair(..) => None,
        }
    }

    pub fn as_pair(&self) -> Option<(&Program, &Program)> {
        match self {
            Self::Atom(_) => None,
            Self::Pair(first, rest) => Some((first.as_ref(), rest.as_ref())),
        }
    }

    pub fn first(&self) -> Option<&Program> {
        self.as_pair().map(|(first, _)| first)
    }

    pub fn rest(&self) -> Option<&Program> {
        self.as_pair().map(|(_, rest)| rest)
    }

    /// Collects the items of a proper list. Returns `None` if the list is
    /// improper, or if the value is a non-nil atom.
    pub fn as_list(&self) -> Option<Vec<Program>> {
        let mut items = Vec::new();
        let mut current = self;

        loop {
            match current {
                Self::Pair(first, rest) => {
                    items.push(first.as_ref().clone());
                    current = rest;
                }
                Self::Atom(bytes) if bytes.is_empty() => return Some(items),
                Self::Atom(_) => return None,
            }
        }
    }

    /// Decodes the atom as an unsigned integer, if it fits in a `u64`.
    pub fn as_u64(&self) -> Option<u64> {
        let bytes = self.as_atom()?;

        if bytes.first().is_some_and(|byte| byte & 0x80 != 0) {
            return None;
        }

        let bytes = match bytes.iter().position(|&byte| byte != 0) {
            Some(start) => &bytes[start..],
            None => return Some(0),
        };

        if bytes.len() > 8 {
            return None;
        }

        let mut buf = [0; 8];
        buf[8 - bytes.len()..].copy_from_slice(bytes);
        Some(u64::from_be_bytes(buf))
    }

    pub fn as_bytes32(&self) -> Option<Bytes32> {
        let bytes: [u8; 32] = self.as_atom()?.try_into().ok()?;
        Some(Bytes32::new(bytes))
    }

    pub fn as_public_key(&self) -> Option<PublicKey> {
        let bytes: [u8; 48] = self.as_atom()?.try_into().ok()?;
        PublicKey::from_bytes(&bytes).ok()
    }
}

impl From<Bytes32> for Program {
    fn from(value: Bytes32) -> Self {
        Self::atom(value.to_vec())
    }
}

impl From<&Bytes> for Program {
    fn from(value: &Bytes) -> Self {
        Self::atom(value.to_vec())
    }
}

impl From<PublicKey> for Program {
    fn from(value: PublicKey) -> Self {
        Self::atom(value.to_bytes().to_vec())
    }
}

impl From<u64> for Program {
    fn from(value: u64) -> Self {
        Self::from_u64(value)
    }
}

impl PartialEq for Program {
    fn eq(&self, other: &Self) -> bool {
        let mut pending = vec![(self, other)];

        while let Some((left, right)) = pending.pop() {
            match (left, right) {
                (Self::Atom(left), Self::Atom(right)) => {
                    if left != right {
                        return false;
                    }
                }
                (Self::Pair(left_first, left_rest), Self::Pair(right_first, right_rest)) => {
                    if !Arc::ptr_eq(left_rest, right_rest) {
                        pending.push((left_rest.as_ref(), right_rest.as_ref()));
                    }
                    if !Arc::ptr_eq(left_first, right_first) {
                        pending.push((left_first.as_ref(), right_first.as_ref()));
                    }
                }
                _ => return false,
            }
        }

        true
    }
}

impl Eq for Program {}

impl Hash for Program {
    fn hash<H: Hasher>(&self, state: &mut H) {
        let mut pending = vec![self];

        while let Some(program) = pending.pop() {
            match program {
                Self::Atom(bytes) => {
                    state.write_u8(0);
                    bytes.hash(state);
                }
                Self::Pair(first, rest) => {
                    state.write_u8(1);
                    pending.push(rest);
                    pending.push(first);
                }
            }
        }
    }
}

impl Drop for Program {
    fn drop(&mut self) {
        let Self::Pair(first, rest) = self else {
            return;
        };

        if Arc::ptr_eq(first, &*DETACHED) && Arc::ptr_eq(rest, &*DETACHED) {
            return;
        }

        let mut pending = vec![detach(first), detach(rest)];

        // Children shared with another tree are only released, never walked.
        while let Some(node) = pending.pop() {
            if let Some(mut program) = Arc::into_inner(node) {
                if let Self::Pair(first, rest) = &mut program {
                    pending.push(detach(first));
                    pending.push(detach(rest));
                }
            }
        }
    }
}

fn detach(child: &mut Arc<Program>) -> Arc<Program> {
    mem::replace(child, Arc::clone(&DETACHED))
}

impl fmt::Debug for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Program({self})")
    }
}

enum Piece<'a> {
    Node(&'a Program),
    Text(&'static str),
}

/// Renders the value in CLVM assembly. Canonical integers up to eight bytes
/// are written in decimal and every other atom in `0x` hex, so that reading
/// the output back yields an identical tree.
impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut pieces = vec![Piece::Node(self)];

        while let Some(piece) = pieces.pop() {
            match piece {
                Piece::Text(text) => f.write_str(text)?,
                Piece::Node(Self::Atom(bytes)) => fmt_atom(f, bytes)?,
                Piece::Node(Self::Pair(first, rest)) => {
                    let mut items = vec![first.as_ref()];
                    let mut tail = rest.as_ref();
                    while let Self::Pair(first, rest) = tail {
                        items.push(first.as_ref());
                        tail = rest.as_ref();
                    }

                    pieces.push(Piece::Text(")"));
                    if !tail.is_nil() {
                        pieces.push(Piece::Node(tail));
                        pieces.push(Piece::Text(" . "));
                    }
                    for (index, item) in items.into_iter().enumerate().rev() {
                        pieces.push(Piece::Node(item));
                        if index > 0 {
                            pieces.push(Piece::Text(" "));
                        }
                    }

                    f.write_str("(")?;
                }
            }
        }

        Ok(())
    }
}

fn fmt_atom(f: &mut fmt::Formatter<'_>, bytes: &[u8]) -> fmt::Result {
    if bytes.is_empty() {
        write!(f, "()")
    } else if bytes.len() <= 8 && is_canonical_int(bytes) {
        write!(f, "{}", BigInt::from_signed_bytes_be(bytes))
    } else {
        write!(f, "0x{}", hex::encode(bytes))
    }
}

/// Whether the bytes are the minimal two's complement encoding of a nonzero integer.
fn is_canonical_int(bytes: &[u8]) -> bool {
    match bytes {
        [] | [0x00] => false,
        [0x00, next, ..] => next & 0x80 != 0,
        [0xff, next, ..] => next & 0x80 == 0,
        _ => true,
    }
}

/// Encodes an unsigned amount the way CLVM expects it, with leading zeros
/// removed but keeping the sign bit clear.
pub fn u64_to_bytes(amount: u64) -> Vec<u8> {
    let bytes = amount.to_be_bytes();
    let start = bytes
        .iter()
        .position(|&byte| byte != 0)
        .unwrap_or(bytes.len());

    let mut output = Vec::with_capacity(9);
    if bytes[start..].first().is_some_and(|&byte| byte & 0x80 != 0) {
        output.push(0);
    }
    output.extend_from_slice(&bytes[start..]);
    output
}

fn bigint_to_bytes(value: &BigInt) -> Vec<u8> {
    if value.sign() == num_bigint::Sign::NoSign {
        Vec::new()
    } else {
        value.to_signed_bytes_be()
    }
}
