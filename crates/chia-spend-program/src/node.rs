use clvm_traits::{FromClvm, FromClvmError, ToClvm, ToClvmError};
use clvmr::{reduction::EvalErr, Allocator, NodePtr, SExp};

use crate::Program;

enum BuildOp<'a> {
    Visit(&'a Program),
    Cons,
}

enum ReadOp {
    Visit(NodePtr),
    Cons,
}

impl Program {
    /// Copies the program into an allocator so it can be run or decoded
    /// with the `clvmr` tooling.
    pub fn to_node(&self, allocator: &mut Allocator) -> Result<NodePtr, EvalErr> {
        let mut nodes = Vec::new();
        let mut ops = vec![BuildOp::Visit(self)];

        while let Some(op) = ops.pop() {
            match op {
                BuildOp::Visit(Program::Atom(bytes)) => nodes.push(allocator.new_atom(bytes)?),
                BuildOp::Visit(Program::Pair(first, rest)) => {
                    ops.push(BuildOp::Cons);
                    ops.push(BuildOp::Visit(first));
                    ops.push(BuildOp::Visit(rest));
                }
                BuildOp::Cons => {
                    let (Some(first), Some(rest)) = (nodes.pop(), nodes.pop()) else {
                        unreachable!("every cons is preceded by two visits");
                    };
                    nodes.push(allocator.new_pair(first, rest)?);
                }
            }
        }

        Ok(nodes
            .pop()
            .unwrap_or_else(|| unreachable!("the root is always visited")))
    }

    pub fn from_node(allocator: &Allocator, node: NodePtr) -> Self {
        let mut values = Vec::new();
        let mut ops = vec![ReadOp::Visit(node)];

        while let Some(op) = ops.pop() {
            match op {
                ReadOp::Visit(node) => match allocator.sexp(node) {
                    SExp::Atom => values.push(Program::atom(allocator.atom(node).as_ref())),
                    SExp::Pair(first, rest) => {
                        ops.push(ReadOp::Cons);
                        ops.push(ReadOp::Visit(first));
                        ops.push(ReadOp::Visit(rest));
                    }
                },
                ReadOp::Cons => {
                    let (Some(first), Some(rest)) = (values.pop(), values.pop()) else {
                        unreachable!("every cons is preceded by two visits");
                    };
                    values.push(Program::pair(first, rest));
                }
            }
        }

        values
            .pop()
            .unwrap_or_else(|| unreachable!("the root is always visited"))
    }
}

impl ToClvm<Allocator> for Program {
    fn to_clvm(&self, encoder: &mut Allocator) -> Result<NodePtr, ToClvmError> {
        self.to_node(encoder)
            .map_err(|error| ToClvmError::Custom(error.to_string()))
    }
}

impl FromClvm<Allocator> for Program {
    fn from_clvm(decoder: &Allocator, node: NodePtr) -> Result<Self, FromClvmError> {
        Ok(Self::from_node(decoder, node))
    }
}
