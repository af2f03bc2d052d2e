use clvm_tools_rs::classic::clvm_tools::binutils::assemble;
use clvmr::Allocator;

use crate::{Program, ProgramError};

impl Program {
    /// Parses CLVM assembly such as `(a (q . 1) (c 2 ()))`.
    ///
    /// Integers are read in decimal, `0x` literals as raw bytes, quoted text as
    /// UTF-8 bytes and operator keywords as their opcode.
    pub fn from_source(source: &str) -> Result<Self, ProgramError> {
        let mut allocator = Allocator::new();
        let ptr = assemble(&mut allocator, source).map_err(|error| ProgramError::Parse(error.1))?;
        Ok(Self::from_node(&allocator, ptr))
    }
}
