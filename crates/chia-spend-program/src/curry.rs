use crate::Program;

const OP_QUOTE: u8 = 1;
const OP_APPLY: u8 = 2;
const OP_CONS: u8 = 4;

impl Program {
    /// Binds the leading arguments of this program, producing
    /// `(a (q . self) (c (q . arg1) (c (q . arg2) ... 1)))`.
    ///
    /// The curried program evaluates `self` with the bound arguments
    /// followed by whatever solution it is later run with.
    pub fn curry<I>(&self, args: I) -> Program
    where
        I: IntoIterator<Item = Program>,
        I::IntoIter: DoubleEndedIterator,
    {
        let environment = args.into_iter().rev().fold(
            Program::from_u64(1),
            |rest, arg| Program::list([op(OP_CONS), quote(arg), rest]),
        );

        Program::list([op(OP_APPLY), quote(self.clone()), environment])
    }

    /// Reverses [`Program::curry`], returning the inner program and its bound
    /// arguments, or `None` if the value isn't in curried form.
    pub fn uncurry(&self) -> Option<(Program, Vec<Program>)> {
        let [apply, quoted, mut environment] = fixed_list(self)?;

        if apply.as_atom()? != [OP_APPLY] {
            return None;
        }

        let program = unquote(&quoted)?;
        let mut args = Vec::new();

        loop {
            if environment.as_atom() == Some([OP_QUOTE].as_slice()) {
                return Some((program, args));
            }

            let [cons, arg, rest] = fixed_list(&environment)?;
            if cons.as_atom()? != [OP_CONS] {
                return None;
            }

            args.push(unquote(&arg)?);
            environment = rest;
        }
    }
}

fn op(code: u8) -> Program {
    Program::atom([code])
}

fn quote(value: Program) -> Program {
    Program::pair(op(OP_QUOTE), value)
}

fn unquote(value: &Program) -> Option<Program> {
    let (q, inner) = value.as_pair()?;
    (q.as_atom()? == [OP_QUOTE]).then(|| inner.clone())
}

fn fixed_list<const N: usize>(value: &Program) -> Option<[Program; N]> {
    value.as_list()?.try_into().ok()
}
