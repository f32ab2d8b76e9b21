//! Pretty-print helpers for instructions, blocks and functions.
//!
//! Rendering is close to LLVM's textual IR. The module is optional; without
//! it types print as raw identifiers and callees as UUIDs.
use crate::{
    modules::{BasicBlock, Function, Module, instructions::Instr, operand::Operand},
    types::Typeref,
};

struct TyFmt<'a> {
    ty: Typeref,
    module: Option<&'a Module>,
}

impl std::fmt::Display for TyFmt<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.module {
            Some(module) => write!(f, "{}", module.types.fmt(self.ty)),
            None => write!(f, "!{}", self.ty.uuid()),
        }
    }
}

fn ty(ty: Typeref, module: Option<&Module>) -> TyFmt<'_> {
    TyFmt { ty, module }
}

fn write_list(
    f: &mut std::fmt::Formatter<'_>,
    operands: &[Operand],
    module: Option<&Module>,
) -> std::fmt::Result {
    for (i, op) in operands.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", op.fmt(module))?;
    }
    Ok(())
}

impl Instr {
    /// Build a formatting helper that renders the instruction.
    pub fn fmt<'a>(&'a self, module: Option<&'a Module>) -> impl std::fmt::Display + 'a {
        struct Fmt<'a> {
            instr: &'a Instr,
            module: Option<&'a Module>,
        }

        impl std::fmt::Display for Fmt<'_> {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                let module = self.module;
                match self.instr {
                    Instr::IBinary(bin) => write!(
                        f,
                        "{} = {} {} {}, {}",
                        bin.dest,
                        bin.variant.to_str(),
                        ty(bin.ty, module),
                        bin.lhs.fmt(module),
                        bin.rhs.fmt(module)
                    ),
                    Instr::ICmp(cmp) => write!(
                        f,
                        "{} = icmp {} {}, {}",
                        cmp.dest,
                        cmp.variant.to_str(),
                        cmp.lhs.fmt(module),
                        cmp.rhs.fmt(module)
                    ),
                    Instr::MLoad(load) => {
                        write!(f, "{} = load ", load.dest)?;
                        if load.volatile {
                            write!(f, "volatile ")?;
                        }
                        write!(f, "{}, {}", ty(load.ty, module), load.addr.fmt(module))?;
                        if let Some(ordering) = &load.ordering {
                            write!(f, ", atomic {}", ordering.to_str())?;
                        }
                        if let Some(alignment) = load.alignment {
                            write!(f, ", align {}", alignment)?;
                        }
                        Ok(())
                    }
                    Instr::MStore(store) => {
                        write!(f, "store ")?;
                        if store.volatile {
                            write!(f, "volatile ")?;
                        }
                        write!(f, "{}, {}", store.value.fmt(module), store.addr.fmt(module))?;
                        if let Some(ordering) = &store.ordering {
                            write!(f, ", atomic {}", ordering.to_str())?;
                        }
                        if let Some(alignment) = store.alignment {
                            write!(f, ", align {}", alignment)?;
                        }
                        Ok(())
                    }
                    Instr::MAlloca(alloca) => write!(
                        f,
                        "{} = alloca {}, {}, align {}",
                        alloca.dest,
                        ty(alloca.allocated, module),
                        alloca.count.fmt(module),
                        alloca.alignment
                    ),
                    Instr::MGetElementPtr(gep) => {
                        write!(
                            f,
                            "{} = getelementptr {}{}, {}",
                            gep.dest,
                            if gep.in_bounds { "inbounds " } else { "" },
                            ty(gep.source_ty, module),
                            gep.base.fmt(module)
                        )?;
                        for index in &gep.indices {
                            write!(f, ", {}", index.fmt(module))?;
                        }
                        Ok(())
                    }
                    Instr::Invoke(call) => {
                        if let Some(dest) = call.dest {
                            write!(f, "{} = ", dest)?;
                        }
                        write!(f, "call ")?;
                        match call.ty {
                            Some(ret) => write!(f, "{} ", ty(ret, module))?,
                            None => write!(f, "void ")?,
                        }
                        write!(f, "{}(", call.function.fmt(module))?;
                        write_list(f, &call.args, module)?;
                        write!(f, ")")?;
                        for name in call.attributes.function.names() {
                            write!(f, " {}", name)?;
                        }
                        Ok(())
                    }
                    Instr::Phi(phi) => {
                        write!(f, "{} = phi {} ", phi.dest, ty(phi.ty, module))?;
                        for (i, (label, value)) in phi.values.iter().enumerate() {
                            if i > 0 {
                                write!(f, ", ")?;
                            }
                            write!(f, "[ {}, {} ]", value.fmt(module), label)?;
                        }
                        Ok(())
                    }
                    Instr::Select(select) => write!(
                        f,
                        "{} = select {}, {}, {}",
                        select.dest,
                        select.condition.fmt(module),
                        select.true_value.fmt(module),
                        select.false_value.fmt(module)
                    ),
                    Instr::Cast(cast) => write!(
                        f,
                        "{} = {} {} to {}",
                        cast.dest,
                        cast.variant.to_str(),
                        cast.value.fmt(module),
                        ty(cast.ty, module)
                    ),
                }
            }
        }

        Fmt {
            instr: self,
            module,
        }
    }
}

impl BasicBlock {
    pub fn fmt<'a>(&'a self, module: Option<&'a Module>) -> impl std::fmt::Display + 'a {
        struct Fmt<'a> {
            block: &'a BasicBlock,
            module: Option<&'a Module>,
        }

        impl std::fmt::Display for Fmt<'_> {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                writeln!(f, "block_{}:", self.block.label.0)?;
                for instr in &self.block.instructions {
                    writeln!(f, "    {}", instr.fmt(self.module))?;
                }
                writeln!(f, "    {}", self.block.terminator.fmt(self.module))
            }
        }

        Fmt {
            block: self,
            module,
        }
    }
}

impl Function {
    pub fn fmt<'a>(&'a self, module: Option<&'a Module>) -> impl std::fmt::Display + 'a {
        struct Fmt<'a> {
            function: &'a Function,
            module: Option<&'a Module>,
        }

        impl std::fmt::Display for Fmt<'_> {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                let function = self.function;
                let keyword = if function.is_declaration() {
                    "declare"
                } else {
                    "define"
                };
                write!(f, "{} ", keyword)?;
                match function.return_type {
                    Some(ret) => write!(f, "{}", ty(ret, self.module))?,
                    None => write!(f, "void")?,
                }
                write!(f, " @{}(", function.name)?;
                for (i, (name, param_ty)) in function.params.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", name, ty(*param_ty, self.module))?;
                }
                if function.variadic {
                    write!(f, ", ...")?;
                }
                write!(f, ")")?;
                for name in function.attributes.function.names() {
                    write!(f, " {}", name)?;
                }

                if function.is_declaration() {
                    return writeln!(f);
                }

                writeln!(f, " {{")?;
                for block in function.body.values() {
                    write!(f, "{}", block.fmt(self.module))?;
                }
                writeln!(f, "}}")
            }
        }

        Fmt {
            function: self,
            module,
        }
    }
}
