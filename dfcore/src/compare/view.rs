//! Read-only view of one side of a comparison.
use std::collections::HashMap;

use dfinstr::{
    consts::AnyConst,
    modules::{
        BasicBlock, Function, Instruction, Module,
        instructions::Instr,
        mem::MGetElementPtr,
        misc::{CastVariant, Invoke},
        operand::{Label, Name, Operand},
        operation::Operation,
        symbol::FunctionPointer,
    },
    types::{
        AnyType, Typeref,
        aggregate::StructType,
        primary::{LblType, PrimaryType, PtrType},
    },
};

/// A function together with the module that owns its types and layout, and
/// an index of where each name is defined.
#[derive(Debug)]
pub struct FunctionView<'a> {
    pub module: &'a Module,
    pub function: &'a Function,
    params: HashMap<Name, Typeref>,
    definitions: HashMap<Name, (Label, usize)>,
}

impl<'a> FunctionView<'a> {
    pub fn new(module: &'a Module, function: &'a Function) -> Self {
        let params = function.params.iter().copied().collect();
        let mut definitions = HashMap::new();
        for (label, bb) in &function.body {
            for (index, instr) in bb.instructions.iter().enumerate() {
                if let Some(dest) = instr.destination() {
                    definitions.insert(dest, (*label, index));
                }
            }
        }

        Self {
            module,
            function,
            params,
            definitions,
        }
    }

    pub fn block(&self, label: Label) -> Option<&'a BasicBlock> {
        self.function.body.get(&label)
    }

    /// Instruction defining `name`; `None` for parameters.
    pub fn definition(&self, name: Name) -> Option<&'a Instr> {
        let (label, index) = self.definitions.get(&name)?;
        self.block(*label)?.instructions.get(*index)
    }

    /// Operation following position `index` of block `label`.
    pub fn operation_after(&self, label: Label, index: usize) -> Option<Operation<'a>> {
        self.block(label)?.operation(index + 1)
    }

    /// Input of the cast producing `operand`.
    pub fn cast_source(&self, operand: &Operand) -> Option<&'a Operand> {
        match operand {
            Operand::Reg(name) => match self.definition(*name)? {
                Instr::Cast(cast) => Some(&cast.value),
                _ => None,
            },
            _ => None,
        }
    }

    /// Type of an operand. Constants, labels and functions get their type
    /// interned on demand.
    pub fn type_of(&self, operand: &Operand) -> Option<Typeref> {
        match operand {
            Operand::Reg(name) => match self.params.get(name) {
                Some(ty) => Some(*ty),
                None => self.definition(*name)?.destination_type(),
            },
            Operand::Imm(AnyConst::Int(iconst)) => Some(self.module.intern(iconst.ty)),
            Operand::Imm(AnyConst::Null { addr_space }) => Some(self.module.intern(PtrType {
                pointee: None,
                addr_space: *addr_space,
            })),
            Operand::Lbl(_) => Some(self.module.intern(LblType)),
            Operand::Func(_) => Some(self.module.intern(PtrType::OPAQUE)),
        }
    }

    pub fn resolve(&self, ty: Typeref) -> Option<AnyType> {
        self.module.types.resolve(ty)
    }

    pub fn struct_type(&self, ty: Typeref) -> Option<StructType> {
        self.resolve(ty)?.try_as_struct()
    }

    fn pointer(&self, ty: Typeref) -> Option<PtrType> {
        match self.resolve(ty)? {
            AnyType::Primary(PrimaryType::Ptr(ptr)) => Some(ptr),
            _ => None,
        }
    }

    pub fn addr_space(&self, ty: Typeref) -> Option<u32> {
        self.pointer(ty).map(|ptr| ptr.addr_space)
    }

    /// Structure `ty` points to.
    pub fn pointee_struct(&self, ty: Typeref) -> Option<(Typeref, StructType)> {
        let pointee = self.pointer(ty)?.pointee?;
        Some((pointee, self.struct_type(pointee)?))
    }

    /// Structure behind a pointer value: either the value's own pointee, or
    /// the pointee of the value a bitcast reinterpreted.
    pub fn struct_behind(&self, operand: &Operand) -> Option<(Typeref, StructType)> {
        let ty = self.type_of(operand)?;
        if let Some(found) = self.pointee_struct(ty) {
            return Some(found);
        }
        match operand {
            Operand::Reg(name) => match self.definition(*name)? {
                Instr::Cast(cast) if cast.variant == CastVariant::BitCast => {
                    self.pointee_struct(self.type_of(&cast.value)?)
                }
                _ => None,
            },
            _ => None,
        }
    }

    pub fn store_size(&self, ty: Typeref) -> Option<u64> {
        self.module.layout.store_size(&self.module.types, ty)
    }

    /// Type reached by indexing `source` with `indices`. The first index
    /// steps over whole `source` values and does not descend.
    pub fn indexed_type(&self, source: Typeref, indices: &[Operand]) -> Option<Typeref> {
        let mut current = source;
        for index in indices.iter().skip(1) {
            current = match self.resolve(current)? {
                AnyType::Array(array) => array.ty,
                AnyType::Struct(st) => {
                    let field = const_index(index)?;
                    *st.element_types.get(usize::try_from(field).ok()?)?
                }
                AnyType::Primary(_) => return None,
            };
        }
        Some(current)
    }

    /// Byte offset a GEP with constant indices adds to its base.
    pub fn constant_offset(&self, gep: &MGetElementPtr) -> Option<i64> {
        let layout = &self.module.layout;
        let types = &self.module.types;

        let mut indices = gep.indices.iter();
        let first = signed_index(indices.next()?)?;
        let mut offset = first.checked_mul(layout.alloc_size(types, gep.source_ty)? as i64)?;

        let mut current = gep.source_ty;
        for index in indices {
            match self.resolve(current)? {
                AnyType::Array(array) => {
                    let step = layout.alloc_size(types, array.ty)? as i64;
                    offset = offset.checked_add(signed_index(index)?.checked_mul(step)?)?;
                    current = array.ty;
                }
                AnyType::Struct(st) => {
                    let field = usize::try_from(const_index(index)?).ok()?;
                    offset = offset.checked_add(layout.field_offset(types, &st, field)? as i64)?;
                    current = *st.element_types.get(field)?;
                }
                AnyType::Primary(_) => return None,
            }
        }
        Some(offset)
    }

    pub fn symbol_name(&self, fptr: &FunctionPointer) -> Option<&'a str> {
        self.module.symbol_name(fptr)
    }

    pub fn callee_name(&self, call: &Invoke) -> Option<&'a str> {
        self.module.callee_name(call)
    }

    pub fn callee_has_body(&self, call: &Invoke) -> bool {
        self.module.callee_body(call).is_some()
    }
}

/// Zero-extended value of a constant integer index.
pub fn const_index(operand: &Operand) -> Option<u64> {
    match operand {
        Operand::Imm(AnyConst::Int(iconst)) => u64::try_from(&iconst.zext_value()).ok(),
        _ => None,
    }
}

fn signed_index(operand: &Operand) -> Option<i64> {
    match operand {
        Operand::Imm(AnyConst::Int(iconst)) => i64::try_from(&iconst.sext_value()).ok(),
        _ => None,
    }
}
