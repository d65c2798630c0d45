// =============================================================================
// OPCODE - one 32-bit word selecting the operation
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum Opcode {
    // control
    Noop = 0,
    Halt,

    // constant pushes
    PushInt32,
    PushInt64,
    PushUint32,
    PushUint64,
    PushFloat32,
    PushFloat64,

    // stack ops
    Pop,
    /// Pop the top N values; N is a u32 operand.
    PopN,
    /// Push a copy of `stack[frame_base + offset]`.
    Copy,
    /// Exchange `stack[frame_base + offset]` with the top value.
    Swap,

    // unary
    Negative,

    // binary, coerced to signed 64
    AddInt,
    SubInt,
    MulInt,
    DivInt,

    // ( a -- a+k )
    AddConstInt32,
    AddConstInt64,
    AddConstUint32,
    AddConstUint64,
    AddConstFloat32,
    AddConstFloat64,

    // ( a -- a-k )
    SubConstInt32,
    SubConstInt64,
    SubConstUint32,
    SubConstUint64,
    SubConstFloat32,
    SubConstFloat64,

    // ( a -- a*k )
    MulConstInt32,
    MulConstInt64,
    MulConstUint32,
    MulConstUint64,
    MulConstFloat32,
    MulConstFloat64,

    // ( a -- a/k )
    DivConstInt32,
    DivConstInt64,
    DivConstUint32,
    DivConstUint64,
    DivConstFloat32,
    DivConstFloat64,

    Increment,
    Decrement,
}

/// Shape of the constant operand trailing an opcode word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operand {
    None,
    I32,
    I64,
    U32,
    U64,
    F32,
    F64,
}

impl Operand {
    /// Number of trailing words the operand occupies.
    pub const fn words(self) -> usize {
        match self {
            Operand::None => 0,
            Operand::I32 | Operand::U32 | Operand::F32 => 1,
            Operand::I64 | Operand::U64 | Operand::F64 => 2,
        }
    }
}

/// The arithmetic performed by a binary opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl Opcode {
    /// Every opcode, indexed by its word value.
    pub const ALL: [Opcode; 43] = [
        Opcode::Noop,
        Opcode::Halt,
        Opcode::PushInt32,
        Opcode::PushInt64,
        Opcode::PushUint32,
        Opcode::PushUint64,
        Opcode::PushFloat32,
        Opcode::PushFloat64,
        Opcode::Pop,
        Opcode::PopN,
        Opcode::Copy,
        Opcode::Swap,
        Opcode::Negative,
        Opcode::AddInt,
        Opcode::SubInt,
        Opcode::MulInt,
        Opcode::DivInt,
        Opcode::AddConstInt32,
        Opcode::AddConstInt64,
        Opcode::AddConstUint32,
        Opcode::AddConstUint64,
        Opcode::AddConstFloat32,
        Opcode::AddConstFloat64,
        Opcode::SubConstInt32,
        Opcode::SubConstInt64,
        Opcode::SubConstUint32,
        Opcode::SubConstUint64,
        Opcode::SubConstFloat32,
        Opcode::SubConstFloat64,
        Opcode::MulConstInt32,
        Opcode::MulConstInt64,
        Opcode::MulConstUint32,
        Opcode::MulConstUint64,
        Opcode::MulConstFloat32,
        Opcode::MulConstFloat64,
        Opcode::DivConstInt32,
        Opcode::DivConstInt64,
        Opcode::DivConstUint32,
        Opcode::DivConstUint64,
        Opcode::DivConstFloat32,
        Opcode::DivConstFloat64,
        Opcode::Increment,
        Opcode::Decrement,
    ];

    /// Assembly mnemonic, matched case-insensitively by the assembler.
    pub const fn mnemonic(self) -> &'static str {
        use Opcode::*;
        match self {
            Noop => "Noop",
            Halt => "Halt",
            PushInt32 => "PushI32",
            PushInt64 => "PushI64",
            PushUint32 => "PushU32",
            PushUint64 => "PushU64",
            PushFloat32 => "PushF32",
            PushFloat64 => "PushF64",
            Pop => "Pop",
            PopN => "PopN",
            Copy => "Copy",
            Swap => "Swap",
            Negative => "Negative",
            AddInt => "AddInt",
            SubInt => "SubInt",
            MulInt => "MulInt",
            DivInt => "DivInt",
            AddConstInt32 => "AddConstI32",
            AddConstInt64 => "AddConstI64",
            AddConstUint32 => "AddConstU32",
            AddConstUint64 => "AddConstU64",
            AddConstFloat32 => "AddConstF32",
            AddConstFloat64 => "AddConstF64",
            SubConstInt32 => "SubConstI32",
            SubConstInt64 => "SubConstI64",
            SubConstUint32 => "SubConstU32",
            SubConstUint64 => "SubConstU64",
            SubConstFloat32 => "SubConstF32",
            SubConstFloat64 => "SubConstF64",
            MulConstInt32 => "MulConstI32",
            MulConstInt64 => "MulConstI64",
            MulConstUint32 => "MulConstU32",
            MulConstUint64 => "MulConstU64",
            MulConstFloat32 => "MulConstF32",
            MulConstFloat64 => "MulConstF64",
            DivConstInt32 => "DivConstI32",
            DivConstInt64 => "DivConstI64",
            DivConstUint32 => "DivConstU32",
            DivConstUint64 => "DivConstU64",
            DivConstFloat32 => "DivConstF32",
            DivConstFloat64 => "DivConstF64",
            Increment => "Increment",
            Decrement => "Decrement",
        }
    }

    pub const fn operand(self) -> Operand {
        use Opcode::*;
        match self {
            PushInt32 | AddConstInt32 | SubConstInt32 | MulConstInt32 | DivConstInt32 => {
                Operand::I32
            }
            PushInt64 | AddConstInt64 | SubConstInt64 | MulConstInt64 | DivConstInt64 => {
                Operand::I64
            }
            PushUint32 | AddConstUint32 | SubConstUint32 | MulConstUint32 | DivConstUint32 => {
                Operand::U32
            }
            PushUint64 | AddConstUint64 | SubConstUint64 | MulConstUint64 | DivConstUint64 => {
                Operand::U64
            }
            PushFloat32 | AddConstFloat32 | SubConstFloat32 | MulConstFloat32
            | DivConstFloat32 => Operand::F32,
            PushFloat64 | AddConstFloat64 | SubConstFloat64 | MulConstFloat64
            | DivConstFloat64 => Operand::F64,
            PopN | Copy | Swap => Operand::U32,
            Noop | Halt | Pop | Negative | AddInt | SubInt | MulInt | DivInt | Increment
            | Decrement => Operand::None,
        }
    }

    /// Total encoded width in words: the opcode plus its operand.
    pub const fn width(self) -> usize {
        1 + self.operand().words()
    }

    /// The arithmetic of a stack-binary opcode (`AddInt`..`DivInt`).
    pub const fn int_op(self) -> Option<ArithOp> {
        match self {
            Opcode::AddInt => Some(ArithOp::Add),
            Opcode::SubInt => Some(ArithOp::Sub),
            Opcode::MulInt => Some(ArithOp::Mul),
            Opcode::DivInt => Some(ArithOp::Div),
            _ => None,
        }
    }

    /// The arithmetic of a constant-binary opcode, `None` for everything else.
    pub const fn const_op(self) -> Option<ArithOp> {
        use Opcode::*;
        match self {
            AddConstInt32 | AddConstInt64 | AddConstUint32 | AddConstUint64 | AddConstFloat32
            | AddConstFloat64 => Some(ArithOp::Add),
            SubConstInt32 | SubConstInt64 | SubConstUint32 | SubConstUint64 | SubConstFloat32
            | SubConstFloat64 => Some(ArithOp::Sub),
            MulConstInt32 | MulConstInt64 | MulConstUint32 | MulConstUint64 | MulConstFloat32
            | MulConstFloat64 => Some(ArithOp::Mul),
            DivConstInt32 | DivConstInt64 | DivConstUint32 | DivConstUint64 | DivConstFloat32
            | DivConstFloat64 => Some(ArithOp::Div),
            _ => None,
        }
    }
}

impl TryFrom<u32> for Opcode {
    /// The unrecognised word.
    type Error = u32;

    fn try_from(word: u32) -> Result<Self, Self::Error> {
        Opcode::ALL.get(word as usize).copied().ok_or(word)
    }
}

impl From<Opcode> for u32 {
    fn from(op: Opcode) -> Self {
        op as u32
    }
}

impl std::fmt::Display for Opcode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.mnemonic())
    }
}
