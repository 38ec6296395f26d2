//! Register-based instructions shared by the SSA and ROP forms.
//!
//! An instruction already carries its final opcode shape; lowering only
//! renumbers its registers, so the same `Insn` type is used on both sides.

use std::fmt::{Display, Error, Formatter};

use strum_macros::AsRefStr;

/// Register category: how many consecutive physical slots a value needs.
#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum Category {
  /// One slot (ints, floats, references).
  One,
  /// Two consecutive slots (longs, doubles).
  Two,
}

impl Category {
  #[inline]
  pub fn width(self) -> u32 {
    match self {
      Category::One => 1,
      Category::Two => 2,
    }
  }
}

impl Default for Category {
  fn default() -> Self {
    Category::One
  }
}

/// Register number with its category. Before allocation the number is an
/// SSA name, afterwards it is the first physical slot the value occupies.
#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct RegSpec(pub u32, pub Category);

impl RegSpec {
  pub fn narrow(reg: u32) -> Self {
    RegSpec(reg, Category::One)
  }

  pub fn wide(reg: u32) -> Self {
    RegSpec(reg, Category::Two)
  }

  #[inline]
  pub fn reg(&self) -> u32 {
    self.0
  }

  #[inline]
  pub fn category(&self) -> Category {
    self.1
  }

  #[inline]
  pub fn width(&self) -> u32 {
    self.1.width()
  }

  pub fn with_reg(&self, reg: u32) -> Self {
    RegSpec(reg, self.1)
  }

  /// Whether the physical slots of `self` and `other` overlap.
  pub fn overlaps(&self, other: &RegSpec) -> bool {
    self.0 < other.0 + other.width() && other.0 < self.0 + self.width()
  }
}

/// How an instruction leaves its block.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Branchingness {
  /// Falls through to the next instruction.
  None,
  Goto,
  If,
  Switch,
  Return,
  Throw,
}

#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq, AsRefStr)]
#[strum(serialize_all = "kebab-case")]
pub enum Opcode {
  Nop,
  Move,
  /// Reads an incoming parameter; the literal is the parameter's slot offset.
  MoveParam,
  /// Reads the result of the preceding invoke.
  MoveResult,
  Const,
  Add,
  Sub,
  Mul,
  Div,
  Rem,
  And,
  Or,
  Xor,
  Shl,
  Shr,
  Neg,
  Not,
  Cmp,
  /// The literal is a method reference index.
  Invoke,
  Goto,
  IfEq,
  IfNe,
  IfLt,
  IfGe,
  IfGt,
  IfLe,
  IfEqz,
  IfNez,
  Switch,
  Return,
  Throw,
}

impl Opcode {
  pub fn branchingness(self) -> Branchingness {
    match self {
      Opcode::Goto => Branchingness::Goto,
      Opcode::IfEq
      | Opcode::IfNe
      | Opcode::IfLt
      | Opcode::IfGe
      | Opcode::IfGt
      | Opcode::IfLe
      | Opcode::IfEqz
      | Opcode::IfNez => Branchingness::If,
      Opcode::Switch => Branchingness::Switch,
      Opcode::Return => Branchingness::Return,
      Opcode::Throw => Branchingness::Throw,
      _ => Branchingness::None,
    }
  }

  #[inline]
  pub fn is_branch(self) -> bool {
    self.branchingness() != Branchingness::None
  }
}

/// A single register-based instruction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Insn {
  pub opcode: Opcode,
  pub result: Option<RegSpec>,
  pub sources: Vec<RegSpec>,
  /// Constant payload: literal value, parameter offset, method index, ...
  pub literal: Option<i64>,
}

impl Insn {
  pub fn new(opcode: Opcode, result: Option<RegSpec>, sources: Vec<RegSpec>) -> Self {
    Insn {
      opcode,
      result,
      sources,
      literal: None,
    }
  }

  pub fn with_literal(mut self, literal: i64) -> Self {
    self.literal = Some(literal);
    self
  }

  pub fn mov(dest: RegSpec, src: RegSpec) -> Self {
    Insn::new(Opcode::Move, Some(dest), vec![src])
  }

  pub fn param(dest: RegSpec, offset: u32) -> Self {
    Insn::new(Opcode::MoveParam, Some(dest), vec![]).with_literal(offset as i64)
  }

  pub fn konst(dest: RegSpec, value: i64) -> Self {
    Insn::new(Opcode::Const, Some(dest), vec![]).with_literal(value)
  }

  pub fn binop(op: Opcode, dest: RegSpec, src1: RegSpec, src2: RegSpec) -> Self {
    Insn::new(op, Some(dest), vec![src1, src2])
  }

  pub fn goto() -> Self {
    Insn::new(Opcode::Goto, None, vec![])
  }

  pub fn branch(op: Opcode, sources: Vec<RegSpec>) -> Self {
    debug_assert_eq!(op.branchingness(), Branchingness::If);
    Insn::new(op, None, sources)
  }

  pub fn ret(src: Option<RegSpec>) -> Self {
    Insn::new(Opcode::Return, None, src.into_iter().collect())
  }

  pub fn throw(src: RegSpec) -> Self {
    Insn::new(Opcode::Throw, None, vec![src])
  }

  #[inline]
  pub fn branchingness(&self) -> Branchingness {
    self.opcode.branchingness()
  }

  /// A `goto` with no operands; moves may be placed right before it.
  pub fn is_plain_goto(&self) -> bool {
    self.opcode == Opcode::Goto && self.result.is_none() && self.sources.is_empty()
  }

  /// A register-to-register copy.
  pub fn is_move(&self) -> bool {
    self.opcode == Opcode::Move && self.result.is_some() && self.sources.len() == 1
  }

  /// A copy whose source and destination are the same register.
  pub fn is_identity_move(&self) -> bool {
    self.is_move() && self.result.as_ref() == self.sources.first()
  }

  /// Rewrites every register operand through `f`.
  pub fn map_registers(&mut self, mut f: impl FnMut(RegSpec) -> RegSpec) {
    if let Some(result) = self.result.as_mut() {
      *result = f(*result);
    }
    for src in self.sources.iter_mut() {
      *src = f(*src);
    }
  }
}

impl Display for Category {
  fn fmt(&self, fmt: &mut Formatter) -> Result<(), Error> {
    match self {
      Category::One => Ok(()),
      Category::Two => write!(fmt, ":wide"),
    }
  }
}

impl Display for RegSpec {
  fn fmt(&self, fmt: &mut Formatter) -> Result<(), Error> {
    write!(fmt, "v{}{}", self.0, self.1)
  }
}

impl Display for Insn {
  fn fmt(&self, fmt: &mut Formatter) -> Result<(), Error> {
    if let Some(result) = &self.result {
      write!(fmt, "{} <- ", result)?;
    }
    write!(fmt, "{}", self.opcode.as_ref())?;
    for (i, src) in self.sources.iter().enumerate() {
      if i == 0 {
        write!(fmt, " {}", src)?;
      } else {
        write!(fmt, ", {}", src)?;
      }
    }
    if let Some(literal) = self.literal {
      write!(fmt, " #{}", literal)?;
    }
    Ok(())
  }
}
