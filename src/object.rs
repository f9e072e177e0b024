use std::{cell::RefCell, cmp::Ordering, fmt, rc::Rc};

use crate::{
    dictionary::Dictionary,
    error::{PostScriptError, PsResult},
    file::PsFile,
    font::{Font, FontFace},
    interpreter::Interpreter,
    matrix::Matrix,
    name::Name,
    path::Path,
};

pub type OperatorFn = fn(&mut Interpreter) -> PsResult<()>;

/// A built-in procedure: the interned name it was registered under plus the
/// function invoked by the VM
#[derive(Clone, Copy)]
pub struct Operator {
    pub name: Name,
    pub func: OperatorFn,
}

impl PartialEq for Operator {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.func as usize == other.func as usize
    }
}

impl fmt::Debug for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "--{}--", self.name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Access {
    /// Normally, objects have unlimited access: all operations defined for
    /// that object are allowed
    #[default]
    Unlimited,

    /// An object with read-only access may not have its value written, but
    /// may still be read or executed
    ReadOnly,

    /// An object with execute-only access may not have its value either read
    /// or written, but may still be executed by the interpreter
    ExecuteOnly,

    /// An object with no access may not be operated on in any way by a
    /// PostScript language program
    None,
}

impl Access {
    pub fn writable(self) -> bool {
        self == Access::Unlimited
    }
}

/// Identity of a `save` snapshot: the VM generation at capture time plus the
/// stack depths `restore` rolls back to
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SaveRecord {
    pub generation: u64,
    pub gstate_depth: usize,
    pub dict_depth: usize,
}

#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Boolean(bool),
    Integer(i32),
    Real(f64),
    Mark,
    Name(Name),
    String(StringRef),
    Array(ArrayRef),
    Dictionary(Rc<RefCell<Dictionary>>),
    Operator(Operator),
    File(Rc<RefCell<PsFile>>),
    Matrix(Matrix),
    Path(Rc<RefCell<Path>>),
    FontFace(Rc<FontFace>),
    Font(Rc<Font>),
    Save(SaveRecord),
}

/// A tagged value plus the executable bit. The bit is meaningful for names
/// (execute vs. push-as-literal), arrays (procedure vs. data), and strings
/// (run as source vs. push); everywhere else it is carried but ignored.
#[derive(Debug, Clone)]
pub struct Object {
    pub value: Value,
    pub executable: bool,
}

impl Object {
    pub fn literal(value: Value) -> Self {
        Self {
            value,
            executable: false,
        }
    }

    pub fn executable(value: Value) -> Self {
        Self {
            value,
            executable: true,
        }
    }

    pub fn null() -> Self {
        Self::literal(Value::Null)
    }

    pub fn boolean(b: bool) -> Self {
        Self::literal(Value::Boolean(b))
    }

    pub fn integer(n: i32) -> Self {
        Self::literal(Value::Integer(n))
    }

    pub fn real(f: f64) -> Self {
        Self::literal(Value::Real(f))
    }

    pub fn mark() -> Self {
        Self::literal(Value::Mark)
    }

    pub fn literal_name(name: Name) -> Self {
        Self::literal(Value::Name(name))
    }

    pub fn executable_name(name: Name) -> Self {
        Self::executable(Value::Name(name))
    }

    pub fn string(s: StringRef) -> Self {
        Self::literal(Value::String(s))
    }

    pub fn string_from_bytes(bytes: Vec<u8>) -> Self {
        Self::literal(Value::String(StringRef::from_bytes(bytes)))
    }

    pub fn array(arr: ArrayRef) -> Self {
        Self::literal(Value::Array(arr))
    }

    pub fn procedure(arr: ArrayRef) -> Self {
        Self::executable(Value::Array(arr))
    }

    pub fn dictionary(dict: Rc<RefCell<Dictionary>>) -> Self {
        Self::literal(Value::Dictionary(dict))
    }

    pub fn operator(op: Operator) -> Self {
        Self::executable(Value::Operator(op))
    }

    pub fn file(file: Rc<RefCell<PsFile>>) -> Self {
        Self::literal(Value::File(file))
    }

    pub fn matrix(m: Matrix) -> Self {
        Self::literal(Value::Matrix(m))
    }

    pub fn is_number(&self) -> bool {
        matches!(self.value, Value::Integer(_) | Value::Real(_))
    }

    pub fn is_mark(&self) -> bool {
        matches!(self.value, Value::Mark)
    }

    /// Strict integer conversion; `index`, `roll`, `copy` and friends
    /// typecheck on anything else
    pub fn expect_int(&self) -> PsResult<i32> {
        match self.value {
            Value::Integer(n) => Ok(n),
            _ => anyhow::bail!(PostScriptError::TypeCheck),
        }
    }

    pub fn expect_number(&self) -> PsResult<f64> {
        match self.value {
            Value::Integer(n) => Ok(f64::from(n)),
            Value::Real(f) => Ok(f),
            _ => anyhow::bail!(PostScriptError::TypeCheck),
        }
    }

    /// The name pushed by the `type` operator
    pub fn type_name(&self) -> &'static [u8] {
        match self.value {
            Value::Null => b"nulltype",
            Value::Boolean(_) => b"booleantype",
            Value::Integer(_) => b"integertype",
            Value::Real(_) => b"realtype",
            Value::Mark => b"marktype",
            Value::Name(_) => b"nametype",
            Value::String(_) => b"stringtype",
            Value::Array(_) => b"arraytype",
            Value::Dictionary(_) => b"dicttype",
            Value::Operator(_) => b"operatortype",
            Value::File(_) => b"filetype",
            Value::Matrix(_) => b"matrixtype",
            Value::Path(_) => b"pathtype",
            Value::FontFace(_) | Value::Font(_) => b"fonttype",
            Value::Save(_) => b"savetype",
        }
    }

    /// Equality as defined by the `eq` operator: numeric values compare
    /// across integer/real, strings and names compare by content, composite
    /// objects compare by identity of the shared value
    pub fn ps_eq(&self, other: &Object) -> bool {
        match (&self.value, &other.value) {
            (Value::Null, Value::Null) => true,
            (Value::Mark, Value::Mark) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Real(a), Value::Real(b)) => a == b,
            (Value::Integer(a), Value::Real(b)) | (Value::Real(b), Value::Integer(a)) => {
                f64::from(*a) == *b
            }
            (Value::Name(a), Value::Name(b)) => a == b,
            (Value::String(a), Value::String(b)) => a.bytes() == b.bytes(),
            (Value::Name(n), Value::String(s)) | (Value::String(s), Value::Name(n)) => {
                n.as_bytes() == &s.bytes()[..]
            }
            (Value::Array(a), Value::Array(b)) => a.identity_eq(b),
            (Value::Dictionary(a), Value::Dictionary(b)) => Rc::ptr_eq(a, b),
            (Value::File(a), Value::File(b)) => Rc::ptr_eq(a, b),
            (Value::Path(a), Value::Path(b)) => Rc::ptr_eq(a, b),
            (Value::Operator(a), Value::Operator(b)) => a == b,
            (Value::Matrix(a), Value::Matrix(b)) => a.m == b.m,
            (Value::Font(a), Value::Font(b)) => Rc::ptr_eq(a, b),
            (Value::FontFace(a), Value::FontFace(b)) => Rc::ptr_eq(a, b),
            (Value::Save(a), Value::Save(b)) => a == b,
            _ => false,
        }
    }
}

/// A mutable byte buffer with the capacity/length split: `put` past the
/// logical length extends it, past the capacity is a rangecheck.
#[derive(Debug, Clone)]
pub struct PsString {
    data: Vec<u8>,
    len: usize,
    access: Access,
}

impl PsString {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: vec![0; capacity],
            len: 0,
            access: Access::default(),
        }
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self {
            len: bytes.len(),
            data: bytes,
            access: Access::default(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    fn get(&self, idx: usize) -> PsResult<u8> {
        match self.data.get(idx) {
            Some(&b) => Ok(b),
            None => anyhow::bail!(PostScriptError::RangeCheck),
        }
    }

    fn put(&mut self, idx: usize, byte: u8) -> PsResult<()> {
        if idx >= self.capacity() {
            anyhow::bail!(PostScriptError::RangeCheck);
        }

        self.data[idx] = byte;

        if idx >= self.len {
            self.len = idx + 1;
        }

        Ok(())
    }
}

/// Shared handle to a string. A handle produced by `getinterval` carries a
/// window into the same backing buffer, so writes through either handle are
/// visible through both.
#[derive(Debug, Clone)]
pub struct StringRef {
    inner: Rc<RefCell<PsString>>,
    window: Option<(usize, usize)>,
}

impl StringRef {
    pub fn new(s: PsString) -> Self {
        Self {
            inner: Rc::new(RefCell::new(s)),
            window: None,
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self::new(PsString::with_capacity(capacity))
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self::new(PsString::from_bytes(bytes))
    }

    pub fn len(&self) -> usize {
        match self.window {
            Some((_, count)) => count,
            None => self.inner.borrow().len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        match self.window {
            Some((_, count)) => count,
            None => self.inner.borrow().capacity(),
        }
    }

    fn start(&self) -> usize {
        self.window.map_or(0, |(start, _)| start)
    }

    pub fn get(&self, idx: usize) -> PsResult<u8> {
        if idx >= self.capacity() {
            anyhow::bail!(PostScriptError::RangeCheck);
        }

        self.inner.borrow().get(self.start() + idx)
    }

    pub fn put(&self, idx: usize, byte: u8) -> PsResult<()> {
        if !self.access().writable() {
            anyhow::bail!(PostScriptError::InvalidAccess);
        }

        if idx >= self.capacity() {
            anyhow::bail!(PostScriptError::RangeCheck);
        }

        self.inner.borrow_mut().put(self.start() + idx, byte)
    }

    pub fn getinterval(&self, idx: usize, count: usize) -> PsResult<StringRef> {
        if idx + count > self.capacity() {
            anyhow::bail!(PostScriptError::RangeCheck);
        }

        Ok(Self {
            inner: Rc::clone(&self.inner),
            window: Some((self.start() + idx, count)),
        })
    }

    pub fn putinterval(&self, idx: usize, src: &StringRef) -> PsResult<()> {
        let bytes = src.bytes();

        if idx + bytes.len() > self.capacity() {
            anyhow::bail!(PostScriptError::RangeCheck);
        }

        for (offset, &b) in bytes.iter().enumerate() {
            self.put(idx + offset, b)?;
        }

        Ok(())
    }

    /// The logical contents, copied out
    pub fn bytes(&self) -> Vec<u8> {
        let inner = self.inner.borrow();
        match self.window {
            Some((start, count)) => inner.data[start..start + count].to_vec(),
            None => inner.data[..inner.len].to_vec(),
        }
    }

    /// A handle to the same storage truncated to `count` bytes; used by the
    /// read operators to report how much was actually filled
    pub fn truncated(&self, count: usize) -> StringRef {
        match self.window {
            Some((start, _)) => Self {
                inner: Rc::clone(&self.inner),
                window: Some((start, count)),
            },
            None => {
                self.inner.borrow_mut().len = count;
                self.clone()
            }
        }
    }

    pub fn access(&self) -> Access {
        self.inner.borrow().access
    }

    pub fn set_access(&self, access: Access) {
        self.inner.borrow_mut().access = access;
    }

    pub fn identity_eq(&self, other: &StringRef) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner) && self.window == other.window
    }

    pub fn lexical_cmp(&self, other: &StringRef) -> Ordering {
        self.bytes().cmp(&other.bytes())
    }
}

#[derive(Debug, Clone)]
pub struct PsArray {
    elements: Vec<Object>,
    procedure: bool,
    access: Access,
}

impl PsArray {
    pub fn from_objects(elements: Vec<Object>) -> Self {
        Self {
            elements,
            procedure: false,
            access: Access::default(),
        }
    }

    pub fn new_procedure(elements: Vec<Object>) -> Self {
        Self {
            elements,
            procedure: true,
            access: Access::default(),
        }
    }
}

/// Shared handle to an array, optionally windowed by `getinterval`
#[derive(Debug, Clone)]
pub struct ArrayRef {
    inner: Rc<RefCell<PsArray>>,
    window: Option<(usize, usize)>,
}

impl ArrayRef {
    pub fn new(arr: PsArray) -> Self {
        Self {
            inner: Rc::new(RefCell::new(arr)),
            window: None,
        }
    }

    pub fn from_objects(elements: Vec<Object>) -> Self {
        Self::new(PsArray::from_objects(elements))
    }

    pub fn new_procedure(elements: Vec<Object>) -> Self {
        Self::new(PsArray::new_procedure(elements))
    }

    pub fn len(&self) -> usize {
        match self.window {
            Some((_, count)) => count,
            None => self.inner.borrow().elements.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn start(&self) -> usize {
        self.window.map_or(0, |(start, _)| start)
    }

    pub fn is_procedure(&self) -> bool {
        self.inner.borrow().procedure
    }

    pub fn set_procedure(&self, procedure: bool) {
        self.inner.borrow_mut().procedure = procedure;
    }

    pub fn get(&self, idx: usize) -> PsResult<Object> {
        if idx >= self.len() {
            anyhow::bail!(PostScriptError::RangeCheck);
        }

        Ok(self.inner.borrow().elements[self.start() + idx].clone())
    }

    pub fn put(&self, idx: usize, obj: Object) -> PsResult<()> {
        if !self.access().writable() {
            anyhow::bail!(PostScriptError::InvalidAccess);
        }

        if idx >= self.len() {
            anyhow::bail!(PostScriptError::RangeCheck);
        }

        let start = self.start();
        self.inner.borrow_mut().elements[start + idx] = obj;

        Ok(())
    }

    pub fn getinterval(&self, idx: usize, count: usize) -> PsResult<ArrayRef> {
        if idx + count > self.len() {
            anyhow::bail!(PostScriptError::RangeCheck);
        }

        Ok(Self {
            inner: Rc::clone(&self.inner),
            window: Some((self.start() + idx, count)),
        })
    }

    pub fn putinterval(&self, idx: usize, src: &ArrayRef) -> PsResult<()> {
        let elements = src.to_vec();

        if idx + elements.len() > self.len() {
            anyhow::bail!(PostScriptError::RangeCheck);
        }

        for (offset, obj) in elements.into_iter().enumerate() {
            self.put(idx + offset, obj)?;
        }

        Ok(())
    }

    pub fn to_vec(&self) -> Vec<Object> {
        let inner = self.inner.borrow();
        let start = self.start();
        inner.elements[start..start + self.len()].to_vec()
    }

    pub fn access(&self) -> Access {
        self.inner.borrow().access
    }

    pub fn set_access(&self, access: Access) {
        self.inner.borrow_mut().access = access;
    }

    pub fn identity_eq(&self, other: &ArrayRef) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner) && self.window == other.window
    }
}
