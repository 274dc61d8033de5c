use crate::interpreter::value::{
    chars::CharString,
    core::Value,
    real::{MathContext, Real},
    scalar::{NumberClass, Scalar},
};

/// Class tag of a multi-array's elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementClass {
    /// Ordinary decimal scalars.
    Decimal,
    /// Logical scalars (masks produced by comparisons).
    Logical,
    /// Character strings.
    Char,
}

/// Failures raised by array construction and indexing.
///
/// The array layer does not know source lines; the evaluator maps these
/// onto its own error type at the raising node.
#[derive(Debug)]
pub enum ArrayError {
    /// A subscript points outside the array.
    OutOfBounds {
        /// Number of addressable positions along the failing extent.
        length: usize,
        /// The subscript that was requested.
        found:  usize,
    },
    /// A subscript is not a positive integer, or an indexing form is
    /// structurally invalid.
    Index(String),
    /// Operand or concatenation shapes do not agree.
    Shape(String),
    /// Element types do not agree.
    Type(String),
}

/// One resolved subscript: 1-based indices plus the orientation of the
/// subscript value (used by linear indexing to shape its result).
#[derive(Debug, Clone)]
pub struct Subscript {
    /// 1-based indices.
    pub indices:    Vec<usize>,
    /// `true` when the subscript value was a row vector or scalar.
    pub row_shaped: bool,
}

impl Subscript {
    /// Resolves a value into a subscript vector.
    ///
    /// Scalars and numeric arrays are accepted; every element must be a
    /// positive integer.
    ///
    /// # Errors
    /// `ArrayError::Index` for non-numeric or non-positive entries.
    pub fn from_value(value: &Value) -> Result<Self, ArrayError> {
        match value {
            Value::Scalar(s) => {
                let index = s.to_subscript()
                             .ok_or_else(|| ArrayError::Index("subscripts must be positive integers".to_string()))?;
                Ok(Self { indices:    vec![index],
                          row_shaped: true, })
            },
            Value::Array(a) => {
                let mut indices = Vec::with_capacity(a.numel());
                for element in &a.contents {
                    match element {
                        Value::Scalar(s) => {
                            let index = s.to_subscript()
                                         .ok_or_else(|| ArrayError::Index("subscripts must be positive integers".to_string()))?;
                            indices.push(index);
                        },
                        _ => {
                            return Err(ArrayError::Index("subscripts must be numeric".to_string()))
                        },
                    }
                }
                Ok(Self { indices,
                          row_shaped: a.is_row(), })
            },
            _ => Err(ArrayError::Index("subscripts must be numeric".to_string())),
        }
    }
}

/// An N-dimensional array of scalars or strings, or a heterogeneous cell
/// container.
///
/// The shape vector always has rank at least two and the contents are kept
/// in row-major order; linear indexing follows column-major semantics, so
/// element access converts between the two.
#[derive(Debug, Clone, PartialEq)]
pub struct MultiArray {
    /// The shape vector (`len() >= 2`, entries may be zero).
    pub dims:     Vec<usize>,
    /// The element class tag.
    pub class:    ElementClass,
    /// `true` for `{}` cell containers with heterogeneous contents.
    pub cell:     bool,
    /// Row-major contents; `contents.len() == product(dims)`.
    pub contents: Vec<Value>,
}

impl MultiArray {
    /// Builds an array, verifying the shape invariant.
    ///
    /// # Errors
    /// `ArrayError::Shape` when `product(dims) != contents.len()`.
    pub fn new(dims: Vec<usize>, contents: Vec<Value>, cell: bool) -> Result<Self, ArrayError> {
        let mut dims = dims;
        while dims.len() < 2 {
            dims.push(1);
        }
        if numel_of(&dims) != contents.len() {
            return Err(ArrayError::Shape(format!("{} elements do not fill a {} array",
                                                 contents.len(),
                                                 shape_string(&dims))));
        }
        let class = if cell {
            ElementClass::Decimal
        } else {
            unified_class(&contents)?
        };
        Ok(Self { dims,
                  class,
                  cell,
                  contents })
    }

    /// The empty 0×0 array.
    #[must_use]
    pub fn empty() -> Self {
        Self { dims:     vec![0, 0],
               class:    ElementClass::Decimal,
               cell:     false,
               contents: Vec::new(), }
    }

    /// An array of the given shape filled with copies of one value.
    #[must_use]
    pub fn filled(dims: Vec<usize>, fill: Value) -> Self {
        let mut dims = dims;
        while dims.len() < 2 {
            dims.push(1);
        }
        let count = numel_of(&dims);
        let class = unified_class(std::slice::from_ref(&fill)).unwrap_or(ElementClass::Decimal);
        Self { dims,
               class,
               cell: false,
               contents: vec![fill; count], }
    }

    /// Wraps a single value into a 1×1 array.
    #[must_use]
    pub fn from_element(value: Value) -> Self {
        let class = unified_class(std::slice::from_ref(&value)).unwrap_or(ElementClass::Decimal);
        Self { dims: vec![1, 1],
               class,
               cell: false,
               contents: vec![value], }
    }

    /// A row vector of scalars.
    #[must_use]
    pub fn row(values: Vec<Value>) -> Self {
        let class = unified_class(&values).unwrap_or(ElementClass::Decimal);
        Self { dims: vec![1, values.len()],
               class,
               cell: false,
               contents: values, }
    }

    /// A column vector of scalars.
    #[must_use]
    pub fn column(values: Vec<Value>) -> Self {
        let class = unified_class(&values).unwrap_or(ElementClass::Decimal);
        Self { dims: vec![values.len(), 1],
               class,
               cell: false,
               contents: values, }
    }

    /// The number of dimensions.
    #[must_use]
    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    /// Dimension `i` (0-based); dimensions beyond the rank are 1.
    #[must_use]
    pub fn dim(&self, i: usize) -> usize {
        self.dims.get(i).copied().unwrap_or(1)
    }

    /// The linear length `product(dims)`.
    #[must_use]
    pub fn numel(&self) -> usize {
        numel_of(&self.dims)
    }

    /// `true` when any dimension is zero.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.numel() == 0
    }

    /// `true` for 1×n shapes.
    #[must_use]
    pub fn is_row(&self) -> bool {
        self.rank() == 2 && self.dims[0] == 1
    }

    /// `true` for n×1 shapes.
    #[must_use]
    pub fn is_col(&self) -> bool {
        self.rank() == 2 && self.dims[1] == 1
    }

    /// `true` for row or column shapes.
    #[must_use]
    pub fn is_vector(&self) -> bool {
        self.is_row() || self.is_col()
    }

    /// `true` when every element is truthy; an empty array is not.
    #[must_use]
    pub fn all_true(&self) -> bool {
        if self.is_empty() {
            return false;
        }
        self.contents.iter().all(|v| match v {
                                 Value::Scalar(s) => s.is_true(),
                                 Value::CharString(s) => !s.text.is_empty(),
                                 _ => false,
                             })
    }

    /// The element at a 0-based column-major linear position.
    #[must_use]
    pub fn get_linear(&self, l: usize) -> &Value {
        &self.contents[self.storage_offset_of_linear(l)]
    }

    fn set_linear(&mut self, l: usize, value: Value) {
        let offset = self.storage_offset_of_linear(l);
        self.contents[offset] = value;
    }

    fn storage_offset_of_linear(&self, l: usize) -> usize {
        let subs = linear_to_subs(&self.dims, l);
        storage_offset(&self.dims, &subs)
    }

    /// Reads with a single subscript vector in column-major linear order.
    ///
    /// A one-element subscript yields the element itself; otherwise the
    /// result is a vector following the orientation of the subscript.
    ///
    /// # Errors
    /// `ArrayError::OutOfBounds` for subscripts beyond the linear length.
    pub fn read_linear(&self, subscript: &Subscript) -> Result<Value, ArrayError> {
        let length = self.numel();
        let mut picked = Vec::with_capacity(subscript.indices.len());
        for &index in &subscript.indices {
            if index > length {
                return Err(ArrayError::OutOfBounds { length,
                                                     found: index });
            }
            picked.push(self.get_linear(index - 1).clone());
        }

        if picked.len() == 1 && !self.cell {
            return Ok(picked.remove(0));
        }
        let dims = if subscript.row_shaped {
            vec![1, picked.len()]
        } else {
            vec![picked.len(), 1]
        };
        let mut result = Self::new(dims, picked, self.cell)?;
        result.cell = self.cell;
        Ok(result.into_value())
    }

    /// Reads with one subscript vector per dimension; the result shape is
    /// the outer product of the subscript lengths.
    ///
    /// # Errors
    /// `ArrayError::OutOfBounds` for subscripts beyond their dimension.
    pub fn read_subscripts(&self, subs: &[Subscript]) -> Result<Value, ArrayError> {
        let eff = self.effective_dims(subs.len());
        for (j, sub) in subs.iter().enumerate() {
            for &index in &sub.indices {
                if index > eff[j] {
                    return Err(ArrayError::OutOfBounds { length: eff[j],
                                                         found:  index, });
                }
            }
        }

        let strides = col_strides(&eff);
        let out_dims = out_dims_of(subs);
        let count = numel_of(&out_dims);
        let mut contents = Vec::with_capacity(count);
        let lens: Vec<usize> = subs.iter().map(|s| s.indices.len()).collect();
        let mut cursor = vec![0usize; lens.len()];
        for _ in 0..count {
            let mut l = 0;
            for (j, &c) in cursor.iter().enumerate() {
                l += (subs[j].indices[c] - 1) * strides[j];
            }
            contents.push(self.get_linear(l).clone());
            advance_row_major(&mut cursor, &lens);
        }

        if contents.len() == 1 && !self.cell {
            return Ok(contents.remove(0));
        }
        let mut result = Self::new(out_dims, contents, self.cell)?;
        result.cell = self.cell;
        Ok(result.into_value())
    }

    /// Reads the positions selected by a logical mask, in the mask's
    /// column-major order. The result follows the array's orientation for
    /// vectors and is a column otherwise.
    ///
    /// # Errors
    /// `ArrayError::OutOfBounds` when a truthy mask position lies beyond
    /// the array.
    pub fn read_logical(&self, mask: &Self) -> Result<Value, ArrayError> {
        let positions = mask_positions(mask, self.numel())?;
        let picked: Vec<Value> = positions.iter().map(|&l| self.get_linear(l).clone()).collect();
        let result = if self.is_row() {
            Self::row(picked)
        } else {
            Self::column(picked)
        };
        Ok(Value::Array(result))
    }

    /// Writes through a single linear subscript vector, growing vectors
    /// (and empty arrays) with fill when the subscript runs past the end.
    ///
    /// # Errors
    /// `ArrayError::Shape` when a matrix would have to grow along an
    /// ambiguous dimension, or when the counts disagree.
    pub fn write_linear(&mut self, subscript: &Subscript, rhs: &[Value]) -> Result<(), ArrayError> {
        if rhs.len() != 1 && rhs.len() != subscript.indices.len() {
            return Err(ArrayError::Shape(format!("{} positions written with {} values",
                                                 subscript.indices.len(),
                                                 rhs.len())));
        }

        let needed = subscript.indices.iter().copied().max().unwrap_or(0);
        if needed > self.numel() {
            self.grow_linear(needed)?;
        }

        for (k, &index) in subscript.indices.iter().enumerate() {
            let value = if rhs.len() == 1 { rhs[0].clone() } else { rhs[k].clone() };
            self.set_linear(index - 1, value);
        }
        self.reclass()
    }

    /// Writes through per-dimension subscripts, growing the array with
    /// fill where a subscript runs past its dimension.
    ///
    /// # Errors
    /// `ArrayError::Shape` when the value count disagrees with the target
    /// positions.
    pub fn write_subscripts(&mut self,
                            subs: &[Subscript],
                            rhs: &[Value])
                            -> Result<(), ArrayError> {
        let count: usize = subs.iter().map(|s| s.indices.len()).product();
        if rhs.len() != 1 && rhs.len() != count {
            return Err(ArrayError::Shape(format!("{count} positions written with {} values",
                                                 rhs.len())));
        }

        if subs.len() < self.rank() {
            // collapsed trailing dimensions: no growth in this form
            let eff = self.effective_dims(subs.len());
            for (j, sub) in subs.iter().enumerate() {
                for &index in &sub.indices {
                    if index > eff[j] {
                        return Err(ArrayError::OutOfBounds { length: eff[j],
                                                             found:  index, });
                    }
                }
            }
        } else {
            let mut new_dims: Vec<usize> = (0..subs.len()).map(|j| self.dim(j)).collect();
            for (j, sub) in subs.iter().enumerate() {
                let max = sub.indices.iter().copied().max().unwrap_or(0);
                if max > new_dims[j] {
                    new_dims[j] = max;
                }
            }
            while new_dims.len() > 2 && new_dims.last() == Some(&1) {
                new_dims.pop();
            }
            if new_dims != self.dims {
                self.grow_to(new_dims);
            }
        }

        // positions and replacement values pair up in column-major order
        let eff = self.effective_dims(subs.len());
        let strides = col_strides(&eff);
        let lens: Vec<usize> = subs.iter().map(|s| s.indices.len()).collect();
        let mut cursor = vec![0usize; lens.len()];
        for k in 0..count {
            let mut l = 0;
            for (j, &c) in cursor.iter().enumerate() {
                l += (subs[j].indices[c] - 1) * strides[j];
            }
            let value = if rhs.len() == 1 { rhs[0].clone() } else { rhs[k].clone() };
            self.set_linear(l, value);
            advance_col_major(&mut cursor, &lens);
        }
        self.reclass()
    }

    /// Writes through a logical mask: the replacement is broadcast when it
    /// is a single value and must match the selection count otherwise.
    ///
    /// # Errors
    /// `ArrayError::Shape` on count mismatch, `ArrayError::OutOfBounds`
    /// when the mask selects past the end.
    pub fn write_logical(&mut self, mask: &Self, rhs: &[Value]) -> Result<(), ArrayError> {
        let positions = mask_positions(mask, self.numel())?;
        if rhs.len() != 1 && rhs.len() != positions.len() {
            return Err(ArrayError::Shape(format!("{} selected positions written with {} values",
                                                 positions.len(),
                                                 rhs.len())));
        }
        for (k, &l) in positions.iter().enumerate() {
            let value = if rhs.len() == 1 { rhs[0].clone() } else { rhs[k].clone() };
            self.set_linear(l, value);
        }
        self.reclass()
    }

    /// The rank-2 transpose; the conjugate flag applies `conj` to every
    /// scalar element.
    ///
    /// # Errors
    /// `ArrayError::Shape` beyond rank 2.
    pub fn transpose(&self, conjugate: bool) -> Result<Self, ArrayError> {
        if self.rank() != 2 {
            return Err(ArrayError::Shape("transpose is defined for 2-D arrays".to_string()));
        }
        let (rows, cols) = (self.dims[0], self.dims[1]);
        let mut contents = Vec::with_capacity(self.contents.len());
        for c in 0..cols {
            for r in 0..rows {
                let v = self.contents[r * cols + c].clone();
                contents.push(match v {
                                  Value::Scalar(s) if conjugate => Value::Scalar(s.conj()),
                                  other => other,
                              });
            }
        }
        let mut result = Self::new(vec![cols, rows], contents, self.cell)?;
        result.cell = self.cell;
        Ok(result)
    }

    /// Reorders into a new shape of the same linear length, preserving
    /// column-major element order.
    ///
    /// # Errors
    /// `ArrayError::Shape` when the lengths disagree.
    pub fn reshape(&self, dims: Vec<usize>) -> Result<Self, ArrayError> {
        let mut dims = dims;
        while dims.len() < 2 {
            dims.push(1);
        }
        if numel_of(&dims) != self.numel() {
            return Err(ArrayError::Shape(format!("cannot reshape {} into {}",
                                                 shape_string(&self.dims),
                                                 shape_string(&dims))));
        }
        let fill = self.fill_value();
        let mut result = Self::filled(dims, fill);
        result.cell = self.cell;
        for l in 0..self.numel() {
            result.set_linear(l, self.get_linear(l).clone());
        }
        result.reclass()?;
        Ok(result)
    }

    /// Column-major 1-based indices of the truthy elements; rows stay rows.
    #[must_use]
    pub fn find(&self) -> Self {
        let mut indices = Vec::new();
        for l in 0..self.numel() {
            let truthy = match self.get_linear(l) {
                Value::Scalar(s) => s.is_true(),
                Value::CharString(s) => !s.text.is_empty(),
                _ => false,
            };
            if truthy {
                indices.push(Value::Scalar(Scalar::from_usize(l + 1)));
            }
        }
        if self.is_row() {
            Self::row(indices)
        } else {
            Self::column(indices)
        }
    }

    /// Reduces along the first non-singleton dimension with a scalar
    /// accumulator.
    ///
    /// # Errors
    /// `ArrayError::Type` when an element is not a scalar.
    pub fn reduce<F>(&self, init: Scalar, ctx: &MathContext, f: F) -> Result<Value, ArrayError>
        where F: Fn(&Scalar, &Scalar, &MathContext) -> Scalar
    {
        if self.is_empty() {
            return Ok(Value::Scalar(init));
        }
        let axis = self.dims.iter().position(|&d| d > 1).unwrap_or(0);
        let mut out_dims = self.dims.clone();
        out_dims[axis] = 1;

        let count = numel_of(&out_dims);
        let out_strides = col_strides(&out_dims);
        let mut contents: Vec<Scalar> = vec![init; count];

        for l in 0..self.numel() {
            let subs = linear_to_subs(&self.dims, l);
            let mut out_l = 0;
            for (j, &s) in subs.iter().enumerate() {
                let coord = if j == axis { 0 } else { s };
                out_l += coord * out_strides[j];
            }
            let element = match self.get_linear(l) {
                Value::Scalar(s) => s.clone(),
                _ => return Err(ArrayError::Type("reduction over non-numeric array".to_string())),
            };
            let updated = f(&contents[out_l], &element, ctx);
            contents[out_l] = updated;
        }

        let mut values = vec![Value::Scalar(Scalar::zero()); count];
        for (out_l, scalar) in contents.into_iter().enumerate() {
            let subs = linear_to_subs(&out_dims, out_l);
            let offset = storage_offset(&out_dims, &subs);
            values[offset] = Value::Scalar(scalar);
        }

        if count == 1 {
            return Ok(values.remove(0));
        }
        Self::new(out_dims, values, false).map(Value::Array)
    }

    /// The fill value used when the array grows: zero for numeric arrays,
    /// the empty string for string arrays, `[]` for cells.
    #[must_use]
    pub fn fill_value(&self) -> Value {
        if self.cell {
            return Value::Array(Self::empty());
        }
        match self.class {
            ElementClass::Char => Value::CharString(CharString::empty()),
            _ => Value::Scalar(Scalar::zero()),
        }
    }

    /// Consumes into a `Value`, unwrapping 1×1 non-cell arrays.
    #[must_use]
    pub fn into_value(self) -> Value {
        if !self.cell && self.numel() == 1 && self.rank() == 2 {
            return self.contents.into_iter().next().unwrap_or(Value::Array(Self::empty()));
        }
        Value::Array(self)
    }

    fn effective_dims(&self, k: usize) -> Vec<usize> {
        if k >= self.rank() {
            let mut dims = self.dims.clone();
            while dims.len() < k {
                dims.push(1);
            }
            dims
        } else {
            let mut dims: Vec<usize> = self.dims[..k - 1].to_vec();
            dims.push(self.dims[k - 1..].iter().product());
            dims
        }
    }

    fn grow_linear(&mut self, needed: usize) -> Result<(), ArrayError> {
        let fill = self.fill_value();
        if self.is_empty() {
            let mut grown = Self::filled(vec![1, needed], fill);
            grown.cell = self.cell;
            *self = grown;
            return Ok(());
        }
        if !self.is_vector() {
            return Err(ArrayError::Shape("growth along an ambiguous dimension".to_string()));
        }
        let old = std::mem::replace(self, Self::empty());
        let dims = if old.is_row() { vec![1, needed] } else { vec![needed, 1] };
        let mut grown = Self::filled(dims, fill);
        grown.cell = old.cell;
        for (k, v) in old.contents.into_iter().enumerate() {
            grown.contents[k] = v;
        }
        grown.class = old.class;
        *self = grown;
        Ok(())
    }

    fn grow_to(&mut self, new_dims: Vec<usize>) {
        let fill = self.fill_value();
        let old = std::mem::replace(self, Self::empty());
        let mut grown = Self::filled(new_dims, fill);
        grown.cell = old.cell;
        grown.class = old.class;
        for l in 0..old.numel() {
            let subs = linear_to_subs(&old.dims, l);
            let offset = storage_offset(&grown.dims, &subs);
            grown.contents[offset] = old.get_linear(l).clone();
        }
        *self = grown;
    }

    fn reclass(&mut self) -> Result<(), ArrayError> {
        if !self.cell {
            self.class = unified_class(&self.contents)?;
        }
        Ok(())
    }
}

/// Builds an array from matrix-literal rows, spreading nested arrays and
/// ranges, and verifying that all rows agree in width.
///
/// For cell rows (`{}` literals) every element is kept as one cell entry
/// with no type unification.
///
/// # Errors
/// `ArrayError::Shape` on ragged rows or blocks, `ArrayError::Type` on
/// mixed string/numeric contents.
pub fn from_rows(rows: Vec<Vec<Value>>, cell: bool) -> Result<MultiArray, ArrayError> {
    if cell {
        let width = rows.first().map_or(0, Vec::len);
        let mut contents = Vec::new();
        for row in &rows {
            if row.len() != width {
                return Err(ArrayError::Shape("cell rows differ in width".to_string()));
            }
        }
        let height = rows.len();
        for row in rows {
            contents.extend(row);
        }
        let mut array = MultiArray::new(vec![height, width], contents, true)?;
        array.cell = true;
        return Ok(array);
    }

    let mut stacked: Option<MultiArray> = None;
    for row in rows {
        let mut spread: Option<MultiArray> = None;
        for element in row {
            let block = as_block(element)?;
            if block.is_empty() {
                continue;
            }
            spread = Some(match spread {
                              None => block,
                              Some(acc) => hcat(&acc, &block)?,
                          });
        }
        let Some(row_block) = spread else { continue };
        stacked = Some(match stacked {
                           None => row_block,
                           Some(acc) => vcat(&acc, &row_block)?,
                       });
    }
    Ok(stacked.unwrap_or_else(MultiArray::empty))
}

fn as_block(value: Value) -> Result<MultiArray, ArrayError> {
    match value {
        Value::Array(a) => {
            if a.rank() > 2 {
                Err(ArrayError::Shape("only 2-D blocks can be concatenated".to_string()))
            } else {
                Ok(a)
            }
        },
        Value::Scalar(_) | Value::CharString(_) => Ok(MultiArray::from_element(value)),
        _ => Err(ArrayError::Type("this value cannot appear inside a matrix".to_string())),
    }
}

fn hcat(a: &MultiArray, b: &MultiArray) -> Result<MultiArray, ArrayError> {
    if a.dims[0] != b.dims[0] {
        return Err(ArrayError::Shape(format!("horizontal concatenation of {} and {}",
                                             shape_string(&a.dims),
                                             shape_string(&b.dims))));
    }
    let rows = a.dims[0];
    let (ac, bc) = (a.dims[1], b.dims[1]);
    let mut contents = Vec::with_capacity((ac + bc) * rows);
    for r in 0..rows {
        contents.extend_from_slice(&a.contents[r * ac..(r + 1) * ac]);
        contents.extend_from_slice(&b.contents[r * bc..(r + 1) * bc]);
    }
    MultiArray::new(vec![rows, ac + bc], contents, false)
}

fn vcat(a: &MultiArray, b: &MultiArray) -> Result<MultiArray, ArrayError> {
    if a.dims[1] != b.dims[1] {
        return Err(ArrayError::Shape(format!("vertical concatenation of {} and {}",
                                             shape_string(&a.dims),
                                             shape_string(&b.dims))));
    }
    let mut contents = a.contents.clone();
    contents.extend_from_slice(&b.contents);
    MultiArray::new(vec![a.dims[0] + b.dims[0], a.dims[1]], contents, false)
}

/// Expands `start : stride : stop` into a row vector.
///
/// A zero stride, or a stride pointing away from `stop`, yields the empty
/// 1×0 row.
///
/// # Errors
/// `ArrayError::Type` for non-finite endpoints or overlong ranges.
pub fn range(start: &Real,
             stop: &Real,
             stride: &Real,
             ctx: &MathContext)
             -> Result<MultiArray, ArrayError> {
    if !start.is_finite() || !stop.is_finite() || !stride.is_finite() {
        return Err(ArrayError::Type("range endpoints must be finite".to_string()));
    }
    if stride.is_zero() {
        return MultiArray::new(vec![1, 0], Vec::new(), false);
    }

    let span = stop.sub(start, ctx).div(stride, ctx);
    let count = match span.floor() {
        floor if floor.is_negative() => 0,
        floor => floor.to_index()
                      .map(|n| n + 1)
                      .ok_or_else(|| ArrayError::Type("range is too long".to_string()))?,
    };

    let mut contents = Vec::with_capacity(count);
    for k in 0..count {
        let offset = stride.mul(&Real::from_usize(k), ctx);
        contents.push(Value::Scalar(Scalar::real(start.add(&offset, ctx))));
    }
    MultiArray::new(vec![1, count], contents, false)
}

fn unified_class(contents: &[Value]) -> Result<ElementClass, ArrayError> {
    let mut class: Option<ElementClass> = None;
    for v in contents {
        let c = match v {
            Value::Scalar(s) => {
                if s.class == NumberClass::Logical {
                    ElementClass::Logical
                } else {
                    ElementClass::Decimal
                }
            },
            Value::CharString(_) => ElementClass::Char,
            _ => return Err(ArrayError::Type("this value cannot appear inside a matrix".to_string())),
        };
        class = Some(match (class, c) {
                         (None, c) => c,
                         (Some(ElementClass::Char), ElementClass::Char) => ElementClass::Char,
                         (Some(ElementClass::Char), _) | (_, ElementClass::Char) => {
                             return Err(ArrayError::Type("cannot mix strings and numbers".to_string()))
                         },
                         (Some(ElementClass::Logical), ElementClass::Logical) => {
                             ElementClass::Logical
                         },
                         (Some(_), _) => ElementClass::Decimal,
                     });
    }
    Ok(class.unwrap_or(ElementClass::Decimal))
}

fn mask_positions(mask: &MultiArray, length: usize) -> Result<Vec<usize>, ArrayError> {
    let mut positions = Vec::new();
    for l in 0..mask.numel() {
        let truthy = match mask.get_linear(l) {
            Value::Scalar(s) => s.is_true(),
            _ => false,
        };
        if truthy {
            if l >= length {
                return Err(ArrayError::OutOfBounds { length,
                                                     found: l + 1 });
            }
            positions.push(l);
        }
    }
    Ok(positions)
}

fn numel_of(dims: &[usize]) -> usize {
    dims.iter().product()
}

fn shape_string(dims: &[usize]) -> String {
    dims.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("x")
}

/// Column-major strides: dimension 0 varies fastest.
fn col_strides(dims: &[usize]) -> Vec<usize> {
    let mut strides = Vec::with_capacity(dims.len());
    let mut acc = 1;
    for &d in dims {
        strides.push(acc);
        acc *= d;
    }
    strides
}

/// Row-major storage offset of a 0-based subscript vector.
fn storage_offset(dims: &[usize], subs: &[usize]) -> usize {
    let mut offset = 0;
    let mut stride = 1;
    for j in (0..dims.len()).rev() {
        offset += subs[j] * stride;
        stride *= dims[j];
    }
    offset
}

/// Decomposes a 0-based column-major linear index into subscripts.
fn linear_to_subs(dims: &[usize], l: usize) -> Vec<usize> {
    let mut subs = Vec::with_capacity(dims.len());
    let mut rest = l;
    for &d in dims {
        if d == 0 {
            subs.push(0);
        } else {
            subs.push(rest % d);
            rest /= d;
        }
    }
    subs
}

fn out_dims_of(subs: &[Subscript]) -> Vec<usize> {
    let mut dims: Vec<usize> = subs.iter().map(|s| s.indices.len()).collect();
    while dims.len() < 2 {
        dims.push(1);
    }
    dims
}

/// Advances a row-major position cursor; the last coordinate varies
/// fastest.
fn advance_row_major(cursor: &mut [usize], lens: &[usize]) {
    for j in (0..cursor.len()).rev() {
        cursor[j] += 1;
        if cursor[j] < lens[j] {
            return;
        }
        cursor[j] = 0;
    }
}

/// Advances a column-major position cursor; the first coordinate varies
/// fastest.
fn advance_col_major(cursor: &mut [usize], lens: &[usize]) {
    for j in 0..cursor.len() {
        cursor[j] += 1;
        if cursor[j] < lens[j] {
            return;
        }
        cursor[j] = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scalar(n: i64) -> Value {
        Value::Scalar(Scalar::from_i64(n))
    }

    fn matrix_2x2() -> MultiArray {
        from_rows(vec![vec![scalar(1), scalar(2)], vec![scalar(3), scalar(4)]], false).unwrap()
    }

    #[test]
    fn linear_indexing_is_column_major() {
        let a = matrix_2x2();
        let sub = Subscript { indices:    vec![2],
                              row_shaped: true, };

        // column-major: 1, 3, 2, 4
        assert_eq!(a.read_linear(&sub).unwrap(), scalar(3));
    }

    #[test]
    fn subscript_reads_take_outer_products() {
        let a = matrix_2x2();
        let row = Subscript { indices:    vec![2],
                              row_shaped: true, };
        let both = Subscript { indices:    vec![1, 2],
                               row_shaped: true, };

        let picked = a.read_subscripts(&[row, both]).unwrap();
        match picked {
            Value::Array(p) => {
                assert_eq!(p.dims, vec![1, 2]);
                assert_eq!(p.contents, vec![scalar(3), scalar(4)]);
            },
            other => panic!("expected an array, got {other:?}"),
        }
    }

    #[test]
    fn out_of_bounds_writes_extend_with_fill() {
        let mut a = MultiArray::row(vec![scalar(1), scalar(2)]);
        let sub = Subscript { indices:    vec![5],
                              row_shaped: true, };

        a.write_linear(&sub, &[scalar(9)]).unwrap();

        assert_eq!(a.dims, vec![1, 5]);
        assert_eq!(a.contents,
                   vec![scalar(1), scalar(2), scalar(0), scalar(0), scalar(9)]);
    }

    #[test]
    fn matrices_refuse_ambiguous_linear_growth() {
        let mut a = matrix_2x2();
        let sub = Subscript { indices:    vec![9],
                              row_shaped: true, };

        assert!(matches!(a.write_linear(&sub, &[scalar(1)]),
                         Err(ArrayError::Shape(_))));
    }

    #[test]
    fn subscript_writes_grow_dimensions() {
        let mut a = matrix_2x2();
        let r = Subscript { indices:    vec![3],
                            row_shaped: true, };
        let c = Subscript { indices:    vec![3],
                            row_shaped: true, };

        a.write_subscripts(&[r, c], &[scalar(7)]).unwrap();

        assert_eq!(a.dims, vec![3, 3]);
        let read = Subscript { indices:    vec![3],
                               row_shaped: true, };
        assert_eq!(a.read_subscripts(&[read.clone(), read]).unwrap(), scalar(7));
        let corner = Subscript { indices:    vec![1],
                                 row_shaped: true, };
        let last_col = Subscript { indices:    vec![3],
                                   row_shaped: true, };
        assert_eq!(a.read_subscripts(&[corner, last_col]).unwrap(), scalar(0));
    }

    #[test]
    fn ranges_expand_like_matlab() {
        let ctx = MathContext::default();
        let r = range(&Real::from_i64(1), &Real::from_i64(7), &Real::from_i64(2), &ctx).unwrap();
        assert_eq!(r.dims, vec![1, 4]);

        let backwards =
            range(&Real::from_i64(5), &Real::from_i64(1), &Real::from_i64(1), &ctx).unwrap();
        assert!(backwards.is_empty());

        let down =
            range(&Real::from_i64(5), &Real::from_i64(1), &Real::from_i64(-2), &ctx).unwrap();
        assert_eq!(down.numel(), 3);
    }

    #[test]
    fn transpose_swaps_and_conjugates() {
        let a = matrix_2x2();
        let t = a.transpose(false).unwrap();

        assert_eq!(t.dims, vec![2, 2]);
        assert_eq!(t.contents, vec![scalar(1), scalar(3), scalar(2), scalar(4)]);
    }

    #[test]
    fn logical_masks_select_in_order() {
        let a = MultiArray::row(vec![scalar(10), scalar(20), scalar(30)]);
        let mask = MultiArray::row(vec![Value::Scalar(Scalar::logical(false)),
                                        Value::Scalar(Scalar::logical(true)),
                                        Value::Scalar(Scalar::logical(true))]);

        let picked = a.read_logical(&mask).unwrap();
        match picked {
            Value::Array(p) => {
                assert!(p.is_row());
                assert_eq!(p.contents, vec![scalar(20), scalar(30)]);
            },
            other => panic!("expected an array, got {other:?}"),
        }
    }
}
