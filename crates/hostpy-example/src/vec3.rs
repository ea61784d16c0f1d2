//! `vec3`: a list-like vector of three floats.
//!
//! Arguments to operators and methods can be numbers (broadcast to all three
//! components), other `vec3`s, or any sequence of three float-convertible
//! items. Arithmetic follows IEEE semantics: division by zero yields
//! infinities and `%` is the C `fmod`, not Python's floored modulo.

use std::fmt;

use hostpy::{Marshal, check_index, expect_from_python_sequence, iterate_sequence, type_name};
use pyo3::IntoPyObjectExt;
use pyo3::exceptions::{PyTypeError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::{PyFloat, PyIterator, PyList, PySlice};

const LEN: usize = 3;

/// Class vec3 implementation.
///
/// It behaves like a list of floats of length 3. Indexing accepts integers
/// and slices; assigning to a slice must keep the length at 3.
#[pyclass(name = "vec3", module = "example", sequence)]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec3 {
    v: [f64; LEN],
}

/// Right-hand side of an arithmetic operator.
#[derive(Debug, Clone, Copy)]
enum Operand {
    Scalar(f64),
    Vector([f64; LEN]),
}

impl Operand {
    fn extract(arg: &Bound<'_, PyAny>) -> PyResult<Self> {
        if let Some(x) = f64::from_python(arg) {
            return Ok(Self::Scalar(x));
        }
        vector_arg(arg).map(Self::Vector).map_err(|_| {
            PyTypeError::new_err(format!(
                "Illegal argument to vec3 operator, expected number or sequence of length 3, got {}",
                type_name(arg)
            ))
        })
    }

    fn components(self) -> [f64; LEN] {
        match self {
            Self::Scalar(x) => [x; LEN],
            Self::Vector(v) => v,
        }
    }
}

/// A vec3 or a sequence of exactly three floats.
fn vector_arg(arg: &Bound<'_, PyAny>) -> PyResult<[f64; LEN]> {
    if let Ok(other) = arg.downcast::<Vec3>() {
        return Ok(other.try_borrow()?.v);
    }
    let mut v = [0.0; LEN];
    expect_from_python_sequence(arg, &mut v)?;
    Ok(v)
}

/// Components addressed by an index or a slice.
enum Selection {
    One(usize),
    Many(Vec<usize>),
}

fn select(index: &Bound<'_, PyAny>) -> PyResult<Selection> {
    if let Ok(slice) = index.downcast::<PySlice>() {
        let range = slice.indices(LEN as isize)?;
        let positions = (0..range.slicelength)
            .map(|i| (range.start + i as isize * range.step) as usize)
            .collect();
        return Ok(Selection::Many(positions));
    }
    let Ok(index) = index.extract::<isize>() else {
        return Err(PyTypeError::new_err(format!(
            "vec3 indices must be integers or slices, not {}",
            type_name(index)
        )));
    };
    let index = if index < 0 { index + LEN as isize } else { index };
    check_index(index, LEN as isize)?;
    Ok(Selection::One(index as usize))
}

/// Every item of a vec3 or a sequence of floats.
fn float_items(arg: &Bound<'_, PyAny>) -> PyResult<Vec<f64>> {
    if let Ok(other) = arg.downcast::<Vec3>() {
        return Ok(other.try_borrow()?.v.to_vec());
    }
    let mut values = Vec::with_capacity(LEN);
    let mut failure = None;
    iterate_sequence(arg, |item| match f64::expect_from_python(item) {
        Ok(x) => {
            values.push(x);
            true
        }
        Err(e) => {
            failure = Some(e);
            false
        }
    })?;
    match failure {
        Some(err) => Err(err.into()),
        None => Ok(values),
    }
}

fn combine(lhs: [f64; LEN], rhs: [f64; LEN], op: impl Fn(f64, f64) -> f64) -> [f64; LEN] {
    std::array::from_fn(|i| op(lhs[i], rhs[i]))
}

fn dot(a: [f64; LEN], b: [f64; LEN]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

impl Vec3 {
    /// A vector from its components.
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { v: [x, y, z] }
    }

    /// The components.
    pub fn components(&self) -> [f64; LEN] {
        self.v
    }

    fn parse(arg: &Bound<'_, PyAny>) -> PyResult<[f64; LEN]> {
        if let Some(x) = f64::from_python(arg) {
            return Ok([x; LEN]);
        }
        let values = float_items(arg)?;
        if values.len() > LEN {
            return Err(PyTypeError::new_err(format!(
                "Sequence {} with length {} is too long for vec3",
                type_name(arg),
                values.len()
            )));
        }
        let mut v = [0.0; LEN];
        v[..values.len()].copy_from_slice(&values);
        Ok(v)
    }

    fn length(&self) -> f64 {
        self.length_squared().sqrt()
    }

    fn length_squared(&self) -> f64 {
        dot(self.v, self.v)
    }

    fn apply(&mut self, f: impl Fn(f64) -> f64) {
        self.v = self.v.map(f);
    }

    fn binary(&self, other: &Bound<'_, PyAny>, op: impl Fn(f64, f64) -> f64) -> PyResult<Self> {
        let rhs = Operand::extract(other)?.components();
        Ok(Self {
            v: combine(self.v, rhs, op),
        })
    }

    fn reflected(&self, other: &Bound<'_, PyAny>, op: impl Fn(f64, f64) -> f64) -> PyResult<Self> {
        let lhs = Operand::extract(other)?.components();
        Ok(Self {
            v: combine(lhs, self.v, op),
        })
    }

    fn in_place(
        slf: &Bound<'_, Self>,
        other: &Bound<'_, PyAny>,
        op: impl Fn(f64, f64) -> f64,
    ) -> PyResult<()> {
        let rhs = Operand::extract(other)?.components();
        let mut this = slf.try_borrow_mut()?;
        this.v = combine(this.v, rhs, op);
        Ok(())
    }

    fn rotate(&mut self, degree: f64, axes: (usize, usize)) {
        let (a, b) = axes;
        let (sin, cos) = degree.to_radians().sin_cos();
        let va = self.v[a] * cos - self.v[b] * sin;
        let vb = self.v[a] * sin + self.v[b] * cos;
        self.v[a] = va;
        self.v[b] = vb;
    }
}

/// `%g`-style formatting: six significant digits, trailing zeros dropped.
fn format_g(x: f64) -> String {
    if x.is_nan() {
        return "nan".to_string();
    }
    if x.is_infinite() {
        return if x > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    if x == 0.0 {
        return if x.is_sign_negative() { "-0" } else { "0" }.to_string();
    }

    const PRECISION: i32 = 6;
    let sci = format!("{:.*e}", (PRECISION - 1) as usize, x);
    let Some((mantissa, exp)) = sci.split_once('e') else {
        return sci;
    };
    let Ok(exp) = exp.parse::<i32>() else {
        return sci;
    };

    if exp < -4 || exp >= PRECISION {
        let sign = if exp < 0 { '-' } else { '+' };
        format!("{}e{sign}{:02}", trim_fraction(mantissa), exp.abs())
    } else {
        let decimals = (PRECISION - 1 - exp) as usize;
        trim_fraction(&format!("{x:.decimals$}")).to_string()
    }
}

fn trim_fraction(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}

impl fmt::Display for Vec3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "vec3({}, {}, {})",
            format_g(self.v[0]),
            format_g(self.v[1]),
            format_g(self.v[2])
        )
    }
}

#[pymethods]
impl Vec3 {
    #[new]
    #[pyo3(signature = (arg = None))]
    fn py_new(arg: Option<&Bound<'_, PyAny>>) -> PyResult<Self> {
        match arg {
            Some(arg) => Ok(Self { v: Self::parse(arg)? }),
            None => Ok(Self::default()),
        }
    }

    fn __str__(&self) -> String {
        self.to_string()
    }

    fn __repr__(&self) -> String {
        self.to_string()
    }

    // ---- x, y, z properties ----

    /// The x component.
    #[getter]
    fn x(&self) -> f64 {
        self.v[0]
    }

    #[setter]
    fn set_x(&mut self, value: &Bound<'_, PyAny>) -> PyResult<()> {
        self.v[0] = f64::expect_from_python(value)?;
        Ok(())
    }

    /// The y component.
    #[getter]
    fn y(&self) -> f64 {
        self.v[1]
    }

    #[setter]
    fn set_y(&mut self, value: &Bound<'_, PyAny>) -> PyResult<()> {
        self.v[1] = f64::expect_from_python(value)?;
        Ok(())
    }

    /// The z component.
    #[getter]
    fn z(&self) -> f64 {
        self.v[2]
    }

    #[setter]
    fn set_z(&mut self, value: &Bound<'_, PyAny>) -> PyResult<()> {
        self.v[2] = f64::expect_from_python(value)?;
        Ok(())
    }

    // ---- list-like ----

    fn __len__(&self) -> usize {
        LEN
    }

    fn __getitem__<'py>(
        &self,
        py: Python<'py>,
        index: &Bound<'py, PyAny>,
    ) -> PyResult<Bound<'py, PyAny>> {
        match select(index)? {
            Selection::One(i) => self.v[i].into_bound_py_any(py),
            Selection::Many(positions) => {
                Ok(PyList::new(py, positions.iter().map(|&i| self.v[i]))?.into_any())
            }
        }
    }

    fn __setitem__(
        slf: &Bound<'_, Self>,
        index: &Bound<'_, PyAny>,
        value: &Bound<'_, PyAny>,
    ) -> PyResult<()> {
        match select(index)? {
            Selection::One(i) => {
                let x = f64::expect_from_python(value)?;
                slf.try_borrow_mut()?.v[i] = x;
            }
            Selection::Many(positions) => {
                let values = float_items(value)?;
                if values.len() != positions.len() {
                    return Err(PyValueError::new_err(format!(
                        "attempt to assign sequence of size {} to slice of size {} of vec3",
                        values.len(),
                        positions.len()
                    )));
                }
                let mut this = slf.try_borrow_mut()?;
                for (i, x) in positions.into_iter().zip(values) {
                    this.v[i] = x;
                }
            }
        }
        Ok(())
    }

    fn __contains__(&self, item: &Bound<'_, PyAny>) -> bool {
        f64::from_python(item).is_some_and(|x| self.v.contains(&x))
    }

    fn __iter__<'py>(slf: &Bound<'py, Self>) -> PyResult<Bound<'py, PyIterator>> {
        let items = PyList::new(slf.py(), slf.try_borrow()?.v)?;
        items.as_any().try_iter()
    }

    /// Equal to another vec3 or a sequence of three equal floats.
    fn __eq__(&self, other: &Bound<'_, PyAny>) -> bool {
        match vector_arg(other) {
            Ok(v) => self.v == v,
            Err(_) => false,
        }
    }

    // ---- unary ops ----

    fn __abs__(&self) -> Self {
        Self {
            v: self.v.map(f64::abs),
        }
    }

    fn __neg__(&self) -> Self {
        Self {
            v: self.v.map(|x| -x),
        }
    }

    /// Rounds every component like the builtin `round`.
    #[pyo3(signature = (ndigits = None))]
    fn __round__(&self, py: Python<'_>, ndigits: Option<&Bound<'_, PyAny>>) -> PyResult<Self> {
        let Some(ndigits) = ndigits else {
            return Ok(Self {
                v: self.v.map(f64::round_ties_even),
            });
        };
        let mut v = self.v;
        for x in &mut v {
            *x = PyFloat::new(py, *x)
                .call_method1("__round__", (ndigits,))?
                .extract()?;
        }
        Ok(Self { v })
    }

    // ---- arithmetic ----

    fn __add__(&self, other: &Bound<'_, PyAny>) -> PyResult<Self> {
        self.binary(other, |l, r| l + r)
    }

    fn __radd__(&self, other: &Bound<'_, PyAny>) -> PyResult<Self> {
        self.reflected(other, |l, r| l + r)
    }

    fn __iadd__(slf: &Bound<'_, Self>, other: &Bound<'_, PyAny>) -> PyResult<()> {
        Self::in_place(slf, other, |l, r| l + r)
    }

    fn __sub__(&self, other: &Bound<'_, PyAny>) -> PyResult<Self> {
        self.binary(other, |l, r| l - r)
    }

    fn __rsub__(&self, other: &Bound<'_, PyAny>) -> PyResult<Self> {
        self.reflected(other, |l, r| l - r)
    }

    fn __isub__(slf: &Bound<'_, Self>, other: &Bound<'_, PyAny>) -> PyResult<()> {
        Self::in_place(slf, other, |l, r| l - r)
    }

    fn __mul__(&self, other: &Bound<'_, PyAny>) -> PyResult<Self> {
        self.binary(other, |l, r| l * r)
    }

    fn __rmul__(&self, other: &Bound<'_, PyAny>) -> PyResult<Self> {
        self.reflected(other, |l, r| l * r)
    }

    fn __imul__(slf: &Bound<'_, Self>, other: &Bound<'_, PyAny>) -> PyResult<()> {
        Self::in_place(slf, other, |l, r| l * r)
    }

    fn __truediv__(&self, other: &Bound<'_, PyAny>) -> PyResult<Self> {
        self.binary(other, |l, r| l / r)
    }

    fn __rtruediv__(&self, other: &Bound<'_, PyAny>) -> PyResult<Self> {
        self.reflected(other, |l, r| l / r)
    }

    fn __itruediv__(slf: &Bound<'_, Self>, other: &Bound<'_, PyAny>) -> PyResult<()> {
        Self::in_place(slf, other, |l, r| l / r)
    }

    fn __mod__(&self, other: &Bound<'_, PyAny>) -> PyResult<Self> {
        self.binary(other, |l, r| l % r)
    }

    fn __rmod__(&self, other: &Bound<'_, PyAny>) -> PyResult<Self> {
        self.reflected(other, |l, r| l % r)
    }

    fn __imod__(slf: &Bound<'_, Self>, other: &Bound<'_, PyAny>) -> PyResult<()> {
        Self::in_place(slf, other, |l, r| l % r)
    }

    // ---- public API ----

    /// set(number or sequence) -> self
    ///
    /// A number sets all components; shorter sequences are padded with zeros.
    fn set<'py>(slf: &Bound<'py, Self>, arg: &Bound<'py, PyAny>) -> PyResult<Bound<'py, Self>> {
        let v = Self::parse(arg)?;
        slf.try_borrow_mut()?.v = v;
        Ok(slf.clone())
    }

    /// Returns a copy of the vector.
    fn copy(&self) -> Self {
        *self
    }

    /// Returns cartesian length of vector.
    #[pyo3(name = "length")]
    fn py_length(&self) -> f64 {
        self.length()
    }

    /// Returns the square of the cartesian length of vector.
    #[pyo3(name = "length_squared")]
    fn py_length_squared(&self) -> f64 {
        self.length_squared()
    }

    /// Returns the cartesian distance between self and other vector.
    fn distance(&self, other: &Bound<'_, PyAny>) -> PyResult<f64> {
        Ok(self.distance_squared(other)?.sqrt())
    }

    /// Returns the square of the cartesian distance between self and other vector.
    fn distance_squared(&self, other: &Bound<'_, PyAny>) -> PyResult<f64> {
        let d = combine(vector_arg(other)?, self.v, |l, r| l - r);
        Ok(dot(d, d))
    }

    /// Returns the dot product of self and other vec3.
    #[pyo3(name = "dot")]
    fn py_dot(&self, other: &Bound<'_, PyAny>) -> PyResult<f64> {
        Ok(dot(self.v, vector_arg(other)?))
    }

    // ---- in-place methods, returning self ----

    /// Applies floor() to all elements, INPLACE.
    fn floor<'py>(slf: &Bound<'py, Self>) -> PyResult<Bound<'py, Self>> {
        slf.try_borrow_mut()?.apply(f64::floor);
        Ok(slf.clone())
    }

    /// Applies floor(x + .5) to all elements, INPLACE.
    fn round<'py>(slf: &Bound<'py, Self>) -> PyResult<Bound<'py, Self>> {
        slf.try_borrow_mut()?.apply(|x| (x + 0.5).floor());
        Ok(slf.clone())
    }

    /// Makes the vector length 1, INPLACE.
    fn normalize<'py>(slf: &Bound<'py, Self>) -> PyResult<Bound<'py, Self>> {
        {
            let mut this = slf.try_borrow_mut()?;
            let len = this.length();
            this.apply(|x| x / len);
        }
        Ok(slf.clone())
    }

    /// Makes the vector length 1, INPLACE; a zero vector is left alone.
    fn normalize_safe<'py>(slf: &Bound<'py, Self>) -> PyResult<Bound<'py, Self>> {
        {
            let mut this = slf.try_borrow_mut()?;
            let len = this.length();
            if len != 0.0 {
                this.apply(|x| x / len);
            }
        }
        Ok(slf.clone())
    }

    /// Makes this vector the cross-product of this and other, INPLACE.
    fn cross<'py>(slf: &Bound<'py, Self>, other: &Bound<'py, PyAny>) -> PyResult<Bound<'py, Self>> {
        let o = vector_arg(other)?;
        {
            let mut this = slf.try_borrow_mut()?;
            let [x, y, z] = this.v;
            this.v = [y * o[2] - z * o[1], z * o[0] - x * o[2], x * o[1] - y * o[0]];
        }
        Ok(slf.clone())
    }

    /// Rotates this vector around the x-axis by `degree`, INPLACE.
    fn rotate_x<'py>(slf: &Bound<'py, Self>, degree: f64) -> PyResult<Bound<'py, Self>> {
        slf.try_borrow_mut()?.rotate(degree, (1, 2));
        Ok(slf.clone())
    }

    /// Rotates this vector around the y-axis by `degree`, INPLACE.
    fn rotate_y<'py>(slf: &Bound<'py, Self>, degree: f64) -> PyResult<Bound<'py, Self>> {
        slf.try_borrow_mut()?.rotate(degree, (2, 0));
        Ok(slf.clone())
    }

    /// Rotates this vector around the z-axis by `degree`, INPLACE.
    fn rotate_z<'py>(slf: &Bound<'py, Self>, degree: f64) -> PyResult<Bound<'py, Self>> {
        slf.try_borrow_mut()?.rotate(degree, (0, 1));
        Ok(slf.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn g_formatting() {
        assert_eq!(format_g(1.0), "1");
        assert_eq!(format_g(-2.0), "-2");
        assert_eq!(format_g(0.0), "0");
        assert_eq!(format_g(0.5), "0.5");
        assert_eq!(format_g(std::f64::consts::FRAC_1_SQRT_2), "0.707107");
        assert_eq!(format_g(123456.0), "123456");
        assert_eq!(format_g(1234567.0), "1.23457e+06");
        assert_eq!(format_g(0.0001), "0.0001");
        assert_eq!(format_g(0.00001), "1e-05");
        assert_eq!(format_g(f64::INFINITY), "inf");
    }

    #[test]
    fn display_uses_g_format() {
        assert_eq!(Vec3::new(1.0, 2.5, -3.0).to_string(), "vec3(1, 2.5, -3)");
    }

    #[test]
    fn rotation_axes() {
        let mut v = Vec3::new(1.0, 2.0, 3.0);
        v.rotate(90.0, (1, 2));
        let rounded = v.v.map(f64::round);
        assert_eq!(rounded, [1.0, -3.0, 2.0]);

        let mut v = Vec3::new(1.0, 2.0, 3.0);
        v.rotate(90.0, (2, 0));
        assert_eq!(v.v.map(f64::round), [3.0, 2.0, -1.0]);

        let mut v = Vec3::new(1.0, 2.0, 3.0);
        v.rotate(90.0, (0, 1));
        assert_eq!(v.v.map(f64::round), [-2.0, 1.0, 3.0]);
    }

    #[test]
    fn combine_and_dot() {
        assert_eq!(combine([1.0, 2.0, 3.0], [4.0; 3], |l, r| l * r), [4.0, 8.0, 12.0]);
        assert_eq!(dot([1.0, 2.0, 3.0], [4.0, 5.0, 6.0]), 32.0);
    }
}
