// src/dd/complex_table.rs

//! Amplitude store: a deduplicated table of complex edge weights.
//!
//! Every weight that ends up on a diagram edge goes through [`ComplexTable::intern`],
//! which gives diagrams a canonical numeric alphabet: two values that agree
//! within the tolerance ε in both components share one [`ComplexHandle`].

use crate::core::{QmddError, Result};
use num_complex::Complex;
use num_traits::{One, Zero};
use std::collections::HashMap;
use std::fmt;

/// Opaque handle to an interned complex value. Copied by value, never
/// reference-counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComplexHandle(pub(crate) u32);

impl ComplexHandle {
    /// The scalar 0.
    pub const ZERO: ComplexHandle = ComplexHandle(0);
    /// The scalar 1.
    pub const ONE: ComplexHandle = ComplexHandle(1);

    /// Raw index into the store.
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ComplexHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "c{}", self.0)
    }
}

/// Tolerance-aware table of complex values.
///
/// Values are hashed into square buckets of side ε, keyed by
/// `(floor(re/ε), floor(im/ε))`. Two values within ε of each other always land
/// in the same or an adjacent bucket, so a lookup probes the 3x3 neighbourhood
/// of the query's bucket and returns the first entry within tolerance.
#[derive(Debug, Clone)]
pub struct ComplexTable {
    values: Vec<Complex<f64>>,
    buckets: HashMap<(i64, i64), Vec<ComplexHandle>>,
    tolerance: f64,
}

impl ComplexTable {
    /// Creates a store with the given tolerance. The scalars 0 and 1 are
    /// pre-interned as [`ComplexHandle::ZERO`] and [`ComplexHandle::ONE`].
    pub fn new(tolerance: f64) -> Result<Self> {
        if !(tolerance.is_finite() && tolerance > 0.0) {
            return Err(QmddError::ToleranceConfiguration { tolerance });
        }
        let mut table = Self {
            values: Vec::new(),
            buckets: HashMap::new(),
            tolerance,
        };
        table.insert(Complex::zero());
        table.insert(Complex::one());
        Ok(table)
    }

    /// The tolerance this store was built with.
    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Number of distinct values stored.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Always `false`: 0 and 1 are stored from construction.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns the handle of a stored value within ε of `value`, storing
    /// `value` first if no such entry exists.
    pub fn intern(&mut self, value: Complex<f64>) -> ComplexHandle {
        // 0 and 1 win over any other neighbour so the common cases stay exact.
        if self.approx_eq(value, Complex::zero()) {
            return ComplexHandle::ZERO;
        }
        if self.approx_eq(value, Complex::one()) {
            return ComplexHandle::ONE;
        }
        match self.lookup(value) {
            Some(handle) => handle,
            None => self.insert(value),
        }
    }

    /// The value behind a handle.
    pub fn value_of(&self, handle: ComplexHandle) -> Complex<f64> {
        self.values[handle.index()]
    }

    /// `h1 * h2`, interned.
    pub fn multiply(&mut self, h1: ComplexHandle, h2: ComplexHandle) -> ComplexHandle {
        if h1 == ComplexHandle::ZERO || h2 == ComplexHandle::ZERO {
            return ComplexHandle::ZERO;
        }
        if h1 == ComplexHandle::ONE {
            return h2;
        }
        if h2 == ComplexHandle::ONE {
            return h1;
        }
        let product = self.value_of(h1) * self.value_of(h2);
        self.intern(product)
    }

    /// `h1 + h2`, interned.
    pub fn add(&mut self, h1: ComplexHandle, h2: ComplexHandle) -> ComplexHandle {
        if h1 == ComplexHandle::ZERO {
            return h2;
        }
        if h2 == ComplexHandle::ZERO {
            return h1;
        }
        let sum = self.value_of(h1) + self.value_of(h2);
        self.intern(sum)
    }

    /// `h1 / h2`, interned. Division by zero yields zero.
    pub fn divide(&mut self, h1: ComplexHandle, h2: ComplexHandle) -> ComplexHandle {
        if h1 == ComplexHandle::ZERO || h2 == ComplexHandle::ZERO {
            return ComplexHandle::ZERO;
        }
        if h2 == ComplexHandle::ONE {
            return h1;
        }
        if h1 == h2 {
            return ComplexHandle::ONE;
        }
        let quotient = self.value_of(h1) / self.value_of(h2);
        self.intern(quotient)
    }

    /// Complex conjugate, interned.
    pub fn conj(&mut self, handle: ComplexHandle) -> ComplexHandle {
        let value = self.value_of(handle);
        if value.im == 0.0 {
            return handle;
        }
        self.intern(value.conj())
    }

    /// Interns a real scalar.
    pub fn real(&mut self, value: f64) -> ComplexHandle {
        self.intern(Complex::new(value, 0.0))
    }

    /// `|value|^2` of a stored value.
    pub fn magnitude_sqr(&self, handle: ComplexHandle) -> f64 {
        self.value_of(handle).norm_sqr()
    }

    /// Whether the handle is the canonical zero.
    pub fn is_zero(&self, handle: ComplexHandle) -> bool {
        handle == ComplexHandle::ZERO
    }

    /// Tolerance comparison used for every lookup.
    pub fn approx_eq(&self, a: Complex<f64>, b: Complex<f64>) -> bool {
        (a.re - b.re).abs() < self.tolerance && (a.im - b.im).abs() < self.tolerance
    }

    fn bucket_key(&self, value: Complex<f64>) -> (i64, i64) {
        // `as` saturates on overflow, which only merges far-out buckets.
        (
            (value.re / self.tolerance).floor() as i64,
            (value.im / self.tolerance).floor() as i64,
        )
    }

    fn lookup(&self, value: Complex<f64>) -> Option<ComplexHandle> {
        let (kr, ki) = self.bucket_key(value);
        for dr in -1..=1i64 {
            for di in -1..=1i64 {
                let key = (kr.saturating_add(dr), ki.saturating_add(di));
                if let Some(bucket) = self.buckets.get(&key) {
                    let hit = bucket
                        .iter()
                        .copied()
                        .find(|h| self.approx_eq(self.values[h.index()], value));
                    if hit.is_some() {
                        return hit;
                    }
                }
            }
        }
        None
    }

    fn insert(&mut self, value: Complex<f64>) -> ComplexHandle {
        let handle = ComplexHandle(self.values.len() as u32);
        self.values.push(value);
        let key = self.bucket_key(value);
        self.buckets.entry(key).or_default().push(handle);
        handle
    }
}
