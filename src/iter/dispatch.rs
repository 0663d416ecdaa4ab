//! Callback shapes accepted by the parallel iteration entry points.
//!
//! One generic entry point serves three callback arities. Which one a closure
//! uses is resolved statically from the `Fn` signature it implements, through
//! the marker type in the second parameter of [`ElementFn`]:
//!
//! | Shape          | Closure signature             |
//! |----------------|-------------------------------|
//! | [`WithOrigin`] | `Fn(&T, usize, &[T])`         |
//! | [`Indexed`]    | `Fn(&T, usize)`               |
//! | [`ElementOnly`]| `Fn(&T)`                      |
//!
//! The marker is inferred, so callers never name it. Because inference goes
//! through the trait rather than an `Fn` bound, closure parameters need type
//! annotations:
//!
//! ```rust
//! use rust_parallel_pool::iter::parallel_for;
//!
//! let data = vec![1u64, 2, 3];
//! let offset = 10u64; // extra arguments are captured
//!
//! parallel_for(|value: &u64| assert!(*value + offset > 10), 2, &data).unwrap();
//! parallel_for(|value: &u64, index: usize| assert_eq!(*value, index as u64 + 1), 2, &data).unwrap();
//! parallel_for(
//!     |value: &u64, index: usize, all: &[u64]| assert_eq!(all[index], *value),
//!     2,
//!     &data,
//! )
//! .unwrap();
//! ```
//!
//! A closure matching none of the shapes is rejected at compile time.
//!
//! Collections of pointers work the same way: iterating `&[&U]` or `&[Box<U>]`
//! hands the callback a reference to each stored pointer.

/// Marker for callbacks taking `(element)`.
#[derive(Debug)]
pub enum ElementOnly {}

/// Marker for callbacks taking `(element, index)`.
#[derive(Debug)]
pub enum Indexed {}

/// Marker for callbacks taking `(element, index, origin)`, where `origin` is
/// the whole collection being iterated.
#[derive(Debug)]
pub enum WithOrigin {}

/// A per-element callback over shared elements.
///
/// Implemented for every `Fn(&T)`, `Fn(&T, usize)` and `Fn(&T, usize, &[T])`
/// that is `Sync`; `Shape` is one of [`ElementOnly`], [`Indexed`] or
/// [`WithOrigin`].
pub trait ElementFn<T, Shape>: Sync {
    /// Calls the callback for `origin[index]`.
    fn invoke(&self, element: &T, index: usize, origin: &[T]);
}

impl<T, F> ElementFn<T, WithOrigin> for F
where
    F: Fn(&T, usize, &[T]) + Sync,
{
    #[inline]
    fn invoke(&self, element: &T, index: usize, origin: &[T]) {
        self(element, index, origin)
    }
}

impl<T, F> ElementFn<T, Indexed> for F
where
    F: Fn(&T, usize) + Sync,
{
    #[inline]
    fn invoke(&self, element: &T, index: usize, _origin: &[T]) {
        self(element, index)
    }
}

impl<T, F> ElementFn<T, ElementOnly> for F
where
    F: Fn(&T) + Sync,
{
    #[inline]
    fn invoke(&self, element: &T, _index: usize, _origin: &[T]) {
        self(element)
    }
}

/// A per-element callback with exclusive access to each element.
///
/// Implemented for every `Fn(&mut T)` and `Fn(&mut T, usize)` that is `Sync`.
/// The origin shape is not available here: handing out the whole collection
/// would alias the element being mutated.
pub trait ElementFnMut<T, Shape>: Sync {
    /// Calls the callback for the element at `index`.
    fn invoke_mut(&self, element: &mut T, index: usize);
}

impl<T, F> ElementFnMut<T, Indexed> for F
where
    F: Fn(&mut T, usize) + Sync,
{
    #[inline]
    fn invoke_mut(&self, element: &mut T, index: usize) {
        self(element, index)
    }
}

impl<T, F> ElementFnMut<T, ElementOnly> for F
where
    F: Fn(&mut T) + Sync,
{
    #[inline]
    fn invoke_mut(&self, element: &mut T, _index: usize) {
        self(element)
    }
}
