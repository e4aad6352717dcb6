//! Optics: composable, purely functional accessors.
//!
//! A [`Lens<S, A>`] focuses on a part `A` of a whole `S`. Reading through a lens
//! never mutates anything and writing produces a new `S`.
//!
//! ```text
//! Lens<S, A> + Lens<A, B> = Lens<S, B>
//! ```
//!
//! Lenses are expected to be law-abiding:
//! - get-set: `get(&set(&s, a)) == a`
//! - set-get: `set(&s, get(&s)) == s`
//!
//! Nothing validates these laws at runtime; the author of a lens is responsible
//! for them.

mod lens;

pub use lens::{first, second, Getter, Lens, Setter};
