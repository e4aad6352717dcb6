use std::fmt;
use std::ops::Add;
use std::sync::Arc;

/// Read access to a focus `A` inside a structure `S`.
pub trait Getter<S, A> {
    fn get(&self, s: &S) -> A;
}

/// Write access to a focus `A` inside a structure `S`.
pub trait Setter<S, A> {
    /// Returns a copy of `s` with the focus replaced by `a`.
    fn set(&self, s: &S, a: A) -> S;

    /// Returns a copy of `s` with the focus transformed by `f`.
    fn modify<F>(&self, s: &S, f: F) -> S
    where
        Self: Getter<S, A>,
        F: FnOnce(A) -> A,
    {
        self.set(s, f(self.get(s)))
    }
}

type GetFn<S, A> = dyn Fn(&S) -> A + Send + Sync;
type SetFn<S, A> = dyn Fn(&S, A) -> S + Send + Sync;

/// A lens from `S` to `A`, built from an explicit getter and setter.
///
/// Cloning is cheap: both functions are reference counted.
pub struct Lens<S, A> {
    get: Arc<GetFn<S, A>>,
    set: Arc<SetFn<S, A>>,
}

// #26925
impl<S, A> Clone for Lens<S, A> {
    fn clone(&self) -> Self {
        Lens {
            get: Arc::clone(&self.get),
            set: Arc::clone(&self.set),
        }
    }
}

impl<S, A> fmt::Debug for Lens<S, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Lens<{}, {}>",
            std::any::type_name::<S>(),
            std::any::type_name::<A>()
        )
    }
}

impl<S: 'static, A: 'static> Lens<S, A> {
    pub fn new<G, T>(get: G, set: T) -> Lens<S, A>
    where
        G: Fn(&S) -> A + Send + Sync + 'static,
        T: Fn(&S, A) -> S + Send + Sync + 'static,
    {
        Lens {
            get: Arc::new(get),
            set: Arc::new(set),
        }
    }

    /// Lens composition: `self` focuses `A` in `S`, `inner` focuses `B` in `A`.
    pub fn compose<B: 'static>(&self, inner: Lens<A, B>) -> Lens<S, B> {
        let outer = self.clone();
        let reader = inner.clone();
        let writer = self.clone();
        Lens::new(
            move |s: &S| reader.get(&outer.get(s)),
            move |s: &S, b: B| {
                let a = writer.get(s);
                writer.set(s, inner.set(&a, b))
            },
        )
    }
}

impl<S: Clone + 'static> Lens<S, S> {
    /// The identity lens: `get` returns the whole, `set` replaces it.
    pub fn identity() -> Lens<S, S> {
        Lens::new(|s: &S| s.clone(), |_: &S, a: S| a)
    }
}

impl<S, A> Getter<S, A> for Lens<S, A> {
    fn get(&self, s: &S) -> A {
        (self.get)(s)
    }
}

impl<S, A> Setter<S, A> for Lens<S, A> {
    fn set(&self, s: &S, a: A) -> S {
        (self.set)(s, a)
    }
}

/// Operator-style composition, `outer + inner`.
impl<S: 'static, A: 'static, B: 'static> Add<Lens<A, B>> for Lens<S, A> {
    type Output = Lens<S, B>;

    fn add(self, rhs: Lens<A, B>) -> Lens<S, B> {
        self.compose(rhs)
    }
}

/// Focuses the first element of a pair.
pub fn first<A, B>() -> Lens<(A, B), A>
where
    A: Clone + 'static,
    B: Clone + 'static,
{
    Lens::new(
        |pair: &(A, B)| pair.0.clone(),
        |pair: &(A, B), a: A| (a, pair.1.clone()),
    )
}

/// Focuses the second element of a pair.
pub fn second<A, B>() -> Lens<(A, B), B>
where
    A: Clone + 'static,
    B: Clone + 'static,
{
    Lens::new(
        |pair: &(A, B)| pair.1.clone(),
        |pair: &(A, B), b: B| (pair.0.clone(), b),
    )
}
