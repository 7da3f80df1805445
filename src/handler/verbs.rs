use super::{Context, Handler, Verb};
use crate::error::Result;

type BoxFn<S> = Box<dyn Fn(&mut Context<'_, S>) -> Result + Send + Sync>;

/// A handler built from one function per verb.
///
/// Verbs without a function answer with `405 Method Not Allowed`. A `HEAD`
/// request falls back to the `GET` function.
///
pub struct Verbs<S> {
    allowed: Vec<(Verb, BoxFn<S>)>,
}

macro_rules! verbs_factory {
    ( $( $vis:vis fn $name:ident($verb:ident) ),* $(,)? ) => {
        $(
            #[doc = docs_for!($verb)]
            $vis fn $name<S, F>(f: F) -> Verbs<S>
            where
                F: Fn(&mut Context<'_, S>) -> Result + Send + Sync + 'static,
            {
                Verbs::new(Verb::$verb, f)
            }
        )*
    };
}

macro_rules! docs_for {
    ($verb:ident) => {
        concat!(
            "Respond to `",
            stringify!($verb),
            "` requests with the provided function."
        )
    };
}

macro_rules! extend_verbs {
    ( $( $vis:vis fn $name:ident($verb:ident) ),* $(,)? ) => {
        $(
            #[doc = docs_for!($verb)]
            $vis fn $name<F>(mut self, f: F) -> Self
            where
                F: Fn(&mut Context<'_, S>) -> Result + Send + Sync + 'static,
            {
                self.allowed.push((Verb::$verb, Box::new(f)));
                self
            }
        )*
    };
}

macro_rules! respond_to {
    ( $( fn $name:ident($verb:ident) ),* $(,)? ) => {
        $(
            fn $name(&self, cx: &mut Context<'_, S>) -> Result {
                match self.respond_to(Verb::$verb) {
                    Some(f) => f(cx),
                    None => <Unimplemented as Handler<S>>::$name(&Unimplemented, cx),
                }
            }
        )*
    };
}

verbs_factory!(
    pub fn delete(Delete),
    pub fn get(Get),
    pub fn head(Head),
    pub fn options(Options),
    pub fn patch(Patch),
    pub fn post(Post),
    pub fn put(Put),
);

/// Answers every verb with the default of [`Handler`].
///
struct Unimplemented;

impl<S> Verbs<S> {
    extend_verbs!(
        pub fn delete(Delete),
        pub fn get(Get),
        pub fn head(Head),
        pub fn options(Options),
        pub fn patch(Patch),
        pub fn post(Post),
        pub fn put(Put),
    );
}

impl<S> Verbs<S> {
    fn new<F>(verb: Verb, f: F) -> Self
    where
        F: Fn(&mut Context<'_, S>) -> Result + Send + Sync + 'static,
    {
        Self {
            allowed: vec![(verb, Box::new(f))],
        }
    }

    fn respond_to(&self, verb: Verb) -> Option<&BoxFn<S>> {
        self.allowed
            .iter()
            .find_map(|(allow, f)| (*allow == verb).then_some(f))
    }
}

impl<S> Handler<S> for Unimplemented {}

impl<S: 'static> Handler<S> for Verbs<S> {
    respond_to!(
        fn get(Get),
        fn post(Post),
        fn put(Put),
        fn patch(Patch),
        fn delete(Delete),
        fn options(Options),
    );

    fn head(&self, cx: &mut Context<'_, S>) -> Result {
        match self.respond_to(Verb::Head) {
            Some(f) => f(cx),
            None => self.get(cx),
        }
    }
}
