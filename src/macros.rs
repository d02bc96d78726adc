#[macro_export]
macro_rules! regex {
    ($pat:literal) => {{
        static RE: once_cell::sync::Lazy<regex::Regex> =
            once_cell::sync::Lazy::new(|| regex::Regex::new($pat).unwrap());
        &*RE
    }};
}

/// Declarative spelling for a [`Container`](crate::Container) tree.
///
/// Only `name:` is required; the remaining fields mirror the builder
/// methods and must appear in the order shown, each at most once.
#[macro_export]
macro_rules! container {
    (
        name: $name:expr
        $(, pattern: $pattern:expr)?
        $(, representative: $representative:expr)?
        $(, infer_type: $infer_type:expr)?
        $(, assumptions: $assumptions:expr)?
        $(, sub: [ $($sub:expr),* $(,)? ])?
        $(,)?
    ) => {{
        #[allow(unused_mut)]
        let mut container = $crate::Container::new($name);
        $(container = container.pattern($pattern);)?
        $(container = container.representative($representative);)?
        $(container = container.infer_type($infer_type);)?
        $(container = container.assumptions($assumptions);)?
        $($(container = container.sub($sub);)*)?
        container
    }};
}
