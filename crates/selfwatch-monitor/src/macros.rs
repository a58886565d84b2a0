/// Declares methods whose bodies run under the global guard.
///
/// Each method's return type `T` becomes `Option<T>`: `Some` on success,
/// `None` when the body faulted. Works in inherent and trait impls alike, so
/// an overriding method keeps dynamic dispatch.
///
/// ```
/// struct Collector {
///     pending: Vec<String>,
/// }
///
/// impl Collector {
///     selfwatch_monitor::monitored! {
///         pub fn flush(&mut self) -> usize {
///             let n = self.pending.len();
///             self.pending.clear();
///             n
///         }
///
///         fn first(&self, prefix: &str) -> String {
///             format!("{prefix}{}", self.pending[0])
///         }
///     }
/// }
///
/// let mut collector = Collector { pending: Vec::new() };
/// assert_eq!(collector.first("> "), None);
/// assert_eq!(collector.flush(), Some(0));
/// ```
///
/// Only `ident: Type` parameters are accepted; generic methods are not.
#[macro_export]
macro_rules! monitored {
    () => {};

    (
        $(#[$meta:meta])*
        $vis:vis fn $name:ident(&mut $self:ident $(, $arg:ident: $ty:ty)* $(,)?) -> $ret:ty $body:block
        $($rest:tt)*
    ) => {
        $(#[$meta])*
        $vis fn $name(&mut $self $(, $arg: $ty)*) -> ::core::option::Option<$ret> {
            $crate::run(move || $body)
        }
        $crate::monitored! { $($rest)* }
    };

    (
        $(#[$meta:meta])*
        $vis:vis fn $name:ident(&mut $self:ident $(, $arg:ident: $ty:ty)* $(,)?) $body:block
        $($rest:tt)*
    ) => {
        $(#[$meta])*
        $vis fn $name(&mut $self $(, $arg: $ty)*) -> ::core::option::Option<()> {
            $crate::run(move || $body)
        }
        $crate::monitored! { $($rest)* }
    };

    (
        $(#[$meta:meta])*
        $vis:vis fn $name:ident(&$self:ident $(, $arg:ident: $ty:ty)* $(,)?) -> $ret:ty $body:block
        $($rest:tt)*
    ) => {
        $(#[$meta])*
        $vis fn $name(&$self $(, $arg: $ty)*) -> ::core::option::Option<$ret> {
            $crate::run(move || $body)
        }
        $crate::monitored! { $($rest)* }
    };

    (
        $(#[$meta:meta])*
        $vis:vis fn $name:ident(&$self:ident $(, $arg:ident: $ty:ty)* $(,)?) $body:block
        $($rest:tt)*
    ) => {
        $(#[$meta])*
        $vis fn $name(&$self $(, $arg: $ty)*) -> ::core::option::Option<()> {
            $crate::run(move || $body)
        }
        $crate::monitored! { $($rest)* }
    };
}
