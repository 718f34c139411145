#[macro_export]
macro_rules! impl_wrap_from_many {
    ($t:ident, $m:ident, [$($var:ident),*]) => {
        $(impl From<$m::$var> for $t {
            fn from(m: $m::$var) -> Self {
                $t::$var(m)
            }
        })*
    };
}

/// Forwards a method call to whichever variant an enum of wrappers holds.
#[macro_export]
macro_rules! dispatch_variants {
    ($value:expr, $t:ident, [$($var:ident),*], $inner:ident => $call:expr) => {
        match $value {
            $($t::$var($inner) => $call,)*
        }
    };
}
