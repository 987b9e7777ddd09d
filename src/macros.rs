// src/macros.rs
#[macro_export]
macro_rules! s {
    // String shorthand.
    () => {
        ::std::string::String::new()
    };
    ($expr:expr) => {
        ::std::string::String::from($expr)
    };
}

#[macro_export]
macro_rules! join {
    // Concatenate string-likes into one owned String.
    ($first:expr $(, $rest:expr)+ $(,)?) => {{
        let mut s = ::std::string::String::from($first);
        $(
            s.push_str($rest);
        )+
        s
    }};
}

/// Markup line `<b>label</b>: value`, both sides escaped.
#[macro_export]
macro_rules! bold_line {
    ($label:expr, $value:expr) => {
        $crate::join!(
            "<b>",
            &$crate::core::sanitize::escape_markup($label),
            "</b>: ",
            &$crate::core::sanitize::escape_markup($value)
        )
    };
}
