//! Terminal coloring.
//!
//! Coloring goes through the [colored](https://docs.rs/colored) crate, but only when the
//! `color` Cargo feature is enabled.
//! Code calls methods on the [Colorize] trait in this module either way;
//! without the feature the methods return the string unchanged.
//!
//! ```
//! use texpand_stdext::color::Colorize;
//! println!["{}", "Error".bold().bright_red()];
//! ```

#[cfg(feature = "color")]
pub type ColoredString = colored::ColoredString;

#[cfg(not(feature = "color"))]
pub type ColoredString = String;

macro_rules! colorize_impl {
    ( $( $method_name: ident, )+ ) => {
        /// Coloring methods on strings.
        pub trait Colorize {
            $(
                fn $method_name(self) -> ColoredString;
            )+
        }
        #[cfg(feature="color")]
        impl Colorize for ColoredString {
            $(
                fn $method_name(self) -> ColoredString {
                    colored::Colorize::$method_name(self)
                }
            )+
        }
        #[cfg(feature="color")]
        impl Colorize for &str {
            $(
                fn $method_name(self) -> ColoredString {
                    colored::Colorize::$method_name(self)
                }
            )+
        }
        #[cfg(feature="color")]
        impl Colorize for &String {
            $(
                fn $method_name(self) -> ColoredString {
                    colored::Colorize::$method_name(self.as_str())
                }
            )+
        }
        #[cfg(not(feature="color"))]
        impl Colorize for String {
            $(
                fn $method_name(self) -> ColoredString {
                    self
                }
            )+
        }
        #[cfg(not(feature="color"))]
        impl Colorize for &str {
            $(
                fn $method_name(self) -> ColoredString {
                    self.to_string()
                }
            )+
        }
        #[cfg(not(feature="color"))]
        impl Colorize for &String {
            $(
                fn $method_name(self) -> ColoredString {
                    self.clone()
                }
            )+
        }
    };
}

colorize_impl!(
    bold,
    bright_cyan,
    bright_blue,
    bright_red,
    bright_yellow,
    yellow,
    italic,
);
