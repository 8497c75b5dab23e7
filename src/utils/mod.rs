pub mod number_format;

pub use number_format::{
    format_compact_currency, format_compact_number, format_grouped, format_with_sign,
};
