pub mod conversions;
pub mod fixed_point;

pub use fixed_point::{
    DEFAULT_DECIMALS,
    PrecisionError,
    format_visible,
    from_fixed_point,
    parse_amount,
    to_fixed_point,
};
