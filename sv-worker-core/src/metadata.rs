//! Filename metadata for the `tag_order.ext` convention.
//!
//! Every file in a user's folder is grouped and ordered by its name alone:
//! - `/winter.txt` → tag "winter", no order segment (order 1)
//! - `/winter_02.css` → tag "winter", order 2
//! - `/fall_2_b.png` → tag "fall", too many segments (order 1)
//!
//! The fallback to order 1 is kept explicit in [`Order`] so callers and tests
//! can see *why* a file ended up with the default.

use serde::{Deserialize, Serialize};

/// Sort key used when a filename carries no usable order.
pub const DEFAULT_ORDER: i64 = 1;

/// Base the order segment is parsed in.
///
/// `Octal` reproduces the legacy worker byte for byte: `_07` is 7, while
/// `_08` and `_09` do not parse and fall back to [`DEFAULT_ORDER`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderRadix {
    #[default]
    Decimal,
    Octal,
}

impl OrderRadix {
    fn radix(self) -> u32 {
        match self {
            OrderRadix::Decimal => 10,
            OrderRadix::Octal => 8,
        }
    }
}

/// Why a filename got the default order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackReason {
    /// `tag.ext`
    NoOrderSegment,
    /// `tag_a_b.ext`
    TooManySegments,
    /// `tag_x.ext`, or a digit outside the radix.
    Unparsable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Explicit(i64),
    Fallback(FallbackReason),
}

impl Order {
    pub fn value(&self) -> i64 {
        match self {
            Order::Explicit(n) => *n,
            Order::Fallback(_) => DEFAULT_ORDER,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Order::Fallback(_))
    }
}

/// Metadata derived from a storage path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMetadata {
    /// Path with one leading `/` removed.
    pub filename: String,
    /// Grouping key: first `_` segment of the extension-less name.
    pub tag: String,
    pub order: Order,
}

/// Parse a storage path like `/winter_02.css` into filename, tag and order.
pub fn parse_metadata(path: &str, radix: OrderRadix) -> FileMetadata {
    let filename = path.strip_prefix('/').unwrap_or(path);
    let stem = filename.split('.').next().unwrap_or_default();
    let parts: Vec<&str> = stem.split('_').collect();

    let order = match parts.as_slice() {
        [_] => Order::Fallback(FallbackReason::NoOrderSegment),
        [_, order] => match i64::from_str_radix(order, radix.radix()) {
            Ok(n) => Order::Explicit(n),
            Err(_) => Order::Fallback(FallbackReason::Unparsable),
        },
        _ => Order::Fallback(FallbackReason::TooManySegments),
    };

    FileMetadata {
        filename: filename.to_string(),
        tag: parts.first().copied().unwrap_or_default().to_string(),
        order,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decimal(path: &str) -> FileMetadata {
        parse_metadata(path, OrderRadix::Decimal)
    }

    fn octal(path: &str) -> FileMetadata {
        parse_metadata(path, OrderRadix::Octal)
    }

    #[test]
    fn strips_one_leading_separator() {
        assert_eq!(decimal("/project_01.jpg").filename, "project_01.jpg");
        assert_eq!(decimal("//project.jpg").filename, "/project.jpg");
        assert_eq!(decimal("project.jpg").filename, "project.jpg");
    }

    #[test]
    fn tag_is_first_segment_without_extension() {
        assert_eq!(decimal("/project_01.jpg").tag, "project");
        assert_eq!(decimal("/winter.txt").tag, "winter");
        assert_eq!(decimal("/fall_2_b.png").tag, "fall");
        assert_eq!(decimal("/notes.final.md").tag, "notes");
    }

    #[test]
    fn legacy_fixture_orders_as_one() {
        let meta = octal("/project_01.jpg");
        assert_eq!(meta.filename, "project_01.jpg");
        assert_eq!(meta.tag, "project");
        assert_eq!(meta.order, Order::Explicit(1));
    }

    #[test]
    fn missing_order_segment_falls_back() {
        let meta = decimal("/winter.txt");
        assert_eq!(meta.order, Order::Fallback(FallbackReason::NoOrderSegment));
        assert_eq!(meta.order.value(), 1);
    }

    #[test]
    fn extra_segments_fall_back() {
        let meta = decimal("/fall_2_b.png");
        assert_eq!(meta.order, Order::Fallback(FallbackReason::TooManySegments));
        assert_eq!(meta.order.value(), 1);
    }

    #[test]
    fn non_numeric_order_falls_back() {
        let meta = decimal("/fall_b.png");
        assert_eq!(meta.order, Order::Fallback(FallbackReason::Unparsable));
        assert_eq!(meta.order.value(), 1);

        let empty = decimal("/fall_.png");
        assert!(empty.order.is_fallback());
    }

    #[test]
    fn decimal_radix_parses_eight_and_nine() {
        assert_eq!(decimal("/fall_08.png").order, Order::Explicit(8));
        assert_eq!(decimal("/fall_09.png").order, Order::Explicit(9));
        assert_eq!(decimal("/fall_12.png").order, Order::Explicit(12));
    }

    #[test]
    fn octal_radix_rejects_eight_and_nine() {
        assert_eq!(
            octal("/fall_08.png").order,
            Order::Fallback(FallbackReason::Unparsable)
        );
        assert_eq!(octal("/fall_09.png").order.value(), 1);
    }

    #[test]
    fn octal_radix_reads_digits_in_base_eight() {
        assert_eq!(octal("/fall_07.png").order, Order::Explicit(7));
        assert_eq!(octal("/fall_10.png").order, Order::Explicit(8));
        assert_eq!(octal("/fall_12.png").order, Order::Explicit(10));
    }

    #[test]
    fn radix_deserializes_from_lowercase() {
        let radix: OrderRadix = serde_json::from_str("\"octal\"").unwrap();
        assert_eq!(radix, OrderRadix::Octal);
        assert_eq!(OrderRadix::default(), OrderRadix::Decimal);
    }
}
