//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects have **no identity**; two instances with the same attribute
/// values are interchangeable. Currencies and units of measure are modelled
/// this way: the code `"EUR"` with two decimal digits is the same currency
/// wherever it appears.
///
/// ```ignore
/// #[derive(Debug, Clone, PartialEq, Eq)]
/// struct Currency {
///     code: String,
///     digits: u32,
/// }
///
/// impl ValueObject for Currency {}
/// ```
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
