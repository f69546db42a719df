//! GraphQL scalar definitions.

use std::{fmt, marker::PhantomData, str::FromStr};

use juniper::{
    GraphQLType, InputValue, ParseScalarResult, ParseScalarValue, ScalarToken,
    ScalarValue, Value,
};

/// Helper type to use in `#[graphql(with = ..)]` attribute.
///
/// Represents the target type as a GraphQL string scalar, going through the
/// [`FromStr`]/[`Display`] impls of the `As` type, so domain types (like
/// `agreement::list::Cursor` or `user::Name`) keep their validation.
///
/// Target type must implement [`TryFrom`] and [`AsRef`] for `As` type.
///
/// [`Display`]: fmt::Display
#[derive(Debug)]
pub struct Via<As>(PhantomData<As>);

impl<As> Via<As> {
    /// Converts the target type into a scalar [`Value`] by using [`Display`]
    /// impl of `As` type.
    ///
    /// [`Display`]: fmt::Display
    pub fn to_output<T, S>(value: &T) -> Value<S>
    where
        As: fmt::Display,
        T: AsRef<As>,
        S: ScalarValue,
    {
        Value::from(value.as_ref().to_string())
    }

    /// Constructs the target type from a scalar [`InputValue`] by using
    /// [`FromStr`] impl of `As` type.
    ///
    /// # Errors
    ///
    /// If the input value is not a string, or cannot be parsed into `As` type,
    /// or the parsed `As` cannot be converted into the target type.
    pub fn from_input<T, S>(input: &InputValue<S>) -> Result<T, String>
    where
        As: FromStr,
        As::Err: fmt::Display,
        T: TryFrom<As> + GraphQLType<S, TypeInfo = ()>,
        T::Error: fmt::Display,
        S: ScalarValue,
    {
        let name = scalar_name::<T, S>();

        let s = input.as_string_value().ok_or_else(|| {
            format!("`{name}` scalar expects a string, found: {input}")
        })?;
        let parsed = s.parse::<As>().map_err(|e| {
            format!("`{name}` scalar cannot be parsed from \"{s}\": {e}")
        })?;
        T::try_from(parsed)
            .map_err(|e| format!("`{name}` scalar is invalid: {e}"))
    }

    /// Parses the provided [`ScalarToken`] as a [`String`].
    ///
    /// # Errors
    ///
    /// If the token is not a string.
    pub fn parse_token<S: ScalarValue>(
        value: ScalarToken<'_>,
    ) -> ParseScalarResult<S> {
        <String as ParseScalarValue<S>>::from_str(value)
    }
}

/// Returns the GraphQL name of the `T` scalar.
fn scalar_name<T, S>() -> &'static str
where
    T: GraphQLType<S, TypeInfo = ()>,
    S: ScalarValue,
{
    T::name(&()).unwrap_or("Unnamed")
}
