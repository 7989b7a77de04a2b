//! Argument pipeline.
//!
//! Converts the raw tokens that follow a command name into an ordered list of
//! typed values, one per declared [`Parameter`]. Values are
//! [`serde_json::Value`]s so that converters for arbitrary domain types can
//! be stored in one registry keyed by [`TypeTag`].
//!
//! # Algorithm
//!
//! Parameters are processed left to right, each consuming one token:
//!
//! 1. a rest parameter joins this and all remaining tokens with single spaces
//!    (possibly none, giving `""`) and stops processing
//! 2. no token left: a required parameter fails with `MissingArgument`, an
//!    optional one stops processing (later slots stay unset)
//! 3. a `string` parameter takes the token verbatim
//! 4. anything else goes through the registered converter; a falsy result
//!    (`null`, `false`, `0`, `""`) is a `ConversionFailed`
//!
//! Tokens left over after the last parameter are ignored.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::trace;

use herald_core::MessageEvent;

use crate::command::{Parameter, TypeTag};
use crate::error::{DispatchError, DispatchResult};
use crate::registry::Registry;

/// Converted arguments, aligned to parameter order.
///
/// May hold fewer values than the command declares parameters when trailing
/// optional parameters had no tokens.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Args(Vec<Value>);

impl Args {
    /// Wraps already converted values.
    pub fn new(values: Vec<Value>) -> Self {
        Self(values)
    }

    /// Returns the number of values that were set.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if no value was set.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the raw value at `index`.
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.0.get(index)
    }

    /// Returns the value at `index` if it is a string.
    pub fn str(&self, index: usize) -> Option<&str> {
        self.get(index).and_then(Value::as_str)
    }

    /// Deserializes the value at `index`.
    ///
    /// Returns `Ok(None)` when the slot is unset.
    pub fn parse<T: DeserializeOwned>(&self, index: usize) -> serde_json::Result<Option<T>> {
        self.get(index)
            .map(|value| T::deserialize(value))
            .transpose()
    }

    /// Iterates over the set values in order.
    pub fn iter(&self) -> impl Iterator<Item = &Value> {
        self.0.iter()
    }

    /// Unwraps the values.
    pub fn into_inner(self) -> Vec<Value> {
        self.0
    }
}

impl From<Vec<Value>> for Args {
    fn from(values: Vec<Value>) -> Self {
        Self(values)
    }
}

/// Returns `true` if a converted value counts as "no result".
///
/// Zero and the empty string are falsy even though a converter may return
/// them deliberately; such results are reported as `ConversionFailed`.
pub fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f == 0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    }
}

/// Splits the text after the prefix into the invocation name and its
/// argument tokens.
///
/// Splitting is on single spaces, so repeated spaces produce empty tokens.
pub fn tokenize(input: &str) -> (&str, Vec<&str>) {
    match input.split_once(' ') {
        Some((name, rest)) => (name, rest.split(' ').collect()),
        None => (input, Vec::new()),
    }
}

/// Runs the argument pipeline for one invocation.
pub async fn convert_arguments(
    params: &[Parameter],
    tokens: &[&str],
    event: &Arc<MessageEvent>,
    registry: &Registry,
) -> DispatchResult<Args> {
    let mut values = Vec::with_capacity(params.len());

    for (index, param) in params.iter().enumerate() {
        if param.is_rest() {
            let rest = tokens.get(index..).unwrap_or_default();
            values.push(Value::String(rest.join(" ")));
            break;
        }

        let Some(&token) = tokens.get(index) else {
            if param.is_optional() {
                trace!(index, "no token for optional parameter, stopping");
                break;
            }
            return Err(DispatchError::MissingArgument { index });
        };

        if *param.type_tag() == TypeTag::STRING {
            values.push(Value::String(token.to_owned()));
            continue;
        }

        let Some(converter) = registry.converter_for(param.type_tag()) else {
            return Err(DispatchError::NoConverter {
                type_tag: param.type_tag().clone(),
            });
        };

        match converter.convert(token.to_owned(), Arc::clone(event)).await {
            Ok(Some(value)) if !is_falsy(&value) => values.push(value),
            Ok(_) => return Err(DispatchError::ConversionFailed { index }),
            Err(source) => return Err(DispatchError::conversion(index, source)),
        }
    }

    Ok(Args(values))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    use crate::converter::ArgumentConverter;
    use crate::error::ErrorKind;

    fn event() -> Arc<MessageEvent> {
        Arc::new(MessageEvent::new("1", "c", "unused"))
    }

    fn registry_with_number() -> Registry {
        let mut registry = Registry::new();
        registry
            .register_converter(ArgumentConverter::number())
            .unwrap();
        registry
    }

    #[test]
    fn test_tokenize_single_space() {
        assert_eq!(tokenize("ping"), ("ping", vec![]));
        assert_eq!(tokenize("add 1 2"), ("add", vec!["1", "2"]));
        assert_eq!(tokenize("add  2"), ("add", vec!["", "2"]));
        assert_eq!(tokenize("ping "), ("ping", vec![""]));
        assert_eq!(tokenize(""), ("", vec![]));
    }

    #[test]
    fn test_is_falsy() {
        assert!(is_falsy(&Value::Null));
        assert!(is_falsy(&json!(false)));
        assert!(is_falsy(&json!(0)));
        assert!(is_falsy(&json!(0.0)));
        assert!(is_falsy(&json!("")));
        assert!(!is_falsy(&json!(true)));
        assert!(!is_falsy(&json!(-1)));
        assert!(!is_falsy(&json!("0")));
        assert!(!is_falsy(&json!([])));
        assert!(!is_falsy(&json!({})));
    }

    #[test]
    fn test_args_accessors() {
        let args = Args::new(vec![json!("hello"), json!(3)]);
        assert_eq!(args.len(), 2);
        assert_eq!(args.str(0), Some("hello"));
        assert_eq!(args.str(1), None);
        assert_eq!(args.parse::<i64>(1).unwrap(), Some(3));
        assert_eq!(args.parse::<i64>(2).unwrap(), None);
        assert!(args.parse::<i64>(0).is_err());
    }

    #[tokio::test]
    async fn test_missing_required_reports_index() {
        let params = [Parameter::required(TypeTag::STRING), Parameter::optional(TypeTag::STRING)];
        let err = convert_arguments(&params, &[], &event(), &Registry::new())
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::MissingArgument { index: 0 }));
    }

    #[tokio::test]
    async fn test_optional_without_token_is_unset() {
        let params = [Parameter::optional(TypeTag::STRING)];
        let args = convert_arguments(&params, &[], &event(), &Registry::new())
            .await
            .unwrap();
        assert!(args.is_empty());
    }

    #[tokio::test]
    async fn test_rest_joins_remaining_tokens() {
        let params = [Parameter::required(TypeTag::STRING), Parameter::rest()];
        let args = convert_arguments(&params, &["to", "hello", "world"], &event(), &Registry::new())
            .await
            .unwrap();
        assert_eq!(args.into_inner(), vec![json!("to"), json!("hello world")]);
    }

    #[tokio::test]
    async fn test_rest_without_tokens_is_empty_string() {
        let args = convert_arguments(&[Parameter::rest()], &[], &event(), &Registry::new())
            .await
            .unwrap();
        assert_eq!(args.into_inner(), vec![json!("")]);

        let params = [Parameter::required(TypeTag::STRING), Parameter::rest()];
        let args = convert_arguments(&params, &["to"], &event(), &Registry::new())
            .await
            .unwrap();
        assert_eq!(args.into_inner(), vec![json!("to"), json!("")]);
    }

    #[tokio::test]
    async fn test_optional_before_rest_leaves_rest_unset() {
        let params = [Parameter::optional(TypeTag::STRING), Parameter::rest()];
        let args = convert_arguments(&params, &[], &event(), &Registry::new())
            .await
            .unwrap();
        assert!(args.is_empty());
    }

    #[tokio::test]
    async fn test_extra_tokens_are_ignored() {
        let params = [Parameter::required(TypeTag::STRING)];
        let args = convert_arguments(&params, &["a", "b"], &event(), &Registry::new())
            .await
            .unwrap();
        assert_eq!(args.into_inner(), vec![json!("a")]);
    }

    #[tokio::test]
    async fn test_unknown_type_has_no_converter() {
        let params = [Parameter::required(TypeTag::USER)];
        let err = convert_arguments(&params, &["@x"], &event(), &Registry::new())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NoConverter);
        assert_eq!(err.to_string(), "no converter registered for type 'user'");
    }

    #[tokio::test]
    async fn test_zero_is_a_conversion_failure() {
        let params = [Parameter::required(TypeTag::NUMBER), Parameter::required(TypeTag::NUMBER)];
        let err = convert_arguments(&params, &["0", "3"], &event(), &registry_with_number())
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::ConversionFailed { index: 0 }));
    }

    #[tokio::test]
    async fn test_converter_error_is_preserved() {
        let mut registry = Registry::new();
        registry
            .register_converter(ArgumentConverter::sync(TypeTag::USER, |_token| {
                Err::<Option<String>, _>(anyhow::anyhow!("lookup failed"))
            }))
            .unwrap();

        let params = [Parameter::required(TypeTag::USER)];
        let err = convert_arguments(&params, &["@x"], &event(), &registry)
            .await
            .unwrap_err();
        let DispatchError::ConversionError { index, source } = err else {
            panic!("expected a conversion error");
        };
        assert_eq!(index, 0);
        assert_eq!(source.to_string(), "lookup failed");
    }

    #[tokio::test]
    async fn test_later_converters_are_not_run_after_failure() {
        let params = [Parameter::required(TypeTag::NUMBER), Parameter::required(TypeTag::USER)];
        let err = convert_arguments(&params, &["nope", "@x"], &event(), &registry_with_number())
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::ConversionFailed { index: 0 }));
    }
}
