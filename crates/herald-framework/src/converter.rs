//! Argument converters.
//!
//! A converter turns one raw token into a value of the type named by its
//! [`TypeTag`]. Converters return `Ok(None)` when the token does not denote a
//! value of their type and `Err` when they could not decide.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;
use serde_json::{Number, Value};

use herald_core::{BoxError, MessageEvent};

use crate::command::TypeTag;

type ConvertFn =
    Arc<dyn Fn(String, Arc<MessageEvent>) -> BoxFuture<'static, Result<Option<Value>, BoxError>> + Send + Sync>;

/// Converts raw tokens to values of one type.
#[derive(Clone)]
pub struct ArgumentConverter {
    type_tag: TypeTag,
    convert: ConvertFn,
    pub(crate) module: Option<Arc<str>>,
}

impl ArgumentConverter {
    /// Creates a converter from an async function of the token and the
    /// message it came from.
    pub fn new<F, Fut, T, E>(type_tag: impl Into<TypeTag>, convert: F) -> Self
    where
        F: Fn(String, Arc<MessageEvent>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Option<T>, E>> + Send + 'static,
        T: Into<Value> + Send + 'static,
        E: Into<BoxError> + Send + 'static,
    {
        Self {
            type_tag: type_tag.into(),
            convert: Arc::new(move |token, event| {
                convert(token, event)
                    .map(|result| match result {
                        Ok(value) => Ok(value.map(Into::into)),
                        Err(err) => Err(err.into()),
                    })
                    .boxed()
            }),
            module: None,
        }
    }

    /// Creates a converter from a synchronous function of the token.
    pub fn sync<F, T, E>(type_tag: impl Into<TypeTag>, convert: F) -> Self
    where
        F: Fn(&str) -> Result<Option<T>, E> + Send + Sync + 'static,
        T: Into<Value> + Send + 'static,
        E: Into<BoxError> + Send + 'static,
    {
        Self::new(type_tag, move |token: String, _event| {
            let result = convert(&token);
            async move { result }
        })
    }

    /// The built-in `number` converter.
    ///
    /// Accepts integers and finite floats; anything else converts to nothing.
    pub fn number() -> Self {
        Self::sync(TypeTag::NUMBER, |token| {
            Ok::<_, BoxError>(parse_number(token).map(Value::Number))
        })
    }

    pub fn type_tag(&self) -> &TypeTag {
        &self.type_tag
    }

    /// Returns the module that registered this converter, if any.
    pub fn module(&self) -> Option<&str> {
        self.module.as_deref()
    }

    /// Converts one token.
    pub fn convert(
        &self,
        token: String,
        event: Arc<MessageEvent>,
    ) -> BoxFuture<'static, Result<Option<Value>, BoxError>> {
        (self.convert)(token, event)
    }
}

impl fmt::Debug for ArgumentConverter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArgumentConverter")
            .field("type_tag", &self.type_tag)
            .field("module", &self.module)
            .finish()
    }
}

fn parse_number(token: &str) -> Option<Number> {
    if let Ok(int) = token.parse::<i64>() {
        return Some(int.into());
    }
    token.parse::<f64>().ok().and_then(Number::from_f64)
}
