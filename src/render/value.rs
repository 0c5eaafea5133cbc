// ABOUTME: Expression value model and the producer-resolution state machine
// ABOUTME: Settles invocable values into a closed set of renderable shapes

use std::fmt;
use std::rc::Rc;

use tracing::{error, warn};

use crate::dom::NodeId;
use crate::template::TemplateResult;

/// Producer chains longer than this resolve to nothing. The resolution loop
/// would otherwise hang on a producer that keeps yielding producers.
pub(crate) const MAX_PRODUCER_DEPTH: usize = 64;

/// Everything an expression can evaluate to.
#[derive(Clone)]
pub enum Value {
    /// The absence of a value; renders nothing and clears prior content.
    Nothing,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    /// A foreign tree node, inserted as-is. Must belong to the target document.
    Node(NodeId),
    /// A nested template evaluation; patched in place when the site repeats.
    Template(TemplateResult),
    /// A sequence of child values, reconciled index-by-index.
    List(Vec<Value>),
    /// A deferred value, invoked with its binding until it settles.
    Producer(Rc<dyn ValueProducer>),
}

/// A deferred value bound to the part that renders it.
///
/// Producers may yield further producers; resolution re-invokes until the
/// chain settles (or hits [`MAX_PRODUCER_DEPTH`]). A failure is reported to
/// the diagnostic channel and renders nothing; it never aborts the rest of
/// the update.
pub trait ValueProducer {
    fn produce(&self, binding: &Binding<'_>) -> anyhow::Result<Value>;
}

impl<F> ValueProducer for F
where
    F: Fn(&Binding<'_>) -> anyhow::Result<Value>,
{
    fn produce(&self, binding: &Binding<'_>) -> anyhow::Result<Value> {
        self(binding)
    }
}

/// Describes the live location a value is being resolved for.
#[derive(Debug, Clone, Copy)]
pub enum Binding<'a> {
    Attribute { element: NodeId, name: &'a str },
    Node { start: NodeId, end: NodeId },
}

/// A value with producers settled, ready for exhaustive dispatch. Scalars
/// are stringified here so parts only ever see their textual form.
#[derive(Debug)]
pub(crate) enum Resolved {
    Nothing,
    Node(NodeId),
    Template(TemplateResult),
    List(Vec<Value>),
    Text(String),
}

pub(crate) fn resolve(mut value: Value, binding: &Binding<'_>) -> Resolved {
    let mut depth = 0;
    while let Value::Producer(producer) = value {
        if depth == MAX_PRODUCER_DEPTH {
            error!(
                depth = MAX_PRODUCER_DEPTH,
                "value producer chain did not settle; rendering nothing"
            );
            return Resolved::Nothing;
        }
        depth += 1;
        value = match producer.produce(binding) {
            Ok(next) => next,
            Err(err) => {
                error!("value producer failed: {err:#}");
                return Resolved::Nothing;
            }
        };
    }
    match value {
        Value::Nothing => Resolved::Nothing,
        Value::Bool(b) => Resolved::Text(b.to_string()),
        Value::Int(i) => Resolved::Text(i.to_string()),
        Value::Float(f) => Resolved::Text(f.to_string()),
        Value::Str(s) => Resolved::Text(s),
        Value::Node(node) => Resolved::Node(node),
        Value::Template(result) => Resolved::Template(result),
        Value::List(items) => Resolved::List(items),
        // the loop above consumed every producer
        Value::Producer(_) => Resolved::Nothing,
    }
}

/// Textual form of a sequence element in attribute position. Shallow on
/// purpose: nested producers are not re-invoked here and non-scalar shapes
/// cannot appear inside an attribute string.
pub(crate) fn scalar_text(value: &Value) -> String {
    match value {
        Value::Nothing => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Int(i) => i.to_string(),
        Value::Float(f) => f.to_string(),
        Value::Str(s) => s.clone(),
        Value::Node(_) | Value::Template(_) | Value::List(_) | Value::Producer(_) => {
            warn!("non-scalar sequence element in attribute position rendered as empty");
            String::new()
        }
    }
}

impl Value {
    /// Wrap a closure as a producer value.
    pub fn producer<F>(f: F) -> Value
    where
        F: Fn(&Binding<'_>) -> anyhow::Result<Value> + 'static,
    {
        Value::Producer(Rc::new(f))
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nothing => f.write_str("Nothing"),
            Value::Bool(b) => write!(f, "Bool({b})"),
            Value::Int(i) => write!(f, "Int({i})"),
            Value::Float(x) => write!(f, "Float({x})"),
            Value::Str(s) => write!(f, "Str({s:?})"),
            Value::Node(id) => write!(f, "Node({id:?})"),
            Value::Template(result) => write!(f, "Template({} values)", result.values().len()),
            Value::List(items) => f.debug_tuple("List").field(items).finish(),
            Value::Producer(_) => f.write_str("Producer(..)"),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<char> for Value {
    fn from(c: char) -> Self {
        Value::Str(c.to_string())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<f32> for Value {
    fn from(f: f32) -> Self {
        Value::Float(f64::from(f))
    }
}

impl From<TemplateResult> for Value {
    fn from(result: TemplateResult) -> Self {
        Value::Template(result)
    }
}

impl From<NodeId> for Value {
    fn from(node: NodeId) -> Self {
        Value::Node(node)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(option: Option<T>) -> Self {
        match option {
            Some(value) => value.into(),
            None => Value::Nothing,
        }
    }
}

macro_rules! value_from_int {
    ($($ty:ty),+) => {
        $(impl From<$ty> for Value {
            fn from(i: $ty) -> Self {
                Value::Int(i64::from(i))
            }
        })+
    };
}

value_from_int!(i8, i16, i32, i64, u8, u16, u32);
