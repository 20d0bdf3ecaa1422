//! Static tool descriptors.
//!
//! Every tool the bridge exposes is declared here once: its backend endpoint, its kind, and an
//! ordered parameter list with types, defaults and (for generated-code tools) the R encoding of
//! each parameter. Argument binding, input schemas and MCP tool definitions all derive from
//! these tables.

use crate::args::{ArgValue, Columns, ToolArgs, json_type_name};
use crate::codegen::Encoding;
use crate::error::TranslationError;
use crate::templates::CodeTemplate;
use rmcp::model::{JsonObject, Tool};
use serde_json::{Map, Number, Value, json};
use std::fmt;
use std::sync::Arc;

/// A fixed backend resource path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Endpoint(&'static str);

impl Endpoint {
    pub const HEALTH: Self = Self("/health");
    pub const HELLO: Self = Self("/api/hello");
    pub const ADD: Self = Self("/api/add");
    pub const STATS: Self = Self("/api/stats");
    pub const LM: Self = Self("/api/lm");
    pub const DATAFRAME: Self = Self("/api/dataframe");
    pub const EXECUTE: Self = Self("/api/execute");
    pub const CALL: Self = Self("/api/call");

    #[must_use]
    pub const fn path(self) -> &'static str {
        self.0
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolKind {
    /// Probes the backend directly and reports liveness as structured status.
    Liveness,
    /// Arguments become the JSON payload as-is.
    PassThrough,
    /// Arguments are rendered into R source sent as `{code}`.
    Templated(CodeTemplate),
    /// Caller-supplied code or function name, forwarded unmodified.
    RawCode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    Number,
    NumberList,
    Text,
    /// A string restricted to a fixed set of tokens.
    Keyword(&'static [&'static str]),
    Flag,
    /// `{name: [values...]}` with homogeneous columns.
    Columns,
    /// Any JSON array or object, forwarded untouched.
    ListOrObject,
}

impl ParamType {
    fn bind(self, param: &str, value: &Value) -> Result<ArgValue, TranslationError> {
        let wrong_type = |expected: &'static str| TranslationError::WrongType {
            param: param.to_string(),
            expected,
            got: json_type_name(value),
        };

        match self {
            Self::Number => value
                .as_number()
                .cloned()
                .map(ArgValue::Number)
                .ok_or_else(|| wrong_type("number")),
            Self::NumberList => {
                let items = value.as_array().ok_or_else(|| wrong_type("array of numbers"))?;
                items
                    .iter()
                    .map(|v| v.as_number().cloned())
                    .collect::<Option<Vec<_>>>()
                    .map(ArgValue::Numbers)
                    .ok_or_else(|| TranslationError::Unsupported {
                        param: param.to_string(),
                        reason: "every element must be a number".to_string(),
                    })
            }
            Self::Text => value
                .as_str()
                .map(|s| ArgValue::Text(s.to_string()))
                .ok_or_else(|| wrong_type("string")),
            Self::Keyword(allowed) => {
                let s = value.as_str().ok_or_else(|| wrong_type("string"))?;
                if allowed.contains(&s) {
                    Ok(ArgValue::Text(s.to_string()))
                } else {
                    Err(TranslationError::NotAllowed {
                        param: param.to_string(),
                        value: s.to_string(),
                        allowed: allowed.join(", "),
                    })
                }
            }
            Self::Flag => value
                .as_bool()
                .map(ArgValue::Flag)
                .ok_or_else(|| wrong_type("boolean")),
            Self::Columns => {
                let map = value.as_object().ok_or_else(|| wrong_type("object of columns"))?;
                Columns::from_json(param, map).map(ArgValue::Columns)
            }
            Self::ListOrObject => match value {
                Value::Array(_) | Value::Object(_) => Ok(ArgValue::Json(value.clone())),
                _ => Err(wrong_type("array or object")),
            },
        }
    }

    fn schema(self) -> Value {
        match self {
            Self::Number => json!({"type": "number"}),
            Self::NumberList => json!({"type": "array", "items": {"type": "number"}}),
            Self::Text => json!({"type": "string"}),
            Self::Keyword(allowed) => json!({"type": "string", "enum": allowed}),
            Self::Flag => json!({"type": "boolean"}),
            Self::Columns => json!({
                "type": "object",
                "additionalProperties": {"type": "array"}
            }),
            Self::ListOrObject => json!({"type": ["array", "object"]}),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultValue {
    Number(i64),
    Text(&'static str),
    Flag(bool),
}

impl DefaultValue {
    fn to_arg(self) -> ArgValue {
        match self {
            Self::Number(n) => ArgValue::Number(Number::from(n)),
            Self::Text(s) => ArgValue::Text(s.to_string()),
            Self::Flag(b) => ArgValue::Flag(b),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    Required,
    Optional,
    Default(DefaultValue),
}

#[derive(Debug, Clone, Copy)]
pub struct ParamSpec {
    pub name: &'static str,
    pub ty: ParamType,
    pub requirement: Requirement,
    /// R rendering for generated-code tools; `None` for payload-only parameters.
    pub encoding: Option<Encoding>,
    pub description: &'static str,
}

impl ParamSpec {
    const fn new(
        name: &'static str,
        ty: ParamType,
        requirement: Requirement,
        description: &'static str,
    ) -> Self {
        Self {
            name,
            ty,
            requirement,
            encoding: None,
            description,
        }
    }

    const fn required(name: &'static str, ty: ParamType, description: &'static str) -> Self {
        Self::new(name, ty, Requirement::Required, description)
    }

    const fn optional(name: &'static str, ty: ParamType, description: &'static str) -> Self {
        Self::new(name, ty, Requirement::Optional, description)
    }

    const fn defaulted(
        name: &'static str,
        ty: ParamType,
        default: DefaultValue,
        description: &'static str,
    ) -> Self {
        Self::new(name, ty, Requirement::Default(default), description)
    }

    const fn encoded(mut self, encoding: Encoding) -> Self {
        self.encoding = Some(encoding);
        self
    }

    fn schema(&self) -> Value {
        let mut schema = self.ty.schema();
        schema["description"] = json!(self.description);
        if let Requirement::Default(default) = self.requirement {
            schema["default"] = default.to_arg().to_json();
        }
        schema
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ToolDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    pub endpoint: Endpoint,
    pub kind: ToolKind,
    pub params: &'static [ParamSpec],
}

impl ToolDescriptor {
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&ParamSpec> {
        self.params.iter().find(|p| p.name == name)
    }

    /// Validate raw call arguments and materialise defaults.
    ///
    /// A JSON `null` argument counts as absent.
    ///
    /// # Errors
    ///
    /// Returns an error for non-object arguments, unknown or missing parameters, and values of
    /// the wrong type.
    pub fn bind(&self, arguments: &Value) -> Result<ToolArgs, TranslationError> {
        let empty = Map::new();
        let provided = match arguments {
            Value::Null => &empty,
            Value::Object(map) => map,
            _ => return Err(TranslationError::ArgumentsNotObject),
        };

        if let Some(unknown) = provided.keys().find(|k| self.param(k).is_none()) {
            return Err(TranslationError::UnknownParameter(unknown.clone()));
        }

        let mut args = ToolArgs::default();
        for spec in self.params {
            match provided.get(spec.name).filter(|v| !v.is_null()) {
                Some(value) => args.push(spec.name, spec.ty.bind(spec.name, value)?),
                None => match spec.requirement {
                    Requirement::Required => {
                        return Err(TranslationError::MissingParameter(spec.name.to_string()));
                    }
                    Requirement::Optional => {}
                    Requirement::Default(default) => args.push(spec.name, default.to_arg()),
                },
            }
        }
        Ok(args)
    }

    #[must_use]
    pub fn input_schema(&self) -> Value {
        let mut properties = Map::new();
        let mut required: Vec<&str> = Vec::new();

        for spec in self.params {
            properties.insert(spec.name.to_string(), spec.schema());
            if spec.requirement == Requirement::Required {
                required.push(spec.name);
            }
        }

        let mut schema = json!({
            "type": "object",
            "properties": properties,
        });
        if !required.is_empty() {
            schema["required"] = json!(required);
        }
        schema
    }

    /// MCP tool definition for `tools/list`.
    #[must_use]
    pub fn to_tool(&self) -> Tool {
        let schema_obj = self
            .input_schema()
            .as_object()
            .cloned()
            .unwrap_or_else(JsonObject::new);
        let mut tool = Tool::new(self.name, self.description, Arc::new(schema_obj));
        tool.annotations = Some(crate::semantics::annotations_for_kind(self.kind));
        tool
    }
}

const STATS_OPERATIONS: &[&str] = &[
    "mean", "median", "sd", "var", "min", "max", "sum", "summary", "quantile", "fivenum",
];
const DATAFRAME_OPERATIONS: &[&str] = &["summary", "dim", "names", "head", "tail", "str"];
const CORRELATION_METHODS: &[&str] = &["pearson", "spearman", "kendall"];
const ALTERNATIVES: &[&str] = &["two.sided", "less", "greater"];
const PLOT_TYPES: &[&str] = &["scatter", "line", "histogram", "boxplot"];

/// Every tool the bridge exposes, in listing order.
pub static TOOLS: &[ToolDescriptor] = &[
    ToolDescriptor {
        name: "r_status",
        description: "Check the status of the R API server",
        endpoint: Endpoint::HEALTH,
        kind: ToolKind::Liveness,
        params: &[],
    },
    ToolDescriptor {
        name: "r_hello",
        description: "Send a greeting to R",
        endpoint: Endpoint::HELLO,
        kind: ToolKind::PassThrough,
        params: &[ParamSpec::optional(
            "name",
            ParamType::Text,
            "Name to greet (the backend defaults to \"World\")",
        )],
    },
    ToolDescriptor {
        name: "r_add",
        description: "Add two numbers using R",
        endpoint: Endpoint::ADD,
        kind: ToolKind::PassThrough,
        params: &[
            ParamSpec::defaulted("a", ParamType::Number, DefaultValue::Number(0), "First number"),
            ParamSpec::defaulted("b", ParamType::Number, DefaultValue::Number(0), "Second number"),
        ],
    },
    ToolDescriptor {
        name: "r_stats",
        description: "Perform statistical operations on numeric data",
        endpoint: Endpoint::STATS,
        kind: ToolKind::PassThrough,
        params: &[
            ParamSpec::required("data", ParamType::NumberList, "Numeric data"),
            ParamSpec::defaulted(
                "operation",
                ParamType::Keyword(STATS_OPERATIONS),
                DefaultValue::Text("mean"),
                "Statistic to compute",
            ),
        ],
    },
    ToolDescriptor {
        name: "r_lm_simple",
        description: "Simple linear regression (y ~ x) with coefficients, R-squared and p-values",
        endpoint: Endpoint::LM,
        kind: ToolKind::PassThrough,
        params: &[
            ParamSpec::required("x", ParamType::NumberList, "Independent variable values"),
            ParamSpec::required("y", ParamType::NumberList, "Dependent variable values"),
        ],
    },
    ToolDescriptor {
        name: "r_dataframe",
        description: "Perform operations on a data frame",
        endpoint: Endpoint::DATAFRAME,
        kind: ToolKind::PassThrough,
        params: &[
            ParamSpec::required(
                "data",
                ParamType::Columns,
                "Columns of the data frame, keyed by name",
            ),
            ParamSpec::defaulted(
                "operation",
                ParamType::Keyword(DATAFRAME_OPERATIONS),
                DefaultValue::Text("summary"),
                "Operation to apply",
            ),
        ],
    },
    ToolDescriptor {
        name: "r_execute",
        description: "Execute arbitrary R code",
        endpoint: Endpoint::EXECUTE,
        kind: ToolKind::RawCode,
        params: &[ParamSpec::required("code", ParamType::Text, "R code to execute")],
    },
    ToolDescriptor {
        name: "r_call",
        description: "Call an R function by name",
        endpoint: Endpoint::CALL,
        kind: ToolKind::RawCode,
        params: &[
            ParamSpec::required("func", ParamType::Text, "Name of the R function to call"),
            ParamSpec::optional(
                "args",
                ParamType::ListOrObject,
                "Positional (array) or named (object) arguments",
            ),
        ],
    },
    ToolDescriptor {
        name: "r_correlation",
        description: "Correlation between two variables with a significance test",
        endpoint: Endpoint::EXECUTE,
        kind: ToolKind::Templated(CodeTemplate::Correlation),
        params: &[
            ParamSpec::required("x", ParamType::NumberList, "First variable")
                .encoded(Encoding::VectorLiteral),
            ParamSpec::required("y", ParamType::NumberList, "Second variable")
                .encoded(Encoding::VectorLiteral),
            ParamSpec::defaulted(
                "method",
                ParamType::Keyword(CORRELATION_METHODS),
                DefaultValue::Text("pearson"),
                "Correlation method",
            )
            .encoded(Encoding::BareKeyword),
        ],
    },
    ToolDescriptor {
        name: "r_t_test",
        description: "One-sample, two-sample or paired t-test",
        endpoint: Endpoint::EXECUTE,
        kind: ToolKind::Templated(CodeTemplate::TTest),
        params: &[
            ParamSpec::required("x", ParamType::NumberList, "First sample")
                .encoded(Encoding::VectorLiteral),
            ParamSpec::optional(
                "y",
                ParamType::NumberList,
                "Second sample (omit for a one-sample test)",
            )
            .encoded(Encoding::VectorLiteral),
            ParamSpec::defaulted(
                "paired",
                ParamType::Flag,
                DefaultValue::Flag(false),
                "Whether to perform a paired t-test",
            )
            .encoded(Encoding::BooleanLiteral),
            ParamSpec::defaulted(
                "alternative",
                ParamType::Keyword(ALTERNATIVES),
                DefaultValue::Text("two.sided"),
                "Alternative hypothesis",
            )
            .encoded(Encoding::BareKeyword),
        ],
    },
    ToolDescriptor {
        name: "r_anova",
        description: "Analysis of variance for a formula over a data frame",
        endpoint: Endpoint::EXECUTE,
        kind: ToolKind::Templated(CodeTemplate::Anova),
        params: &[
            ParamSpec::required(
                "formula",
                ParamType::Text,
                "R formula, e.g. \"response ~ factor\"",
            )
            .encoded(Encoding::BareKeyword),
            ParamSpec::required("data", ParamType::Columns, "Variables keyed by name")
                .encoded(Encoding::DataFrame),
        ],
    },
    ToolDescriptor {
        name: "r_lm_formula",
        description: "Linear regression with an R formula over a data frame",
        endpoint: Endpoint::EXECUTE,
        kind: ToolKind::Templated(CodeTemplate::LmFormula),
        params: &[
            ParamSpec::required("formula", ParamType::Text, "R formula, e.g. \"y ~ x1 + x2\"")
                .encoded(Encoding::BareKeyword),
            ParamSpec::required("data", ParamType::Columns, "Variables keyed by name")
                .encoded(Encoding::DataFrame),
        ],
    },
    ToolDescriptor {
        name: "r_plot",
        description: "Summary statistics for a basic plot (parameters, not an image)",
        endpoint: Endpoint::EXECUTE,
        kind: ToolKind::Templated(CodeTemplate::Plot),
        params: &[
            ParamSpec::required("x", ParamType::NumberList, "X values")
                .encoded(Encoding::VectorLiteral),
            ParamSpec::optional("y", ParamType::NumberList, "Y values (optional for histograms)")
                .encoded(Encoding::VectorLiteral),
            ParamSpec::defaulted(
                "plot_type",
                ParamType::Keyword(PLOT_TYPES),
                DefaultValue::Text("scatter"),
                "Type of plot",
            )
            .encoded(Encoding::BareKeyword),
            ParamSpec::defaulted("title", ParamType::Text, DefaultValue::Text(""), "Plot title")
                .encoded(Encoding::QuotedString),
            ParamSpec::defaulted("xlab", ParamType::Text, DefaultValue::Text("X"), "X-axis label")
                .encoded(Encoding::QuotedString),
            ParamSpec::defaulted("ylab", ParamType::Text, DefaultValue::Text("Y"), "Y-axis label")
                .encoded(Encoding::QuotedString),
        ],
    },
];

#[must_use]
pub fn find(name: &str) -> Option<&'static ToolDescriptor> {
    TOOLS.iter().find(|t| t.name == name)
}
