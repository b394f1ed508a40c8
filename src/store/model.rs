use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Deserialize, Debug)]
pub struct QueryResp<T> {
    #[serde(default)]
    pub total: Option<u64>,
    pub documents: Vec<T>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Filter {
    pub field: &'static str,
    pub op: &'static str,
    pub value: Value,
}

impl Filter {
    pub fn eq(field: &'static str, value: impl Into<Value>) -> Self {
        Self {
            field,
            op: "eq",
            value: value.into(),
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Order {
    pub field: &'static str,
    pub direction: &'static str,
}

impl Order {
    pub fn desc(field: &'static str) -> Self {
        Self {
            field,
            direction: "desc",
        }
    }
}
