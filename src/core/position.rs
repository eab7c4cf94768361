use crate::core::annotations::{Annotated, Annotations};
use crate::core::money::Money;
use serde::{Deserialize, Serialize};

/// A normalized holding, either an asset or a debt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub value: Money,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, skip_serializing_if = "Annotations::is_empty")]
    pub annotations: Annotations,
}

impl Position {
    pub fn new(name: impl Into<String>, kind: impl Into<String>, value: Money) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            value,
            description: String::new(),
            annotations: Annotations::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetPosition {
    #[serde(flatten)]
    pub position: Position,
    pub ticker: String,
}

impl AssetPosition {
    pub fn new(
        name: impl Into<String>,
        ticker: impl Into<String>,
        kind: impl Into<String>,
        value: Money,
    ) -> Self {
        Self {
            position: Position::new(name, kind, value),
            ticker: ticker.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebtPosition {
    #[serde(flatten)]
    pub position: Position,
}

impl DebtPosition {
    pub fn new(name: impl Into<String>, kind: impl Into<String>, value: Money) -> Self {
        Self {
            position: Position::new(name, kind, value),
        }
    }
}

impl Annotated for Position {
    fn annotations(&self) -> &Annotations {
        &self.annotations
    }

    fn annotations_mut(&mut self) -> &mut Annotations {
        &mut self.annotations
    }
}

impl Annotated for AssetPosition {
    fn annotations(&self) -> &Annotations {
        &self.position.annotations
    }

    fn annotations_mut(&mut self) -> &mut Annotations {
        &mut self.position.annotations
    }
}

impl Annotated for DebtPosition {
    fn annotations(&self) -> &Annotations {
        &self.position.annotations
    }

    fn annotations_mut(&mut self) -> &mut Annotations {
        &mut self.position.annotations
    }
}
