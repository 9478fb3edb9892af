use crate::core::MetaValue;
use crate::core::meta::Format;
use crate::storage::ProductColumn;
use std::fmt;

/// The four metadata verbs the host can intercept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    Get,
    Add,
    Update,
    Delete,
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Get => "get",
            Self::Add => "add",
            Self::Update => "update",
            Self::Delete => "delete",
        };
        write!(f, "{}", name)
    }
}

/// Discriminator partitioning the relationship table into independent lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelationType {
    Upsell,
    CrossSell,
    Image,
    Grouped,
}

impl RelationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Upsell => "upsell",
            Self::CrossSell => "cross_sell",
            Self::Image => "image",
            Self::Grouped => "grouped",
        }
    }
}

impl fmt::Display for RelationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Storage shape a mapped key is translated into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handler {
    Column(ProductColumn),
    Relationship(RelationType),
    VariationDescription,
    ManageStock,
    DownloadableFiles,
    Attributes,
    DefaultAttributes,
}

impl fmt::Display for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Column(column) => write!(f, "column({})", column.name()),
            Self::Relationship(relation) => write!(f, "relationship({})", relation),
            Self::VariationDescription => write!(f, "variation_description"),
            Self::ManageStock => write!(f, "manage_stock"),
            Self::DownloadableFiles => write!(f, "downloadable_files"),
            Self::Attributes => write!(f, "attributes"),
            Self::DefaultAttributes => write!(f, "default_attributes"),
        }
    }
}

/// Default arguments of one verb. A fixed `value` replaces whatever the
/// caller passed (delete resets to it).
#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    pub format: Format,
    pub value: Option<MetaValue>,
}

impl Operation {
    pub fn with_format(format: Format) -> Self {
        Self { format, value: None }
    }

    pub fn reset_to(format: Format, value: impl Into<MetaValue>) -> Self {
        Self {
            format,
            value: Some(value.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct KeyMapping {
    pub handler: Handler,
    pub get: Operation,
    pub add: Operation,
    pub update: Operation,
    pub delete: Operation,
}

impl KeyMapping {
    /// Column key written with `format`, reset on delete to `reset`.
    pub fn column(column: ProductColumn, format: Format, reset: Operation) -> Self {
        Self {
            handler: Handler::Column(column),
            get: Operation::with_format(Format::Raw),
            add: Operation::with_format(format),
            update: Operation::with_format(format),
            delete: reset,
        }
    }

    /// Key whose add/update pass the caller's value through and whose
    /// delete writes `reset`.
    pub fn resettable(handler: Handler, reset: impl Into<MetaValue>) -> Self {
        Self {
            handler,
            get: Operation::with_format(Format::Raw),
            add: Operation::with_format(Format::Raw),
            update: Operation::with_format(Format::Raw),
            delete: Operation::reset_to(Format::Raw, reset),
        }
    }

    pub fn operation(&self, verb: Verb) -> &Operation {
        match verb {
            Verb::Get => &self.get,
            Verb::Add => &self.add,
            Verb::Update => &self.update,
            Verb::Delete => &self.delete,
        }
    }
}
