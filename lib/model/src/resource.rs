use crate::vocab::{rdf, rdfs};
use std::cmp::Ordering;

/// Stands for "+∞" in orders and cardinalities.
///
/// Using a large integer instead of an optional value lets properties without an order sort last
/// with the natural integer ordering.
pub const UNBOUNDED: i64 = 1_000_000_000_000_000_000;

/// The kind of RDF term a [`Resource`] stands for.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ResourceType {
    #[default]
    Iri,
    Literal,
    Blank,
}

/// A transient view on a node of the data graph.
///
/// Literals carry their value in `label` and have an empty `uri`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Resource {
    pub uri: String,
    pub label: String,
    pub comment: Option<String>,
    pub class_uri: Option<String>,
    pub resource_type: ResourceType,
}

impl Resource {
    /// Creates an IRI resource whose label defaults to its URI.
    pub fn iri(uri: impl Into<String>) -> Self {
        let uri = uri.into();
        Self {
            label: uri.clone(),
            uri,
            ..Self::default()
        }
    }

    /// Creates a blank node resource.
    pub fn blank(id: impl Into<String>) -> Self {
        Self {
            resource_type: ResourceType::Blank,
            ..Self::iri(id)
        }
    }

    /// Creates a literal resource.
    pub fn literal(value: impl Into<String>) -> Self {
        Self {
            label: value.into(),
            resource_type: ResourceType::Literal,
            ..Self::default()
        }
    }

    /// Replaces the label, unless `label` is [`None`].
    #[must_use]
    pub fn with_label(mut self, label: Option<String>) -> Self {
        if let Some(label) = label {
            self.label = label;
        }
        self
    }

    #[must_use]
    pub fn with_comment(mut self, comment: Option<String>) -> Self {
        self.comment = comment;
        self
    }

    #[must_use]
    pub fn with_class(mut self, class_uri: Option<String>) -> Self {
        self.class_uri = class_uri;
        self
    }

    pub fn is_blank(&self) -> bool {
        self.resource_type == ResourceType::Blank
    }

    pub fn is_literal(&self) -> bool {
        self.resource_type == ResourceType::Literal
    }

    /// The identity of the resource: the URI for nodes and the value for literals.
    pub fn key(&self) -> &str {
        match self.resource_type {
            ResourceType::Literal => &self.label,
            ResourceType::Iri | ResourceType::Blank => &self.uri,
        }
    }
}

/// Whether a property is shown on the card of its domain (outgoing) or of its range (incoming).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Direction {
    #[default]
    Outgoing,
    Incoming,
}

/// Whether the values of a property are literals of a datatype or instances of a class.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum RangeKind {
    Datatype,
    #[default]
    Class,
}

/// A property as described by a model.
///
/// The same URI may appear in several [`Property`] records, one per domain/range assignment. The
/// records must not be assumed to be unique by URI.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Property {
    pub uri: String,
    pub label: String,
    pub comment: Option<String>,
    /// Position on the card. [`UNBOUNDED`] if the model does not define one.
    pub order: i64,
    /// `0` means optional.
    pub min_count: i64,
    /// [`UNBOUNDED`] means unbounded.
    pub max_count: i64,
    pub domain: Option<String>,
    pub range: Option<String>,
    /// The class whose card shows this property.
    pub card_of: Option<String>,
    pub direction: Direction,
    pub range_kind: RangeKind,
}

impl Property {
    /// Creates a property without any model information.
    pub fn new(uri: impl Into<String>) -> Self {
        let uri = uri.into();
        Self {
            label: uri.clone(),
            uri,
            comment: None,
            order: UNBOUNDED,
            min_count: 0,
            max_count: UNBOUNDED,
            domain: None,
            range: None,
            card_of: None,
            direction: Direction::Outgoing,
            range_kind: RangeKind::Class,
        }
    }

    pub fn is_incoming(&self) -> bool {
        self.direction == Direction::Incoming
    }

    /// Returns whether the values of this property are literals.
    pub fn is_literal_valued(&self) -> bool {
        self.direction == Direction::Outgoing && self.range_kind == RangeKind::Datatype
    }

    /// The class of the nodes on the other side of the property, seen from the card it is shown
    /// on.
    pub fn target_class(&self) -> Option<&str> {
        match self.direction {
            Direction::Outgoing => self.range.as_deref(),
            Direction::Incoming => self.domain.as_deref(),
        }
    }

    /// Orders properties by [`Property::order`], properties without an order last.
    pub fn cmp_by_order(&self, other: &Property) -> Ordering {
        self.order.cmp(&other.order)
    }
}

/// A subject-predicate-object triple enriched for display.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Statement {
    pub subject: Resource,
    pub predicate: Property,
    pub object: Resource,
}

/// The property URIs a data bundle uses for typing, labelling and commenting its resources.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CoreProperties {
    pub type_property: String,
    pub label_property: String,
    pub comment_property: String,
}

impl Default for CoreProperties {
    fn default() -> Self {
        Self {
            type_property: rdf::TYPE.to_owned(),
            label_property: rdfs::LABEL.to_owned(),
            comment_property: rdfs::COMMENT.to_owned(),
        }
    }
}
