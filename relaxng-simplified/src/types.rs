//! Data model for the simplified RELAX NG syntax, the canonical desugared
//! subset produced by upstream simplifiers (section 4 of the RELAX NG
//! specification).

/// A simplified grammar: a start pattern plus named element definitions.
#[derive(Debug, Clone, PartialEq)]
pub struct Grammar {
    pub start: NameOrPattern,
    pub defines: Vec<Define>,
}

/// `<define name="..."><element> nameClass pattern </element></define>`
#[derive(Debug, Clone, PartialEq)]
pub struct Define {
    pub name: String,
    /// `left` is the element's name class, `right` its content pattern
    pub element: Pair,
}

/// Two-child container used by `element`, `attribute`, `choice`, `group` and
/// `interleave`; the `left`/`right` names are semantic, not positional.
#[derive(Debug, Clone, PartialEq)]
pub struct Pair {
    pub left: Box<NameOrPattern>,
    pub right: Box<NameOrPattern>,
}

impl Pair {
    pub fn new(left: NameOrPattern, right: NameOrPattern) -> Pair {
        Pair {
            left: Box::new(left),
            right: Box::new(right),
        }
    }
}

/// A node of the simplified pattern algebra.
///
/// `Choice` is overloaded between patterns and name classes; which reading
/// applies is decided by [`NameOrPattern::is_name_class`].
#[derive(Debug, Clone, PartialEq)]
pub enum NameOrPattern {
    NotAllowed,
    Empty,
    Text,
    Data(Data),
    Value(Value),
    List(Box<NameOrPattern>),
    /// `left` is the attribute's name class, `right` its value pattern
    Attribute(Pair),
    Ref(String),
    OneOrMore(Box<NameOrPattern>),
    Choice(Pair),
    // The group compositor checks its operands in order, except that
    // attributes may appear anywhere in the start tag; see
    // http://books.xmlschemata.org/relaxng/relax-CHP-6-SECT-1.html
    Group(Pair),
    Interleave(Pair),
    AnyName {
        except: Option<Box<NameOrPattern>>,
    },
    NsName {
        ns: String,
        except: Option<Box<NameOrPattern>>,
    },
    Name {
        ns: String,
        text: String,
    },
}

impl NameOrPattern {
    /// True when this node is a name-class expression rather than a pattern.
    pub fn is_name_class(&self) -> bool {
        match self {
            NameOrPattern::AnyName { .. }
            | NameOrPattern::NsName { .. }
            | NameOrPattern::Name { .. } => true,
            NameOrPattern::Choice(pair) => pair.left.is_name_class(),
            _ => false,
        }
    }

    pub fn is_pattern(&self) -> bool {
        !self.is_name_class()
    }

    /// Short name of the inhabited variant, for error reporting.
    pub fn variant_name(&self) -> &'static str {
        match self {
            NameOrPattern::NotAllowed => "notAllowed",
            NameOrPattern::Empty => "empty",
            NameOrPattern::Text => "text",
            NameOrPattern::Data(_) => "data",
            NameOrPattern::Value(_) => "value",
            NameOrPattern::List(_) => "list",
            NameOrPattern::Attribute(_) => "attribute",
            NameOrPattern::Ref(_) => "ref",
            NameOrPattern::OneOrMore(_) => "oneOrMore",
            NameOrPattern::Choice(_) => "choice",
            NameOrPattern::Group(_) => "group",
            NameOrPattern::Interleave(_) => "interleave",
            NameOrPattern::AnyName { .. } => "anyName",
            NameOrPattern::NsName { .. } => "nsName",
            NameOrPattern::Name { .. } => "name",
        }
    }
}

/// `<data type="..." datatypeLibrary="...">` — only the built-in library
/// (`string` / `token`) is supported downstream; parameters and foreign
/// libraries are carried so the translator can reject them.
#[derive(Debug, Clone, PartialEq)]
pub struct Data {
    pub type_name: String,
    pub datatype_library: String,
    pub params: Vec<Param>,
    pub except: Option<Box<NameOrPattern>>,
}

impl Data {
    /// An empty `type` means the default, `token`.
    pub fn is_string(&self) -> bool {
        self.type_name == "string"
    }
}

/// `<value type="..." ns="...">literal</value>`
#[derive(Debug, Clone, PartialEq)]
pub struct Value {
    pub type_name: String,
    pub datatype_library: String,
    pub ns: String,
    pub text: String,
}

impl Value {
    /// An empty `type` means the default, `token`.
    pub fn is_string(&self) -> bool {
        self.type_name == "string"
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub value: String,
}
