//! Pure queries over the input pattern algebra that drive rewrite choices.

use relaxng_simplified::NameOrPattern;

/// Does the pattern subtree contain an `attribute` node?
///
/// References are not chased: a define whose body carries attributes does not
/// make the referencing pattern attribute-bearing. This can under-count
/// attributes across definitions, and is kept that way on purpose.
pub fn has_attr(p: &NameOrPattern) -> bool {
    match p {
        NameOrPattern::NotAllowed
        | NameOrPattern::Empty
        | NameOrPattern::Text
        | NameOrPattern::Data(_)
        | NameOrPattern::Value(_)
        | NameOrPattern::List(_)
        | NameOrPattern::Ref(_) => false,
        NameOrPattern::Attribute(_) => true,
        NameOrPattern::OneOrMore(inner) => has_attr(inner),
        NameOrPattern::Choice(pair)
        | NameOrPattern::Group(pair)
        | NameOrPattern::Interleave(pair) => has_attr(&pair.left) || has_attr(&pair.right),
        // name classes cannot contain attribute patterns
        NameOrPattern::AnyName { .. }
        | NameOrPattern::NsName { .. }
        | NameOrPattern::Name { .. } => false,
    }
}

/// Does the name-class expression carry a namespace on any of its leaves?
pub fn has_ns_name(nc: &NameOrPattern) -> bool {
    match nc {
        NameOrPattern::Name { ns, .. } => !ns.is_empty(),
        NameOrPattern::NsName { ns, except } => {
            !ns.is_empty() || except.as_deref().map(has_ns_name).unwrap_or(false)
        }
        NameOrPattern::AnyName { except } => {
            except.as_deref().map(has_ns_name).unwrap_or(false)
        }
        NameOrPattern::Choice(pair) => has_ns_name(&pair.left) || has_ns_name(&pair.right),
        _ => false,
    }
}
